//! The eframe/egui implementation of the panel.
//!
//! Per frame: snapshot the input, run the interaction loop under a brief
//! session lock, dispatch any remote commands fire-and-forget on the tokio
//! runtime, and paint whatever the loop decided to show.

use crate::bridge::BridgeConnector;
use crate::panel::frame::{self, Clock, DrawPlan, FrameInput, LoopControl, RemoteCommand};
use crate::panel::light::VisualLight;
use crate::panel::session::{SharedSession, FALLBACK_HEIGHT, FALLBACK_WIDTH};
use crate::sync::SyncTask;
use eframe::egui;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

const ON_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 214, 90);
const OFF_COLOR: egui::Color32 = egui::Color32::from_rgb(40, 44, 52);
const ERR_COLOR: egui::Color32 = egui::Color32::from_rgb(200, 40, 40);
const ERR_STROKE_WIDTH: f32 = 6.0;
const LABEL_FONT_SIZE: f32 = 24.0;

/// The fullscreen panel application.
pub struct PanelGui {
    session: SharedSession,
    runtime: tokio::runtime::Handle,
    // Aborts the refresh loop when the window closes.
    _sync: SyncTask,
}

impl PanelGui {
    /// Sizes the session to the real display, starts the background sync
    /// task, and hands the app to eframe.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        session: SharedSession,
        connector: Arc<dyn BridgeConnector>,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        let (width, height) = cc
            .egui_ctx
            .input(|i| i.viewport().monitor_size)
            .filter(|size| size.x > 0.0 && size.y > 0.0)
            .map_or((FALLBACK_WIDTH, FALLBACK_HEIGHT), |size| (size.x, size.y));

        info!(width = %width, height = %height, "GUI running");
        session.write().unwrap().set_dimensions(width, height);

        let sync = SyncTask::spawn(&runtime, session.clone(), connector);
        info!("ready for main loop");

        Self {
            session,
            runtime,
            _sync: sync,
        }
    }

    fn read_input(ctx: &egui::Context) -> FrameInput {
        ctx.input(|i| FrameInput {
            pointer: i.pointer.hover_pos().map(|p| (p.x, p.y)),
            primary_pressed: i.pointer.primary_pressed(),
            quit_pressed: i.key_pressed(egui::Key::Q) || i.key_pressed(egui::Key::Escape),
            drawing_skipped: i.viewport().minimized.unwrap_or(false),
        })
    }

    /// Fire-and-forget dispatch: the frame never waits on the bridge. A
    /// later refresh pass reconciles any local/remote divergence.
    fn dispatch(&self, commands: Vec<RemoteCommand>) {
        if commands.is_empty() {
            return;
        }
        let (bridge, group) = {
            let s = self.session.read().unwrap();
            (s.bridge.clone(), s.group)
        };
        let Some(bridge) = bridge else {
            warn!("no bridge session yet, dropping {} command(s)", commands.len());
            return;
        };
        for command in commands {
            let bridge = Arc::clone(&bridge);
            self.runtime.spawn(async move {
                let result = match command {
                    RemoteCommand::SetLight { id, on } => bridge.set_light(id, on).await,
                    RemoteCommand::SetGroup { on } => bridge.set_group(group, on).await,
                };
                if let Err(e) = result {
                    // The optimistic local change stands; sync corrects it.
                    error!(error = %e, ?command, "remote state-set failed");
                }
            });
        }
    }

    fn paint_light(painter: &egui::Painter, light: &VisualLight, now: Instant) {
        let center = egui::pos2(light.x, light.y);
        let radius = light.size / 2.0;
        painter.circle_filled(center, radius, blend(OFF_COLOR, ON_COLOR, light.fill_level(now)));
        if light.err {
            painter.circle_stroke(center, radius, egui::Stroke::new(ERR_STROKE_WIDTH, ERR_COLOR));
        }
        if !light.label.is_empty() {
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                &light.label,
                egui::FontId::proportional(LABEL_FONT_SIZE),
                egui::Color32::WHITE,
            );
        }
    }
}

fn blend(off: egui::Color32, on: egui::Color32, level: f32) -> egui::Color32 {
    let t = level.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
    egui::Color32::from_rgb(
        mix(off.r(), on.r()),
        mix(off.g(), on.g()),
        mix(off.b(), on.b()),
    )
}

impl eframe::App for PanelGui {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let input = Self::read_input(ctx);
        let clock = Clock::sample();

        let (outcome, shapes) = {
            let mut session = self.session.write().unwrap();
            let outcome = frame::tick(&mut session, &input, clock);
            let shapes: Vec<VisualLight> = match outcome.draw {
                DrawPlan::Skip => Vec::new(),
                DrawPlan::Screensaver => vec![session.screensaver.clone()],
                DrawPlan::Normal => {
                    // Aggregate underneath, lights on top.
                    let mut shapes = vec![session.aggregate.clone()];
                    shapes.extend(session.lights.values().cloned());
                    shapes
                }
            };
            (outcome, shapes)
        };

        if outcome.control == LoopControl::Quit {
            info!("quit requested");
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        self.dispatch(outcome.commands);

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let painter = ui.painter();
                for shape in &shapes {
                    Self::paint_light(painter, shape, clock.now);
                }
            });

        // Keep animating even without input events.
        ctx.request_repaint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_hits_both_endpoints() {
        assert_eq!(blend(OFF_COLOR, ON_COLOR, 0.0), OFF_COLOR);
        assert_eq!(blend(OFF_COLOR, ON_COLOR, 1.0), ON_COLOR);
    }

    #[test]
    fn blend_clamps_out_of_range_levels() {
        assert_eq!(blend(OFF_COLOR, ON_COLOR, -0.5), OFF_COLOR);
        assert_eq!(blend(OFF_COLOR, ON_COLOR, 1.5), ON_COLOR);
    }
}
