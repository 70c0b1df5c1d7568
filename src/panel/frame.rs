//! The per-frame interaction loop.
//!
//! [`tick`] is a pure function of the frame's input snapshot, the clock,
//! and the session state: it mutates the session, decides what (if
//! anything) gets painted, and emits the remote commands the caller should
//! dispatch fire-and-forget. Keeping network dispatch out of the loop is
//! what makes the click scenarios testable without a bridge.

use crate::panel::screensaver;
use crate::panel::session::GroupSession;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Idle time before the screensaver takes over.
pub const IDLE_THRESHOLD: Duration = Duration::from_secs(15);

/// Input snapshot for one frame, as reported by the rendering backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    /// Pointer position, if the pointer is over the surface.
    pub pointer: Option<(f32, f32)>,
    /// Primary button went down this frame.
    pub primary_pressed: bool,
    /// Quit key went down this frame.
    pub quit_pressed: bool,
    /// The backend is not going to show this frame (e.g. minimized).
    pub drawing_skipped: bool,
}

/// Clock sample for one frame. Wall time only drives the screensaver
/// sweep; everything else runs on the monotonic instant.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    pub now: Instant,
    pub wall_nanos: u128,
}

impl Clock {
    pub fn sample() -> Self {
        Self {
            now: Instant::now(),
            wall_nanos: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0),
        }
    }
}

/// Remote effect of an accepted click, dispatched by the caller without
/// waiting for the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    SetLight { id: u32, on: bool },
    SetGroup { on: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Quit,
}

/// What this frame should paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPlan {
    /// Nothing: drawing skipped, or the frame was consumed by a click.
    Skip,
    /// Only the screensaver shape.
    Screensaver,
    /// Aggregate first, then every individual light.
    Normal,
}

#[derive(Debug)]
pub struct FrameOutcome {
    pub control: LoopControl,
    pub commands: Vec<RemoteCommand>,
    pub draw: DrawPlan,
}

impl FrameOutcome {
    fn skip() -> Self {
        Self {
            control: LoopControl::Continue,
            commands: Vec::new(),
            draw: DrawPlan::Skip,
        }
    }
}

/// Runs one frame. Step order matters and short-circuits on the first
/// match: quit, screensaver takeover, light click, aggregate click,
/// draw-skip, draw.
pub fn tick(session: &mut GroupSession, input: &FrameInput, clock: Clock) -> FrameOutcome {
    if input.quit_pressed {
        return FrameOutcome {
            control: LoopControl::Quit,
            commands: Vec::new(),
            draw: DrawPlan::Skip,
        };
    }

    session.expire_error(clock.now);

    if session.idle_for(clock.now) > IDLE_THRESHOLD {
        return screensaver_frame(session, input, clock);
    }

    if input.primary_pressed {
        if let Some((px, py)) = input.pointer {
            // Individual lights first; the aggregate only catches clicks no
            // light claimed. Shapes do not overlap for realistic group
            // sizes, so mapping order does not matter.
            let hit = session
                .lights
                .iter()
                .find(|(_, light)| light.contains(px, py))
                .map(|(id, _)| *id);

            if let Some(id) = hit {
                let mut toggled = None;
                if let Some(light) = session.lights.get_mut(&id) {
                    if light.debounced(clock.now) {
                        let on = !light.on;
                        light.set_on(on, clock.now);
                        toggled = Some(on);
                    }
                }
                if let Some(on) = toggled {
                    debug!(light = id, on, "light toggled");
                    session.recompute_aggregate(clock.now);
                    session.last_interaction = clock.now;
                    return FrameOutcome {
                        control: LoopControl::Continue,
                        commands: vec![RemoteCommand::SetLight { id, on }],
                        draw: DrawPlan::Skip,
                    };
                }
                // Click landed during the debounce window: consumed, no toggle.
                return FrameOutcome::skip();
            }

            if session.aggregate.contains(px, py) {
                if session.aggregate.debounced(clock.now) {
                    let on = !session.aggregate.on;
                    session.aggregate.set_on(on, clock.now);
                    for light in session.lights.values_mut() {
                        light.set_on(on, clock.now);
                    }
                    debug!(on, "group toggled");
                    session.last_interaction = clock.now;
                    return FrameOutcome {
                        control: LoopControl::Continue,
                        commands: vec![RemoteCommand::SetGroup { on }],
                        draw: DrawPlan::Skip,
                    };
                }
                return FrameOutcome::skip();
            }
        }
    }

    if input.drawing_skipped {
        return FrameOutcome::skip();
    }

    FrameOutcome {
        control: LoopControl::Continue,
        commands: Vec::new(),
        draw: DrawPlan::Normal,
    }
}

/// The idle path. A press exits the screensaver and is consumed; it never
/// reaches any light.
fn screensaver_frame(
    session: &mut GroupSession,
    input: &FrameInput,
    clock: Clock,
) -> FrameOutcome {
    if input.primary_pressed {
        debug!("screensaver dismissed");
        session.last_interaction = clock.now;
        return FrameOutcome::skip();
    }

    if input.drawing_skipped {
        return FrameOutcome::skip();
    }

    let aggregate_on = session.aggregate.on;
    session.screensaver.set_on(aggregate_on, clock.now);
    let (width, height) = (session.width, session.height);
    screensaver::drive(&mut session.screensaver, clock.wall_nanos, width, height);

    FrameOutcome {
        control: LoopControl::Continue,
        commands: Vec::new(),
        draw: DrawPlan::Screensaver,
    }
}
