//! Shared session state for one light group.
//!
//! One `GroupSession` is shared between the render loop and the sync task
//! behind a single `RwLock`. All mutation happens inside short critical
//! sections; the sync task prepares its whole reconciliation outside the
//! lock and applies it in one write, so the render loop never observes a
//! partially rebuilt mapping.

use crate::bridge::BridgeSession;
use crate::panel::light::{LightId, VisualLight};
use std::collections::HashMap;
use std::f32::consts::TAU;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// How long the aggregate shape stays error-highlighted after a failed
/// sync pass.
pub const ERROR_FLASH: Duration = Duration::from_secs(3);

/// Diameter of one individual light shape.
pub const LIGHT_SIZE: f32 = 200.0;
/// Diameter of the aggregate shape in the middle.
pub const AGGREGATE_SIZE: f32 = 500.0;
/// Radius of the circle the individual lights are laid out on.
pub const LAYOUT_RADIUS: f32 = 300.0;

/// Fallback display size when the backend cannot report the monitor size.
pub const FALLBACK_WIDTH: f32 = 300.0;
pub const FALLBACK_HEIGHT: f32 = 450.0;

pub type SharedSession = Arc<RwLock<GroupSession>>;

pub struct GroupSession {
    pub username: String,
    pub group: u32,
    pub width: f32,
    pub height: f32,
    /// Light id to shape. Rebuilt wholesale when membership changes,
    /// never patched partially.
    pub lights: HashMap<u32, VisualLight>,
    /// The big center shape standing for the whole group.
    pub aggregate: VisualLight,
    /// The idle-mode shape.
    pub screensaver: VisualLight,
    pub last_interaction: Instant,
    /// Established lazily by the first successful sync pass.
    pub bridge: Option<Arc<dyn BridgeSession>>,
    /// Deadline for the running error flash, if any.
    pub err_until: Option<Instant>,
}

impl GroupSession {
    pub fn new(username: String, group: u32) -> Self {
        let (w, h) = (FALLBACK_WIDTH, FALLBACK_HEIGHT);
        Self {
            username,
            group,
            width: w,
            height: h,
            lights: HashMap::new(),
            aggregate: VisualLight::new(LightId::Aggregate, w / 2.0, h / 2.0, AGGREGATE_SIZE),
            screensaver: VisualLight::new(LightId::Screensaver, w / 2.0, h / 2.0, LIGHT_SIZE),
            last_interaction: Instant::now(),
            bridge: None,
            err_until: None,
        }
    }

    /// Records the real display size and recenters the fixed shapes.
    /// Called once before the first frame; light positions follow at the
    /// next mapping rebuild.
    pub fn set_dimensions(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.aggregate.x = width / 2.0;
        self.aggregate.y = height / 2.0;
        self.screensaver.x = width / 2.0;
        self.screensaver.y = height / 2.0;
    }

    /// Whether `ids` names a different membership than the current mapping:
    /// a size mismatch, or any id we do not know yet.
    pub fn membership_changed(&self, ids: &[u32]) -> bool {
        self.lights.len() != ids.len() || ids.iter().any(|id| !self.lights.contains_key(id))
    }

    /// Discards the mapping and lays the new membership out on a circle by
    /// index. Positions stay fixed until the next rebuild.
    pub fn rebuild_lights(&mut self, ids: &[u32]) {
        let n = ids.len();
        self.lights = ids
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                let angle = TAU / n as f32 * i as f32;
                let light = VisualLight::new(
                    LightId::Light(id),
                    self.width / 2.0 + LAYOUT_RADIUS * angle.cos(),
                    self.height / 2.0 + LAYOUT_RADIUS * angle.sin(),
                    LIGHT_SIZE,
                );
                (id, light)
            })
            .collect();
        self.aggregate.label = n.to_string();
    }

    /// The aggregate on-flag is the OR of every individual light.
    pub fn recompute_aggregate(&mut self, now: Instant) {
        let on = self.lights.values().any(|l| l.on);
        self.aggregate.set_on(on, now);
    }

    /// Starts the error flash on the aggregate shape.
    pub fn flash_error(&mut self, now: Instant) {
        self.aggregate.set_err(true);
        self.err_until = Some(now + ERROR_FLASH);
    }

    /// Clears the flash once its deadline has passed.
    pub fn expire_error(&mut self, now: Instant) {
        if let Some(deadline) = self.err_until {
            if now >= deadline {
                self.aggregate.set_err(false);
                self.err_until = None;
            }
        }
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_interaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GroupSession {
        let mut s = GroupSession::new("tester".into(), 1);
        s.set_dimensions(1920.0, 1080.0);
        s
    }

    #[test]
    fn rebuild_lays_lights_out_on_a_circle() {
        let mut s = session();
        s.rebuild_lights(&[10, 20, 30]);

        assert_eq!(s.lights.len(), 3);
        // Index 0 sits at angle 0: straight right of center.
        let first = &s.lights[&10];
        assert!((first.x - (960.0 + LAYOUT_RADIUS)).abs() < 0.01);
        assert!((first.y - 540.0).abs() < 0.01);

        // All on the layout radius.
        for light in s.lights.values() {
            let dx = light.x - 960.0;
            let dy = light.y - 540.0;
            assert!(((dx * dx + dy * dy).sqrt() - LAYOUT_RADIUS).abs() < 0.01);
        }
        assert_eq!(s.aggregate.label, "3");
    }

    #[test]
    fn laid_out_shapes_do_not_overlap() {
        // First-match hit-testing relies on this for realistic group sizes.
        for n in 1..=9u32 {
            let mut s = session();
            let ids: Vec<u32> = (1..=n).collect();
            s.rebuild_lights(&ids);
            let shapes: Vec<_> = s.lights.values().collect();
            for (i, a) in shapes.iter().enumerate() {
                for b in shapes.iter().skip(i + 1) {
                    let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
                    assert!(
                        d >= LIGHT_SIZE,
                        "lights overlap at group size {n}: distance {d}"
                    );
                }
            }
        }
    }

    #[test]
    fn membership_change_detection() {
        let mut s = session();
        s.rebuild_lights(&[1, 2, 3]);

        assert!(!s.membership_changed(&[1, 2, 3]));
        assert!(!s.membership_changed(&[3, 2, 1]));
        assert!(s.membership_changed(&[1, 2]));
        assert!(s.membership_changed(&[1, 2, 3, 4]));
        assert!(s.membership_changed(&[1, 2, 4]));
    }

    #[test]
    fn aggregate_is_the_or_of_all_lights() {
        let mut s = session();
        s.rebuild_lights(&[1, 2]);
        let now = Instant::now();

        s.recompute_aggregate(now);
        assert!(!s.aggregate.on);

        if let Some(l) = s.lights.get_mut(&2) {
            l.set_on(true, now);
        }
        s.recompute_aggregate(now);
        assert!(s.aggregate.on);

        if let Some(l) = s.lights.get_mut(&2) {
            l.set_on(false, now);
        }
        s.recompute_aggregate(now);
        assert!(!s.aggregate.on);
    }

    #[test]
    fn error_flash_expires_after_the_deadline() {
        let mut s = session();
        let t0 = Instant::now();

        s.flash_error(t0);
        assert!(s.aggregate.err);

        s.expire_error(t0 + ERROR_FLASH - Duration::from_millis(1));
        assert!(s.aggregate.err);

        s.expire_error(t0 + ERROR_FLASH);
        assert!(!s.aggregate.err);
        assert!(s.err_until.is_none());
    }
}
