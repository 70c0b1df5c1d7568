//! The visual shape and fade model for one light.

use std::time::{Duration, Instant};

/// Fade time between the on and off appearance. The click debounce window
/// is twice this, so the constant must not be duplicated anywhere.
pub const FADE_DURATION: Duration = Duration::from_millis(500);

/// What a shape stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightId {
    /// One physical light, by bridge id.
    Light(u32),
    /// The whole group.
    Aggregate,
    /// The idle-mode shape.
    Screensaver,
}

/// One interactive circle on the panel.
///
/// The on/off appearance is derived, not stored: [`fill_level`] interpolates
/// from the timestamp of the last state change, so rendering needs no
/// per-frame animation bookkeeping.
///
/// [`fill_level`]: VisualLight::fill_level
#[derive(Debug, Clone, PartialEq)]
pub struct VisualLight {
    pub id: LightId,
    /// Center position.
    pub x: f32,
    pub y: f32,
    /// Diameter of the circle.
    pub size: f32,
    pub label: String,
    pub on: bool,
    pub err: bool,
    /// When the sync task last observed this light on the bridge.
    pub last_seen: Option<Instant>,
    /// When the on-flag last actually changed, locally or remotely.
    pub last_change: Option<Instant>,
}

impl VisualLight {
    pub fn new(id: LightId, x: f32, y: f32, size: f32) -> Self {
        Self {
            id,
            x,
            y,
            size,
            label: String::new(),
            on: false,
            err: false,
            last_seen: None,
            last_change: None,
        }
    }

    pub fn move_by(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// Records the desired on-state. The change timestamp moves only when
    /// the state actually differs from the current one.
    pub fn set_on(&mut self, on: bool, now: Instant) {
        if self.on != on {
            self.on = on;
            self.last_change = Some(now);
        }
    }

    pub fn set_err(&mut self, err: bool) {
        self.err = err;
    }

    /// Circular hit-test, consistent with the painted circle.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        let dx = px - self.x;
        let dy = py - self.y;
        let r = self.size / 2.0;
        dx * dx + dy * dy <= r * r
    }

    /// Whether another toggle may be accepted: two full fades must have
    /// passed since the last change, so a held button cannot flip the
    /// light faster than the fade can show it.
    pub fn debounced(&self, now: Instant) -> bool {
        match self.last_change {
            Some(at) => now.duration_since(at) > FADE_DURATION * 2,
            None => true,
        }
    }

    /// Fade interpolation toward the target state: 0.0 is the fully-off
    /// appearance, 1.0 fully on.
    pub fn fill_level(&self, now: Instant) -> f32 {
        let progress = match self.last_change {
            Some(at) => {
                (now.duration_since(at).as_secs_f32() / FADE_DURATION.as_secs_f32()).min(1.0)
            }
            None => 1.0,
        };
        if self.on {
            progress
        } else {
            1.0 - progress
        }
    }
}
