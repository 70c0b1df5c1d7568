//! Idle-mode trajectory for the screensaver shape.
//!
//! Driven by wall-clock time so the sweep is deterministic: the shape's
//! position is a pure function of the clock, not of how many frames have
//! been rendered.

use crate::panel::light::VisualLight;
use std::time::Duration;

/// One full sweep across the screen takes a minute.
pub const SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// Moves the screensaver shape for this frame: snapped to vertical center,
/// x oscillating on a cosine whose amplitude spans the display width minus
/// the shape's own size.
pub fn drive(shape: &mut VisualLight, wall_nanos: u128, width: f32, height: f32) {
    let mid = height / 2.0;
    if shape.y != mid {
        shape.move_by(0.0, mid - shape.y);
    }

    let period = SWEEP_PERIOD.as_nanos();
    let phase = (wall_nanos % period) as f64 / period as f64;
    let amplitude = width / 2.0 - shape.size / 2.0;
    let x = (std::f64::consts::TAU * phase).cos() as f32 * amplitude + width / 2.0;
    shape.move_by(x - shape.x, 0.0);
}
