//! Panel domain: shapes, shared session state, and the per-frame loop.

pub mod frame;
pub mod light;
pub mod screensaver;
pub mod session;
