//! # hue-panel
//!
//! A fullscreen control panel for one group of Philips Hue lights. Every
//! light in the group is drawn as a clickable circle around a large
//! aggregate circle that toggles the whole group; a background task keeps
//! the on-screen state reconciled with the bridge, and an idle screensaver
//! sweeps a single shape across the display.
//!
//! ## Crate Structure
//!
//! - **`bridge`**: the opaque bridge collaborator — `BridgeConnector` /
//!   `BridgeSession` traits, the real Hue REST implementation, and a
//!   scriptable mock for tests.
//! - **`panel`**: the domain model — `VisualLight` shapes, the shared
//!   `GroupSession`, the per-frame interaction loop, and the screensaver
//!   trajectory.
//! - **`sync`**: the cancellable periodic task that reconciles the cached
//!   light state with the bridge.
//! - **`gui`**: the eframe/egui shell that feeds input into the loop and
//!   paints the shapes.
//! - **`error`**: the `PanelError` taxonomy for bridge failures.

pub mod bridge;
pub mod error;
pub mod gui;
pub mod panel;
pub mod sync;
