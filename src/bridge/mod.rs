//! Bridge collaborator interface.
//!
//! The bridge is an opaque service from the panel's point of view: it can
//! be discovered and logged into, it can list the lights of a group, report
//! one light's state, and set light or group state. `hue` is the real REST
//! implementation; `mock` is an in-memory double for tests.

pub mod hue;
pub mod mock;

use crate::error::PanelResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Last observed remote state of a single light.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightStatus {
    pub name: String,
    pub is_on: bool,
}

/// Establishes bridge sessions.
///
/// Discovery plus login in one step. The sync task calls this lazily at the
/// start of a pass whenever no session exists yet, and reuses the returned
/// session afterwards.
#[async_trait]
pub trait BridgeConnector: Send + Sync {
    async fn connect(&self, username: &str) -> PanelResult<Arc<dyn BridgeSession>>;
}

/// A logged-in bridge session.
///
/// Every call may fail with a transport or protocol error; callers decide
/// whether to retry, skip, or abandon the surrounding operation.
#[async_trait]
pub trait BridgeSession: Send + Sync {
    /// Light ids belonging to a group.
    async fn group_lights(&self, group: u32) -> PanelResult<Vec<u32>>;

    /// Name and on/off state of one light.
    async fn light(&self, id: u32) -> PanelResult<LightStatus>;

    /// Set a single light's on/off state.
    async fn set_light(&self, id: u32, on: bool) -> PanelResult<()>;

    /// Set the whole group's on/off state.
    async fn set_group(&self, group: u32, on: bool) -> PanelResult<()>;
}
