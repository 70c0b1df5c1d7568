//! Mock bridge for tests.
//!
//! Scriptable in-memory double: a light table that can be edited between
//! refresh passes, per-call failure switches, and a record of every
//! state-set the panel issued.

use super::{BridgeConnector, BridgeSession, LightStatus};
use crate::error::{PanelError, PanelResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A recorded state-set call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetCall {
    Light { id: u32, on: bool },
    Group { group: u32, on: bool },
}

#[derive(Default)]
struct MockState {
    lights: BTreeMap<u32, LightStatus>,
    fail_connect: bool,
    fail_group: bool,
    fail_lights: BTreeSet<u32>,
    set_calls: Vec<SetCall>,
}

/// In-memory bridge double. Cloning shares the underlying state, so the
/// connector handed to the sync task and the handle kept by the test see
/// the same light table.
#[derive(Clone, Default)]
pub struct MockBridge {
    state: Arc<RwLock<MockState>>,
}

impl MockBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a light on the mock bridge.
    pub async fn put_light(&self, id: u32, name: &str, on: bool) {
        self.state.write().await.lights.insert(
            id,
            LightStatus {
                name: name.to_string(),
                is_on: on,
            },
        );
    }

    pub async fn remove_light(&self, id: u32) {
        self.state.write().await.lights.remove(&id);
    }

    /// Makes `connect` fail until switched back off.
    pub async fn fail_connect(&self, fail: bool) {
        self.state.write().await.fail_connect = fail;
    }

    /// Makes the group-membership fetch fail until switched back off.
    pub async fn fail_group(&self, fail: bool) {
        self.state.write().await.fail_group = fail;
    }

    /// Makes fetches of one particular light fail.
    pub async fn fail_light(&self, id: u32, fail: bool) {
        let mut state = self.state.write().await;
        if fail {
            state.fail_lights.insert(id);
        } else {
            state.fail_lights.remove(&id);
        }
    }

    /// Every state-set call recorded so far, in order.
    pub async fn set_calls(&self) -> Vec<SetCall> {
        self.state.read().await.set_calls.clone()
    }
}

#[async_trait]
impl BridgeConnector for MockBridge {
    async fn connect(&self, _username: &str) -> PanelResult<Arc<dyn BridgeSession>> {
        if self.state.read().await.fail_connect {
            return Err(PanelError::Discovery("mock: no bridge".into()));
        }
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl BridgeSession for MockBridge {
    async fn group_lights(&self, _group: u32) -> PanelResult<Vec<u32>> {
        let state = self.state.read().await;
        if state.fail_group {
            return Err(PanelError::Transport("mock: group fetch refused".into()));
        }
        Ok(state.lights.keys().copied().collect())
    }

    async fn light(&self, id: u32) -> PanelResult<LightStatus> {
        let state = self.state.read().await;
        if state.fail_lights.contains(&id) {
            return Err(PanelError::Transport(format!("mock: light {id} refused")));
        }
        state
            .lights
            .get(&id)
            .cloned()
            .ok_or_else(|| PanelError::Protocol(format!("mock: unknown light {id}")))
    }

    async fn set_light(&self, id: u32, on: bool) -> PanelResult<()> {
        let mut state = self.state.write().await;
        if let Some(light) = state.lights.get_mut(&id) {
            light.is_on = on;
        }
        state.set_calls.push(SetCall::Light { id, on });
        Ok(())
    }

    async fn set_group(&self, group: u32, on: bool) -> PanelResult<()> {
        let mut state = self.state.write().await;
        for light in state.lights.values_mut() {
            light.is_on = on;
        }
        state.set_calls.push(SetCall::Group { group, on });
        Ok(())
    }
}
