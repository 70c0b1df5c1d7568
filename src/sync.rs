//! Background bridge synchronization.
//!
//! A periodic task re-pulls the group membership and every light's state
//! from the bridge. All network traffic happens *before* the session lock
//! is taken: the pass gathers a complete snapshot first, then applies the
//! whole reconciliation under one write lock. The render loop therefore
//! never waits on network I/O and never observes a partially rebuilt
//! mapping.

use crate::bridge::{BridgeConnector, LightStatus};
use crate::panel::session::SharedSession;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Interval between reconciliation passes.
pub const SYNC_INTERVAL: Duration = Duration::from_secs(5);

/// Handle to the periodic refresh task. Dropping or stopping it aborts the
/// task, so shutdown needs no handshake.
pub struct SyncTask {
    task: JoinHandle<()>,
}

impl SyncTask {
    /// Spawns the refresh loop on `runtime`. The first pass runs
    /// immediately, then one every [`SYNC_INTERVAL`].
    pub fn spawn(
        runtime: &tokio::runtime::Handle,
        session: SharedSession,
        connector: Arc<dyn BridgeConnector>,
    ) -> Self {
        let task = runtime.spawn(async move {
            let mut interval = tokio::time::interval(SYNC_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                refresh(&session, connector.as_ref()).await;
            }
        });
        Self { task }
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for SyncTask {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// One reconciliation pass.
///
/// Establishes or reuses the bridge session, fetches the group's light ids
/// and each light's state, then applies everything atomically: the mapping
/// is rebuilt only when membership changed, otherwise only per-light
/// label/on/last-seen fields move. Connect and group-fetch failures abandon
/// the pass with the cache untouched (apart from the error flash on the
/// aggregate shape); a single light's fetch failure skips just that light.
pub async fn refresh(session: &SharedSession, connector: &dyn BridgeConnector) {
    debug!("refresh pass");

    let (username, group, bridge) = {
        let s = session.read().unwrap();
        (s.username.clone(), s.group, s.bridge.clone())
    };

    // Lazy activation: reuse the session when one exists, otherwise try to
    // establish one now and keep it for later passes.
    let bridge = match bridge {
        Some(bridge) => bridge,
        None => match connector.connect(&username).await {
            Ok(bridge) => {
                info!("bridge session established");
                session.write().unwrap().bridge = Some(bridge.clone());
                bridge
            }
            Err(e) => {
                error!(error = %e, "bridge activation failed");
                flash(session);
                return;
            }
        },
    };

    let ids = match bridge.group_lights(group).await {
        Ok(ids) => ids,
        Err(e) => {
            error!(error = %e, group, "group fetch failed");
            flash(session);
            return;
        }
    };

    let mut statuses: HashMap<u32, LightStatus> = HashMap::with_capacity(ids.len());
    for &id in &ids {
        match bridge.light(id).await {
            Ok(status) => {
                statuses.insert(id, status);
            }
            Err(e) => error!(error = %e, light = id, "light fetch failed"),
        }
    }

    let now = Instant::now();
    let mut s = session.write().unwrap();
    if s.membership_changed(&ids) {
        info!(count = ids.len(), "group membership changed, rebuilding layout");
        s.rebuild_lights(&ids);
    }
    for (id, status) in statuses {
        if let Some(light) = s.lights.get_mut(&id) {
            light.label = status.name;
            light.set_on(status.is_on, now);
            light.last_seen = Some(now);
        }
    }
    s.recompute_aggregate(now);
}

fn flash(session: &SharedSession) {
    session.write().unwrap().flash_error(Instant::now());
}
