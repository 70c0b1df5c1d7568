//! Hue REST bridge implementation.
//!
//! Speaks the CLIP v1 API: the bridge address comes from the public meethue
//! discovery endpoint, everything else is plain REST under
//! `/api/<username>`. The "login" is a local token bind — the bridge
//! rejects an unknown username on the first real call, not at connect time.

use super::{BridgeConnector, BridgeSession, LightStatus};
use crate::error::{PanelError, PanelResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DISCOVERY_URL: &str = "https://discovery.meethue.com/";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Discovers the bridge and binds the username into a [`HueBridge`] session.
pub struct HueConnector {
    http: reqwest::Client,
}

impl HueConnector {
    pub fn new() -> PanelResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| PanelError::Transport(e.to_string()))?;
        Ok(Self { http })
    }
}

#[derive(Debug, Deserialize)]
struct DiscoveryEntry {
    #[serde(rename = "internalipaddress")]
    internal_ip: String,
}

#[async_trait]
impl BridgeConnector for HueConnector {
    async fn connect(&self, username: &str) -> PanelResult<Arc<dyn BridgeSession>> {
        let entries: Vec<DiscoveryEntry> = self
            .http
            .get(DISCOVERY_URL)
            .send()
            .await
            .map_err(|e| PanelError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| PanelError::Protocol(e.to_string()))?;

        let entry = entries
            .into_iter()
            .next()
            .ok_or_else(|| PanelError::Discovery("no bridge on the local network".into()))?;

        info!(ip = %entry.internal_ip, "bridge discovered");

        Ok(Arc::new(HueBridge {
            http: self.http.clone(),
            base: format!("http://{}/api/{}", entry.internal_ip, username),
        }))
    }
}

/// One discovered bridge with a bound username.
struct HueBridge {
    http: reqwest::Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct GroupBody {
    lights: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LightBody {
    name: String,
    state: LightStateBody,
}

#[derive(Debug, Deserialize)]
struct LightStateBody {
    on: bool,
}

impl HueBridge {
    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> PanelResult<T> {
        let response = self
            .http
            .get(format!("{}/{}", self.base, path))
            .send()
            .await
            .map_err(|e| PanelError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PanelError::Protocol(format!("{path} returned {status}")));
        }
        response
            .json()
            .await
            .map_err(|e| PanelError::Protocol(e.to_string()))
    }

    async fn put_json(&self, path: &str, body: serde_json::Value) -> PanelResult<()> {
        let response = self
            .http
            .put(format!("{}/{}", self.base, path))
            .json(&body)
            .send()
            .await
            .map_err(|e| PanelError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PanelError::Protocol(format!("{path} returned {status}")));
        }
        Ok(())
    }
}

#[async_trait]
impl BridgeSession for HueBridge {
    async fn group_lights(&self, group: u32) -> PanelResult<Vec<u32>> {
        let body: GroupBody = self.get_json(&format!("groups/{group}")).await?;
        // CLIP reports light ids as strings.
        let mut ids = Vec::with_capacity(body.lights.len());
        for raw in body.lights {
            match raw.parse() {
                Ok(id) => ids.push(id),
                Err(_) => warn!(id = %raw, "ignoring non-numeric light id"),
            }
        }
        Ok(ids)
    }

    async fn light(&self, id: u32) -> PanelResult<LightStatus> {
        let body: LightBody = self.get_json(&format!("lights/{id}")).await?;
        Ok(LightStatus {
            name: body.name,
            is_on: body.state.on,
        })
    }

    async fn set_light(&self, id: u32, on: bool) -> PanelResult<()> {
        self.put_json(&format!("lights/{id}/state"), json!({ "on": on }))
            .await
    }

    async fn set_group(&self, group: u32, on: bool) -> PanelResult<()> {
        self.put_json(&format!("groups/{group}/action"), json!({ "on": on }))
            .await
    }
}
