//! Session bootstrap and the double-checked-locking credential slot
//! described in §4.3/§5: the slot itself is read lock-free via
//! [`parking_lot::RwLock`] (uncontended reads never block), while the
//! session-exchange network call is serialized by a `tokio::sync::Mutex` so
//! concurrent 401 recoveries produce exactly one re-authentication.

use std::sync::Arc;

use bam_errors::{BamError, BamResult};
use bam_util::redacted::RedactedString;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::ClientConfig;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub token: RedactedString,
    pub basic_cred: RedactedString,
}

mod wire {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct SessionResponse {
        #[serde(rename = "apiVersion")]
        pub _api_version: Option<String>,
        pub token: String,
        #[serde(rename = "basicCred")]
        pub basic_cred: String,
    }
}

pub(crate) struct AuthGate {
    slot: RwLock<Option<Credentials>>,
    exchange_lock: Mutex<()>,
}

impl AuthGate {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
            exchange_lock: Mutex::new(()),
        }
    }

    pub fn peek(&self) -> Option<Credentials> {
        self.slot.read().clone()
    }

    /// Returns the current credentials, authenticating if the slot is
    /// empty. Double-checked: after taking the exchange lock, re-reads the
    /// slot in case a concurrent caller already populated it.
    pub async fn ensure(
        &self,
        http: &reqwest::Client,
        config: &ClientConfig,
    ) -> BamResult<Credentials> {
        if let Some(creds) = self.peek() {
            return Ok(creds);
        }
        let _guard = self.exchange_lock.lock().await;
        if let Some(creds) = self.peek() {
            return Ok(creds);
        }
        let creds = authenticate(http, config).await?;
        *self.slot.write() = Some(creds.clone());
        info!("authenticated session with remote server");
        Ok(creds)
    }

    /// Forces a fresh authentication regardless of the slot's current
    /// contents, used on a 401. Still serialized by `exchange_lock` so
    /// concurrent 401s collapse into a single re-authentication.
    pub async fn force_reauthenticate(
        &self,
        http: &reqwest::Client,
        config: &ClientConfig,
    ) -> BamResult<Credentials> {
        let _guard = self.exchange_lock.lock().await;
        debug!("forcing re-authentication after 401");
        let creds = authenticate(http, config).await?;
        *self.slot.write() = Some(creds.clone());
        Ok(creds)
    }
}

async fn authenticate(http: &reqwest::Client, config: &ClientConfig) -> BamResult<Credentials> {
    let url = format!("{}/{}/sessions", config.base_url.trim_end_matches('/'), config.api_version);
    let response = http
        .post(&url)
        .json(&serde_json::json!({
            "username": config.username,
            "password": config.password.expose(),
        }))
        .send()
        .await
        .map_err(|err| BamError::TransientNetwork {
            attempts: 1,
            message: err.to_string(),
        })?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
        return Err(BamError::AuthExpired {
            message: "credentials rejected by session-exchange endpoint".to_string(),
        });
    }
    if !response.status().is_success() {
        return Err(BamError::AuthExpired {
            message: format!("session exchange failed with status {}", response.status()),
        });
    }

    let body: wire::SessionResponse = response.json().await.map_err(|err| BamError::AuthExpired {
        message: format!("malformed session-exchange response: {err}"),
    })?;

    Ok(Credentials {
        token: RedactedString::new(body.token),
        basic_cred: RedactedString::new(body.basic_cred),
    })
}

pub(crate) type SharedAuthGate = Arc<AuthGate>;
