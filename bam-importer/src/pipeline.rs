//! Wires the per-crate components (client, resolver, planner, handler
//! registry, throttle) into the shared set every subcommand that talks to
//! the remote server needs.

use std::sync::Arc;

use bam_client::BamClient;
use bam_executor::HandlerRegistry;
use bam_planner::Planner;
use bam_resolver::PathResolver;
use bam_throttle::AdaptiveThrottle;
use bam_util::shutdown::{shutdown_channel, ShutdownReceiver, ShutdownSender};

use crate::config::BamConfig;
use crate::remote_lookup::ClientLookup;

pub struct Pipeline {
    pub client: Arc<BamClient>,
    pub resolver: Arc<PathResolver>,
    pub planner: Planner,
    pub registry: Arc<HandlerRegistry>,
    pub throttle: Arc<AdaptiveThrottle>,
}

impl Pipeline {
    pub fn build(config: &BamConfig) -> anyhow::Result<Self> {
        let client = Arc::new(BamClient::new(config.client_config())?);
        let lookup = Arc::new(ClientLookup::new(client.clone()));
        let resolver = Arc::new(PathResolver::new(config.resolver_config(), lookup));
        let planner = Planner::new(client.clone(), resolver.clone(), config.policy.update_mode);
        let registry = Arc::new(HandlerRegistry::bootstrap()?);
        let throttle = Arc::new(AdaptiveThrottle::new(config.throttle.clone()));
        Ok(Self { client, resolver, planner, registry, throttle })
    }
}

/// A shutdown pair wired to Ctrl-C, so `FailurePolicy::FailFast` and a
/// manual interrupt share the same cancellation path into the executor.
pub fn ctrl_c_shutdown() -> (ShutdownSender, ShutdownReceiver) {
    let (tx, rx) = shutdown_channel();
    let signal_tx = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, requesting cancellation");
            signal_tx.cancel();
        }
    });
    (tx, rx)
}
