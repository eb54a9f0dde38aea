use std::{sync::Arc, time::Duration};

use tracing::{info, warn};

use crate::{BeaconService, ServiceStatus};

/// Polls every registered service on a fixed interval and logs one
/// aggregated report per tick, rather than one line per service.
pub struct HealthReporter {
    services: Vec<Arc<dyn BeaconService>>,
    interval: Duration,
}

impl HealthReporter {
    pub fn new(services: Vec<Arc<dyn BeaconService>>, interval: Duration) -> Self {
        HealthReporter { services, interval }
    }

    /// Names of services currently reporting unhealthy.
    pub fn unhealthy_services(&self) -> Vec<&'static str> {
        self.services
            .iter()
            .filter(|service| service.status() == ServiceStatus::Unhealthy)
            .map(|service| service.name())
            .collect()
    }

    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            let unhealthy = self.unhealthy_services();
            if unhealthy.is_empty() {
                info!(services = self.services.len(), "all services healthy");
            } else {
                warn!(?unhealthy, "unhealthy services detected");
            }
        }
    }
}
