pub mod health;

/// Health view of a long-running node service, polled by the health
/// reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
}

pub trait BeaconService: Send + Sync {
    /// Stable name used in health reports.
    fn name(&self) -> &'static str;

    fn status(&self) -> ServiceStatus;
}
