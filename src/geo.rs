use async_trait::async_trait;

/// Resolves a client IP to an ISO country code.
#[async_trait]
pub trait GeoLocator: Send + Sync + 'static {
    async fn country_for(&self, ip: &str) -> Option<String>;
}

/// Placeholder until a real provider is wired in; never resolves anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGeoLocator;

#[async_trait]
impl GeoLocator for NoopGeoLocator {
    async fn country_for(&self, _ip: &str) -> Option<String> {
        None
    }
}
