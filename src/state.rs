use std::sync::Arc;

use crate::{
    config::AppConfig,
    geo::GeoLocator,
    store::{ConsentLogStore, SnapshotStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub consents: Arc<dyn ConsentLogStore>,
    pub snapshots: Arc<dyn SnapshotStore>,
    pub geo: Arc<dyn GeoLocator>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        consents: Arc<dyn ConsentLogStore>,
        snapshots: Arc<dyn SnapshotStore>,
        geo: Arc<dyn GeoLocator>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            consents,
            snapshots,
            geo,
        }
    }
}
