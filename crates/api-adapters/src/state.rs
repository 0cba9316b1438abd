use std::sync::Arc;

use services::AppServices;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(services: AppServices) -> Self {
        Self {
            services,
            metrics: Arc::new(Metrics::new()),
        }
    }
}
