use std::sync::Arc;
use std::time::Instant;

use vigil_core::{GameClient, SurveillanceEngine};

#[derive(Clone)]
pub(crate) struct AppState {
    engine: Arc<SurveillanceEngine>,
    endpoints: Arc<Vec<String>>,
    started: Instant,
}

impl AppState {
    pub fn new(engine: Arc<SurveillanceEngine>) -> Self {
        Self {
            engine,
            endpoints: Arc::new(Vec::new()),
            started: Instant::now(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.endpoints = Arc::new(endpoints);
        self
    }

    pub fn engine(&self) -> &Arc<SurveillanceEngine> {
        &self.engine
    }

    pub fn client(&self) -> &GameClient {
        &self.engine.context().client
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
