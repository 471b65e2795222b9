pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod services;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServiceConfig;
use crate::db::ContentStore;
use crate::error::Result;
use crate::generator::ContentGenerator;
use crate::services::{AssessmentRunner, ContentHierarchy};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub hierarchy: ContentHierarchy,
    pub generator: Arc<dyn ContentGenerator>,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ContentStore>,
        generator: Arc<dyn ContentGenerator>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            hierarchy: ContentHierarchy::new(store, Arc::clone(&generator)),
            generator,
            config: Arc::new(config),
        }
    }

    /// Start a placement assessment with the configured timings.
    pub async fn start_assessment(&self) -> Result<AssessmentRunner> {
        AssessmentRunner::start(Arc::clone(&self.generator), self.config.assessment.clone()).await
    }
}

/// Install the global tracing subscriber. Later calls are no-ops.
pub fn init_tracing(filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Read configuration from the environment, set up logging and build the
/// application state around the given store and generator.
pub fn bootstrap(
    store: Arc<dyn ContentStore>,
    generator: Arc<dyn ContentGenerator>,
) -> anyhow::Result<AppState> {
    let config = ServiceConfig::from_env()?;
    init_tracing(&config.log_filter);

    tracing::info!(
        generator = generator.name(),
        advance_delay_ms = config.assessment.advance_delay_ms,
        feedback_delay_ms = config.assessment.feedback_delay_ms,
        reference_length = config.assessment.reference_length,
        "curriculum service ready"
    );

    Ok(AppState::new(store, generator, config))
}
