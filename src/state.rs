//! Shared application state handed to every handler.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::auth::identity::{FirebaseIdentity, IdentityProvider, StaticIdentity};
use crate::config::{AppConfig, ConfigError, ExportTimings, StoreBackend};
use crate::document::{GeneratorError, ReportPdfGenerator, SharedGenerator};
use crate::export::ExportRegistry;
use crate::store::{FirestoreStore, MemoryReportStore, ReportStore};

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("failed to prepare the report generator: {0}")]
    Generator(#[from] GeneratorError),
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReportStore>,
    pub generator: SharedGenerator,
    pub exports: Arc<ExportRegistry>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self, StateError> {
        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(900))
            .user_agent("kony-admin-server/0.3")
            .build()?;

        let (store, identity): (Arc<dyn ReportStore>, Arc<dyn IdentityProvider>) =
            match config.backend {
                StoreBackend::Firestore => {
                    let firebase = config
                        .firebase
                        .clone()
                        .ok_or(ConfigError::Missing("FIREBASE_PROJECT_ID"))?;
                    log::info!(
                        "Using Firestore project {} (collection '{}')",
                        firebase.project_id,
                        firebase.collection
                    );
                    let identity = FirebaseIdentity::new(firebase.api_key.clone(), http_client.clone());
                    (
                        Arc::new(FirestoreStore::new(firebase, http_client.clone())),
                        Arc::new(identity),
                    )
                }
                StoreBackend::Memory => {
                    log::warn!("Using the in-memory report store, nothing will be persisted");
                    (
                        Arc::new(MemoryReportStore::new()),
                        Arc::new(StaticIdentity::new(config.admin.clone())),
                    )
                }
            };

        let generator: SharedGenerator = Arc::new(ReportPdfGenerator::new()?);

        Ok(Self::new_with_parts(
            store,
            generator,
            identity,
            config.export,
        ))
    }

    /// Assemble a state from ready-made collaborators.
    pub fn new_with_parts(
        store: Arc<dyn ReportStore>,
        generator: SharedGenerator,
        identity: Arc<dyn IdentityProvider>,
        timings: ExportTimings,
    ) -> Self {
        Self {
            store,
            generator,
            exports: Arc::new(ExportRegistry::new(timings)),
            identity,
        }
    }
}
