use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{EditGate, PhotoStore, SeaOrmEditGate};

/// Application-wide state built once at startup and threaded explicitly
/// through every handler (no ambient re-fetching of clients or sessions).
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub photos: Arc<PhotoStore>,

    pub gate: Arc<dyn EditGate>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let photos = Arc::new(PhotoStore::new(&config.general.images_path));
        let gate: Arc<dyn EditGate> =
            Arc::new(SeaOrmEditGate::new(store.clone(), config.security.clone()));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            photos,
            gate,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
