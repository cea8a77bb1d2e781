//! App - schema, store and request execution wired together
//!
//! TigerStyle: one place decides which store backs which schema. Everything
//! downstream sees `Arc<dyn EntityStore>`.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use weave_core::{execute, EntityStore, MemoryStore, Request, Response};

use crate::config::{AppConfig, SchemaVariant};
use crate::context::AppContext;
use crate::schemas::{self, DemoSchema, Node};
use crate::seed;

/// A built schema bound to its store.
#[derive(Clone)]
pub struct App {
    variant: SchemaVariant,
    schema: Arc<DemoSchema>,
    store: Arc<dyn EntityStore>,
}

impl App {
    /// Build the schema for `variant` over `store`.
    ///
    /// # Errors
    /// Returns the schema build error; callers treat it as fatal.
    pub fn new(variant: SchemaVariant, store: Arc<dyn EntityStore>) -> anyhow::Result<Self> {
        let schema = schemas::build(variant)?;
        tracing::debug!(variant = %variant, types = schema.type_names().len(), "Schema built");

        Ok(Self {
            variant,
            schema: Arc::new(schema),
            store,
        })
    }

    /// Open the configured store, seed it if asked, and build the schema.
    pub async fn open(config: &AppConfig) -> anyhow::Result<Self> {
        let store = open_store(config).await?;
        if config.seed {
            seed::seed(store.as_ref(), config.variant).await?;
        }
        Self::new(config.variant, store)
    }

    /// A fresh in-memory store for `variant`, optionally seeded.
    pub async fn in_memory(variant: SchemaVariant, seed: bool) -> anyhow::Result<Self> {
        let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new(variant.id_strategy()));
        if seed {
            seed::seed(store.as_ref(), variant).await?;
        }
        Self::new(variant, store)
    }

    /// Schema configuration in use.
    #[must_use]
    pub fn variant(&self) -> SchemaVariant {
        self.variant
    }

    /// The built schema.
    #[must_use]
    pub fn schema(&self) -> &DemoSchema {
        &self.schema
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Execute `request` under `request_id`, stopping when `cancel` fires.
    pub async fn execute(
        &self,
        request: &Request,
        request_id: &str,
        cancel: CancellationToken,
    ) -> Response {
        let ctx = AppContext::new(Arc::clone(&self.store), request_id);
        execute(&self.schema, request, Node::Root, ctx, cancel).await
    }

    /// Execute `request` with a fresh request id and no deadline.
    pub async fn run(&self, request: &Request) -> Response {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.execute(request, &request_id, CancellationToken::new())
            .await
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("variant", &self.variant)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "postgres")]
async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn EntityStore>> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to Postgres");
            let store = weave_core::PostgresStore::new(url).await?;
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(MemoryStore::new(config.variant.id_strategy()))),
    }
}

#[cfg(not(feature = "postgres"))]
async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn EntityStore>> {
    // AppConfig rejects database URLs when Postgres support is compiled out.
    anyhow::ensure!(
        config.database_url.is_none(),
        "database url given but postgres support is not compiled in"
    );
    Ok(Arc::new(MemoryStore::new(config.variant.id_strategy())))
}

// =============================================================================
// Tests
// =============================================================================
