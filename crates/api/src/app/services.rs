use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use storefront_infra::{
    CatalogStore, InMemoryCatalog, InMemoryOrderStore, OrderService, OrderStore, PostgresCatalog,
    PostgresOrderStore, StoreError, catalog::seed, config::Settings, db,
};

/// Everything the handlers need, shared behind an `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<dyn CatalogStore>,
    pub orders: OrderService,
    pub request_timeout: Duration,
}

impl AppServices {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        orders: Arc<dyn OrderStore>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            orders: OrderService::new(catalog.clone(), orders),
            catalog,
            request_timeout,
        }
    }

    /// In-memory catalog + order store sharing the same product map.
    pub fn in_memory(catalog: InMemoryCatalog, request_timeout: Duration) -> Self {
        let orders = Arc::new(InMemoryOrderStore::new(&catalog));
        Self::new(Arc::new(catalog), orders, request_timeout)
    }

    /// Deadline for a request starting now.
    pub fn deadline(&self) -> Instant {
        Instant::now() + self.request_timeout
    }
}

pub async fn build_services(settings: &Settings) -> Result<AppServices, StoreError> {
    if settings.use_persistent_stores {
        let url = settings
            .database_url
            .as_deref()
            .ok_or_else(|| StoreError::backend("DATABASE_URL must be set when USE_PERSISTENT_STORES=true"))?;

        let pool = db::connect(url, settings.db_max_connections).await?;
        db::ensure_schema(&pool).await?;
        tracing::info!(max_connections = settings.db_max_connections, "using postgres stores");

        let catalog = PostgresCatalog::new(pool.clone());
        if let Some(path) = &settings.catalog_seed_file {
            let products = seed::read_file(path)?;
            let inserted = catalog.seed_missing(&products).await?;
            tracing::info!(
                path = %path.display(),
                products = products.len(),
                inserted,
                "catalog seeded"
            );
        }

        return Ok(AppServices::new(
            Arc::new(catalog),
            Arc::new(PostgresOrderStore::new(pool)),
            settings.request_timeout,
        ));
    }

    let catalog = match &settings.catalog_seed_file {
        Some(path) => InMemoryCatalog::from_seed_file(path)?,
        None => InMemoryCatalog::new(),
    };
    tracing::info!(products = catalog.len(), "using in-memory stores");
    Ok(AppServices::in_memory(catalog, settings.request_timeout))
}
