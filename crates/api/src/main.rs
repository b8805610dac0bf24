use std::fs::File;
use std::sync::Arc;

use anyhow::Context;

use rickshaw_infra::{bootstrap, CsvStockStore, LedgerConfig, LedgerService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rickshaw_observability::init();

    let config = LedgerConfig::from_env().context("invalid ledger configuration")?;

    let bom_file = File::open(&config.bom_path)
        .with_context(|| format!("failed to open BOM table {}", config.bom_path.display()))?;
    let registry = rickshaw_bom::load_requirements(bom_file, &config.bom_layout)
        .with_context(|| format!("failed to load BOM table {}", config.bom_path.display()))?;
    tracing::info!(
        path = %config.bom_path.display(),
        models = registry.len(),
        "BOM registry loaded"
    );

    let store = Arc::new(CsvStockStore::new(&config.stock_path, config.stock_columns.clone()));
    let variants = config.default_variants.clone();
    let service = LedgerService::open(Arc::new(registry), store, config.bands, || {
        bootstrap::default_snapshot(&variants)
    })
    .context("failed to open stock ledger")?;

    let app = rickshaw_api::app::build_app(Arc::new(service));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
