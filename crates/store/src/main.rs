//! `stockroom-init`: open (and on first run, seed) the inventory store, then
//! report its state.

use anyhow::Context;
use stockroom_store::{Store, StoreConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let config = StoreConfig::from_env().context("invalid store configuration")?;
    let store = Store::open(&config)
        .await
        .with_context(|| format!("failed to open store at {:?}", config.location))?;

    let categories = store.categories().list_all().await?.len();
    let products = store.products().list_all().await?;
    let units: i64 = products.iter().map(|view| view.product.quantity).sum();
    tracing::info!(
        created = store.was_created(),
        categories,
        products = products.len(),
        units,
        "inventory loaded"
    );

    let discrepancies = store.ledger().reconcile().await?;
    for found in &discrepancies {
        tracing::warn!(
            product_id = %found.product_id,
            product = %found.product_name,
            quantity = found.quantity,
            logged = found.logged,
            "quantity does not match inventory log"
        );
    }

    store.close().await;

    if !discrepancies.is_empty() {
        anyhow::bail!("{} product(s) out of balance with the inventory log", discrepancies.len());
    }
    Ok(())
}
