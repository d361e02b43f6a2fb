//! Sample data written into a newly created store.

use chrono::Utc;
use sqlx::{Sqlite, Transaction};
use stockroom_core::{CategoryId, Price};
use stockroom_inventory::{NewCategory, NewLogEntry, NewProduct};

use crate::category::insert_category;
use crate::error::{StoreError, StoreResult};
use crate::ledger::append_entry;
use crate::product::insert_product;

const CATEGORIES: [(&str, &str); 4] = [
    ("Electronics", "Electronic devices and accessories"),
    ("Clothing", "Apparel and fashion items"),
    ("Groceries", "Food and household supplies"),
    ("Furniture", "Home and office furniture"),
];

/// `(name, description, price, quantity, index into CATEGORIES)`
const PRODUCTS: [(&str, &str, &str, i64, usize); 6] = [
    ("Laptop", "High-performance laptop", "999.99", 10, 0),
    ("Smartphone", "Latest smartphone model", "699.99", 15, 0),
    ("T-shirt", "Cotton t-shirt", "19.99", 50, 1),
    ("Jeans", "Denim jeans", "39.99", 30, 1),
    ("Rice", "5kg bag of rice", "12.99", 100, 2),
    ("Office Chair", "Ergonomic office chair", "149.99", 5, 3),
];

pub(crate) async fn sample_data(tx: &mut Transaction<'_, Sqlite>) -> StoreResult<()> {
    let now = Utc::now();

    let mut category_ids: Vec<CategoryId> = Vec::with_capacity(CATEGORIES.len());
    for (name, description) in CATEGORIES {
        let draft = NewCategory::new(name, Some(description)).normalized()?;
        category_ids.push(insert_category(tx, &draft).await?);
    }

    for (name, description, price, quantity, category) in PRODUCTS {
        let price: Price = price.parse()?;
        let category_id = *category_ids
            .get(category)
            .ok_or_else(|| StoreError::persistence("seed_products", "unknown sample category"))?;
        let draft = NewProduct::new(name, price, quantity)
            .description(description)
            .category(category_id)
            .normalized()?;

        let product_id = insert_product(tx, &draft, now).await?;
        append_entry(tx, &NewLogEntry::initial(product_id, name, quantity), now).await?;
    }

    tracing::info!(
        categories = CATEGORIES.len(),
        products = PRODUCTS.len(),
        "seeded sample inventory"
    );
    Ok(())
}
