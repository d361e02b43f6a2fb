//! Product repository.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteExecutor, SqlitePool, Transaction};
use tracing::instrument;

use stockroom_core::{CategoryId, DomainError, Price, ProductId};
use stockroom_inventory::{NewLogEntry, NewProduct, Product, ProductPatch, ProductView};

use crate::category::load_category;
use crate::begin_write;
use crate::error::{StoreError, StoreResult, is_foreign_key_violation, map_sqlx_error};
use crate::ledger::append_entry;

const SELECT_VIEW: &str = r#"
    SELECT
        p.product_id,
        p.name,
        p.description,
        p.price,
        p.quantity,
        p.category_id,
        p.created_at,
        p.updated_at,
        c.name AS category_name
    FROM products p
    LEFT JOIN categories c ON c.category_id = p.category_id
"#;

/// CRUD over products. Creation and deletion write their ledger entry in the
/// same transaction as the product row.
#[derive(Debug, Clone, Copy)]
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    pub(crate) fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All products ordered by name, with their category display name.
    #[instrument(skip(self), err)]
    pub async fn list_all(&self) -> StoreResult<Vec<ProductView>> {
        let rows = sqlx::query(&format!("{SELECT_VIEW} ORDER BY p.name, p.product_id"))
            .fetch_all(self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter().map(product_view_from_row).collect()
    }

    /// Products filed under `category_id`, ordered by name.
    #[instrument(skip(self), fields(category_id = %category_id), err)]
    pub async fn list_by_category(&self, category_id: CategoryId) -> StoreResult<Vec<ProductView>> {
        let rows = sqlx::query(&format!(
            "{SELECT_VIEW} WHERE p.category_id = ?1 ORDER BY p.name, p.product_id"
        ))
        .bind(category_id.get())
        .fetch_all(self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products_by_category", e))?;

        rows.iter().map(product_view_from_row).collect()
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn get_by_id(&self, id: ProductId) -> StoreResult<ProductView> {
        let row = sqlx::query(&format!("{SELECT_VIEW} WHERE p.product_id = ?1"))
            .bind(id.get())
            .fetch_optional(self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;

        match row {
            Some(row) => product_view_from_row(&row),
            None => Err(DomainError::product_not_found(id).into()),
        }
    }

    /// Case-insensitive substring search over name and description.
    ///
    /// A blank keyword matches nothing. Matching happens in Rust so that case
    /// folding covers non-ASCII text and `%`/`_` are taken literally.
    #[instrument(skip(self), err)]
    pub async fn search(&self, keyword: &str) -> StoreResult<Vec<ProductView>> {
        if keyword.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut products = self.list_all().await?;
        products.retain(|view| view.product.matches_keyword(keyword));
        Ok(products)
    }

    /// Insert a product and its `CREATE` log entry atomically.
    #[instrument(skip(self, draft), fields(name = %draft.name, quantity = draft.quantity), err)]
    pub async fn create(&self, draft: NewProduct) -> StoreResult<ProductId> {
        let draft = draft.normalized()?;
        let now = Utc::now();

        let mut tx = begin_write(self.pool).await?;

        if let Some(category_id) = draft.category_id {
            ensure_category(&mut tx, category_id).await?;
        }

        let id = insert_product(&mut tx, &draft, now).await?;
        append_entry(
            &mut tx,
            &NewLogEntry::created(id, &draft.name, draft.quantity),
            now,
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(product_id = %id, quantity = draft.quantity, "product created");
        Ok(id)
    }

    /// Replace the given attributes. Never touches quantity or the log.
    #[instrument(skip(self, patch), fields(product_id = %id), err)]
    pub async fn update(&self, id: ProductId, patch: ProductPatch) -> StoreResult<ProductView> {
        let mut tx = begin_write(self.pool).await?;

        let current = load_product(&mut *tx, id)
            .await?
            .ok_or_else(|| DomainError::product_not_found(id))?;
        if let Some(category_id) = patch.category_id {
            ensure_category(&mut tx, category_id).await?;
        }
        let updated = patch.apply_to(&current, Utc::now())?;

        sqlx::query(
            r#"
            UPDATE products
            SET name = ?1,
                description = ?2,
                price = ?3,
                category_id = ?4,
                updated_at = ?5
            WHERE product_id = ?6
            "#,
        )
        .bind(&updated.name)
        .bind(&updated.description)
        .bind(updated.price.to_string())
        .bind(updated.category_id.map(CategoryId::get))
        .bind(updated.updated_at)
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .map_err(|e| category_write_error("update_product", updated.category_id, e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(product_id = %id, "product updated");
        self.get_by_id(id).await
    }

    /// Log the removal of the remaining stock, then delete the product.
    ///
    /// Returns the product as it was just before deletion.
    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn delete(&self, id: ProductId) -> StoreResult<Product> {
        let mut tx = begin_write(self.pool).await?;

        let product = load_product(&mut *tx, id)
            .await?
            .ok_or_else(|| DomainError::product_not_found(id))?;

        append_entry(&mut tx, &NewLogEntry::deleted(&product), Utc::now()).await?;

        sqlx::query("DELETE FROM products WHERE product_id = ?1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(product_id = %id, removed = product.quantity, "product deleted");
        Ok(product)
    }
}

async fn ensure_category(
    tx: &mut Transaction<'_, Sqlite>,
    category_id: CategoryId,
) -> StoreResult<()> {
    match load_category(&mut **tx, category_id).await? {
        Some(_) => Ok(()),
        None => Err(DomainError::InvalidCategory(category_id).into()),
    }
}

fn category_write_error(
    operation: &'static str,
    category_id: Option<CategoryId>,
    err: sqlx::Error,
) -> StoreError {
    match category_id {
        Some(category_id) if is_foreign_key_violation(&err) => {
            DomainError::InvalidCategory(category_id).into()
        }
        _ => map_sqlx_error(operation, err),
    }
}

pub(crate) async fn insert_product(
    tx: &mut Transaction<'_, Sqlite>,
    draft: &NewProduct,
    now: DateTime<Utc>,
) -> StoreResult<ProductId> {
    let result = sqlx::query(
        r#"
        INSERT INTO products (
            name,
            description,
            price,
            quantity,
            category_id,
            created_at,
            updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
        "#,
    )
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(draft.price.to_string())
    .bind(draft.quantity)
    .bind(draft.category_id.map(CategoryId::get))
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(|e| category_write_error("insert_product", draft.category_id, e))?;

    Ok(ProductId::from_raw(result.last_insert_rowid()))
}

pub(crate) async fn load_product<'e, E>(executor: E, id: ProductId) -> StoreResult<Option<Product>>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        r#"
        SELECT
            product_id,
            name,
            description,
            price,
            quantity,
            category_id,
            created_at,
            updated_at
        FROM products
        WHERE product_id = ?1
        "#,
    )
    .bind(id.get())
    .fetch_optional(executor)
    .await
    .map_err(|e| map_sqlx_error("load_product", e))?;

    row.as_ref().map(product_from_row).transpose()
}

fn product_from_row(row: &SqliteRow) -> StoreResult<Product> {
    let decode = |e| map_sqlx_error("decode_product", e);

    let price: String = row.try_get("price").map_err(decode)?;
    let price: Price = price.parse().map_err(|e: DomainError| {
        StoreError::persistence("decode_product", format!("stored price is invalid: {e}"))
    })?;
    let category_id: Option<i64> = row.try_get("category_id").map_err(decode)?;

    Ok(Product {
        id: ProductId::from_raw(row.try_get("product_id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        price,
        quantity: row.try_get("quantity").map_err(decode)?,
        category_id: category_id.map(CategoryId::from_raw),
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}

fn product_view_from_row(row: &SqliteRow) -> StoreResult<ProductView> {
    Ok(ProductView {
        product: product_from_row(row)?,
        category_name: row
            .try_get("category_name")
            .map_err(|e| map_sqlx_error("decode_product", e))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;
    use stockroom_inventory::{CategoryPatch, InventoryAction, NewCategory, UNCATEGORIZED};

    fn price(text: &str) -> Price {
        text.parse().unwrap()
    }

    async fn store_with_tools() -> (Store, CategoryId) {
        let store = Store::in_memory().await.unwrap();
        let tools = store
            .categories()
            .create(NewCategory::new("Tools", None))
            .await
            .unwrap();
        (store, tools)
    }

    #[tokio::test]
    async fn create_writes_product_and_create_entry() {
        let (store, tools) = store_with_tools().await;
        let id = store
            .products()
            .create(
                NewProduct::new("Hammer", price("9.99"), 5)
                    .description("Claw hammer")
                    .category(tools),
            )
            .await
            .unwrap();

        let view = store.products().get_by_id(id).await.unwrap();
        assert_eq!(view.product.name, "Hammer");
        assert_eq!(view.product.price, price("9.99"));
        assert_eq!(view.product.quantity, 5);
        assert_eq!(view.category_label(), "Tools");
        assert_eq!(view.product.created_at, view.product.updated_at);

        let history = store.log().list_for_product(id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, InventoryAction::Create);
        assert_eq!(history[0].delta, 5);
        assert_eq!(history[0].note.as_deref(), Some("Product created"));
    }

    #[tokio::test]
    async fn create_with_unknown_category_writes_nothing() {
        let store = Store::in_memory().await.unwrap();
        let err = store
            .products()
            .create(NewProduct::new("Hammer", price("9.99"), 5).category(CategoryId::from_raw(42)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::Domain(DomainError::InvalidCategory(id)) if id.get() == 42
        ));
        assert!(store.products().list_all().await.unwrap().is_empty());
        assert!(store.log().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_negative_quantity() {
        let store = Store::in_memory().await.unwrap();
        let err = store
            .products()
            .create(NewProduct::new("Hammer", Price::ZERO, -2))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn uncategorized_products_are_marked() {
        let store = Store::in_memory().await.unwrap();
        let id = store
            .products()
            .create(NewProduct::new("Loose screws", price("0.10"), 100))
            .await
            .unwrap();

        let view = store.products().get_by_id(id).await.unwrap();
        assert_eq!(view.category_name, None);
        assert_eq!(view.category_label(), UNCATEGORIZED);
    }

    #[tokio::test]
    async fn list_all_is_ordered_by_name() {
        let (store, tools) = store_with_tools().await;
        for name in ["Wrench", "Anvil", "Mallet"] {
            store
                .products()
                .create(NewProduct::new(name, Price::ZERO, 1).category(tools))
                .await
                .unwrap();
        }

        let names: Vec<String> = store
            .products()
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.product.name)
            .collect();
        assert_eq!(names, vec!["Anvil", "Mallet", "Wrench"]);
    }

    #[tokio::test]
    async fn renamed_category_shows_up_in_views() {
        let (store, tools) = store_with_tools().await;
        let id = store
            .products()
            .create(NewProduct::new("Hammer", Price::ZERO, 1).category(tools))
            .await
            .unwrap();

        store
            .categories()
            .update(tools, CategoryPatch::default().name("Hardware"))
            .await
            .unwrap();

        let view = store.products().get_by_id(id).await.unwrap();
        assert_eq!(view.category_label(), "Hardware");
    }

    #[tokio::test]
    async fn search_matches_name_or_description_case_insensitively() {
        let (store, tools) = store_with_tools().await;
        store
            .products()
            .create(NewProduct::new("Hammer", price("9.99"), 5).category(tools))
            .await
            .unwrap();
        store
            .products()
            .create(
                NewProduct::new("Mallet", price("14.00"), 2)
                    .description("Rubber-headed, not a HAMMER"),
            )
            .await
            .unwrap();
        store
            .products()
            .create(NewProduct::new("100% cotton rag", price("1.00"), 9))
            .await
            .unwrap();

        let found: Vec<String> = store
            .products()
            .search("hAm")
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.product.name)
            .collect();
        assert_eq!(found, vec!["Hammer", "Mallet"]);

        let literal = store.products().search("0%").await.unwrap();
        assert_eq!(literal.len(), 1);
        assert!(store.products().search("_").await.unwrap().is_empty());
        assert!(store.products().search("xyz").await.unwrap().is_empty());
        assert!(store.products().search("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_changes_attributes_but_not_stock() {
        let (store, tools) = store_with_tools().await;
        let garden = store
            .categories()
            .create(NewCategory::new("Garden", None))
            .await
            .unwrap();
        let id = store
            .products()
            .create(NewProduct::new("Hammer", price("9.99"), 5).category(tools))
            .await
            .unwrap();
        let before = store.products().get_by_id(id).await.unwrap();

        let after = store
            .products()
            .update(
                id,
                ProductPatch::default()
                    .price(price("11.49"))
                    .category(garden),
            )
            .await
            .unwrap();

        assert_eq!(after.product.name, "Hammer");
        assert_eq!(after.product.price, price("11.49"));
        assert_eq!(after.product.quantity, 5);
        assert_eq!(after.category_label(), "Garden");
        assert_eq!(after.product.created_at, before.product.created_at);
        assert!(after.product.updated_at >= before.product.updated_at);
        assert_eq!(store.log().list_for_product(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_with_unknown_category_is_rejected() {
        let (store, tools) = store_with_tools().await;
        let id = store
            .products()
            .create(NewProduct::new("Hammer", Price::ZERO, 1).category(tools))
            .await
            .unwrap();

        let err = store
            .products()
            .update(id, ProductPatch::default().category(CategoryId::from_raw(77)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::InvalidCategory(_))));
        assert_eq!(
            store.products().get_by_id(id).await.unwrap().product.category_id,
            Some(tools)
        );
    }

    #[tokio::test]
    async fn update_missing_product_is_not_found() {
        let store = Store::in_memory().await.unwrap();
        let err = store
            .products()
            .update(ProductId::from_raw(8), ProductPatch::default().name("Ghost"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_missing_product_is_not_found_and_logs_nothing() {
        let store = Store::in_memory().await.unwrap();
        let err = store
            .products()
            .delete(ProductId::from_raw(8))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.log().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_by_category_filters() {
        let (store, tools) = store_with_tools().await;
        store
            .products()
            .create(NewProduct::new("Hammer", Price::ZERO, 1).category(tools))
            .await
            .unwrap();
        store
            .products()
            .create(NewProduct::new("Rice", Price::ZERO, 1))
            .await
            .unwrap();

        let in_tools = store.products().list_by_category(tools).await.unwrap();
        assert_eq!(in_tools.len(), 1);
        assert_eq!(in_tools[0].product.name, "Hammer");
    }
}
