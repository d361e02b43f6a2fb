//! Category repository.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteExecutor, SqlitePool, Transaction};
use tracing::instrument;

use stockroom_core::{CategoryId, DomainError};
use stockroom_inventory::{Category, CategoryPatch, NewCategory};

use crate::begin_write;
use crate::error::{StoreResult, is_foreign_key_violation, is_unique_violation, map_sqlx_error};

/// CRUD over categories with unique names and a deletion guard.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CategoryRepository<'a> {
    pub(crate) fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All categories ordered by name.
    #[instrument(skip(self), err)]
    pub async fn list_all(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT category_id, name, description
            FROM categories
            ORDER BY name, category_id
            "#,
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_categories", e))?;

        rows.iter().map(category_from_row).collect()
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    pub async fn get_by_id(&self, id: CategoryId) -> StoreResult<Category> {
        load_category(self.pool, id)
            .await?
            .ok_or_else(|| DomainError::category_not_found(id).into())
    }

    /// Create a category, returning its id.
    #[instrument(skip(self, draft), fields(name = %draft.name), err)]
    pub async fn create(&self, draft: NewCategory) -> StoreResult<CategoryId> {
        let draft = draft.normalized()?;

        let mut tx = begin_write(self.pool).await?;
        let id = insert_category(&mut tx, &draft).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(category_id = %id, name = %draft.name, "category created");
        Ok(id)
    }

    /// Replace the given fields, keeping the rest.
    #[instrument(skip(self, patch), fields(category_id = %id), err)]
    pub async fn update(&self, id: CategoryId, patch: CategoryPatch) -> StoreResult<Category> {
        let mut tx = begin_write(self.pool).await?;

        let current = load_category(&mut *tx, id)
            .await?
            .ok_or_else(|| DomainError::category_not_found(id))?;
        let updated = patch.apply_to(&current)?;

        sqlx::query(
            r#"
            UPDATE categories
            SET name = ?1, description = ?2
            WHERE category_id = ?3
            "#,
        )
        .bind(&updated.name)
        .bind(&updated.description)
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::duplicate_name(updated.name.clone()).into()
            } else {
                map_sqlx_error("update_category", e)
            }
        })?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(category_id = %id, "category updated");
        Ok(updated)
    }

    /// Remove a category that no product references.
    #[instrument(skip(self), fields(category_id = %id), err)]
    pub async fn delete(&self, id: CategoryId) -> StoreResult<()> {
        let mut tx = begin_write(self.pool).await?;

        if load_category(&mut *tx, id).await?.is_none() {
            return Err(DomainError::category_not_found(id).into());
        }

        let dependents: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = ?1")
                .bind(id.get())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("count_category_products", e))?;
        if dependents > 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(DomainError::HasDependents {
                category_id: id,
                products: dependents as u64,
            }
            .into());
        }

        sqlx::query("DELETE FROM categories WHERE category_id = ?1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    DomainError::HasDependents {
                        category_id: id,
                        products: 0,
                    }
                    .into()
                } else {
                    map_sqlx_error("delete_category", e)
                }
            })?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }
}

pub(crate) async fn insert_category(
    tx: &mut Transaction<'_, Sqlite>,
    draft: &NewCategory,
) -> StoreResult<CategoryId> {
    let result = sqlx::query(
        r#"
        INSERT INTO categories (name, description)
        VALUES (?1, ?2)
        "#,
    )
    .bind(&draft.name)
    .bind(&draft.description)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            DomainError::duplicate_name(draft.name.clone()).into()
        } else {
            map_sqlx_error("insert_category", e)
        }
    })?;

    Ok(CategoryId::from_raw(result.last_insert_rowid()))
}

pub(crate) async fn load_category<'e, E>(
    executor: E,
    id: CategoryId,
) -> StoreResult<Option<Category>>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        r#"
        SELECT category_id, name, description
        FROM categories
        WHERE category_id = ?1
        "#,
    )
    .bind(id.get())
    .fetch_optional(executor)
    .await
    .map_err(|e| map_sqlx_error("load_category", e))?;

    row.as_ref().map(category_from_row).transpose()
}

fn category_from_row(row: &SqliteRow) -> StoreResult<Category> {
    let decode = |e| map_sqlx_error("decode_category", e);
    Ok(Category {
        id: CategoryId::from_raw(row.try_get("category_id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
    })
}
