//! End-to-end behaviour of the inventory store through its public API.

use stockroom_core::{CategoryId, DomainError, Price, ProductId};
use stockroom_inventory::{CategoryPatch, InventoryAction, NewCategory, NewProduct};
use stockroom_store::{Store, StoreConfig, StoreError};

fn price(text: &str) -> Price {
    text.parse().unwrap()
}

async fn store() -> Store {
    Store::in_memory().await.unwrap()
}

/// Tools category holding a Hammer (9.99, quantity 5).
async fn hammer(store: &Store) -> (CategoryId, ProductId) {
    let tools = store
        .categories()
        .create(NewCategory::new("Tools", None))
        .await
        .unwrap();
    let hammer = store
        .products()
        .create(NewProduct::new("Hammer", price("9.99"), 5).category(tools))
        .await
        .unwrap();
    (tools, hammer)
}

fn deltas(entries: &[stockroom_inventory::LogEntry]) -> Vec<(InventoryAction, i64)> {
    entries.iter().map(|e| (e.action, e.delta)).collect()
}

#[tokio::test]
async fn sale_reduces_stock_and_is_logged() {
    let store = store().await;
    let (_, id) = hammer(&store).await;

    let quantity = store
        .ledger()
        .adjust_quantity(id, -3, InventoryAction::Sale, None)
        .await
        .unwrap();
    assert_eq!(quantity, 2);
    assert_eq!(store.products().get_by_id(id).await.unwrap().product.quantity, 2);

    let history = store.log().list_for_product(id).await.unwrap();
    assert_eq!(
        deltas(&history),
        vec![(InventoryAction::Sale, -3), (InventoryAction::Create, 5)]
    );
}

#[tokio::test]
async fn overselling_is_rejected_without_side_effects() {
    let store = store().await;
    let (_, id) = hammer(&store).await;
    store.ledger().sell(id, 3, None).await.unwrap();

    let err = store
        .ledger()
        .adjust_quantity(id, -5, InventoryAction::Sale, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Domain(DomainError::NegativeStock { .. })
    ));

    assert_eq!(store.products().get_by_id(id).await.unwrap().product.quantity, 2);
    assert_eq!(store.log().list_for_product(id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn search_matches_substrings_case_insensitively() {
    let store = store().await;
    let (_, id) = hammer(&store).await;

    let found = store.products().search("ham").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].product.id, id);
    assert_eq!(found[0].category_name.as_deref(), Some("Tools"));

    assert!(store.products().search("xyz").await.unwrap().is_empty());
}

#[tokio::test]
async fn deleted_product_keeps_its_history() {
    let store = store().await;
    let (_, id) = hammer(&store).await;
    store.ledger().sell(id, 3, None).await.unwrap();

    let removed = store.products().delete(id).await.unwrap();
    assert_eq!(removed.quantity, 2);

    assert!(store.products().get_by_id(id).await.unwrap_err().is_not_found());

    let history = store.log().list_for_product(id).await.unwrap();
    assert_eq!(
        deltas(&history),
        vec![
            (InventoryAction::Delete, -2),
            (InventoryAction::Sale, -3),
            (InventoryAction::Create, 5),
        ]
    );
    assert_eq!(store.log().balance_for_product(id).await.unwrap(), 0);
}

#[tokio::test]
async fn duplicate_category_name_is_rejected() {
    let store = store().await;
    let id = store
        .categories()
        .create(NewCategory::new("A", Some("first")))
        .await
        .unwrap();

    let err = store
        .categories()
        .create(NewCategory::new("A", None))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Domain(DomainError::DuplicateName(ref n)) if n == "A"));

    let all = store.categories().list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, id);
    assert_eq!(all[0].description.as_deref(), Some("first"));
}

#[tokio::test]
async fn referenced_category_cannot_be_deleted() {
    let store = store().await;
    let (tools, _) = hammer(&store).await;

    let err = store.categories().delete(tools).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Domain(DomainError::HasDependents { .. })
    ));
    assert_eq!(store.products().list_by_category(tools).await.unwrap().len(), 1);
}

#[tokio::test]
async fn attribute_edits_never_touch_the_log() {
    let store = store().await;
    let (tools, id) = hammer(&store).await;
    let renamed = store
        .categories()
        .update(tools, CategoryPatch::default().name("Hand Tools"))
        .await
        .unwrap();
    assert_eq!(renamed.name, "Hand Tools");

    let view = store
        .products()
        .update(
            id,
            stockroom_inventory::ProductPatch::default()
                .price(price("11.50"))
                .description("Steel claw hammer"),
        )
        .await
        .unwrap();
    assert_eq!(view.product.quantity, 5);
    assert_eq!(view.category_name.as_deref(), Some("Hand Tools"));
    assert_eq!(store.log().list_for_product(id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn ids_are_not_reused_after_delete() {
    let store = store().await;
    let (_, first) = hammer(&store).await;
    store.products().delete(first).await.unwrap();

    let second = store
        .products()
        .create(NewProduct::new("Mallet", Price::ZERO, 0))
        .await
        .unwrap();
    assert!(second.get() > first.get());
    assert_eq!(store.log().list_for_product(second).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::file(dir.path().join("inventory.db")).with_sample_data(false);
    let store = Store::open(&config).await.unwrap();
    let id = store
        .products()
        .create(NewProduct::new("Hammer", Price::ZERO, 5))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.ledger().sell(id, 1, None).await
        }));
    }

    let mut sold = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => sold += 1,
            Err(StoreError::Domain(DomainError::NegativeStock { .. })) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let quantity = store.products().get_by_id(id).await.unwrap().product.quantity;
    assert_eq!(sold, 5);
    assert_eq!(quantity, 0);
    assert_eq!(store.log().balance_for_product(id).await.unwrap(), quantity);
    assert!(store.ledger().reconcile().await.unwrap().is_empty());
    store.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_and_restocks_are_all_applied() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::file(dir.path().join("inventory.db")).with_sample_data(false);
    let store = Store::open(&config).await.unwrap();
    let id = store
        .products()
        .create(NewProduct::new("Hammer", Price::ZERO, 50))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..40 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                store.ledger().sell(id, 1, None).await
            } else {
                store.ledger().restock(id, 1, None).await
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.products().get_by_id(id).await.unwrap().product.quantity, 50);
    assert_eq!(store.log().list_for_product(id).await.unwrap().len(), 41);
    assert!(store.ledger().reconcile().await.unwrap().is_empty());
    store.close().await;
}

#[tokio::test]
async fn repeated_lookups_return_identical_records() {
    let store = store().await;
    let (tools, id) = hammer(&store).await;
    store.ledger().sell(id, 1, Some("Counter".into())).await.unwrap();

    let first = store.products().get_by_id(id).await.unwrap();
    let second = store.products().get_by_id(id).await.unwrap();
    assert_eq!(first, second);

    let first = store.categories().get_by_id(tools).await.unwrap();
    let second = store.categories().get_by_id(tools).await.unwrap();
    assert_eq!(first, second);
}
