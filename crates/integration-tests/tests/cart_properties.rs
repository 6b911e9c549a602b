//! Cart engine behaviour against the in-memory gateway.
//!
//! Covers line coalescing, price snapshots, removal through quantity
//! updates, derived totals, clearing, owner isolation and failure handling.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;

use shopfront_core::{OwnerKey, SessionId, UserId};
use shopfront_integration_tests::{FlakyGateway, product};
use shopfront_storefront::gateway::{Gateway, InMemoryGateway, Table};
use shopfront_storefront::models::{Product, ProductPatch};
use shopfront_storefront::{CartEngine, CartError, CartNotice, FixedOwner};

fn session(id: &str) -> FixedOwner {
    // Fixed tokens so "abc" and "xyz" are distinct, readable owners.
    let uuid = match id {
        "abc" => "00000000-0000-4000-8000-000000000abc",
        "xyz" => "00000000-0000-4000-8000-000000000f0f",
        other => other,
    };
    FixedOwner(OwnerKey::Session(uuid.parse::<SessionId>().unwrap()))
}

fn anonymous() -> FixedOwner {
    FixedOwner(OwnerKey::Session(SessionId::generate()))
}

// =============================================================================
// Coalescing and price snapshot
// =============================================================================

#[tokio::test]
async fn test_repeated_add_coalesces_into_one_line() {
    let gateway = Arc::new(InMemoryGateway::new());
    let mug = product(gateway.as_ref(), "Mug", 1000).await;
    let cart = CartEngine::new(Arc::clone(&gateway), anonymous());

    for (first, second) in [(1, 1), (2, 3), (7, 11)] {
        cart.clear().await.unwrap();
        cart.add_item(mug.id, first).await.unwrap();
        cart.add_item(mug.id, second).await.unwrap();

        let items = cart.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, first + second);
    }
    assert_eq!(gateway.row_count(Table::CartItems).await, 1);
}

#[tokio::test]
async fn test_price_change_does_not_reprice_existing_line() {
    let gateway = Arc::new(InMemoryGateway::new());
    let mug = product(gateway.as_ref(), "Mug", 1000).await;
    let cart = CartEngine::new(Arc::clone(&gateway), anonymous());
    cart.add_item(mug.id, 1).await.unwrap();

    let patch = ProductPatch {
        price: Some(Decimal::new(1999, 2)),
        ..ProductPatch::default()
    };
    gateway.update::<Product, _>(mug.id, &patch).await.unwrap();

    cart.refresh().await.unwrap();
    assert_eq!(cart.items().await[0].unit_price, Decimal::new(1000, 2));

    // Coalescing into the line keeps the original snapshot too.
    cart.add_item(mug.id, 1).await.unwrap();
    let items = cart.items().await;
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].unit_price, Decimal::new(1000, 2));
}

// =============================================================================
// Removal and totals
// =============================================================================

#[tokio::test]
async fn test_zero_and_negative_quantity_remove_line() {
    let gateway = Arc::new(InMemoryGateway::new());
    let mug = product(gateway.as_ref(), "Mug", 1000).await;
    let cart = CartEngine::new(Arc::clone(&gateway), anonymous());

    for quantity in [0, -5] {
        cart.add_item(mug.id, 3).await.unwrap();
        let item_id = cart.items().await[0].id;

        cart.update_quantity(item_id, quantity).await.unwrap();
        assert!(cart.items().await.iter().all(|item| item.id != item_id));
    }
}

#[tokio::test]
async fn test_totals_are_derived_from_lines() {
    let gateway = Arc::new(InMemoryGateway::new());
    let mug = product(gateway.as_ref(), "Mug", 1250).await;
    let tee = product(gateway.as_ref(), "Tee", 2499).await;
    let sticker = product(gateway.as_ref(), "Sticker", 99).await;
    let cart = CartEngine::new(Arc::clone(&gateway), anonymous());

    assert_eq!(cart.total_items().await, 0);
    assert_eq!(cart.total_price().await, Decimal::ZERO);

    cart.add_item(mug.id, 2).await.unwrap();
    cart.add_item(tee.id, 1).await.unwrap();
    cart.add_item(sticker.id, 10).await.unwrap();

    let items = cart.items().await;
    let expected_items: i64 = items.iter().map(|i| i64::from(i.quantity)).sum();
    let expected_price: Decimal = items
        .iter()
        .map(|i| i.unit_price * Decimal::from(i.quantity))
        .sum();

    let totals = cart.totals().await;
    assert_eq!(totals.total_items, expected_items);
    assert_eq!(totals.total_price, expected_price);
    assert_eq!(totals.total_items, 13);
    assert_eq!(totals.total_price, Decimal::new(5989, 2));
    assert_eq!(totals.subtotal().display(), "$59.89");

    cart.clear().await.unwrap();
    assert_eq!(cart.total_items().await, 0);
    assert_eq!(cart.total_price().await, Decimal::ZERO);
}

#[tokio::test]
async fn test_clear_twice_is_harmless() {
    let gateway = Arc::new(InMemoryGateway::new());
    let mug = product(gateway.as_ref(), "Mug", 1000).await;
    let cart = CartEngine::new(Arc::clone(&gateway), anonymous());
    cart.add_item(mug.id, 2).await.unwrap();

    cart.clear().await.unwrap();
    assert!(cart.items().await.is_empty());
    cart.clear().await.unwrap();
    assert!(cart.items().await.is_empty());
    assert_eq!(gateway.row_count(Table::CartItems).await, 0);
}

#[tokio::test]
async fn test_worked_example() {
    let gateway = Arc::new(InMemoryGateway::new());
    let p1 = product(gateway.as_ref(), "P1", 1000).await;
    let cart = CartEngine::new(Arc::clone(&gateway), anonymous());

    cart.add_item(p1.id, 2).await.unwrap();
    let items = cart.items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, p1.id);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].unit_price, Decimal::new(1000, 2));
    assert_eq!(cart.total_items().await, 2);
    assert_eq!(cart.total_price().await, Decimal::new(2000, 2));

    cart.add_item(p1.id, 3).await.unwrap();
    let items = cart.items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 5);
    assert_eq!(cart.total_price().await, Decimal::new(5000, 2));

    cart.update_quantity(items[0].id, 0).await.unwrap();
    assert!(cart.items().await.is_empty());
    assert_eq!(cart.total_price().await, Decimal::ZERO);
}

// =============================================================================
// Owner isolation
// =============================================================================

#[tokio::test]
async fn test_owners_do_not_see_each_other() {
    let gateway = Arc::new(InMemoryGateway::new());
    let mug = product(gateway.as_ref(), "Mug", 1000).await;

    let abc = CartEngine::new(Arc::clone(&gateway), session("abc"));
    let xyz = CartEngine::new(Arc::clone(&gateway), session("xyz"));
    let user = CartEngine::new(
        Arc::clone(&gateway),
        FixedOwner(OwnerKey::User(UserId::from_uuid(uuid::Uuid::new_v4()))),
    );

    abc.add_item(mug.id, 2).await.unwrap();

    xyz.refresh().await.unwrap();
    user.refresh().await.unwrap();
    assert!(xyz.items().await.is_empty());
    assert!(user.items().await.is_empty());

    // Same product, separate lines per owner.
    xyz.add_item(mug.id, 1).await.unwrap();
    abc.refresh().await.unwrap();
    assert_eq!(abc.items().await[0].quantity, 2);
    assert_eq!(gateway.row_count(Table::CartItems).await, 2);

    xyz.clear().await.unwrap();
    abc.refresh().await.unwrap();
    assert_eq!(abc.items().await.len(), 1);
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn test_failed_write_leaves_items_and_notifies() {
    let gateway = Arc::new(FlakyGateway::new(InMemoryGateway::new()));
    let mug = product(gateway.inner(), "Mug", 1000).await;
    let cart = CartEngine::new(Arc::clone(&gateway), anonymous());
    cart.add_item(mug.id, 2).await.unwrap();
    let before = cart.items().await;

    let mut notices = cart.subscribe();
    gateway.fail_writes(true);

    let err = cart.add_item(mug.id, 1).await.unwrap_err();
    assert!(matches!(err, CartError::Gateway(_)));
    assert_eq!(cart.items().await, before);
    assert!(!cart.is_loading());

    let err = cart.update_quantity(before[0].id, 9).await.unwrap_err();
    assert!(matches!(err, CartError::Gateway(_)));
    let err = cart.clear().await.unwrap_err();
    assert!(matches!(err, CartError::Gateway(_)));
    assert_eq!(cart.items().await, before);
    assert!(!cart.is_loading());

    for _ in 0..3 {
        match notices.try_recv().unwrap() {
            CartNotice::Failed { message } => assert!(!message.contains("pool")),
            other => panic!("unexpected notice {other:?}"),
        }
    }

    gateway.fail_writes(false);
    cart.add_item(mug.id, 1).await.unwrap();
    assert_eq!(cart.items().await[0].quantity, 3);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_items() {
    let gateway = Arc::new(FlakyGateway::new(InMemoryGateway::new()));
    let mug = product(gateway.inner(), "Mug", 1000).await;
    let cart = CartEngine::new(Arc::clone(&gateway), anonymous());
    cart.add_item(mug.id, 2).await.unwrap();

    gateway.fail_reads(true);
    let err = cart.refresh().await.unwrap_err();
    assert!(matches!(err, CartError::Gateway(_)));
    assert_eq!(cart.items().await.len(), 1);
    assert!(!cart.is_loading());
}

#[tokio::test]
async fn test_failed_trailing_refresh_still_reports_success() {
    let gateway = Arc::new(FlakyGateway::new(InMemoryGateway::new()));
    let mug = product(gateway.inner(), "Mug", 1000).await;
    let cart = CartEngine::new(Arc::clone(&gateway), anonymous());
    cart.add_item(mug.id, 2).await.unwrap();
    let item_id = cart.items().await[0].id;
    let mut notices = cart.subscribe();

    // Delete needs no read, so only the reload afterwards fails.
    gateway.fail_reads(true);
    cart.remove_item(item_id).await.unwrap();
    assert_eq!(gateway.inner().row_count(Table::CartItems).await, 0);
    assert!(notices.try_recv().unwrap().is_failure());
    assert_eq!(notices.try_recv().unwrap(), CartNotice::ItemRemoved);

    gateway.fail_reads(false);
    cart.refresh().await.unwrap();
    assert!(cart.items().await.is_empty());
}

#[tokio::test]
async fn test_loading_while_gateway_call_in_flight() {
    let gateway = Arc::new(FlakyGateway::new(InMemoryGateway::new()));
    let cart = Arc::new(CartEngine::new(Arc::clone(&gateway), anonymous()));
    assert!(!cart.is_loading());

    let hold = gateway.hold().await;
    let task = tokio::spawn({
        let cart = Arc::clone(&cart);
        async move { cart.refresh().await }
    });
    while !cart.is_loading() {
        tokio::task::yield_now().await;
    }

    drop(hold);
    task.await.unwrap().unwrap();
    assert!(!cart.is_loading());
    assert!(gateway.calls() >= 1);
}
