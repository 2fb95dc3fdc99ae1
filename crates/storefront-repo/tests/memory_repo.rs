#![cfg(feature = "memory")]

use storefront_repo::memory::InMemoryStore;
use storefront_types::domain::order::{
    Order, OrderLine, PaymentMethod, ShippingAddress, ShippingMethod,
};
use storefront_types::domain::product::Product;
use storefront_types::ports::repository::{StoreError, StorefrontRepository};
use uuid::Uuid;

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Test User".into(),
        street: "1 Main St".into(),
        city: "Springfield".into(),
        state: "IL".into(),
        zip_code: "62701".into(),
        country: "US".into(),
        phone: "555-010-2030".into(),
    }
}

fn order_for(user: Uuid, product: &Product, qty: u32) -> Order {
    Order::place(
        user,
        vec![OrderLine {
            product_id: product.id,
            name: product.name.clone(),
            qty,
            unit_price_cents: product.price_cents,
        }],
        ShippingMethod::Standard,
        PaymentMethod::CreditCard,
        address(),
    )
    .unwrap()
}

#[tokio::test]
async fn product_and_cart_crud_flow() {
    let store = InMemoryStore::new();
    let user = Uuid::new_v4();
    let product = Product::new("Mug".into(), 500, 10).unwrap();
    store.upsert_product(product.clone()).await.unwrap();

    let fetched = store.product(product.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Mug");
    assert_eq!(store.list_products().await.unwrap().len(), 1);

    store.put_cart_line(user, product.id, 2).await.unwrap();
    store.put_cart_line(user, product.id, 3).await.unwrap();
    let lines = store.cart_lines(user).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].qty, 3);

    assert!(store.remove_cart_line(user, product.id).await.unwrap());
    assert!(!store.remove_cart_line(user, product.id).await.unwrap());
    assert!(store.cart_lines(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn commit_decrements_stock_and_clears_cart() {
    let store = InMemoryStore::new();
    let user = Uuid::new_v4();
    let product = Product::new("Mug".into(), 500, 10).unwrap();
    store.upsert_product(product.clone()).await.unwrap();
    store.put_cart_line(user, product.id, 4).await.unwrap();

    let order = order_for(user, &product, 4);
    let committed = store.commit_order(order.clone()).await.unwrap();
    assert_eq!(committed.id, order.id);

    assert_eq!(store.product(product.id).await.unwrap().unwrap().stock, 6);
    assert!(store.cart_lines(user).await.unwrap().is_empty());

    let fetched = store.order(order.id).await.unwrap().unwrap();
    assert_eq!(fetched.total_cents, order.total_cents);
    assert_eq!(store.orders_for_user(user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failing_line_aborts_whole_commit() {
    let store = InMemoryStore::new();
    let user = Uuid::new_v4();
    let tea = Product::new("Tea".into(), 2000, 5).unwrap();
    let mug = Product::new("Mug".into(), 500, 1).unwrap();
    store.upsert_product(tea.clone()).await.unwrap();
    store.upsert_product(mug.clone()).await.unwrap();
    store.put_cart_line(user, tea.id, 1).await.unwrap();
    store.put_cart_line(user, mug.id, 2).await.unwrap();

    let order = Order::place(
        user,
        vec![
            OrderLine {
                product_id: tea.id,
                name: tea.name.clone(),
                qty: 1,
                unit_price_cents: tea.price_cents,
            },
            OrderLine {
                product_id: mug.id,
                name: mug.name.clone(),
                qty: 2,
                unit_price_cents: mug.price_cents,
            },
        ],
        ShippingMethod::Standard,
        PaymentMethod::PayPal,
        address(),
    )
    .unwrap();

    let res = store.commit_order(order.clone()).await;
    match res {
        Err(StoreError::OutOfStock(id)) => assert_eq!(id, mug.id),
        other => panic!("expected out of stock, got {other:?}"),
    }

    // Nothing moved: stock intact, cart intact, no order row.
    assert_eq!(store.product(tea.id).await.unwrap().unwrap().stock, 5);
    assert_eq!(store.product(mug.id).await.unwrap().unwrap().stock, 1);
    assert_eq!(store.cart_lines(user).await.unwrap().len(), 2);
    assert!(store.order(order.id).await.unwrap().is_none());
}

#[tokio::test]
async fn racing_commits_on_last_unit_admit_exactly_one() {
    let store = InMemoryStore::new();
    let product = Product::new("Last Mug".into(), 500, 1).unwrap();
    store.upsert_product(product.clone()).await.unwrap();

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    store.put_cart_line(alice, product.id, 1).await.unwrap();
    store.put_cart_line(bob, product.id, 1).await.unwrap();

    let a = order_for(alice, &product, 1);
    let b = order_for(bob, &product, 1);

    let (ra, rb) = tokio::join!(
        store.commit_order(a),
        store.commit_order(b)
    );

    let successes = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    let losers: Vec<_> = [ra, rb].into_iter().filter_map(Result::err).collect();
    assert!(matches!(losers[0], StoreError::OutOfStock(id) if id == product.id));

    // Final stock is zero, never negative.
    assert_eq!(store.product(product.id).await.unwrap().unwrap().stock, 0);
}
