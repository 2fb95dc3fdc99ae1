///  To run :
///  cargo r --example client_example
use std::sync::Arc;

use storefront_client::{CheckoutRequest, CreateProductRequest, PutCartItemRequest, StorefrontClient};
use storefront_hex::application::checkout_service::CheckoutService;
use storefront_hex::auth::StaticTokenVerifier;
use storefront_hex::inbound::http::{HttpServer, HttpServerConfig};
use storefront_repo::build_repo;
use storefront_types::domain::order::{OrderStatus, ShippingAddress};
use storefront_types::ports::credentials::{Identity, Role};
use tempfile::tempdir;
use uuid::Uuid;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Start server on an ephemeral port.
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // Use a temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("storefront.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let mut verifier = StaticTokenVerifier::new();
    verifier.insert(
        "admin-token",
        Identity {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        },
    );
    verifier.insert(
        "alice-token",
        Identity {
            user_id: Uuid::new_v4(),
            role: Role::Customer,
        },
    );

    let repo = build_repo(Some(&db_url)).await?;
    let service = CheckoutService::new(repo);
    let server = HttpServer::new(
        service,
        Arc::new(verifier),
        HttpServerConfig {
            port: port.to_string(),
        },
    )
    .await?;

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // Admin seeds the catalog.
    let admin = StorefrontClient::builder(&addr)?
        .with_bearer("admin-token")?
        .build()?;
    let teapot = admin
        .create_product(CreateProductRequest {
            name: "Teapot".into(),
            price_cents: 2000,
            stock: 5,
        })
        .await?;
    println!("Seeded product id={} stock={}", teapot.id, teapot.stock);

    // Customer fills the cart and checks out.
    let alice = StorefrontClient::builder(&addr)?
        .with_bearer("alice-token")?
        .build()?;
    alice
        .put_cart_item(PutCartItemRequest {
            product_id: teapot.id,
            qty: 2,
        })
        .await?;
    println!("Cart has {} line(s)", alice.cart().await?.len());

    let order = alice
        .checkout(CheckoutRequest {
            shipping_address: ShippingAddress {
                full_name: "Alice Example".into(),
                street: "1 Main St".into(),
                city: "Springfield".into(),
                state: "IL".into(),
                zip_code: "62701".into(),
                country: "US".into(),
                phone: "555-010-2030".into(),
            },
            shipping_method: "Express".into(),
            payment_method: "CreditCard".into(),
        })
        .await?;
    println!(
        "Placed order id={} total_cents={} status={:?}",
        order.id, order.total_cents, order.status
    );
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_cents, 6000);

    // The cart is cleared and the catalog stock went down.
    assert!(alice.cart().await?.is_empty());
    let after = alice.get_product(&teapot.id.to_string()).await?;
    println!("Stock after checkout: {}", after.stock);
    assert_eq!(after.stock, 3);

    let history = alice.list_orders().await?;
    println!("Order history has {} entry(ies)", history.len());

    handle.abort();
    Ok(())
}
