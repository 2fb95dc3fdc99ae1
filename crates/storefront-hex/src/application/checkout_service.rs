use std::collections::HashMap;

use crate::errors::AppError;
use storefront_types::domain::cart::CartLine;
use storefront_types::domain::order::{
    Order, OrderLine, PaymentMethod, ShippingAddress, ShippingMethod,
};
use storefront_types::domain::product::Product;
use storefront_types::ports::repository::{StoreError, StorefrontRepository};
use uuid::Uuid;

/// Raw checkout submission. Methods arrive as strings so unknown values
/// surface as field-level validation errors alongside the address fields.
#[derive(Debug, Clone)]
pub struct CheckoutForm {
    pub shipping_address: ShippingAddress,
    pub shipping_method: String,
    pub payment_method: String,
}

pub struct CheckoutService<R: StorefrontRepository> {
    repo: R,
}

impl<R: StorefrontRepository> CheckoutService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Converts the caller's cart into a persisted order.
    ///
    /// Reads happen in a fixed order: validate, load cart, join products,
    /// check stock, freeze prices. The single write is `commit_order`, which
    /// the storage adapter runs all-or-nothing; a concurrent decrement that
    /// would go negative comes back as `OutOfStock` and surfaces as
    /// `InsufficientStock` with nothing persisted.
    pub async fn place_order(&self, user_id: Uuid, form: CheckoutForm) -> Result<Order, AppError> {
        let mut fields = form.shipping_address.invalid_fields();
        let shipping_method = match form.shipping_method.parse::<ShippingMethod>() {
            Ok(m) => Some(m),
            Err(_) => {
                fields.push("shipping_method".to_string());
                None
            }
        };
        let payment_method = match form.payment_method.parse::<PaymentMethod>() {
            Ok(m) => Some(m),
            Err(_) => {
                fields.push("payment_method".to_string());
                None
            }
        };
        if !fields.is_empty() {
            return Err(AppError::Validation(fields));
        }
        let (Some(shipping_method), Some(payment_method)) = (shipping_method, payment_method)
        else {
            return Err(AppError::Validation(fields));
        };

        let cart = self
            .repo
            .cart_lines(user_id)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
        if cart.is_empty() {
            return Err(AppError::EmptyCart);
        }

        // Join against the current catalog; prices are frozen from what we
        // read here, never from whatever the client saw when it added lines.
        let mut lines = Vec::with_capacity(cart.len());
        let mut names: HashMap<Uuid, String> = HashMap::with_capacity(cart.len());
        for cl in &cart {
            let product = self
                .repo
                .product(cl.product_id)
                .await
                .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
                .ok_or_else(|| AppError::NotFound(format!("product {}", cl.product_id)))?;
            if !product.has_stock(cl.qty) {
                return Err(AppError::InsufficientStock(product.name));
            }
            names.insert(product.id, product.name.clone());
            lines.push(OrderLine {
                product_id: product.id,
                name: product.name,
                qty: cl.qty,
                unit_price_cents: product.price_cents,
            });
        }

        let order = Order::place(
            user_id,
            lines,
            shipping_method,
            payment_method,
            form.shipping_address,
        )?;

        match self.repo.commit_order(order).await {
            Ok(order) => {
                tracing::info!(order_id = %order.id, total_cents = order.total_cents, "order placed");
                Ok(order)
            }
            // Lost a race on the final stock check inside the transaction.
            Err(StoreError::OutOfStock(product_id)) => Err(AppError::InsufficientStock(
                names
                    .remove(&product_id)
                    .unwrap_or_else(|| product_id.to_string()),
            )),
            Err(e) => Err(AppError::Internal(anyhow::anyhow!(e.to_string()))),
        }
    }

    pub async fn view_cart(&self, user_id: Uuid) -> Result<Vec<CartLine>, AppError> {
        self.repo
            .cart_lines(user_id)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    pub async fn add_to_cart(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        qty: u32,
    ) -> Result<(), AppError> {
        if qty == 0 {
            return Err(AppError::BadRequest("qty must be > 0".into()));
        }
        let exists = self
            .repo
            .product(product_id)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
            .is_some();
        if !exists {
            return Err(AppError::NotFound(format!("product {product_id}")));
        }
        self.repo
            .put_cart_line(user_id, product_id, qty)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    pub async fn remove_from_cart(&self, user_id: Uuid, product_id: Uuid) -> Result<(), AppError> {
        let removed = self
            .repo
            .remove_cart_line(user_id, product_id)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
        if removed {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("cart line {product_id}")))
        }
    }

    /// Order reads are owner-scoped; someone else's order is a 404, not a 403,
    /// so ids cannot be probed.
    pub async fn get_order(&self, user_id: Uuid, order_id: Uuid) -> Result<Order, AppError> {
        match self
            .repo
            .order(order_id)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        {
            Some(o) if o.user_id == user_id => Ok(o),
            _ => Err(AppError::NotFound(format!("order {order_id}"))),
        }
    }

    pub async fn list_orders(&self, user_id: Uuid) -> Result<Vec<Order>, AppError> {
        self.repo
            .orders_for_user(user_id)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    pub async fn create_product(
        &self,
        name: String,
        price_cents: i64,
        stock: i64,
    ) -> Result<Product, AppError> {
        let product =
            Product::new(name, price_cents, stock).map_err(|e| AppError::BadRequest(e.to_string()))?;
        self.repo
            .upsert_product(product)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<Product, AppError> {
        match self
            .repo
            .product(product_id)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        {
            Some(p) => Ok(p),
            None => Err(AppError::NotFound(format!("product {product_id}"))),
        }
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        self.repo
            .list_products()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_repo::memory::InMemoryStore;
    use storefront_types::domain::order::{OrderStatus, PaymentStatus};

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Alice Doe".into(),
            street: "1 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zip_code: "62701".into(),
            country: "US".into(),
            phone: "555-010-2030".into(),
        }
    }

    fn form() -> CheckoutForm {
        CheckoutForm {
            shipping_address: address(),
            shipping_method: "Express".into(),
            payment_method: "CreditCard".into(),
        }
    }

    async fn seed_product(
        svc: &CheckoutService<InMemoryStore>,
        name: &str,
        price_cents: i64,
        stock: i64,
    ) -> Product {
        svc.create_product(name.into(), price_cents, stock)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn place_order_creates_order_and_clears_cart() {
        let svc = CheckoutService::new(InMemoryStore::new());
        let user = Uuid::new_v4();
        let tea = seed_product(&svc, "Tea", 2000, 5).await;
        let mug = seed_product(&svc, "Mug", 500, 10).await;
        svc.add_to_cart(user, tea.id, 2).await.unwrap();
        svc.add_to_cart(user, mug.id, 3).await.unwrap();

        let order = svc.place_order(user, form()).await.unwrap();
        assert_eq!(order.subtotal_cents, 5500);
        assert_eq!(order.shipping_cost_cents, 2000);
        assert_eq!(order.total_cents, 7500);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.lines.len(), 2);

        // Cart cleared, stock decremented.
        assert!(svc.view_cart(user).await.unwrap().is_empty());
        assert_eq!(svc.get_product(tea.id).await.unwrap().stock, 3);
        assert_eq!(svc.get_product(mug.id).await.unwrap().stock, 7);

        let fetched = svc.get_order(user, order.id).await.unwrap();
        assert_eq!(fetched.total_cents, 7500);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let svc = CheckoutService::new(InMemoryStore::new());
        let res = svc.place_order(Uuid::new_v4(), form()).await;
        assert!(matches!(res, Err(AppError::EmptyCart)));
    }

    #[tokio::test]
    async fn validation_reports_every_offending_field() {
        let svc = CheckoutService::new(InMemoryStore::new());
        let mut bad = form();
        bad.shipping_address.city = " ".into();
        bad.shipping_address.phone = "12".into();
        bad.shipping_method = "Overnight".into();
        let res = svc.place_order(Uuid::new_v4(), bad).await;
        match res {
            Err(AppError::Validation(fields)) => {
                assert_eq!(
                    fields,
                    vec![
                        "city".to_string(),
                        "phone".to_string(),
                        "shipping_method".to_string()
                    ]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn insufficient_stock_names_the_product_and_mutates_nothing() {
        let svc = CheckoutService::new(InMemoryStore::new());
        let user = Uuid::new_v4();
        let tea = seed_product(&svc, "Tea", 2000, 5).await;
        let mug = seed_product(&svc, "Mug", 500, 1).await;
        svc.add_to_cart(user, tea.id, 1).await.unwrap();
        svc.add_to_cart(user, mug.id, 2).await.unwrap();

        let res = svc.place_order(user, form()).await;
        match res {
            Err(AppError::InsufficientStock(name)) => assert_eq!(name, "Mug"),
            other => panic!("expected insufficient stock, got {other:?}"),
        }

        // No partial effects: stock untouched, cart intact, no orders.
        assert_eq!(svc.get_product(tea.id).await.unwrap().stock, 5);
        assert_eq!(svc.get_product(mug.id).await.unwrap().stock, 1);
        assert_eq!(svc.view_cart(user).await.unwrap().len(), 2);
        assert!(svc.list_orders(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn prices_are_frozen_at_checkout_time() {
        let svc = CheckoutService::new(InMemoryStore::new());
        let user = Uuid::new_v4();
        let mut tea = seed_product(&svc, "Tea", 1000, 5).await;
        svc.add_to_cart(user, tea.id, 1).await.unwrap();

        // Catalog price changes after the cart was built but before checkout.
        tea.price_cents = 1500;
        svc.repo.upsert_product(tea.clone()).await.unwrap();

        let order = svc.place_order(user, form()).await.unwrap();
        assert_eq!(order.lines[0].unit_price_cents, 1500);

        // Later catalog changes never touch the order.
        tea.price_cents = 9000;
        svc.repo.upsert_product(tea).await.unwrap();
        let fetched = svc.get_order(user, order.id).await.unwrap();
        assert_eq!(fetched.lines[0].unit_price_cents, 1500);
    }

    #[tokio::test]
    async fn vanished_product_is_not_found() {
        let svc = CheckoutService::new(InMemoryStore::new());
        let user = Uuid::new_v4();

        // Adding an unknown product is rejected up front.
        let res = svc.add_to_cart(user, Uuid::new_v4(), 1).await;
        assert!(matches!(res, Err(AppError::NotFound(_))));

        // A line whose product vanished between cart add and checkout.
        svc.repo.put_cart_line(user, Uuid::new_v4(), 1).await.unwrap();
        let res = svc.place_order(user, form()).await;
        assert!(matches!(res, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn orders_are_owner_scoped() {
        let svc = CheckoutService::new(InMemoryStore::new());
        let alice = Uuid::new_v4();
        let tea = seed_product(&svc, "Tea", 1000, 5).await;
        svc.add_to_cart(alice, tea.id, 1).await.unwrap();
        let order = svc.place_order(alice, form()).await.unwrap();

        let mallory = Uuid::new_v4();
        let res = svc.get_order(mallory, order.id).await;
        assert!(matches!(res, Err(AppError::NotFound(_))));
        assert!(svc.list_orders(mallory).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cart_line_put_replaces_quantity() {
        let svc = CheckoutService::new(InMemoryStore::new());
        let user = Uuid::new_v4();
        let tea = seed_product(&svc, "Tea", 1000, 5).await;
        svc.add_to_cart(user, tea.id, 1).await.unwrap();
        svc.add_to_cart(user, tea.id, 4).await.unwrap();
        let cart = svc.view_cart(user).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].qty, 4);

        svc.remove_from_cart(user, tea.id).await.unwrap();
        assert!(svc.view_cart(user).await.unwrap().is_empty());
        let res = svc.remove_from_cart(user, tea.id).await;
        assert!(matches!(res, Err(AppError::NotFound(_))));
    }
}
