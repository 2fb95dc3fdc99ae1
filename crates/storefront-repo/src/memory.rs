use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use storefront_types::domain::cart::CartLine;
use storefront_types::domain::order::Order;
use storefront_types::domain::product::Product;
use storefront_types::ports::repository::{StoreError, StorefrontRepository};

#[derive(Clone)]
pub struct InMemoryStore {
    products: Arc<DashMap<Uuid, Product>>,
    carts: Arc<DashMap<Uuid, Vec<CartLine>>>,
    orders: Arc<DashMap<Uuid, Order>>,
    /// Serializes commits; the stock check and decrement must not interleave
    /// with another commit targeting the same product.
    commit_lock: Arc<Mutex<()>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            products: Arc::new(DashMap::new()),
            carts: Arc::new(DashMap::new()),
            orders: Arc::new(DashMap::new()),
            commit_lock: Arc::new(Mutex::new(())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorefrontRepository for InMemoryStore {
    async fn upsert_product(&self, product: Product) -> Result<Product, StoreError> {
        self.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get(&id).map(|r| r.clone()))
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.iter().map(|kv| kv.value().clone()).collect())
    }

    async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>, StoreError> {
        Ok(self
            .carts
            .get(&user_id)
            .map(|r| r.clone())
            .unwrap_or_default())
    }

    async fn put_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        qty: u32,
    ) -> Result<(), StoreError> {
        let mut lines = self.carts.entry(user_id).or_default();
        if let Some(line) = lines.iter_mut().find(|l| l.product_id == product_id) {
            line.qty = qty;
        } else {
            lines.push(CartLine { product_id, qty });
        }
        Ok(())
    }

    async fn remove_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, StoreError> {
        if let Some(mut lines) = self.carts.get_mut(&user_id) {
            let before = lines.len();
            lines.retain(|l| l.product_id != product_id);
            return Ok(lines.len() < before);
        }
        Ok(false)
    }

    async fn commit_order(&self, order: Order) -> Result<Order, StoreError> {
        let _guard = self
            .commit_lock
            .lock()
            .map_err(|_| StoreError::Db("commit lock poisoned".into()))?;

        // Verify every decrement before mutating anything; a failing line
        // leaves stock, cart and order log untouched.
        for line in &order.lines {
            let available = self
                .products
                .get(&line.product_id)
                .map(|p| p.has_stock(line.qty))
                .unwrap_or(false);
            if !available {
                return Err(StoreError::OutOfStock(line.product_id));
            }
        }
        for line in &order.lines {
            if let Some(mut p) = self.products.get_mut(&line.product_id) {
                p.stock -= i64::from(line.qty);
            }
        }
        self.carts.remove(&order.user_id);
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.get(&id).map(|r| r.clone()))
    }

    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|kv| kv.value().user_id == user_id)
            .map(|kv| kv.value().clone())
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }
}
