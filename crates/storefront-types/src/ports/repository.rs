use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::cart::CartLine;
use crate::domain::order::Order;
use crate::domain::product::Product;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("db error: {0}")]
    Db(String),
    /// A conditional stock decrement inside `commit_order` would have gone
    /// negative; the whole commit was rolled back.
    #[error("out of stock: {0}")]
    OutOfStock(Uuid),
}

/// Storage port spanning the catalog, per-user carts and the order log.
///
/// `commit_order` is the one atomic step: it must insert the order,
/// decrement every line's product stock and delete the user's cart lines
/// all-or-nothing. Decrements must be safe under concurrent commits; two
/// checkouts racing on the last unit of a product see exactly one succeed.
#[async_trait]
pub trait StorefrontRepository: Send + Sync + 'static {
    async fn upsert_product(&self, product: Product) -> Result<Product, StoreError>;
    async fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError>;
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>, StoreError>;
    /// Insert-or-replace a cart line for (user, product).
    async fn put_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        qty: u32,
    ) -> Result<(), StoreError>;
    async fn remove_cart_line(&self, user_id: Uuid, product_id: Uuid)
        -> Result<bool, StoreError>;

    async fn commit_order(&self, order: Order) -> Result<Order, StoreError>;
    async fn order(&self, id: Uuid) -> Result<Option<Order>, StoreError>;
    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError>;
}
