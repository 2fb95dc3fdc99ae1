#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use storefront_types::domain::cart::CartLine;
use storefront_types::domain::order::Order;
use storefront_types::domain::product::Product;
use storefront_types::ports::repository::{StoreError, StorefrontRepository};
use uuid::Uuid;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub struct Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    memory: memory::InMemoryStore,
    #[cfg(feature = "sqlite")]
    sqlite: sqlite::SqliteStore,
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self {
            memory: memory::InMemoryStore::new(),
        })
    }

    #[cfg(feature = "sqlite")]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or("sqlite://storefront.db");
        let sqlite = sqlite::SqliteStore::new(url).await?;
        Ok(Self { sqlite })
    }
}

#[cfg(all(feature = "memory", not(feature = "sqlite")))]
#[async_trait::async_trait]
impl StorefrontRepository for Repo {
    async fn upsert_product(&self, product: Product) -> Result<Product, StoreError> {
        self.memory.upsert_product(product).await
    }

    async fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        self.memory.product(id).await
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        self.memory.list_products().await
    }

    async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>, StoreError> {
        self.memory.cart_lines(user_id).await
    }

    async fn put_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        qty: u32,
    ) -> Result<(), StoreError> {
        self.memory.put_cart_line(user_id, product_id, qty).await
    }

    async fn remove_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, StoreError> {
        self.memory.remove_cart_line(user_id, product_id).await
    }

    async fn commit_order(&self, order: Order) -> Result<Order, StoreError> {
        self.memory.commit_order(order).await
    }

    async fn order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        self.memory.order(id).await
    }

    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError> {
        self.memory.orders_for_user(user_id).await
    }
}

// With sqlite enabled the durable adapter always backs the facade.
#[cfg(feature = "sqlite")]
#[async_trait::async_trait]
impl StorefrontRepository for Repo {
    async fn upsert_product(&self, product: Product) -> Result<Product, StoreError> {
        self.sqlite.upsert_product(product).await
    }

    async fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        self.sqlite.product(id).await
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        self.sqlite.list_products().await
    }

    async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>, StoreError> {
        self.sqlite.cart_lines(user_id).await
    }

    async fn put_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        qty: u32,
    ) -> Result<(), StoreError> {
        self.sqlite.put_cart_line(user_id, product_id, qty).await
    }

    async fn remove_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, StoreError> {
        self.sqlite.remove_cart_line(user_id, product_id).await
    }

    async fn commit_order(&self, order: Order) -> Result<Order, StoreError> {
        self.sqlite.commit_order(order).await
    }

    async fn order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        self.sqlite.order(id).await
    }

    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError> {
        self.sqlite.orders_for_user(user_id).await
    }
}
