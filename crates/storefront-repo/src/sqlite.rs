use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use storefront_types::domain::cart::CartLine;
use storefront_types::domain::order::{
    Order, OrderLine, OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress, ShippingMethod,
};
use storefront_types::domain::product::Product;
use storefront_types::ports::repository::{StoreError, StorefrontRepository};

pub struct SqliteStore {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct DbProduct {
    id: String,
    name: String,
    price_cents: i64,
    stock: i64,
}

impl DbProduct {
    fn into_product(self) -> Result<Product, StoreError> {
        let id = Uuid::parse_str(&self.id).map_err(|e| StoreError::Db(e.to_string()))?;
        Ok(Product {
            id,
            name: self.name,
            price_cents: self.price_cents,
            stock: self.stock,
        })
    }
}

#[derive(FromRow)]
struct DbCartLine {
    product_id: String,
    qty: i64,
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    user_id: String,
    subtotal_cents: i64,
    shipping_cost_cents: i64,
    total_cents: i64,
    status: String,
    payment_status: String,
    shipping_method: String,
    payment_method: String,
    shipping_address_json: String,
    lines_json: String,
    created_at: String,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, StoreError> {
        let status = match self.status.as_str() {
            "Pending" => OrderStatus::Pending,
            "Processing" => OrderStatus::Processing,
            "Shipped" => OrderStatus::Shipped,
            "Delivered" => OrderStatus::Delivered,
            "Cancelled" => OrderStatus::Cancelled,
            _ => OrderStatus::Pending,
        };
        let payment_status = match self.payment_status.as_str() {
            "Paid" => PaymentStatus::Paid,
            _ => PaymentStatus::Pending,
        };
        let shipping_method = ShippingMethod::from_str(&self.shipping_method)
            .map_err(StoreError::Db)?;
        let payment_method =
            PaymentMethod::from_str(&self.payment_method).map_err(StoreError::Db)?;
        let shipping_address: ShippingAddress =
            serde_json::from_str(&self.shipping_address_json)
                .map_err(|e| StoreError::Db(e.to_string()))?;
        let lines: Vec<OrderLine> = serde_json::from_str(&self.lines_json)
            .map_err(|e| StoreError::Db(e.to_string()))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| StoreError::Db(e.to_string()))?
            .with_timezone(&Utc);
        let id = Uuid::parse_str(&self.id).map_err(|e| StoreError::Db(e.to_string()))?;
        let user_id = Uuid::parse_str(&self.user_id).map_err(|e| StoreError::Db(e.to_string()))?;
        Ok(Order {
            id,
            user_id,
            lines,
            subtotal_cents: self.subtotal_cents,
            shipping_cost_cents: self.shipping_cost_cents,
            total_cents: self.total_cents,
            status,
            payment_status,
            shipping_method,
            payment_method,
            shipping_address,
            created_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, subtotal_cents, shipping_cost_cents, total_cents, \
     status, payment_status, shipping_method, payment_method, shipping_address_json, \
     lines_json, created_at";

impl SqliteStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        // Run migration from migration file, one statement at a time.
        let ddl = include_str!("../migrations/0001_create_storefront.sql");
        for stmt in ddl.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(stmt).execute(&pool).await?;
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl StorefrontRepository for SqliteStore {
    async fn upsert_product(&self, product: Product) -> Result<Product, StoreError> {
        sqlx::query(
            "INSERT INTO products (id, name, price_cents, stock) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 price_cents = excluded.price_cents,
                 stock = excluded.stock",
        )
        .bind(product.id.to_string())
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Db(e.to_string()))?;
        Ok(product)
    }

    async fn product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let row: Option<DbProduct> =
            sqlx::query_as("SELECT id, name, price_cents, stock FROM products WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Db(e.to_string()))?;
        row.map(|r| r.into_product()).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows: Vec<DbProduct> =
            sqlx::query_as("SELECT id, name, price_cents, stock FROM products")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::Db(e.to_string()))?;
        rows.into_iter().map(|r| r.into_product()).collect()
    }

    async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>, StoreError> {
        let rows: Vec<DbCartLine> =
            sqlx::query_as("SELECT product_id, qty FROM cart_lines WHERE user_id = ?")
                .bind(user_id.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::Db(e.to_string()))?;
        rows.into_iter()
            .map(|r| {
                let product_id =
                    Uuid::parse_str(&r.product_id).map_err(|e| StoreError::Db(e.to_string()))?;
                Ok(CartLine {
                    product_id,
                    qty: u32::try_from(r.qty).map_err(|e| StoreError::Db(e.to_string()))?,
                })
            })
            .collect()
    }

    async fn put_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        qty: u32,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO cart_lines (user_id, product_id, qty) VALUES (?, ?, ?)
             ON CONFLICT(user_id, product_id) DO UPDATE SET qty = excluded.qty",
        )
        .bind(user_id.to_string())
        .bind(product_id.to_string())
        .bind(i64::from(qty))
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Db(e.to_string()))?;
        Ok(())
    }

    async fn remove_cart_line(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM cart_lines WHERE user_id = ? AND product_id = ?")
            .bind(user_id.to_string())
            .bind(product_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Db(e.to_string()))?;
        Ok(res.rows_affected() > 0)
    }

    async fn commit_order(&self, order: Order) -> Result<Order, StoreError> {
        let lines_json =
            serde_json::to_string(&order.lines).map_err(|e| StoreError::Db(e.to_string()))?;
        let address_json = serde_json::to_string(&order.shipping_address)
            .map_err(|e| StoreError::Db(e.to_string()))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Db(e.to_string()))?;

        // Conditional decrement: the WHERE clause refuses any update that
        // would drive stock negative, so a lost race rolls the whole
        // transaction back instead of persisting a partial order.
        for line in &order.lines {
            let res =
                sqlx::query("UPDATE products SET stock = stock - ? WHERE id = ? AND stock >= ?")
                    .bind(i64::from(line.qty))
                    .bind(line.product_id.to_string())
                    .bind(i64::from(line.qty))
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| StoreError::Db(e.to_string()))?;
            if res.rows_affected() == 0 {
                tx.rollback()
                    .await
                    .map_err(|e| StoreError::Db(e.to_string()))?;
                return Err(StoreError::OutOfStock(line.product_id));
            }
        }

        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(order.id.to_string())
        .bind(order.user_id.to_string())
        .bind(order.subtotal_cents)
        .bind(order.shipping_cost_cents)
        .bind(order.total_cents)
        .bind(format!("{:?}", order.status))
        .bind(format!("{:?}", order.payment_status))
        .bind(format!("{:?}", order.shipping_method))
        .bind(format!("{:?}", order.payment_method))
        .bind(address_json)
        .bind(lines_json)
        .bind(order.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Db(e.to_string()))?;

        sqlx::query("DELETE FROM cart_lines WHERE user_id = ?")
            .bind(order.user_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Db(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Db(e.to_string()))?;
        Ok(order)
    }

    async fn order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Db(e.to_string()))?;
        row.map(|r| r.into_order()).transpose()
    }

    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<DbOrder> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY created_at"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Db(e.to_string()))?;
        rows.into_iter().map(|r| r.into_order()).collect()
    }
}
