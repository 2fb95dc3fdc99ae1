use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog entry as checkout sees it: price and available stock.
/// Checkout reads both and decrements stock; product lifecycle lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
}

impl Product {
    pub fn new(name: String, price_cents: i64, stock: i64) -> anyhow::Result<Self> {
        if name.trim().is_empty() {
            anyhow::bail!("product name empty");
        }
        if price_cents <= 0 {
            anyhow::bail!("price must be > 0");
        }
        if stock < 0 {
            anyhow::bail!("stock must be >= 0");
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            price_cents,
            stock,
        })
    }

    pub fn has_stock(&self, qty: u32) -> bool {
        self.stock >= i64::from(qty)
    }
}
