use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One (product, quantity) entry in a user's cart. At most one line per
/// product; putting the same product again replaces the quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub qty: u32,
}
