use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

/// Credential service boundary. Token minting and password hashing live
/// behind it; the checkout core only ever asks "who is this token".
pub trait CredentialVerifier: Send + Sync + 'static {
    fn verify(&self, token: &str) -> Option<Identity>;
}
