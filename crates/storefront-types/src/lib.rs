//! storefront-types: domain model and ports for the storefront checkout core.

pub mod domain;
pub mod ports;
