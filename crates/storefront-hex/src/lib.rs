//! storefront-hex: hexagonal storefront checkout library (core + inbound HTTP)

pub mod auth;
pub mod config;
pub mod errors;

pub mod application;

pub use storefront_types::{domain, ports};

pub mod inbound; // HTTP adapter (server + handlers)
