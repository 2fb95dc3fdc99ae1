pub mod credentials;
pub mod repository;
