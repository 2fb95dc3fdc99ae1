mod server;

pub use server::{
    CheckoutRequest, CreateProductRequest, HttpServer, HttpServerConfig, PutCartItemRequest,
    ShippingAddressInput,
};
