use axum::{
    extract::State,
    http::HeaderMap,
    routing::{delete, get, post, put},
    serve, Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::checkout_service::{CheckoutForm, CheckoutService};
use crate::errors::AppError;
use storefront_types::domain::cart::CartLine;
use storefront_types::domain::order::{Order, ShippingAddress};
use storefront_types::domain::product::Product;
use storefront_types::ports::credentials::{CredentialVerifier, Identity, Role};
use storefront_types::ports::repository::StorefrontRepository;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
}

pub struct AppState<R: StorefrontRepository> {
    pub service: CheckoutService<R>,
    pub verifier: Arc<dyn CredentialVerifier>,
}

pub struct HttpServer<R: StorefrontRepository> {
    state: Arc<AppState<R>>,
    config: HttpServerConfig,
}

/// Address fields default to empty strings so an absent field reports as a
/// named validation error instead of a bare deserialization failure.
#[derive(Deserialize, Default, Clone)]
#[serde(default)]
pub struct ShippingAddressInput {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: String,
}

impl From<ShippingAddressInput> for ShippingAddress {
    fn from(a: ShippingAddressInput) -> Self {
        Self {
            full_name: a.full_name,
            street: a.street,
            city: a.city,
            state: a.state,
            zip_code: a.zip_code,
            country: a.country,
            phone: a.phone,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddressInput,
    pub shipping_method: String,
    pub payment_method: String,
}

#[derive(Deserialize)]
pub struct PutCartItemRequest {
    pub product_id: Uuid,
    pub qty: u32,
}

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
}

fn authenticate(
    headers: &HeaderMap,
    verifier: &dyn CredentialVerifier,
) -> Result<Identity, AppError> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;
    verifier.verify(token).ok_or(AppError::Unauthorized)
}

impl<R: StorefrontRepository> HttpServer<R> {
    pub async fn new(
        service: CheckoutService<R>,
        verifier: Arc<dyn CredentialVerifier>,
        config: HttpServerConfig,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            state: Arc::new(AppState { service, verifier }),
            config,
        })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        let state = self.state.clone();
        let app = Router::new()
            .route("/health", get(health))
            .route("/checkout", post(checkout::<R>))
            .route("/cart", get(view_cart::<R>))
            .route("/cart/items", put(put_cart_item::<R>))
            .route("/cart/items/{product_id}", delete(delete_cart_item::<R>))
            .route("/orders", get(list_orders::<R>))
            .route("/orders/{id}", get(get_order::<R>))
            .route("/products", get(list_products::<R>))
            .route("/products", post(create_product::<R>))
            .route("/products/{id}", get(get_product::<R>))
            .layer(trace_layer)
            .with_state(state);

        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (axum::http::StatusCode, Json<serde_json::Value>) {
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({ "status": "ok" })),
    )
}

async fn checkout<R: StorefrontRepository>(
    State(state): State<Arc<AppState<R>>>,
    headers: HeaderMap,
    Json(payload): Json<CheckoutRequest>,
) -> Result<(axum::http::StatusCode, Json<Order>), AppError> {
    let identity = authenticate(&headers, state.verifier.as_ref())?;
    let form = CheckoutForm {
        shipping_address: payload.shipping_address.into(),
        shipping_method: payload.shipping_method,
        payment_method: payload.payment_method,
    };
    let order = state.service.place_order(identity.user_id, form).await?;
    Ok((axum::http::StatusCode::CREATED, Json(order)))
}

async fn view_cart<R: StorefrontRepository>(
    State(state): State<Arc<AppState<R>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<CartLine>>, AppError> {
    let identity = authenticate(&headers, state.verifier.as_ref())?;
    let lines = state.service.view_cart(identity.user_id).await?;
    Ok(Json(lines))
}

async fn put_cart_item<R: StorefrontRepository>(
    State(state): State<Arc<AppState<R>>>,
    headers: HeaderMap,
    Json(payload): Json<PutCartItemRequest>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), AppError> {
    let identity = authenticate(&headers, state.verifier.as_ref())?;
    state
        .service
        .add_to_cart(identity.user_id, payload.product_id, payload.qty)
        .await?;
    Ok((
        axum::http::StatusCode::NO_CONTENT,
        Json(serde_json::json!({})),
    ))
}

async fn delete_cart_item<R: StorefrontRepository>(
    State(state): State<Arc<AppState<R>>>,
    headers: HeaderMap,
    axum::extract::Path(product_id): axum::extract::Path<String>,
) -> Result<(axum::http::StatusCode, Json<serde_json::Value>), AppError> {
    let identity = authenticate(&headers, state.verifier.as_ref())?;
    let product_id =
        Uuid::parse_str(&product_id).map_err(|e| AppError::BadRequest(e.to_string()))?;
    state
        .service
        .remove_from_cart(identity.user_id, product_id)
        .await?;
    Ok((
        axum::http::StatusCode::NO_CONTENT,
        Json(serde_json::json!({})),
    ))
}

async fn list_orders<R: StorefrontRepository>(
    State(state): State<Arc<AppState<R>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Order>>, AppError> {
    let identity = authenticate(&headers, state.verifier.as_ref())?;
    let orders = state.service.list_orders(identity.user_id).await?;
    Ok(Json(orders))
}

async fn get_order<R: StorefrontRepository>(
    State(state): State<Arc<AppState<R>>>,
    headers: HeaderMap,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Result<Json<Order>, AppError> {
    let identity = authenticate(&headers, state.verifier.as_ref())?;
    let id = Uuid::parse_str(&id).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let order = state.service.get_order(identity.user_id, id).await?;
    Ok(Json(order))
}

async fn list_products<R: StorefrontRepository>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = state.service.list_products().await?;
    Ok(Json(products))
}

async fn get_product<R: StorefrontRepository>(
    State(state): State<Arc<AppState<R>>>,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Result<Json<Product>, AppError> {
    let id = Uuid::parse_str(&id).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let product = state.service.get_product(id).await?;
    Ok(Json(product))
}

async fn create_product<R: StorefrontRepository>(
    State(state): State<Arc<AppState<R>>>,
    headers: HeaderMap,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(axum::http::StatusCode, Json<Product>), AppError> {
    let identity = authenticate(&headers, state.verifier.as_ref())?;
    if identity.role != Role::Admin {
        return Err(AppError::Unauthorized);
    }
    let product = state
        .service
        .create_product(payload.name, payload.price_cents, payload.stock)
        .await?;
    Ok((axum::http::StatusCode::CREATED, Json(product)))
}
