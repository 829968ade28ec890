use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, error, info, info_span};
use ulid::Ulid;

use crate::auth::pipeline::Authorizer;
use crate::config::AppConfig;
use crate::store::Store;

pub mod handlers;
mod openapi;
pub(crate) mod recaptcha;

pub use openapi::openapi;

/// Build the application router around a shared [`Authorizer`].
#[must_use]
pub fn router(authorizer: Arc<Authorizer>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/signin", post(handlers::signin::signin))
        .route("/api/token", get(handlers::token::token))
        .route("/api/me", get(handlers::me::me))
        .route(
            "/api/finishpasswordreset",
            post(handlers::password_reset::finish_password_reset),
        )
        .route("/api/su", post(handlers::su::su))
        .route("/api/docs/openapi.json", get(openapi::docs))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(authorizer)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, store: Arc<dyn Store>, config: AppConfig) -> Result<()> {
    let authorizer = Arc::new(Authorizer::new(store, config));
    let app = router(authorizer);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Gracefully shutdown"),
        Err(err) => error!("Failed to listen for shutdown signal: {err}"),
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
