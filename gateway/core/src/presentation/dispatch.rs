// Copyright (c) 2026 Flynn Controller gRPC Contributors
// SPDX-License-Identifier: BSD-3-Clause

//! HTTP entry point
//!
//! Every request passes through the same stack before a route is chosen:
//!
//! ```text
//! request id ─► trace span ─► CORS ─► RouteChain
//!                                      ├─ grpc-web  (POST application/grpc-web*)
//!                                      └─ fallback  (GET /health, 404)
//! ```
//!
//! [`RouteChain`] tries its predicates in registration order and hands the
//! request to the first router whose predicate matches, or to the fallback.
//!
//! # Architecture
//!
//! - **Layer:** Presentation Layer
//! - **Purpose:** Protocol sniffing, CORS and request logging

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ETAG, IF_MATCH, IF_NONE_MATCH};
use http::{HeaderName, Method, Request, StatusCode};
use tower::util::Oneshot;
use tower::{Layer, Service, ServiceBuilder, ServiceExt};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info_span};

use super::grpc::server::ControllerService;
use crate::domain::gateway_config::ServerConfig;

const GRPC_WEB_CONTENT_TYPE: &str = "application/grpc-web";
const REQUEST_ID_HEADER: &str = "x-request-id";
const FALLBACK_ROUTE: &str = "fallback";

/// Whether the request is framed as gRPC-Web (`POST` with an
/// `application/grpc-web*` content type).
pub fn is_grpc_web_request<B>(request: &Request<B>) -> bool {
    request.method() == Method::POST
        && request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with(GRPC_WEB_CONTENT_TYPE))
}

type Predicate = Arc<dyn Fn(&Request<Body>) -> bool + Send + Sync>;

#[derive(Clone)]
struct Route {
    name: &'static str,
    matches: Predicate,
    router: Router,
}

/// Ordered predicate → router pairs with a fallback.
#[derive(Clone)]
pub struct RouteChain {
    routes: Vec<Route>,
    fallback: Router,
}

impl RouteChain {
    pub fn new(fallback: Router) -> Self {
        Self {
            routes: Vec::new(),
            fallback,
        }
    }

    /// Append a route. Earlier routes win.
    pub fn route<P>(mut self, name: &'static str, predicate: P, router: Router) -> Self
    where
        P: Fn(&Request<Body>) -> bool + Send + Sync + 'static,
    {
        self.routes.push(Route {
            name,
            matches: Arc::new(predicate),
            router,
        });
        self
    }

    /// Name and router of the first route accepting `request`.
    pub fn select(&self, request: &Request<Body>) -> (&'static str, &Router) {
        self.routes
            .iter()
            .find(|route| (route.matches)(request))
            .map(|route| (route.name, &route.router))
            .unwrap_or((FALLBACK_ROUTE, &self.fallback))
    }
}

impl fmt::Debug for RouteChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.routes.iter().map(|route| route.name).collect();
        f.debug_struct("RouteChain").field("routes", &names).finish()
    }
}

impl Service<Request<Body>> for RouteChain {
    type Response = Response;
    type Error = Infallible;
    type Future = Oneshot<Router, Request<Body>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let (name, router) = self.select(&request);
        debug!(route = name, uri = %request.uri(), "Dispatching request");
        router.clone().oneshot(request)
    }
}

/// gRPC-Web translation in front of the controller service.
pub fn grpc_web_router(service: ControllerService) -> Router {
    let grpc_web = tonic_web::GrpcWebLayer::new().layer(service.into_server());
    Router::new().fallback_service(grpc_web)
}

/// Handlers for everything that is not gRPC-Web.
pub fn fallback_router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
    }))
}

async fn not_found_handler() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}

/// Browser access policy: any origin, credentials allowed, preflight cached
/// for `max_age`.
pub fn cors_layer(max_age: Duration) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::HEAD,
        ])
        .allow_headers([
            AUTHORIZATION,
            ACCEPT,
            CONTENT_TYPE,
            IF_MATCH,
            IF_NONE_MATCH,
            HeaderName::from_static("x-grpc-web"),
        ])
        .expose_headers([ETAG])
        .allow_credentials(true)
        .max_age(max_age)
}

/// Assemble the full HTTP application for `service`.
pub fn build_app(service: ControllerService, config: &ServerConfig) -> Router {
    let chain = RouteChain::new(fallback_router()).route(
        "grpc-web",
        is_grpc_web_request::<Body>,
        grpc_web_router(service),
    );

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    Router::new().fallback_service(chain).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or_default();
                    info_span!(
                        "request",
                        component = "controller-grpc",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(cors_layer(config.cors_max_age())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, content_type: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri("/controller.v1.Controller/ListApps");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_grpc_web_sniff() {
        assert!(is_grpc_web_request(&request(
            Method::POST,
            Some("application/grpc-web+proto")
        )));
        assert!(is_grpc_web_request(&request(
            Method::POST,
            Some("application/grpc-web-text")
        )));
        assert!(!is_grpc_web_request(&request(
            Method::GET,
            Some("application/grpc-web")
        )));
        assert!(!is_grpc_web_request(&request(Method::POST, Some("application/grpc"))));
        assert!(!is_grpc_web_request(&request(Method::POST, Some("application/json"))));
        assert!(!is_grpc_web_request(&request(Method::POST, None)));
    }

    #[test]
    fn test_route_chain_first_match_wins() {
        let chain = RouteChain::new(Router::new())
            .route("posts", |r: &Request<Body>| r.method() == Method::POST, Router::new())
            .route("any", |_: &Request<Body>| true, Router::new());

        assert_eq!(chain.select(&request(Method::POST, None)).0, "posts");
        assert_eq!(chain.select(&request(Method::GET, None)).0, "any");
    }

    #[test]
    fn test_route_chain_falls_back() {
        let chain = RouteChain::new(Router::new()).route(
            "grpc-web",
            is_grpc_web_request::<Body>,
            Router::new(),
        );
        assert_eq!(chain.select(&request(Method::GET, None)).0, FALLBACK_ROUTE);
        assert_eq!(
            chain
                .select(&request(Method::POST, Some("application/grpc-web")))
                .0,
            "grpc-web"
        );
    }
}
