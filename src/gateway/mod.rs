//! HTTP gateway
//!
//! Route layout mirrors the service split: public browse + auth endpoints,
//! an authenticated surface for customers/providers, and an admin surface.

pub mod handlers;
pub mod openapi;
pub mod response;
pub mod state;
pub mod types;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::jwt_auth_middleware;
use state::AppState;

/// Build the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Browse endpoints: no token required.
    let public_routes = Router::new()
        .route("/categories", get(handlers::catalog::get_categories))
        .route("/categories/{id}", get(handlers::catalog::get_category))
        .route("/services", get(handlers::catalog::get_services))
        .route("/services/{id}", get(handlers::catalog::get_service))
        .route(
            "/services/category/{category_id}",
            get(handlers::catalog::get_services_by_category),
        )
        .route(
            "/services/provider/{provider_id}",
            get(handlers::catalog::get_services_by_provider),
        )
        .route("/reviews", get(handlers::reviews::get_all_reviews))
        .route("/reviews/{id}", get(handlers::reviews::get_review))
        .route(
            "/reviews/provider/{provider_id}",
            get(handlers::reviews::get_reviews_by_provider),
        )
        .route(
            "/reviews/service/{service_id}",
            get(handlers::reviews::get_reviews_by_service),
        )
        .route(
            "/reviews/service/{service_id}/stats",
            get(handlers::reviews::get_service_rating),
        );

    let protected_routes = Router::new()
        // users
        .route("/users", get(handlers::users::get_all_users))
        .route("/users/me", get(handlers::users::get_me))
        .route(
            "/users/username/{username}",
            get(handlers::users::get_user_by_username),
        )
        .route(
            "/users/{id}",
            get(handlers::users::get_user_by_id)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/users/{id}/role", put(handlers::users::update_user_role))
        // catalog mutations
        .route("/categories", post(handlers::catalog::create_category))
        .route(
            "/categories/{id}",
            put(handlers::catalog::update_category).delete(handlers::catalog::delete_category),
        )
        .route("/services", post(handlers::catalog::create_service))
        .route(
            "/services/my-services",
            get(handlers::catalog::get_my_services),
        )
        .route(
            "/services/{id}",
            put(handlers::catalog::update_service).delete(handlers::catalog::delete_service),
        )
        // orders
        .route(
            "/orders",
            get(handlers::orders::get_all_orders).post(handlers::orders::create_order),
        )
        .route("/orders/my-orders", get(handlers::orders::get_my_orders))
        .route(
            "/orders/my-provider-orders",
            get(handlers::orders::get_my_provider_orders),
        )
        .route(
            "/orders/provider/stats",
            get(handlers::orders::get_provider_stats),
        )
        .route(
            "/orders/customer/{customer_id}",
            get(handlers::orders::get_orders_by_customer),
        )
        .route(
            "/orders/provider/{provider_id}",
            get(handlers::orders::get_orders_by_provider),
        )
        .route(
            "/orders/status/{status}",
            get(handlers::orders::get_orders_by_status),
        )
        .route(
            "/orders/{id}",
            get(handlers::orders::get_order_by_id).delete(handlers::orders::cancel_order),
        )
        .route(
            "/orders/{id}/status",
            put(handlers::orders::update_order_status),
        )
        // reviews
        .route("/reviews", post(handlers::reviews::create_review))
        .route(
            "/reviews/{id}",
            put(handlers::reviews::update_review).delete(handlers::reviews::delete_review),
        )
        // admin
        .route("/admin/stats", get(handlers::admin::get_platform_stats))
        .route(
            "/admin/users",
            get(handlers::admin::get_users).post(handlers::admin::create_user),
        )
        .route(
            "/admin/users/{id}/status",
            put(handlers::admin::update_user_status),
        )
        .route(
            "/admin/users/{id}/role",
            put(handlers::admin::update_user_role),
        )
        .route("/admin/users/{id}", delete(handlers::admin::delete_user))
        .route(
            "/admin/services",
            get(handlers::admin::get_services).post(handlers::admin::create_service),
        )
        .route(
            "/admin/services/{id}/status",
            put(handlers::admin::update_service_status),
        )
        .route(
            "/admin/services/{id}",
            delete(handlers::admin::delete_service),
        )
        .route(
            "/admin/orders",
            get(handlers::admin::get_orders).post(handlers::admin::create_order),
        )
        .route(
            "/admin/orders/{id}/status",
            put(handlers::admin::update_order_status),
        )
        .route("/admin/orders/{id}", delete(handlers::admin::delete_order))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .route(
            "/ws/notifications",
            get(handlers::notifications::ws_notifications),
        )
        .nest("/api/auth", auth_routes)
        // Method routers merge per path, so public GETs and protected
        // mutations can share e.g. /services/{id}.
        .nest("/api", public_routes.merge(protected_routes))
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<()> {
    let router = build_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "gateway listening");
    axum::serve(listener, router).await?;
    Ok(())
}
