//! OpenAPI / Swagger UI documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`
//!
//! Coverage is focused on the auth, order and statistics endpoints; the
//! CRUD plumbing is not annotated.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Bearer JWT security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Main API documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Servhub Marketplace API",
        version = "1.0.0",
        description = "Services marketplace backend: catalog, orders, reviews and provider statistics."
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::auth::register,
        crate::gateway::handlers::auth::login,
        crate::gateway::handlers::orders::create_order,
        crate::gateway::handlers::orders::update_order_status,
        crate::gateway::handlers::orders::cancel_order,
        crate::gateway::handlers::orders::get_provider_stats,
        crate::gateway::handlers::admin::get_platform_stats,
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Orders", description = "Order lifecycle and provider statistics"),
        (name = "Admin", description = "Administrative operations")
    )
)]
pub struct ApiDoc;
