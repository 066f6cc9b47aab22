pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Registrar API",
        version = "1.0.0",
        description = "API for the Registrar school-management dashboard"
    ),
    tags(
        (name = "Auth", description = "Login and viewer resolution"),
        (name = "Teachers", description = "Teacher CRUD operations"),
        (name = "Students", description = "Student CRUD operations"),
        (name = "Parents", description = "Parent CRUD operations"),
        (name = "Subjects", description = "Subject CRUD operations"),
        (name = "Classes", description = "Class CRUD operations"),
        (name = "Lessons", description = "Lesson CRUD operations"),
        (name = "Exams", description = "Exam CRUD operations"),
        (name = "Assignments", description = "Assignment CRUD operations"),
        (name = "Results", description = "Result CRUD operations"),
        (name = "Attendance", description = "Attendance CRUD operations"),
        (name = "Events", description = "Calendar event CRUD operations"),
        (name = "Announcements", description = "Announcement CRUD operations"),
        (name = "Forms", description = "Reference data for entity forms"),
        (name = "Overview", description = "Dashboard widget data"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(config.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors_layer(&state.config.server.cors);

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes())
        .split_for_parts();

    router
        .layer(cors)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
}
