use axum::{Router, response::Redirect, routing::get};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Where the Swagger UI is mounted.
pub const DOCS_PATH: &str = "/docs";
/// Raw OpenAPI document consumed by the UI and by client generators.
pub const OPENAPI_PATH: &str = "/api-doc/openapi.json";

/// Swagger UI plus a bare `/` that sends browsers to it.
pub fn router() -> Router<SharedState> {
    Router::new()
        .merge(SwaggerUi::new(DOCS_PATH).url(OPENAPI_PATH, ApiDoc::openapi()))
        .route("/", get(|| async { Redirect::temporary(DOCS_PATH) }))
}
