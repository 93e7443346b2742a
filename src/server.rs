use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::{AdminAuth, AdminPrincipal};
use crate::catalog::CatalogManager;
use crate::domain::{AdminQuestionView, QuestionDraft, QuestionPatch, ThemeDraft};
use crate::error::{CatalogError, Result};

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct QuestionCreated {
    message: String,
    id: Uuid,
}

/// Error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: bool,
    pub code: String,
    pub message: String,
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            CatalogError::ThemeExists(_) => (StatusCode::BAD_REQUEST, "theme_exists"),
            CatalogError::ThemeNotFound(_) => (StatusCode::NOT_FOUND, "theme_not_found"),
            CatalogError::QuestionNotFound(_) => (StatusCode::NOT_FOUND, "question_not_found"),
            CatalogError::InvalidId(_) => (StatusCode::BAD_REQUEST, "invalid_id"),
            CatalogError::AnswerNotInOptions(_) => (StatusCode::BAD_REQUEST, "invalid_answer"),
            CatalogError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            CatalogError::CascadeIncomplete { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "cascade_incomplete")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        // Validation errors carry their own message; server-side failures
        // are logged in full and reported without store internals.
        let message = match &self {
            CatalogError::CascadeIncomplete { operation, .. } => {
                error!("{}", self);
                format!("{operation} could not be confirmed; the catalog may be inconsistent")
            }
            other if status == StatusCode::INTERNAL_SERVER_ERROR => {
                error!("{}", other);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: true,
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Quiz admin service is running!"
    }))
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "quiz-admin",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn add_theme(
    admin: AdminPrincipal,
    Extension(catalog): Extension<Arc<CatalogManager>>,
    Json(draft): Json<ThemeDraft>,
) -> Result<Json<MessageResponse>> {
    info!("Admin '{}' adding theme '{}'", admin.subject, draft.name);
    let theme = catalog.add_theme(draft).await?;
    Ok(Json(MessageResponse {
        message: format!("Theme '{}' added successfully.", theme.name),
    }))
}

async fn list_themes(
    _admin: AdminPrincipal,
    Extension(catalog): Extension<Arc<CatalogManager>>,
) -> Result<Json<Vec<String>>> {
    Ok(Json(catalog.list_themes().await?))
}

async fn update_theme(
    admin: AdminPrincipal,
    Extension(catalog): Extension<Arc<CatalogManager>>,
    Path(theme_name): Path<String>,
    Json(draft): Json<ThemeDraft>,
) -> Result<Json<MessageResponse>> {
    info!("Admin '{}' updating theme '{}'", admin.subject, theme_name);
    let updated = catalog.update_theme(&theme_name, draft).await?;
    Ok(Json(MessageResponse {
        message: format!("Theme '{}' updated successfully.", updated.name),
    }))
}

async fn delete_theme(
    admin: AdminPrincipal,
    Extension(catalog): Extension<Arc<CatalogManager>>,
    Path(theme_name): Path<String>,
) -> Result<Json<MessageResponse>> {
    info!("Admin '{}' deleting theme '{}'", admin.subject, theme_name);
    catalog.delete_theme(&theme_name).await?;
    Ok(Json(MessageResponse {
        message: format!("Theme '{}' deleted successfully.", theme_name),
    }))
}

async fn add_question(
    admin: AdminPrincipal,
    Extension(catalog): Extension<Arc<CatalogManager>>,
    Json(draft): Json<QuestionDraft>,
) -> Result<Json<QuestionCreated>> {
    info!(
        "Admin '{}' adding question under theme '{}'",
        admin.subject, draft.theme
    );
    let question = catalog.add_question(draft).await?;
    let view = question.admin_view()?;
    Ok(Json(QuestionCreated {
        message: "Question added successfully.".to_string(),
        id: view.id,
    }))
}

#[derive(Deserialize)]
struct QuestionListFilter {
    theme: Option<String>,
}

async fn list_questions(
    _admin: AdminPrincipal,
    Extension(catalog): Extension<Arc<CatalogManager>>,
    Query(filter): Query<QuestionListFilter>,
) -> Result<Json<Vec<AdminQuestionView>>> {
    let questions = catalog.list_questions(filter.theme.as_deref()).await?;
    let views = questions
        .iter()
        .map(|question| question.admin_view())
        .collect::<Result<Vec<_>>>()?;
    Ok(Json(views))
}

async fn update_question(
    admin: AdminPrincipal,
    Extension(catalog): Extension<Arc<CatalogManager>>,
    Path(id): Path<String>,
    Json(patch): Json<QuestionPatch>,
) -> Result<Json<MessageResponse>> {
    info!("Admin '{}' updating question {}", admin.subject, id);
    catalog.update_question(&id, patch).await?;
    Ok(Json(MessageResponse {
        message: "Question updated successfully.".to_string(),
    }))
}

async fn delete_question(
    admin: AdminPrincipal,
    Extension(catalog): Extension<Arc<CatalogManager>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    info!("Admin '{}' deleting question {}", admin.subject, id);
    catalog.delete_question(&id).await?;
    Ok(Json(MessageResponse {
        message: "Question deleted successfully.".to_string(),
    }))
}

/// Create the HTTP router with all routes
pub fn create_router(catalog: Arc<CatalogManager>, auth: Arc<AdminAuth>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/admin/add-theme", post(add_theme))
        .route("/admin/themes", get(list_themes))
        .route(
            "/admin/themes/:theme_name",
            put(update_theme).delete(delete_theme),
        )
        .route("/admin/add-question", post(add_question))
        .route("/admin/questions", get(list_questions))
        .route(
            "/admin/questions/:id",
            put(update_question).delete(delete_question),
        )
        .layer(Extension(catalog))
        .layer(Extension(auth))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified address
pub async fn start_server(
    catalog: Arc<CatalogManager>,
    auth: Arc<AdminAuth>,
    host: &str,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let app = create_router(catalog, auth);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    info!("HTTP server listening on {}", addr);
    println!("🚀 Quiz admin API running on http://{addr}");
    println!("💚 Health check: http://{addr}/health");

    hyper::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
