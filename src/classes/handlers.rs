use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{auth::extractors::AdminUser, state::AppState};

use super::dto::ClassView;
use super::repo;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/classes", get(list_classes))
        .route("/classes/:id", get(get_class))
}

#[instrument(skip(state))]
pub async fn list_classes(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<ClassView>>, (StatusCode, String)> {
    let classes = repo::list(&state.db).await.map_err(internal)?;
    Ok(Json(classes.into_iter().map(ClassView::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_class(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ClassView>, (StatusCode, String)> {
    let class = repo::find(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Class not found".to_string()))?;
    Ok(Json(ClassView::from(class)))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
