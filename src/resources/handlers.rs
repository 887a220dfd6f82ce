use axum::{
    extract::{rejection::JsonRejection, Path, State},
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    collection::Collection,
    leaderboard::{rank, LeaderboardEntry},
    repo_types::{sanitize, Body, Document},
};
use crate::{
    auth::extractors::require_user,
    dto::ApiResponse,
    error::{AppError, StoreError},
    state::AppState,
};

type Payload = Result<Json<Body>, JsonRejection>;

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/supplies", get(list_supplies))
        .route("/supplies/:id", get(get_supply))
        .route("/leaderboard", get(leaderboard))
        .route("/comments", get(list_comments))
        .route("/testimonials", get(list_testimonials))
        .route("/volunteers", get(list_volunteers))
}

pub fn write_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/create-supply", post(create_supply))
        .route("/update-supply/:id", put(update_supply))
        .route("/delete-supply/:id", delete(delete_supply))
        .route("/donate", post(donate))
        .route("/add-comment", post(add_comment))
        .route("/add-testimonial", post(add_testimonial))
        .route("/add-volunteer", post(add_volunteer))
        .route_layer(middleware::from_fn_with_state(state, require_user))
}

// --- supplies ---

#[instrument(skip(state, payload))]
pub async fn create_supply(
    State(state): State<AppState>,
    payload: Payload,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    let Json(body) = payload?;
    let body = sanitize(body);
    let Some(title) = body.get("title").and_then(Value::as_str).map(str::to_owned) else {
        return Err(AppError::ValidationFailure("title is required".into()));
    };

    // The unique index is authoritative when two creations race.
    if state
        .documents
        .find_by_field(Collection::Supplies, "title", &title)
        .await?
        .is_some()
    {
        return Err(duplicate_supply(StoreError::Conflict, &title));
    }

    let doc = state
        .documents
        .insert(Collection::Supplies, body)
        .await
        .map_err(|e| duplicate_supply(e, &title))?;

    info!(id = %doc.id, title = %title, "supply created");
    Ok(Json(ApiResponse::with_data("New supply added successfully", doc)))
}

#[instrument(skip(state))]
pub async fn list_supplies(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Document>>>, AppError> {
    list_documents(&state, Collection::Supplies, "Supplies retrieved successfully").await
}

/// A missing or malformed id yields `data: null` rather than 404.
#[instrument(skip(state))]
pub async fn get_supply(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Option<Document>>>, AppError> {
    let doc = match parse_id(&id) {
        Some(id) => state.documents.get(Collection::Supplies, id).await?,
        None => None,
    };
    Ok(Json(ApiResponse::with_data("Supply retrieved successfully", doc)))
}

#[instrument(skip(state, payload))]
pub async fn update_supply(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Payload,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    let Json(patch) = payload?;
    let patch = sanitize(patch);
    let not_found = || AppError::NotFound("Data not found or no changes applied".into());

    let id = parse_id(&id).ok_or_else(not_found)?;
    let title = patch
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    if !title.is_empty() {
        let holder = state
            .documents
            .find_by_field(Collection::Supplies, "title", &title)
            .await?;
        if holder.is_some_and(|d| d.id != id) {
            return Err(duplicate_supply(StoreError::Conflict, &title));
        }
    }

    let doc = state
        .documents
        .merge(Collection::Supplies, id, patch)
        .await
        .map_err(|e| duplicate_supply(e, &title))?
        .ok_or_else(not_found)?;

    info!(id = %doc.id, "supply updated");
    Ok(Json(ApiResponse::with_data("Supply updated successfully", doc)))
}

#[instrument(skip(state))]
pub async fn delete_supply(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    let deleted = match parse_id(&id) {
        Some(id) => state.documents.delete(Collection::Supplies, id).await?,
        None => false,
    };
    if !deleted {
        return Err(AppError::NotFound("Data not found".into()));
    }

    info!(id = %id, "supply deleted");
    Ok(Json(ApiResponse::with_data(
        "Supply deleted successfully",
        json!({ "deletedCount": 1 }),
    )))
}

fn duplicate_supply(err: StoreError, title: &str) -> AppError {
    match err {
        StoreError::Conflict => {
            warn!(title = %title, "supply title already taken");
            AppError::DuplicateResource("This supply already exists".into())
        }
        other => other.into(),
    }
}

// --- donations ---

#[instrument(skip(state, payload))]
pub async fn donate(
    State(state): State<AppState>,
    payload: Payload,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    insert_document(&state, Collection::Donations, payload, "Donate successfully").await
}

#[instrument(skip(state))]
pub async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>, AppError> {
    let donations = state.documents.list(Collection::Donations).await?;
    Ok(Json(ApiResponse::with_data(
        "Leaderboard retrieved successfully",
        rank(&donations),
    )))
}

// --- community ---

#[instrument(skip(state, payload))]
pub async fn add_comment(
    State(state): State<AppState>,
    payload: Payload,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    insert_document(&state, Collection::Comments, payload, "Comment added successfully").await
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Document>>>, AppError> {
    list_documents(&state, Collection::Comments, "Comments retrieved successfully").await
}

#[instrument(skip(state, payload))]
pub async fn add_testimonial(
    State(state): State<AppState>,
    payload: Payload,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    insert_document(
        &state,
        Collection::Testimonials,
        payload,
        "Testimonial added successfully",
    )
    .await
}

#[instrument(skip(state))]
pub async fn list_testimonials(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Document>>>, AppError> {
    list_documents(
        &state,
        Collection::Testimonials,
        "Testimonials retrieved successfully",
    )
    .await
}

#[instrument(skip(state, payload))]
pub async fn add_volunteer(
    State(state): State<AppState>,
    payload: Payload,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    insert_document(
        &state,
        Collection::Volunteers,
        payload,
        "Volunteer added successfully",
    )
    .await
}

#[instrument(skip(state))]
pub async fn list_volunteers(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Document>>>, AppError> {
    list_documents(
        &state,
        Collection::Volunteers,
        "Volunteers retrieved successfully",
    )
    .await
}

// --- shared ---

async fn insert_document(
    state: &AppState,
    collection: Collection,
    payload: Payload,
    message: &str,
) -> Result<Json<ApiResponse<Document>>, AppError> {
    let Json(body) = payload?;
    let doc = state
        .documents
        .insert(collection, sanitize(body))
        .await
        .map_err(|e| match e {
            StoreError::Conflict => AppError::DuplicateResource("Document already exists".into()),
            other => other.into(),
        })?;
    info!(%collection, id = %doc.id, "document inserted");
    Ok(Json(ApiResponse::with_data(message, doc)))
}

async fn list_documents(
    state: &AppState,
    collection: Collection,
    message: &str,
) -> Result<Json<ApiResponse<Vec<Document>>>, AppError> {
    let docs = state.documents.list(collection).await?;
    Ok(Json(ApiResponse::with_data(message, docs)))
}

fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
