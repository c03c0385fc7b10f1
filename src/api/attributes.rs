//! Attribute catalog API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{AttributeType, CreateAttributeRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AttributeLookup {
    pub name: String,
}

/// GET /api/attributes - List the catalog in id order.
pub async fn list_attributes(State(state): State<AppState>) -> ApiResult<Vec<AttributeType>> {
    success(state.repo.list_attribute_types().await?)
}

/// GET /api/attributes/:id - Name for an attribute id.
pub async fn get_attribute(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<AttributeType> {
    let id: i64 = id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid attribute id: {}", id)))?;

    match state.repo.attribute_name_for_id(id).await? {
        Some(name) => success(AttributeType { id, name }),
        None => Err(AppError::NotFound(format!("Attribute {} not found", id))),
    }
}

/// GET /api/attributes/lookup?name= - Id for an attribute name.
pub async fn lookup_attribute(
    State(state): State<AppState>,
    Query(lookup): Query<AttributeLookup>,
) -> ApiResult<AttributeType> {
    match state.repo.attribute_id_for_name(&lookup.name).await? {
        Some(id) => success(AttributeType {
            id,
            name: lookup.name,
        }),
        None => Err(AppError::NotFound(format!(
            "Attribute {} not found",
            lookup.name
        ))),
    }
}

/// POST /api/attributes - Add an attribute type to the catalog.
pub async fn create_attribute(
    State(state): State<AppState>,
    Json(request): Json<CreateAttributeRequest>,
) -> ApiResult<AttributeType> {
    success(state.repo.create_attribute_type(&request.name).await?)
}
