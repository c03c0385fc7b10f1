//! REST API module.
//!
//! Contains all API routes and handlers for the dive log.

mod attributes;
mod dives;
mod settings;
mod stats;

pub use attributes::*;
pub use dives::*;
pub use settings::*;
pub use stats::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::validation::parse_dive_number;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Parse a dive number taken from the request path.
fn path_dive_number(raw: &str) -> Result<i64, AppError> {
    parse_dive_number(raw).ok_or_else(|| AppError::BadRequest(format!("Invalid dive number: {}", raw)))
}
