//! Coordinate echo endpoint.

use axum::Json;

use beacon_realtime::GeoPoint;

use crate::error::ApiError;

/// POST /coordinate: validates a latitude/longitude pair and echoes it.
pub async fn echo_coordinate(Json(point): Json<GeoPoint>) -> Result<Json<GeoPoint>, ApiError> {
    point.check()?;
    Ok(Json(point))
}
