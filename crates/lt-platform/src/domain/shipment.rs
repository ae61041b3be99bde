//! Shipment read model exposed to integration callers

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentSummary {
    #[serde(rename(deserialize = "_id"))]
    pub id: String,
    pub reference: String,
    pub status: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub vehicle: Option<String>,
    pub distance_km: f64,
    pub weight_kg: f64,
    #[serde(default)]
    pub price: Option<f64>,
    pub created_at: DateTime<Utc>,
}
