use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::parcel::PaymentStatus;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub parcel_id: Uuid,
    pub amount: f64,
    pub status: PaymentStatus,
    pub collected_by: Option<Uuid>,
    pub collected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
