use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    Pending,
    PickedUp,
    InTransit,
    Delivered,
    Cancelled,
}

impl ParcelStatus {
    pub const ALL: [ParcelStatus; 5] = [
        ParcelStatus::Pending,
        ParcelStatus::PickedUp,
        ParcelStatus::InTransit,
        ParcelStatus::Delivered,
        ParcelStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParcelStatus::Pending => "pending",
            ParcelStatus::PickedUp => "picked_up",
            ParcelStatus::InTransit => "in_transit",
            ParcelStatus::Delivered => "delivered",
            ParcelStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ParcelStatus::Delivered | ParcelStatus::Cancelled)
    }
}

impl fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParcelStatus {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        ParcelStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| AppError::InvalidStatusValue(raw.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    pub fn is_blank(&self) -> bool {
        [&self.street, &self.city, &self.postal_code, &self.country]
            .iter()
            .any(|part| part.trim().is_empty())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.street, self.city, self.postal_code, self.country
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusHistoryEntry {
    pub status: ParcelStatus,
    pub updated_by: Uuid,
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parcel {
    pub id: Uuid,
    pub tracking_id: String,
    pub sender: Contact,
    pub receiver: Contact,
    pub weight_kg: f64,
    pub description: Option<String>,
    pub status: ParcelStatus,
    pub payment_status: PaymentStatus,
    pub assigned_driver: Option<Uuid>,
    pub created_by: Uuid,
    pub status_history: Vec<StatusHistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Parcel {
    pub fn new(
        id: Uuid,
        created_by: Uuid,
        sender: Contact,
        receiver: Contact,
        weight_kg: f64,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tracking_id: tracking_id_for(&id),
            sender,
            receiver,
            weight_kg,
            description,
            status: ParcelStatus::Pending,
            payment_status: PaymentStatus::Pending,
            assigned_driver: None,
            created_by,
            status_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

const TRACKING_PREFIX: &str = "TRK";
const TRACKING_DIGITS: usize = 10;

/// Tracking ids are derived from the random part of the parcel's UUID.
pub fn tracking_id_for(id: &Uuid) -> String {
    let hex = id.simple().to_string().to_ascii_uppercase();
    format!("{TRACKING_PREFIX}{}", &hex[hex.len() - TRACKING_DIGITS..])
}
