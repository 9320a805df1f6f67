use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::parcel::{tracking_id_for, Parcel};
use crate::models::payment::Payment;
use crate::models::user::{Actor, Role, User};
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub users: DashMap<Uuid, User>,
    pub sessions: DashMap<String, Actor>,
    pub parcels: DashMap<Uuid, Parcel>,
    pub payments: DashMap<Uuid, Payment>,
    pub metrics: Metrics,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            sessions: DashMap::new(),
            parcels: DashMap::new(),
            payments: DashMap::new(),
            metrics: Metrics::new(),
        }
    }

    /// Registers a built-in admin reachable through a fixed bearer token.
    pub fn with_admin_token(self, token: &str) -> Self {
        let admin = User {
            id: Uuid::new_v4(),
            name: "Administrator".to_string(),
            email: "admin@localhost".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
        };
        self.sessions.insert(
            token.to_string(),
            Actor {
                user_id: admin.id,
                role: Role::Admin,
            },
        );
        self.users.insert(admin.id, admin);
        self
    }

    pub fn issue_session(&self, user: &User) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(
            token.clone(),
            Actor {
                user_id: user.id,
                role: user.role,
            },
        );
        token
    }

    pub fn parcel_by_tracking_id(&self, tracking_id: &str) -> Option<Parcel> {
        self.parcels
            .iter()
            .find(|entry| entry.value().tracking_id == tracking_id)
            .map(|entry| entry.value().clone())
    }

    /// Draws parcel ids until one maps to a tracking id nobody holds yet.
    pub fn unused_parcel_id(&self, mut next_id: impl FnMut() -> Uuid) -> Uuid {
        loop {
            let id = next_id();
            if self.parcel_by_tracking_id(&tracking_id_for(&id)).is_none() {
                return id;
            }
        }
    }

    pub fn payment_id_for_parcel(&self, parcel_id: Uuid) -> Option<Uuid> {
        self.payments
            .iter()
            .find(|entry| entry.value().parcel_id == parcel_id)
            .map(|entry| *entry.key())
    }
}
