use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::parcel::{Address, ParcelStatus};

const PROCESSING_OFFSET_HOURS: i64 = 1;
const IN_TRANSIT_OFFSET_HOURS: i64 = 24;
const DELIVERY_OFFSET_HOURS: i64 = 72;

const SORTING_FACILITY: &str = "Sorting Facility";
const IN_TRANSIT: &str = "In Transit";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimelineEntry {
    pub status: &'static str,
    pub date: DateTime<Utc>,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrackingTimeline {
    pub timeline: Vec<TimelineEntry>,
    #[serde(rename = "estimatedDelivery")]
    pub estimated_delivery: DateTime<Utc>,
}

/// How far along the delivery flow a status is. Cancelled parcels are off
/// the flow entirely.
fn progress(status: ParcelStatus) -> Option<u8> {
    match status {
        ParcelStatus::Pending => Some(0),
        ParcelStatus::PickedUp => Some(1),
        ParcelStatus::InTransit => Some(2),
        ParcelStatus::Delivered => Some(3),
        ParcelStatus::Cancelled => None,
    }
}

pub fn estimated_delivery(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + Duration::hours(DELIVERY_OFFSET_HOURS)
}

/// Synthesizes the public milestone list from the current status alone.
///
/// Dates are fixed offsets from `created_at`, not recorded event times.
pub fn tracking_timeline(
    status: ParcelStatus,
    created_at: DateTime<Utc>,
    sender: &Address,
    receiver: &Address,
) -> TrackingTimeline {
    let rank = progress(status);
    let reached = |step: u8| rank.is_some_and(|rank| rank >= step);

    let mut timeline = vec![TimelineEntry {
        status: "Order Placed",
        date: created_at,
        location: sender.to_string(),
    }];

    if reached(1) {
        timeline.push(TimelineEntry {
            status: "Processing",
            date: created_at + Duration::hours(PROCESSING_OFFSET_HOURS),
            location: SORTING_FACILITY.to_string(),
        });
    }

    if reached(2) {
        timeline.push(TimelineEntry {
            status: "In Transit",
            date: created_at + Duration::hours(IN_TRANSIT_OFFSET_HOURS),
            location: IN_TRANSIT.to_string(),
        });
    }

    if rank == Some(3) {
        timeline.push(TimelineEntry {
            status: "Delivered",
            date: estimated_delivery(created_at),
            location: receiver.to_string(),
        });
    }

    TrackingTimeline {
        timeline,
        estimated_delivery: estimated_delivery(created_at),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn address(street: &str, city: &str) -> Address {
        Address {
            street: street.to_string(),
            city: city.to_string(),
            postal_code: "10115".to_string(),
            country: "DE".to_string(),
        }
    }

    fn jan_first() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn delivered_parcel_has_four_entries() {
        let sender = address("Invalidenstr. 1", "Berlin");
        let receiver = address("Hauptstr. 9", "Potsdam");

        let result = tracking_timeline(ParcelStatus::Delivered, jan_first(), &sender, &receiver);

        let jan_fourth = Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap();
        assert_eq!(result.timeline.len(), 4);
        let last = result.timeline.last().unwrap();
        assert_eq!(last.status, "Delivered");
        assert_eq!(last.date, jan_fourth);
        assert_eq!(last.location, receiver.to_string());
        assert_eq!(result.estimated_delivery, jan_fourth);
    }

    #[test]
    fn entry_count_follows_progress() {
        let sender = address("a", "b");
        let receiver = address("c", "d");
        let expected = [
            (ParcelStatus::Pending, 1),
            (ParcelStatus::PickedUp, 2),
            (ParcelStatus::InTransit, 3),
            (ParcelStatus::Delivered, 4),
            (ParcelStatus::Cancelled, 1),
        ];

        for (status, len) in expected {
            let result = tracking_timeline(status, jan_first(), &sender, &receiver);
            assert_eq!(result.timeline.len(), len, "{status}");
            assert_eq!(result.timeline[0].status, "Order Placed");
            assert_eq!(result.timeline[0].location, sender.to_string());
        }
    }

    #[test]
    fn dates_are_strictly_increasing() {
        let sender = address("a", "b");
        let receiver = address("c", "d");
        let result = tracking_timeline(ParcelStatus::Delivered, jan_first(), &sender, &receiver);

        let dates: Vec<_> = result.timeline.iter().map(|entry| entry.date).collect();
        assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(result.timeline[1].location, "Sorting Facility");
        assert_eq!(result.timeline[2].location, "In Transit");
    }

    #[test]
    fn estimated_delivery_ignores_status() {
        let sender = address("a", "b");
        let receiver = address("c", "d");
        for status in ParcelStatus::ALL {
            let result = tracking_timeline(status, jan_first(), &sender, &receiver);
            assert_eq!(result.estimated_delivery, jan_first() + Duration::hours(72));
        }
    }

    #[test]
    fn estimated_delivery_uses_public_field_name() {
        let sender = address("a", "b");
        let receiver = address("c", "d");
        let result = tracking_timeline(ParcelStatus::Pending, jan_first(), &sender, &receiver);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["estimatedDelivery"], "2024-01-04T00:00:00Z");
        assert!(value.get("estimated_delivery").is_none());
    }

    #[test]
    fn output_is_deterministic() {
        let sender = address("a", "b");
        let receiver = address("c", "d");
        let first = tracking_timeline(ParcelStatus::InTransit, jan_first(), &sender, &receiver);
        let second = tracking_timeline(ParcelStatus::InTransit, jan_first(), &sender, &receiver);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
