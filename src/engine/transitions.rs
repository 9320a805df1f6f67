use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::parcel::{Parcel, ParcelStatus, PaymentStatus, StatusHistoryEntry};
use crate::models::payment::Payment;

const PAYMENT_COLLECTED_NOTE: &str = "Payment collected by driver";
const CANCELLED_NOTE: &str = "Parcel cancelled by admin";

/// Statuses reachable from `status` in one driver step.
pub fn allowed_transitions(status: ParcelStatus) -> &'static [ParcelStatus] {
    match status {
        ParcelStatus::Pending => &[ParcelStatus::PickedUp],
        ParcelStatus::PickedUp => &[ParcelStatus::InTransit],
        ParcelStatus::InTransit => &[ParcelStatus::Delivered],
        ParcelStatus::Delivered | ParcelStatus::Cancelled => &[],
    }
}

pub fn can_transition(from: ParcelStatus, to: ParcelStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

fn ensure_assigned_driver(parcel: &Parcel, actor: Uuid) -> Result<(), AppError> {
    match parcel.assigned_driver {
        Some(driver) if driver == actor => Ok(()),
        _ => Err(AppError::NotAuthorized),
    }
}

/// Moves the parcel one step along the driver workflow.
///
/// All checks run before the parcel is touched, so a rejected request leaves
/// both `status` and `status_history` exactly as they were.
pub fn apply_transition(
    parcel: &mut Parcel,
    requested: &str,
    actor: Uuid,
    now: DateTime<Utc>,
) -> Result<ParcelStatus, AppError> {
    let next: ParcelStatus = requested.parse()?;
    ensure_assigned_driver(parcel, actor)?;

    let current = parcel.status;
    if !can_transition(current, next) {
        return Err(AppError::IllegalTransition {
            from: current,
            to: next,
        });
    }

    parcel.status = next;
    parcel.status_history.push(StatusHistoryEntry {
        status: next,
        updated_by: actor,
        note: format!("Status updated to {next} by driver"),
        timestamp: now,
    });
    parcel.updated_at = now;

    Ok(current)
}

/// Records cash collection on a delivered parcel.
///
/// The linked payment record is optional; without one only the parcel is
/// updated.
pub fn mark_payment_collected(
    parcel: &mut Parcel,
    payment: Option<&mut Payment>,
    actor: Uuid,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if parcel.status != ParcelStatus::Delivered {
        return Err(AppError::ParcelNotYetDelivered);
    }
    ensure_assigned_driver(parcel, actor)?;

    if parcel.payment_status == PaymentStatus::Completed {
        return Err(AppError::PaymentAlreadyCollected);
    }

    parcel.payment_status = PaymentStatus::Completed;
    parcel.status_history.push(StatusHistoryEntry {
        status: parcel.status,
        updated_by: actor,
        note: PAYMENT_COLLECTED_NOTE.to_string(),
        timestamp: now,
    });
    parcel.updated_at = now;

    if let Some(payment) = payment {
        payment.status = PaymentStatus::Completed;
        payment.collected_by = Some(actor);
        payment.collected_at = Some(now);
    }

    Ok(())
}

/// Admin cancellation, only possible before pickup.
pub fn cancel_parcel(
    parcel: &mut Parcel,
    actor: Uuid,
    now: DateTime<Utc>,
) -> Result<ParcelStatus, AppError> {
    let current = parcel.status;
    if current != ParcelStatus::Pending {
        return Err(AppError::IllegalTransition {
            from: current,
            to: ParcelStatus::Cancelled,
        });
    }

    parcel.status = ParcelStatus::Cancelled;
    parcel.status_history.push(StatusHistoryEntry {
        status: ParcelStatus::Cancelled,
        updated_by: actor,
        note: CANCELLED_NOTE.to_string(),
        timestamp: now,
    });
    parcel.updated_at = now;

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parcel::{Address, Contact};

    fn contact(name: &str) -> Contact {
        Contact {
            name: name.to_string(),
            phone: "+1 555 0100".to_string(),
            email: None,
            address: Address {
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                postal_code: "12345".to_string(),
                country: "US".to_string(),
            },
        }
    }

    fn parcel_with(status: ParcelStatus, driver: Option<Uuid>) -> Parcel {
        let mut parcel = Parcel::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            contact("Sam"),
            contact("Riley"),
            2.5,
            None,
            Utc::now(),
        );
        parcel.status = status;
        parcel.assigned_driver = driver;
        parcel
    }

    fn payment_for(parcel: &Parcel) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            parcel_id: parcel.id,
            amount: 12.0,
            status: PaymentStatus::Pending,
            collected_by: None,
            collected_at: None,
            created_at: parcel.created_at,
        }
    }

    #[test]
    fn pending_to_picked_up_is_accepted() {
        let driver = Uuid::new_v4();
        let mut parcel = parcel_with(ParcelStatus::Pending, Some(driver));

        let previous = apply_transition(&mut parcel, "picked_up", driver, Utc::now()).unwrap();

        assert_eq!(previous, ParcelStatus::Pending);
        assert_eq!(parcel.status, ParcelStatus::PickedUp);
        assert_eq!(parcel.status_history.len(), 1);
        let entry = &parcel.status_history[0];
        assert_eq!(entry.status, ParcelStatus::PickedUp);
        assert_eq!(entry.updated_by, driver);
        assert_eq!(entry.note, "Status updated to picked_up by driver");
    }

    #[test]
    fn skipping_a_step_is_rejected_without_mutation() {
        let driver = Uuid::new_v4();
        let mut parcel = parcel_with(ParcelStatus::Pending, Some(driver));
        let before = parcel.clone();

        let err = apply_transition(&mut parcel, "in_transit", driver, Utc::now()).unwrap_err();

        assert!(matches!(
            err,
            AppError::IllegalTransition {
                from: ParcelStatus::Pending,
                to: ParcelStatus::InTransit
            }
        ));
        assert!(err.to_string().contains("from pending to in_transit"));
        assert_eq!(parcel, before);
    }

    #[test]
    fn every_status_outside_the_adjacency_set_is_rejected() {
        let driver = Uuid::new_v4();
        for from in ParcelStatus::ALL {
            for to in ParcelStatus::ALL {
                if can_transition(from, to) {
                    continue;
                }
                let mut parcel = parcel_with(from, Some(driver));
                let before = parcel.clone();
                let result = apply_transition(&mut parcel, to.as_str(), driver, Utc::now());
                assert!(
                    matches!(result, Err(AppError::IllegalTransition { .. })),
                    "{from} -> {to} should be illegal"
                );
                assert_eq!(parcel, before);
            }
        }
    }

    #[test]
    fn terminal_states_reject_every_transition() {
        let driver = Uuid::new_v4();
        for terminal in [ParcelStatus::Delivered, ParcelStatus::Cancelled] {
            assert!(terminal.is_terminal());
            assert!(allowed_transitions(terminal).is_empty());
            for to in ParcelStatus::ALL {
                let mut parcel = parcel_with(terminal, Some(driver));
                assert!(apply_transition(&mut parcel, to.as_str(), driver, Utc::now()).is_err());
                assert_eq!(parcel.status, terminal);
                assert!(parcel.status_history.is_empty());
            }
        }
    }

    #[test]
    fn wrong_actor_is_not_authorized() {
        let driver = Uuid::new_v4();
        let mut parcel = parcel_with(ParcelStatus::Pending, Some(driver));
        let before = parcel.clone();

        let err = apply_transition(&mut parcel, "picked_up", Uuid::new_v4(), Utc::now()).unwrap_err();

        assert!(matches!(err, AppError::NotAuthorized));
        assert_eq!(parcel, before);
    }

    #[test]
    fn unassigned_parcel_is_not_authorized() {
        let mut parcel = parcel_with(ParcelStatus::Pending, None);
        let err = apply_transition(&mut parcel, "picked_up", Uuid::new_v4(), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::NotAuthorized));
    }

    #[test]
    fn unknown_status_value_is_checked_first() {
        let mut parcel = parcel_with(ParcelStatus::Pending, None);
        let err = apply_transition(&mut parcel, "processing", Uuid::new_v4(), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::InvalidStatusValue(value) if value == "processing"));
    }

    #[test]
    fn full_walk_appends_one_entry_per_step() {
        let driver = Uuid::new_v4();
        let mut parcel = parcel_with(ParcelStatus::Pending, Some(driver));

        for (step, next) in ["picked_up", "in_transit", "delivered"].iter().enumerate() {
            apply_transition(&mut parcel, next, driver, Utc::now()).unwrap();
            assert_eq!(parcel.status_history.len(), step + 1);
            assert_eq!(parcel.status.as_str(), *next);
        }
        assert!(parcel.status.is_terminal());
    }

    #[test]
    fn payment_before_delivery_is_rejected() {
        let driver = Uuid::new_v4();
        let mut parcel = parcel_with(ParcelStatus::InTransit, Some(driver));
        let mut payment = payment_for(&parcel);
        let before = parcel.clone();

        let err = mark_payment_collected(&mut parcel, Some(&mut payment), driver, Utc::now())
            .unwrap_err();

        assert!(matches!(err, AppError::ParcelNotYetDelivered));
        assert_eq!(parcel, before);
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.collected_by.is_none());
    }

    #[test]
    fn payment_collection_updates_parcel_and_record() {
        let driver = Uuid::new_v4();
        let mut parcel = parcel_with(ParcelStatus::Delivered, Some(driver));
        let mut payment = payment_for(&parcel);
        let now = Utc::now();

        mark_payment_collected(&mut parcel, Some(&mut payment), driver, now).unwrap();

        assert_eq!(parcel.payment_status, PaymentStatus::Completed);
        assert_eq!(parcel.status, ParcelStatus::Delivered);
        assert_eq!(parcel.status_history.len(), 1);
        assert_eq!(parcel.status_history[0].note, "Payment collected by driver");
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.collected_by, Some(driver));
        assert_eq!(payment.collected_at, Some(now));
    }

    #[test]
    fn payment_collection_without_record_still_succeeds() {
        let driver = Uuid::new_v4();
        let mut parcel = parcel_with(ParcelStatus::Delivered, Some(driver));

        mark_payment_collected(&mut parcel, None, driver, Utc::now()).unwrap();

        assert_eq!(parcel.payment_status, PaymentStatus::Completed);
    }

    #[test]
    fn payment_collection_by_other_driver_is_rejected() {
        let mut parcel = parcel_with(ParcelStatus::Delivered, Some(Uuid::new_v4()));
        let err = mark_payment_collected(&mut parcel, None, Uuid::new_v4(), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::NotAuthorized));
        assert_eq!(parcel.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn payment_cannot_be_collected_twice() {
        let driver = Uuid::new_v4();
        let mut parcel = parcel_with(ParcelStatus::Delivered, Some(driver));
        mark_payment_collected(&mut parcel, None, driver, Utc::now()).unwrap();

        let err = mark_payment_collected(&mut parcel, None, driver, Utc::now()).unwrap_err();

        assert!(matches!(err, AppError::PaymentAlreadyCollected));
        assert_eq!(parcel.status_history.len(), 1);
    }

    #[test]
    fn cancel_only_from_pending() {
        let admin = Uuid::new_v4();
        let mut parcel = parcel_with(ParcelStatus::Pending, None);
        cancel_parcel(&mut parcel, admin, Utc::now()).unwrap();
        assert_eq!(parcel.status, ParcelStatus::Cancelled);
        assert_eq!(parcel.status_history.len(), 1);

        let mut picked = parcel_with(ParcelStatus::PickedUp, None);
        assert!(matches!(
            cancel_parcel(&mut picked, admin, Utc::now()),
            Err(AppError::IllegalTransition { .. })
        ));
        assert_eq!(picked.status, ParcelStatus::PickedUp);
    }
}
