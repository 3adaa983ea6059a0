use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::booking::{PaymentMethod, ProductKind};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    GuestDetails,
    PaymentMethod,
    ReviewAndConfirm,
    Submitted,
    Aborted,
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CheckoutStep::GuestDetails => "guest_details",
            CheckoutStep::PaymentMethod => "payment_method",
            CheckoutStep::ReviewAndConfirm => "review_and_confirm",
            CheckoutStep::Submitted => "submitted",
            CheckoutStep::Aborted => "aborted",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum CheckoutError {
    MissingFields(Vec<&'static str>),
    InvalidTransition { from: CheckoutStep },
    SessionClosed,
}

impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutError::MissingFields(fields) => {
                write!(f, "Required fields missing or invalid: {}", fields.join(", "))
            }
            CheckoutError::InvalidTransition { from } => {
                write!(f, "Operation not permitted in the {} step", from)
            }
            CheckoutError::SessionClosed => write!(f, "Checkout session is already closed"),
        }
    }
}

impl std::error::Error for CheckoutError {}

/// What is being booked. Fixed when the session starts; only the guest
/// details, payment method and voucher change afterwards.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProductSelection {
    Hotel { hotel_id: ObjectId, rooms: i64 },
    Attraction { attraction_id: ObjectId, tickets: i64 },
}

impl ProductSelection {
    pub fn kind(&self) -> ProductKind {
        match self {
            ProductSelection::Hotel { .. } => ProductKind::Hotel,
            ProductSelection::Attraction { .. } => ProductKind::Attraction,
        }
    }

    pub fn product_id(&self) -> ObjectId {
        match self {
            ProductSelection::Hotel { hotel_id, .. } => *hotel_id,
            ProductSelection::Attraction { attraction_id, .. } => *attraction_id,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GuestDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub visit_date: Option<NaiveDate>,
}

/// One booking attempt walking the fixed step sequence
/// guest_details -> payment_method -> review_and_confirm -> submitted/aborted.
/// Lives in memory only; discarded once a terminal step is reached.
#[derive(Debug, Serialize, Clone)]
pub struct CheckoutSession {
    pub id: Uuid,
    pub user_id: ObjectId,
    pub product: ProductSelection,
    pub step: CheckoutStep,
    pub guest: GuestDetails,
    pub payment_method: PaymentMethod,
    pub voucher_id: Option<ObjectId>,
    pub created_at: DateTime,
}

impl CheckoutSession {
    pub fn new(user_id: ObjectId, product: ProductSelection) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            product,
            step: CheckoutStep::GuestDetails,
            guest: GuestDetails::default(),
            payment_method: PaymentMethod::default(),
            voucher_id: None,
            created_at: DateTime::now(),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.step, CheckoutStep::Submitted | CheckoutStep::Aborted)
    }

    fn ensure_open(&self) -> Result<(), CheckoutError> {
        if self.is_closed() {
            return Err(CheckoutError::SessionClosed);
        }
        Ok(())
    }

    /// Guest fields may only be edited while the session sits on the
    /// guest details step; navigating back re-opens them.
    pub fn set_guest_details(&mut self, guest: GuestDetails) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        if self.step != CheckoutStep::GuestDetails {
            return Err(CheckoutError::InvalidTransition { from: self.step });
        }
        self.guest = guest;
        Ok(())
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        if self.step != CheckoutStep::PaymentMethod {
            return Err(CheckoutError::InvalidTransition { from: self.step });
        }
        self.payment_method = method;
        Ok(())
    }

    /// Vouchers are chosen on the final review step, right before the
    /// charge is frozen.
    pub fn select_voucher(&mut self, voucher_id: Option<ObjectId>) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        if self.step != CheckoutStep::ReviewAndConfirm {
            return Err(CheckoutError::InvalidTransition { from: self.step });
        }
        self.voucher_id = voucher_id;
        Ok(())
    }

    /// Field names that block leaving the guest details step. Hotels need a
    /// valid stay range, attractions a visit date.
    pub fn missing_guest_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();

        if self.guest.name.trim().is_empty() {
            missing.push("name");
        }
        if self.guest.email.trim().is_empty() {
            missing.push("email");
        }

        match self.product {
            ProductSelection::Hotel { .. } => {
                match (self.guest.check_in, self.guest.check_out) {
                    (Some(check_in), Some(check_out)) => {
                        if check_out <= check_in {
                            missing.push("check_out");
                        }
                    }
                    (check_in, check_out) => {
                        if check_in.is_none() {
                            missing.push("check_in");
                        }
                        if check_out.is_none() {
                            missing.push("check_out");
                        }
                    }
                }
            }
            ProductSelection::Attraction { .. } => {
                if self.guest.visit_date.is_none() {
                    missing.push("visit_date");
                }
            }
        }

        missing
    }

    /// Move one step forward. Refused (session unchanged) while required
    /// guest fields are missing; unconditional out of payment selection
    /// because `payment_method` always holds a value.
    pub fn advance(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.ensure_open()?;
        match self.step {
            CheckoutStep::GuestDetails => {
                let missing = self.missing_guest_fields();
                if !missing.is_empty() {
                    return Err(CheckoutError::MissingFields(missing));
                }
                self.step = CheckoutStep::PaymentMethod;
            }
            CheckoutStep::PaymentMethod => {
                self.step = CheckoutStep::ReviewAndConfirm;
            }
            CheckoutStep::ReviewAndConfirm => {
                return Err(CheckoutError::InvalidTransition { from: self.step });
            }
            CheckoutStep::Submitted | CheckoutStep::Aborted => unreachable!(),
        }
        Ok(self.step)
    }

    /// Move exactly one step backward; there is no skipping in either
    /// direction.
    pub fn step_back(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.ensure_open()?;
        match self.step {
            CheckoutStep::PaymentMethod => self.step = CheckoutStep::GuestDetails,
            CheckoutStep::ReviewAndConfirm => self.step = CheckoutStep::PaymentMethod,
            CheckoutStep::GuestDetails => {
                return Err(CheckoutError::InvalidTransition { from: self.step });
            }
            CheckoutStep::Submitted | CheckoutStep::Aborted => unreachable!(),
        }
        Ok(self.step)
    }

    pub fn abort(&mut self) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        self.step = CheckoutStep::Aborted;
        Ok(())
    }

    /// Only a session sitting on review may be submitted. A failed
    /// submission leaves the step untouched so the same frozen inputs can
    /// be retried.
    pub fn mark_submitted(&mut self) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        if self.step != CheckoutStep::ReviewAndConfirm {
            return Err(CheckoutError::InvalidTransition { from: self.step });
        }
        self.step = CheckoutStep::Submitted;
        Ok(())
    }

    /// Billable units: room-nights for hotels, tickets for attractions.
    /// Zero until the stay dates validate, which the pricing step rejects.
    pub fn quantity(&self) -> i64 {
        match self.product {
            ProductSelection::Hotel { rooms, .. } => {
                let nights = match (self.guest.check_in, self.guest.check_out) {
                    (Some(check_in), Some(check_out)) => {
                        (check_out - check_in).num_days().max(0)
                    }
                    _ => 0,
                };
                rooms * nights
            }
            ProductSelection::Attraction { tickets, .. } => tickets,
        }
    }
}

/// In-memory home of active checkout sessions. Each session belongs to a
/// single user's single booking attempt; the lock is only ever taken for
/// synchronous map access, never across an await.
#[derive(Default)]
pub struct CheckoutSessionStore {
    sessions: Mutex<HashMap<Uuid, CheckoutSession>>,
}

impl CheckoutSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: CheckoutSession) {
        self.sessions.lock().unwrap().insert(session.id, session);
    }

    pub fn get(&self, id: &Uuid) -> Option<CheckoutSession> {
        self.sessions.lock().unwrap().get(id).cloned()
    }

    /// Run a closure against the live session, returning its result.
    pub fn with_session<R>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut CheckoutSession) -> R,
    ) -> Option<R> {
        self.sessions.lock().unwrap().get_mut(id).map(f)
    }

    pub fn remove(&self, id: &Uuid) -> Option<CheckoutSession> {
        self.sessions.lock().unwrap().remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotel_session() -> CheckoutSession {
        CheckoutSession::new(
            ObjectId::new(),
            ProductSelection::Hotel {
                hotel_id: ObjectId::new(),
                rooms: 2,
            },
        )
    }

    fn attraction_session(tickets: i64) -> CheckoutSession {
        CheckoutSession::new(
            ObjectId::new(),
            ProductSelection::Attraction {
                attraction_id: ObjectId::new(),
                tickets,
            },
        )
    }

    fn valid_hotel_guest() -> GuestDetails {
        GuestDetails {
            name: "Putri Ayu".to_string(),
            email: "putri@example.com".to_string(),
            phone: None,
            check_in: NaiveDate::from_ymd_opt(2025, 7, 1),
            check_out: NaiveDate::from_ymd_opt(2025, 7, 4),
            visit_date: None,
        }
    }

    #[test]
    fn test_new_session_defaults() {
        let session = hotel_session();
        assert_eq!(session.step, CheckoutStep::GuestDetails);
        assert_eq!(session.payment_method, PaymentMethod::Qris);
        assert!(session.voucher_id.is_none());
    }

    #[test]
    fn test_cannot_advance_with_empty_guest_fields() {
        let mut session = hotel_session();
        let err = session.advance().unwrap_err();
        match err {
            CheckoutError::MissingFields(fields) => {
                assert!(fields.contains(&"name"));
                assert!(fields.contains(&"email"));
                assert!(fields.contains(&"check_in"));
                assert!(fields.contains(&"check_out"));
            }
            other => panic!("expected MissingFields, got {:?}", other),
        }
        // Refused transition leaves the session where it was
        assert_eq!(session.step, CheckoutStep::GuestDetails);
    }

    #[test]
    fn test_review_unreachable_without_valid_guest_fields() {
        let mut session = hotel_session();
        // No operation sequence from a fresh session lands on review
        // until guest validation has passed once.
        assert!(session.advance().is_err());
        assert!(session.step_back().is_err());
        assert!(session.advance().is_err());
        assert_ne!(session.step, CheckoutStep::ReviewAndConfirm);

        session.set_guest_details(valid_hotel_guest()).unwrap();
        assert_eq!(session.advance().unwrap(), CheckoutStep::PaymentMethod);
        assert_eq!(session.advance().unwrap(), CheckoutStep::ReviewAndConfirm);
    }

    #[test]
    fn test_checkout_is_linear() {
        let mut session = hotel_session();
        session.set_guest_details(valid_hotel_guest()).unwrap();
        session.advance().unwrap();
        session.advance().unwrap();

        // Forward past review is not a step transition
        assert_eq!(
            session.advance().unwrap_err(),
            CheckoutError::InvalidTransition {
                from: CheckoutStep::ReviewAndConfirm
            }
        );

        // Backward one step at a time, all the way to the start
        assert_eq!(session.step_back().unwrap(), CheckoutStep::PaymentMethod);
        assert_eq!(session.step_back().unwrap(), CheckoutStep::GuestDetails);
        assert!(session.step_back().is_err());
    }

    #[test]
    fn test_hotel_stay_range_must_be_positive() {
        let mut session = hotel_session();
        let mut guest = valid_hotel_guest();
        guest.check_out = guest.check_in;
        session.set_guest_details(guest).unwrap();

        match session.advance().unwrap_err() {
            CheckoutError::MissingFields(fields) => assert_eq!(fields, vec!["check_out"]),
            other => panic!("expected MissingFields, got {:?}", other),
        }
    }

    #[test]
    fn test_attraction_requires_visit_date() {
        let mut session = attraction_session(3);
        session
            .set_guest_details(GuestDetails {
                name: "Budi".to_string(),
                email: "budi@example.com".to_string(),
                ..GuestDetails::default()
            })
            .unwrap();

        match session.advance().unwrap_err() {
            CheckoutError::MissingFields(fields) => assert_eq!(fields, vec!["visit_date"]),
            other => panic!("expected MissingFields, got {:?}", other),
        }
    }

    #[test]
    fn test_payment_method_edits_only_on_payment_step() {
        let mut session = hotel_session();
        assert!(session.set_payment_method(PaymentMethod::Gopay).is_err());

        session.set_guest_details(valid_hotel_guest()).unwrap();
        session.advance().unwrap();
        session.set_payment_method(PaymentMethod::Gopay).unwrap();
        assert_eq!(session.payment_method, PaymentMethod::Gopay);

        // Advancing out of payment selection is unconditional
        assert_eq!(session.advance().unwrap(), CheckoutStep::ReviewAndConfirm);
    }

    #[test]
    fn test_voucher_selected_at_review_only() {
        let mut session = hotel_session();
        let voucher_id = ObjectId::new();
        assert!(session.select_voucher(Some(voucher_id)).is_err());

        session.set_guest_details(valid_hotel_guest()).unwrap();
        session.advance().unwrap();
        session.advance().unwrap();
        session.select_voucher(Some(voucher_id)).unwrap();
        assert_eq!(session.voucher_id, Some(voucher_id));
    }

    #[test]
    fn test_terminal_sessions_reject_everything() {
        let mut session = hotel_session();
        session.abort().unwrap();
        assert_eq!(session.step, CheckoutStep::Aborted);

        assert_eq!(session.advance().unwrap_err(), CheckoutError::SessionClosed);
        assert_eq!(session.step_back().unwrap_err(), CheckoutError::SessionClosed);
        assert_eq!(session.abort().unwrap_err(), CheckoutError::SessionClosed);
        assert_eq!(
            session.set_guest_details(valid_hotel_guest()).unwrap_err(),
            CheckoutError::SessionClosed
        );
        assert_eq!(
            session.mark_submitted().unwrap_err(),
            CheckoutError::SessionClosed
        );
    }

    #[test]
    fn test_submit_only_from_review() {
        let mut session = hotel_session();
        assert!(session.mark_submitted().is_err());

        session.set_guest_details(valid_hotel_guest()).unwrap();
        session.advance().unwrap();
        assert!(session.mark_submitted().is_err());

        session.advance().unwrap();
        session.mark_submitted().unwrap();
        assert_eq!(session.step, CheckoutStep::Submitted);
    }

    #[test]
    fn test_hotel_quantity_is_room_nights() {
        let mut session = hotel_session();
        session.set_guest_details(valid_hotel_guest()).unwrap();
        // 3 nights x 2 rooms
        assert_eq!(session.quantity(), 6);
    }

    #[test]
    fn test_attraction_quantity_is_tickets() {
        let session = attraction_session(4);
        assert_eq!(session.quantity(), 4);
    }

    #[test]
    fn test_session_store_round_trip() {
        let store = CheckoutSessionStore::new();
        let session = hotel_session();
        let id = session.id;

        store.insert(session);
        assert!(store.get(&id).is_some());

        let step = store.with_session(&id, |s| {
            s.set_guest_details(valid_hotel_guest()).unwrap();
            s.advance().unwrap()
        });
        assert_eq!(step, Some(CheckoutStep::PaymentMethod));

        assert!(store.remove(&id).is_some());
        assert!(store.get(&id).is_none());
        assert!(store.with_session(&id, |_| ()).is_none());
    }
}
