//! Lead aggregate and its validated customer fields.

use super::{LeadId, PipelineDomainError, StageId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trimmed, non-empty customer name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerName(String);

impl CustomerName {
    /// Creates a validated customer name.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::EmptyCustomerName`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, PipelineDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PipelineDomainError::EmptyCustomerName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Customer phone number as entered, trimmed.
///
/// Digits, spaces, and the punctuation `+ - ( )` are accepted; at least one
/// digit is required.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Creates a validated phone number.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::InvalidPhoneNumber`] when the value has
    /// no digits or contains unsupported characters.
    pub fn new(value: impl Into<String>) -> Result<Self, PipelineDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let has_digit = trimmed.chars().any(|ch| ch.is_ascii_digit());
        let all_allowed = trimmed
            .chars()
            .all(|ch| ch.is_ascii_digit() || matches!(ch, ' ' | '+' | '-' | '(' | ')'));
        if !has_digit || !all_allowed {
            return Err(PipelineDomainError::InvalidPhoneNumber(raw));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the phone number as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-negative price in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Creates a validated price.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::NegativePrice`] for negative amounts.
    pub const fn from_minor_units(value: i64) -> Result<Self, PipelineDomainError> {
        if value < 0 {
            return Err(PipelineDomainError::NegativePrice(value));
        }
        Ok(Self(value))
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.0
    }
}

/// Editable commercial details of a lead.
///
/// Text fields are trimmed on construction; blank values become `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadDetails {
    price: Option<Price>,
    notes: Option<String>,
    delivery_status: Option<String>,
    action_status: Option<String>,
}

impl LeadDetails {
    /// Creates empty details.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the price.
    #[must_use]
    pub const fn with_price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    /// Sets free-form notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = non_blank(notes.into());
        self
    }

    /// Sets the delivery status label.
    #[must_use]
    pub fn with_delivery_status(mut self, status: impl Into<String>) -> Self {
        self.delivery_status = non_blank(status.into());
        self
    }

    /// Sets the action status label.
    #[must_use]
    pub fn with_action_status(mut self, status: impl Into<String>) -> Self {
        self.action_status = non_blank(status.into());
        self
    }

    /// Returns the price, if any.
    #[must_use]
    pub const fn price(&self) -> Option<Price> {
        self.price
    }

    /// Returns the notes, if any.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns the delivery status label, if any.
    #[must_use]
    pub fn delivery_status(&self) -> Option<&str> {
        self.delivery_status.as_deref()
    }

    /// Returns the action status label, if any.
    #[must_use]
    pub fn action_status(&self) -> Option<&str> {
        self.action_status.as_deref()
    }
}

pub(crate) fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Parameter object for creating a lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    /// Customer display name.
    pub customer_name: CustomerName,
    /// Customer phone number.
    pub customer_phone: PhoneNumber,
    /// Initial stage.
    pub stage_id: StageId,
    /// Owning seller.
    pub seller_id: UserId,
    /// Initial commercial details.
    pub details: LeadDetails,
}

/// Parameter object for reconstructing a persisted lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedLeadData {
    /// Persisted lead identifier.
    pub id: LeadId,
    /// Persisted customer name.
    pub customer_name: CustomerName,
    /// Persisted customer phone.
    pub customer_phone: PhoneNumber,
    /// Persisted current stage.
    pub stage_id: StageId,
    /// Persisted owning seller.
    pub seller_id: UserId,
    /// Persisted commercial details.
    pub details: LeadDetails,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Lead aggregate root: a prospective sale sitting in exactly one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    id: LeadId,
    customer_name: CustomerName,
    customer_phone: PhoneNumber,
    stage_id: StageId,
    seller_id: UserId,
    details: LeadDetails,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Lead {
    /// Creates a new lead.
    #[must_use]
    pub fn new(data: NewLead, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: LeadId::new(),
            customer_name: data.customer_name,
            customer_phone: data.customer_phone,
            stage_id: data.stage_id,
            seller_id: data.seller_id,
            details: data.details,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a lead from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedLeadData) -> Self {
        Self {
            id: data.id,
            customer_name: data.customer_name,
            customer_phone: data.customer_phone,
            stage_id: data.stage_id,
            seller_id: data.seller_id,
            details: data.details,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the lead identifier.
    #[must_use]
    pub const fn id(&self) -> LeadId {
        self.id
    }

    /// Returns the customer name.
    #[must_use]
    pub const fn customer_name(&self) -> &CustomerName {
        &self.customer_name
    }

    /// Returns the customer phone number.
    #[must_use]
    pub const fn customer_phone(&self) -> &PhoneNumber {
        &self.customer_phone
    }

    /// Returns the current stage.
    #[must_use]
    pub const fn stage_id(&self) -> StageId {
        self.stage_id
    }

    /// Returns the owning seller.
    #[must_use]
    pub const fn seller_id(&self) -> UserId {
        self.seller_id
    }

    /// Returns the commercial details.
    #[must_use]
    pub const fn details(&self) -> &LeadDetails {
        &self.details
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the lead to another stage.
    ///
    /// Stage existence and annotation requirements are checked by the
    /// transition gate before this is called.
    pub fn move_to_stage(&mut self, stage_id: StageId, clock: &impl Clock) {
        self.stage_id = stage_id;
        self.touch(clock);
    }

    /// Replaces the commercial details.
    pub fn update_details(&mut self, details: LeadDetails, clock: &impl Clock) {
        self.details = details;
        self.touch(clock);
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
