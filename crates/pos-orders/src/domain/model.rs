//! Order value types shared by the aggregate, the read side and the wire.

use std::fmt;

use chrono::{DateTime, Utc};
use pos_core::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque order identifier as seen by clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Uuid> for OrderId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Placed, not yet acknowledged by staff.
    Pending,
    /// Acknowledged.
    Confirmed,
    /// Being prepared.
    Preparing,
    /// Ready for hand-over.
    Ready,
    /// Handed over. Terminal.
    Completed,
    /// Cancelled. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Preparing,
        Self::Ready,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use OrderStatus::{Cancelled, Completed, Confirmed, Pending, Preparing, Ready};
        matches!(
            (self, next),
            (Pending, Confirmed | Preparing | Cancelled)
                | (Confirmed, Preparing | Cancelled)
                | (Preparing, Ready | Cancelled)
                | (Ready, Completed)
        )
    }
}

/// How an order is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash at the counter.
    Cash,
    /// Card terminal at the counter.
    Card,
    /// VNPAY redirect checkout.
    Vnpay,
    /// MoMo wallet redirect checkout.
    Momo,
    /// ZaloPay redirect checkout.
    Zalopay,
}

impl PaymentMethod {
    /// Whether the method is settled through an online redirect provider.
    #[must_use]
    pub fn is_online(self) -> bool {
        matches!(self, Self::Vnpay | Self::Momo | Self::Zalopay)
    }

    /// Wire name of the method.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Card => "CARD",
            Self::Vnpay => "VNPAY",
            Self::Momo => "MOMO",
            Self::Zalopay => "ZALOPAY",
        }
    }
}

/// Settlement state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Nothing collected yet.
    Unpaid,
    /// An online payment was started and awaits settlement.
    Pending,
    /// Settled.
    Paid,
    /// The last payment attempt failed.
    Failed,
    /// Money returned to the customer.
    Refunded,
}

/// One order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Catalogue product identifier.
    pub product_id: String,
    /// Display name at the time of ordering.
    pub name: String,
    /// Units ordered; must be positive.
    pub quantity: u32,
    /// Price per unit in minor currency units.
    pub unit_price: i64,
}

impl OrderItem {
    /// Quantity times unit price, or `None` if it does not fit an `i64`.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<i64> {
        i64::from(self.quantity).checked_mul(self.unit_price)
    }

    /// Quantity times unit price, saturating at `i64::MAX`.
    #[must_use]
    pub fn line_total(&self) -> i64 {
        i64::from(self.quantity).saturating_mul(self.unit_price)
    }
}

/// Sum of all line totals, or `None` if it does not fit an `i64`.
#[must_use]
pub fn checked_order_total(items: &[OrderItem]) -> Option<i64> {
    let mut total: i64 = 0;
    for item in items {
        total = total.checked_add(item.checked_line_total()?)?;
    }
    Some(total)
}

/// Sum of all line totals, saturating at `i64::MAX`.
///
/// Items that passed [`validate_items`] never saturate.
#[must_use]
pub fn order_total(items: &[OrderItem]) -> i64 {
    items
        .iter()
        .map(OrderItem::line_total)
        .fold(0, i64::saturating_add)
}

/// Rejects empty item lists and malformed lines.
///
/// # Errors
///
/// Returns `DomainError::Validation` describing the first offending line.
pub fn validate_items(items: &[OrderItem]) -> Result<(), DomainError> {
    if items.is_empty() {
        return Err(DomainError::Validation(
            "an order needs at least one item".into(),
        ));
    }
    for item in items {
        if item.product_id.trim().is_empty() {
            return Err(DomainError::Validation("item product id is empty".into()));
        }
        if item.quantity == 0 {
            return Err(DomainError::Validation(format!(
                "item {} has zero quantity",
                item.product_id
            )));
        }
        if item.unit_price < 0 {
            return Err(DomainError::Validation(format!(
                "item {} has a negative unit price",
                item.product_id
            )));
        }
        if item.checked_line_total().is_none() {
            return Err(DomainError::Validation(format!(
                "item {} total is too large",
                item.product_id
            )));
        }
    }
    if checked_order_total(items).is_none() {
        return Err(DomainError::Validation("order total is too large".into()));
    }
    Ok(())
}

/// Partial update applied to an open order. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderChanges {
    /// Replacement item list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItem>>,
    /// Replacement note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Replacement payment method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    /// Replacement payment status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    /// Replacement station (table, counter, kitchen line).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
}

impl OrderChanges {
    /// Whether no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_none()
            && self.note.is_none()
            && self.payment_method.is_none()
            && self.payment_status.is_none()
            && self.station.is_none()
    }
}

/// Full read view of an order; the payload of created/updated notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    /// Order identifier.
    pub id: OrderId,
    /// Ordered lines.
    pub items: Vec<OrderItem>,
    /// Sum of line totals in minor currency units.
    pub total: i64,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Chosen payment method.
    pub payment_method: PaymentMethod,
    /// Settlement state.
    pub payment_status: PaymentStatus,
    /// User who placed the order.
    pub created_by: Uuid,
    /// Table, counter or kitchen line the order belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    /// Free-form note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Provider transaction of the last online payment attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// When the order last changed.
    pub updated_at: DateTime<Utc>,
    /// Number of persisted events.
    pub version: i64,
}
