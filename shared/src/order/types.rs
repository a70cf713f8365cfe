//! Shared value types for orders

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Actors
// ============================================================================

/// Role of whoever issued a command
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Customer,
    Shop,
    Partner,
    Admin,
    /// Internal workers (payment reconciler, assignment engine, earnings)
    System,
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActorRole::Customer => "CUSTOMER",
            ActorRole::Shop => "SHOP",
            ActorRole::Partner => "PARTNER",
            ActorRole::Admin => "ADMIN",
            ActorRole::System => "SYSTEM",
        };
        f.write_str(s)
    }
}

/// Identity attached to every command and event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: ActorRole) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }

    /// Internal actor used by background workers
    pub fn system(name: impl Into<String>) -> Self {
        Self::new("system", name, ActorRole::System)
    }

    pub fn is(&self, role: ActorRole) -> bool {
        self.role == role
    }
}

// ============================================================================
// Location
// ============================================================================

/// WGS84 coordinate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Delivery address snapshot taken when the order is placed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryAddress {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

// ============================================================================
// Items and money
// ============================================================================

/// Ordered line item with a snapshot of the product name and price
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Money breakdown of an order
///
/// `grand_total` always equals `item_total + delivery_fee + taxes`; the only
/// constructor computes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoneyBreakdown {
    pub item_total: Decimal,
    pub delivery_fee: Decimal,
    pub taxes: Decimal,
    pub grand_total: Decimal,
}

impl MoneyBreakdown {
    pub fn new(item_total: Decimal, delivery_fee: Decimal, taxes: Decimal) -> Self {
        Self {
            item_total,
            delivery_fee,
            taxes,
            grand_total: item_total + delivery_fee + taxes,
        }
    }

    pub fn from_items(items: &[LineItem], delivery_fee: Decimal, taxes: Decimal) -> Self {
        let item_total = items.iter().map(LineItem::line_total).sum();
        Self::new(item_total, delivery_fee, taxes)
    }

    pub fn is_consistent(&self) -> bool {
        self.grand_total == self.item_total + self.delivery_fee + self.taxes
    }
}

impl Default for MoneyBreakdown {
    fn default() -> Self {
        Self::new(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    }
}

// ============================================================================
// Payment
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Online,
    CashOnDelivery,
}

/// Payment status; moves one way, `Pending -> Success` or `Pending -> Failed`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

/// Payment embedded in an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    /// Gateway order reference (online payments only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub razorpay_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub razorpay_payment_id: Option<String>,
    pub status: PaymentStatus,
    /// Number of gateway references issued for this order
    #[serde(default)]
    pub attempts: u32,
    pub updated_at: i64,
}

impl PaymentInfo {
    /// Whether the order may be confirmed as far as payment is concerned
    pub fn allows_confirmation(&self) -> bool {
        match self.method {
            PaymentMethod::CashOnDelivery => true,
            PaymentMethod::Online => self.status == PaymentStatus::Success,
        }
    }
}

// ============================================================================
// Assignment
// ============================================================================

/// Flag raised on an order that needs admin attention
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentFlag {
    /// Offer rounds exhausted without acceptance
    UnassignedTimeout,
}

/// Why an offer did not turn into an assignment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferOutcome {
    Declined,
    Expired,
}

/// Partner response to an offer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OfferResponse {
    Accept,
    Reject,
}

/// The single offer currently open for an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenOffer {
    pub partner_id: String,
    pub round: u32,
    pub distance_km: f64,
    pub expires_at: i64,
}

/// Assignment progress recorded on the order projection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AssignmentState {
    /// Offers made since matching last (re)started
    pub offers_made: u32,
    /// Partners offered this order since matching last (re)started
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tried_partners: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_offer: Option<OpenOffer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<AssignmentFlag>,
}
