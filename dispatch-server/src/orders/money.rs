//! Money validation for order input
//!
//! Amounts are `Decimal` end to end; nothing here converts to floats.

use crate::orders::traits::OrderError;
use rust_decimal::Decimal;
use shared::command::PlaceOrderInput;
use shared::order::LineItem;

/// Maximum allowed unit price
const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Maximum delivery fee or tax amount on one order
pub const MAX_CHARGE: Decimal = MAX_PRICE;
/// Maximum allowed quantity per line
const MAX_QUANTITY: u32 = 9999;
/// Maximum number of lines per order
const MAX_LINES: usize = 200;

fn require_non_negative(value: Decimal, field_name: &str) -> Result<(), OrderError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(OrderError::Validation(format!(
            "{} must be non-negative, got {}",
            field_name, value
        )));
    }
    Ok(())
}

pub fn validate_line_item(item: &LineItem) -> Result<(), OrderError> {
    if item.product_id.trim().is_empty() {
        return Err(OrderError::Validation("product_id is required".to_string()));
    }
    require_non_negative(item.unit_price, "unit_price")?;
    if item.unit_price > MAX_PRICE {
        return Err(OrderError::Validation(format!(
            "unit_price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, item.unit_price
        )));
    }
    if item.quantity == 0 {
        return Err(OrderError::Validation(format!(
            "quantity must be positive for {}",
            item.product_id
        )));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(OrderError::Validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, item.quantity
        )));
    }
    Ok(())
}

/// Validate the monetary parts of a new order
pub fn validate_order_input(input: &PlaceOrderInput) -> Result<(), OrderError> {
    if input.items.is_empty() {
        return Err(OrderError::Validation("order has no items".to_string()));
    }
    if input.items.len() > MAX_LINES {
        return Err(OrderError::Validation(format!(
            "too many lines ({}), maximum is {}",
            input.items.len(),
            MAX_LINES
        )));
    }
    for item in &input.items {
        validate_line_item(item)?;
    }
    require_charge(input.delivery_fee, "delivery_fee")?;
    require_charge(input.taxes, "taxes")?;
    Ok(())
}

fn require_charge(value: Decimal, field_name: &str) -> Result<(), OrderError> {
    require_non_negative(value, field_name)?;
    if value > MAX_CHARGE {
        return Err(OrderError::Validation(format!(
            "{} exceeds maximum allowed ({}), got {}",
            field_name, MAX_CHARGE, value
        )));
    }
    Ok(())
}

/// Delivery amounts are stored at two decimal places, half away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}
