//! Dashboard statistics types

use crate::order::OrderStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reporting period, in the business timezone
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatsPeriod {
    #[default]
    Today,
    /// ISO week to date
    Week,
    /// Calendar month to date
    Month,
    All,
}

impl std::str::FromStr for StatsPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "today" => Ok(StatsPeriod::Today),
            "week" => Ok(StatsPeriod::Week),
            "month" => Ok(StatsPeriod::Month),
            "all" => Ok(StatsPeriod::All),
            other => Err(format!("unknown period: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShopRevenue {
    pub shop_id: String,
    pub delivered_orders: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PartnerCounts {
    /// Online or busy
    pub active: u64,
    pub online: u64,
    pub busy: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub period: StatsPeriod,
    /// Period start (Unix millis); None for `All`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_start: Option<i64>,
    pub generated_at: i64,
    pub total_orders: u64,
    pub delivered_orders: u64,
    pub cancelled_orders: u64,
    /// Sum of grand totals of delivered orders
    pub revenue: Decimal,
    pub average_order_value: Decimal,
    /// Percent change against the previous period of equal length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orders_growth_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_growth_pct: Option<f64>,
    pub status_breakdown: BTreeMap<OrderStatus, u64>,
    pub top_shops: Vec<ShopRevenue>,
    pub partners: PartnerCounts,
    pub unassigned_orders: u64,
}
