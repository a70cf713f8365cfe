//! Period statistics
//!
//! Orders belong to the period they were placed in. Growth compares against
//! the window of the same length that ends where the current period starts.

use chrono_tz::Tz;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use shared::dashboard::{DashboardStats, PartnerCounts, ShopRevenue, StatsPeriod};
use shared::order::{OrderSnapshot, OrderStatus};
use shared::partner::{PartnerSnapshot, PartnerStatus};
use std::collections::{BTreeMap, HashMap};

use crate::orders::money::round_money;
use crate::orders::{ManagerResult, OrdersManager};
use crate::utils::time::{day_start_millis, local_date, month_start, week_start};

/// Shops listed in `top_shops`
const TOP_SHOPS: usize = 5;

/// Period start in the business timezone; `None` for `All`
pub fn period_start(period: StatsPeriod, tz: Tz, now: i64) -> Option<i64> {
    let today = local_date(now, tz);
    let first_day = match period {
        StatsPeriod::Today => today,
        StatsPeriod::Week => week_start(today),
        StatsPeriod::Month => month_start(today),
        StatsPeriod::All => return None,
    };
    Some(day_start_millis(first_day, tz))
}

#[derive(Default)]
struct Totals {
    orders: u64,
    delivered: u64,
    cancelled: u64,
    revenue: Decimal,
}

fn totals<'a>(orders: impl Iterator<Item = &'a OrderSnapshot>) -> Totals {
    let mut totals = Totals::default();
    for order in orders {
        totals.orders += 1;
        match order.status {
            OrderStatus::Delivered => {
                totals.delivered += 1;
                totals.revenue += order.money.grand_total;
            }
            OrderStatus::Cancelled => totals.cancelled += 1,
            _ => {}
        }
    }
    totals
}

fn growth_pct(current: Decimal, previous: Decimal) -> Option<f64> {
    if previous.is_zero() {
        return None;
    }
    ((current - previous) / previous * Decimal::ONE_HUNDRED)
        .round_dp(2)
        .to_f64()
}

fn partner_counts(partners: &[PartnerSnapshot]) -> PartnerCounts {
    let mut counts = PartnerCounts {
        total: partners.len() as u64,
        ..PartnerCounts::default()
    };
    for partner in partners {
        match partner.status {
            PartnerStatus::Online => counts.online += 1,
            PartnerStatus::Busy => counts.busy += 1,
            PartnerStatus::Offline => {}
        }
    }
    counts.active = counts.online + counts.busy;
    counts
}

fn top_shops<'a>(orders: impl Iterator<Item = &'a OrderSnapshot>) -> Vec<ShopRevenue> {
    let mut by_shop: HashMap<&str, ShopRevenue> = HashMap::new();
    for order in orders.filter(|o| o.status == OrderStatus::Delivered) {
        let entry = by_shop
            .entry(order.shop_id.as_str())
            .or_insert_with(|| ShopRevenue {
                shop_id: order.shop_id.clone(),
                delivered_orders: 0,
                revenue: Decimal::ZERO,
            });
        entry.delivered_orders += 1;
        entry.revenue += order.money.grand_total;
    }

    let mut shops: Vec<ShopRevenue> = by_shop.into_values().collect();
    shops.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.shop_id.cmp(&b.shop_id))
    });
    shops.truncate(TOP_SHOPS);
    shops
}

/// Statistics over already loaded projections
pub fn compute_stats(
    orders: &[OrderSnapshot],
    partners: &[PartnerSnapshot],
    unassigned_orders: u64,
    period: StatsPeriod,
    tz: Tz,
    now: i64,
) -> DashboardStats {
    let start = period_start(period, tz, now);
    let in_period = |o: &&OrderSnapshot| start.is_none_or(|s| o.created_at >= s && o.created_at <= now);

    let current = totals(orders.iter().filter(in_period));

    let (orders_growth_pct, revenue_growth_pct) = match start {
        Some(start) => {
            let previous_start = start - (now - start);
            let previous = totals(
                orders
                    .iter()
                    .filter(|o| o.created_at >= previous_start && o.created_at < start),
            );
            (
                growth_pct(Decimal::from(current.orders), Decimal::from(previous.orders)),
                growth_pct(current.revenue, previous.revenue),
            )
        }
        None => (None, None),
    };

    let mut status_breakdown = BTreeMap::new();
    for order in orders.iter().filter(in_period) {
        *status_breakdown.entry(order.status).or_insert(0u64) += 1;
    }

    let average_order_value = if current.delivered == 0 {
        Decimal::ZERO
    } else {
        round_money(current.revenue / Decimal::from(current.delivered))
    };

    DashboardStats {
        period,
        period_start: start,
        generated_at: now,
        total_orders: current.orders,
        delivered_orders: current.delivered,
        cancelled_orders: current.cancelled,
        revenue: current.revenue,
        average_order_value,
        orders_growth_pct,
        revenue_growth_pct,
        status_breakdown,
        top_shops: top_shops(orders.iter().filter(in_period)),
        partners: partner_counts(partners),
        unassigned_orders,
    }
}

/// Statistics for `period` in the business timezone
pub fn get_dashboard_stats(
    manager: &OrdersManager,
    period: StatsPeriod,
    tz: Tz,
) -> ManagerResult<DashboardStats> {
    let orders = manager.all_orders()?;
    let partners = manager.all_partners()?;
    let unassigned = manager.list_unassigned()?.len() as u64;
    Ok(compute_stats(
        &orders,
        &partners,
        unassigned,
        period,
        tz,
        shared::util::now_millis(),
    ))
}
