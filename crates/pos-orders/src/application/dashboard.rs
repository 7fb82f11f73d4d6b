//! Dashboard read models.
//!
//! Revenue only counts orders whose payment settled (`PAID`) and which were
//! not cancelled. Order counts include unpaid orders.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Timelike};
use pos_core::error::DomainError;
use pos_core::repository::EventRepository;
use serde::Serialize;
use tracing::instrument;

use crate::application::query_handlers::load_all_orders;
use crate::domain::model::{OrderSnapshot, OrderStatus, PaymentMethod, PaymentStatus};

/// Headline figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Every order ever placed.
    pub total_orders: usize,
    /// Orders not yet completed or cancelled.
    pub active_orders: usize,
    /// Order count per status; every status is present.
    pub orders_by_status: BTreeMap<OrderStatus, usize>,
    /// Sum of settled order totals.
    pub total_revenue: i64,
    /// `total_revenue` divided by the number of settled orders, rounded down.
    pub average_order_value: i64,
    /// Non-cancelled orders whose payment has not settled.
    pub unpaid_orders: usize,
}

/// Count and revenue of a slice of the day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesBreakdown {
    /// Orders in the slice.
    pub order_count: usize,
    /// Settled revenue in the slice.
    pub revenue: i64,
}

/// Sales of one UTC hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlySales {
    /// Hour of day, 0 to 23.
    pub hour: u32,
    /// Orders placed in that hour.
    pub order_count: usize,
    /// Settled revenue of those orders.
    pub revenue: i64,
}

/// Sales report for a single UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    /// The reported day.
    pub date: NaiveDate,
    /// Non-cancelled orders placed that day.
    pub order_count: usize,
    /// Settled revenue of those orders.
    pub revenue: i64,
    /// Breakdown per payment method actually used that day.
    pub by_payment_method: BTreeMap<PaymentMethod, SalesBreakdown>,
    /// One entry per hour of the day, in order.
    pub by_hour: Vec<HourlySales>,
}

fn settled_revenue(order: &OrderSnapshot) -> i64 {
    if order.payment_status == PaymentStatus::Paid && order.status != OrderStatus::Cancelled {
        order.total
    } else {
        0
    }
}

/// Computes [`DashboardStats`] over a set of orders.
#[must_use]
pub fn summarize(orders: &[OrderSnapshot]) -> DashboardStats {
    let mut orders_by_status: BTreeMap<OrderStatus, usize> =
        OrderStatus::ALL.into_iter().map(|s| (s, 0)).collect();
    let mut total_revenue: i64 = 0;
    let mut settled_orders: i64 = 0;
    let mut active_orders = 0;
    let mut unpaid_orders = 0;

    for order in orders {
        *orders_by_status.entry(order.status).or_default() += 1;
        if !order.status.is_terminal() {
            active_orders += 1;
        }
        if order.status == OrderStatus::Cancelled {
            continue;
        }
        match order.payment_status {
            PaymentStatus::Paid => {
                total_revenue = total_revenue.saturating_add(order.total);
                settled_orders += 1;
            }
            PaymentStatus::Refunded => {}
            PaymentStatus::Unpaid | PaymentStatus::Pending | PaymentStatus::Failed => {
                unpaid_orders += 1;
            }
        }
    }

    DashboardStats {
        total_orders: orders.len(),
        active_orders,
        orders_by_status,
        total_revenue,
        average_order_value: if settled_orders == 0 {
            0
        } else {
            total_revenue / settled_orders
        },
        unpaid_orders,
    }
}

/// Computes the [`DailySales`] of `date` over a set of orders.
#[must_use]
pub fn daily_sales(date: NaiveDate, orders: &[OrderSnapshot]) -> DailySales {
    let mut by_hour: Vec<HourlySales> = (0..24)
        .map(|hour| HourlySales {
            hour,
            order_count: 0,
            revenue: 0,
        })
        .collect();
    let mut by_payment_method: BTreeMap<PaymentMethod, SalesBreakdown> = BTreeMap::new();
    let mut order_count = 0;
    let mut revenue: i64 = 0;

    let of_the_day = orders
        .iter()
        .filter(|o| o.created_at.date_naive() == date && o.status != OrderStatus::Cancelled);
    for order in of_the_day {
        let settled = settled_revenue(order);
        order_count += 1;
        revenue = revenue.saturating_add(settled);

        let method = by_payment_method.entry(order.payment_method).or_default();
        method.order_count += 1;
        method.revenue = method.revenue.saturating_add(settled);

        // `hour()` is always below 24.
        let slot = &mut by_hour[order.created_at.hour() as usize];
        slot.order_count += 1;
        slot.revenue = slot.revenue.saturating_add(settled);
    }

    DailySales {
        date,
        order_count,
        revenue,
        by_payment_method,
        by_hour,
    }
}

/// Headline dashboard figures over every stored order.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
#[instrument(skip_all)]
pub async fn get_dashboard_stats(
    repo: &dyn EventRepository,
) -> Result<DashboardStats, DomainError> {
    let orders = load_all_orders(repo).await?;
    Ok(summarize(&orders))
}

/// Sales report for the UTC day `date`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
#[instrument(skip(repo))]
pub async fn get_daily_sales(
    date: NaiveDate,
    repo: &dyn EventRepository,
) -> Result<DailySales, DomainError> {
    let orders = load_all_orders(repo).await?;
    Ok(daily_sales(date, &orders))
}
