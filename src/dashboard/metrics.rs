//! Figures shown on the dashboard, derived from the order list on demand.

use serde::Serialize;

use crate::domain::Order;

/// Missing or non-finite amounts count as zero.
pub fn amount(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

pub fn total_orders(orders: &[Order]) -> usize {
    orders.len()
}

pub fn total_profit(orders: &[Order]) -> f64 {
    orders.iter().map(|o| OrderFinancials::of(o).profit).sum()
}

pub fn pending_orders(orders: &[Order]) -> usize {
    orders.iter().filter(|o| !o.is_completed()).count()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_orders: usize,
    pub total_profit: f64,
    pub pending_orders: usize,
}

impl DashboardMetrics {
    pub fn compute(orders: &[Order]) -> Self {
        Self {
            total_orders: total_orders(orders),
            total_profit: total_profit(orders),
            pending_orders: pending_orders(orders),
        }
    }
}

/// Money figures for one order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFinancials {
    pub payments_received: f64,
    pub expense: f64,
    pub profit: f64,
}

impl OrderFinancials {
    pub fn of(order: &Order) -> Self {
        let payments_received = amount(order.payments_received);
        let expense = amount(order.expense);
        Self {
            payments_received,
            expense,
            profit: payments_received - expense,
        }
    }
}

/// Renders `$1234.50` and `$-12.50`. Non-finite amounts and negative zero
/// render as `$0.00`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return "$0.00".to_string();
    }
    format!("${value:.2}")
}
