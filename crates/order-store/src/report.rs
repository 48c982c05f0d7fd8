//! Operational report over orders and their processing logs.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId};
use domain::{LineItem, Order, OrderStatus, ProcessingLog, ProcessingStep, StepStatus};
use serde::Serialize;

/// Default look-back window for recent transitions.
pub const DEFAULT_REPORT_WINDOW_DAYS: i64 = 7;

/// Number of orders currently in a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: OrderStatus,
    pub total_orders: i64,
}

/// One processing-log row of a recent order, paired with one of its line items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLine {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub current_status: OrderStatus,
    pub step: ProcessingStep,
    pub step_status: StepStatus,
    pub log_message: String,
    pub transition_time: DateTime<Utc>,
    pub item: LineItem,
    pub shipping_method: Option<String>,
    pub shipping_address: Option<String>,
    pub tracking_id: Option<String>,
}

impl ReportLine {
    /// Expands a log row into one line per item of its order.
    pub fn expand<'a>(
        order: &'a Order,
        log: &'a ProcessingLog,
    ) -> impl Iterator<Item = ReportLine> + 'a {
        let shipping = order.order_details.shipping.as_ref();
        order.order_details.items.iter().map(move |item| ReportLine {
            order_id: order.id,
            customer_id: order.customer_id,
            current_status: order.status,
            step: log.step,
            step_status: log.status,
            log_message: log.log_message.clone(),
            transition_time: log.created_at,
            item: item.clone(),
            shipping_method: shipping.and_then(|s| s.method.clone()),
            shipping_address: shipping.and_then(|s| s.address.clone()),
            tracking_id: shipping.and_then(|s| s.tracking.clone()),
        })
    }
}

/// Status counts plus the recent transition lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReport {
    pub status_counts: Vec<StatusCount>,
    pub recent_transitions: Vec<ReportLine>,
}

/// Sorts counts into pipeline order.
pub(crate) fn sort_counts(counts: &mut [StatusCount]) {
    counts.sort_by_key(|c| {
        OrderStatus::ALL
            .iter()
            .position(|s| *s == c.status)
            .unwrap_or(usize::MAX)
    });
}
