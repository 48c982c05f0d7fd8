//! The fulfillment state machine and its consumer loop.

use std::time::Instant;

use broker::{Delivery, DeliveryStream};
use cache::Cache;
use common::OrderId;
use domain::{FulfillmentEvent, OrderStatus, ProcessingLog, ProcessingStep, StepStatus};
use futures_util::StreamExt;
use order_store::{OrderStore, OrderStoreExt, StoreError};
use search::{Reindexer, SearchIndex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::audit::AuditLog;
use crate::error::{FulfillmentError, Result};
use crate::payment::PaymentGateway;
use crate::steps;

/// What the worker does to the cached order snapshot when an order
/// reaches a terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Leave the entry alone; it expires on its TTL.
    #[default]
    TtlOnly,
    /// Delete `order:{id}` after every terminal status write.
    InvalidateOnTransition,
}

/// How a single fulfillment event ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// All steps succeeded; the order is `completed`.
    Completed,
    /// Payment failed; the order is `failed`.
    PaymentDeclined,
    /// A step failed unexpectedly; a `worker` error was logged and the
    /// order is `failed`.
    Aborted { reason: String },
    /// The order was already terminal; nothing was touched.
    AlreadyTerminal(OrderStatus),
    /// No such order.
    OrderMissing,
}

/// The last step a previous run recorded for an order still `processing`.
///
/// Successful checkpoints are ordered by pipeline position; a run resumes
/// with the first step past its checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Checkpoint {
    Fresh,
    Validated,
    PaymentStarted,
    Paid,
    Invoiced,
    /// Payment was declined but the status write never landed.
    Declined,
    /// A worker error was recorded but the status write never landed.
    Crashed(String),
}

impl Checkpoint {
    fn from_trail(trail: &[ProcessingLog]) -> Self {
        let Some(last) = trail.last() else {
            return Checkpoint::Fresh;
        };
        match last.entry() {
            (ProcessingStep::Validation, StepStatus::Success) => Checkpoint::Validated,
            (ProcessingStep::Payment, StepStatus::Processing) => Checkpoint::PaymentStarted,
            (ProcessingStep::Payment, StepStatus::Success) => Checkpoint::Paid,
            (ProcessingStep::Payment, StepStatus::Error) => Checkpoint::Declined,
            (ProcessingStep::Invoice, StepStatus::Success) => Checkpoint::Invoiced,
            _ => Checkpoint::Crashed(last.log_message.clone()),
        }
    }
}

/// Drives orders through validation, payment and invoice.
///
/// The worker never trusts the event beyond the order id: every run starts
/// by re-reading the order, and an order that is already terminal is left
/// untouched. Status writes go through the store's conditional update, so
/// a late or duplicate run cannot move an order backwards.
pub struct FulfillmentWorker<S, I, P, C>
where
    S: OrderStore + Clone,
    I: SearchIndex,
    P: PaymentGateway,
    C: Cache,
{
    store: S,
    audit: AuditLog<S>,
    reindexer: Reindexer<S, I>,
    payment: P,
    cache: C,
    cache_policy: CachePolicy,
}

impl<S, I, P, C> FulfillmentWorker<S, I, P, C>
where
    S: OrderStore + Clone,
    I: SearchIndex,
    P: PaymentGateway,
    C: Cache,
{
    pub fn new(store: S, index: I, payment: P, cache: C) -> Self {
        Self {
            audit: AuditLog::new(store.clone()),
            reindexer: Reindexer::new(store.clone(), index),
            store,
            payment,
            cache,
            cache_policy: CachePolicy::default(),
        }
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Processes one fulfillment event to completion.
    ///
    /// Business failures end in `Ok`: a declined payment or an unexpected
    /// step failure both leave the order `failed` with an audit trail. An
    /// `Err` means the failure could not even be recorded, and the message
    /// should be delivered again later.
    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id))]
    pub async fn handle(&self, event: FulfillmentEvent) -> Result<Outcome> {
        let order_id = event.order_id;
        let started = Instant::now();
        metrics::counter!("fulfillment_messages_total").increment(1);

        let outcome = match self.run_steps(order_id).await {
            Ok(outcome) => outcome,
            Err(e) => self.abort(order_id, e).await?,
        };

        match &outcome {
            Outcome::Completed => {
                metrics::counter!("fulfillment_completed_total").increment(1);
            }
            Outcome::PaymentDeclined | Outcome::Aborted { .. } => {
                metrics::counter!("fulfillment_failed_total").increment(1);
            }
            Outcome::AlreadyTerminal(_) | Outcome::OrderMissing => {
                metrics::counter!("fulfillment_skipped_total").increment(1);
            }
        }
        metrics::histogram!("fulfillment_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        info!(?outcome, "fulfillment finished");
        Ok(outcome)
    }

    async fn run_steps(&self, order_id: OrderId) -> Result<Outcome> {
        let Some(order) = self.store.find_order(order_id).await? else {
            warn!("no such order, dropping event");
            return Ok(Outcome::OrderMissing);
        };

        if order.status.is_terminal() {
            info!(status = %order.status, "order already terminal, skipping");
            return Ok(Outcome::AlreadyTerminal(order.status));
        }

        let mut resumed = order.status == OrderStatus::Processing;
        if order.status == OrderStatus::Pending
            && !self
                .store
                .update_order_status(order_id, OrderStatus::Processing)
                .await?
        {
            let current = self.store.require_order(order_id).await?.status;
            if current.is_terminal() {
                info!(status = %current, "order finished concurrently, skipping");
                return Ok(Outcome::AlreadyTerminal(current));
            }
            resumed = true;
        }

        let checkpoint = if resumed {
            Checkpoint::from_trail(&self.store.processing_logs(order_id).await?)
        } else {
            Checkpoint::Fresh
        };
        if checkpoint != Checkpoint::Fresh {
            info!(?checkpoint, "resuming interrupted fulfillment");
        }

        match &checkpoint {
            Checkpoint::Declined => {
                self.finish(order_id, OrderStatus::Failed).await?;
                return Ok(Outcome::PaymentDeclined);
            }
            Checkpoint::Crashed(reason) => {
                self.finish(order_id, OrderStatus::Failed).await?;
                return Ok(Outcome::Aborted {
                    reason: reason.clone(),
                });
            }
            _ => {}
        }

        let amount = order
            .order_details
            .total()
            .map_err(FulfillmentError::Amount)?;

        // 1. Validation
        if checkpoint < Checkpoint::Validated {
            self.audit
                .record(
                    order_id,
                    ProcessingStep::Validation,
                    StepStatus::Success,
                    steps::MSG_VALIDATED,
                )
                .await?;
        }

        // 2. Payment
        if checkpoint < Checkpoint::PaymentStarted {
            self.audit
                .record(
                    order_id,
                    ProcessingStep::Payment,
                    StepStatus::Processing,
                    steps::MSG_PAYMENT_STARTED,
                )
                .await?;
        }

        if checkpoint < Checkpoint::Paid {
            match self.payment.charge(order_id, amount).await {
                Ok(receipt) => {
                    info!(payment_id = %receipt.payment_id, "payment approved");
                    self.audit
                        .record(
                            order_id,
                            ProcessingStep::Payment,
                            StepStatus::Success,
                            steps::MSG_PAYMENT_DONE,
                        )
                        .await?;
                }
                Err(e) => {
                    warn!(error = %e, "payment failed");
                    self.audit
                        .record(
                            order_id,
                            ProcessingStep::Payment,
                            StepStatus::Error,
                            steps::MSG_PAYMENT_FAILED,
                        )
                        .await?;
                    self.finish(order_id, OrderStatus::Failed).await?;
                    return Ok(Outcome::PaymentDeclined);
                }
            }
        }

        // 3. Invoice
        if checkpoint < Checkpoint::Invoiced {
            self.audit
                .record(
                    order_id,
                    ProcessingStep::Invoice,
                    StepStatus::Success,
                    steps::MSG_INVOICE_GENERATED,
                )
                .await?;
        }

        self.finish(order_id, OrderStatus::Completed).await?;
        Ok(Outcome::Completed)
    }

    /// Records an unexpected failure and fails the order.
    async fn abort(&self, order_id: OrderId, cause: FulfillmentError) -> Result<Outcome> {
        let reason = cause.to_string();
        error!(%order_id, error = %reason, "fulfillment step failed");

        match self
            .audit
            .record(order_id, ProcessingStep::Worker, StepStatus::Error, &reason)
            .await
        {
            Ok(_) => {}
            Err(FulfillmentError::Store(StoreError::OrderNotFound(_))) => {
                return Ok(Outcome::OrderMissing);
            }
            Err(e) => return Err(e),
        }

        self.finish(order_id, OrderStatus::Failed).await?;
        Ok(Outcome::Aborted { reason })
    }

    /// Writes a terminal status, then refreshes cache and search.
    async fn finish(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        if !self.store.update_order_status(order_id, status).await? {
            warn!(%order_id, %status, "order already terminal, status left unchanged");
        }

        if self.cache_policy == CachePolicy::InvalidateOnTransition
            && let Err(e) = self.cache.delete(&order_id.cache_key()).await
        {
            warn!(%order_id, error = %e, "cache invalidation failed");
        }

        if let Err(e) = self.reindexer.reindex(order_id).await {
            warn!(%order_id, error = %e, "re-index failed");
        }
        Ok(())
    }

    /// Processes and settles one delivery.
    ///
    /// Undecodable payloads are rejected without requeue. A failure that
    /// could not be recorded is rejected with requeue. Everything else is
    /// acknowledged.
    pub async fn handle_delivery(&self, delivery: Delivery) -> Result<()> {
        let event = match FulfillmentEvent::from_bytes(&delivery.payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(routing_key = %delivery.routing_key, error = %e, "rejecting undecodable message");
                delivery.reject(false).await?;
                return Ok(());
            }
        };

        if delivery.redelivered {
            info!(order_id = %event.order_id, "processing redelivered message");
        }

        match self.handle(event).await {
            Ok(_) => delivery.ack().await?,
            Err(e) => {
                error!(order_id = %event.order_id, error = %e, "could not record failure, requeueing");
                delivery.reject(true).await?;
            }
        }
        Ok(())
    }

    /// Consumes deliveries one at a time until `shutdown` is cancelled.
    ///
    /// A message already being processed runs to completion before the
    /// loop notices cancellation.
    pub async fn run(&self, mut deliveries: DeliveryStream, shutdown: CancellationToken) -> Result<()> {
        info!("fulfillment worker started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("fulfillment worker shutting down");
                    break;
                }

                next = deliveries.next() => match next {
                    Some(Ok(delivery)) => {
                        if let Err(e) = self.handle_delivery(delivery).await {
                            error!(error = %e, "failed to settle delivery");
                        }
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "delivery stream failed");
                        return Err(e.into());
                    }
                    None => return Err(FulfillmentError::StreamClosed),
                },
            }
        }

        info!("fulfillment worker stopped");
        Ok(())
    }
}
