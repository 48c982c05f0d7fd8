//! Append-only audit trail of fulfillment steps.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The fulfillment step a log row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStep {
    Validation,
    Payment,
    Invoice,
    /// Failures caught outside any single step.
    Worker,
}

impl ProcessingStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStep::Validation => "validation",
            ProcessingStep::Payment => "payment",
            ProcessingStep::Invoice => "invoice",
            ProcessingStep::Worker => "worker",
        }
    }
}

impl std::fmt::Display for ProcessingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProcessingStep {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "validation" => Ok(ProcessingStep::Validation),
            "payment" => Ok(ProcessingStep::Payment),
            "invoice" => Ok(ProcessingStep::Invoice),
            "worker" => Ok(ProcessingStep::Worker),
            other => Err(DomainError::UnknownValue {
                kind: "processing step",
                value: other.to_string(),
            }),
        }
    }
}

/// Outcome recorded for a step attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Processing,
    Error,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Success => "success",
            StepStatus::Processing => "processing",
            StepStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(StepStatus::Success),
            "processing" => Ok(StepStatus::Processing),
            "error" => Ok(StepStatus::Error),
            other => Err(DomainError::UnknownValue {
                kind: "step status",
                value: other.to_string(),
            }),
        }
    }
}

/// A stored audit row. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingLog {
    pub id: i64,
    pub order_id: OrderId,
    pub step: ProcessingStep,
    pub status: StepStatus,
    pub log_message: String,
    pub created_at: DateTime<Utc>,
}

impl ProcessingLog {
    /// The `(step, status)` pair, handy for comparing whole trails.
    pub fn entry(&self) -> (ProcessingStep, StepStatus) {
        (self.step, self.status)
    }
}

/// An audit row waiting to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProcessingLog {
    pub order_id: OrderId,
    pub step: ProcessingStep,
    pub status: StepStatus,
    pub log_message: String,
}

impl NewProcessingLog {
    pub fn new(
        order_id: OrderId,
        step: ProcessingStep,
        status: StepStatus,
        log_message: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            step,
            status,
            log_message: log_message.into(),
        }
    }
}
