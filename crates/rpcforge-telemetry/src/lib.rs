// SPDX-License-Identifier: MIT OR Apache-2.0
#![warn(missing_docs)]

//! Call-level metrics collection and structured lifecycle logging.

pub mod log;
pub mod metrics;

pub use metrics::{CallRecord, MetricsCollector, MetricsSummary};
