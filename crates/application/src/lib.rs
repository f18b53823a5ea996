//! Application services and ports for the change log.

#![forbid(unsafe_code)]

pub mod cache_keys;
mod change_log_writer;
mod description_builder;
mod log_cache_service;
pub mod log_ports;
mod log_query_service;

pub use change_log_writer::{ChangeLogWriter, LogOperationInput};
pub use description_builder::{DescriptionBuilder, DescriptionInput, humanize_label, render_fact};
pub use log_cache_service::{CacheMetrics, CacheMetricsSnapshot, LogCacheService};
pub use log_query_service::LogQueryService;
