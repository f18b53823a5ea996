//! Ports for change record persistence, caching, operator context, and
//! directory lookups.

mod cache;
mod names;
mod operator;
mod queries;
mod record;
mod repository;

pub use cache::LogCache;
pub use names::NameResolver;
pub use operator::OperatorContext;
pub use queries::{LogFilter, LogPageQuery, PagedResult};
pub use record::ChangeRecord;
pub use repository::ChangeLogRepository;
