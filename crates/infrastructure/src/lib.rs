//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod fixed_operator_context;
mod http_name_resolver;
mod in_memory_change_log_repository;
mod in_memory_log_cache;
mod postgres_change_log_repository;
mod redis_log_cache;
mod runtime_config;

pub use fixed_operator_context::FixedOperatorContext;
pub use http_name_resolver::HttpNameResolver;
pub use in_memory_change_log_repository::InMemoryChangeLogRepository;
pub use in_memory_log_cache::InMemoryLogCache;
pub use postgres_change_log_repository::PostgresChangeLogRepository;
pub use redis_log_cache::RedisLogCache;
pub use runtime_config::RuntimeConfig;
