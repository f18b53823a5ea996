//! Deterministic cache key construction.
//!
//! The backing cache cannot delete by pattern, so invalidation deletes a
//! finite enumerated key set instead. Keys are built from ordered
//! colon-joined tokens with optional dimensions contributing a token only
//! when present; the same query always yields the same key.

use crate::log_ports::LogFilter;

/// TTL for cached log pages.
pub const LOG_PAGE_TTL_SECONDS: u32 = 15 * 60;

/// TTL for cached statistics maps.
pub const STATS_TTL_SECONDS: u32 = 30 * 60;

/// Page indexes covered by enumerated invalidation.
pub const KNOWN_PAGE_INDEXES: [u32; 3] = [1, 2, 3];

/// Page sizes covered by enumerated invalidation.
///
/// Pages cached under any other size are left to expire through their TTL.
pub const KNOWN_PAGE_SIZES: [u32; 3] = [10, 20, 50];

/// Builds the cache key for one log page.
#[must_use]
pub fn logs_key(filter: &LogFilter, page_index: u32, page_size: u32) -> String {
    let mut key = String::from("logs");
    push_dimension_tokens(&mut key, filter);
    if let Some(operation) = filter.operation_type {
        key.push_str(":type_");
        key.push_str(operation.as_str());
    }
    key.push_str(&format!(":page_{page_index}_{page_size}"));
    key
}

/// Builds the cache key for one statistics map.
///
/// Same scheme as log pages without the operation-type and page tokens.
#[must_use]
pub fn stats_key(filter: &LogFilter) -> String {
    let mut key = String::from("stats");
    push_dimension_tokens(&mut key, filter);
    key
}

fn push_dimension_tokens(key: &mut String, filter: &LogFilter) {
    key.push(':');
    key.push_str(
        filter
            .business_module
            .map(|module| module.as_str())
            .unwrap_or("all"),
    );
    if let Some(business_id) = filter.business_id.as_deref() {
        key.push_str(":business_");
        key.push_str(business_id);
    }
    if let Some(onboarding_id) = filter.onboarding_id.as_deref() {
        key.push_str(":onboarding_");
        key.push_str(onboarding_id);
    }
    if let Some(stage_id) = filter.stage_id.as_deref() {
        key.push_str(":stage_");
        key.push_str(stage_id);
    }
}

#[cfg(test)]
mod tests {
    use flowtrail_domain::{BusinessModule, OperationType};

    use super::{logs_key, stats_key};
    use crate::log_ports::LogFilter;

    #[test]
    fn all_dimensions_present_in_fixed_order() {
        let filter = LogFilter {
            business_module: Some(BusinessModule::Stage),
            business_id: Some("42".to_owned()),
            onboarding_id: Some("7".to_owned()),
            stage_id: Some("3".to_owned()),
            operation_type: Some(OperationType::Update),
        };

        assert_eq!(
            logs_key(&filter, 2, 50),
            "logs:stage:business_42:onboarding_7:stage_3:type_update:page_2_50"
        );
        assert_eq!(stats_key(&filter), "stats:stage:business_42:onboarding_7:stage_3");
    }

    #[test]
    fn absent_dimensions_contribute_no_token() {
        let filter = LogFilter {
            business_module: Some(BusinessModule::Workflow),
            business_id: Some("9".to_owned()),
            ..LogFilter::default()
        };

        assert_eq!(logs_key(&filter, 1, 20), "logs:workflow:business_9:page_1_20");
    }

    #[test]
    fn missing_module_uses_the_all_partition() {
        let filter = LogFilter {
            onboarding_id: Some("55".to_owned()),
            ..LogFilter::default()
        };

        assert_eq!(logs_key(&filter, 1, 10), "logs:all:onboarding_55:page_1_10");
        assert_eq!(stats_key(&filter), "stats:all:onboarding_55");
    }

    #[test]
    fn identical_queries_yield_identical_keys() {
        let filter = LogFilter {
            business_module: Some(BusinessModule::Checklist),
            business_id: Some("x".to_owned()),
            ..LogFilter::default()
        };

        assert_eq!(logs_key(&filter, 3, 10), logs_key(&filter.clone(), 3, 10));
    }
}
