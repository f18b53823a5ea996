use std::collections::HashMap;

use async_trait::async_trait;
use flowtrail_core::{AppResult, TenantId};

/// Directory lookup port for turning team and user ids into display names.
///
/// Resolution is best-effort: callers fall back to the raw id for anything
/// missing from the returned map.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Resolves team ids to display names.
    async fn resolve_team_names(
        &self,
        ids: &[String],
        tenant_id: &TenantId,
    ) -> AppResult<HashMap<String, String>>;

    /// Resolves user ids to display names.
    async fn resolve_user_names(
        &self,
        ids: &[String],
        tenant_id: &TenantId,
    ) -> AppResult<HashMap<String, String>>;
}
