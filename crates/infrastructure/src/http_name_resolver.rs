use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use flowtrail_application::log_ports::NameResolver;
use flowtrail_core::{AppError, AppResult, TenantId};

/// HTTP-based directory lookups against the identity service.
pub struct HttpNameResolver {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct BatchLookupRequest<'a> {
    ids: &'a [String],
    tenant_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchLookupResponse {
    names: HashMap<String, String>,
}

impl HttpNameResolver {
    /// Creates a resolver against the given identity service base URL.
    #[must_use]
    pub fn new(http_client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    async fn lookup(
        &self,
        path: &str,
        ids: &[String],
        tenant_id: &TenantId,
    ) -> AppResult<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!("{}/{path}", self.base_url.trim_end_matches('/'));
        let response = self
            .http_client
            .post(&url)
            .json(&BatchLookupRequest {
                ids,
                tenant_id: tenant_id.as_str(),
            })
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("directory lookup transport error: {error}"))
            })?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "directory lookup failed with status {}",
                response.status()
            )));
        }

        let payload: BatchLookupResponse = response.json().await.map_err(|error| {
            AppError::Internal(format!("directory lookup returned invalid JSON: {error}"))
        })?;

        Ok(payload.names)
    }
}

#[async_trait]
impl NameResolver for HttpNameResolver {
    async fn resolve_team_names(
        &self,
        ids: &[String],
        tenant_id: &TenantId,
    ) -> AppResult<HashMap<String, String>> {
        self.lookup("teams/names", ids, tenant_id).await
    }

    async fn resolve_user_names(
        &self,
        ids: &[String],
        tenant_id: &TenantId,
    ) -> AppResult<HashMap<String, String>> {
        self.lookup("users/names", ids, tenant_id).await
    }
}
