use serde::{Deserialize, Serialize};

use crate::TenantId;

/// Identity of the operator a change record is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorIdentity {
    operator_id: String,
    display_name: String,
    tenant_id: TenantId,
    app_code: Option<String>,
}

impl OperatorIdentity {
    /// Creates an operator identity from authentication and tenancy data.
    #[must_use]
    pub fn new(
        operator_id: impl Into<String>,
        display_name: impl Into<String>,
        tenant_id: TenantId,
        app_code: Option<String>,
    ) -> Self {
        Self {
            operator_id: operator_id.into(),
            display_name: display_name.into(),
            tenant_id,
            app_code,
        }
    }

    /// Returns the identity used for background work with no ambient
    /// operator context.
    #[must_use]
    pub fn system() -> Self {
        Self::new("0", "System", TenantId::fallback(), None)
    }

    /// Returns the stable operator identifier.
    #[must_use]
    pub fn operator_id(&self) -> &str {
        self.operator_id.as_str()
    }

    /// Returns the display name recorded in change descriptions.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the tenant the operator is acting in.
    #[must_use]
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// Returns the application code the operator came in through, if any.
    #[must_use]
    pub fn app_code(&self) -> Option<&str> {
        self.app_code.as_deref()
    }
}
