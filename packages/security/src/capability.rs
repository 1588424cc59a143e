// ABOUTME: Principals and the capabilities they carry
// ABOUTME: The settings endpoint only honors principals holding ManageOptions

use serde::{Deserialize, Serialize};

pub const ANONYMOUS_ID: &str = "anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Read, save and reset the settings document
    ManageOptions,
}

/// Caller identity resolved from request credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: String,
    capabilities: Vec<Capability>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self {
            id: ANONYMOUS_ID.to_string(),
            capabilities: Vec::new(),
        }
    }

    pub fn administrator(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            capabilities: vec![Capability::ManageOptions],
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.capabilities.is_empty() && self.id == ANONYMOUS_ID
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_has_no_capabilities() {
        let principal = Principal::anonymous();
        assert!(principal.is_anonymous());
        assert!(!principal.has_capability(Capability::ManageOptions));
    }

    #[test]
    fn test_administrator_can_manage_options() {
        let principal = Principal::administrator("admin");
        assert_eq!(principal.id, "admin");
        assert!(!principal.is_anonymous());
        assert!(principal.has_capability(Capability::ManageOptions));
    }

    #[test]
    fn test_principal_serialization() {
        let json = serde_json::to_value(Principal::administrator("admin")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "admin", "capabilities": ["manage_options"]})
        );
    }
}
