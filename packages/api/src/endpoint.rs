// ABOUTME: Save and reset protocol for the settings document
// ABOUTME: Authorization, then integrity token, then sanitize and persist, then respond

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use keel_security::{Capability, IntegrityTokens, Principal};
use keel_settings::naming::to_kebab_case;
use keel_settings::{sanitize_document, OptionsStore, StoredOptions};

use crate::error::EndpointError;
use crate::response::SettingsResult;

/// Fresh integrity tokens for the settings form
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityNonces {
    pub save: String,
    pub reset: String,
    pub lifetime_secs: u64,
}

/// Mutating entry point for the settings document.
///
/// Every request runs to completion in order. A caller without
/// `ManageOptions` is turned away before anything else is looked at, and a
/// rejected integrity token ends the request before the store is touched.
pub struct SettingsEndpoint {
    store: OptionsStore,
    tokens: Arc<IntegrityTokens>,
    save_action: String,
    reset_action: String,
}

impl SettingsEndpoint {
    pub fn new(store: OptionsStore, tokens: Arc<IntegrityTokens>) -> Self {
        let slug = to_kebab_case(store.name());
        Self {
            save_action: format!("{}-save", slug),
            reset_action: format!("{}-reset", slug),
            store,
            tokens,
        }
    }

    pub fn store(&self) -> &OptionsStore {
        &self.store
    }

    pub fn save_action(&self) -> &str {
        &self.save_action
    }

    pub fn reset_action(&self) -> &str {
        &self.reset_action
    }

    pub fn authorize(&self, principal: &Principal, action: &str) -> Result<(), EndpointError> {
        if principal.has_capability(Capability::ManageOptions) {
            return Ok(());
        }

        warn!(
            audit = true,
            principal = %principal.id,
            action = %action,
            "Settings request without manage capability"
        );
        Err(EndpointError::Unauthorized)
    }

    fn check_integrity(
        &self,
        principal: &Principal,
        action: &str,
        nonce: &str,
    ) -> Result<(), EndpointError> {
        match self.tokens.verify(nonce, action, &principal.id) {
            Ok(age) => {
                debug!(action = %action, ?age, "Integrity token validated");
                Ok(())
            }
            Err(e) => {
                warn!(
                    audit = true,
                    principal = %principal.id,
                    action = %action,
                    reason = %e,
                    "Integrity token rejected"
                );
                Err(EndpointError::IntegrityTokenInvalid(e))
            }
        }
    }

    /// Sanitize the submitted payload and store it in place of the current document
    pub async fn save(
        &self,
        principal: &Principal,
        payload: &Value,
        nonce: &str,
    ) -> Result<SettingsResult, EndpointError> {
        info!(principal = %principal.id, "Saving settings");

        self.authorize(principal, &self.save_action)?;
        self.check_integrity(principal, &self.save_action, nonce)?;

        if !payload.is_object() {
            return Err(EndpointError::InvalidPayload(
                "settings must be an object".to_string(),
            ));
        }

        let document = sanitize_document(payload);
        self.store.update_options(document, &principal.id).await?;

        Ok(SettingsResult::success("Settings saved"))
    }

    /// Store the defaults document in place of the current one
    pub async fn reset(
        &self,
        principal: &Principal,
        nonce: &str,
    ) -> Result<SettingsResult, EndpointError> {
        info!(principal = %principal.id, "Resetting settings");

        self.authorize(principal, &self.reset_action)?;
        self.check_integrity(principal, &self.reset_action, nonce)?;

        self.store.reset(&principal.id).await?;

        Ok(SettingsResult::success("Settings reset to defaults"))
    }

    pub async fn options(&self, principal: &Principal) -> Result<StoredOptions, EndpointError> {
        self.authorize(principal, "read")?;
        Ok(self.store.current().await?)
    }

    pub fn issue_nonces(&self, principal: &Principal) -> Result<IntegrityNonces, EndpointError> {
        self.authorize(principal, "nonces")?;
        Ok(IntegrityNonces {
            save: self.tokens.create(&self.save_action, &principal.id),
            reset: self.tokens.create(&self.reset_action, &principal.id),
            lifetime_secs: self.tokens.lifetime().as_secs(),
        })
    }
}
