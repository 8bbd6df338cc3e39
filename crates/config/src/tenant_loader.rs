//! Tenant loading: a `DocumentStore` backed by one JSON file per tenant on
//! disk.
//!
//! This stands in for whatever production document store sits behind the
//! real deployment (§6 treats `DocumentStore` as an external interface);
//! grounded on the teacher's `config` crate pattern of building a typed
//! struct from a layered `config::Config`, but reading straight `Tenant`
//! JSON since tenant records are full data objects rather than merged
//! layers of defaults.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use recept_core::{CoreError, DocumentStore, QuickAnswer, Scenario, Tenant, TriageCard};

use crate::ConfigError;

/// Reads `<dir>/<tenant_id>.json` on every lookup (no internal caching —
/// a `CacheLayer` sits above this in the routing pipeline, §4.9).
pub struct FileDocumentStore {
    dir: PathBuf,
    /// In-process spend ledger override, so `increment_spend` has
    /// somewhere durable-enough to write without re-reading the whole
    /// tenant file on every Tier-3 call.
    spend_overrides: Arc<RwLock<std::collections::HashMap<String, f64>>>,
}

impl FileDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            spend_overrides: Arc::new(RwLock::new(std::collections::HashMap::new())),
        }
    }

    fn load_tenant_file(&self, tenant_id: &str) -> Result<Option<Tenant>, ConfigError> {
        let path = self.dir.join(format!("{tenant_id}.json"));
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {e}", path.display())))?;
        let mut tenant: Tenant =
            serde_json::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        if let Some(spend) = self.spend_overrides.read().get(tenant_id) {
            tenant.current_llm_spend = *spend;
        }
        Ok(Some(tenant))
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn find_tenant(&self, tenant_id: &str) -> Result<Option<Tenant>, CoreError> {
        self.load_tenant_file(tenant_id)
            .map_err(|e| CoreError::Internal(e.to_string()))
    }

    async fn find_scenarios_for_tenant(&self, tenant_id: &str) -> Result<Vec<Scenario>, CoreError> {
        Ok(self
            .load_tenant_file(tenant_id)
            .map_err(|e| CoreError::Internal(e.to_string()))?
            .map(|t| t.scenarios)
            .unwrap_or_default())
    }

    async fn find_triage_cards(&self, tenant_id: &str) -> Result<Vec<TriageCard>, CoreError> {
        Ok(self
            .load_tenant_file(tenant_id)
            .map_err(|e| CoreError::Internal(e.to_string()))?
            .map(|t| t.triage_cards)
            .unwrap_or_default())
    }

    async fn find_quick_answers(&self, tenant_id: &str) -> Result<Vec<QuickAnswer>, CoreError> {
        Ok(self
            .load_tenant_file(tenant_id)
            .map_err(|e| CoreError::Internal(e.to_string()))?
            .map(|t| t.quick_answers)
            .unwrap_or_default())
    }

    async fn increment_spend(&self, tenant_id: &str, amount: f64) -> Result<(), CoreError> {
        let mut overrides = self.spend_overrides.write();
        let current = match overrides.get(tenant_id) {
            Some(v) => *v,
            None => self
                .load_tenant_file(tenant_id)
                .map_err(|e| CoreError::Internal(e.to_string()))?
                .map(|t| t.current_llm_spend)
                .unwrap_or(0.0),
        };
        overrides.insert(tenant_id.to_string(), current + amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_tenant_file_is_none() {
        let store = FileDocumentStore::new(std::env::temp_dir().join("recept-nonexistent-dir-xyz"));
        let result = store.find_tenant("no-such-tenant").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn reads_tenant_from_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("acme.json"),
            r#"{"tenantId": "acme", "monthlyLlmBudget": 25.0, "currentLlmSpend": 1.0}"#,
        )
        .unwrap();
        let store = FileDocumentStore::new(dir.path());
        let tenant = store.find_tenant("acme").await.unwrap().unwrap();
        assert_eq!(tenant.monthly_llm_budget, 25.0);
    }

    #[tokio::test]
    async fn increment_spend_accumulates_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("acme.json"),
            r#"{"tenantId": "acme", "monthlyLlmBudget": 25.0, "currentLlmSpend": 1.0}"#,
        )
        .unwrap();
        let store = FileDocumentStore::new(dir.path());
        store.increment_spend("acme", 0.5).await.unwrap();
        store.increment_spend("acme", 0.25).await.unwrap();
        let tenant = store.find_tenant("acme").await.unwrap().unwrap();
        assert_eq!(tenant.current_llm_spend, 1.75);
    }
}
