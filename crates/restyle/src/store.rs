//! Component persistence.

use std::hash::Hasher;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rapidhash::fast::RapidHasher;

use crate::{Error, Result};

/// A stored component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Opaque identifier
    pub id: String,
    pub name: Option<String>,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Key/value persistence for components. Last write wins.
pub trait ComponentStore: Send + Sync {
    fn create(&self, code: &str, name: Option<&str>) -> Result<Component>;

    fn get(&self, id: &str) -> Result<Component>;

    /// Replace the code, and the name if one is given.
    fn update(&self, id: &str, code: &str, name: Option<&str>) -> Result<Component>;

    /// All components, most recently created first.
    fn list(&self) -> Vec<Component>;
}

/// In-process [`ComponentStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    components: DashMap<String, Component>,
    counter: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, now: DateTime<Utc>) -> String {
        let mut hasher = RapidHasher::default();
        hasher.write_u64(self.counter.fetch_add(1, Ordering::Relaxed));
        hasher.write_i64(now.timestamp_nanos_opt().unwrap_or_default());
        format!("{:016x}", hasher.finish())
    }
}

impl ComponentStore for MemoryStore {
    fn create(&self, code: &str, name: Option<&str>) -> Result<Component> {
        if code.trim().is_empty() {
            return Err(Error::EmptyCode);
        }
        let now = Utc::now();
        let component = Component {
            id: self.next_id(now),
            name: name.map(str::to_string),
            code: code.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.components
            .insert(component.id.clone(), component.clone());
        tracing::debug!(id = %component.id, "component created");
        Ok(component)
    }

    fn get(&self, id: &str) -> Result<Component> {
        self.components
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::ComponentNotFound(id.to_string()))
    }

    fn update(&self, id: &str, code: &str, name: Option<&str>) -> Result<Component> {
        if code.trim().is_empty() {
            return Err(Error::EmptyCode);
        }
        let mut entry = self
            .components
            .get_mut(id)
            .ok_or_else(|| Error::ComponentNotFound(id.to_string()))?;
        let component = entry.value_mut();
        component.code = code.to_string();
        if let Some(name) = name {
            component.name = Some(name.to_string());
        }
        component.updated_at = Utc::now();
        Ok(component.clone())
    }

    fn list(&self) -> Vec<Component> {
        let mut components: Vec<Component> = self
            .components
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        components.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get() {
        let store = MemoryStore::new();
        let created = store.create("function App() {}", Some("App")).unwrap();
        assert_eq!(created.id.len(), 16);
        assert_eq!(store.get(&created.id).unwrap(), created);
    }

    #[test]
    fn test_ids_are_unique() {
        let store = MemoryStore::new();
        let a = store.create("a", None).unwrap();
        let b = store.create("a", None).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn test_update() {
        let store = MemoryStore::new();
        let created = store.create("v1", Some("Card")).unwrap();
        let updated = store.update(&created.id, "v2", None).unwrap();
        assert_eq!(updated.code, "v2");
        assert_eq!(updated.name.as_deref(), Some("Card"));
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(store.get(&created.id).unwrap().code, "v2");
    }

    #[test]
    fn test_errors() {
        let store = MemoryStore::new();
        assert!(matches!(store.create("  ", None), Err(Error::EmptyCode)));
        assert!(matches!(
            store.get("missing"),
            Err(Error::ComponentNotFound(id)) if id == "missing"
        ));
        assert!(matches!(
            store.update("missing", "x", None),
            Err(Error::ComponentNotFound(_))
        ));
    }
}
