use crate::store::Medium;
use crate::Result;
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// An in-memory storage medium.
///
/// Clones share the same underlying map, so two `RecordStore`s built from clones of one
/// `MemoryMedium` behave like two browser tabs on the same origin. An optional quota, counted in
/// bytes of keys plus values, makes writes fail the way a full browser store does.
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
    items: Arc<Mutex<BTreeMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(bytes: usize) -> Self {
        Self {
            items: Arc::default(),
            quota: Some(bytes),
        }
    }

    /// A copy of everything currently stored.
    pub fn items(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| anyhow!("The in-memory storage lock is poisoned"))
    }
}

#[async_trait]
impl Medium for MemoryMedium {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.lock()?;
        if let Some(quota) = self.quota {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = used + key.len() + value.len();
            if needed > quota {
                bail!("Storage quota of {quota} bytes exceeded: writing '{key}' needs {needed}");
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_items() {
        let a = MemoryMedium::new();
        let b = a.clone();
        a.set_item("theme", "forest").await.unwrap();
        assert_eq!(b.get_item("theme").await.unwrap().as_deref(), Some("forest"));
        assert_eq!(b.items().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_quota_counts_replacement_not_addition() {
        let m = MemoryMedium::with_quota(12);
        m.set_item("theme", "forest").await.unwrap();
        // Replacing the same key only counts the new value.
        m.set_item("theme", "sunset!").await.unwrap();
        assert!(m.set_item("theme", "midnight").await.is_err());
        assert_eq!(m.get_item("theme").await.unwrap().as_deref(), Some("sunset!"));
    }
}
