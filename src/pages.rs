use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

/// Rendered page fragments keyed by request path. Comment threads are never
/// stored here; they are re-read on every view.
#[derive(Clone, Default)]
pub struct PageCache {
    entries: Arc<RwLock<HashMap<String, Arc<str>>>>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached fragment for `path`, rendering and storing it first
    /// when missing.
    pub async fn get_or_render<F>(&self, path: &str, render: F) -> Arc<str>
    where
        F: FnOnce() -> String,
    {
        if let Some(hit) = self.entries.read().await.get(path) {
            return hit.clone();
        }
        let rendered: Arc<str> = render().into();
        self.entries
            .write()
            .await
            .insert(path.to_string(), rendered.clone());
        rendered
    }

    /// Marks one page stale. Returns whether it was cached.
    pub async fn invalidate(&self, path: &str) -> bool {
        self.entries.write().await.remove(path).is_some()
    }

    /// Marks every page under `prefix` stale. Returns how many were dropped.
    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|path, _| !path.starts_with(prefix));
        before - entries.len()
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.entries.read().await.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn renders_once_until_invalidated() {
        let cache = PageCache::new();
        let renders = AtomicUsize::new(0);
        let render = || {
            renders.fetch_add(1, Ordering::SeqCst);
            "<p>hello</p>".to_string()
        };

        cache.get_or_render("/blog/first", render).await;
        cache.get_or_render("/blog/first", render).await;
        assert_eq!(renders.load(Ordering::SeqCst), 1);

        assert_eq!(cache.invalidate_prefix("/blog/").await, 1);
        cache.get_or_render("/blog/first", render).await;
        assert_eq!(renders.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidation_only_touches_the_prefix() {
        let cache = PageCache::new();
        cache.get_or_render("/blog/a", || "a".to_string()).await;
        cache.get_or_render("/blog/b", || "b".to_string()).await;
        cache.get_or_render("/work/c", || "c".to_string()).await;

        assert_eq!(cache.invalidate_prefix("/blog/").await, 2);
        assert!(!cache.contains("/blog/a").await);
        assert!(cache.contains("/work/c").await);
    }

    #[tokio::test]
    async fn single_page_invalidation() {
        let cache = PageCache::new();
        cache.get_or_render("/blog/a", || "a".to_string()).await;
        cache.get_or_render("/blog/b", || "b".to_string()).await;

        assert!(cache.invalidate("/blog/a").await);
        assert!(!cache.invalidate("/blog/a").await);
        assert!(cache.contains("/blog/b").await);
    }
}
