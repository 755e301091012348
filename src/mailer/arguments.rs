//! Registry of globally available template arguments.

use std::sync::Arc;

use dashmap::DashMap;

use crate::template::Arguments;

/// Computes one argument value from the caller's arguments.
pub type ArgumentProvider = Arc<dyn Fn(&Arguments) -> String + Send + Sync>;

/// Named producers whose values are offered to every template.
///
/// A provider only fills a key the caller did not supply. Every provider
/// sees the caller's mapping as it was before any provider ran, so the
/// result does not depend on registration order.
#[derive(Default)]
pub struct ArgumentProviders {
    providers: DashMap<String, ArgumentProvider>,
}

impl ArgumentProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under `key`, replacing any earlier one.
    pub fn register<F>(&self, key: impl Into<String>, provider: F)
    where
        F: Fn(&Arguments) -> String + Send + Sync + 'static,
    {
        let key = key.into();
        if self.providers.insert(key.clone(), Arc::new(provider)).is_some() {
            tracing::debug!(key = %key, "Replaced global argument provider");
        }
    }

    pub fn unregister(&self, key: &str) -> bool {
        self.providers.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.providers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Return `arguments` with every missing provider key filled in.
    pub fn merge(&self, arguments: &Arguments) -> Arguments {
        // Clone the handles out so no map shard stays locked while providers run
        let pending: Vec<(String, ArgumentProvider)> = self
            .providers
            .iter()
            .filter(|entry| !arguments.contains_key(entry.key()))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut merged = arguments.clone();
        for (key, provider) in pending {
            let value = provider(arguments);
            merged.insert(key, value);
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> Arguments {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_fills_missing_keys() {
        let providers = ArgumentProviders::new();
        providers.register("site", |_| "Example".to_string());

        let merged = providers.merge(&args(&[("code", "42")]));
        assert_eq!(merged.get("site").map(String::as_str), Some("Example"));
        assert_eq!(merged.get("code").map(String::as_str), Some("42"));
    }

    #[test]
    fn test_caller_value_wins() {
        let providers = ArgumentProviders::new();
        providers.register("site", |_| "Example".to_string());

        let merged = providers.merge(&args(&[("site", "Mine")]));
        assert_eq!(merged.get("site").map(String::as_str), Some("Mine"));
    }

    #[test]
    fn test_providers_see_pre_merge_arguments() {
        let providers = ArgumentProviders::new();
        providers.register("a", |_| "from-a".to_string());
        providers.register("b", |args| {
            args.get("a").cloned().unwrap_or_else(|| "absent".to_string())
        });

        let merged = providers.merge(&Arguments::new());
        assert_eq!(merged.get("a").map(String::as_str), Some("from-a"));
        assert_eq!(merged.get("b").map(String::as_str), Some("absent"));
    }

    #[test]
    fn test_register_replaces_and_unregister() {
        let providers = ArgumentProviders::new();
        providers.register("year", |_| "2023".to_string());
        providers.register("year", |_| "2024".to_string());
        assert_eq!(providers.len(), 1);
        assert_eq!(
            providers.merge(&Arguments::new()).get("year").map(String::as_str),
            Some("2024")
        );

        assert!(providers.unregister("year"));
        assert!(!providers.contains("year"));
        assert!(providers.is_empty());
    }
}
