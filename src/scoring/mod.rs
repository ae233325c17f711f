//! Content Scoring Port
//!
//! The batch processor treats scoring as an opaque, possibly slow,
//! possibly failing capability behind [`ContentScorer`]. The
//! [`FrameworkRegistry`] adapter dispatches to named [`Framework`]
//! implementations on the blocking thread pool.
//!
//! ```text
//! BatchProcessor ──▶ ContentScorer::score(content, frameworks)
//!                          │
//!                  FrameworkRegistry
//!                 ┌────────┼────────┐
//!                 ▼        ▼        ▼
//!              IDEAL    STEPPS   text-stats ...
//! ```

mod text_stats;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::Error;

pub use text_stats::TextStatistics;

/// Scores one piece of content against a set of frameworks
#[async_trait]
pub trait ContentScorer: Send + Sync {
    /// Analyze `content` with every framework in `frameworks`
    async fn score(&self, content: &str, frameworks: &[String]) -> anyhow::Result<Value>;
}

/// A single pluggable analysis framework
pub trait Framework: Send + Sync {
    /// Identifier callers use to request this framework
    fn name(&self) -> &str;

    /// Produce a structured analysis of `content`
    fn analyze(&self, content: &str) -> anyhow::Result<Value>;
}

/// Scorer backed by a set of named frameworks
#[derive(Clone, Default)]
pub struct FrameworkRegistry {
    frameworks: BTreeMap<String, Arc<dyn Framework>>,
}

impl FrameworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a framework, replacing any previous one with the same name
    pub fn register(&mut self, framework: impl Framework + 'static) -> &mut Self {
        self.frameworks
            .insert(framework.name().to_string(), Arc::new(framework));
        self
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, framework: impl Framework + 'static) -> Self {
        self.register(framework);
        self
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.frameworks.keys().cloned().collect()
    }

    /// Resolve every requested name or fail on the first unknown one
    fn resolve(&self, requested: &[String]) -> Result<Vec<Arc<dyn Framework>>, Error> {
        requested
            .iter()
            .map(|name| {
                self.frameworks
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Error::UnknownFramework {
                        name: name.clone(),
                        valid: self.names().join(", "),
                    })
            })
            .collect()
    }
}

impl std::fmt::Debug for FrameworkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameworkRegistry")
            .field("frameworks", &self.names())
            .finish()
    }
}

#[async_trait]
impl ContentScorer for FrameworkRegistry {
    async fn score(&self, content: &str, frameworks: &[String]) -> anyhow::Result<Value> {
        let resolved = self.resolve(frameworks)?;
        let content = content.to_string();

        let results = tokio::task::spawn_blocking(move || -> anyhow::Result<Map<String, Value>> {
            let mut results = Map::new();
            for framework in resolved {
                let analysis = framework.analyze(&content)?;
                results.insert(framework.name().to_string(), analysis);
            }
            Ok(results)
        })
        .await
        .map_err(|e| Error::Scoring(format!("analysis task failed: {}", e)))??;

        Ok(json!({
            "framework_count": results.len(),
            "frameworks": results,
        }))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(&'static str);

    impl Framework for Echo {
        fn name(&self) -> &str {
            self.0
        }

        fn analyze(&self, content: &str) -> anyhow::Result<Value> {
            Ok(json!({ "length": content.len() }))
        }
    }

    struct Broken;

    impl Framework for Broken {
        fn name(&self) -> &str {
            "BROKEN"
        }

        fn analyze(&self, _content: &str) -> anyhow::Result<Value> {
            anyhow::bail!("framework exploded")
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_scores_each_framework() {
        let registry = FrameworkRegistry::new().with(Echo("IDEAL")).with(Echo("STEPPS"));

        let result = registry
            .score("hello", &names(&["IDEAL", "STEPPS"]))
            .await
            .unwrap();

        assert_eq!(result["framework_count"], 2);
        assert_eq!(result["frameworks"]["IDEAL"]["length"], 5);
        assert_eq!(result["frameworks"]["STEPPS"]["length"], 5);
    }

    #[tokio::test]
    async fn test_unknown_framework_lists_valid_names() {
        let registry = FrameworkRegistry::new().with(Echo("IDEAL"));

        let err = registry.score("hello", &names(&["NOPE"])).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("NOPE"));
        assert!(msg.contains("IDEAL"));
    }

    #[tokio::test]
    async fn test_framework_error_propagates() {
        let registry = FrameworkRegistry::new().with(Broken);
        let err = registry.score("x", &names(&["BROKEN"])).await.unwrap_err();
        assert!(err.to_string().contains("framework exploded"));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = FrameworkRegistry::new();
        registry.register(Echo("A")).register(Echo("A")).register(Echo("B"));
        assert_eq!(registry.names(), vec!["A", "B"]);
    }
}
