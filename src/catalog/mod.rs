//! Concept catalog - read-only lesson metadata
//!
//! Each concept carries the text and code sample shown to the learner plus
//! advisory roster bounds. The simulation only needs `get` and `list`; the
//! in-memory implementation also supports inserting concepts at startup.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::ConceptId;

/// Title of the concept whose threads lock up past the halfway mark
pub const DEADLOCK_TITLE: &str = "Deadlock";

/// Title of the concept that splits the roster into producers and consumers
pub const PRODUCER_CONSUMER_TITLE: &str = "Producer-Consumer";

const BUILTIN_CONCEPTS: &str = include_str!("../../data/concepts.toml");

/// Advisory roster bounds for a concept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadConfig {
    pub min_threads: u32,
    pub max_threads: u32,
    pub default_threads: u32,
}

impl ThreadConfig {
    /// Whether `n` falls inside `[min_threads, max_threads]`
    pub fn contains(&self, n: u32) -> bool {
        (self.min_threads..=self.max_threads).contains(&n)
    }
}

/// A threading concept as stored in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    pub id: ConceptId,
    pub title: String,
    pub description: String,
    pub code: String,
    pub thread_config: ThreadConfig,
}

/// A concept before the catalog assigns its id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConcept {
    pub title: String,
    pub description: String,
    pub code: String,
    pub thread_config: ThreadConfig,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    concept: Vec<NewConcept>,
}

/// Read access to concepts, shared by the REST handlers and every connection
pub trait ConceptCatalog: Send + Sync {
    fn get(&self, id: ConceptId) -> Option<Concept>;

    /// All concepts ordered by id
    fn list(&self) -> Vec<Concept>;
}

/// Catalog held in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<CatalogState>,
}

#[derive(Debug)]
struct CatalogState {
    concepts: BTreeMap<ConceptId, Concept>,
    next_id: i64,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            concepts: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl InMemoryCatalog {
    /// Empty catalog; ids start at 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog seeded with the four builtin concepts
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CONCEPTS)
    }

    /// Build a catalog from a `[[concept]]` TOML document, assigning ids in order
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        let catalog = Self::new();
        for concept in file.concept {
            catalog.insert(concept);
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Store a concept under the next sequential id
    pub fn insert(&self, concept: NewConcept) -> Concept {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let id = ConceptId(state.next_id);
        state.next_id += 1;

        let stored = Concept {
            id,
            title: concept.title,
            description: concept.description,
            code: concept.code,
            thread_config: concept.thread_config,
        };
        state.concepts.insert(id, stored.clone());
        stored
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .concepts
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConceptCatalog for InMemoryCatalog {
    fn get(&self, id: ConceptId) -> Option<Concept> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .concepts
            .get(&id)
            .cloned()
    }

    fn list(&self) -> Vec<Concept> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .concepts
            .values()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(title: &str) -> NewConcept {
        NewConcept {
            title: title.into(),
            description: "desc".into(),
            code: "code".into(),
            thread_config: ThreadConfig {
                min_threads: 1,
                max_threads: 3,
                default_threads: 2,
            },
        }
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = InMemoryCatalog::builtin().unwrap();
        let titles: Vec<String> = catalog.list().into_iter().map(|c| c.title).collect();
        assert_eq!(
            titles,
            vec!["Synchronization", "Deadlock", "Producer-Consumer", "Semaphore"]
        );

        let deadlock = catalog.get(ConceptId(2)).unwrap();
        assert_eq!(deadlock.title, DEADLOCK_TITLE);
        assert_eq!(deadlock.thread_config.min_threads, 2);
        assert_eq!(deadlock.thread_config.max_threads, 2);
        assert!(deadlock.code.starts_with("public class DeadlockExample"));

        let pc = catalog.get(ConceptId(3)).unwrap();
        assert_eq!(pc.title, PRODUCER_CONSUMER_TITLE);
    }

    #[test]
    fn test_missing_concept() {
        let catalog = InMemoryCatalog::builtin().unwrap();
        assert!(catalog.get(ConceptId(99)).is_none());
        assert!(catalog.get(ConceptId(0)).is_none());
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let catalog = InMemoryCatalog::new();
        assert!(catalog.is_empty());
        let a = catalog.insert(sample("A"));
        let b = catalog.insert(sample("B"));
        assert_eq!(a.id, ConceptId(1));
        assert_eq!(b.id, ConceptId(2));
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(ConceptId(2)).unwrap().title, "B");
    }

    #[test]
    fn test_camel_case_json() {
        let catalog = InMemoryCatalog::builtin().unwrap();
        let json = serde_json::to_value(catalog.get(ConceptId(1)).unwrap()).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["threadConfig"]["minThreads"], 2);
        assert_eq!(json["threadConfig"]["maxThreads"], 5);
        assert_eq!(json["threadConfig"]["defaultThreads"], 3);
    }

    #[test]
    fn test_thread_config_contains() {
        let config = ThreadConfig {
            min_threads: 2,
            max_threads: 4,
            default_threads: 3,
        };
        assert!(!config.contains(1));
        assert!(config.contains(2));
        assert!(config.contains(4));
        assert!(!config.contains(5));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(InMemoryCatalog::from_toml_str("[[concept]]\ntitle = 3").is_err());
    }
}
