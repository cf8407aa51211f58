use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::bag::Language;
use crate::shared::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub word: String,
    pub definition: Option<String>,
}

/// Word lookup collaborator. Implementations may block on I/O.
#[async_trait]
pub trait Dictionary: Send + Sync {
    async fn lookup(&self, word: &str, language: Language)
        -> Result<Option<DictionaryEntry>, AppError>;

    async fn exists(&self, word: &str, language: Language) -> Result<bool, AppError> {
        Ok(self.lookup(word, language).await?.is_some())
    }
}

/// Dictionary held in memory, keyed by upper-cased word
#[derive(Default)]
pub struct InMemoryDictionary {
    entries: RwLock<HashMap<Language, HashMap<String, DictionaryEntry>>>,
}

impl InMemoryDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_words<I, S>(language: Language, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = words
            .into_iter()
            .map(|word| {
                let word = normalize(word.as_ref());
                (
                    word.clone(),
                    DictionaryEntry {
                        word,
                        definition: None,
                    },
                )
            })
            .collect();

        Self {
            entries: RwLock::new(HashMap::from([(language, entries)])),
        }
    }

    pub async fn insert(&self, language: Language, word: &str, definition: Option<String>) {
        let word = normalize(word);
        let mut entries = self.entries.write().await;
        entries
            .entry(language)
            .or_default()
            .insert(word.clone(), DictionaryEntry { word, definition });
    }
}

fn normalize(word: &str) -> String {
    word.trim().to_uppercase()
}

#[async_trait]
impl Dictionary for InMemoryDictionary {
    async fn lookup(
        &self,
        word: &str,
        language: Language,
    ) -> Result<Option<DictionaryEntry>, AppError> {
        let entries = self.entries.read().await;
        let entry = entries
            .get(&language)
            .and_then(|words| words.get(&normalize(word)))
            .cloned();

        debug!(word = %word, language = %language, found = entry.is_some(), "Dictionary lookup");
        Ok(entry)
    }
}
