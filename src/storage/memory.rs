use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Question, Theme};
use crate::error::Result;
use crate::storage::{CatalogStore, CatalogTransaction};

#[derive(Default, Clone)]
struct MemInner {
    themes: HashMap<String, Theme>,
    questions: HashMap<Uuid, Question>,
}

/// In-memory store implementation for development/testing.
pub struct InMemoryStore {
    inner: Arc<Mutex<MemInner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemInner::default())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_theme(&self, theme: &Theme) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.themes.insert(theme.name.clone(), theme.clone());

        debug!("Created theme: {}", theme.name);
        Ok(())
    }

    async fn get_theme(&self, name: &str) -> Result<Option<Theme>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.themes.get(name).cloned())
    }

    async fn list_theme_names(&self) -> Result<Vec<String>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.themes.keys().cloned().collect())
    }

    async fn insert_question(&self, question: &mut Question) -> Result<()> {
        let id = Uuid::new_v4();
        question.id = Some(id);

        let mut inner = self.inner.lock().unwrap();
        inner.questions.insert(id, question.clone());

        debug!("Created question {} under theme {}", id, question.theme);
        Ok(())
    }

    async fn get_question(&self, id: Uuid) -> Result<Option<Question>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.questions.get(&id).cloned())
    }

    async fn list_questions(&self, theme: Option<&str>) -> Result<Vec<Question>> {
        let inner = self.inner.lock().unwrap();
        let questions = inner
            .questions
            .values()
            .filter(|q| theme.map_or(true, |t| q.theme == t))
            .cloned()
            .collect();
        Ok(questions)
    }

    async fn replace_question(&self, question: &Question) -> Result<bool> {
        let Some(id) = question.id else {
            return Ok(false);
        };

        let mut inner = self.inner.lock().unwrap();
        if !inner.questions.contains_key(&id) {
            return Ok(false);
        }
        inner.questions.insert(id, question.clone());

        debug!("Updated question {}", id);
        Ok(true)
    }

    async fn delete_question(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let removed = inner.questions.remove(&id).is_some();
        if removed {
            debug!("Deleted question {}", id);
        }
        Ok(removed)
    }

    async fn begin<'a>(&'a self) -> Result<Box<dyn CatalogTransaction + 'a>> {
        let snapshot = self.inner.lock().unwrap().clone();
        Ok(Box::new(MemTransaction {
            store: self.inner.as_ref(),
            staged: snapshot,
        }))
    }

    async fn clear_all(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.themes.clear();
        inner.questions.clear();

        debug!("Cleared all themes and questions");
        Ok(())
    }
}

/// Transaction over the in-memory store: writes go to a staged snapshot and
/// commit swaps the snapshot in under one lock. Writers that raced between
/// begin and commit lose, which is acceptable for a dev/test store.
struct MemTransaction<'a> {
    store: &'a Mutex<MemInner>,
    staged: MemInner,
}

#[async_trait]
impl<'a> CatalogTransaction for MemTransaction<'a> {
    async fn rename_theme(&mut self, old_name: &str, theme: &Theme) -> Result<()> {
        self.staged.themes.remove(old_name);
        self.staged.themes.insert(theme.name.clone(), theme.clone());
        Ok(())
    }

    async fn retheme_questions(&mut self, old_name: &str, new_name: &str) -> Result<u64> {
        let mut rewritten = 0;
        for question in self.staged.questions.values_mut() {
            if question.theme == old_name {
                question.theme = new_name.to_string();
                rewritten += 1;
            }
        }
        Ok(rewritten)
    }

    async fn delete_theme(&mut self, name: &str) -> Result<()> {
        self.staged.themes.remove(name);
        Ok(())
    }

    async fn delete_questions_by_theme(&mut self, theme: &str) -> Result<u64> {
        let before = self.staged.questions.len();
        self.staged.questions.retain(|_, q| q.theme != theme);
        Ok((before - self.staged.questions.len()) as u64)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut inner = self.store.lock().unwrap();
        *inner = self.staged;
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
