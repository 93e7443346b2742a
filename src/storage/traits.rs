use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Question, Theme};
use crate::error::Result;

/// Store client for the two quiz collections. The store enforces no
/// referential integrity of its own; the catalog manager validates before
/// calling any mutating method here.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // Theme operations
    async fn insert_theme(&self, theme: &Theme) -> Result<()>;
    async fn get_theme(&self, name: &str) -> Result<Option<Theme>>;
    async fn list_theme_names(&self) -> Result<Vec<String>>;

    // Question operations
    async fn insert_question(&self, question: &mut Question) -> Result<()>;
    async fn get_question(&self, id: Uuid) -> Result<Option<Question>>;
    async fn list_questions(&self, theme: Option<&str>) -> Result<Vec<Question>>;
    /// Replace a stored question wholesale. Returns false if the id no
    /// longer exists.
    async fn replace_question(&self, question: &Question) -> Result<bool>;
    /// Returns false if the id did not exist (already deleted).
    async fn delete_question(&self, id: Uuid) -> Result<bool>;

    /// Open a transaction spanning both collections. Only the two cascading
    /// theme operations need this; everything else is a single store call.
    async fn begin<'a>(&'a self) -> Result<Box<dyn CatalogTransaction + 'a>>;

    /// Wipe both collections. Maintenance use only.
    async fn clear_all(&self) -> Result<()>;
}

/// A two-collection write scope. Nothing is visible to other callers until
/// `commit`; dropping without commit discards the writes.
#[async_trait]
pub trait CatalogTransaction: Send {
    /// Replace the theme record stored under `old_name` with `theme`.
    async fn rename_theme(&mut self, old_name: &str, theme: &Theme) -> Result<()>;

    /// Rewrite the `theme` field of every question under `old_name`.
    /// Returns the number of questions rewritten.
    async fn retheme_questions(&mut self, old_name: &str, new_name: &str) -> Result<u64>;

    async fn delete_theme(&mut self, name: &str) -> Result<()>;

    /// Delete every question under `theme`. Returns the number deleted.
    async fn delete_questions_by_theme(&mut self, theme: &str) -> Result<u64>;

    async fn commit(self: Box<Self>) -> Result<()>;
    async fn abort(self: Box<Self>) -> Result<()>;
}
