use std::sync::Arc;

use async_trait::async_trait;
use libsql::Connection;
use tracing::debug;
use uuid::Uuid;

use crate::db::DatabaseManager;
use crate::domain::{Question, Theme};
use crate::error::{CatalogError, Result};
use crate::storage::{CatalogStore, CatalogTransaction};

/// libsql-backed store. Records are JSON documents; the lookup key (theme
/// name, question id and owning theme) is mirrored into real columns so the
/// cascades can be expressed as two UPDATE/DELETE statements.
pub struct DatabaseStore {
    db: Arc<DatabaseManager>,
}

impl DatabaseStore {
    pub async fn open(db: DatabaseManager) -> Result<Self> {
        db.run_migrations().await?;
        Ok(Self { db: Arc::new(db) })
    }
}

fn theme_to_row(theme: &Theme) -> Result<String> {
    serde_json::to_string(theme).map_err(|e| CatalogError::Storage {
        message: format!("Failed to serialize theme: {e}"),
    })
}

fn row_to_theme(data: &str) -> Result<Theme> {
    serde_json::from_str(data).map_err(|e| CatalogError::Storage {
        message: format!("Failed to deserialize theme: {e}"),
    })
}

fn question_to_row(question: &Question) -> Result<String> {
    serde_json::to_string(question).map_err(|e| CatalogError::Storage {
        message: format!("Failed to serialize question: {e}"),
    })
}

fn row_to_question(id: &str, data: &str) -> Result<Question> {
    let mut question: Question =
        serde_json::from_str(data).map_err(|e| CatalogError::Storage {
            message: format!("Failed to deserialize question: {e}"),
        })?;
    question.id = Some(Uuid::parse_str(id).map_err(|e| CatalogError::Storage {
        message: format!("Invalid question UUID in store: {e}"),
    })?);
    Ok(question)
}

fn store_err(context: &str, e: impl std::fmt::Display) -> CatalogError {
    CatalogError::Storage {
        message: format!("{context}: {e}"),
    }
}

#[async_trait]
impl CatalogStore for DatabaseStore {
    async fn insert_theme(&self, theme: &Theme) -> Result<()> {
        let conn = self.db.get_connection().await?;
        conn.execute(
            "INSERT INTO themes (name, data) VALUES (?1, ?2)",
            libsql::params![theme.name.clone(), theme_to_row(theme)?],
        )
        .await
        .map_err(|e| store_err("Failed to insert theme", e))?;

        debug!("Created theme: {}", theme.name);
        Ok(())
    }

    async fn get_theme(&self, name: &str) -> Result<Option<Theme>> {
        let conn = self.db.get_connection().await?;
        let mut rows = conn
            .query(
                "SELECT data FROM themes WHERE name = ?1",
                libsql::params![name],
            )
            .await
            .map_err(|e| store_err("Failed to query theme", e))?;

        match rows
            .next()
            .await
            .map_err(|e| store_err("Failed to read row", e))?
        {
            Some(row) => {
                let data: String = row.get(0).map_err(|e| store_err("Failed to get data", e))?;
                Ok(Some(row_to_theme(&data)?))
            }
            None => Ok(None),
        }
    }

    async fn list_theme_names(&self) -> Result<Vec<String>> {
        let conn = self.db.get_connection().await?;
        let mut rows = conn
            .query("SELECT name FROM themes", libsql::params![])
            .await
            .map_err(|e| store_err("Failed to query themes", e))?;

        let mut names = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| store_err("Failed to read row", e))?
        {
            names.push(row.get(0).map_err(|e| store_err("Failed to get name", e))?);
        }
        Ok(names)
    }

    async fn insert_question(&self, question: &mut Question) -> Result<()> {
        let id = Uuid::new_v4();
        question.id = Some(id);

        let conn = self.db.get_connection().await?;
        conn.execute(
            "INSERT INTO questions (id, theme, data) VALUES (?1, ?2, ?3)",
            libsql::params![
                id.to_string(),
                question.theme.clone(),
                question_to_row(question)?
            ],
        )
        .await
        .map_err(|e| store_err("Failed to insert question", e))?;

        debug!("Created question {} under theme {}", id, question.theme);
        Ok(())
    }

    async fn get_question(&self, id: Uuid) -> Result<Option<Question>> {
        let conn = self.db.get_connection().await?;
        let mut rows = conn
            .query(
                "SELECT id, data FROM questions WHERE id = ?1",
                libsql::params![id.to_string()],
            )
            .await
            .map_err(|e| store_err("Failed to query question", e))?;

        match rows
            .next()
            .await
            .map_err(|e| store_err("Failed to read row", e))?
        {
            Some(row) => {
                let id: String = row.get(0).map_err(|e| store_err("Failed to get id", e))?;
                let data: String = row.get(1).map_err(|e| store_err("Failed to get data", e))?;
                Ok(Some(row_to_question(&id, &data)?))
            }
            None => Ok(None),
        }
    }

    async fn list_questions(&self, theme: Option<&str>) -> Result<Vec<Question>> {
        let conn = self.db.get_connection().await?;
        let mut rows = match theme {
            Some(theme) => conn
                .query(
                    "SELECT id, data FROM questions WHERE theme = ?1",
                    libsql::params![theme],
                )
                .await
                .map_err(|e| store_err("Failed to query questions", e))?,
            None => conn
                .query("SELECT id, data FROM questions", libsql::params![])
                .await
                .map_err(|e| store_err("Failed to query questions", e))?,
        };

        let mut questions = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| store_err("Failed to read row", e))?
        {
            let id: String = row.get(0).map_err(|e| store_err("Failed to get id", e))?;
            let data: String = row.get(1).map_err(|e| store_err("Failed to get data", e))?;
            questions.push(row_to_question(&id, &data)?);
        }
        Ok(questions)
    }

    async fn replace_question(&self, question: &Question) -> Result<bool> {
        let Some(id) = question.id else {
            return Ok(false);
        };

        let conn = self.db.get_connection().await?;
        let changed = conn
            .execute(
                "UPDATE questions SET theme = ?2, data = ?3, updated_at = datetime('now') \
                 WHERE id = ?1",
                libsql::params![
                    id.to_string(),
                    question.theme.clone(),
                    question_to_row(question)?
                ],
            )
            .await
            .map_err(|e| store_err("Failed to update question", e))?;

        if changed > 0 {
            debug!("Updated question {}", id);
        }
        Ok(changed > 0)
    }

    async fn delete_question(&self, id: Uuid) -> Result<bool> {
        let conn = self.db.get_connection().await?;
        let deleted = conn
            .execute(
                "DELETE FROM questions WHERE id = ?1",
                libsql::params![id.to_string()],
            )
            .await
            .map_err(|e| store_err("Failed to delete question", e))?;

        if deleted > 0 {
            debug!("Deleted question {}", id);
        }
        Ok(deleted > 0)
    }

    async fn begin<'a>(&'a self) -> Result<Box<dyn CatalogTransaction + 'a>> {
        let conn = self.db.get_connection().await?;
        conn.execute("BEGIN IMMEDIATE", libsql::params![])
            .await
            .map_err(|e| store_err("Failed to begin transaction", e))?;
        Ok(Box::new(DbTransaction { conn }))
    }

    async fn clear_all(&self) -> Result<()> {
        let conn = self.db.get_connection().await?;
        conn.execute("DELETE FROM questions", libsql::params![])
            .await
            .map_err(|e| store_err("Failed to clear questions", e))?;
        conn.execute("DELETE FROM themes", libsql::params![])
            .await
            .map_err(|e| store_err("Failed to clear themes", e))?;

        debug!("Cleared all themes and questions");
        Ok(())
    }
}

/// SQL transaction on a dedicated connection.
struct DbTransaction {
    conn: Connection,
}

#[async_trait]
impl CatalogTransaction for DbTransaction {
    async fn rename_theme(&mut self, old_name: &str, theme: &Theme) -> Result<()> {
        self.conn
            .execute(
                "UPDATE themes SET name = ?2, data = ?3, updated_at = datetime('now') \
                 WHERE name = ?1",
                libsql::params![old_name, theme.name.clone(), theme_to_row(theme)?],
            )
            .await
            .map_err(|e| store_err("Failed to rename theme", e))?;
        Ok(())
    }

    async fn retheme_questions(&mut self, old_name: &str, new_name: &str) -> Result<u64> {
        // The document body carries the theme name too, so rewrite both.
        self.conn
            .execute(
                "UPDATE questions SET theme = ?2, data = json_set(data, '$.theme', ?2), \
                 updated_at = datetime('now') WHERE theme = ?1",
                libsql::params![old_name, new_name],
            )
            .await
            .map_err(|e| store_err("Failed to retheme questions", e))
    }

    async fn delete_theme(&mut self, name: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM themes WHERE name = ?1", libsql::params![name])
            .await
            .map_err(|e| store_err("Failed to delete theme", e))?;
        Ok(())
    }

    async fn delete_questions_by_theme(&mut self, theme: &str) -> Result<u64> {
        self.conn
            .execute(
                "DELETE FROM questions WHERE theme = ?1",
                libsql::params![theme],
            )
            .await
            .map_err(|e| store_err("Failed to delete questions", e))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.conn
            .execute("COMMIT", libsql::params![])
            .await
            .map_err(|e| store_err("Failed to commit transaction", e))?;
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<()> {
        self.conn
            .execute("ROLLBACK", libsql::params![])
            .await
            .map_err(|e| store_err("Failed to roll back transaction", e))?;
        Ok(())
    }
}
