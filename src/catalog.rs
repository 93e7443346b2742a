use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{Question, QuestionDraft, QuestionPatch, Theme, ThemeDraft};
use crate::error::{CatalogError, Result};
use crate::storage::CatalogStore;

/// Write-time referential integrity over the two quiz collections. The store
/// enforces no constraints of its own, so every mutation validates here
/// before touching it, and the two theme cascades run inside a store
/// transaction.
pub struct CatalogManager {
    store: Arc<dyn CatalogStore>,
}

impl CatalogManager {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn add_theme(&self, draft: ThemeDraft) -> Result<Theme> {
        if self.store.get_theme(&draft.name).await?.is_some() {
            return Err(CatalogError::ThemeExists(draft.name));
        }

        let theme = Theme::new(draft.name, draft.category);
        self.store.insert_theme(&theme).await?;

        info!("Added theme '{}'", theme.name);
        Ok(theme)
    }

    pub async fn list_themes(&self) -> Result<Vec<String>> {
        self.store.list_theme_names().await
    }

    /// Rename a theme and migrate every question referencing it, as one
    /// logical unit. A category-only update (unchanged name) is a single
    /// record write with no cascade.
    pub async fn update_theme(&self, old_name: &str, draft: ThemeDraft) -> Result<Theme> {
        let existing = self
            .store
            .get_theme(old_name)
            .await?
            .ok_or_else(|| CatalogError::ThemeNotFound(old_name.to_string()))?;

        let renaming = draft.name != old_name;
        // Uniqueness is not re-checked inside the transaction; two
        // concurrent renames onto the same target name can race.
        if renaming && self.store.get_theme(&draft.name).await?.is_some() {
            return Err(CatalogError::ThemeExists(draft.name));
        }

        let updated = Theme {
            name: draft.name,
            category: draft.category,
            created_at: existing.created_at,
        };

        let mut txn = self.store.begin().await?;
        if let Err(e) = txn.rename_theme(old_name, &updated).await {
            let _ = txn.abort().await;
            return Err(e);
        }

        if renaming {
            match txn.retheme_questions(old_name, &updated.name).await {
                Ok(rewritten) => {
                    info!(
                        "Renamed theme '{}' to '{}', rewriting {} question(s)",
                        old_name, updated.name, rewritten
                    );
                }
                Err(e) => {
                    error!("Question rewrite for theme rename failed: {}", e);
                    let _ = txn.abort().await;
                    return Err(CatalogError::CascadeIncomplete {
                        operation: "theme rename",
                        message: e.to_string(),
                    });
                }
            }
        }

        txn.commit().await.map_err(|e| {
            if renaming {
                error!("Commit of theme rename cascade failed: {}", e);
                CatalogError::CascadeIncomplete {
                    operation: "theme rename",
                    message: e.to_string(),
                }
            } else {
                e
            }
        })?;

        Ok(updated)
    }

    /// Delete a theme and every question it owns, as one logical unit.
    pub async fn delete_theme(&self, name: &str) -> Result<()> {
        if self.store.get_theme(name).await?.is_none() {
            return Err(CatalogError::ThemeNotFound(name.to_string()));
        }

        let mut txn = self.store.begin().await?;
        if let Err(e) = txn.delete_theme(name).await {
            let _ = txn.abort().await;
            return Err(e);
        }

        let deleted = match txn.delete_questions_by_theme(name).await {
            Ok(deleted) => deleted,
            Err(e) => {
                error!("Question delete for theme delete failed: {}", e);
                let _ = txn.abort().await;
                return Err(CatalogError::CascadeIncomplete {
                    operation: "theme delete",
                    message: e.to_string(),
                });
            }
        };

        txn.commit().await.map_err(|e| {
            error!("Commit of theme delete cascade failed: {}", e);
            CatalogError::CascadeIncomplete {
                operation: "theme delete",
                message: e.to_string(),
            }
        })?;

        info!("Deleted theme '{}' and {} question(s)", name, deleted);
        Ok(())
    }

    pub async fn add_question(&self, draft: QuestionDraft) -> Result<Question> {
        if self.store.get_theme(&draft.theme).await?.is_none() {
            return Err(CatalogError::ThemeNotFound(draft.theme));
        }
        ensure_answer_in_options(&draft.options, &draft.correct_answer)?;

        let mut question = Question {
            id: None,
            question: draft.question,
            options: draft.options,
            correct_answer: draft.correct_answer,
            theme: draft.theme,
            created_at: Utc::now(),
        };
        self.store.insert_question(&mut question).await?;

        info!("Added question under theme '{}'", question.theme);
        Ok(question)
    }

    pub async fn list_questions(&self, theme: Option<&str>) -> Result<Vec<Question>> {
        if let Some(theme) = theme {
            if self.store.get_theme(theme).await?.is_none() {
                return Err(CatalogError::ThemeNotFound(theme.to_string()));
            }
        }
        self.store.list_questions(theme).await
    }

    /// Partial update: merge the patch onto the current state, re-validate
    /// both invariants against the merged result, then write. Nothing is
    /// written when validation fails.
    pub async fn update_question(&self, id: &str, patch: QuestionPatch) -> Result<Question> {
        let parsed = parse_question_id(id)?;
        let current = self
            .store
            .get_question(parsed)
            .await?
            .ok_or_else(|| CatalogError::QuestionNotFound(id.to_string()))?;

        if let Some(new_theme) = &patch.theme {
            if *new_theme != current.theme && self.store.get_theme(new_theme).await?.is_none() {
                return Err(CatalogError::ThemeNotFound(new_theme.clone()));
            }
        }

        let merged = current.merged_with(&patch);
        ensure_answer_in_options(&merged.options, &merged.correct_answer)?;

        if !self.store.replace_question(&merged).await? {
            return Err(CatalogError::QuestionNotFound(id.to_string()));
        }

        info!("Updated question {}", id);
        Ok(merged)
    }

    pub async fn delete_question(&self, id: &str) -> Result<()> {
        let parsed = parse_question_id(id)?;
        if !self.store.delete_question(parsed).await? {
            return Err(CatalogError::QuestionNotFound(id.to_string()));
        }

        info!("Deleted question {}", id);
        Ok(())
    }
}

fn parse_question_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| CatalogError::InvalidId(raw.to_string()))
}

fn ensure_answer_in_options(options: &[String], answer: &str) -> Result<()> {
    if options.iter().any(|option| option == answer) {
        Ok(())
    } else {
        Err(CatalogError::AnswerNotInOptions(answer.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    fn manager() -> CatalogManager {
        CatalogManager::new(Arc::new(InMemoryStore::new()))
    }

    fn draft(name: &str) -> ThemeDraft {
        ThemeDraft {
            name: name.to_string(),
            category: None,
        }
    }

    fn question_draft(theme: &str, options: &[&str], correct: &str) -> QuestionDraft {
        QuestionDraft {
            question: "Year?".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_answer: correct.to_string(),
            theme: theme.to_string(),
        }
    }

    #[test]
    fn answer_must_match_an_option_exactly() {
        let options = vec!["Paris".to_string(), "Lyon".to_string()];

        assert!(ensure_answer_in_options(&options, "Paris").is_ok());
        assert!(matches!(
            ensure_answer_in_options(&options, "paris"),
            Err(CatalogError::AnswerNotInOptions(_))
        ));
    }

    #[test]
    fn malformed_ids_are_rejected_before_any_lookup() {
        assert!(matches!(
            parse_question_id("not-a-uuid"),
            Err(CatalogError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_theme_names_conflict() {
        let catalog = manager();
        catalog.add_theme(draft("Science")).await.unwrap();

        let second = catalog.add_theme(draft("Science")).await;
        assert!(matches!(second, Err(CatalogError::ThemeExists(_))));
    }

    #[tokio::test]
    async fn questions_require_an_existing_theme() {
        let catalog = manager();

        let result = catalog
            .add_question(question_draft("Ghost", &["A", "B"], "A"))
            .await;
        assert!(matches!(result, Err(CatalogError::ThemeNotFound(_))));
    }

    #[tokio::test]
    async fn patching_options_out_from_under_the_answer_fails() {
        let catalog = manager();
        catalog.add_theme(draft("History")).await.unwrap();
        let q = catalog
            .add_question(question_draft("History", &["1990", "2000"], "1990"))
            .await
            .unwrap();
        let id = q.id.unwrap().to_string();

        let patch = QuestionPatch {
            options: Some(vec!["A".to_string(), "B".to_string()]),
            ..Default::default()
        };
        let result = catalog.update_question(&id, patch).await;
        assert!(matches!(result, Err(CatalogError::AnswerNotInOptions(_))));

        // The stored question is untouched.
        let stored = catalog.list_questions(Some("History")).await.unwrap();
        assert_eq!(stored[0].options, vec!["1990", "2000"]);
        assert_eq!(stored[0].correct_answer, "1990");
    }

    #[tokio::test]
    async fn patching_answer_and_options_together_checks_the_new_pair() {
        let catalog = manager();
        catalog.add_theme(draft("History")).await.unwrap();
        let q = catalog
            .add_question(question_draft("History", &["1990", "2000"], "1990"))
            .await
            .unwrap();
        let id = q.id.unwrap().to_string();

        let patch = QuestionPatch {
            options: Some(vec!["A".to_string(), "B".to_string()]),
            correct_answer: Some("B".to_string()),
            ..Default::default()
        };
        let updated = catalog.update_question(&id, patch).await.unwrap();
        assert_eq!(updated.correct_answer, "B");
        assert_eq!(updated.options, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn moving_a_question_to_a_missing_theme_fails() {
        let catalog = manager();
        catalog.add_theme(draft("History")).await.unwrap();
        let q = catalog
            .add_question(question_draft("History", &["A", "B"], "A"))
            .await
            .unwrap();
        let id = q.id.unwrap().to_string();

        let patch = QuestionPatch {
            theme: Some("Ghost".to_string()),
            ..Default::default()
        };
        let result = catalog.update_question(&id, patch).await;
        assert!(matches!(result, Err(CatalogError::ThemeNotFound(_))));
    }

    #[tokio::test]
    async fn category_only_update_keeps_name_and_questions() {
        let catalog = manager();
        catalog.add_theme(draft("Science")).await.unwrap();
        catalog
            .add_question(question_draft("Science", &["A", "B"], "A"))
            .await
            .unwrap();

        let updated = catalog
            .update_theme(
                "Science",
                ThemeDraft {
                    name: "Science".to_string(),
                    category: Some("STEM".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.category.as_deref(), Some("STEM"));
        assert_eq!(
            catalog.list_questions(Some("Science")).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn renaming_onto_an_existing_theme_conflicts() {
        let catalog = manager();
        catalog.add_theme(draft("Science")).await.unwrap();
        catalog.add_theme(draft("History")).await.unwrap();

        let result = catalog.update_theme("Science", draft("History")).await;
        assert!(matches!(result, Err(CatalogError::ThemeExists(_))));
    }
}
