use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CatalogError, Result};

/// A named category grouping quiz questions. The name is the primary key and
/// the value questions reference; renaming a theme migrates its questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Theme {
    pub fn new(name: String, category: Option<String>) -> Self {
        Self {
            name,
            category,
            created_at: Utc::now(),
        }
    }
}

/// A quiz question belonging to exactly one theme by name.
///
/// `id` is None until the store assigns one on insert. `correct_answer` must
/// always equal one element of `options`; `theme` must always name an
/// existing theme. Both invariants are enforced by the catalog manager
/// before any write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Option<Uuid>,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub theme: String,
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Apply a partial patch, producing the merged state. Fields absent from
    /// the patch are untouched. Pure; validation happens on the result.
    pub fn merged_with(&self, patch: &QuestionPatch) -> Question {
        Question {
            id: self.id,
            question: patch.question.clone().unwrap_or_else(|| self.question.clone()),
            options: patch.options.clone().unwrap_or_else(|| self.options.clone()),
            correct_answer: patch
                .correct_answer
                .clone()
                .unwrap_or_else(|| self.correct_answer.clone()),
            theme: patch.theme.clone().unwrap_or_else(|| self.theme.clone()),
            created_at: self.created_at,
        }
    }

    pub fn admin_view(&self) -> Result<AdminQuestionView> {
        let id = self.id.ok_or_else(|| CatalogError::Storage {
            message: "question record is missing its id".to_string(),
        })?;
        Ok(AdminQuestionView {
            id,
            question: self.question.clone(),
            options: self.options.clone(),
            correct_answer: self.correct_answer.clone(),
            theme: self.theme.clone(),
        })
    }
}

/// Admin input for creating or renaming a theme.
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeDraft {
    pub name: String,
    pub category: Option<String>,
}

/// Admin input for adding a question.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionDraft {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub theme: String,
}

/// Partial update for a question; only supplied fields change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionPatch {
    pub question: Option<String>,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<String>,
    pub theme: Option<String>,
}

/// Projection returned to admin callers. Includes the correct answer; the
/// player-facing surface must never serve this shape.
#[derive(Debug, Clone, Serialize)]
pub struct AdminQuestionView {
    pub id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub theme: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_question() -> Question {
        Question {
            id: Some(Uuid::new_v4()),
            question: "Year?".to_string(),
            options: vec!["1990".to_string(), "2000".to_string()],
            correct_answer: "1990".to_string(),
            theme: "History".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn merge_with_empty_patch_changes_nothing() {
        let current = sample_question();
        let merged = current.merged_with(&QuestionPatch::default());

        assert_eq!(merged.question, current.question);
        assert_eq!(merged.options, current.options);
        assert_eq!(merged.correct_answer, current.correct_answer);
        assert_eq!(merged.theme, current.theme);
        assert_eq!(merged.id, current.id);
    }

    #[test]
    fn merge_only_overrides_supplied_fields() {
        let current = sample_question();
        let patch = QuestionPatch {
            correct_answer: Some("2000".to_string()),
            ..Default::default()
        };

        let merged = current.merged_with(&patch);

        assert_eq!(merged.correct_answer, "2000");
        assert_eq!(merged.question, current.question);
        assert_eq!(merged.options, current.options);
        assert_eq!(merged.theme, current.theme);
    }

    #[test]
    fn merge_keeps_created_at() {
        let current = sample_question();
        let patch = QuestionPatch {
            question: Some("When?".to_string()),
            ..Default::default()
        };

        assert_eq!(current.merged_with(&patch).created_at, current.created_at);
    }

    #[test]
    fn admin_view_requires_an_id() {
        let mut q = sample_question();
        q.id = None;

        assert!(q.admin_view().is_err());
    }
}
