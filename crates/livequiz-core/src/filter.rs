//! Conjunctive filters over the quiz/question/user key space.

use std::fmt;

use crate::model::DifficultyRating;

/// Conjunction of optional equality constraints.
///
/// An unset field matches every row. `rating` only exists on feedback and
/// `value` only on responses; constraining a field the record family lacks
/// matches no rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Filter {
    pub quiz_id: Option<String>,
    pub question_number: Option<u32>,
    pub username: Option<String>,
    pub rating: Option<DifficultyRating>,
    pub value: Option<String>,
}

impl Filter {
    /// Rows for one quiz.
    pub fn quiz(quiz_id: impl Into<String>) -> Self {
        Self {
            quiz_id: Some(quiz_id.into()),
            ..Self::default()
        }
    }

    /// Rows by one user across every quiz.
    pub fn user(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }

    pub fn question(mut self, question_number: u32) -> Self {
        self.question_number = Some(question_number);
        self
    }

    pub fn by_user(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn rated(mut self, rating: DifficultyRating) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// True when no constraint is set.
    pub fn is_empty(&self) -> bool {
        self.quiz_id.is_none()
            && self.question_number.is_none()
            && self.username.is_none()
            && self.rating.is_none()
            && self.value.is_none()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("*");
        }
        let mut parts = Vec::new();
        if let Some(quiz_id) = &self.quiz_id {
            parts.push(format!("quiz_id={}", quiz_id));
        }
        if let Some(question) = self.question_number {
            parts.push(format!("question_number={}", question));
        }
        if let Some(username) = &self.username {
            parts.push(format!("username={}", username));
        }
        if let Some(rating) = self.rating {
            parts.push(format!("rating={}", rating.value()));
        }
        if let Some(value) = &self.value {
            parts.push(format!("value={}", value));
        }
        f.write_str(&parts.join(" AND "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_composes_conjunction() {
        let filter = Filter::quiz("Q1").question(3).by_user("amy");
        assert_eq!(filter.quiz_id.as_deref(), Some("Q1"));
        assert_eq!(filter.question_number, Some(3));
        assert_eq!(filter.username.as_deref(), Some("amy"));
        assert_eq!(
            filter.to_string(),
            "quiz_id=Q1 AND question_number=3 AND username=amy"
        );
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::default().is_empty());
        assert_eq!(Filter::default().to_string(), "*");
        assert!(!Filter::user("bob").is_empty());
    }
}
