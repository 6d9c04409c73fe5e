//! Table mappings for the record families and filter-to-SQL translation.

use livequiz_core::model::{DifficultyRating, Feedback, QuizResponse, RecordId};
use livequiz_core::{Filter, NewFeedback, NewResponse, PageSpec, Record};
use rusqlite::types::{Type, Value};
use rusqlite::{params, Connection, Row};

/// A record family persisted in one SQLite table.
pub trait SqlRecord: Record {
    const TABLE: &'static str;

    /// Select list, in the order `from_row` reads it.
    const COLUMNS: &'static str;

    /// Column that sums and averages aggregate over.
    const METRIC: &'static str;

    /// Column backing [`Filter::rating`], if the family has one.
    const RATING_COLUMN: Option<&'static str>;

    /// Column backing [`Filter::value`], if the family has one.
    const VALUE_COLUMN: Option<&'static str>;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Insert `draft` and return the assigned row id.
    fn insert_draft(conn: &Connection, draft: &Self::Draft) -> rusqlite::Result<RecordId>;
}

impl SqlRecord for Feedback {
    const TABLE: &'static str = "feedback";
    const COLUMNS: &'static str =
        "id, quiz_id, username, question_number, difficulty_rating, message";
    const METRIC: &'static str = "difficulty_rating";
    const RATING_COLUMN: Option<&'static str> = Some("difficulty_rating");
    const VALUE_COLUMN: Option<&'static str> = None;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let rating: i64 = row.get(4)?;
        let difficulty_rating = DifficultyRating::try_from(rating)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Integer, Box::new(e)))?;
        Ok(Feedback {
            id: row.get(0)?,
            quiz_id: row.get(1)?,
            username: row.get(2)?,
            question_number: row.get(3)?,
            difficulty_rating,
            message: row.get(5)?,
        })
    }

    fn insert_draft(conn: &Connection, draft: &NewFeedback) -> rusqlite::Result<RecordId> {
        conn.execute(
            "INSERT INTO feedback (quiz_id, username, question_number, difficulty_rating, message)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                draft.quiz_id,
                draft.username,
                draft.question_number,
                draft.difficulty_rating.value(),
                draft.message,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

impl SqlRecord for QuizResponse {
    const TABLE: &'static str = "response";
    const COLUMNS: &'static str = "id, quiz_id, username, question_number, value, score";
    const METRIC: &'static str = "score";
    const RATING_COLUMN: Option<&'static str> = None;
    const VALUE_COLUMN: Option<&'static str> = Some("value");

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(QuizResponse {
            id: row.get(0)?,
            quiz_id: row.get(1)?,
            username: row.get(2)?,
            question_number: row.get(3)?,
            value: row.get(4)?,
            score: row.get(5)?,
        })
    }

    fn insert_draft(conn: &Connection, draft: &NewResponse) -> rusqlite::Result<RecordId> {
        conn.execute(
            "INSERT INTO response (quiz_id, username, question_number, value, score)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                draft.quiz_id,
                draft.username,
                draft.question_number,
                draft.value,
                draft.score,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

/// A rendered `WHERE` clause and its positional parameters.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Clause {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Clause {
    /// Translate `filter` against the columns of `R`.
    ///
    /// A constraint on a column `R` lacks renders as `0 = 1`.
    pub fn filter<R: SqlRecord>(filter: &Filter) -> Self {
        let mut conditions: Vec<String> = Vec::new();
        let mut params = Vec::new();

        if let Some(quiz_id) = &filter.quiz_id {
            conditions.push("quiz_id = ?".to_string());
            params.push(Value::Text(quiz_id.clone()));
        }
        if let Some(question) = filter.question_number {
            conditions.push("question_number = ?".to_string());
            params.push(Value::Integer(i64::from(question)));
        }
        if let Some(username) = &filter.username {
            conditions.push("username = ?".to_string());
            params.push(Value::Text(username.clone()));
        }
        if let Some(rating) = filter.rating {
            match R::RATING_COLUMN {
                Some(column) => {
                    conditions.push(format!("{column} = ?"));
                    params.push(Value::Integer(rating.value()));
                }
                None => conditions.push("0 = 1".to_string()),
            }
        }
        if let Some(value) = &filter.value {
            match R::VALUE_COLUMN {
                Some(column) => {
                    conditions.push(format!("{column} = ?"));
                    params.push(Value::Text(value.clone()));
                }
                None => conditions.push("0 = 1".to_string()),
            }
        }

        if conditions.is_empty() {
            return Self::default();
        }
        Self {
            sql: format!(" WHERE {}", conditions.join(" AND ")),
            params,
        }
    }

    pub fn group_by(mut self, columns: &str) -> Self {
        self.sql.push_str(" GROUP BY ");
        self.sql.push_str(columns);
        self
    }

    pub fn order_by(mut self, ordering: &str) -> Self {
        self.sql.push_str(" ORDER BY ");
        self.sql.push_str(ordering);
        self
    }

    /// Append `LIMIT ? OFFSET ?` when `page` is sized.
    pub fn paginate(mut self, page: PageSpec) -> Self {
        if let Some((offset, limit)) = page.bounds() {
            self.sql.push_str(" LIMIT ? OFFSET ?");
            self.params
                .push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
            self.params
                .push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));
        }
        self
    }
}
