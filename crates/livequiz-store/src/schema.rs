//! SQLite schema for quiz feedback and scored responses.
//!
//! Tables:
//! - `feedback`: Difficulty ratings and optional messages per question
//! - `response`: Scored answers per question

/// DDL for the feedback and response tables.
///
/// Schema version: 1
pub const LIVEQUIZ_SCHEMA: &str = r#"
-- Feedback submitted for a quiz question
CREATE TABLE IF NOT EXISTS feedback (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    quiz_id           TEXT NOT NULL,
    username          TEXT NOT NULL,
    question_number   INTEGER NOT NULL CHECK (question_number >= 0),
    difficulty_rating INTEGER NOT NULL CHECK (difficulty_rating BETWEEN 0 AND 3),
    message           TEXT
);

-- Scored response to a quiz question
CREATE TABLE IF NOT EXISTS response (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    quiz_id         TEXT NOT NULL,
    username        TEXT NOT NULL,
    question_number INTEGER NOT NULL CHECK (question_number >= 0),
    value           TEXT NOT NULL,
    score           INTEGER NOT NULL
);

-- Indexes for the quiz/question/user lookups
CREATE INDEX IF NOT EXISTS idx_feedback_quiz_question
    ON feedback(quiz_id, question_number);
CREATE INDEX IF NOT EXISTS idx_feedback_username
    ON feedback(username);
CREATE INDEX IF NOT EXISTS idx_response_quiz_question
    ON response(quiz_id, question_number);
CREATE INDEX IF NOT EXISTS idx_response_quiz_username
    ON response(quiz_id, username);
"#;
