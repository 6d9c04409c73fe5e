//! SQLite storage backend for the livequiz aggregation core.
//!
//! [`SqliteStore`] implements the core's storage capabilities for feedback
//! and scored responses, so it plugs straight into `FeedbackService` and
//! `ResponseService`.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use livequiz_core::{FeedbackService, ResponseService};
//! use livequiz_store::{SqliteStore, StoreConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = Arc::new(SqliteStore::from_config(&StoreConfig::from_env())?);
//! let feedback = FeedbackService::new(Arc::clone(&store));
//! let responses = ResponseService::new(store);
//!
//! let ratings = feedback.average_rating("Q1").await.into_result()?;
//! let leaders = responses.highest_scores("Q1").with_size(10)?.into_result().await?;
//! println!("avg rating {ratings:.2}, {} ranked users", leaders.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `LIVEQUIZ_DB_PATH` | Database file (default: in-memory) |
//! | `LIVEQUIZ_DB_BUSY_TIMEOUT_MS` | Busy timeout in milliseconds (default: 5000) |
//! | `LIVEQUIZ_DB_WAL` | Enable write-ahead logging (default: true) |

pub mod config;
mod error;
pub mod records;
pub mod schema;
mod store;

pub use config::{ConfigError, StoreConfig};
pub use records::SqlRecord;
pub use schema::LIVEQUIZ_SCHEMA;
pub use store::SqliteStore;
