//! Persistence for scraped courses and their assets.

pub mod config;
pub mod course_store;
pub mod error;

pub use config::StoreConfig;
pub use course_store::{CourseStore, SqliteCourseStore, StoreFuture};
pub use error::{StoreError, StoreResult};
