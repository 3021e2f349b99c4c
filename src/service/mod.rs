//! Business services backed by the store.
//!
//! Services return typed errors; mapping them to HTTP statuses is the job of
//! the handler layer.

pub mod todo;

pub use todo::TodoService;

/// Errors returned by services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The update or delete target does not exist.
    #[error("resource not found")]
    NotFound,

    /// Query, exec or scan failure. Not retried.
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}
