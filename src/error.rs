use thiserror::Error;

/// Errors surfaced by the demos.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("Invalid hostname: {0:?}")]
    InvalidHost(String),
    #[error("Worker thread {0} panicked")]
    WorkerPanicked(usize),
    #[error("Counter lock was poisoned")]
    LockPoisoned,
    #[error("Partial sum collector hung up")]
    CollectorClosed,
    #[error(transparent)]
    Sql(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
