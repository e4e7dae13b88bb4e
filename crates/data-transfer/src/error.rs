//! Error types for the transfer engine.

use std::fmt;
use thiserror::Error;

/// Main error type for transfer operations.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Configuration error (invalid YAML, out-of-range values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error raised by a consumer implementation
    #[error("Consumer error: {0}")]
    Consumer(String),

    /// Error raised by a producer implementation
    #[error("Producer error: {0}")]
    Producer(String),

    /// Opaque backend error from a consumer or producer
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),

    /// A pipe failed before any parallel work was scheduled
    #[error("Initialization failed for pipe {pipe} ({name})")]
    Initialization {
        pipe: usize,
        name: String,
        #[source]
        source: Box<TransferError>,
    },

    /// A worker failed while transferring one of its pipes
    #[error("Worker {worker} failed on pipe {pipe} ({name})")]
    Worker {
        worker: usize,
        pipe: usize,
        name: String,
        #[source]
        source: Box<TransferError>,
    },

    /// A worker task panicked
    #[error("Worker {worker} panicked: {message}")]
    WorkerPanicked { worker: usize, message: String },

    /// Referential integrity could not be re-enabled after the transfer
    #[error("Failed to restore referential integrity for pipe {pipe} ({name})")]
    Restore {
        pipe: usize,
        name: String,
        #[source]
        source: Box<TransferError>,
    },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transfer was cancelled through the progress monitor
    #[error("Transfer cancelled")]
    Cancelled,
}

impl TransferError {
    /// Create a Consumer error
    pub fn consumer(message: impl Into<String>) -> Self {
        TransferError::Consumer(message.into())
    }

    /// Create a Producer error
    pub fn producer(message: impl Into<String>) -> Self {
        TransferError::Producer(message.into())
    }

    /// Wrap an arbitrary backend error
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        TransferError::Backend(Box::new(err))
    }

    /// True if this error only reports a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            TransferError::Cancelled => true,
            TransferError::Initialization { source, .. }
            | TransferError::Worker { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Pipe index this error is attributed to, if any.
    pub fn pipe(&self) -> Option<usize> {
        match self {
            TransferError::Initialization { pipe, .. }
            | TransferError::Worker { pipe, .. }
            | TransferError::Restore { pipe, .. } => Some(*pipe),
            _ => None,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// One primary error plus every other error raised in the same phase.
///
/// Nothing is dropped: the first error (in worker index order) is the primary,
/// each later one is kept as a suppressed cause.
#[derive(Debug)]
pub struct AggregatedError {
    primary: TransferError,
    suppressed: Vec<TransferError>,
}

impl AggregatedError {
    pub fn new(primary: TransferError) -> Self {
        Self {
            primary,
            suppressed: Vec::new(),
        }
    }

    /// Fold errors in iteration order. Returns None for an empty iterator.
    pub fn collect<I>(errors: I) -> Option<Self>
    where
        I: IntoIterator<Item = TransferError>,
    {
        let mut aggregated: Option<Self> = None;
        for err in errors {
            match aggregated.as_mut() {
                Some(agg) => agg.suppress(err),
                None => aggregated = Some(Self::new(err)),
            }
        }
        aggregated
    }

    /// Attach another error as a suppressed cause.
    pub fn suppress(&mut self, err: TransferError) {
        self.suppressed.push(err);
    }

    pub fn primary(&self) -> &TransferError {
        &self.primary
    }

    pub fn suppressed(&self) -> &[TransferError] {
        &self.suppressed
    }

    /// Total number of errors held, primary included.
    pub fn count(&self) -> usize {
        1 + self.suppressed.len()
    }

    pub fn into_parts(self) -> (TransferError, Vec<TransferError>) {
        (self.primary, self.suppressed)
    }

    /// Primary error details followed by every suppressed error.
    pub fn format_detailed(&self) -> String {
        let mut output = self.primary.format_detailed();
        for (i, err) in self.suppressed.iter().enumerate() {
            output.push_str(&format!("\nSuppressed {}:\n  {}", i + 1, err));
        }
        output
    }
}

impl fmt::Display for AggregatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)?;
        if !self.suppressed.is_empty() {
            write!(f, " (+{} suppressed)", self.suppressed.len())?;
        }
        Ok(())
    }
}

/// Result type alias for transfer operations.
pub type Result<T> = std::result::Result<T, TransferError>;
