use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Byte store I/O failure
    Storage,
    /// Checksum or format mismatch in persisted data
    Corruption,
    NotFound,
    /// More than one live document carries the same external key
    AmbiguousKey,
    ClosedReader,
    ClosedWriter,
    /// Another writer holds the index lock
    WriterLocked,
    InvalidArgument,
}

#[derive(Debug, Error)]
#[error("{kind:?}: {context}")]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error { kind, context: context.into() }
    }

    pub fn not_found(context: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, context)
    }

    pub fn corruption(context: impl Into<String>) -> Self {
        Self::new(ErrorKind::Corruption, context)
    }

    pub fn storage(context: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, context)
    }

    pub fn invalid_argument(context: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, context)
    }

    pub fn closed_reader() -> Self {
        Self::new(ErrorKind::ClosedReader, "reader is closed")
    }

    pub fn closed_writer() -> Self {
        Self::new(ErrorKind::ClosedWriter, "writer is closed")
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Storage,
            context: err.to_string(),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error {
            kind: ErrorKind::Corruption,
            context: err.to_string(),
        }
    }
}

impl From<lz4_flex::block::DecompressError> for Error {
    fn from(err: lz4_flex::block::DecompressError) -> Self {
        Error {
            kind: ErrorKind::Corruption,
            context: format!("LZ4 error: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
