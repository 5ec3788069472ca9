use thiserror::Error;

/// Broad classification of a [`FormatError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    StructuralMismatch,
    UnsupportedEncoding,
    RangeViolation,
    VersionGap,
}

/// Errors raised while decoding a computation network.
///
/// Every variant is fatal for the parse that produced it; no partial network
/// is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    /// A mandatory section marker did not match, or the node/relation
    /// sections disagree with each other.
    #[error("{0}")]
    StructuralMismatch(String),
    /// The stream uses an encoding this reader does not decode.
    #[error("{0}")]
    UnsupportedEncoding(String),
    /// A value or read falls outside the representable or available range.
    #[error("{0}")]
    RangeViolation(String),
    /// A record appears in a format version that cannot carry it.
    #[error("{0}")]
    VersionGap(String),
}

impl FormatError {
    pub(crate) fn structural(msg: impl Into<String>) -> Self {
        FormatError::StructuralMismatch(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        FormatError::UnsupportedEncoding(msg.into())
    }

    pub(crate) fn range(msg: impl Into<String>) -> Self {
        FormatError::RangeViolation(msg.into())
    }

    pub(crate) fn version_gap(msg: impl Into<String>) -> Self {
        FormatError::VersionGap(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FormatError::StructuralMismatch(_) => ErrorKind::StructuralMismatch,
            FormatError::UnsupportedEncoding(_) => ErrorKind::UnsupportedEncoding,
            FormatError::RangeViolation(_) => ErrorKind::RangeViolation,
            FormatError::VersionGap(_) => ErrorKind::VersionGap,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FormatError::StructuralMismatch(msg)
            | FormatError::UnsupportedEncoding(msg)
            | FormatError::RangeViolation(msg)
            | FormatError::VersionGap(msg) => msg,
        }
    }
}

pub type Result<T> = std::result::Result<T, FormatError>;
