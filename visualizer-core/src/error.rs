//! Error types for viewer operations.

use thiserror::Error;

/// Result type for viewer operations.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Errors that can occur in viewer operations.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The source document failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A layer id was not found in the ordering model.
    ///
    /// The model and its lookup always hold the same ids, so this is a bug
    /// in the caller rather than a recoverable condition.
    #[error("Unexpected layer index: layer '{id}' is not in the list")]
    OutOfRange {
        /// The id that was looked up.
        id: String,
    },

    /// The hash carries no source URL.
    #[error("No source url available.")]
    MissingSource,

    /// Downloading the source document failed.
    #[error(transparent)]
    Download(#[from] LoadError),

    /// The source document is not valid JSON.
    #[error("parsererror, {0}")]
    Json(#[from] serde_json::Error),

    /// The map backend refused an operation.
    #[error("Map backend error: {0}")]
    Backend(String),
}

/// A source document or layer descriptor that cannot be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The document root is not an object.
    #[error("Expect source to be an object.")]
    SourceNotObject,
    /// `projection` is present but not a string.
    #[error("Expect projection to be a string.")]
    ProjectionNotString,
    /// `layers` is missing or not an array.
    #[error("Expect layers to be an array.")]
    LayersNotArray,
    /// `layers` is empty.
    #[error("There is no layer to load.")]
    NoLayers,
    /// A layer entry is not an object.
    #[error("Expect each layer to be an object.")]
    LayerNotObject,
    /// A layer id is missing or not a string.
    #[error("Expect layer ID to be a string.")]
    IdNotString,
    /// Two layers share an id.
    #[error("Duplicate layer ID '{0}'.")]
    DuplicateId(String),
    /// A layer title is missing or not a string.
    #[error("Expect layer title to be a string.")]
    TitleNotString,
    /// A layer z-index is missing or not a number.
    #[error("Expect layer z-index to be a number.")]
    ZIndexNotNumber,
    /// A layer visibility is missing or not a boolean.
    #[error("Expect layer visibility to be a boolean.")]
    VisibleNotBoolean,
    /// A layer opacity is missing or not a number.
    #[error("Expect layer opacity to be a number.")]
    OpacityNotNumber,
    /// A layer opacity is outside `[0.1, 1.0]`.
    #[error("Invalid layer opacity value.")]
    OpacityOutOfRange,
    /// An extent is not an array.
    #[error("Expect {0} extent to be an array.")]
    ExtentNotArray(&'static str),
    /// An extent does not have exactly four entries.
    #[error("Expect {0} extent to be an array of length 4.")]
    ExtentWrongLength(&'static str),
    /// An extent has a non-numeric entry.
    #[error("Expect {0} extent to contain only numbers.")]
    ExtentNotNumbers(&'static str),
    /// A layer source is missing or not an object.
    #[error("Expect layer source to be an object.")]
    SourceSpecNotObject,
    /// A layer source type is missing or not a string.
    #[error("Expect layer source type to be a string.")]
    SourceTypeNotString,
    /// A layer source options value is missing or not an object.
    #[error("Expect layer source options to be an object.")]
    SourceOptionsNotObject,
    /// The source type is neither supported nor virtual.
    #[error("Unsupported layer source type.")]
    UnsupportedSourceType(String),
}

/// Failure to download a source document.
///
/// The `Display` output is the text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The server answered with a non-success status.
    #[error("error, {status} {status_text}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// HTTP status text.
        status_text: String,
    },
    /// The request never completed.
    #[error("error, {0}")]
    Transport(String),
    /// The body could not be read or decoded.
    #[error("parsererror, {0}")]
    Parse(String),
}
