use thiserror::Error;

/// Boxed error handed to the transformer by loaders and pipelines
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for a transformation job
#[derive(Error, Debug)]
pub enum TransformationError {
    /// Every track was discovered but none was registered with the output
    #[error("The output does not contain any tracks.")]
    NoTracks,

    /// The loader failed to read or decode the input
    #[error("Playback error: {0}")]
    Playback(#[source] PlaybackError),

    /// Anything that does not fit another category
    #[error("Unexpected error: {source}")]
    Unexpected {
        #[source]
        source: BoxError,
    },

    /// A decoder could not be created for a track
    #[error("Failed to create decoder: {0}")]
    DecoderInit(String),

    /// An encoder could not be created for a track
    #[error("Failed to create encoder: {0}")]
    EncoderInit(String),

    /// The requested output format cannot be produced
    #[error("Output format unsupported: {mime}")]
    OutputFormatUnsupported { mime: String },

    /// An audio processor or video effect failed
    #[error("Frame processing error: {0}")]
    FrameProcessing(String),

    /// The muxer rejected a track or sample
    #[error("Muxing error: {0}")]
    Muxing(String),

    /// The job was released or already reached a terminal event
    #[error("Transformation already finished")]
    Released,
}

/// Stable numeric error codes, grouped by category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    Unspecified = 1000,
    FailedRuntimeCheck = 1001,
    IoUnspecified = 2000,
    DecoderInitFailed = 3001,
    DecodingFailed = 3002,
    EncoderInitFailed = 4001,
    OutputFormatUnsupported = 4003,
    FrameProcessingFailed = 5001,
    MuxingFailed = 7001,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Category of a loader-side failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackErrorCode {
    Io,
    Decoding,
    Unspecified,
}

/// Failure reported by the loader while reading or decoding the input
#[derive(Error, Debug)]
#[error("{message} ({code:?})")]
pub struct PlaybackError {
    pub code: PlaybackErrorCode,
    pub message: String,
}

impl PlaybackError {
    pub fn new(code: PlaybackErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl TransformationError {
    /// Map any error raised by a loader or pipeline into a transformation error.
    ///
    /// Transformation errors pass through unchanged, playback errors are
    /// wrapped and everything else becomes `Unexpected`. The cause is kept
    /// as the error source in every case.
    pub fn from_boxed(error: BoxError) -> Self {
        let error = match error.downcast::<TransformationError>() {
            Ok(transformation) => return *transformation,
            Err(other) => other,
        };
        match error.downcast::<PlaybackError>() {
            Ok(playback) => TransformationError::Playback(*playback),
            Err(other) => TransformationError::Unexpected { source: other },
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            TransformationError::NoTracks | TransformationError::Released => {
                ErrorCode::FailedRuntimeCheck
            }
            TransformationError::Playback(e) => match e.code {
                PlaybackErrorCode::Io => ErrorCode::IoUnspecified,
                PlaybackErrorCode::Decoding => ErrorCode::DecodingFailed,
                PlaybackErrorCode::Unspecified => ErrorCode::Unspecified,
            },
            TransformationError::Unexpected { .. } => ErrorCode::Unspecified,
            TransformationError::DecoderInit(_) => ErrorCode::DecoderInitFailed,
            TransformationError::EncoderInit(_) => ErrorCode::EncoderInitFailed,
            TransformationError::OutputFormatUnsupported { .. } => {
                ErrorCode::OutputFormatUnsupported
            }
            TransformationError::FrameProcessing(_) => ErrorCode::FrameProcessingFailed,
            TransformationError::Muxing(_) => ErrorCode::MuxingFailed,
        }
    }
}

impl From<PlaybackError> for TransformationError {
    fn from(error: PlaybackError) -> Self {
        TransformationError::Playback(error)
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TransformationError>;
