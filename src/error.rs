/// Raster-level failure raised by the image primitives.
///
/// Strategies absorb this locally and fall back to the unmodified input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImagingError {
    #[error("missing raster data: {0}")]
    MissingRasterData(&'static str),
}

/// Failure kinds surfaced by a [`crate::output::VideoEncoder`].
#[derive(thiserror::Error, Debug)]
pub enum EncodingError {
    #[error("audio error: {0}")]
    Audio(String),

    #[error("video error: {0}")]
    Video(String),

    #[error("failed to create video writer: {0}")]
    WriterCreation(String),

    #[error("export error: {0}")]
    Export(String),
}

impl EncodingError {
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }

    pub fn video(msg: impl Into<String>) -> Self {
        Self::Video(msg.into())
    }

    pub fn writer_creation(msg: impl Into<String>) -> Self {
        Self::WriterCreation(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Terminal failures of a pipeline run. Any of these aborts the whole run.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("segmentation failed for pair {pair}: {source:#}")]
    Segmentation {
        pair: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("pair {pair} never completed; refusing to assemble a partial timeline")]
    IncompleteTimeline { pair: usize },

    #[error("pair {pair} was completed twice")]
    DuplicateCompletion { pair: usize },

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_kinds_have_distinct_prefixes() {
        assert!(EncodingError::audio("x").to_string().starts_with("audio error"));
        assert!(EncodingError::video("x").to_string().starts_with("video error"));
        assert!(EncodingError::writer_creation("x")
            .to_string()
            .contains("video writer"));
        assert!(EncodingError::export("x").to_string().starts_with("export error"));
    }

    #[test]
    fn segmentation_error_keeps_pair_and_cause() {
        let err = PipelineError::Segmentation {
            pair: 3,
            source: anyhow::anyhow!("model exploded"),
        };
        let text = err.to_string();
        assert!(text.contains("pair 3"));
        assert!(text.contains("model exploded"));
    }

    #[test]
    fn encoding_errors_convert_into_pipeline_errors() {
        let err: PipelineError = EncodingError::export("mux").into();
        assert!(matches!(err, PipelineError::Encoding(EncodingError::Export(_))));
    }
}
