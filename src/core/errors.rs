//! Error types for the dataset generation pipeline.
//!
//! This module defines the error enum shared across the pipeline, a stage
//! discriminant that identifies where in the per-canvas pipeline an error
//! occurred, and helper constructors for wrapping underlying errors with
//! context.

use thiserror::Error;

/// Convenient result alias for generation operations.
pub type DatagenResult<T> = Result<T, DatagenError>;

/// Stage of the per-canvas pipeline an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    /// Error occurred while loading element sketches.
    ElementLoad,
    /// Error occurred while writing an annotation file.
    Annotation,
    /// Error occurred while writing an output image.
    ArtifactWrite,
}

impl std::fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationStage::ElementLoad => write!(f, "element load"),
            GenerationStage::Annotation => write!(f, "annotation"),
            GenerationStage::ArtifactWrite => write!(f, "artifact write"),
        }
    }
}

/// Errors that can occur while generating or converting the dataset.
#[derive(Error, Debug)]
pub enum DatagenError {
    /// Error occurred while decoding an image file.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error occurred inside a pipeline stage.
    #[error("{stage} failed: {context}")]
    Processing {
        /// The stage the error occurred in.
        stage: GenerationStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error indicating the resume scan found an ambiguous output state.
    #[error("resume scan: {message}")]
    ResumeState {
        /// A message describing the corrupt resume state.
        message: String,
    },

    /// A worker thread panicked while running a task.
    #[error("worker panicked: {message}")]
    WorkerPanic {
        /// The panic payload, when it carried one.
        message: String,
    },

    /// XML error while reading an annotation file.
    #[error("annotation xml")]
    Xml(#[from] quick_xml::Error),

    /// CSV error while writing label files.
    #[error("label csv")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl DatagenError {
    /// Creates a processing error for a pipeline stage.
    ///
    /// # Arguments
    ///
    /// * `stage` - The stage the error occurred in.
    /// * `context` - Additional context about the error.
    /// * `error` - The underlying error.
    pub fn processing(
        stage: GenerationStage,
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            stage,
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates a resume-state error.
    pub fn resume_state(message: impl Into<String>) -> Self {
        Self::ResumeState {
            message: message.into(),
        }
    }

    /// Creates an error from a worker panic payload.
    pub fn worker_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "opaque panic payload".to_string()
        };
        Self::WorkerPanic { message }
    }
}
