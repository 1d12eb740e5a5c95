//! Error types for map generation.

use thiserror::Error;

use crate::generator::GenerationStep;

/// Errors raised by the generation pipeline, its configuration, and its exporters.
#[derive(Error, Debug)]
pub enum MapGenError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("catalog `{0}` has no entries")]
    EmptyCatalog(&'static str),

    #[error("catalog `{0}` has a total weight of zero")]
    ZeroCatalogWeight(&'static str),

    #[error("could not place enough {deposit}: {generated} of {required} tiles after exhausting the vein budget")]
    QuotaUnreachable {
        deposit: &'static str,
        generated: usize,
        required: usize,
    },

    #[error("step {found:?} needs the {expected} stage")]
    WrongStage {
        expected: &'static str,
        found: GenerationStep,
    },

    #[error("generation has already finished")]
    AlreadyFinished,

    #[error("generation has not finished yet (next step: {0:?})")]
    NotFinished(GenerationStep),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, MapGenError>;
