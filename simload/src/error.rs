use std::io;
use std::path::PathBuf;

use crate::image::ImageClass;

/// All errors produced while loading an image.
///
/// Every variant is terminal for the load that produced it. Memory may
/// already hold part of the image.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    // ── Image errors ─────────────────────────────────────────────────

    #[error("No image path bound to the loader")]
    MissingPath,

    #[error("Cannot open image {}: {source}", .path.display())]
    ImageOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot parse image: {reason}")]
    ImageParse { reason: String },

    #[error("Unsupported image class {class}, expected ELF32")]
    UnsupportedClass { class: ImageClass },

    // ── Memory errors ────────────────────────────────────────────────

    #[error("At MEM[{address:#x}] expected value is {expected:#04x} but got {actual:#04x}")]
    VerificationMismatch { address: u32, expected: u8, actual: u8 },

    #[error("Section {section} needs RAM size {required:#x} bytes but only {available:#x} bytes are configured")]
    MemoryBudgetExceeded {
        section: String,
        required: u64,
        available: u32,
    },

    // ── Environment errors ───────────────────────────────────────────

    #[error("Compliance config error: {0}")]
    Config(String),

    #[error("Signature region is not resolved")]
    SignatureUnavailable,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Coarse failure category of a [`LoadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// File missing, unreadable or not a decodable image.
    ImageOpenOrParse,
    /// Image decoded but is not ELF32.
    UnsupportedImageClass,
    /// A byte read back from memory differs from the one written.
    WriteVerificationMismatch,
    /// A section extends past the configured RAM size.
    MemoryBudgetExceeded,
    /// Configuration, signature or output I/O problems.
    Environment,
}

impl LoadError {
    /// Map each error variant to its failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingPath | Self::ImageOpen { .. } | Self::ImageParse { .. } => {
                ErrorKind::ImageOpenOrParse
            }
            Self::UnsupportedClass { .. } => ErrorKind::UnsupportedImageClass,
            Self::VerificationMismatch { .. } => ErrorKind::WriteVerificationMismatch,
            Self::MemoryBudgetExceeded { .. } => ErrorKind::MemoryBudgetExceeded,
            Self::Config(_) | Self::SignatureUnavailable | Self::Io(_) => ErrorKind::Environment,
        }
    }

    pub(crate) fn parse(reason: impl Into<String>) -> Self {
        Self::ImageParse {
            reason: reason.into(),
        }
    }
}
