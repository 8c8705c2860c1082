//! Simulator Program Loader
//!
//! Loads 32-bit ELF program images into the byte-addressable memory of an
//! instruction-set simulator, and locates the well-known sections that
//! compliance test binaries use to report status and deposit a result
//! signature.
//!
//! # Pipeline
//!
//! 1. Read the image file and decode its section table ([`ImageParser`])
//! 2. Reject anything that is not ELF32
//! 3. Copy every ALLOC + PROGBITS section into the [`MemoryTarget`]
//! 4. Read each copied section back and compare byte-for-byte
//!
//! The compliance variant ([`ComplianceLoader`]) additionally bounds every
//! section against the simulated RAM size and resolves the `tohost`,
//! `fromhost` and signature sections by name.
//!
//! # Failure
//!
//! A failed load leaves memory partially written. Callers must treat any
//! `Err` as fatal for the simulation run.

pub mod compliance;
pub mod config;
pub mod elf;
pub mod error;
pub mod image;
pub mod loader;
pub mod memory;
pub mod signature;

pub use compliance::{ComplianceAddresses, ComplianceLoader, HostSymbol};
pub use config::ComplianceConfig;
pub use elf::GoblinParser;
pub use error::{ErrorKind, LoadError};
pub use image::{ImageClass, ImageParser, ParsedImage, SectionDescriptor, SectionFlags, SectionKind};
pub use loader::{ElfLoader, LoadOutcome, Verbosity};
pub use memory::{MemoryTarget, Ram};
