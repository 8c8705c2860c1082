//! ELF32 Image Loader
//!
//! Copies the initialised sections of a program image into simulator
//! memory and verifies every byte by reading it back.
//!
//! # Process
//!
//! 1. Read the bound file and decode it with the [`ImageParser`]
//! 2. Reject images that are not ELF32
//! 3. Record the entry point
//! 4. For each ALLOC + PROGBITS section with a non-zero size, in table order:
//!    a. Write every payload byte, ascending
//!    b. Read the whole section back and compare
//!    c. Abort on the first mismatch; later sections are never touched
//!
//! A loadable section whose payload length disagrees with its size fails
//! the load before any byte is written.
//!
//! ALLOC sections without a payload (`.bss`) are skipped, not zeroed.

use std::path::{Path, PathBuf};

use crate::elf::GoblinParser;
use crate::error::LoadError;
use crate::image::{ImageClass, ImageParser, ParsedImage, SectionDescriptor, SectionFlags};
use crate::memory::MemoryTarget;

/// Diagnostic detail level.
///
/// Only controls what is sent to the `log` facade; failures are always
/// logged at error level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Nothing but errors.
    #[default]
    Silent = 0,
    /// Entry point and section ranges.
    Summary = 1,
    /// Plus compliance symbol resolution.
    Symbols = 2,
    /// Plus one line per byte written.
    Trace = 3,
}

impl From<u8> for Verbosity {
    fn from(level: u8) -> Self {
        match level {
            0 => Self::Silent,
            1 => Self::Summary,
            2 => Self::Symbols,
            _ => Self::Trace,
        }
    }
}

/// Result of a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Entry point from the image header
    pub entry_point: u32,
    /// Number of sections copied and verified
    pub sections_loaded: usize,
    /// Total bytes copied
    pub bytes_loaded: u64,
}

/// Loads one image file into a borrowed memory target.
pub struct ElfLoader<'m, M: MemoryTarget + ?Sized, P: ImageParser = GoblinParser> {
    path: PathBuf,
    memory: &'m mut M,
    parser: P,
    entry_point: Option<u32>,
}

impl<'m, M: MemoryTarget + ?Sized> ElfLoader<'m, M, GoblinParser> {
    /// Bind a loader to `path` and `memory`. An empty path may be set later.
    pub fn new(path: impl Into<PathBuf>, memory: &'m mut M) -> Self {
        Self::with_parser(path, memory, GoblinParser::new())
    }
}

impl<'m, M: MemoryTarget + ?Sized, P: ImageParser> ElfLoader<'m, M, P> {
    pub fn with_parser(path: impl Into<PathBuf>, memory: &'m mut M, parser: P) -> Self {
        Self {
            path: path.into(),
            memory,
            parser,
            entry_point: None,
        }
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entry point of the last image that passed the class check.
    pub fn entry_point(&self) -> Option<u32> {
        self.entry_point
    }

    pub fn memory(&self) -> &M {
        &*self.memory
    }

    /// Load the bound image into memory.
    pub fn load(&mut self, verbosity: Verbosity) -> Result<LoadOutcome, LoadError> {
        self.load_with(verbosity, |_| Ok(())).map(|(outcome, ())| outcome)
    }

    /// Load the bound image, then hand the decoded image to `inspect`.
    ///
    /// `inspect` runs only after every section was copied and verified, and
    /// the image it sees is dropped before this call returns.
    pub fn load_with<T, F>(&mut self, verbosity: Verbosity, inspect: F) -> Result<(LoadOutcome, T), LoadError>
    where
        F: FnOnce(&ParsedImage<'_>) -> Result<T, LoadError>,
    {
        self.entry_point = None;

        if self.path.as_os_str().is_empty() {
            log::error!("[simload] No image path bound");
            return Err(LoadError::MissingPath);
        }

        let raw = std::fs::read(&self.path).map_err(|source| {
            log::error!("[simload] Cannot open {}: {}", self.path.display(), source);
            LoadError::ImageOpen {
                path: self.path.clone(),
                source,
            }
        })?;

        let image = self.parser.parse(&raw).map_err(|e| {
            log::error!("[simload] Cannot parse {}: {}", self.path.display(), e);
            e
        })?;

        if image.class != ImageClass::Elf32 {
            log::error!("[simload] {} is {}, expected ELF32", self.path.display(), image.class);
            return Err(LoadError::UnsupportedClass { class: image.class });
        }

        // ELF32 entry points always fit; anything else came from a broken parser.
        let entry_point = u32::try_from(image.entry_point)
            .map_err(|_| LoadError::parse(format!("entry point {:#x} exceeds 32 bits", image.entry_point)))?;
        self.entry_point = Some(entry_point);
        if verbosity >= Verbosity::Summary {
            log::info!("[simload] Entry point: {:#x}", entry_point);
        }

        // Reject malformed descriptors before memory is touched.
        for section in image.sections.iter().filter(|s| s.is_loadable()) {
            check_payload(section)?;
        }

        let mut outcome = LoadOutcome {
            entry_point,
            sections_loaded: 0,
            bytes_loaded: 0,
        };

        for section in &image.sections {
            if !section.flags.contains(SectionFlags::ALLOC) || section.size == 0 {
                continue;
            }
            if verbosity >= Verbosity::Summary {
                log::info!(
                    "[simload] Memory: {:#x} - {:#x} (Size={}KB) {}",
                    section.address,
                    section.end() - 1,
                    section.size / 1024,
                    section.name
                );
            }
            if !section.is_loadable() {
                continue;
            }

            copy_section(&mut *self.memory, section, verbosity)?;
            verify_section(&*self.memory, section)?;

            outcome.sections_loaded += 1;
            outcome.bytes_loaded += u64::from(section.size);
        }

        let inspected = inspect(&image)?;
        Ok((outcome, inspected))
    }
}

/// A loadable section must carry exactly `size` payload bytes.
fn check_payload(section: &SectionDescriptor<'_>) -> Result<(), LoadError> {
    if section.data.len() != section.size as usize {
        log::error!(
            "[simload] Section {} holds {} payload bytes, header says {}",
            section.name,
            section.data.len(),
            section.size
        );
        return Err(LoadError::parse(format!(
            "section {}: payload holds {} bytes, header says {}",
            section.name,
            section.data.len(),
            section.size
        )));
    }
    Ok(())
}

fn copy_section<M: MemoryTarget + ?Sized>(
    memory: &mut M,
    section: &SectionDescriptor<'_>,
    verbosity: Verbosity,
) -> Result<(), LoadError> {
    for (offset, &byte) in section.data.iter().enumerate() {
        let address = section.address.wrapping_add(offset as u32);
        if verbosity >= Verbosity::Trace {
            log::trace!("[simload] MEM[{:#x}] <- {:#x}", address, byte);
        }
        memory.write_byte(address, byte);
    }
    Ok(())
}

fn verify_section<M: MemoryTarget + ?Sized>(memory: &M, section: &SectionDescriptor<'_>) -> Result<(), LoadError> {
    for (offset, &expected) in section.data.iter().enumerate() {
        let address = section.address.wrapping_add(offset as u32);
        let actual = memory.read_byte(address);
        if actual != expected {
            log::error!(
                "[simload] At MEM[{:#x}] expected value is {:#x} but got {:#x}",
                address,
                expected,
                actual
            );
            return Err(LoadError::VerificationMismatch {
                address,
                expected,
                actual,
            });
        }
    }
    Ok(())
}
