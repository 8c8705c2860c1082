//! Parser-agnostic program image model
//!
//! Whatever decodes the file, the loader only ever sees a [`ParsedImage`]:
//! the image class, the entry point and the section table in file order.
//! Section payloads borrow from the raw file buffer and never outlive the
//! load call that produced them.

use core::fmt;

use crate::error::LoadError;

/// ELF section type: program-defined contents
pub const SHT_PROGBITS: u32 = 1;

/// ELF section type: occupies no file space (e.g. `.bss`)
pub const SHT_NOBITS: u32 = 8;

/// ELF file class from `e_ident[EI_CLASS]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageClass {
    Elf32,
    Elf64,
}

impl fmt::Display for ImageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elf32 => write!(f, "ELF32"),
            Self::Elf64 => write!(f, "ELF64"),
        }
    }
}

bitflags::bitflags! {
    /// Section attribute flags (`sh_flags`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SectionFlags: u32 {
        /// Writable at run time.
        const WRITE = 0x1;
        /// Occupies memory at run time.
        const ALLOC = 0x2;
        /// Contains executable instructions.
        const EXECINSTR = 0x4;
    }
}

/// Section type (`sh_type`), reduced to what the loader distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Null,
    ProgBits,
    NoBits,
    Other(u32),
}

impl From<u32> for SectionKind {
    fn from(sh_type: u32) -> Self {
        match sh_type {
            0 => Self::Null,
            SHT_PROGBITS => Self::ProgBits,
            SHT_NOBITS => Self::NoBits,
            other => Self::Other(other),
        }
    }
}

/// One entry of the section table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionDescriptor<'a> {
    /// Section name from the section-header string table
    pub name: &'a str,
    /// Load address
    pub address: u32,
    /// Size in bytes
    pub size: u32,
    /// Attribute flags
    pub flags: SectionFlags,
    /// Section type
    pub kind: SectionKind,
    /// Initialised contents; `size` bytes for PROGBITS, empty otherwise
    pub data: &'a [u8],
}

impl SectionDescriptor<'_> {
    /// Whether this section is copied into simulated memory.
    ///
    /// ALLOC sections without a payload (`.bss` and friends) are left to
    /// the memory target's own zero-fill.
    pub fn is_loadable(&self) -> bool {
        self.flags.contains(SectionFlags::ALLOC) && self.size > 0 && self.kind == SectionKind::ProgBits
    }

    /// One past the last byte the section covers.
    pub fn end(&self) -> u64 {
        u64::from(self.address) + u64::from(self.size)
    }
}

/// A decoded program image.
#[derive(Debug, Clone)]
pub struct ParsedImage<'a> {
    /// File class
    pub class: ImageClass,
    /// Entry point as stored in the header
    pub entry_point: u64,
    /// Section table in file order
    pub sections: Vec<SectionDescriptor<'a>>,
}

/// Decodes raw image bytes into a [`ParsedImage`].
///
/// Implementations report the class they found and leave the class gate
/// to the loader. The returned image may borrow from both the parser and
/// the raw buffer.
pub trait ImageParser {
    fn parse<'a>(&'a self, raw: &'a [u8]) -> Result<ParsedImage<'a>, LoadError>;
}

impl<P: ImageParser + ?Sized> ImageParser for &P {
    fn parse<'a>(&'a self, raw: &'a [u8]) -> Result<ParsedImage<'a>, LoadError> {
        (**self).parse(raw)
    }
}
