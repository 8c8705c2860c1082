//! ELF section table decoding
//!
//! Adapts `goblin` to the [`ImageParser`] seam. Only the section table
//! and the entry point are consumed; program headers, symbols and
//! relocations are ignored.

use goblin::elf::section_header::SectionHeader;
use goblin::elf::Elf;

use crate::error::LoadError;
use crate::image::{ImageClass, ImageParser, ParsedImage, SectionDescriptor, SectionFlags, SectionKind};

/// Default image parser backed by `goblin`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoblinParser;

impl GoblinParser {
    pub fn new() -> Self {
        Self
    }
}

impl ImageParser for GoblinParser {
    fn parse<'a>(&'a self, raw: &'a [u8]) -> Result<ParsedImage<'a>, LoadError> {
        let elf = Elf::parse(raw).map_err(|e| LoadError::parse(e.to_string()))?;

        let class = if elf.is_64 {
            ImageClass::Elf64
        } else {
            ImageClass::Elf32
        };

        // 64-bit tables may hold addresses we cannot represent; the loader
        // rejects the class anyway, so skip decoding them.
        let sections = match class {
            ImageClass::Elf32 => elf
                .section_headers
                .iter()
                .map(|sh| describe(&elf, sh, raw))
                .collect::<Result<Vec<_>, _>>()?,
            ImageClass::Elf64 => Vec::new(),
        };

        Ok(ParsedImage {
            class,
            entry_point: elf.entry,
            sections,
        })
    }
}

fn describe<'a>(
    elf: &Elf<'a>,
    sh: &SectionHeader,
    raw: &'a [u8],
) -> Result<SectionDescriptor<'a>, LoadError> {
    let name = elf.shdr_strtab.get_at(sh.sh_name).unwrap_or("");

    let address = u32::try_from(sh.sh_addr)
        .map_err(|_| LoadError::parse(format!("section {name}: address {:#x} exceeds 32 bits", sh.sh_addr)))?;
    let size = u32::try_from(sh.sh_size)
        .map_err(|_| LoadError::parse(format!("section {name}: size {:#x} exceeds 32 bits", sh.sh_size)))?;
    let flags = u32::try_from(sh.sh_flags)
        .map(SectionFlags::from_bits_retain)
        .map_err(|_| LoadError::parse(format!("section {name}: flags {:#x} exceed 32 bits", sh.sh_flags)))?;
    let kind = SectionKind::from(sh.sh_type);

    let data = match kind {
        SectionKind::ProgBits => payload(raw, sh.sh_offset, sh.sh_size)
            .ok_or_else(|| LoadError::parse(format!("section {name}: contents lie outside the file")))?,
        _ => &[],
    };

    Ok(SectionDescriptor {
        name,
        address,
        size,
        flags,
        kind,
        data,
    })
}

fn payload(raw: &[u8], offset: u64, size: u64) -> Option<&[u8]> {
    let start = usize::try_from(offset).ok()?;
    let end = start.checked_add(usize::try_from(size).ok()?)?;
    raw.get(start..end)
}
