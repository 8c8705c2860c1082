//! Shared helpers for the integration tests: an in-memory ELF image
//! builder and instrumented memory targets.

#![allow(dead_code)]

use std::path::PathBuf;

use simload::{
    ImageClass, ImageParser, LoadError, MemoryTarget, ParsedImage, Ram, SectionDescriptor, SectionFlags,
    SectionKind,
};
use tempfile::TempDir;

pub const SHT_PROGBITS: u32 = 1;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_NOBITS: u32 = 8;

pub const SHF_WRITE: u32 = 0x1;
pub const SHF_ALLOC: u32 = 0x2;
pub const SHF_EXECINSTR: u32 = 0x4;

/// Machine type: RISC-V
const EM_RISCV: u16 = 0xF3;

struct Section {
    name: String,
    sh_type: u32,
    flags: u32,
    address: u32,
    size: u32,
    data: Vec<u8>,
}

/// Builds minimal but well-formed ELF images: header, section payloads,
/// `.shstrtab`, then the section header table. No program headers.
pub struct ElfBuilder {
    is_64: bool,
    entry: u32,
    sections: Vec<Section>,
}

impl ElfBuilder {
    pub fn new() -> Self {
        Self {
            is_64: false,
            entry: 0x1000,
            sections: Vec::new(),
        }
    }

    pub fn elf64(mut self) -> Self {
        self.is_64 = true;
        self
    }

    pub fn entry(mut self, entry: u32) -> Self {
        self.entry = entry;
        self
    }

    /// ALLOC + EXECINSTR PROGBITS section.
    pub fn text(self, name: &str, address: u32, data: &[u8]) -> Self {
        self.section(name, SHT_PROGBITS, SHF_ALLOC | SHF_EXECINSTR, address, data)
    }

    /// ALLOC + WRITE NOBITS section.
    pub fn bss(mut self, name: &str, address: u32, size: u32) -> Self {
        self.sections.push(Section {
            name: name.to_owned(),
            sh_type: SHT_NOBITS,
            flags: SHF_ALLOC | SHF_WRITE,
            address,
            size,
            data: Vec::new(),
        });
        self
    }

    pub fn section(mut self, name: &str, sh_type: u32, flags: u32, address: u32, data: &[u8]) -> Self {
        self.sections.push(Section {
            name: name.to_owned(),
            sh_type,
            flags,
            address,
            size: data.len() as u32,
            data: data.to_vec(),
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let ehsize: usize = if self.is_64 { 64 } else { 52 };
        let shentsize: usize = if self.is_64 { 64 } else { 40 };

        // Section name string table
        let mut shstrtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for section in &self.sections {
            name_offsets.push(shstrtab.len() as u32);
            shstrtab.extend_from_slice(section.name.as_bytes());
            shstrtab.push(0);
        }
        let shstrtab_name = shstrtab.len() as u32;
        shstrtab.extend_from_slice(b".shstrtab\0");

        let mut out = vec![0u8; ehsize];

        let mut file_offsets = Vec::new();
        for section in &self.sections {
            file_offsets.push(out.len() as u64);
            if section.sh_type != SHT_NOBITS {
                out.extend_from_slice(&section.data);
            }
        }

        let shstrtab_offset = out.len() as u64;
        out.extend_from_slice(&shstrtab);
        while out.len() % 8 != 0 {
            out.push(0);
        }

        let shoff = out.len() as u64;
        let shnum = self.sections.len() + 2;
        let shstrndx = shnum - 1;

        // Null section header
        out.extend(std::iter::repeat(0u8).take(shentsize));
        for (i, section) in self.sections.iter().enumerate() {
            self.push_shdr(
                &mut out,
                name_offsets[i],
                section.sh_type,
                section.flags,
                section.address,
                file_offsets[i],
                section.size,
            );
        }
        self.push_shdr(&mut out, shstrtab_name, SHT_STRTAB, 0, 0, shstrtab_offset, shstrtab.len() as u32);

        // ELF header
        out[0..4].copy_from_slice(&[0x7F, b'E', b'L', b'F']);
        out[4] = if self.is_64 { 2 } else { 1 }; // class
        out[5] = 1; // little endian
        out[6] = 1; // ELF version
        out[16..18].copy_from_slice(&2u16.to_le_bytes()); // ET_EXEC
        out[18..20].copy_from_slice(&EM_RISCV.to_le_bytes());
        out[20..24].copy_from_slice(&1u32.to_le_bytes());
        if self.is_64 {
            out[24..32].copy_from_slice(&u64::from(self.entry).to_le_bytes());
            out[32..40].copy_from_slice(&0u64.to_le_bytes()); // e_phoff
            out[40..48].copy_from_slice(&shoff.to_le_bytes());
            out[52..54].copy_from_slice(&(ehsize as u16).to_le_bytes());
            out[54..56].copy_from_slice(&56u16.to_le_bytes());
            out[56..58].copy_from_slice(&0u16.to_le_bytes());
            out[58..60].copy_from_slice(&(shentsize as u16).to_le_bytes());
            out[60..62].copy_from_slice(&(shnum as u16).to_le_bytes());
            out[62..64].copy_from_slice(&(shstrndx as u16).to_le_bytes());
        } else {
            out[24..28].copy_from_slice(&self.entry.to_le_bytes());
            out[28..32].copy_from_slice(&0u32.to_le_bytes()); // e_phoff
            out[32..36].copy_from_slice(&(shoff as u32).to_le_bytes());
            out[40..42].copy_from_slice(&(ehsize as u16).to_le_bytes());
            out[42..44].copy_from_slice(&32u16.to_le_bytes());
            out[44..46].copy_from_slice(&0u16.to_le_bytes());
            out[46..48].copy_from_slice(&(shentsize as u16).to_le_bytes());
            out[48..50].copy_from_slice(&(shnum as u16).to_le_bytes());
            out[50..52].copy_from_slice(&(shstrndx as u16).to_le_bytes());
        }

        out
    }

    #[allow(clippy::too_many_arguments)]
    fn push_shdr(&self, out: &mut Vec<u8>, name: u32, sh_type: u32, flags: u32, addr: u32, offset: u64, size: u32) {
        out.extend_from_slice(&name.to_le_bytes());
        out.extend_from_slice(&sh_type.to_le_bytes());
        if self.is_64 {
            out.extend_from_slice(&u64::from(flags).to_le_bytes());
            out.extend_from_slice(&u64::from(addr).to_le_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&u64::from(size).to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes()); // sh_link
            out.extend_from_slice(&0u32.to_le_bytes()); // sh_info
            out.extend_from_slice(&1u64.to_le_bytes()); // sh_addralign
            out.extend_from_slice(&0u64.to_le_bytes()); // sh_entsize
        } else {
            out.extend_from_slice(&flags.to_le_bytes());
            out.extend_from_slice(&addr.to_le_bytes());
            out.extend_from_slice(&(offset as u32).to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes()); // sh_link
            out.extend_from_slice(&0u32.to_le_bytes()); // sh_info
            out.extend_from_slice(&1u32.to_le_bytes()); // sh_addralign
            out.extend_from_slice(&0u32.to_le_bytes()); // sh_entsize
        }
    }

    /// Write the image into `dir` and return its path.
    pub fn write_to(&self, dir: &TempDir, file_name: &str) -> PathBuf {
        let path = dir.path().join(file_name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

/// RAM that records every write and can corrupt reads at one address.
pub struct RecordingMemory {
    pub ram: Ram,
    pub writes: Vec<(u32, u8)>,
    pub faulty: Option<u32>,
}

impl RecordingMemory {
    pub fn new(size: usize) -> Self {
        Self {
            ram: Ram::new(size),
            writes: Vec::new(),
            faulty: None,
        }
    }

    /// Reads at `address` return the complement of the stored byte.
    pub fn with_fault_at(size: usize, address: u32) -> Self {
        Self {
            faulty: Some(address),
            ..Self::new(size)
        }
    }

    pub fn was_written(&self, address: u32) -> bool {
        self.writes.iter().any(|&(a, _)| a == address)
    }
}

impl MemoryTarget for RecordingMemory {
    fn write_byte(&mut self, address: u32, value: u8) {
        self.writes.push((address, value));
        self.ram.write_byte(address, value);
    }

    fn read_byte(&self, address: u32) -> u8 {
        let value = self.ram.read_byte(address);
        if self.faulty == Some(address) {
            !value
        } else {
            value
        }
    }
}

/// One entry of a [`TableParser`] section table.
pub struct TableSection {
    pub name: String,
    pub address: u32,
    pub size: u32,
    pub flags: SectionFlags,
    pub kind: SectionKind,
    pub data: Vec<u8>,
}

impl TableSection {
    /// ALLOC PROGBITS section whose size matches its payload.
    pub fn progbits(name: &str, address: u32, data: &[u8]) -> Self {
        Self {
            name: name.to_owned(),
            address,
            size: data.len() as u32,
            flags: SectionFlags::ALLOC,
            kind: SectionKind::ProgBits,
            data: data.to_vec(),
        }
    }
}

/// Parser that ignores the file contents and hands out a fixed table.
pub struct TableParser {
    pub class: ImageClass,
    pub entry_point: u64,
    pub sections: Vec<TableSection>,
}

impl TableParser {
    pub fn new(entry_point: u64, sections: Vec<TableSection>) -> Self {
        Self {
            class: ImageClass::Elf32,
            entry_point,
            sections,
        }
    }
}

impl ImageParser for TableParser {
    fn parse<'a>(&'a self, _raw: &'a [u8]) -> Result<ParsedImage<'a>, LoadError> {
        Ok(ParsedImage {
            class: self.class,
            entry_point: self.entry_point,
            sections: self
                .sections
                .iter()
                .map(|s| SectionDescriptor {
                    name: &s.name,
                    address: s.address,
                    size: s.size,
                    flags: s.flags,
                    kind: s.kind,
                    data: &s.data,
                })
                .collect(),
        })
    }
}

/// Any existing file will do for loaders driven by a [`TableParser`].
pub fn placeholder_image(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("placeholder.bin");
    std::fs::write(&path, b"not decoded").unwrap();
    path
}
