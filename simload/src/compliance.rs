//! Compliance Test Loader
//!
//! Architecture compliance binaries talk to the simulator through a few
//! named sections: `tohost`/`fromhost` carry pass/fail status and the
//! signature region holds the result data compared against a reference.
//!
//! [`ComplianceLoader`] wraps an [`ElfLoader`] and, after a successful
//! load, runs two more stages while the decoded image is still alive:
//!
//! 1. RAM budget: every section (loaded or not) must end at or below the
//!    configured RAM size
//! 2. Symbol resolution: one pass over the section table, exact name match,
//!    last match wins
//!
//! A budget failure fails the whole call and leaves every address unresolved.

use core::fmt;
use core::ops::Range;
use std::path::PathBuf;

use crate::config::ComplianceConfig;
use crate::elf::GoblinParser;
use crate::error::LoadError;
use crate::image::{ImageParser, ParsedImage};
use crate::loader::{ElfLoader, LoadOutcome, Verbosity};
use crate::memory::MemoryTarget;

/// Host-interface sections a compliance binary may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostSymbol {
    ToHost,
    FromHost,
    SigBegin,
    SigEnd,
}

impl HostSymbol {
    pub const ALL: [HostSymbol; 4] = [Self::ToHost, Self::FromHost, Self::SigBegin, Self::SigEnd];
}

impl fmt::Display for HostSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToHost => write!(f, "tohost"),
            Self::FromHost => write!(f, "fromhost"),
            Self::SigBegin => write!(f, "sig_begin"),
            Self::SigEnd => write!(f, "sig_end"),
        }
    }
}

/// Resolved host-interface addresses.
///
/// Presence is tracked explicitly. [`address_of`](Self::address_of) still
/// reports 0 for an unresolved symbol, which existing harnesses treat as
/// "not found".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplianceAddresses {
    tohost: Option<u32>,
    fromhost: Option<u32>,
    sig_begin: Option<u32>,
    sig_end: Option<u32>,
}

impl ComplianceAddresses {
    /// Address of `symbol`, or `None` if no section matched.
    pub fn get(&self, symbol: HostSymbol) -> Option<u32> {
        *self.slot(symbol)
    }

    /// Address of `symbol`, or 0 if no section matched.
    pub fn address_of(&self, symbol: HostSymbol) -> u32 {
        self.get(symbol).unwrap_or(0)
    }

    pub fn set(&mut self, symbol: HostSymbol, address: u32) {
        *self.slot_mut(symbol) = Some(address);
    }

    /// Signature region `[begin, end)` when both bounds resolved in order.
    pub fn signature_range(&self) -> Option<Range<u32>> {
        match (self.sig_begin, self.sig_end) {
            (Some(begin), Some(end)) if begin <= end => Some(begin..end),
            _ => None,
        }
    }

    fn slot(&self, symbol: HostSymbol) -> &Option<u32> {
        match symbol {
            HostSymbol::ToHost => &self.tohost,
            HostSymbol::FromHost => &self.fromhost,
            HostSymbol::SigBegin => &self.sig_begin,
            HostSymbol::SigEnd => &self.sig_end,
        }
    }

    fn slot_mut(&mut self, symbol: HostSymbol) -> &mut Option<u32> {
        match symbol {
            HostSymbol::ToHost => &mut self.tohost,
            HostSymbol::FromHost => &mut self.fromhost,
            HostSymbol::SigBegin => &mut self.sig_begin,
            HostSymbol::SigEnd => &mut self.sig_end,
        }
    }
}

/// Fail if any section ends past `ram_max_addr`.
///
/// Every section is checked, including ones the loader never copies.
pub fn check_ram_budget(image: &ParsedImage<'_>, ram_max_addr: u32) -> Result<(), LoadError> {
    match image.sections.iter().find(|s| s.end() > u64::from(ram_max_addr)) {
        Some(section) => {
            log::error!(
                "[simload] Failed RAM size check: {} needs {:#x} bytes, got {:#x} bytes",
                section.name,
                section.end(),
                ram_max_addr
            );
            Err(LoadError::MemoryBudgetExceeded {
                section: section.name.to_owned(),
                required: section.end(),
                available: ram_max_addr,
            })
        }
        None => Ok(()),
    }
}

/// Match every section name against the configured identifiers.
pub fn resolve_addresses(
    image: &ParsedImage<'_>,
    config: &ComplianceConfig,
    verbosity: Verbosity,
) -> ComplianceAddresses {
    let mut addresses = ComplianceAddresses::default();

    for section in &image.sections {
        for symbol in HostSymbol::ALL {
            let name = config.name_of(symbol);
            if section.name != name {
                continue;
            }
            addresses.set(symbol, section.address);
            if verbosity >= Verbosity::Symbols {
                log::debug!(
                    "[simload] Found address of \"{}\" section: {:#x}",
                    name,
                    section.address
                );
            }
        }
    }

    addresses
}

/// Loads compliance test binaries and resolves their host-interface sections.
pub struct ComplianceLoader<'m, M: MemoryTarget + ?Sized, P: ImageParser = GoblinParser> {
    base: ElfLoader<'m, M, P>,
    config: ComplianceConfig,
    addresses: ComplianceAddresses,
}

impl<'m, M: MemoryTarget + ?Sized> ComplianceLoader<'m, M, GoblinParser> {
    pub fn new(memory: &'m mut M) -> Self {
        Self::with_config(memory, ComplianceConfig::default())
    }

    pub fn with_config(memory: &'m mut M, config: ComplianceConfig) -> Self {
        Self::with_parser(memory, GoblinParser::new(), config)
    }
}

impl<'m, M: MemoryTarget + ?Sized, P: ImageParser> ComplianceLoader<'m, M, P> {
    pub fn with_parser(memory: &'m mut M, parser: P, config: ComplianceConfig) -> Self {
        Self {
            base: ElfLoader::with_parser(PathBuf::new(), memory, parser),
            config,
            addresses: ComplianceAddresses::default(),
        }
    }

    /// Load `filename`, check it fits in `ram_max_addr` bytes of RAM and
    /// resolve the host-interface sections.
    ///
    /// Addresses are reset first and stay unresolved unless both the load
    /// and the RAM check succeed.
    pub fn load_data(
        &mut self,
        filename: impl Into<PathBuf>,
        ram_max_addr: u32,
        verbosity: Verbosity,
    ) -> Result<LoadOutcome, LoadError> {
        self.addresses = ComplianceAddresses::default();
        self.base.set_path(filename);

        let config = &self.config;
        let (outcome, addresses) = self.base.load_with(verbosity, |image| {
            check_ram_budget(image, ram_max_addr)?;
            Ok(resolve_addresses(image, config, verbosity))
        })?;

        self.addresses = addresses;
        Ok(outcome)
    }

    /// Last resolved address of `symbol`, 0 when unresolved.
    pub fn address_of(&self, symbol: HostSymbol) -> u32 {
        self.addresses.address_of(symbol)
    }

    pub fn addresses(&self) -> ComplianceAddresses {
        self.addresses
    }

    pub fn entry_point(&self) -> Option<u32> {
        self.base.entry_point()
    }

    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }

    pub fn loader(&self) -> &ElfLoader<'m, M, P> {
        &self.base
    }
}
