//! Signature dump
//!
//! After a compliance run the simulator writes the signature region out as
//! text, one little-endian 32-bit word per line in 8 lowercase hex digits,
//! for comparison against the reference signature.

use core::ops::Range;
use std::io::Write;

use crate::compliance::ComplianceAddresses;
use crate::error::LoadError;
use crate::memory::MemoryTarget;

/// Read the words covering `range`. A trailing partial word is read whole.
pub fn read_signature<M: MemoryTarget + ?Sized>(memory: &M, range: Range<u32>) -> Vec<u32> {
    (range.start..range.end)
        .step_by(4)
        .map(|address| memory.read_word_le(address))
        .collect()
}

pub fn write_signature<W: Write>(words: &[u32], mut out: W) -> Result<(), LoadError> {
    for word in words {
        writeln!(out, "{word:08x}")?;
    }
    out.flush()?;
    Ok(())
}

/// Dump the resolved signature region of `memory` to `out`.
pub fn dump_signature<M: MemoryTarget + ?Sized, W: Write>(
    memory: &M,
    addresses: &ComplianceAddresses,
    out: W,
) -> Result<usize, LoadError> {
    let range = addresses.signature_range().ok_or(LoadError::SignatureUnavailable)?;
    let words = read_signature(memory, range);
    write_signature(&words, out)?;
    Ok(words.len())
}
