//! Simulated memory seam
//!
//! The loader talks to simulator memory one byte at a time. Writes report
//! nothing; a failed write is only visible as a mismatched read.

/// Byte-addressable simulator memory.
pub trait MemoryTarget {
    fn write_byte(&mut self, address: u32, value: u8);

    fn read_byte(&self, address: u32) -> u8;

    /// Little-endian word assembled from four byte reads.
    fn read_word_le(&self, address: u32) -> u32 {
        let mut bytes = [0u8; 4];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.read_byte(address.wrapping_add(i as u32));
        }
        u32::from_le_bytes(bytes)
    }
}

impl<T: MemoryTarget + ?Sized> MemoryTarget for &mut T {
    fn write_byte(&mut self, address: u32, value: u8) {
        (**self).write_byte(address, value)
    }

    fn read_byte(&self, address: u32) -> u8 {
        (**self).read_byte(address)
    }
}

impl<T: MemoryTarget + ?Sized> MemoryTarget for Box<T> {
    fn write_byte(&mut self, address: u32, value: u8) {
        (**self).write_byte(address, value)
    }

    fn read_byte(&self, address: u32) -> u8 {
        (**self).read_byte(address)
    }
}

/// Flat RAM starting at address 0.
///
/// Out-of-range writes are dropped and out-of-range reads return 0, so an
/// image placed outside the array fails read-back verification instead of
/// panicking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ram {
    mem: Vec<u8>,
}

impl Ram {
    pub fn new(size: usize) -> Self {
        Self { mem: vec![0; size] }
    }

    pub fn size(&self) -> usize {
        self.mem.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.mem
    }
}

impl MemoryTarget for Ram {
    fn write_byte(&mut self, address: u32, value: u8) {
        if let Some(byte) = self.mem.get_mut(address as usize) {
            *byte = value;
        }
    }

    fn read_byte(&self, address: u32) -> u8 {
        self.mem.get(address as usize).copied().unwrap_or(0)
    }
}
