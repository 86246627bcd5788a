//! Fixed-size descriptor tables and the installation handshake.

use core::mem::size_of;
use x86_64::structures::gdt::SegmentSelector;

/// A fixed-length, 8-byte aligned array of packed descriptors, laid out
/// exactly as the CPU reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(C, align(8))]
pub struct DescriptorTable<E, const N: usize> {
    entries: [E; N],
}

impl<E: Copy, const N: usize> DescriptorTable<E, N> {
    pub const fn new(entries: [E; N]) -> Self {
        Self { entries }
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    pub fn get(&self, index: usize) -> Option<&E> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[E; N] {
        &self.entries
    }

    pub fn iter(&self) -> core::slice::Iter<'_, E> {
        self.entries.iter()
    }

    /// Size of the table in bytes as handed to `lgdt`/`lidt`.
    pub const fn byte_len(&self) -> usize {
        N * size_of::<E>()
    }

    /// `(address, byte length)` pair for the installer.
    pub fn pointer(&self) -> TablePointer {
        TablePointer::new(self.entries.as_ptr() as usize, self.byte_len())
    }
}

impl<'a, E, const N: usize> IntoIterator for &'a DescriptorTable<E, N> {
    type Item = &'a E;
    type IntoIter = core::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Operand of `lgdt`/`lidt`: a table address plus its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TablePointer {
    /// Linear address of the first entry.
    pub base: usize,
    /// Size of the table **minus one** in bytes.
    pub limit: u16,
}

impl TablePointer {
    /// Build a pointer from a table address and its size in bytes.
    ///
    /// A descriptor table is at most 64 KiB, so `byte_len` must be in
    /// `1..=0x1_0000`; larger sizes saturate at the architectural maximum.
    pub const fn new(base: usize, byte_len: usize) -> Self {
        let limit = if byte_len == 0 {
            0
        } else if byte_len > 0x1_0000 {
            0xFFFF
        } else {
            (byte_len - 1) as u16
        };
        Self { base, limit }
    }

    pub const fn byte_len(&self) -> usize {
        self.limit as usize + 1
    }

    /// The 6-byte pseudo-descriptor protected mode loads: limit, then 32-bit base.
    pub const fn to_bytes(&self) -> [u8; 6] {
        let limit = self.limit.to_le_bytes();
        let base = (self.base as u32).to_le_bytes();
        [limit[0], limit[1], base[0], base[1], base[2], base[3]]
    }

    pub const fn from_bytes(bytes: [u8; 6]) -> Self {
        Self {
            limit: u16::from_le_bytes([bytes[0], bytes[1]]),
            base: u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]) as usize,
        }
    }
}

/// The privileged collaborator that makes a table live.
///
/// Installing is a fixed instruction sequence with no failure path: a wrong
/// pointer shows up as a CPU fault, not as an error value.
pub trait DescriptorLoader {
    /// Load GDTR, then reload CS with `code` and every data segment register
    /// with `data`.
    ///
    /// # Safety
    /// `gdt` must describe a valid table that stays mapped for the lifetime of
    /// the CPU, and both selectors must name present descriptors in it.
    unsafe fn load_gdt(&self, gdt: TablePointer, code: SegmentSelector, data: SegmentSelector);

    /// Load IDTR.
    ///
    /// # Safety
    /// `idt` must describe a valid table that stays mapped for the lifetime of
    /// the CPU, and every present gate must name a present code segment.
    unsafe fn load_idt(&self, idt: TablePointer);

    /// Current contents of GDTR.
    fn stored_gdt(&self) -> TablePointer;

    /// Current contents of IDTR.
    fn stored_idt(&self) -> TablePointer;
}
