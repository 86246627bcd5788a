//! Multiboot (0.6.96) hand-off: header constants, magic check and a read-only
//! view of the boot information block.
//!
//! The loader leaves the magic in EAX and the info block address in EBX. The
//! address is treated as an opaque capability: only fields whose presence bit
//! is set are ever read, and a bad magic never stops the boot.

mod info;
mod report;


use bitflags::bitflags;

pub use info::{
    AOutSymbols, BootInfo, ElfSections, MemoryMap, MemoryMapRegion, MemoryRegion, MemorySizes, ModuleList,
    RegionKind, Symbols, INFO_SIZE, MMAP_ENTRY_SIZE,
};
pub use report::report;

/// Value a compliant loader leaves in EAX.
pub const BOOTLOADER_MAGIC: u32 = 0x2BAD_B002;

/// Magic of the header embedded in the kernel image.
pub const HEADER_MAGIC: u32 = 0x1BAD_B002;

bitflags! {
    /// Requests the kernel makes in its multiboot header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HeaderFlags: u32 {
        /// Align boot modules on 4 KiB boundaries.
        const PAGE_ALIGN = 1 << 0;
        /// Provide mem_* and mmap_* fields.
        const MEMORY_INFO = 1 << 1;
        const VIDEO_MODE = 1 << 2;
        const AOUT_KLUDGE = 1 << 16;
    }
}

/// Header flags requested by this kernel.
pub const HEADER_FLAGS: HeaderFlags = HeaderFlags::PAGE_ALIGN.union(HeaderFlags::MEMORY_INFO);

/// Header checksum: magic + flags + checksum must be zero (mod 2^32).
pub const HEADER_CHECKSUM: u32 = 0u32.wrapping_sub(HEADER_MAGIC.wrapping_add(HEADER_FLAGS.bits()));

bitflags! {
    /// Presence bits of the boot information block.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InfoFlags: u32 {
        const MEMORY = 1 << 0;
        const BOOT_DEVICE = 1 << 1;
        const CMDLINE = 1 << 2;
        const MODULES = 1 << 3;
        /// a.out symbol table; exclusive with `ELF_SECTIONS`.
        const AOUT_SYMBOLS = 1 << 4;
        /// ELF section header table; exclusive with `AOUT_SYMBOLS`.
        const ELF_SECTIONS = 1 << 5;
        const MEMORY_MAP = 1 << 6;
        const DRIVES = 1 << 7;
        const CONFIG_TABLE = 1 << 8;
        const BOOT_LOADER_NAME = 1 << 9;
        const APM_TABLE = 1 << 10;
        const VBE = 1 << 11;
    }
}

/// Inconsistencies found in the hand-off. Reported, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BootError {
    #[error("multiboot magic: {expected:#010x}, saw magic: {found:#010x}")]
    InvalidMagic { expected: u32, found: u32 },

    #[error("flags {flags:#x}: a.out and ELF symbol information are mutually exclusive")]
    ConflictingSymbolTables { flags: u32 },
}

/// Where the hand-off came from, as far as the magic tells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Multiboot,
    InvalidMagic { found: u32 },
}

impl Provenance {
    pub const fn classify(magic: u32) -> Self {
        if magic == BOOTLOADER_MAGIC {
            Self::Multiboot
        } else {
            Self::InvalidMagic { found: magic }
        }
    }
}

/// Result of checking the hand-off: a classification plus a best-effort view.
#[derive(Debug, Clone, Copy)]
pub struct Validation<'a> {
    pub provenance: Provenance,
    pub info: BootInfo<'a>,
}

impl<'a> Validation<'a> {
    pub const fn new(magic: u32, info: BootInfo<'a>) -> Self {
        Self {
            provenance: Provenance::classify(magic),
            info,
        }
    }

    pub const fn is_valid(&self) -> bool {
        matches!(self.provenance, Provenance::Multiboot)
    }

    /// The provenance check as an error, for callers that want `?`.
    pub const fn check(&self) -> Result<(), BootError> {
        match self.provenance {
            Provenance::Multiboot => Ok(()),
            Provenance::InvalidMagic { found } => Err(BootError::InvalidMagic {
                expected: BOOTLOADER_MAGIC,
                found,
            }),
        }
    }
}

/// Classify the hand-off and map the info block.
///
/// Never fails: with a bad magic the view is still returned so diagnostics can
/// go on. A null `info_address` yields an empty view (no flags set).
///
/// # Safety
/// A non-null `info_address` must point to [`INFO_SIZE`] readable bytes that
/// stay valid for the rest of the kernel's life.
pub unsafe fn validate(magic: u32, info_address: usize) -> Validation<'static> {
    Validation::new(magic, BootInfo::from_address(info_address))
}
