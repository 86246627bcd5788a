//! Typed, read-only view over the raw boot information block.

use core::ffi::CStr;
use core::fmt;

use super::{BootError, InfoFlags};

/// Bytes of the info block the view covers (through `apm_table`).
pub const INFO_SIZE: usize = 72;

/// Size of one memory-map record as counted by the boot report: a 4-byte
/// `size` prefix plus a 20-byte body.
pub const MMAP_ENTRY_SIZE: usize = 24;

const OFF_FLAGS: usize = 0;
const OFF_MEM_LOWER: usize = 4;
const OFF_MEM_UPPER: usize = 8;
const OFF_BOOT_DEVICE: usize = 12;
const OFF_CMDLINE: usize = 16;
const OFF_MODS_COUNT: usize = 20;
const OFF_MODS_ADDR: usize = 24;
const OFF_SYMS: usize = 28;
const OFF_MMAP_LENGTH: usize = 44;
const OFF_MMAP_ADDR: usize = 48;
const OFF_BOOT_LOADER_NAME: usize = 64;

/// Stand-in block used when the loader passed a null address.
static EMPTY_INFO: [u8; INFO_SIZE] = [0; INFO_SIZE];

#[derive(Clone, Copy)]
pub struct BootInfo<'a> {
    raw: &'a [u8; INFO_SIZE],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySizes {
    /// Conventional memory below 1 MiB, in KiB.
    pub lower_kib: u32,
    /// Memory above 1 MiB, in KiB.
    pub upper_kib: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleList {
    pub count: u32,
    pub address: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AOutSymbols {
    pub tabsize: u32,
    pub strsize: u32,
    pub address: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfSections {
    pub num: u32,
    pub size: u32,
    pub address: u32,
    pub shndx: u32,
}

/// The symbol union, resolved by flag bits 4 and 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbols {
    AOut(AOutSymbols),
    Elf(ElfSections),
}

/// Location of the BIOS memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryMapRegion {
    pub address: u32,
    /// Length in bytes.
    pub length: u32,
}

impl MemoryMapRegion {
    /// Number of records, assuming every record is [`MMAP_ENTRY_SIZE`] bytes.
    pub const fn entry_count(&self) -> usize {
        self.length as usize / MMAP_ENTRY_SIZE
    }
}

#[inline]
fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

#[inline]
fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    u64::from(read_u32(bytes, offset)) | u64::from(read_u32(bytes, offset + 4)) << 32
}

impl<'a> BootInfo<'a> {
    pub const fn from_bytes(raw: &'a [u8; INFO_SIZE]) -> Self {
        Self { raw }
    }

    /// Map the block the loader handed over.
    ///
    /// # Safety
    /// A non-null `address` must point to [`INFO_SIZE`] readable bytes that
    /// live for `'a`.
    pub unsafe fn from_address(address: usize) -> Self {
        if address == 0 {
            return BootInfo::from_bytes(&EMPTY_INFO);
        }
        Self::from_bytes(&*(address as *const [u8; INFO_SIZE]))
    }

    fn field(&self, offset: usize) -> u32 {
        read_u32(self.raw, offset)
    }

    fn has(&self, flag: InfoFlags) -> bool {
        self.flags().contains(flag)
    }

    pub fn raw_flags(&self) -> u32 {
        self.field(OFF_FLAGS)
    }

    pub fn flags(&self) -> InfoFlags {
        InfoFlags::from_bits_retain(self.raw_flags())
    }

    pub fn memory(&self) -> Option<MemorySizes> {
        self.has(InfoFlags::MEMORY).then(|| MemorySizes {
            lower_kib: self.field(OFF_MEM_LOWER),
            upper_kib: self.field(OFF_MEM_UPPER),
        })
    }

    /// BIOS boot device: drive, then three partition levels (0xFF = unused).
    pub fn boot_device(&self) -> Option<[u8; 4]> {
        self.has(InfoFlags::BOOT_DEVICE).then(|| {
            let [part3, part2, part1, drive] = self.field(OFF_BOOT_DEVICE).to_le_bytes();
            [drive, part1, part2, part3]
        })
    }

    pub fn cmdline_address(&self) -> Option<u32> {
        self.has(InfoFlags::CMDLINE).then(|| self.field(OFF_CMDLINE))
    }

    /// The kernel command line.
    ///
    /// # Safety
    /// The loader's `cmdline` pointer must reference a NUL-terminated string
    /// that stays mapped.
    pub unsafe fn cmdline(&self) -> Option<&'static CStr> {
        self.cmdline_address().and_then(|addr| c_str_at(addr))
    }

    pub fn modules(&self) -> Option<ModuleList> {
        self.has(InfoFlags::MODULES).then(|| ModuleList {
            count: self.field(OFF_MODS_COUNT),
            address: self.field(OFF_MODS_ADDR),
        })
    }

    /// Resolve the symbol union.
    ///
    /// Both bits set is an inconsistency; in that case neither variant is
    /// decoded.
    pub fn symbols(&self) -> Result<Option<Symbols>, BootError> {
        let aout = self.has(InfoFlags::AOUT_SYMBOLS);
        let elf = self.has(InfoFlags::ELF_SECTIONS);
        let s = |i: usize| self.field(OFF_SYMS + 4 * i);

        match (aout, elf) {
            (true, true) => Err(BootError::ConflictingSymbolTables { flags: self.raw_flags() }),
            (true, false) => Ok(Some(Symbols::AOut(AOutSymbols {
                tabsize: s(0),
                strsize: s(1),
                address: s(2),
            }))),
            (false, true) => Ok(Some(Symbols::Elf(ElfSections {
                num: s(0),
                size: s(1),
                address: s(2),
                shndx: s(3),
            }))),
            (false, false) => Ok(None),
        }
    }

    pub fn memory_map_region(&self) -> Option<MemoryMapRegion> {
        self.has(InfoFlags::MEMORY_MAP).then(|| MemoryMapRegion {
            address: self.field(OFF_MMAP_ADDR),
            length: self.field(OFF_MMAP_LENGTH),
        })
    }

    /// The BIOS memory map.
    ///
    /// # Safety
    /// `mmap_addr` must point to `mmap_length` readable bytes that stay mapped.
    pub unsafe fn memory_map(&self) -> Option<MemoryMap<'static>> {
        let region = self.memory_map_region()?;
        if region.address == 0 || region.length == 0 {
            return Some(MemoryMap::new(&[]));
        }
        let bytes = core::slice::from_raw_parts(region.address as usize as *const u8, region.length as usize);
        Some(MemoryMap::new(bytes))
    }

    pub fn boot_loader_name_address(&self) -> Option<u32> {
        self.has(InfoFlags::BOOT_LOADER_NAME)
            .then(|| self.field(OFF_BOOT_LOADER_NAME))
    }

    /// Name the loader gave itself.
    ///
    /// # Safety
    /// The pointer must reference a NUL-terminated string that stays mapped.
    pub unsafe fn boot_loader_name(&self) -> Option<&'static CStr> {
        self.boot_loader_name_address().and_then(|addr| c_str_at(addr))
    }
}

unsafe fn c_str_at(address: u32) -> Option<&'static CStr> {
    if address == 0 {
        return None;
    }
    Some(CStr::from_ptr(address as usize as *const core::ffi::c_char))
}

impl fmt::Debug for BootInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootInfo")
            .field("flags", &self.flags())
            .field("memory", &self.memory())
            .field("cmdline", &self.cmdline_address())
            .field("symbols", &self.symbols())
            .field("memory_map", &self.memory_map_region())
            .finish()
    }
}

/// Kind of a memory-map region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Available,
    Reserved,
    AcpiReclaimable,
    AcpiNvs,
    BadMemory,
    Other(u32),
}

impl From<u32> for RegionKind {
    fn from(value: u32) -> Self {
        match value {
            1 => Self::Available,
            2 => Self::Reserved,
            3 => Self::AcpiReclaimable,
            4 => Self::AcpiNvs,
            5 => Self::BadMemory,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => f.write_str("available"),
            Self::Reserved => f.write_str("reserved"),
            Self::AcpiReclaimable => f.write_str("ACPI reclaimable"),
            Self::AcpiNvs => f.write_str("ACPI NVS"),
            Self::BadMemory => f.write_str("bad"),
            Self::Other(n) => write!(f, "type {n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    pub base: u64,
    pub length: u64,
    pub kind: RegionKind,
}

/// Iterator over memory-map records.
///
/// Each record starts with a `size` field that does not count itself; the
/// walk advances by `size + 4` and stops at the first record that does not
/// fit in the remaining bytes.
#[derive(Debug, Clone)]
pub struct MemoryMap<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> MemoryMap<'a> {
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }
}

impl Iterator for MemoryMap<'_> {
    type Item = MemoryRegion;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.bytes.get(self.offset..)?;
        if rest.len() < MMAP_ENTRY_SIZE {
            return None;
        }
        let size = read_u32(rest, 0);
        // A record shorter than its fixed body is garbage; stop the walk.
        if (size as usize) < MMAP_ENTRY_SIZE - 4 {
            self.offset = self.bytes.len();
            return None;
        }
        let region = MemoryRegion {
            base: read_u64(rest, 4),
            length: read_u64(rest, 12),
            kind: RegionKind::from(read_u32(rest, 20)),
        };
        // The advance is computed in the 32-bit domain of the field so that
        // an oversized `size` ends the walk instead of wrapping back.
        self.offset = size
            .checked_add(4)
            .and_then(|advance| self.offset.checked_add(advance as usize))
            .unwrap_or(self.bytes.len());
        Some(region)
    }
}
