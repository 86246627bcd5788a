//! Global Descriptor Table (GDT) subsystem
//!
//! Protected mode needs a GDT before anything else: every segment register,
//! and every IDT gate, refers to one of its entries through a selector.
//!
//! # Layout
//!
//! Index | Selector | Meaning
//! ------|----------|--------
//! 0     | 0x00     | Null
//! 1     | 0x08     | Kernel code (DPL=0, [`KERNEL_CODE_SELECTOR`])
//! 2     | 0x10     | Kernel data (DPL=0, [`KERNEL_DATA_SELECTOR`])
//! 3     | 0x18     | User code (DPL=3)
//! 4     | 0x20     | User data (DPL=3)
//!
//! Every non-null segment is flat: base 0, limit 0xFFFFF in 4 KiB pages,
//! 32-bit default operand size. That covers the full 4 GiB address space.

pub mod descriptor;

#[cfg(test)]
mod tests;

use bitflags::bitflags;
use x86_64::structures::gdt::SegmentSelector;
use x86_64::PrivilegeLevel;

pub use descriptor::{build_gdt, init, Gdt, GDT_ENTRIES};

bitflags! {
    /// The access byte of a segment descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Access: u8 {
        /// Set by the CPU on first use.
        const ACCESSED = 1 << 0;
        /// Readable (code) or writable (data).
        const READ_WRITE = 1 << 1;
        /// Conforming (code) or expand-down (data).
        const CONFORMING = 1 << 2;
        const EXECUTABLE = 1 << 3;
        /// Code/data segment rather than a system descriptor.
        const SEGMENT = 1 << 4;
        const DPL_0 = 1 << 5;
        const DPL_1 = 1 << 6;
        const PRESENT = 1 << 7;
    }
}

bitflags! {
    /// High nibble of the sixth descriptor byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SegmentFlags: u8 {
        const AVAILABLE = 1 << 0;
        const LONG_MODE = 1 << 1;
        /// 32-bit default operand size.
        const SIZE_32 = 1 << 2;
        /// Limit counts 4 KiB pages instead of bytes.
        const GRANULARITY_4K = 1 << 3;
    }
}

impl Access {
    /// Access bits carrying the given descriptor privilege level.
    pub const fn dpl(level: PrivilegeLevel) -> Self {
        Self::from_bits_retain((level as u8) << 5)
    }

    pub fn privilege_level(self) -> PrivilegeLevel {
        PrivilegeLevel::from_u16(((self.bits() >> 5) & 0b11) as u16)
    }

    pub const fn code(level: PrivilegeLevel) -> Self {
        Self::PRESENT
            .union(Self::SEGMENT)
            .union(Self::EXECUTABLE)
            .union(Self::READ_WRITE)
            .union(Self::dpl(level))
    }

    pub const fn data(level: PrivilegeLevel) -> Self {
        Self::PRESENT
            .union(Self::SEGMENT)
            .union(Self::READ_WRITE)
            .union(Self::dpl(level))
    }
}

/// Flag nibble of a flat 32-bit segment.
pub const FLAT_32: SegmentFlags = SegmentFlags::GRANULARITY_4K.union(SegmentFlags::SIZE_32);

pub const NULL_INDEX: u16 = 0;
pub const KERNEL_CODE_INDEX: u16 = 1;
pub const KERNEL_DATA_INDEX: u16 = 2;
pub const USER_CODE_INDEX: u16 = 3;
pub const USER_DATA_INDEX: u16 = 4;

pub const KERNEL_CODE_SELECTOR: SegmentSelector = SegmentSelector::new(KERNEL_CODE_INDEX, PrivilegeLevel::Ring0);
pub const KERNEL_DATA_SELECTOR: SegmentSelector = SegmentSelector::new(KERNEL_DATA_INDEX, PrivilegeLevel::Ring0);
pub const USER_CODE_SELECTOR: SegmentSelector = SegmentSelector::new(USER_CODE_INDEX, PrivilegeLevel::Ring3);
pub const USER_DATA_SELECTOR: SegmentSelector = SegmentSelector::new(USER_DATA_INDEX, PrivilegeLevel::Ring3);

const _: () = {
    assert!(KERNEL_CODE_SELECTOR.0 == 0x08);
    assert!(KERNEL_DATA_SELECTOR.0 == 0x10);
    assert!(USER_CODE_SELECTOR.0 == 0x1B);
    assert!(USER_DATA_SELECTOR.0 == 0x23);
    assert!(Access::code(PrivilegeLevel::Ring0).bits() == 0x9A);
    assert!(Access::data(PrivilegeLevel::Ring0).bits() == 0x92);
    assert!(Access::code(PrivilegeLevel::Ring3).bits() == 0xFA);
    assert!(Access::data(PrivilegeLevel::Ring3).bits() == 0xF2);
    assert!(FLAT_32.bits() == 0xC);
};
