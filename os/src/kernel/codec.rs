//! Bit-level packing of GDT and IDT entries.
//!
//! This is the only place that knows the CPU's on-wire layout. Both entry
//! kinds are plain 8-byte little-endian buffers; everything else in the kernel
//! deals with the decoded fields.
//!
//! GDT entry:
//!
//! Byte | Contents
//! -----|---------
//! 0-1  | limit 0..15
//! 2-4  | base 0..23
//! 5    | access byte
//! 6    | flags (high nibble) / limit 16..19 (low nibble)
//! 7    | base 24..31
//!
//! IDT gate:
//!
//! Byte | Contents
//! -----|---------
//! 0-1  | handler offset 0..15
//! 2-3  | code segment selector
//! 4    | reserved, zero
//! 5    | type / attributes
//! 6-7  | handler offset 16..31

/// Largest value a segment limit can hold (20 bits).
pub const LIMIT_MAX: u32 = 0xF_FFFF;

/// Largest value of the flags nibble.
pub const FLAGS_MAX: u8 = 0xF;

/// Size in bytes of one descriptor of either kind.
pub const ENTRY_SIZE: usize = 8;

/// One packed segment descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct GdtEntry([u8; ENTRY_SIZE]);

/// Semantic fields of a segment descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GdtFields {
    pub base: u32,
    pub limit: u32,
    pub access: u8,
    pub flags: u8,
}

/// One packed interrupt gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct IdtEntry([u8; ENTRY_SIZE]);

/// Semantic fields of an interrupt gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdtFields {
    pub offset: u32,
    pub selector: u16,
    pub attributes: u8,
}

/// Pack a segment descriptor. `limit` is truncated to 20 bits and `flags` to 4.
pub const fn encode_gdt(base: u32, limit: u32, access: u8, flags: u8) -> GdtEntry {
    let limit = limit & LIMIT_MAX;
    let flags = flags & FLAGS_MAX;
    GdtEntry([
        limit as u8,
        (limit >> 8) as u8,
        base as u8,
        (base >> 8) as u8,
        (base >> 16) as u8,
        access,
        (flags << 4) | ((limit >> 16) as u8 & 0x0F),
        (base >> 24) as u8,
    ])
}

/// Pack an interrupt gate.
pub const fn encode_idt(offset: u32, selector: u16, attributes: u8) -> IdtEntry {
    IdtEntry([
        offset as u8,
        (offset >> 8) as u8,
        selector as u8,
        (selector >> 8) as u8,
        0,
        attributes,
        (offset >> 16) as u8,
        (offset >> 24) as u8,
    ])
}

impl GdtEntry {
    /// The mandatory descriptor at index 0.
    pub const NULL: Self = Self([0; ENTRY_SIZE]);

    pub const fn from_bytes(bytes: [u8; ENTRY_SIZE]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; ENTRY_SIZE] {
        &self.0
    }

    pub const fn decode(&self) -> GdtFields {
        let b = &self.0;
        GdtFields {
            base: b[2] as u32 | (b[3] as u32) << 8 | (b[4] as u32) << 16 | (b[7] as u32) << 24,
            limit: b[0] as u32 | (b[1] as u32) << 8 | ((b[6] & 0x0F) as u32) << 16,
            access: b[5],
            flags: b[6] >> 4,
        }
    }

    pub const fn is_null(&self) -> bool {
        u64::from_le_bytes(self.0) == 0
    }
}

impl IdtEntry {
    /// A gate with the present bit clear.
    pub const MISSING: Self = Self([0; ENTRY_SIZE]);

    pub const fn from_bytes(bytes: [u8; ENTRY_SIZE]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; ENTRY_SIZE] {
        &self.0
    }

    pub const fn decode(&self) -> IdtFields {
        let b = &self.0;
        IdtFields {
            offset: b[0] as u32 | (b[1] as u32) << 8 | (b[6] as u32) << 16 | (b[7] as u32) << 24,
            selector: u16::from_le_bytes([b[2], b[3]]),
            attributes: b[5],
        }
    }
}

impl From<GdtFields> for GdtEntry {
    fn from(f: GdtFields) -> Self {
        encode_gdt(f.base, f.limit, f.access, f.flags)
    }
}

impl From<IdtFields> for IdtEntry {
    fn from(f: IdtFields) -> Self {
        encode_idt(f.offset, f.selector, f.attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x86_64::structures::gdt::DescriptorFlags;

    #[test]
    fn flat_kernel_code_segment_matches_known_layout() {
        let entry = encode_gdt(0, LIMIT_MAX, 0x9A, 0xC);
        assert_eq!(entry.as_bytes(), &[0xFF, 0xFF, 0x00, 0x00, 0x00, 0x9A, 0xCF, 0x00]);
    }

    #[test]
    fn agrees_with_x86_64_crate_descriptors() {
        // The x86_64 crate pre-sets the accessed bit, hence 0x9B / 0x93.
        let code = encode_gdt(0, LIMIT_MAX, 0x9B, 0xC);
        let data = encode_gdt(0, LIMIT_MAX, 0x93, 0xC);
        assert_eq!(code.as_bytes(), &DescriptorFlags::KERNEL_CODE32.bits().to_le_bytes());
        assert_eq!(data.as_bytes(), &DescriptorFlags::KERNEL_DATA.bits().to_le_bytes());
    }

    #[test]
    fn base_is_split_across_three_fields() {
        let entry = encode_gdt(0xDEAD_BEEF, 0, 0, 0);
        let b = entry.as_bytes();
        assert_eq!([b[2], b[3], b[4], b[7]], [0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn gdt_fields_survive_packing() {
        let cases = [
            (0, 0, 0, 0),
            (0xFFFF_FFFF, LIMIT_MAX, 0xFF, 0xF),
            (0x0012_3456, 0xA_BCDE, 0x92, 0x4),
            (0x8000_0001, 0x1_0000, 0xF2, 0x8),
        ];
        for (base, limit, access, flags) in cases {
            let fields = encode_gdt(base, limit, access, flags).decode();
            assert_eq!(fields, GdtFields { base, limit, access, flags });
        }
    }

    #[test]
    fn oversized_limit_and_flags_are_masked() {
        let fields = encode_gdt(0, 0xFFF0_0001, 0x9A, 0xF3).decode();
        assert_eq!(fields.limit, 0x0_0001);
        assert_eq!(fields.flags, 0x3);
    }

    #[test]
    fn interrupt_gate_matches_known_layout() {
        let entry = encode_idt(0x1234_5678, 0x08, 0x8E);
        assert_eq!(entry.as_bytes(), &[0x78, 0x56, 0x08, 0x00, 0x00, 0x8E, 0x34, 0x12]);
    }

    #[test]
    fn idt_fields_survive_packing() {
        let cases = [(0, 0, 0), (0xFFFF_FFFF, 0xFFFF, 0xFF), (0x0010_2040, 0x08, 0x8E)];
        for (offset, selector, attributes) in cases {
            let fields = encode_idt(offset, selector, attributes).decode();
            assert_eq!(fields, IdtFields { offset, selector, attributes });
            assert_eq!(IdtEntry::from(fields).as_bytes()[4], 0);
        }
    }

    #[test]
    fn null_descriptor_is_all_zero() {
        assert!(GdtEntry::NULL.is_null());
        assert!(GdtEntry::default().is_null());
        assert!(!encode_gdt(0, 0, 0x01, 0).is_null());
    }
}
