//! Interrupt Descriptor Table: every vector routed to one of two trampolines.
//!
//! There is no per-vector customisation at this stage. The table is filled in
//! two passes: every vector in `[0, vector_count)` first gets the generic
//! interrupt trampoline, then `[0, vector_count / 16)` is overwritten with the
//! exception trampoline. With 256 vectors that sends 0..16 to the exception
//! path, which is only an approximation of the CPU's 32 reserved exception
//! vectors; the split is kept as is.
//!
//! Requires the GDT: every gate names [`KERNEL_CODE_SELECTOR`].

pub mod handlers;
pub mod storage;

use bitflags::bitflags;
use x86_64::PrivilegeLevel;

use crate::kernel::codec::{encode_idt, IdtEntry};
use crate::kernel::gdt::KERNEL_CODE_SELECTOR;
use crate::kernel::table::{DescriptorLoader, DescriptorTable};

pub use handlers::{EntryPoints, ERROR_CODE_VECTORS};

/// Architectural number of IDT slots.
pub const IDT_ENTRIES: usize = 256;

pub type Idt = DescriptorTable<IdtEntry, IDT_ENTRIES>;

bitflags! {
    /// Type/attribute byte of a gate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GateAttributes: u8 {
        const TASK_GATE = 0x5;
        const INTERRUPT_GATE_16 = 0x6;
        const TRAP_GATE_16 = 0x7;
        const INTERRUPT_GATE_32 = 0xE;
        const TRAP_GATE_32 = 0xF;
        const DPL_0 = 1 << 5;
        const DPL_1 = 1 << 6;
        const PRESENT = 1 << 7;
    }
}

impl GateAttributes {
    /// Gate type nibble.
    pub const TYPE_MASK: u8 = 0x0F;

    pub const fn dpl(level: PrivilegeLevel) -> Self {
        Self::from_bits_retain((level as u8) << 5)
    }

    pub const fn is_present(self) -> bool {
        self.contains(Self::PRESENT)
    }
}

/// Present, ring 0, 32-bit interrupt gate (0x8E).
pub const KERNEL_INTERRUPT_GATE: GateAttributes = GateAttributes::PRESENT
    .union(GateAttributes::dpl(PrivilegeLevel::Ring0))
    .union(GateAttributes::INTERRUPT_GATE_32);

const _: () = assert!(KERNEL_INTERRUPT_GATE.bits() == 0x8E);

/// Point every vector in `vectors` at `handler`.
fn set_handlers(entries: &mut [IdtEntry], vectors: core::ops::Range<usize>, handler: u32) {
    for entry in &mut entries[vectors] {
        *entry = encode_idt(handler, KERNEL_CODE_SELECTOR.0, KERNEL_INTERRUPT_GATE.bits());
    }
}

/// Build the IDT.
///
/// `vector_count` larger than the table is clamped to [`IDT_ENTRIES`]; slots
/// at or beyond it stay non-present.
pub fn build_idt(generic_handler: u32, exception_handler: u32, vector_count: usize) -> Idt {
    let count = vector_count.min(IDT_ENTRIES);
    let mut entries = [IdtEntry::MISSING; IDT_ENTRIES];

    set_handlers(&mut entries, 0..count, generic_handler);
    set_handlers(&mut entries, 0..count / 16, exception_handler);

    DescriptorTable::new(entries)
}

/// Number of present gates in `idt`.
pub fn present_gates(idt: &Idt) -> usize {
    idt.iter()
        .filter(|e| GateAttributes::from_bits_retain(e.decode().attributes).is_present())
        .count()
}

/// Build the IDT into its static home and load it.
///
/// The table is built on the first call only; later calls reload that same
/// table and ignore `entry` and `vector_count`.
///
/// The GDT must already be installed: the gates reference its kernel code
/// segment.
pub fn init<L: DescriptorLoader>(entry: EntryPoints, vector_count: usize, loader: &L) -> &'static Idt {
    let idt = storage::IDT.call_once(|| build_idt(entry.interrupt, entry.exception, vector_count));

    log::info!("Attempting to setup the IDT");
    unsafe { loader.load_idt(idt.pointer()) };

    let ptr = idt.pointer();
    let count = present_gates(idt);
    log::debug!(
        "IDT at {:#010x}, limit {:#06x}; {} exception / {} interrupt gates",
        ptr.base,
        ptr.limit,
        count / 16,
        count - count / 16
    );
    idt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::gdt::{build_gdt, Access};

    const GENERIC: u32 = 0x0010_1000;
    const EXCEPTION: u32 = 0x0010_2000;

    fn offsets(idt: &Idt) -> Vec<u32> {
        idt.iter().map(|e| e.decode().offset).collect()
    }

    #[test]
    fn full_table_splits_at_one_sixteenth() {
        let idt = build_idt(GENERIC, EXCEPTION, 256);
        let offsets = offsets(&idt);
        assert_eq!(present_gates(&idt), 256);
        assert!(offsets[..16].iter().all(|&o| o == EXCEPTION));
        assert!(offsets[16..].iter().all(|&o| o == GENERIC));
    }

    #[test]
    fn populates_exactly_vector_count_entries() {
        let idt = build_idt(GENERIC, EXCEPTION, 48);
        assert_eq!(present_gates(&idt), 48);
        let offsets = offsets(&idt);
        assert!(offsets[..3].iter().all(|&o| o == EXCEPTION));
        assert!(offsets[3..48].iter().all(|&o| o == GENERIC));
        assert!(idt.iter().skip(48).all(|e| *e == IdtEntry::MISSING));
    }

    #[test]
    fn fewer_than_sixteen_vectors_get_no_exception_gates() {
        let idt = build_idt(GENERIC, EXCEPTION, 15);
        assert_eq!(present_gates(&idt), 15);
        assert!(offsets(&idt)[..15].iter().all(|&o| o == GENERIC));
    }

    #[test]
    fn present_gates_reflect_the_built_table() {
        for count in [0, 15, 48, 256] {
            assert_eq!(present_gates(&build_idt(GENERIC, EXCEPTION, count)), count);
        }
        assert_eq!(present_gates(&build_idt(GENERIC, EXCEPTION, 1000)), IDT_ENTRIES);
    }

    #[test]
    fn error_code_vectors_past_sixteen_use_the_generic_gate() {
        let offsets = offsets(&build_idt(GENERIC, EXCEPTION, 256));
        let generic: Vec<usize> = ERROR_CODE_VECTORS
            .iter()
            .copied()
            .filter(|&v| offsets[v] == GENERIC)
            .collect();
        assert_eq!(generic, [17, 21, 29, 30]);
    }

    #[test]
    fn zero_vectors_leave_table_empty() {
        let idt = build_idt(GENERIC, EXCEPTION, 0);
        assert_eq!(present_gates(&idt), 0);
    }

    #[test]
    fn oversized_count_is_clamped() {
        let idt = build_idt(GENERIC, EXCEPTION, 4096);
        assert_eq!(present_gates(&idt), IDT_ENTRIES);
        assert!(offsets(&idt)[..16].iter().all(|&o| o == EXCEPTION));
    }

    #[test]
    fn every_gate_is_a_ring0_interrupt_gate() {
        let idt = build_idt(GENERIC, EXCEPTION, 256);
        for entry in &idt {
            let f = entry.decode();
            assert_eq!(f.attributes, 0x8E);
            assert_eq!(f.attributes & GateAttributes::TYPE_MASK, GateAttributes::INTERRUPT_GATE_32.bits());
            assert_eq!(entry.as_bytes()[4], 0);
        }
    }

    #[test]
    fn gates_reference_a_present_code_segment() {
        let gdt = build_gdt();
        let idt = build_idt(GENERIC, EXCEPTION, 256);
        for entry in &idt {
            let selector = x86_64::structures::gdt::SegmentSelector(entry.decode().selector);
            let target = gdt.get(selector.index() as usize).expect("selector inside GDT");
            let access = Access::from_bits_retain(target.decode().access);
            assert!(access.contains(Access::PRESENT | Access::SEGMENT | Access::EXECUTABLE));
            assert_eq!(selector.rpl(), PrivilegeLevel::Ring0);
        }
    }
}
