//! 32-bit protected-mode installer: `lgdt`/`lidt` and segment reloads.

use core::arch::asm;
use x86_64::structures::gdt::SegmentSelector;

use crate::kernel::table::{DescriptorLoader, TablePointer};

/// Loads descriptor tables into the running CPU.
pub struct CpuLoader;

impl DescriptorLoader for CpuLoader {
    unsafe fn load_gdt(&self, gdt: TablePointer, code: SegmentSelector, data: SegmentSelector) {
        let pseudo = gdt.to_bytes();
        asm!(
            "lgdt [{ptr}]",
            // Far return to reload CS with the new code selector.
            "push {code}",
            "lea {tmp}, [2f]",
            "push {tmp}",
            "retf",
            "2:",
            "mov ds, {data:x}",
            "mov es, {data:x}",
            "mov fs, {data:x}",
            "mov gs, {data:x}",
            "mov ss, {data:x}",
            ptr = in(reg) pseudo.as_ptr(),
            code = in(reg) u32::from(code.0),
            data = in(reg) data.0,
            tmp = out(reg) _,
            options(preserves_flags),
        );
    }

    unsafe fn load_idt(&self, idt: TablePointer) {
        let pseudo = idt.to_bytes();
        asm!("lidt [{}]", in(reg) pseudo.as_ptr(), options(readonly, nostack, preserves_flags));
    }

    fn stored_gdt(&self) -> TablePointer {
        let mut pseudo = [0u8; 6];
        unsafe {
            asm!("sgdt [{}]", in(reg) pseudo.as_mut_ptr(), options(nostack, preserves_flags));
        }
        TablePointer::from_bytes(pseudo)
    }

    fn stored_idt(&self) -> TablePointer {
        let mut pseudo = [0u8; 6];
        unsafe {
            asm!("sidt [{}]", in(reg) pseudo.as_mut_ptr(), options(nostack, preserves_flags));
        }
        TablePointer::from_bytes(pseudo)
    }
}
