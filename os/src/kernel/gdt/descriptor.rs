//! GDT descriptor table management
//!
//! This module builds and loads the Global Descriptor Table.

use spin::Once;
use x86_64::PrivilegeLevel;

use super::{Access, FLAT_32, KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR, USER_CODE_SELECTOR, USER_DATA_SELECTOR};
use crate::kernel::codec::{encode_gdt, GdtEntry, LIMIT_MAX};
use crate::kernel::table::{DescriptorLoader, DescriptorTable};

/// Number of descriptors in the GDT (null + 4 flat segments).
pub const GDT_ENTRIES: usize = 5;

pub type Gdt = DescriptorTable<GdtEntry, GDT_ENTRIES>;

/// Global GDT instance
///
/// Written once by [`init`], read by the CPU from then on.
static GDT: Once<Gdt> = Once::new();

const fn flat_segment(access: Access) -> GdtEntry {
    encode_gdt(0, LIMIT_MAX, access.bits(), FLAT_32.bits())
}

/// Build the flat-model GDT: null, kernel code/data, user code/data.
pub const fn build_gdt() -> Gdt {
    DescriptorTable::new([
        GdtEntry::NULL,
        flat_segment(Access::code(PrivilegeLevel::Ring0)),
        flat_segment(Access::data(PrivilegeLevel::Ring0)),
        flat_segment(Access::code(PrivilegeLevel::Ring3)),
        flat_segment(Access::data(PrivilegeLevel::Ring3)),
    ])
}

/// Initialize and load GDT
///
/// Builds the table into its static home on first call, then hands its
/// pointer to `loader`, which loads GDTR and reloads the segment registers.
/// Must run before the IDT is installed.
pub fn init<L: DescriptorLoader>(loader: &L) -> &'static Gdt {
    let gdt = GDT.call_once(build_gdt);

    log::info!("Attempting to setup the GDT");
    unsafe { loader.load_gdt(gdt.pointer(), KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR) };

    log_gdt_info(gdt);
    gdt
}

/// Log GDT configuration
fn log_gdt_info(gdt: &Gdt) {
    let ptr = gdt.pointer();
    log::debug!("GDT at {:#010x}, limit {:#06x}", ptr.base, ptr.limit);
    log::debug!(
        "selectors: kcode={:#06x} kdata={:#06x} ucode={:#06x} udata={:#06x}",
        KERNEL_CODE_SELECTOR.0,
        KERNEL_DATA_SELECTOR.0,
        USER_CODE_SELECTOR.0,
        USER_DATA_SELECTOR.0
    );
}
