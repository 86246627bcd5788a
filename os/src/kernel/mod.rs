//! Boot sequencing: hand-off report, then GDT, then IDT, then idle.

pub mod codec;
pub mod gdt;
pub mod idt;
pub mod table;

use crate::config;
use crate::multiboot::{self, Provenance};
use gdt::Gdt;
use idt::{EntryPoints, Idt};
use table::DescriptorLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum KernelInitError {
    #[error("a logger is already installed")]
    LoggerAlreadySet,
}

/// Everything the boot path produced, handed to the idle loop.
#[derive(Debug)]
pub struct KernelState {
    pub provenance: Provenance,
    pub gdt: &'static Gdt,
    pub idt: &'static Idt,
}

/// Bring up the console collaborators: VGA, COM1 and the `log` backend.
pub fn init_console() -> Result<(), KernelInitError> {
    crate::vga::clear();
    crate::serial::init();
    crate::logger::init().map_err(|_| KernelInitError::LoggerAlreadySet)
}

/// Validate the hand-off, then install the GDT and IDT, strictly in that order.
///
/// Nothing here fails: a bad magic or inconsistent flags are only reported,
/// and table construction is total.
///
/// # Safety
/// `info_address` must satisfy [`multiboot::validate`]. Interrupts must be
/// disabled; they stay disabled, since the gates point at stub handlers.
pub unsafe fn early_init<L: DescriptorLoader>(
    magic: u32,
    info_address: usize,
    entry: EntryPoints,
    loader: &L,
) -> KernelState {
    let validation = multiboot::validate(magic, info_address);
    multiboot::report(&validation);

    let gdt = gdt::init(loader);
    let idt = idt::init(entry, config::NUM_INTERRUPTS, loader);

    verify_tables(loader, gdt, idt);

    log::info!("shard kernel");
    log::info!("{}", config::VERSION);
    log::info!("");
    log::info!("Welcome to Shard!");

    KernelState {
        provenance: validation.provenance,
        gdt,
        idt,
    }
}

/// Read GDTR/IDTR back and compare with what was handed to the loader.
fn verify_tables<L: DescriptorLoader>(loader: &L, gdt: &Gdt, idt: &Idt) -> bool {
    let mut ok = true;
    for (name, expected, stored) in [
        ("GDTR", gdt.pointer(), loader.stored_gdt()),
        ("IDTR", idt.pointer(), loader.stored_idt()),
    ] {
        if stored == expected {
            log::debug!("{name}: base {:#010x} limit {:#06x}", stored.base, stored.limit);
        } else {
            log::warn!(
                "{name} mismatch: loaded base {:#010x} limit {:#06x}, expected base {:#010x} limit {:#06x}",
                stored.base,
                stored.limit,
                expected.base,
                expected.limit
            );
            ok = false;
        }
    }
    ok
}

/// Terminal state of the boot path.
pub fn kernel_loop(_state: KernelState) -> ! {
    halt()
}

/// Spin forever.
pub fn halt() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::codec::GdtFields;
    use crate::kernel::table::TablePointer;
    use crate::multiboot::{InfoFlags, MemorySizes, BOOTLOADER_MAGIC, INFO_SIZE};
    use core::cell::RefCell;
    use x86_64::structures::gdt::SegmentSelector;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Gdt(TablePointer, u16, u16),
        Idt(TablePointer),
    }

    /// Stands in for `lgdt`/`lidt` and remembers what it was asked to load.
    #[derive(Default)]
    struct RecordingLoader {
        events: RefCell<Vec<Event>>,
        gdtr: RefCell<Option<TablePointer>>,
        idtr: RefCell<Option<TablePointer>>,
    }

    impl DescriptorLoader for RecordingLoader {
        unsafe fn load_gdt(&self, gdt: TablePointer, code: SegmentSelector, data: SegmentSelector) {
            self.events.borrow_mut().push(Event::Gdt(gdt, code.0, data.0));
            *self.gdtr.borrow_mut() = Some(gdt);
        }

        unsafe fn load_idt(&self, idt: TablePointer) {
            self.events.borrow_mut().push(Event::Idt(idt));
            *self.idtr.borrow_mut() = Some(idt);
        }

        fn stored_gdt(&self) -> TablePointer {
            self.gdtr.borrow().unwrap_or(TablePointer::new(0, 0))
        }

        fn stored_idt(&self) -> TablePointer {
            self.idtr.borrow().unwrap_or(TablePointer::new(0, 0))
        }
    }

    const ENTRY: EntryPoints = EntryPoints {
        interrupt: 0x0010_0400,
        exception: 0x0010_0800,
    };

    #[test]
    fn boots_from_a_memory_only_hand_off() {
        let mut block = [0u8; INFO_SIZE];
        block[0..4].copy_from_slice(&InfoFlags::MEMORY.bits().to_le_bytes());
        block[4..8].copy_from_slice(&639u32.to_le_bytes());
        block[8..12].copy_from_slice(&31_744u32.to_le_bytes());

        let loader = RecordingLoader::default();
        let state = unsafe { early_init(BOOTLOADER_MAGIC, block.as_ptr() as usize, ENTRY, &loader) };

        assert_eq!(state.provenance, Provenance::Multiboot);
        let view = unsafe { multiboot::validate(BOOTLOADER_MAGIC, block.as_ptr() as usize) };
        assert_eq!(
            view.info.memory(),
            Some(MemorySizes { lower_kib: 639, upper_kib: 31_744 })
        );
        assert_eq!(idt::present_gates(state.idt), config::NUM_INTERRUPTS);

        assert!(state.gdt.get(0).unwrap().is_null());
        assert_eq!(state.gdt.len(), 5);
        assert_eq!(
            state.gdt.get(1).unwrap().decode(),
            GdtFields { base: 0, limit: 0xF_FFFF, access: 0x9A, flags: 0xC }
        );

        let offsets: Vec<u32> = state.idt.iter().map(|e| e.decode().offset).collect();
        assert_eq!(offsets.len(), config::NUM_INTERRUPTS);
        assert!(offsets[..config::NUM_INTERRUPTS / 16].iter().all(|&o| o == ENTRY.exception));
        assert!(offsets[config::NUM_INTERRUPTS / 16..].iter().all(|&o| o == ENTRY.interrupt));
    }

    #[test]
    fn gdt_is_installed_before_idt() {
        let loader = RecordingLoader::default();
        let state = unsafe { early_init(BOOTLOADER_MAGIC, 0, ENTRY, &loader) };

        let events = loader.events.borrow();
        assert_eq!(
            *events,
            vec![
                Event::Gdt(state.gdt.pointer(), 0x08, 0x10),
                Event::Idt(state.idt.pointer()),
            ]
        );
        assert!(verify_tables(&loader, state.gdt, state.idt));
    }

    #[test]
    fn bad_magic_still_installs_tables() {
        let loader = RecordingLoader::default();
        let state = unsafe { early_init(0x1234_5678, 0, ENTRY, &loader) };
        assert_eq!(state.provenance, Provenance::InvalidMagic { found: 0x1234_5678 });
        assert_eq!(loader.events.borrow().len(), 2);
    }

    #[test]
    fn readback_mismatch_is_detected() {
        let loader = RecordingLoader::default();
        let gdt = gdt::build_gdt();
        let idt = idt::build_idt(ENTRY.interrupt, ENTRY.exception, 256);
        assert!(!verify_tables(&loader, &gdt, &idt));
    }
}
