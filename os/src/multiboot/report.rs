//! Diagnostic dump of the boot hand-off.

use super::{Provenance, Symbols, Validation, BOOTLOADER_MAGIC};

/// Log everything the loader told us.
///
/// Inconsistencies (bad magic, both symbol-table bits) are logged and boot
/// carries on.
///
/// # Safety
/// Dereferences the cmdline, boot loader name and memory map pointers of a
/// block whose flags declare them present; see [`super::BootInfo::cmdline`]
/// and [`super::BootInfo::memory_map`].
pub unsafe fn report(validation: &Validation<'_>) {
    match validation.provenance {
        Provenance::Multiboot => log::info!("Saw valid multiboot magic"),
        Provenance::InvalidMagic { found } => {
            log::warn!("multiboot magic: {BOOTLOADER_MAGIC:#010x}");
            log::warn!("saw magic: {found:#010x}");
        }
    }

    let info = &validation.info;
    log::info!("multiboot flags = {:#x}", info.raw_flags());

    if let Some(mem) = info.memory() {
        log::info!("mem_lower = {}KB, mem_upper {}KB", mem.lower_kib, mem.upper_kib);
    }

    if let Some([drive, p1, p2, p3]) = info.boot_device() {
        log::info!("boot_device = {drive:#04x} ({p1:#04x}, {p2:#04x}, {p3:#04x})");
    }

    match info.cmdline() {
        Some(cmdline) => log::info!("cmdline = {}", cmdline.to_str().unwrap_or("<non-utf8>")),
        None => log::info!("no cmdline supplied"),
    }

    if let Some(mods) = info.modules() {
        log::info!("mods_count = {}, mods_addr = {:#x}", mods.count, mods.address);
    }

    match info.symbols() {
        Err(err) => log::error!("ERROR: {err}"),
        Ok(Some(Symbols::AOut(aout))) => {
            log::info!("aout info =");
            log::info!("    tabsize: {}", aout.tabsize);
            log::info!("    strsize = {}", aout.strsize);
            log::info!("    addr = {:#x}", aout.address);
        }
        Ok(Some(Symbols::Elf(elf))) => {
            log::info!("elf info =");
            log::info!("    num =  {}", elf.num);
            log::info!("    size = {}", elf.size);
            log::info!("    addr = {:#x}", elf.address);
            log::info!("    shndx = {}", elf.shndx);
        }
        Ok(None) => {}
    }

    if let Some(region) = info.memory_map_region() {
        log::info!("mmap_length = {}", region.length);
        log::info!("mmap_addr = {:#x}", region.address);
        log::info!("found {} memory maps.", region.entry_count());

        if let Some(map) = info.memory_map() {
            for entry in map {
                log::info!(
                    "    base {:#011x} length {:#011x} {}",
                    entry.base,
                    entry.length,
                    entry.kind
                );
            }
        }
    }

    if let Some(name) = info.boot_loader_name() {
        log::info!("boot loader: {}", name.to_str().unwrap_or("<non-utf8>"));
    }
}
