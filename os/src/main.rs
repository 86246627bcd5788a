#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(all(target_arch = "x86", target_os = "none"))]
mod boot {
    use core::panic::PanicInfo;

    use shard::arch::x86::CpuLoader;
    use shard::config::BOOT_STACK_SIZE;
    use shard::kernel;
    use shard::multiboot::{HEADER_CHECKSUM, HEADER_FLAGS, HEADER_MAGIC};

    core::arch::global_asm!(
        ".section .multiboot, \"a\"",
        ".align 4",
        ".long {magic}",
        ".long {flags}",
        ".long {checksum}",
        "",
        ".section .bss",
        ".align 16",
        "boot_stack_bottom:",
        ".skip {stack_size}",
        "boot_stack_top:",
        "",
        ".section .text",
        ".global _start",
        "_start:",
        "cli",
        "mov esp, offset boot_stack_top",
        // cdecl: kmain(magic = eax, info = ebx); esp is 16-aligned at the call
        "sub esp, 8",
        "push ebx",
        "push eax",
        "call {kmain}",
        "2:",
        "hlt",
        "jmp 2b",
        magic = const HEADER_MAGIC,
        flags = const HEADER_FLAGS.bits(),
        checksum = const HEADER_CHECKSUM,
        stack_size = const BOOT_STACK_SIZE,
        kmain = sym kmain,
    );

    extern "C" fn kmain(magic: u32, info_address: u32) -> ! {
        if let Err(err) = kernel::init_console() {
            shard::serial::write_fmt(format_args!("console: {err}\n"));
        }

        let entry = kernel::idt::handlers::entry_points();
        let state = unsafe { kernel::early_init(magic, info_address as usize, entry, &CpuLoader) };
        kernel::kernel_loop(state)
    }

    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        log::error!("KERNEL PANIC: {info}");
        kernel::halt()
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    eprintln!("shard is a bare-metal kernel; build it with `make build` and boot it with `make run`");
}
