use std::path::PathBuf;

fn main() {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap_or_default());
    let linker_script = manifest_dir.join("linker.ld");

    let arch = std::env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    let os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();

    // Only the bare-metal i686 kernel image is linked with our script;
    // host builds (unit tests) use the default linker setup.
    if arch == "x86" && os == "none" {
        println!("cargo:rustc-link-arg-bins=-T{}", linker_script.display());
    }

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=linker.ld");
    println!("cargo:rerun-if-changed=i686-shard.json");
}
