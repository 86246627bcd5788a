//! Architecture-specific collaborators of the boot path.

pub mod x86;
