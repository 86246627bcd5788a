//! GDT subsystem tests
//!
//! These tests verify the layout of the flat-model table and its selectors.

use super::*;
use crate::kernel::codec::{GdtFields, LIMIT_MAX};
use x86_64::PrivilegeLevel;

fn fields(gdt: &Gdt, index: u16) -> GdtFields {
    gdt.get(index as usize).expect("index within GDT").decode()
}

#[test]
fn null_descriptor_at_index_zero() {
    let gdt = build_gdt();
    let null = gdt.get(NULL_INDEX as usize).unwrap();
    assert!(null.is_null());
    assert_eq!(null.decode(), GdtFields { base: 0, limit: 0, access: 0, flags: 0 });
}

#[test]
fn every_segment_is_flat_and_present() {
    let gdt = build_gdt();
    for index in 1..GDT_ENTRIES as u16 {
        let f = fields(&gdt, index);
        assert_eq!(f.base, 0, "segment {index}");
        assert_eq!(f.limit, LIMIT_MAX, "segment {index}");
        assert_eq!(SegmentFlags::from_bits_retain(f.flags), FLAT_32);
        assert!(Access::from_bits_retain(f.access).contains(Access::PRESENT | Access::SEGMENT));
    }
}

#[test]
fn kernel_and_user_segments_carry_their_privilege() {
    let gdt = build_gdt();
    let access = |i| Access::from_bits_retain(fields(&gdt, i).access);

    assert_eq!(access(KERNEL_CODE_INDEX).privilege_level(), PrivilegeLevel::Ring0);
    assert_eq!(access(KERNEL_DATA_INDEX).privilege_level(), PrivilegeLevel::Ring0);
    assert_eq!(access(USER_CODE_INDEX).privilege_level(), PrivilegeLevel::Ring3);
    assert_eq!(access(USER_DATA_INDEX).privilege_level(), PrivilegeLevel::Ring3);

    assert!(access(KERNEL_CODE_INDEX).contains(Access::EXECUTABLE));
    assert!(!access(KERNEL_DATA_INDEX).contains(Access::EXECUTABLE));
}

#[test]
fn selectors_index_the_matching_descriptor() {
    assert_eq!(KERNEL_CODE_SELECTOR.index(), KERNEL_CODE_INDEX);
    assert_eq!(KERNEL_DATA_SELECTOR.index(), KERNEL_DATA_INDEX);
    assert_eq!(USER_CODE_SELECTOR.index(), USER_CODE_INDEX);
    assert_eq!(USER_DATA_SELECTOR.index(), USER_DATA_INDEX);
    assert_eq!(USER_CODE_SELECTOR.rpl(), PrivilegeLevel::Ring3);
}

#[test]
fn kernel_code_descriptor_bytes() {
    let gdt = build_gdt();
    assert_eq!(
        gdt.get(KERNEL_CODE_INDEX as usize).unwrap().as_bytes(),
        &[0xFF, 0xFF, 0x00, 0x00, 0x00, 0x9A, 0xCF, 0x00]
    );
}

#[test]
fn pointer_spans_the_whole_table() {
    let gdt = build_gdt();
    let ptr = gdt.pointer();
    assert_eq!(ptr.byte_len(), GDT_ENTRIES * 8);
    assert_eq!(ptr.limit, 39);
}
