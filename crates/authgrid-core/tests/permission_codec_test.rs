//! Tests for the permission registry and packed-permission codec.

use authgrid_core::permissions::{
    PermissionDef, PermissionError, PermissionSet, union_packed,
};

fn stock_set() -> PermissionSet {
    PermissionSet::builder()
        .permission("StockRead", 10)
        .permission_in_group("StockAddNew", 11, "Stock")
        .permission_in_group("StockRemove", 12, "Stock")
        .permission("SalesSell", 20)
        .advanced("AccessAll", 0x2000)
        .build()
        .unwrap()
}

// -----------------------------------------------------------------------
// Builder validation
// -----------------------------------------------------------------------

#[test]
fn builder_rejects_code_zero() {
    let err = PermissionSet::builder()
        .permission("Broken", 0)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        PermissionError::InvalidPermissionData { code: 0, .. }
    ));
}

#[test]
fn builder_rejects_surrogate_range_codes() {
    let err = PermissionSet::builder()
        .permission("Broken", 0xD800)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        PermissionError::InvalidPermissionData { code: 0xD800, .. }
    ));
}

#[test]
fn builder_rejects_duplicates() {
    let err = PermissionSet::builder()
        .permission("StockRead", 10)
        .permission("StockRead", 11)
        .build()
        .unwrap_err();
    assert!(matches!(err, PermissionError::DuplicateName(name) if name == "StockRead"));

    let err = PermissionSet::builder()
        .permission("A", 10)
        .permission("B", 10)
        .build()
        .unwrap_err();
    assert!(matches!(err, PermissionError::DuplicateCode(10)));
}

// -----------------------------------------------------------------------
// pack / unpack
// -----------------------------------------------------------------------

#[test]
fn pack_unpack_round_trip() {
    let set = stock_set();
    let names = ["StockRead", "SalesSell", "AccessAll"];

    let packed = set.pack(names).unwrap();
    assert_eq!(packed.chars().count(), 3);

    let mut unpacked = set.unpack(&packed);
    unpacked.sort();
    let mut expected: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    expected.sort();
    assert_eq!(unpacked, expected);
}

#[test]
fn packed_characters_carry_the_codes() {
    let set = stock_set();
    let packed = set.pack(["StockRead", "SalesSell"]).unwrap();
    let codes: Vec<u32> = packed.chars().map(u32::from).collect();
    assert_eq!(codes, vec![10, 20]);
}

#[test]
fn pack_unknown_name_fails() {
    let set = stock_set();
    let err = set.pack(["NotAPermission"]).unwrap_err();
    assert!(matches!(err, PermissionError::UnknownPermission(name) if name == "NotAPermission"));
}

#[test]
fn pack_zero_code_fails_with_invalid_permission_data() {
    // An unchecked registry models a misconfigured enumeration.
    let set = PermissionSet::from_defs(vec![
        PermissionDef::new("Good", 5),
        PermissionDef::new("Bad", 0),
    ]);
    let err = set.pack(["Good", "Bad"]).unwrap_err();
    assert!(matches!(
        err,
        PermissionError::InvalidPermissionData { code: 0, .. }
    ));
}

#[test]
fn pack_does_not_dedupe() {
    let set = stock_set();
    let packed = set.pack(["StockRead", "StockRead"]).unwrap();
    assert_eq!(packed.chars().count(), 2);
}

#[test]
fn unpack_drops_unknown_characters() {
    let set = stock_set();
    // Code 99 was never defined; simulates a permission removed after
    // having been granted.
    let mut packed = set.pack(["StockRead"]).unwrap();
    packed.push(char::from_u32(99).unwrap());

    let unpacked = set.unpack(&packed);
    assert_eq!(unpacked, vec!["StockRead".to_string()]);
}

// -----------------------------------------------------------------------
// pack_with_validation
// -----------------------------------------------------------------------

#[test]
fn pack_with_validation_reports_each_invalid_name() {
    let set = stock_set();
    let mut invalid = Vec::new();
    let packed = set.pack_with_validation(
        ["StockRead", "Bogus1", "SalesSell", "Bogus2"],
        |name| invalid.push(name.to_string()),
        |_| {},
    );

    assert_eq!(packed.chars().count(), 2);
    assert_eq!(invalid, vec!["Bogus1".to_string(), "Bogus2".to_string()]);
}

#[test]
fn pack_with_validation_signals_advanced_permissions() {
    let set = stock_set();
    let mut advanced = Vec::new();
    let packed = set.pack_with_validation(
        ["StockRead", "AccessAll"],
        |_| panic!("no invalid names expected"),
        |def| advanced.push(def.name.clone()),
    );

    assert_eq!(packed.chars().count(), 2);
    assert_eq!(advanced, vec!["AccessAll".to_string()]);
}

// -----------------------------------------------------------------------
// union
// -----------------------------------------------------------------------

#[test]
fn union_packed_dedupes_by_character_keeping_first_order() {
    let set = stock_set();
    let a = set.pack(["StockRead", "SalesSell"]).unwrap();
    let b = set.pack(["SalesSell", "StockAddNew"]).unwrap();

    let union = union_packed([a, b]);
    let codes: Vec<u32> = union.chars().map(u32::from).collect();
    assert_eq!(codes, vec![10, 20, 11]);
}
