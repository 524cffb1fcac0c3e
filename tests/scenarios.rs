//! End-to-end coverage of the concrete scenarios through the public API:
//! building a layout, binding it, reading and writing through `BoundView`,
//! round-tripping through JSON, and lowering/rendering a field comparison.

use bitlayout::prelude::*;

fn quest_tree() -> std::rc::Rc<Tree> {
    let status = EnumTable::new(vec![("dead", 0u128), ("pining", 1u128), ("resting", 2u128)]).unwrap();
    let parrot = Type::struct_(vec![
        ("status", Type::uint_enum(2, status).unwrap()),
        ("rgb", Type::array(Type::uint(5).unwrap(), 3).unwrap()),
    ])
    .unwrap();
    let quest = Type::struct_(vec![("holy", Type::uint(1).unwrap()), ("parrot", parrot)]).unwrap();
    Tree::new(quest)
}

#[test]
fn packed_pair_round_trips_through_bound_view() {
    let ty = Type::struct_(vec![("a", Type::uint(5).unwrap()), ("b", Type::uint(13).unwrap())]).unwrap();
    let tree = Tree::new(ty);
    let view = BoundView::new(tree, Raw::from(0u32));

    view.field("a").unwrap().set_value(&Value::UInt(Raw::from(11u32))).unwrap();
    view.field("b").unwrap().set_value(&Value::UInt(Raw::from(5461u32))).unwrap();

    assert_eq!(view.raw(), Raw::from((5461u32 << 5) | 11u32));
    assert_eq!(view.field("a").unwrap().value().unwrap(), Value::UInt(Raw::from(11u32)));
    assert_eq!(view.field("b").unwrap().value().unwrap(), Value::UInt(Raw::from(5461u32)));
}

#[test]
fn nested_assembly_round_trips_through_json() {
    let tree = quest_tree();
    let view = BoundView::new(tree, Raw::from(0u32));

    view.get("holy").unwrap().set_value(&Value::UInt(Raw::from(1u32))).unwrap();
    view.get("parrot.status")
        .unwrap()
        .set_value(&Value::Enum { code: 0, label: Some("dead".to_string()) })
        .unwrap();
    view.get("parrot.rgb[0]").unwrap().set_value(&Value::UInt(Raw::from(1u32))).unwrap();
    view.get("parrot.rgb[1]").unwrap().set_value(&Value::UInt(Raw::from(2u32))).unwrap();
    view.get("parrot.rgb[2]").unwrap().set_value(&Value::UInt(Raw::from(3u32))).unwrap();

    assert_eq!(view.raw(), Raw::from(25097u32));

    let json = view.json().unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "holy": 1,
            "parrot": {
                "status": "dead",
                "rgb": [1, 2, 3],
            }
        })
    );

    let fresh = BoundView::new(quest_tree(), Raw::from(0u32));
    fresh.set_json(&json).unwrap();
    assert_eq!(fresh.raw(), Raw::from(25097u32));
}

#[test]
fn sibling_views_observe_each_others_writes() {
    let tree = quest_tree();
    let root = BoundView::new(tree, Raw::from(0u32));
    let status_via_root = root.get("parrot.status").unwrap();
    let status_via_parrot = root.field("parrot").unwrap().field("status").unwrap();

    status_via_root
        .set_value(&Value::Enum { code: 2, label: Some("resting".to_string()) })
        .unwrap();

    assert_eq!(status_via_parrot, "resting");
    assert_eq!(status_via_parrot, 2u128);
}

#[test]
fn overflowing_write_fails_and_leaves_raw_unchanged() {
    let tree = quest_tree();
    let root = BoundView::new(tree, Raw::from(0u32));
    let rgb0 = root.get("parrot.rgb[0]").unwrap();
    let before = root.raw();

    let err = rgb0.set_value(&Value::UInt(Raw::from(64u32))).unwrap_err();
    assert!(matches!(err, Error::Overflow { .. }));
    assert_eq!(root.raw(), before);
}

#[test]
fn unknown_enum_label_is_rejected_at_write_time() {
    let tree = quest_tree();
    let root = BoundView::new(tree, Raw::from(0u32));
    let status = root.get("parrot.status").unwrap();
    let err = status.set_json(&serde_json::json!("confused")).unwrap_err();
    assert!(matches!(err, Error::UnknownLabel(_)));
}

#[test]
fn json_rejects_unknown_struct_key() {
    let tree = quest_tree();
    let root = BoundView::new(tree, Raw::from(0u32));
    let err = root
        .set_json(&serde_json::json!({"holy": 0, "parrot": {"status": "dead", "rgb": [0, 0, 0]}, "extra": 1}))
        .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch(_)));
}

#[test]
fn expression_lowering_and_rendering_matches_direct_field_read() {
    let tree = quest_tree();
    let root = SymbolicField::new(tree.clone());
    let rgb1 = root.get("parrot.rgb[1]").unwrap();
    let expr = rgb1.expr().eq(17i64).unwrap();
    let ir = lower(&expr, None).unwrap();
    let rendered = render(&ir);
    assert_eq!(rendered, "(((x >> 8) & 31) == 17)");

    let view = BoundView::new(tree, Raw::from(0u32));
    view.get("parrot.rgb[1]").unwrap().set_value(&Value::UInt(Raw::from(17u32))).unwrap();
    assert_eq!(view.get("parrot.rgb[1]").unwrap().value().unwrap(), Value::UInt(Raw::from(17u32)));
}

#[test]
fn custom_registered_type_round_trips_through_codec() {
    let mut registry = Registry::new();
    registry
        .register(
            "celsius_tenths",
            8,
            |json: &serde_json::Value| {
                let tenths = (json.as_f64().unwrap_or(0.0) * 10.0).round() as i64;
                Ok(Raw::from((tenths + 128).clamp(0, 255) as u32))
            },
            |raw: &Raw| {
                use num_traits::ToPrimitive;
                let tenths = raw.to_i64().unwrap_or(0) - 128;
                Ok(serde_json::json!(tenths as f64 / 10.0))
            },
            |native: &serde_json::Value| Ok(native.clone()),
        )
        .unwrap();

    let ty = Type::custom(&registry, "celsius_tenths").unwrap();
    let tree = Tree::new(ty);
    let view = BoundView::new(tree, Raw::from(0u32));

    view.set_json(&serde_json::json!(12.5)).unwrap();
    let json = view.json().unwrap();
    assert_eq!(json, serde_json::json!(12.5));
}
