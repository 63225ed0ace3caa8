//! Tree construction, mutation and teardown through the public API.

use libjtree::{encode, parse, Format, Kind, NodeId, Tree, TreeError};

fn compact(tree: &Tree, id: NodeId) -> String {
    encode(tree, id, Format::Compact).unwrap()
}

#[test]
fn test_build_document() {
    let mut tree = Tree::new();
    let root = tree.create_object();
    let name = tree.create_string("Jack (\"Bee\") Nimble");
    tree.append_member(root, "name", name).unwrap();

    let format = tree.create_object();
    tree.append_member(root, "format", format).unwrap();
    let kind = tree.create_string("rect");
    tree.append_member(format, "type", kind).unwrap();
    let width = tree.create_int(1920);
    tree.append_member(format, "width", width).unwrap();
    let interlace = tree.create_false();
    tree.append_member(format, "interlace", interlace).unwrap();
    let rate = tree.create_number(29.97);
    tree.append_member(format, "frame rate", rate).unwrap();

    assert_eq!(
        compact(&tree, root),
        r#"{"name":"Jack (\"Bee\") Nimble","format":{"type":"rect","width":1920,"interlace":false,"frame rate":29.97}}"#
    );
}

#[test]
fn test_edit_parsed_document() {
    let (mut tree, root) = parse(br#"{"list": [1, 2, 3], "drop": null, "keep": "x"}"#).unwrap();
    let list = tree.member(root, "list").unwrap();

    tree.delete_at(list, 1).unwrap();
    let ten = tree.create_int(10);
    tree.insert(list, 0, ten).unwrap();
    tree.delete_member(root, "drop").unwrap();
    let y = tree.create_string("y");
    tree.replace_member(root, "keep", y).unwrap();

    assert_eq!(compact(&tree, root), r#"{"list":[10,1,3],"keep":"y"}"#);
    assert_eq!(tree.node_count(), 6);
}

#[test]
fn test_move_member_between_objects() {
    let (mut tree, a) = parse(br#"{"k": [true]}"#).unwrap();
    let b = tree.create_object();
    let k = tree.detach_member(a, "k").unwrap();
    assert_eq!(tree.key(k), Some("k"));
    tree.append(b, k).unwrap();
    assert_eq!(compact(&tree, a), "{}");
    assert_eq!(compact(&tree, b), r#"{"k":[true]}"#);
}

#[test]
fn test_delete_whole_parsed_tree() {
    let mut tree = Tree::new();
    let root = tree
        .parse(br#"[{"a": [1, [2, [3, {"b": "c"}]]]}, "d"]"#)
        .unwrap()
        .root;
    assert!(tree.node_count() > 1);
    tree.delete(root);
    assert_eq!(tree.node_count(), 0);
    tree.delete(root);
    assert_eq!(tree.node_count(), 0);
}

#[test]
fn test_delete_very_deep_tree() {
    let mut tree = Tree::new();
    let mut root = tree.create_array();
    for _ in 0..100_000 {
        let outer = tree.create_array();
        tree.append(outer, root).unwrap();
        root = outer;
    }
    tree.delete(root);
    assert_eq!(tree.node_count(), 0);
}

#[test]
fn test_shared_payload_survives_alias_deletion() {
    let mut tree = Tree::new();
    let shared = tree.create_string_array(&["a", "b"]);
    let holder = tree.create_object();
    tree.append_member_reference(holder, "one", shared).unwrap();
    tree.append_member_reference(holder, "two", shared).unwrap();
    assert_eq!(compact(&tree, holder), r#"{"one":["a","b"],"two":["a","b"]}"#);

    tree.delete(holder);
    assert_eq!(tree.node_count(), 3);
    assert_eq!(compact(&tree, shared), r#"["a","b"]"#);
}

#[test]
fn test_reference_of_reference_aliases_target() {
    let mut tree = Tree::new();
    let target = tree.create_int(1);
    let first = tree.create_reference(target).unwrap();
    let second = tree.create_reference(first).unwrap();
    assert_eq!(tree.node(second).unwrap().target(), Some(target));
    tree.delete(first);
    assert_eq!(tree.as_i64(second), Some(1));
}

#[test]
fn test_errors_leave_tree_unchanged() {
    let (mut tree, root) = parse(br#"{"a": [1]}"#).unwrap();
    let before = compact(&tree, root);
    let count = tree.node_count();
    let a = tree.member(root, "a").unwrap();

    assert!(matches!(tree.append(a, root), Err(TreeError::WouldCycle(_))));
    assert_eq!(
        tree.detach_member(root, "missing"),
        Err(TreeError::KeyNotFound("missing".into()))
    );
    let one = tree.child_at(a, 0).unwrap();
    assert_eq!(tree.append_member(one, "x", root), Err(TreeError::NotAnObject(one)));
    assert_eq!(tree.replace(root, one), Err(TreeError::NotAttached(root)));

    assert_eq!(compact(&tree, root), before);
    assert_eq!(tree.node_count(), count);
}

#[test]
fn test_stale_handles_are_errors() {
    let mut tree = Tree::new();
    let array = tree.create_array();
    let gone = tree.create_null();
    tree.delete(gone);
    assert_eq!(tree.append(array, gone), Err(TreeError::StaleNode(gone)));
    assert_eq!(tree.kind(gone), Kind::Invalid);
    assert!(tree.node(gone).is_err());
}

#[test]
fn test_duplicate_is_independent() {
    let (mut tree, root) = parse(br#"{"a": {"b": [1, 2]}}"#).unwrap();
    let copy = tree.duplicate(root, true).unwrap();
    assert!(tree.compare(root, copy, true));

    let b = tree.member(tree.member(copy, "a").unwrap(), "b").unwrap();
    let three = tree.create_int(3);
    tree.append(b, three).unwrap();
    assert!(!tree.compare(root, copy, true));
    assert_eq!(compact(&tree, root), r#"{"a":{"b":[1,2]}}"#);
}

#[test]
fn test_compare_numbers_by_value() {
    let mut tree = Tree::new();
    let a = tree.parse(b"[1, 2.0, 3e0]").unwrap().root;
    let b = tree.parse(b"[1.0, 2, 3]").unwrap().root;
    assert!(tree.compare(a, b, true));
    let c = tree.parse(b"[1, 2, 3, 4]").unwrap().root;
    assert!(!tree.compare(a, c, true));
}

#[test]
fn test_typed_readers() {
    let (tree, root) = parse(br#"{"s": "t", "n": 4, "f": 0.5, "b": true, "z": null}"#).unwrap();
    let get = |k: &str| tree.member(root, k).unwrap();
    assert_eq!(tree.as_str(get("s")), Some("t"));
    assert_eq!(tree.as_i64(get("n")), Some(4));
    assert_eq!(tree.as_f64(get("f")), Some(0.5));
    assert_eq!(tree.as_bool(get("b")), Some(true));
    assert!(tree.is_null(get("z")));
    assert_eq!(tree.as_str(get("n")), None);
    assert!(tree.has_member(root, "s"));
    assert!(!tree.has_member(root, "S"));
    assert_eq!(tree.member_ignore_case(root, "S"), Some(get("s")));
}
