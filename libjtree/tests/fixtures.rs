//! Test harness for the parser against fixture files.
//!
//! Every file under `tests/fixtures/valid/` must parse, encode in both
//! layouts, and re-parse to a structurally equal tree. Every file under
//! `tests/fixtures/invalid/` must fail without leaving nodes behind.

use std::fs;
use std::path::{Path, PathBuf};

use libjtree::{encode, Format, ParseContext, Tree};

/// All fixture files matching `pattern` under `tests/fixtures/`, sorted.
fn fixture_files(pattern: &str) -> Vec<PathBuf> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");
    let pattern = root.join(pattern);
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .expect("valid glob pattern")
        .flatten()
        .collect();
    files.sort();
    files
}

fn display_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().to_string()
}

#[test]
fn test_valid_fixtures_round_trip() {
    let files = fixture_files("valid/*.json");
    assert!(!files.is_empty(), "no valid fixtures found");

    let mut failures = Vec::new();
    for path in &files {
        let name = display_name(path);
        let input = fs::read(path).unwrap();
        let mut tree = Tree::new();
        let root = match tree.parse(&input) {
            Ok(parsed) => parsed.root,
            Err(e) => {
                let ctx = ParseContext::new(Some(&name));
                failures.push(format!("{}: {}", name, e.describe(&input, &ctx)));
                continue;
            }
        };

        for format in [Format::Pretty, Format::Compact] {
            let text = encode(&tree, root, format).unwrap();
            match tree.parse(text.as_bytes()) {
                Ok(again) => {
                    if !tree.compare(root, again.root, true) {
                        failures.push(format!("{} ({:?}): re-parse differs:\n{}", name, format, text));
                    }
                    // Encoding is a fixed point after one pass.
                    let second = encode(&tree, again.root, format).unwrap();
                    if second != text {
                        failures.push(format!("{} ({:?}): encoding not stable", name, format));
                    }
                }
                Err(e) => failures.push(format!("{} ({:?}): {}", name, format, e)),
            }
        }
    }

    if !failures.is_empty() {
        panic!(
            "{} of {} fixtures failed:\n{}",
            failures.len(),
            files.len(),
            failures.join("\n")
        );
    }
}

#[test]
fn test_invalid_fixtures_fail_cleanly() {
    let files = fixture_files("invalid/*.json");
    assert!(!files.is_empty(), "no invalid fixtures found");

    let mut tree = Tree::new();
    let sentinel = tree.create_string("untouched");
    for path in &files {
        let name = display_name(path);
        let input = fs::read(path).unwrap();
        let err = match tree.parse(&input) {
            Ok(_) => panic!("{}: expected a parse error", name),
            Err(e) => e,
        };
        assert!(err.offset() <= input.len(), "{}: offset out of range", name);
        assert_eq!(tree.node_count(), 1, "{}: leaked nodes", name);
        assert_eq!(tree.as_str(sentinel), Some("untouched"));
    }
}

#[test]
fn test_invalid_fixture_locations() {
    let input = fs::read(fixture_files("invalid/missing_colon.json").remove(0)).unwrap();
    let err = Tree::new().parse(&input).unwrap_err();
    let ctx = ParseContext::new(Some("missing_colon.json"));
    assert_eq!(
        err.describe(&input, &ctx),
        "Expected colon after key at 1:6 of <missing_colon.json>"
    );
}
