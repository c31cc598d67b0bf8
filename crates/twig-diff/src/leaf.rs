//! Leaf diff: decide whether one pair of leaves differs.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;
use twig_store::NodeRef;
use twig_types::ContentType;

use crate::config::DiffConfig;
use crate::error::{DiffError, DiffResult};
use crate::fingerprint::{compare_fingerprints, FingerprintCheck};
use crate::structural::{diff_structured, ChangeKind, Sides, StructuralChange};

/// Outcome of comparing one pair of leaves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeafDiff {
    /// Contents are equal, by fingerprint or by value.
    Unchanged,
    /// Contents differ.
    Changed {
        /// Old content; `None` if it does not exist (or the node is a directory).
        old: Option<Vec<u8>>,
        /// New content; `None` if it does not exist (or the node is a directory).
        new: Option<Vec<u8>>,
        /// Located differences when a structural diff ran; otherwise empty.
        changes: Vec<StructuralChange>,
    },
}

impl LeafDiff {
    /// Returns `true` for [`LeafDiff::Changed`].
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }

    /// Structural differences, empty when unchanged or not structured.
    pub fn changes(&self) -> &[StructuralChange] {
        match self {
            Self::Unchanged => &[],
            Self::Changed { changes, .. } => changes,
        }
    }
}

/// Compare two leaves with default settings.
pub fn diff_leaf(old: Option<&NodeRef>, new: Option<&NodeRef>) -> DiffResult<LeafDiff> {
    diff_leaf_with(old, new, &DiffConfig::default())
}

/// Compare two leaves. `None` is a node that does not exist.
///
/// Fingerprints are tried first. Otherwise the contents are read, compared
/// byte for byte, and then, if either side is structured, parsed and compared
/// value by value. Absent content on exactly one side is a change; on both
/// sides it is equality.
///
/// A parse failure is returned as [`DiffError::Parse`] for this pair only.
pub fn diff_leaf_with(
    old: Option<&NodeRef>,
    new: Option<&NodeRef>,
    config: &DiffConfig,
) -> DiffResult<LeafDiff> {
    let old_dir = old.is_some_and(|node| node.is_dir());
    let new_dir = new.is_some_and(|node| node.is_dir());
    if old_dir || new_dir {
        return diff_directories(old, new, old_dir, new_dir, config);
    }

    let (old_value, new_value) = match compare_fingerprints(old, new)? {
        FingerprintCheck::Equal => return Ok(LeafDiff::Unchanged),
        FingerprintCheck::Inconclusive { old: o, new: n } => (o.resolve(old)?, n.resolve(new)?),
    };

    if old_value == new_value {
        return Ok(LeafDiff::Unchanged);
    }

    let (Some(old_bytes), Some(new_bytes), Some(old_node), Some(new_node)) =
        (&old_value, &new_value, old, new)
    else {
        return Ok(changed(old_value, new_value, Vec::new()));
    };

    if !config.structural {
        return Ok(changed(old_value, new_value, Vec::new()));
    }
    let Some((old_format, new_format)) = structured_formats(old_node.content_type(), new_node.content_type()) else {
        return Ok(changed(old_value, new_value, Vec::new()));
    };

    let old_parsed = parse_structured(old_bytes, old_format, old_node)?;
    let new_parsed = parse_structured(new_bytes, new_format, new_node)?;
    let old_label = old_node.display_path();
    let new_label = new_node.display_path();
    let sides = Sides {
        old: &old_label,
        new: &new_label,
    };
    let changes = diff_structured(&old_parsed, &new_parsed, sides, "");
    if changes.is_empty() {
        debug!(path = %new_node.path(), "bytes differ but values are equivalent");
        return Ok(LeafDiff::Unchanged);
    }
    Ok(changed(old_value, new_value, changes))
}

fn changed(old: Option<Vec<u8>>, new: Option<Vec<u8>>, changes: Vec<StructuralChange>) -> LeafDiff {
    LeafDiff::Changed { old, new, changes }
}

/// Directories reach the leaf differ when the depth limit stops descent,
/// when either side has no children, or when one side is a directory and
/// the other is not.
fn diff_directories(
    old: Option<&NodeRef>,
    new: Option<&NodeRef>,
    old_dir: bool,
    new_dir: bool,
    config: &DiffConfig,
) -> DiffResult<LeafDiff> {
    match (old, new) {
        (Some(old_node), Some(new_node)) if old_dir && new_dir => compare_directories(old_node, new_node, config),
        (Some(old_node), Some(new_node)) => {
            let what = |is_dir: bool| if is_dir { "directory" } else { "file" };
            let message = format!(
                "{} is a {} while {} is a {}",
                new_node.display_path(),
                what(new_dir),
                old_node.display_path(),
                what(old_dir)
            );
            Ok(changed(
                None,
                None,
                vec![StructuralChange::new("", ChangeKind::TypeMismatch, message)],
            ))
        }
        _ => Ok(changed(None, None, Vec::new())),
    }
}

/// Compare two directories as a whole: one entry per child name that exists
/// on one side only or whose subtree differs. No entries means unchanged.
fn compare_directories(old: &NodeRef, new: &NodeRef, config: &DiffConfig) -> DiffResult<LeafDiff> {
    let old_children = old.children()?;
    let mut new_by_name: BTreeMap<String, NodeRef> = new
        .children()?
        .into_iter()
        .map(|child| (child.name().to_string(), child))
        .collect();
    let old_label = old.display_path();
    let new_label = new.display_path();

    let mut changes = Vec::new();
    let mut only_in_old = Vec::new();
    for old_child in old_children {
        let name = old_child.name().to_string();
        match new_by_name.remove(&name) {
            Some(new_child) => {
                if diff_leaf_with(Some(&old_child), Some(&new_child), config)?.is_changed() {
                    let message = format!("{name} differs between {new_label} and {old_label}");
                    changes.push(StructuralChange::new(&name, ChangeKind::ValueMismatch, message));
                }
            }
            None => only_in_old.push(name),
        }
    }
    for name in new_by_name.keys() {
        let message = format!("{name} exists in {new_label} but not in {old_label}");
        changes.push(StructuralChange::new(name, ChangeKind::OnlyInNew, message));
    }
    for name in only_in_old {
        let message = format!("{name} exists in {old_label} but not in {new_label}");
        changes.push(StructuralChange::new(&name, ChangeKind::OnlyInOld, message));
    }

    if changes.is_empty() {
        debug!(path = %new.path(), "directories hold equal content");
        return Ok(LeafDiff::Unchanged);
    }
    Ok(changed(None, None, changes))
}

/// Parse formats for each side when at least one side is structured. A raw
/// side is parsed with the other side's format.
fn structured_formats(old: ContentType, new: ContentType) -> Option<(ContentType, ContentType)> {
    match (old.is_structured(), new.is_structured()) {
        (true, true) => Some((old, new)),
        (true, false) => Some((old, old)),
        (false, true) => Some((new, new)),
        (false, false) => None,
    }
}

fn parse_structured(bytes: &[u8], format: ContentType, node: &NodeRef) -> DiffResult<Value> {
    let parse_error = |reason: String| DiffError::Parse {
        path: node.display_path(),
        format,
        reason,
    };
    match format {
        ContentType::Json => serde_json::from_slice(bytes).map_err(|e| parse_error(e.to_string())),
        ContentType::Toml => {
            let text = std::str::from_utf8(bytes).map_err(|e| parse_error(e.to_string()))?;
            toml::from_str(text).map_err(|e| parse_error(e.to_string()))
        }
        ContentType::Raw => Ok(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twig_store::MemoryTree;

    fn pair(old: &str, new: &str, path: &str) -> (MemoryTree, MemoryTree) {
        let old_tree = MemoryTree::with_label("old");
        let new_tree = MemoryTree::with_label("new");
        old_tree.insert_file(path, old).unwrap();
        new_tree.insert_file(path, new).unwrap();
        (old_tree, new_tree)
    }

    fn get(tree: &MemoryTree, path: &str) -> Option<NodeRef> {
        tree.get(path).unwrap()
    }

    #[test]
    fn identical_raw_is_unchanged() {
        let (old, new) = pair("hello", "hello", "/a.txt");
        let result = diff_leaf(get(&old, "/a.txt").as_ref(), get(&new, "/a.txt").as_ref()).unwrap();
        assert_eq!(result, LeafDiff::Unchanged);
    }

    #[test]
    fn different_raw_is_changed_without_detail() {
        let (old, new) = pair("hello", "world", "/a.txt");
        let result = diff_leaf(get(&old, "/a.txt").as_ref(), get(&new, "/a.txt").as_ref()).unwrap();
        assert_eq!(
            result,
            LeafDiff::Changed {
                old: Some(b"hello".to_vec()),
                new: Some(b"world".to_vec()),
                changes: Vec::new(),
            }
        );
    }

    #[test]
    fn equivalent_json_with_different_bytes_is_unchanged() {
        let (old, new) = pair(r#"{"a":1,"b":2}"#, "{\n  \"b\": 2,\n  \"a\": 1\n}", "/r.json");
        let result = diff_leaf(get(&old, "/r.json").as_ref(), get(&new, "/r.json").as_ref()).unwrap();
        assert_eq!(result, LeafDiff::Unchanged);
    }

    #[test]
    fn json_change_carries_structural_detail() {
        let (old, new) = pair(r#"{"a":1,"b":2}"#, r#"{"a":1,"b":3}"#, "/r.json");
        let result = diff_leaf(get(&old, "/r.json").as_ref(), get(&new, "/r.json").as_ref()).unwrap();
        assert!(result.is_changed());
        let messages: Vec<String> = result.changes().iter().map(ToString::to_string).collect();
        assert_eq!(messages, vec!["b is 3 in new:/r.json and 2 in old:/r.json"]);
    }

    #[test]
    fn toml_is_structured_too() {
        let (old, new) = pair("name = \"web\"\nport = 80\n", "port = 80\nname = \"web\"\n", "/c.toml");
        let result = diff_leaf(get(&old, "/c.toml").as_ref(), get(&new, "/c.toml").as_ref()).unwrap();
        assert_eq!(result, LeafDiff::Unchanged);

        let (old, new) = pair("port = 80\n", "port = 81\n", "/c.toml");
        let result = diff_leaf(get(&old, "/c.toml").as_ref(), get(&new, "/c.toml").as_ref()).unwrap();
        assert_eq!(result.changes().len(), 1);
        assert_eq!(result.changes()[0].path, "port");
    }

    #[test]
    fn one_structured_side_parses_both() {
        let old = MemoryTree::new();
        let new = MemoryTree::new();
        old.insert_file_as("/x", r#"{"a": 1}"#, ContentType::Raw).unwrap();
        new.insert_file_as("/x", r#"{"a":1}"#, ContentType::Json).unwrap();
        let result = diff_leaf(get(&old, "/x").as_ref(), get(&new, "/x").as_ref()).unwrap();
        assert_eq!(result, LeafDiff::Unchanged);
    }

    #[test]
    fn structural_disabled_reports_byte_difference() {
        let (old, new) = pair(r#"{"a":1}"#, r#"{ "a": 1 }"#, "/r.json");
        let config = DiffConfig {
            structural: false,
            ..Default::default()
        };
        let result = diff_leaf_with(get(&old, "/r.json").as_ref(), get(&new, "/r.json").as_ref(), &config).unwrap();
        assert!(result.is_changed());
        assert!(result.changes().is_empty());
    }

    #[test]
    fn parse_failure_is_an_error_for_the_pair() {
        let (old, new) = pair(r#"{"a":1}"#, "{not json", "/r.json");
        let err = diff_leaf(get(&old, "/r.json").as_ref(), get(&new, "/r.json").as_ref()).unwrap_err();
        match err {
            DiffError::Parse { path, format, .. } => {
                assert_eq!(path, "new:/r.json");
                assert_eq!(format, ContentType::Json);
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn absent_on_both_sides_is_unchanged() {
        assert_eq!(diff_leaf(None, None).unwrap(), LeafDiff::Unchanged);
    }

    #[test]
    fn absent_on_one_side_is_changed() {
        let tree = MemoryTree::new();
        tree.insert_file("/only.json", r#"{"a":1}"#).unwrap();
        let node = get(&tree, "/only.json");

        let added = diff_leaf(None, node.as_ref()).unwrap();
        assert_eq!(
            added,
            LeafDiff::Changed {
                old: None,
                new: Some(br#"{"a":1}"#.to_vec()),
                changes: Vec::new(),
            }
        );
        let deleted = diff_leaf(node.as_ref(), None).unwrap();
        assert!(matches!(deleted, LeafDiff::Changed { new: None, .. }));
    }

    #[test]
    fn empty_content_differs_from_absent() {
        let tree = MemoryTree::new();
        tree.insert_file("/empty", "").unwrap();
        let result = diff_leaf(None, get(&tree, "/empty").as_ref()).unwrap();
        assert!(result.is_changed());
    }

    #[test]
    fn fingerprint_match_never_reads() {
        let old = MemoryTree::new().with_fingerprints(true);
        let new = MemoryTree::new().with_fingerprints(true);
        old.insert_file("/big.bin", "abc").unwrap();
        new.insert_file("/big.bin", "abc").unwrap();

        let result = diff_leaf(get(&old, "/big.bin").as_ref(), get(&new, "/big.bin").as_ref()).unwrap();
        assert_eq!(result, LeafDiff::Unchanged);
        assert_eq!(old.reads(), 0);
        assert_eq!(new.reads(), 0);
    }

    #[test]
    fn content_read_once_per_side() {
        let old = MemoryTree::new().with_fingerprints(true);
        let new = MemoryTree::new();
        old.insert_file("/a.json", r#"{"a":1}"#).unwrap();
        new.insert_file("/a.json", r#"{"a":2}"#).unwrap();

        let result = diff_leaf(get(&old, "/a.json").as_ref(), get(&new, "/a.json").as_ref()).unwrap();
        assert!(result.is_changed());
        assert_eq!(old.reads(), 1);
        assert_eq!(new.reads(), 1);
    }

    #[test]
    fn differing_fingerprints_read_each_side_once() {
        let old = MemoryTree::with_label("old").with_fingerprints(true);
        let new = MemoryTree::with_label("new").with_fingerprints(true);
        old.insert_file("/a.json", r#"{"a":1}"#).unwrap();
        new.insert_file("/a.json", r#"{"a":2}"#).unwrap();

        let result = diff_leaf(get(&old, "/a.json").as_ref(), get(&new, "/a.json").as_ref()).unwrap();
        assert_eq!(result.changes().len(), 1);
        assert_eq!(result.changes()[0].message, "a is 2 in new:/a.json and 1 in old:/a.json");
        assert_eq!(old.reads(), 1);
        assert_eq!(new.reads(), 1);
    }

    #[test]
    fn directories_with_equal_content_are_unchanged() {
        let old = MemoryTree::new();
        let new = MemoryTree::new();
        old.insert_file("/d/a.json", r#"{"a":1,"b":2}"#).unwrap();
        new.insert_file("/d/a.json", r#"{"b":2,"a":1}"#).unwrap();
        old.insert_dir("/d/empty").unwrap();
        new.insert_dir("/d/empty").unwrap();
        let result = diff_leaf(get(&old, "/d").as_ref(), get(&new, "/d").as_ref()).unwrap();
        assert_eq!(result, LeafDiff::Unchanged);
    }

    #[test]
    fn two_empty_directories_are_unchanged() {
        let old = MemoryTree::new();
        let new = MemoryTree::new();
        old.insert_dir("/d").unwrap();
        new.insert_dir("/d").unwrap();
        let result = diff_leaf(get(&old, "/d").as_ref(), get(&new, "/d").as_ref()).unwrap();
        assert_eq!(result, LeafDiff::Unchanged);
    }

    #[test]
    fn directories_with_differing_content_are_changed() {
        let old = MemoryTree::with_label("old");
        let new = MemoryTree::with_label("new");
        old.insert_file("/d/sub/a", "1").unwrap();
        new.insert_file("/d/sub/a", "2").unwrap();
        let result = diff_leaf(get(&old, "/d").as_ref(), get(&new, "/d").as_ref()).unwrap();
        assert!(result.is_changed());
        assert_eq!(result.changes().len(), 1);
        assert_eq!(result.changes()[0].kind, ChangeKind::ValueMismatch);
        assert_eq!(result.changes()[0].message, "sub differs between new:/d and old:/d");
    }

    #[test]
    fn empty_directory_against_populated_is_changed() {
        let old = MemoryTree::with_label("old");
        let new = MemoryTree::with_label("new");
        old.insert_dir("/cookbooks").unwrap();
        new.insert_file("/cookbooks/apache/metadata.json", "{}").unwrap();
        let result = diff_leaf(get(&old, "/cookbooks").as_ref(), get(&new, "/cookbooks").as_ref()).unwrap();
        assert_eq!(
            result.changes(),
            &[StructuralChange {
                path: "apache".to_string(),
                kind: ChangeKind::OnlyInNew,
                message: "apache exists in new:/cookbooks but not in old:/cookbooks".to_string(),
            }]
        );

        let reversed = diff_leaf(get(&new, "/cookbooks").as_ref(), get(&old, "/cookbooks").as_ref()).unwrap();
        assert_eq!(reversed.changes()[0].kind, ChangeKind::OnlyInOld);
    }

    #[test]
    fn directory_against_file_is_changed() {
        let old = MemoryTree::with_label("old");
        let new = MemoryTree::with_label("new");
        old.insert_dir("/x").unwrap();
        new.insert_file("/x", "file").unwrap();
        let result = diff_leaf(get(&old, "/x").as_ref(), get(&new, "/x").as_ref()).unwrap();
        assert_eq!(result.changes().len(), 1);
        assert_eq!(
            result.changes()[0].message,
            "new:/x is a file while old:/x is a directory"
        );
        assert_eq!(old.reads() + new.reads(), 0);
    }

    #[test]
    fn one_sided_directory_is_changed() {
        let tree = MemoryTree::new();
        tree.insert_dir("/d").unwrap();
        let result = diff_leaf(None, get(&tree, "/d").as_ref()).unwrap();
        assert!(result.is_changed());
    }
}
