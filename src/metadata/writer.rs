//! Persistence strategies for the metadata document.
//!
//! Writers are tried in order until one succeeds: the format-preserving
//! `toml_edit` writer first, then a structural `toml` dump with the original
//! blank-line spacing re-applied, then a plain structural dump.

use crate::error::{Error, Result};
use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use toml_edit::{DocumentMut, Item, Table, TableLike};

/// Scalar written into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactValue {
    Text(String),
    Integer(i64),
}

impl From<&String> for FactValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl FactValue {
    fn to_edit_value(&self) -> toml_edit::Value {
        match self {
            Self::Text(s) => toml_edit::Value::from(s.as_str()),
            Self::Integer(i) => toml_edit::Value::from(*i),
        }
    }

    fn to_toml_value(&self) -> toml::Value {
        match self {
            Self::Text(s) => toml::Value::String(s.clone()),
            Self::Integer(i) => toml::Value::Integer(*i),
        }
    }
}

/// A set of key/value pairs to write below an existing table.
///
/// `parent` must already exist in the document or the patch is skipped.
/// When `leaf` is set, the entries go into that sub-table of `parent`, which
/// is created if missing. With `replace_leaf`, whatever `leaf` held before
/// (a placeholder scalar or a table with stale keys) is discarded first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataPatch {
    pub parent: &'static [&'static str],
    pub leaf: Option<&'static str>,
    pub replace_leaf: bool,
    pub entries: Vec<(&'static str, FactValue)>,
}

/// Renders the patched document from its original text.
pub trait MetadataWriter {
    fn name(&self) -> &'static str;

    fn render(&self, original: &str, patches: &[MetadataPatch]) -> Result<String>;
}

/// The writer chain used by the reconciler.
pub fn default_writers() -> Vec<Box<dyn MetadataWriter>> {
    vec![
        Box::new(FormatPreservingWriter),
        Box::new(StructuralWriter { preserve_spacing: true }),
        Box::new(StructuralWriter { preserve_spacing: false }),
    ]
}

/// Edits a `toml_edit` document in place; comments, ordering and spacing of
/// untouched parts survive verbatim.
#[derive(Debug, Default)]
pub struct FormatPreservingWriter;

fn edit_table_at<'a>(
    root: &'a mut dyn TableLike,
    path: &[&str],
) -> Option<&'a mut dyn TableLike> {
    let mut current = root;
    for key in path {
        current = current.get_mut(key)?.as_table_like_mut()?;
    }
    Some(current)
}

fn edit_patch_target<'a>(
    parent: &'a mut dyn TableLike,
    leaf: Option<&str>,
    replace: bool,
) -> Result<&'a mut dyn TableLike> {
    let Some(leaf) = leaf else {
        return Ok(parent);
    };
    let holds_table = parent.get(leaf).is_some_and(Item::is_table_like);
    if replace && !holds_table {
        // Comments above a scalar placeholder move in front of the new header.
        let comment = parent
            .get_key_value(leaf)
            .and_then(|(key, _)| key.leaf_decor().prefix().cloned());
        parent.remove(leaf);
        let mut table = Table::new();
        if let Some(comment) = comment {
            table.decor_mut().set_prefix(comment);
        }
        parent.insert(leaf, Item::Table(table));
    } else if parent.get(leaf).is_none() {
        parent.insert(leaf, Item::Table(Table::new()));
    }

    let target = parent
        .get_mut(leaf)
        .and_then(Item::as_table_like_mut)
        .ok_or_else(|| Error::MetadataError(format!("'{leaf}' is not a table")))?;
    if replace {
        target.clear();
    }
    Ok(target)
}

impl MetadataWriter for FormatPreservingWriter {
    fn name(&self) -> &'static str {
        "format-preserving"
    }

    fn render(&self, original: &str, patches: &[MetadataPatch]) -> Result<String> {
        let mut document = original.parse::<DocumentMut>()?;

        for patch in patches {
            let Some(parent) = edit_table_at(document.as_table_mut(), patch.parent) else {
                debug!("Skipping patch for missing table {}", patch.parent.join("."));
                continue;
            };
            let target = edit_patch_target(parent, patch.leaf, patch.replace_leaf)?;

            for (key, value) in &patch.entries {
                let mut new_value = value.to_edit_value();
                match target.get_mut(key).and_then(Item::as_value_mut) {
                    Some(existing) => {
                        // Keep trailing comments and alignment of the old value.
                        *new_value.decor_mut() = existing.decor().clone();
                        *existing = new_value;
                    }
                    None => {
                        target.insert(key, Item::Value(new_value));
                    }
                }
            }
        }

        Ok(document.to_string())
    }
}

/// Rewrites the document through `toml`'s data model.
///
/// Comments are lost. With `preserve_spacing`, the blank lines in front of
/// each section header of the original are re-applied to the serialized
/// output; the render fails when no header can be matched.
#[derive(Debug)]
pub struct StructuralWriter {
    pub preserve_spacing: bool,
}

fn value_table_at<'a>(root: &'a mut toml::Table, path: &[&str]) -> Option<&'a mut toml::Table> {
    let mut current = root;
    for key in path {
        current = current.get_mut(*key)?.as_table_mut()?;
    }
    Some(current)
}

impl MetadataWriter for StructuralWriter {
    fn name(&self) -> &'static str {
        if self.preserve_spacing {
            "structural (spacing restored)"
        } else {
            "structural"
        }
    }

    fn render(&self, original: &str, patches: &[MetadataPatch]) -> Result<String> {
        let mut document: toml::Table = toml::from_str(original)?;

        for patch in patches {
            let Some(parent) = value_table_at(&mut document, patch.parent) else {
                continue;
            };
            let target = match patch.leaf {
                Some(leaf) => {
                    if patch.replace_leaf {
                        parent.insert(leaf.to_string(), toml::Value::Table(toml::Table::new()));
                    }
                    parent
                        .entry(leaf)
                        .or_insert_with(|| toml::Value::Table(toml::Table::new()))
                        .as_table_mut()
                        .ok_or_else(|| Error::MetadataError(format!("'{leaf}' is not a table")))?
                }
                None => parent,
            };
            for (key, value) in &patch.entries {
                target.insert(key.to_string(), value.to_toml_value());
            }
        }

        let serialized = toml::to_string(&document)?;
        if self.preserve_spacing {
            restore_spacing(original, &serialized)
        } else {
            Ok(serialized)
        }
    }
}

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"^\s*\[\[?([^\[\]#]+)\]\]?\s*(#.*)?$").expect("valid header pattern")
    })
}

/// Header name with whitespace and quotes removed, so `[ "a" . b ]` and
/// `[a.b]` compare equal.
fn header_key(line: &str) -> Option<String> {
    let captures = header_regex().captures(line)?;
    Some(captures[1].chars().filter(|c| !c.is_whitespace() && *c != '"').collect())
}

/// Number of blank lines preceding each section header in `text`.
fn header_spacing(text: &str) -> HashMap<String, usize> {
    let mut spacing = HashMap::new();
    let mut blanks = 0;
    for line in text.lines() {
        if line.trim().is_empty() {
            blanks += 1;
            continue;
        }
        if let Some(key) = header_key(line) {
            spacing.entry(key).or_insert(blanks);
        }
        blanks = 0;
    }
    spacing
}

/// Re-applies the original blank lines before every header of `serialized`
/// that also exists in `original`.
pub fn restore_spacing(original: &str, serialized: &str) -> Result<String> {
    let spacing = header_spacing(original);
    if spacing.is_empty() {
        return Err(Error::MetadataError("original document has no section headers".to_string()));
    }

    let mut output = String::with_capacity(serialized.len());
    let mut pending_blanks = 0;
    let mut matched = 0;
    for line in serialized.lines() {
        if line.trim().is_empty() {
            pending_blanks += 1;
            continue;
        }
        let blanks = match header_key(line).and_then(|key| spacing.get(&key).copied()) {
            Some(original_blanks) => {
                matched += 1;
                original_blanks
            }
            None => pending_blanks,
        };
        // Never lead the document with blank lines.
        if !output.is_empty() {
            output.push_str(&"\n".repeat(blanks));
        }
        output.push_str(line);
        output.push('\n');
        pending_blanks = 0;
    }

    if matched == 0 {
        return Err(Error::MetadataError(
            "no section header of the original document was found in the output".to_string(),
        ));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_key_normalizes() {
        assert_eq!(header_key("[experiment.environment]").as_deref(), Some("experiment.environment"));
        assert_eq!(header_key("  [ \"experiment\" . env ]  # note").as_deref(), Some("experiment.env"));
        assert_eq!(header_key("[[runs]]").as_deref(), Some("runs"));
        assert_eq!(header_key("name = \"[x]\""), None);
    }

    #[test]
    fn test_restore_spacing() {
        let original = "[a]\nx = 1\n\n\n[b]\ny = 2\n";
        let serialized = "[a]\nx = 1\n\n[b]\ny = 2\nz = 3\n";
        assert_eq!(restore_spacing(original, serialized).unwrap(), "[a]\nx = 1\n\n\n[b]\ny = 2\nz = 3\n");
    }

    #[test]
    fn test_restore_spacing_fails_without_common_headers() {
        assert!(restore_spacing("[a]\nx = 1\n", "[c]\nx = 1\n").is_err());
        assert!(restore_spacing("x = 1\n", "x = 1\n").is_err());
    }
}
