//! Class/color configuration loading.
//!
//! The configuration resource is a YAML document with a `names` key and
//! an optional `colors` key. `names` appears in the wild in several
//! shapes (Ultralytics `data.yaml` lists, index->name mappings in
//! either direction, even a comma-separated string), so the loader
//! accepts all of them. Loading never fails: anything unusable degrades
//! to a single default class and the default palette, because
//! downstream code indexes the class table unconditionally.

use std::path::Path;

use serde_yaml::Value;

use crate::model::{ClassTable, DEFAULT_CLASS, DEFAULT_PALETTE};

/// Load the class table from a YAML file.
///
/// A missing or unreadable file falls back to the default table.
pub fn load_class_table(path: &Path) -> ClassTable {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::warn!(
                "config {} not readable ({e}), using default class table",
                path.display()
            );
            return ClassTable::default();
        }
    };
    class_table_from_yaml(&content)
}

/// Parse a YAML document into a class table, with the same fallback
/// rules as [`load_class_table`].
pub fn class_table_from_yaml(content: &str) -> ClassTable {
    let doc: Value = match serde_yaml::from_str(content) {
        Ok(doc) => doc,
        Err(e) => {
            log::warn!("unparseable class config ({e}), using default class table");
            return ClassTable::default();
        }
    };

    let names = match parse_names(doc.get("names")) {
        Some(names) => names,
        None => {
            log::warn!("no usable 'names' entry, falling back to a single '{DEFAULT_CLASS}' class");
            vec![DEFAULT_CLASS.to_string()]
        }
    };
    let colors = parse_colors(doc.get("colors"));
    ClassTable::new(names, colors)
}

fn parse_names(value: Option<&Value>) -> Option<Vec<String>> {
    let names = match value? {
        Value::Sequence(seq) => seq.iter().filter_map(value_as_name).collect(),
        Value::Mapping(map) => parse_name_mapping(map)?,
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect(),
        _ => return None,
    };
    non_empty(names)
}

/// `names` given as a mapping: either index -> name, or name -> index
/// (detected by every value being index-like, and inverted). Sparse
/// indices leave gaps that are compacted out afterwards.
fn parse_name_mapping(map: &serde_yaml::Mapping) -> Option<Vec<String>> {
    let inverted: Option<Vec<(usize, String)>> = map
        .iter()
        .map(|(k, v)| Some((value_as_index(v)?, value_as_name(k)?)))
        .collect();

    let pairs = match inverted {
        Some(pairs) => pairs,
        None => map
            .iter()
            .map(|(k, v)| Some((value_as_index(k)?, value_as_name(v)?)))
            .collect::<Option<Vec<_>>>()?,
    };

    let max_index = pairs.iter().map(|(idx, _)| *idx).max()?;
    let mut slots = vec![String::new(); max_index + 1];
    for (idx, name) in pairs {
        slots[idx] = name;
    }
    non_empty(slots.into_iter().filter(|name| !name.is_empty()).collect())
}

fn value_as_name(value: &Value) -> Option<String> {
    let name = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!name.is_empty()).then_some(name)
}

fn value_as_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_empty(names: Vec<String>) -> Option<Vec<String>> {
    (!names.is_empty()).then_some(names)
}

/// `colors` given as a list of `[r, g, b]` triples (0-255 each),
/// rendered as `#rrggbb`. A malformed entry falls back to the default
/// palette at that position rather than failing the whole list.
fn parse_colors(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Sequence(seq)) = value else {
        return Vec::new();
    };
    let mut colors = Vec::with_capacity(seq.len());
    for entry in seq {
        match rgb_triple(entry) {
            Some([r, g, b]) => colors.push(format!("#{r:02x}{g:02x}{b:02x}")),
            None => {
                log::warn!("malformed color entry {entry:?}, using default palette color");
                colors.push(DEFAULT_PALETTE[colors.len() % DEFAULT_PALETTE.len()].to_string());
            }
        }
    }
    colors
}

fn rgb_triple(value: &Value) -> Option<[u8; 3]> {
    let Value::Sequence(seq) = value else {
        return None;
    };
    if seq.len() != 3 {
        return None;
    }
    let mut rgb = [0u8; 3];
    for (slot, v) in rgb.iter_mut().zip(seq) {
        *slot = u8::try_from(v.as_u64()?).ok()?;
    }
    Some(rgb)
}
