//! Class-name and color tables.

use serde::{Deserialize, Serialize};

/// Fallback palette, cycled when the configuration provides fewer
/// colors than classes.
pub const DEFAULT_PALETTE: [&str; 8] = [
    "#00d4aa", "#ff6b6b", "#4ecdc4", "#45b7d1", "#feca57", "#ff9ff3", "#54a0ff", "#9c88ff",
];

/// Class name used when no usable configuration is found.
pub const DEFAULT_CLASS: &str = "object";

/// Ordered class names paired with display colors.
///
/// Never empty: construction falls back to a single default class, so
/// callers may index the table unconditionally. Colors are recycled
/// modulo the table length when looked up with a larger class id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassTable {
    names: Vec<String>,
    colors: Vec<String>,
}

impl ClassTable {
    /// Build a table from names and `#rrggbb` colors.
    ///
    /// Empty names degrade to the single default class; a color list
    /// shorter than the names is padded by cycling the default palette.
    pub fn new(names: Vec<String>, mut colors: Vec<String>) -> Self {
        let names = if names.is_empty() {
            vec![DEFAULT_CLASS.to_string()]
        } else {
            names
        };
        while colors.len() < names.len() {
            colors.push(DEFAULT_PALETTE[colors.len() % DEFAULT_PALETTE.len()].to_string());
        }
        Self { names, colors }
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always `false`; present for API completeness.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Class name by index.
    pub fn name(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    /// All class names in index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether `class_id` is a valid index into the table.
    pub fn contains(&self, class_id: usize) -> bool {
        class_id < self.names.len()
    }

    /// Display color for a class, recycled modulo the table length.
    pub fn color(&self, class_id: usize) -> &str {
        &self.colors[class_id % self.colors.len()]
    }
}

impl Default for ClassTable {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}
