//! Class catalog and command allowlist.
//!
//! The catalog maps detector class ids to operator-facing styling (display
//! name + box color). It is static, populated at startup, and read-only
//! afterwards. The allowlist is the subset of class ids eligible to produce a
//! robot command; detections outside it are discarded before selection.

use std::collections::{BTreeMap, BTreeSet};

/// Fallback box color for class ids missing from the catalog.
pub const DEFAULT_CLASS_COLOR: [u8; 3] = [0, 255, 0];

/// Per-class display styling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassStyle {
    pub display_name: String,
    /// RGB triple used for the box outline and label chip.
    pub color: [u8; 3],
}

/// Static mapping from class id to display styling.
#[derive(Clone, Debug)]
pub struct ClassCatalog {
    entries: BTreeMap<u32, ClassStyle>,
}

impl ClassCatalog {
    pub fn new(entries: impl IntoIterator<Item = (u32, ClassStyle)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// The fruit catalog the sorter ships with.
    pub fn fruit() -> Self {
        let entry = |name: &str, color: [u8; 3]| ClassStyle {
            display_name: name.to_string(),
            color,
        };
        Self::new([
            (0, entry("Buah_Hijau", [0, 255, 0])),
            (1, entry("Buah_Jingga", [255, 165, 0])),
            (2, entry("Buah_Kuning", [255, 255, 0])),
            (3, entry("Buah_Merah", [255, 0, 0])),
        ])
    }

    pub fn get(&self, class_id: u32) -> Option<&ClassStyle> {
        self.entries.get(&class_id)
    }

    /// Display name for a class, with a generated fallback for unknown ids.
    pub fn display_name(&self, class_id: u32) -> String {
        match self.entries.get(&class_id) {
            Some(style) => style.display_name.clone(),
            None => format!("class {}", class_id),
        }
    }

    /// Box color for a class, falling back to [`DEFAULT_CLASS_COLOR`].
    pub fn color(&self, class_id: u32) -> [u8; 3] {
        self.entries
            .get(&class_id)
            .map(|style| style.color)
            .unwrap_or(DEFAULT_CLASS_COLOR)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ClassCatalog {
    fn default() -> Self {
        Self::fruit()
    }
}

/// Class ids eligible to produce a robot command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowList {
    classes: BTreeSet<u32>,
}

impl AllowList {
    pub fn new(classes: impl IntoIterator<Item = u32>) -> Self {
        Self {
            classes: classes.into_iter().collect(),
        }
    }

    pub fn contains(&self, class_id: u32) -> bool {
        self.classes.contains(&class_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.classes.iter().copied()
    }
}

impl Default for AllowList {
    /// Green, yellow, and red fruit command the arm; orange is detectable but
    /// never eligible.
    fn default() -> Self {
        Self::new([0, 2, 3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_falls_back_for_unknown_classes() {
        let catalog = ClassCatalog::fruit();

        assert_eq!(catalog.display_name(2), "Buah_Kuning");
        assert_eq!(catalog.color(3), [255, 0, 0]);

        assert_eq!(catalog.display_name(9), "class 9");
        assert_eq!(catalog.color(9), DEFAULT_CLASS_COLOR);
    }

    #[test]
    fn default_allowlist_excludes_orange() {
        let allow = AllowList::default();
        assert!(allow.contains(0));
        assert!(!allow.contains(1));
        assert!(allow.contains(2));
        assert!(allow.contains(3));
    }
}
