use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of chromosome categories the detector can emit.
pub const NUM_CLASSES: usize = 24;

/// The fixed, ordered karyotype label set: the 22 autosomes followed by the
/// two sex chromosomes. The index order doubles as the layout sort key.
pub const CLASS_NAMES: [&str; NUM_CLASSES] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16", "17",
    "18", "19", "20", "21", "22", "x", "y",
];

/// One of the 24 chromosome categories.
///
/// The label set is closed and known at compile time, so per-class bookkeeping
/// elsewhere in this crate uses fixed-size arrays indexed by `index()` rather
/// than dynamic maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChromosomeClass(usize);

impl ChromosomeClass {
    /// Builds a class from a raw model class id. Returns None for ids outside
    /// the 24-label set.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < NUM_CLASSES).then_some(ChromosomeClass(index))
    }

    pub fn from_label(label: &str) -> Option<Self> {
        CLASS_NAMES
            .iter()
            .position(|name| *name == label)
            .map(ChromosomeClass)
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn label(self) -> &'static str {
        CLASS_NAMES[self.0]
    }

    /// The "y" chromosome has a single reference image rather than a
    /// left/right pair.
    pub fn is_y(self) -> bool {
        self.0 == NUM_CLASSES - 1
    }
}

impl fmt::Display for ChromosomeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_index_accepts_full_range() {
        assert_eq!(ChromosomeClass::from_index(0).unwrap().label(), "1");
        assert_eq!(ChromosomeClass::from_index(12).unwrap().label(), "13");
        assert_eq!(ChromosomeClass::from_index(22).unwrap().label(), "x");
        assert_eq!(ChromosomeClass::from_index(23).unwrap().label(), "y");
        assert!(ChromosomeClass::from_index(24).is_none());
    }

    #[test]
    fn from_label_round_trips() {
        for (index, name) in CLASS_NAMES.iter().enumerate() {
            let class = ChromosomeClass::from_label(name).unwrap();
            assert_eq!(class.index(), index);
            assert_eq!(class.label(), *name);
        }
        assert!(ChromosomeClass::from_label("z").is_none());
    }

    #[test]
    fn only_y_is_y() {
        assert!(ChromosomeClass::from_label("y").unwrap().is_y());
        assert!(!ChromosomeClass::from_label("x").unwrap().is_y());
        assert!(!ChromosomeClass::from_label("13").unwrap().is_y());
    }

    #[test]
    fn ordering_follows_index() {
        let one = ChromosomeClass::from_label("1").unwrap();
        let thirteen = ChromosomeClass::from_label("13").unwrap();
        let y = ChromosomeClass::from_label("y").unwrap();
        assert!(one < thirteen);
        assert!(thirteen < y);
    }
}
