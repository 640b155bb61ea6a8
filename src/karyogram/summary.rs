use crate::annotations::chromosome_class::{CLASS_NAMES, ChromosomeClass, NUM_CLASSES};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Per-class counts for one analyzed image, reported next to the karyogram.
#[derive(Debug, Serialize, Deserialize)]
pub struct KaryotypeSummary {
    pub counts: Vec<ClassCount>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassCount {
    pub label: String,
    pub count: u32,
}

pub fn class_counts(classes: &[ChromosomeClass]) -> [u32; NUM_CLASSES] {
    let mut counts = [0u32; NUM_CLASSES];
    for class in classes {
        counts[class.index()] += 1;
    }
    counts
}

/// One-line legend in label order, e.g. "1: 2 | 2: 2 | ... | y: 1".
pub fn build_legend_str(counts: &[u32; NUM_CLASSES]) -> String {
    CLASS_NAMES
        .iter()
        .zip(counts.iter())
        .map(|(label, count)| format!("{}: {}", label, count))
        .join(" | ")
}

pub fn summarize(classes: &[ChromosomeClass]) -> KaryotypeSummary {
    let counts = class_counts(classes);
    KaryotypeSummary {
        counts: CLASS_NAMES
            .iter()
            .zip(counts.iter())
            .map(|(label, count)| ClassCount {
                label: (*label).to_string(),
                count: *count,
            })
            .collect(),
        total: classes.len(),
    }
}
