//! Fixed compatibility lookup tables.
//!
//! Both tables are symmetric by construction so pairwise scoring is
//! order-independent without canonicalizing the lookup.

use crate::domain::{CommunicationStyle, EnergyArchetype};

/// Row/column order: expressive, precise, poetic, minimal, witty.
const STYLE_MATRIX: [[f64; 5]; 5] = [
    [0.85, 0.55, 0.75, 0.45, 0.80],
    [0.55, 0.85, 0.60, 0.75, 0.65],
    [0.75, 0.60, 0.85, 0.50, 0.70],
    [0.45, 0.75, 0.50, 0.80, 0.60],
    [0.80, 0.65, 0.70, 0.60, 0.90],
];

/// Row/column order: spark, anchor, wave, ember, storm.
const ARCHETYPE_MATRIX: [[f64; 5]; 5] = [
    [0.70, 0.85, 0.75, 0.65, 0.55],
    [0.85, 0.75, 0.70, 0.80, 0.45],
    [0.75, 0.70, 0.85, 0.75, 0.60],
    [0.65, 0.80, 0.75, 0.80, 0.50],
    [0.55, 0.45, 0.60, 0.50, 0.75],
];

fn style_index(style: CommunicationStyle) -> usize {
    match style {
        CommunicationStyle::Expressive => 0,
        CommunicationStyle::Precise => 1,
        CommunicationStyle::Poetic => 2,
        CommunicationStyle::Minimal => 3,
        CommunicationStyle::Witty => 4,
    }
}

fn archetype_index(archetype: EnergyArchetype) -> usize {
    match archetype {
        EnergyArchetype::Spark => 0,
        EnergyArchetype::Anchor => 1,
        EnergyArchetype::Wave => 2,
        EnergyArchetype::Ember => 3,
        EnergyArchetype::Storm => 4,
    }
}

/// Communication compatibility in `[0, 1]`; 0.5 when either side is
/// unclassified.
pub fn style_compatibility(
    a: Option<CommunicationStyle>,
    b: Option<CommunicationStyle>,
) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => STYLE_MATRIX[style_index(a)][style_index(b)],
        _ => 0.5,
    }
}

/// Archetype complementarity in `[0, 1]`; 0.5 when either side is
/// unclassified.
pub fn archetype_affinity(a: Option<EnergyArchetype>, b: Option<EnergyArchetype>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => ARCHETYPE_MATRIX[archetype_index(a)][archetype_index(b)],
        _ => 0.5,
    }
}
