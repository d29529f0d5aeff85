//! Waveform visualization payload.
//!
//! Two 64-bin frequency arrays plus a blended color; the UI renders these as
//! interleaved waves. Storm noise is seeded from the sorted user-id pair so
//! the payload is reproducible for a given match.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::{EnergyArchetype, UserId, canonical_pair};

/// Number of frequency bins per side.
pub const WAVEFORM_BINS: usize = 64;

/// Rendered waveform payload stored on match rows and feed entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveformPayload {
    pub user_a: Vec<f64>,
    pub user_b: Vec<f64>,
    /// Per-channel average of the two archetype palette colors.
    pub blended_color: String,
}

/// Inputs for one side of the waveform.
#[derive(Debug, Clone, Copy)]
pub struct WaveformSide {
    pub user_id: UserId,
    pub archetype: Option<EnergyArchetype>,
    pub depth_score: f64,
}

/// Synthesize the payload for a pair.
pub fn synthesize(a: WaveformSide, b: WaveformSide) -> WaveformPayload {
    let mut storm_rng = storm_rng(a.user_id, b.user_id);

    let user_a = side_bins(a, 0.0, &mut storm_rng);
    let user_b = side_bins(b, 0.5, &mut storm_rng);

    WaveformPayload {
        user_a,
        user_b,
        blended_color: blend_colors(
            a.archetype.unwrap_or(EnergyArchetype::Wave).palette_color(),
            b.archetype.unwrap_or(EnergyArchetype::Wave).palette_color(),
        ),
    }
}

fn side_bins(side: WaveformSide, phase_offset: f64, storm_rng: &mut StdRng) -> Vec<f64> {
    let archetype = side.archetype.unwrap_or(EnergyArchetype::Wave);
    (0..WAVEFORM_BINS)
        .map(|bin| {
            let phase = bin as f64 / WAVEFORM_BINS as f64 * std::f64::consts::TAU;
            let carrier = (phase + side.depth_score * 3.0 + phase_offset).sin();
            carrier * archetype_factor(archetype, bin, storm_rng)
        })
        .collect()
}

/// Per-archetype amplitude envelope: spark spiky, anchor smooth, wave
/// flowing, ember pulsing, storm chaotic.
fn archetype_factor(archetype: EnergyArchetype, bin: usize, storm_rng: &mut StdRng) -> f64 {
    match archetype {
        EnergyArchetype::Spark => {
            if bin % 7 == 0 {
                1.0
            } else {
                0.35
            }
        }
        EnergyArchetype::Anchor => 0.7 + 0.1 * (bin as f64 / WAVEFORM_BINS as f64 * std::f64::consts::PI).sin(),
        EnergyArchetype::Wave => 0.5 + 0.5 * (bin as f64 * 0.2).sin().abs(),
        EnergyArchetype::Ember => {
            if (bin / 8) % 2 == 0 {
                0.9
            } else {
                0.5
            }
        }
        EnergyArchetype::Storm => storm_rng.gen_range(0.2..1.0),
    }
}

/// Deterministic noise source derived from the sorted pair.
fn storm_rng(a: UserId, b: UserId) -> StdRng {
    let (min, max) = canonical_pair(a, b);
    let mut seed = 0_u64;
    for byte in min
        .as_uuid()
        .as_bytes()
        .iter()
        .chain(max.as_uuid().as_bytes())
    {
        seed = seed.wrapping_mul(31).wrapping_add(u64::from(*byte));
    }
    StdRng::seed_from_u64(seed)
}

/// Average two `#RRGGBB` colors channel by channel.
fn blend_colors(a: &str, b: &str) -> String {
    let parse = |hex: &str| -> (u16, u16, u16) {
        let hex = hex.trim_start_matches('#');
        let channel = |range: std::ops::Range<usize>| {
            u16::from_str_radix(hex.get(range).unwrap_or("00"), 16).unwrap_or(0)
        };
        (channel(0..2), channel(2..4), channel(4..6))
    };
    let (ar, ag, ab) = parse(a);
    let (br, bg, bb) = parse(b);
    format!(
        "#{:02X}{:02X}{:02X}",
        (ar + br) / 2,
        (ag + bg) / 2,
        (ab + bb) / 2
    )
}
