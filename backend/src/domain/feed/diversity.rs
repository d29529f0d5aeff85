//! Archetype diversity injection over one page slice.

use std::collections::HashMap;

use crate::domain::EnergyArchetype;

use super::FeedEntry;

/// Score bump marking an injected entry.
pub const DIVERSITY_BONUS: f64 = 0.1;

/// Rebalance a `limit + overflow` slice so non-dominant archetypes fill at
/// least `min_share` of the page.
///
/// The page is the first `limit` entries of `slice`; replacements are drawn
/// from the slice tail, best scores first, and marked with
/// [`DIVERSITY_BONUS`]. Returns the final page.
pub fn inject_diversity(
    mut slice: Vec<FeedEntry>,
    limit: usize,
    min_share: f64,
) -> Vec<FeedEntry> {
    let page_len = limit.min(slice.len());
    if page_len == 0 {
        return Vec::new();
    }

    let Some(dominant) = dominant_archetype(&slice[..page_len]) else {
        slice.truncate(page_len);
        return slice;
    };

    let non_dominant = slice[..page_len]
        .iter()
        .filter(|entry| entry.archetype != Some(dominant))
        .count();
    let target = (min_share * limit as f64).ceil() as usize;
    let mut shortfall = target.saturating_sub(non_dominant);
    if shortfall == 0 {
        slice.truncate(page_len);
        return slice;
    }

    // Candidate replacements: tail entries of a different archetype, best
    // first. Victims: dominant page entries, worst first.
    let mut replacement_indexes: Vec<usize> = (page_len..slice.len())
        .filter(|index| slice[*index].archetype != Some(dominant))
        .collect();
    replacement_indexes
        .sort_by(|a, b| slice[*b].final_score.total_cmp(&slice[*a].final_score));

    let mut victim_indexes: Vec<usize> = (0..page_len)
        .filter(|index| slice[*index].archetype == Some(dominant))
        .collect();
    victim_indexes.sort_by(|a, b| slice[*a].final_score.total_cmp(&slice[*b].final_score));

    for (victim, replacement) in victim_indexes.into_iter().zip(replacement_indexes) {
        if shortfall == 0 {
            break;
        }
        slice.swap(victim, replacement);
        slice[victim].diversity_bonus = DIVERSITY_BONUS;
        shortfall -= 1;
    }

    slice.truncate(page_len);
    slice.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
    slice
}

/// The most frequent classified archetype within the page, if any entry is
/// classified at all.
fn dominant_archetype(page: &[FeedEntry]) -> Option<EnergyArchetype> {
    let mut counts: HashMap<EnergyArchetype, usize> = HashMap::new();
    for entry in page {
        if let Some(archetype) = entry.archetype {
            *counts.entry(archetype).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(archetype, _)| archetype)
}
