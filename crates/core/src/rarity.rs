//! Trait-rarity statistics derived from a cached metadata snapshot.
//!
//! The table is recomputed from scratch on every cache read; there is no
//! incremental update. Figures therefore reflect only the tokens resolved so
//! far and shift as background prefetch grows the snapshot.

use crate::token::TokenMetadata;
use serde::Serialize;
use std::collections::HashMap;

/// Occurrence statistics for one (trait type, value) pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TraitCount {
    /// Number of tokens in the snapshot carrying the pair.
    pub count: u64,
    /// `count / total_tokens × 100`; lower means rarer.
    pub percentage: f64,
}

/// Trait frequency table: trait type → value → occurrence stats.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TraitRarityTable {
    traits: HashMap<String, HashMap<String, TraitCount>>,
    total_tokens: usize,
}

impl TraitRarityTable {
    /// Occurrence stats for an exact (trait type, value) pair.
    pub fn get(&self, trait_type: &str, value: &str) -> Option<TraitCount> {
        self.traits.get(trait_type)?.get(value).copied()
    }

    /// All observed values for a trait type.
    pub fn values(&self, trait_type: &str) -> Option<&HashMap<String, TraitCount>> {
        self.traits.get(trait_type)
    }

    /// Number of tokens the table was computed over.
    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    /// Number of distinct trait types observed.
    pub fn trait_type_count(&self) -> usize {
        self.traits.len()
    }
}

/// Build the trait frequency table for a snapshot.
pub fn compute(snapshot: &HashMap<u64, TokenMetadata>) -> TraitRarityTable {
    let total = snapshot.len();
    let mut traits: HashMap<String, HashMap<String, u64>> = HashMap::new();

    for meta in snapshot.values() {
        for attr in &meta.attributes {
            *traits
                .entry(attr.trait_type.clone())
                .or_default()
                .entry(attr.value.clone())
                .or_insert(0) += 1;
        }
    }

    let traits = traits
        .into_iter()
        .map(|(trait_type, values)| {
            let values = values
                .into_iter()
                .map(|(value, count)| {
                    let percentage = count as f64 / total as f64 * 100.0;
                    (value, TraitCount { count, percentage })
                })
                .collect();
            (trait_type, values)
        })
        .collect();

    TraitRarityTable {
        traits,
        total_tokens: total,
    }
}

/// Fill the derived rarity fields of every token in the snapshot.
///
/// `overall_rarity` is the mean of the token's own attribute percentages;
/// `rarity_percentile` is the ascending rank of that score over all scored
/// tokens, scaled by the snapshot size. Tokens without attributes get
/// neither. Returns the table the scores were derived from.
pub fn enrich(snapshot: &mut HashMap<u64, TokenMetadata>) -> TraitRarityTable {
    let table = compute(snapshot);
    if table.total_tokens == 0 {
        return table;
    }

    for meta in snapshot.values_mut() {
        meta.overall_rarity = overall_rarity(meta, &table);
    }

    let mut scores: Vec<f64> = snapshot
        .values()
        .filter_map(|m| m.overall_rarity)
        .collect();
    scores.sort_by(|a, b| a.total_cmp(b));

    let total = table.total_tokens as f64;
    for meta in snapshot.values_mut() {
        meta.rarity_percentile = meta.overall_rarity.map(|score| {
            // Rank is the count of scores at or below ours, so tied scores
            // share a percentile.
            let rank = scores.partition_point(|s| s.total_cmp(&score).is_le());
            rank as f64 / total * 100.0
        });
    }

    table
}

fn overall_rarity(meta: &TokenMetadata, table: &TraitRarityTable) -> Option<f64> {
    if meta.attributes.is_empty() {
        return None;
    }
    let sum: f64 = meta
        .attributes
        .iter()
        .filter_map(|a| table.get(&a.trait_type, &a.value))
        .map(|c| c.percentage)
        .sum();
    Some(sum / meta.attributes.len() as f64)
}
