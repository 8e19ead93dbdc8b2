use itertools::Itertools;

use super::AssetView;

/// Every tag used by any asset, deduplicated and sorted.
/// Computed over the whole collection, not the filtered view, so selecting a
/// tag never hides the others.
pub fn available_tags<A: AssetView>(assets: &[A]) -> Vec<String> {
    assets
        .iter()
        .filter_map(|asset| asset.tags())
        .flatten()
        .sorted()
        .dedup()
        .cloned()
        .collect()
}

/// Every asset type present in the collection, deduplicated and sorted.
pub fn available_types<A: AssetView>(assets: &[A]) -> Vec<String> {
    assets
        .iter()
        .filter_map(|asset| asset.file_type())
        .sorted()
        .dedup()
        .map(str::to_owned)
        .collect()
}
