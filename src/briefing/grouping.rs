//! Region / country grouping of entries

use std::collections::BTreeMap;

use super::models::{BriefingEntry, Priority};

#[derive(Debug, Clone, PartialEq)]
pub struct CountryGroup<'a> {
    /// Grouping key, empty for entries without a country
    pub country: String,
    pub entries: Vec<&'a BriefingEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionGroup<'a> {
    pub region: String,
    pub countries: Vec<CountryGroup<'a>>,
}

/// Group entries by region, then by country combination
///
/// SG-attention entries come first inside every group; otherwise the input
/// order is kept. Regions and countries are sorted case-insensitively, with
/// the country-less group last in its region.
pub fn group_entries(entries: &[BriefingEntry]) -> Vec<RegionGroup<'_>> {
    let mut sorted: Vec<&BriefingEntry> = entries.iter().collect();
    sorted.sort_by_key(|entry| entry.priority() != Priority::SgAttention);

    let mut regions: BTreeMap<&str, BTreeMap<(bool, String), Vec<&BriefingEntry>>> =
        BTreeMap::new();
    for entry in sorted {
        let key = entry.country.group_key();
        regions
            .entry(entry.region.as_str())
            .or_default()
            .entry((key.is_empty(), key))
            .or_default()
            .push(entry);
    }

    let mut groups: Vec<RegionGroup<'_>> = regions
        .into_iter()
        .map(|(region, countries)| {
            let mut countries: Vec<CountryGroup<'_>> = countries
                .into_iter()
                .map(|((_, country), entries)| CountryGroup { country, entries })
                .collect();
            countries.sort_by_cached_key(|group| {
                (group.country.is_empty(), group.country.to_lowercase())
            });
            RegionGroup {
                region: region.to_string(),
                countries,
            }
        })
        .collect();
    groups.sort_by_cached_key(|group| group.region.to_lowercase());
    groups
}
