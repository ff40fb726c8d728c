//! Duplicate pitch detection.

use crate::error::Result;
use crate::notes::resolve_key;
use crate::types::ParsedDescriptor;
use std::collections::BTreeMap;

/// How many samples share each key, and each key plus secondary group.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    /// Sample count per key.
    pub per_key: BTreeMap<u8, usize>,
    /// Sample count per key and secondary group tag.
    pub per_group: BTreeMap<(u8, String), usize>,
}

impl DuplicateReport {
    /// Count the samples of a parsed batch.
    pub fn from_descriptors(descriptors: &[ParsedDescriptor]) -> Result<Self> {
        let mut report = Self::default();
        for desc in descriptors {
            let key = resolve_key(&desc.note, desc.octave)?;
            *report.per_key.entry(key).or_default() += 1;
            *report
                .per_group
                .entry((key, desc.secondary_group_tag.clone()))
                .or_default() += 1;
        }
        Ok(report)
    }

    /// Whether any key is shared by more than one sample.
    pub fn has_duplicates(&self) -> bool {
        self.per_key.values().any(|&count| count > 1)
    }

    /// Keys shared by more than one sample, ascending.
    pub fn duplicate_keys(&self) -> Vec<u8> {
        self.per_key
            .iter()
            .filter(|&(_, &count)| count > 1)
            .map(|(&key, _)| key)
            .collect()
    }

    /// Key and group tag pairs carried by more than one sample, with counts.
    ///
    /// Samples in such a group land in the same band and only differ by
    /// selection once redistributed.
    pub fn shared_groups(&self) -> Vec<(u8, &str, usize)> {
        self.per_group
            .iter()
            .filter(|&(_, &count)| count > 1)
            .map(|((key, tag), &count)| (*key, tag.as_str(), count))
            .collect()
    }
}
