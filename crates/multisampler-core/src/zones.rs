//! Zone assignment: turns parsed sample names into key and secondary ranges.
//!
//! The assignment runs in stages, each producing new [`Zone`] values:
//!
//! 1. Group samples by resolved key.
//! 2. Within a key, give every secondary group a contiguous band of the active
//!    dimension, the topmost band always ending at 127.
//! 3. Optionally turn keys shared by several samples into round-robin
//!    clusters: full velocity, selection split evenly among the samples.
//! 4. Within every band, split the key axis at the midpoints between keys.
//! 5. Record key crossfades, then widen the key ranges by the fade width.
//! 6. Record crossfades on the active dimension.
//!
//! Redistribution runs before the key split so the clusters it creates join
//! the full velocity band and get their key ranges from it.

use crate::error::{Error, Result};
use crate::notes::resolve_key;
use crate::types::{Fade, ParsedDescriptor, Range, ValueMode, Zone, MIDI_MAX};
use std::collections::BTreeMap;

/// Parameters of a zone assignment run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZoneSettings {
    /// Crossfade width between neighbouring key ranges.
    pub key_fade: u8,
    /// Dimension driven by the numbers in the file names.
    pub mode: ValueMode,
    /// Crossfade width between neighbouring bands of the active dimension.
    pub secondary_fade: u8,
    /// Fade width for even selection redistribution, `None` to skip it.
    pub redistribute_fade: Option<u8>,
}

/// Assign key and secondary ranges to every parsed sample.
///
/// Zones come out ordered by key, then by band, then in input order.
///
/// # Errors
///
/// - [`Error::NoSamples`] if `descriptors` is empty
/// - [`Error::InvalidNote`] if a note token does not resolve to a key in 0-127
pub fn assign_zones(descriptors: &[ParsedDescriptor], settings: &ZoneSettings) -> Result<Vec<Zone>> {
    if descriptors.is_empty() {
        return Err(Error::NoSamples);
    }

    let by_key = group_by_key(descriptors)?;

    let mut zones = Vec::with_capacity(descriptors.len());
    for (key, members) in &by_key {
        zones.extend(assign_bands(*key, members, settings.mode));
    }

    let zones = match settings.redistribute_fade {
        Some(fade) if settings.mode == ValueMode::Velocity => redistribute(zones, fade),
        Some(_) => {
            log::warn!("Redistribution only applies in velocity mode, skipping it");
            zones
        }
        None => zones,
    };

    let zones = assign_key_ranges(zones, settings.mode);
    let zones: Vec<Zone> = zones
        .into_iter()
        .map(|zone| apply_key_fade(zone, settings.key_fade))
        .map(|zone| apply_secondary_fade(zone, settings.mode, settings.secondary_fade))
        .collect();

    for zone in &zones {
        log::debug!(
            "{}: key {} keys {} vel {} sel {}",
            zone.source_name,
            zone.key,
            zone.key_range,
            zone.velocity,
            zone.select
        );
    }

    Ok(zones)
}

/// Partition descriptors by resolved key, keys ascending, input order kept.
pub fn group_by_key(descriptors: &[ParsedDescriptor]) -> Result<BTreeMap<u8, Vec<&ParsedDescriptor>>> {
    let mut groups: BTreeMap<u8, Vec<&ParsedDescriptor>> = BTreeMap::new();
    for desc in descriptors {
        let key = resolve_key(&desc.note, desc.octave)?;
        groups.entry(key).or_default().push(desc);
    }
    Ok(groups)
}

/// Give each secondary group of one key a band of the active dimension.
///
/// Groups are ordered by the secondary value of their first member (127 when
/// absent). Each band runs from one above the previous band's value up to its
/// own value; the last band is stretched to 127. Groups whose values coincide
/// share a band. The inactive dimension is always the full range.
pub fn assign_bands(key: u8, members: &[&ParsedDescriptor], mode: ValueMode) -> Vec<Zone> {
    // Secondary groups in order of first appearance
    let mut groups: Vec<(&str, Vec<&ParsedDescriptor>)> = Vec::new();
    for desc in members {
        let tag = desc.secondary_group_tag.as_str();
        match groups.iter_mut().find(|(t, _)| *t == tag) {
            Some((_, group)) => group.push(*desc),
            None => groups.push((tag, vec![*desc])),
        }
    }

    let mut bands: Vec<(u8, Vec<&ParsedDescriptor>)> = groups
        .into_iter()
        .map(|(_, group)| (group[0].secondary_or_default(), group))
        .collect();
    bands.sort_by_key(|(value, _)| *value);

    let mut merged: Vec<(u8, Vec<&ParsedDescriptor>)> = Vec::with_capacity(bands.len());
    for (value, group) in bands {
        if let Some((last, existing)) = merged.last_mut() {
            if *last == value {
                existing.extend(group);
                continue;
            }
        }
        merged.push((value, group));
    }

    let mut zones = Vec::with_capacity(members.len());
    let mut running_min: u8 = 0;
    let count = merged.len();

    for (i, (value, group)) in merged.into_iter().enumerate() {
        let high = if i + 1 == count { MIDI_MAX } else { value };
        let band = Range::new(running_min, high);
        running_min = value.saturating_add(1);

        for desc in group {
            let zone = Zone {
                source_name: desc.full_name.clone(),
                key,
                key_range: Range::FULL,
                key_fade: Fade::NONE,
                velocity: Range::FULL,
                velocity_fade: Fade::NONE,
                select: Range::FULL,
                select_fade: Fade::NONE,
                secondary_group_tag: desc.secondary_group_tag.clone(),
                redistributed: false,
            };
            zones.push(zone.with_active(mode, band, Fade::NONE));
        }
    }

    zones
}

/// Split the key axis among the zones of every band.
///
/// Zones are grouped by the upper bound of their active band; within a band
/// the key ranges jointly cover 0-127 without overlap. Zones of a band that
/// share a key (round-robin duplicates) share that key's range.
pub fn assign_key_ranges(zones: Vec<Zone>, mode: ValueMode) -> Vec<Zone> {
    let mut bands: BTreeMap<u8, BTreeMap<u8, Vec<usize>>> = BTreeMap::new();
    for (index, zone) in zones.iter().enumerate() {
        bands
            .entry(zone.active(mode).high)
            .or_default()
            .entry(zone.key)
            .or_default()
            .push(index);
    }

    let mut ranges = vec![Range::FULL; zones.len()];
    for by_key in bands.values() {
        let keys: Vec<u8> = by_key.keys().copied().collect();
        for (indices, range) in by_key.values().zip(split_key_ranges(&keys)) {
            for &index in indices {
                ranges[index] = range;
            }
        }
    }

    zones
        .into_iter()
        .zip(ranges)
        .map(|(zone, key_range)| {
            if !key_range.contains(zone.key) {
                log::debug!(
                    "{}: root {} lies outside its key range {}",
                    zone.source_name,
                    zone.key,
                    key_range
                );
            }
            Zone { key_range, ..zone }
        })
        .collect()
}

/// Midpoint split of the key axis for keys sorted ascending.
///
/// The first range starts at 0 and the last ends at 127. In between, a key
/// reaches down to `key - floor(gap_below / 2) + 1` and up to
/// `key + floor((gap_above + 1) / 2)`, both clamped to 0-127.
///
/// Away from the top of the keyboard each lower bound is exactly one above the
/// previous upper bound, so the ranges are contiguous. Two edge cases follow
/// from the formula and are kept as is:
///
/// - For keys one semitone apart the upper key's range starts one above the
///   key itself, so it does not contain its own root.
/// - Near 127 the clamp makes neighbours overlap: keys 126 and 127 give
///   `0-127` and `127-127`.
pub fn split_key_ranges(keys: &[u8]) -> Vec<Range> {
    let last = keys.len().saturating_sub(1);
    let clamp = |value: i32| value.clamp(0, MIDI_MAX as i32) as u8;

    keys.iter()
        .enumerate()
        .map(|(i, &key)| {
            let key_i = key as i32;
            let low = if i == 0 {
                0
            } else {
                let prev = keys[i - 1] as i32;
                clamp(key_i - (key_i - prev) / 2 + 1)
            };
            let high = if i == last {
                MIDI_MAX
            } else {
                let next = keys[i + 1] as i32;
                clamp(key_i + (next - key_i + 1) / 2)
            };
            Range::new(low, high)
        })
        .collect()
}

/// Record the key crossfade and widen the key range by `fade`.
///
/// Fade widths are measured on the range before widening: they are limited by
/// the distance from the root key and by half the range width, and are zero at
/// 0 and 127.
pub fn apply_key_fade(zone: Zone, fade: u8) -> Zone {
    let range = zone.key_range;
    let half = range.width() / 2;

    let low = if range.low == 0 {
        0
    } else {
        fade.min(zone.key.abs_diff(range.low)).min(half)
    };
    let high = if range.high == MIDI_MAX {
        0
    } else {
        fade.min(range.high.abs_diff(zone.key)).min(half)
    };

    let widened = Range::new(
        range.low.saturating_sub(fade),
        range.high.saturating_add(fade).min(MIDI_MAX),
    );

    Zone {
        key_range: widened,
        key_fade: Fade { low, high },
        ..zone
    }
}

/// Record the crossfade of the active dimension.
///
/// The width never exceeds half the band and is zero at 0 and 127. The band
/// itself is left as is.
pub fn apply_secondary_fade(zone: Zone, mode: ValueMode, fade: u8) -> Zone {
    let band = zone.active(mode);
    let fade = edge_fade(band, fade);
    zone.with_active(mode, band, fade)
}

fn edge_fade(range: Range, fade: u8) -> Fade {
    let width = fade.min(range.width() / 2);
    Fade {
        low: if range.low == 0 { 0 } else { width },
        high: if range.high == MIDI_MAX { 0 } else { width },
    }
}

/// Spread samples sharing a key evenly over the selection axis.
///
/// Every key with more than one zone becomes a round-robin cluster: its
/// velocity bands are dropped in favour of the full range, and the selection
/// axis is split into equal bands, one per zone in zone order, each inflated
/// outward by `fade`. Key ranges are left for the key split to assign.
pub fn redistribute(zones: Vec<Zone>, fade: u8) -> Vec<Zone> {
    let mut clusters: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (index, zone) in zones.iter().enumerate() {
        clusters.entry(zone.key).or_default().push(index);
    }

    let mut selections: Vec<Option<(Range, Fade)>> = vec![None; zones.len()];
    for (key, indices) in &clusters {
        if indices.len() < 2 {
            continue;
        }
        log::debug!(
            "Redistributing {} samples on key {} over selection",
            indices.len(),
            key
        );
        for (position, &index) in indices.iter().enumerate() {
            let band = even_band(position, indices.len());
            let inflated = Range::new(
                band.low.saturating_sub(fade),
                band.high.saturating_add(fade).min(MIDI_MAX),
            );
            selections[index] = Some((inflated, edge_fade(band, fade)));
        }
    }

    zones
        .into_iter()
        .zip(selections)
        .map(|(zone, selection)| match selection {
            Some((select, select_fade)) => Zone {
                velocity: Range::FULL,
                velocity_fade: Fade::NONE,
                select,
                select_fade,
                redistributed: true,
                ..zone
            },
            None => zone,
        })
        .collect()
}

/// Band `index` of `count` equal bands of width 127 / count over 0-127.
///
/// With more than 128 bands some of them collapse onto the same value.
pub fn even_band(index: usize, count: usize) -> Range {
    let max = MIDI_MAX as usize;
    let count = count.max(1);

    let high = if index + 1 >= count {
        max
    } else {
        (index + 1) * max / count
    };
    let low = if index == 0 { 0 } else { index * max / count + 1 };

    Range::new(low.min(high) as u8, high as u8)
}
