//! Control-type classification.
//!
//! Decides whether a parameter gets a label map or a continuous fit, before any
//! regression runs. Rules, first match wins:
//!
//! 1. an explicit label map exists
//! 2. a single distinct numeric display: constant
//! 3. the descriptor declares the parameter quantized/binary
//! 4. label samples outnumber numeric samples
//! 5. two distinct numeric displays: binary
//! 6. at most `max_quantized_states` distinct numeric displays: quantized
//! 7. otherwise continuous

use std::collections::{HashMap, HashSet};

use crate::domain::{ControlType, ParameterDescriptor, SamplePair, SampleValue, format_number};
use crate::error::MappingError;
use crate::models::{LabelEntry, LabelMap};

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Every sample shows the same numeric display.
    Constant(f64),
    Labeled { control_type: ControlType, map: LabelMap },
    Continuous,
}

pub fn classify(
    descriptor: &ParameterDescriptor,
    samples: &[SamplePair],
    explicit: Option<&[LabelEntry]>,
    max_quantized_states: usize,
) -> Result<Classification, MappingError> {
    if let Some(entries) = explicit {
        let map = LabelMap::new(entries.to_vec())?;
        let control_type = if descriptor.control_type.is_labeled() {
            descriptor.control_type
        } else {
            labeled_type(map.len())
        };
        return Ok(Classification::Labeled { control_type, map });
    }
    if samples.is_empty() {
        return Ok(Classification::Continuous);
    }

    let distinct: HashSet<String> = samples.iter().map(|s| s.display.key()).collect();
    if distinct.len() == 1 {
        if let SampleValue::Numeric(v) = samples[0].display {
            return Ok(Classification::Constant(v));
        }
    }

    let labeled = |control_type: ControlType| -> Result<Classification, MappingError> {
        Ok(Classification::Labeled {
            control_type,
            map: label_map_from_samples(samples)?,
        })
    };

    if descriptor.control_type.is_labeled() {
        return labeled(descriptor.control_type);
    }

    let n_labels = samples.iter().filter(|s| matches!(s.display, SampleValue::Label(_))).count();
    let n_numeric = samples.len() - n_labels;
    if n_labels > n_numeric {
        return labeled(labeled_type(distinct.len()));
    }

    let numeric_distinct: HashSet<u64> = samples
        .iter()
        .filter_map(|s| s.display.as_number())
        .map(f64::to_bits)
        .collect();
    if numeric_distinct.len() == 2 && distinct.len() == 2 {
        return labeled(ControlType::Binary);
    }
    if numeric_distinct.len() <= max_quantized_states {
        return labeled(labeled_type(distinct.len()));
    }

    Ok(Classification::Continuous)
}

fn labeled_type(states: usize) -> ControlType {
    if states == 2 { ControlType::Binary } else { ControlType::Quantized }
}

/// Build a label map from samples.
///
/// Samples are grouped by normalized value; each group takes its most frequent
/// display (first seen on ties).
pub fn label_map_from_samples(samples: &[SamplePair]) -> Result<LabelMap, MappingError> {
    let mut groups: Vec<(f64, Vec<&SamplePair>)> = Vec::new();
    let mut index: HashMap<u64, usize> = HashMap::new();
    for s in samples {
        let slot = *index.entry(s.normalized.to_bits()).or_insert_with(|| {
            groups.push((s.normalized, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(s);
    }

    let entries = groups
        .into_iter()
        .map(|(normalized, members)| {
            let mut counts: Vec<(String, usize, &SamplePair)> = Vec::new();
            for m in members {
                let key = m.display.key();
                match counts.iter_mut().find(|(k, _, _)| *k == key) {
                    Some(entry) => entry.1 += 1,
                    None => counts.push((key, 1, m)),
                }
            }
            let mut winner = &counts[0];
            for c in &counts[1..] {
                if c.1 > winner.1 {
                    winner = c;
                }
            }
            label_entry(normalized, winner.2)
        })
        .collect();

    LabelMap::new(entries)
}

fn label_entry(normalized: f64, sample: &SamplePair) -> LabelEntry {
    match &sample.display {
        SampleValue::Numeric(v) => {
            let label = match &sample.unit {
                Some(unit) => format!("{} {unit}", format_number(*v)),
                None => format_number(*v),
            };
            LabelEntry::new(normalized, label, Some(*v))
        }
        SampleValue::Label(text) => LabelEntry::new(normalized, text.clone(), None),
    }
}
