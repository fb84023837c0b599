//! Discrete label maps for quantized and binary parameters.

use serde::{Deserialize, Serialize};

use crate::error::MappingError;

/// One discrete state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub normalized: f64,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_num: Option<f64>,
}

impl LabelEntry {
    pub fn new(normalized: f64, label: impl Into<String>, display_num: Option<f64>) -> Self {
        Self {
            normalized,
            label: label.into(),
            display_num,
        }
    }
}

/// Ordered discrete states, ascending and unique on the normalized value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LabelEntry>", into = "Vec<LabelEntry>")]
pub struct LabelMap {
    entries: Vec<LabelEntry>,
}

impl LabelMap {
    pub fn new(mut entries: Vec<LabelEntry>) -> Result<Self, MappingError> {
        if entries.is_empty() {
            return Err(MappingError::InvalidModel("label map has no entries".to_string()));
        }
        if entries.iter().any(|e| !e.normalized.is_finite()) {
            return Err(MappingError::InvalidModel("label map has a non-finite value".to_string()));
        }
        entries.sort_by(|a, b| a.normalized.total_cmp(&b.normalized));
        if let Some(w) = entries.windows(2).find(|w| w[0].normalized == w[1].normalized) {
            return Err(MappingError::InvalidModel(format!(
                "duplicate label value {}",
                w[0].normalized
            )));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[LabelEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry whose stored value is nearest to `normalized`.
    ///
    /// Ties go to the first entry in ascending order.
    pub fn nearest(&self, normalized: f64) -> &LabelEntry {
        let mut best = &self.entries[0];
        let mut best_dist = (best.normalized - normalized).abs();
        for e in &self.entries[1..] {
            let dist = (e.normalized - normalized).abs();
            if dist < best_dist {
                best = e;
                best_dist = dist;
            }
        }
        best
    }

    /// Entry whose numeric display is nearest to `value`.
    ///
    /// Ties go to the first entry in ascending order. `None` when no entry has
    /// a numeric display.
    pub fn nearest_display(&self, value: f64) -> Option<&LabelEntry> {
        let mut best: Option<(&LabelEntry, f64)> = None;
        for e in &self.entries {
            let Some(num) = e.display_num else { continue };
            let dist = (num - value).abs();
            match best {
                Some((_, d)) if dist >= d => {}
                _ => best = Some((e, dist)),
            }
        }
        best.map(|(e, _)| e)
    }

    /// Case-insensitive exact label match (first in ascending order).
    pub fn find_label(&self, label: &str) -> Option<&LabelEntry> {
        let wanted = label.trim();
        self.entries.iter().find(|e| e.label.eq_ignore_ascii_case(wanted))
    }

    /// `(min, max)` over numeric displays, if any.
    pub fn display_range(&self) -> Option<(f64, f64)> {
        let nums: Vec<f64> = self.entries.iter().filter_map(|e| e.display_num).collect();
        let min = nums.iter().copied().reduce(f64::min)?;
        let max = nums.iter().copied().reduce(f64::max)?;
        Some((min, max))
    }
}

impl TryFrom<Vec<LabelEntry>> for LabelMap {
    type Error = MappingError;

    fn try_from(entries: Vec<LabelEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<LabelMap> for Vec<LabelEntry> {
    fn from(map: LabelMap) -> Self {
        map.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_off() -> LabelMap {
        LabelMap::new(vec![LabelEntry::new(1.0, "On", None), LabelEntry::new(0.0, "Off", None)]).unwrap()
    }

    #[test]
    fn nearest_picks_closest_state() {
        let map = on_off();
        assert_eq!(map.nearest(0.3).label, "Off");
        assert_eq!(map.nearest(0.8).label, "On");
    }

    #[test]
    fn nearest_breaks_ties_toward_lower_value() {
        assert_eq!(on_off().nearest(0.5).label, "Off");
    }

    #[test]
    fn nearest_display_uses_numeric_labels_only() {
        let map = LabelMap::new(vec![
            LabelEntry::new(0.0, "12 dB", Some(12.0)),
            LabelEntry::new(0.5, "24 dB", Some(24.0)),
            LabelEntry::new(1.0, "48 dB", Some(48.0)),
        ])
        .unwrap();
        assert_eq!(map.nearest_display(30.0).unwrap().normalized, 0.5);
        assert_eq!(map.nearest_display(18.0).unwrap().normalized, 0.0);
        assert!(on_off().nearest_display(1.0).is_none());
    }

    #[test]
    fn label_lookup_ignores_case() {
        assert_eq!(on_off().find_label("on").unwrap().normalized, 1.0);
        assert!(on_off().find_label("Maybe").is_none());
    }

    #[test]
    fn duplicate_values_are_rejected() {
        let dup = LabelMap::new(vec![LabelEntry::new(0.5, "A", None), LabelEntry::new(0.5, "B", None)]);
        assert!(dup.is_err());
    }
}
