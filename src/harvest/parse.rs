//! Display-string parsing.
//!
//! Host display strings look like `"-6.0 dB"`, `"250 ms"`, `"1.20 kHz"`, `"Off"`
//! or `"-inf dB"`. The first number in the string is the value; whatever
//! follows it is the unit. Strings without a number are labels.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{SamplePair, SampleValue};

static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?").expect("number pattern compiles")
});

/// Parse a display string into a value and an optional unit.
pub fn parse_display(text: &str) -> (SampleValue, Option<String>) {
    let trimmed = text.trim();
    let Some(m) = FIRST_NUMBER.find(trimmed) else {
        return (SampleValue::Label(trimmed.to_string()), None);
    };
    let Ok(value) = m.as_str().parse::<f64>() else {
        return (SampleValue::Label(trimmed.to_string()), None);
    };
    if !value.is_finite() {
        return (SampleValue::Label(trimmed.to_string()), None);
    }

    let unit = trimmed[m.end()..].trim();
    let unit = (!unit.is_empty()).then(|| unit.to_string());
    (SampleValue::Numeric(value), unit)
}

/// First number in `text`, if any.
pub fn first_number(text: &str) -> Option<f64> {
    parse_display(text).0.as_number()
}

/// Most frequent unit among numeric samples (first seen wins ties).
pub fn infer_unit(samples: &[SamplePair]) -> Option<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (order, s) in samples.iter().enumerate() {
        if let (SampleValue::Numeric(_), Some(unit)) = (&s.display, s.unit.as_deref()) {
            counts.entry(unit).or_insert((0, order)).0 += 1;
        }
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.0.cmp(&b.1.0).then(b.1.1.cmp(&a.1.1)))
        .map(|(unit, _)| unit.to_string())
}
