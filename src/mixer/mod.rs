//! Mixer channel mapping.
//!
//! Volume, sends and cue use dense measured tables instead of a fitted curve.
//! Lookups reuse the converter's `Resolved` result and the piecewise primitives.

pub mod reference;
pub mod table;

pub use reference::*;
pub use table::*;

use crate::convert::Resolved;
use crate::error::MappingError;

/// Channel tables by kind.
#[derive(Debug, Clone, PartialEq)]
pub struct MixerMapper {
    tables: Vec<ChannelTable>,
}

impl MixerMapper {
    /// Tables built from the reference gain law.
    pub fn standard() -> Result<Self, MappingError> {
        Ok(Self {
            tables: standard_channels()?,
        })
    }

    /// Tables loaded from a snapshot. A later table replaces an earlier one of the same kind.
    pub fn from_tables(tables: impl IntoIterator<Item = ChannelTable>) -> Self {
        let mut out: Vec<ChannelTable> = Vec::new();
        for table in tables {
            match out.iter_mut().find(|t| t.kind() == table.kind()) {
                Some(slot) => *slot = table,
                None => out.push(table),
            }
        }
        Self { tables: out }
    }

    pub fn tables(&self) -> &[ChannelTable] {
        &self.tables
    }

    pub fn table(&self, kind: ChannelKind) -> Result<&ChannelTable, MappingError> {
        self.tables
            .iter()
            .find(|t| t.kind() == kind)
            .ok_or_else(|| MappingError::UnknownParameter {
                device: "mixer".to_string(),
                parameter: kind.name().to_string(),
            })
    }

    pub fn db_to_normalized(&self, kind: ChannelKind, db: f64) -> Result<Resolved, MappingError> {
        self.table(kind)?.db_to_normalized(db)
    }

    pub fn normalized_to_db(&self, kind: ChannelKind, normalized: f64) -> Result<Resolved, MappingError> {
        self.table(kind)?.normalized_to_db(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_mapper_serves_every_channel() {
        let mapper = MixerMapper::standard().unwrap();
        for kind in ChannelKind::ALL {
            assert!(mapper.table(kind).is_ok());
        }
        let send = mapper.db_to_normalized(ChannelKind::Sends, -6.0).unwrap();
        let vol = mapper.db_to_normalized(ChannelKind::Volume, 0.0).unwrap();
        assert!((send.normalized - vol.normalized).abs() < 1e-12);
    }

    #[test]
    fn missing_channel_is_reported() {
        let volume = reference_volume().unwrap();
        let mapper = MixerMapper::from_tables(vec![volume]);
        assert!(matches!(
            mapper.normalized_to_db(ChannelKind::Cue, 0.5),
            Err(MappingError::UnknownParameter { .. })
        ));
    }
}
