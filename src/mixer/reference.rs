//! Verified reference gain law for the host's channel faders.
//!
//! The fader curve is not algebraic. These anchors were measured on the host;
//! the dense table is a monotone cubic through them, so every anchor is
//! reproduced exactly and the curve never overshoots between anchors.

use crate::error::MappingError;
use crate::math::monotone_cubic;
use crate::mixer::table::{ChannelKind, ChannelTable};
use crate::models::{Breakpoint, PiecewiseCurve};

/// `(normalized, dB)` anchors of the volume fader.
pub const VOLUME_ANCHORS: [(f64, f64); 12] = [
    (0.0, -70.0),
    (0.05, -55.0),
    (0.1, -45.0),
    (0.2, -32.0),
    (0.3, -24.0),
    (0.4, -18.0),
    (0.5, -14.0),
    (0.6, -10.0),
    (0.7, -6.0),
    (0.8, -2.0),
    (0.85, 0.0),
    (1.0, 6.0),
];

/// Points in each dense channel table.
pub const TABLE_POINTS: usize = 401;

/// Send level relative to the volume law.
pub const SEND_OFFSET_DB: f64 = -6.0;

/// Dense volume table built from the anchors.
pub fn reference_volume() -> Result<ChannelTable, MappingError> {
    let xs: Vec<f64> = VOLUME_ANCHORS.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = VOLUME_ANCHORS.iter().map(|p| p.1).collect();
    let dense = monotone_cubic(&xs, &ys, TABLE_POINTS)
        .ok_or_else(|| MappingError::InvalidModel("volume anchors are not strictly ordered".to_string()))?;
    let curve = PiecewiseCurve::new(dense.into_iter().map(|(n, db)| Breakpoint::new(n, db)).collect())?;
    Ok(ChannelTable::new(ChannelKind::Volume, curve))
}

/// Volume, sends and cue tables, in `ChannelKind::ALL` order.
pub fn standard_channels() -> Result<Vec<ChannelTable>, MappingError> {
    let volume = reference_volume()?;
    let sends = volume.offset_by(ChannelKind::Sends, SEND_OFFSET_DB)?;
    let cue = volume.renamed(ChannelKind::Cue);
    Ok(vec![volume, sends, cue])
}
