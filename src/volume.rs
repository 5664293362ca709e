//! Integer volume factors and the effective volume they combine into.

use serde::{Deserialize, Serialize};

/// A volume factor in `0..=100_000`, where `100_000` is 100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Volume(u32);

impl Volume {
    pub const MAX: u32 = 100_000;
    pub const FULL: Volume = Volume(Self::MAX);
    pub const MUTE: Volume = Volume(0);

    /// Values above [`Volume::MAX`] are clamped.
    pub const fn new(value: u32) -> Self {
        if value > Self::MAX {
            Volume(Self::MAX)
        } else {
            Volume(value)
        }
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::FULL
    }
}

impl From<u32> for Volume {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Volume> for u32 {
    fn from(value: Volume) -> Self {
        value.0
    }
}

/// `volume * volume2 * global / 100_000^3`, always within `[0, 1]`.
pub fn effective_volume(volume: Volume, volume2: Volume, global: Volume) -> f64 {
    const SCALE: u64 = (Volume::MAX as u64) * (Volume::MAX as u64) * (Volume::MAX as u64);
    let product = volume.0 as u64 * volume2.0 as u64 * global.0 as u64;
    product as f64 / SCALE as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn half_times_three_quarters_is_three_eighths() {
        let v = effective_volume(Volume::new(50_000), Volume::new(75_000), Volume::FULL);
        assert_eq!(v, 0.375);
    }

    #[test]
    fn out_of_range_values_clamp_to_full() {
        assert_eq!(Volume::new(250_000), Volume::FULL);
        let parsed: Volume = serde_json::from_str("120000").unwrap();
        assert_eq!(parsed.get(), Volume::MAX);
    }

    #[test]
    fn any_mute_factor_silences() {
        assert_eq!(effective_volume(Volume::MUTE, Volume::FULL, Volume::FULL), 0.0);
        assert_eq!(effective_volume(Volume::FULL, Volume::FULL, Volume::MUTE), 0.0);
        assert_eq!(effective_volume(Volume::FULL, Volume::FULL, Volume::FULL), 1.0);
    }

    proptest! {
        #[test]
        fn effective_volume_matches_product(a in 0u32..=100_000, b in 0u32..=100_000, g in 0u32..=100_000) {
            let expected = (a as f64 / 100_000.0) * (b as f64 / 100_000.0) * (g as f64 / 100_000.0);
            let actual = effective_volume(Volume::new(a), Volume::new(b), Volume::new(g));
            prop_assert!((0.0..=1.0).contains(&actual));
            prop_assert!((actual - expected).abs() < 1e-12);
        }
    }
}
