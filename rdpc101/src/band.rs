//! Broadcast band tables and tuning arithmetic.
//!
//! A [`BandMap`] is a fixed table of [`Band`]s for one region. It converts a
//! raw tuner frequency to its band, formats it for display, and turns a
//! free-form user frequency into something the tuner can be set to.
//!
//! Frequencies are kept in the tuner's native units: kHz for AM and
//! hundredths of a MHz for FM, so `9610` on an FM band is 96.10 MHz.
//!
//! # Example
//!
//! ```
//! use rdpc101::{BandKind, BandMap, Region};
//!
//! let map = BandMap::for_region(Region::Japan);
//!
//! // "80.05" lands in FM and is rounded onto the 100 kHz raster.
//! let tuning = map.tuning_freq(80.05, false).unwrap();
//! assert_eq!(tuning.freq, 8010);
//! assert_eq!(tuning.band.kind, BandKind::Fm);
//! assert_eq!(map.format_freq(tuning.freq), "80.10 MHz");
//!
//! // "999" is not an FM frequency, so it is taken as kHz.
//! let tuning = map.tuning_freq(999.0, false).unwrap();
//! assert_eq!(map.format_freq(tuning.freq), "999 kHz");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Table index of the AM scan preset, in every built-in region.
pub const AM_INDEX: usize = 0;
/// Table index of the (first) FM scan preset, in every built-in region.
pub const FM_INDEX: usize = 1;

/// Modulation of a band, as understood by the tuner's band command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BandKind {
    /// Amplitude modulation, units of kHz.
    Am,
    /// Frequency modulation, units of 10 kHz.
    Fm,
}

impl BandKind {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::Fm => 0x02,
            Self::Am => 0x80,
        }
    }

    /// Short display name, `"AM"` or `"FM"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Am => "AM",
            Self::Fm => "FM",
        }
    }
}

impl fmt::Display for BandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses `am`/`fm`, matched on the first letter, case-insensitive.
impl FromStr for BandKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('a') => Ok(Self::Am),
            Some('f') => Ok(Self::Fm),
            _ => Err("unsupported band, expected am or fm"),
        }
    }
}

/// One contiguous tunable range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Band {
    /// AM or FM.
    pub kind: BandKind,
    /// Lowest tunable frequency, inclusive.
    pub min: u16,
    /// Highest tunable frequency, inclusive.
    pub max: u16,
    /// Channel raster.
    pub step: u16,
}

impl Band {
    /// Make a new band. Nothing is checked until it goes into a [`BandMap`].
    pub const fn new(kind: BandKind, min: u16, max: u16, step: u16) -> Self {
        Self {
            kind,
            min,
            max,
            step,
        }
    }

    /// True if `freq` is within `[min, max]`.
    pub fn contains(&self, freq: u16) -> bool {
        (self.min..=self.max).contains(&freq)
    }

    /// Round `freq` to the nearest multiple of the step, ties going up.
    pub fn round_to_step(&self, freq: u16) -> u16 {
        let step = u32::from(self.step);
        let rounded = (u32::from(freq) + step / 2) / step * step;
        u16::try_from(rounded).unwrap_or(self.max)
    }
}

/// How far `user_freq * 100` may sit from an integer and still count as it.
const FM_NOISE: f64 = 1e-6;

/// Raw values below this are taken as AM kHz when no band claims them.
const AM_RAW_CEILING: u16 = 2000;
/// Raw values from this up (64.00 MHz) are taken as FM when no band claims
/// them.
const FM_RAW_FLOOR: u16 = 6400;

const JAPAN: &[Band] = &[
    Band::new(BandKind::Am, 531, 1602, 9),
    Band::new(BandKind::Fm, 7600, 9490, 10),
];

const WIDE: &[Band] = &[
    Band::new(BandKind::Am, 522, 1629, 9),
    Band::new(BandKind::Fm, 7600, 9000, 10),
    Band::new(BandKind::Fm, 9005, 10800, 5),
];

/// A built-in regional band table.
///
/// Neither table is the "right" one: pick whichever the tuner is sold for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    /// AM 531-1602 kHz, FM 76.00-94.90 MHz.
    Japan,
    /// AM 522-1629 kHz, FM 76.00-90.00 MHz at 100 kHz and 90.05-108.00 MHz at
    /// 50 kHz.
    Wide,
}

impl Region {
    fn bands(self) -> &'static [Band] {
        match self {
            Self::Japan => JAPAN,
            Self::Wide => WIDE,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Japan => f.write_str("japan"),
            Self::Wide => f.write_str("wide"),
        }
    }
}

impl FromStr for Region {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "japan" | "jp" => Ok(Self::Japan),
            "wide" | "world" => Ok(Self::Wide),
            _ => Err("unknown region, expected japan or wide"),
        }
    }
}

/// A user frequency resolved onto a band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tuning {
    /// Raw frequency to send to the tuner.
    pub freq: u16,
    /// The band `freq` is in.
    pub band: Band,
}

impl Tuning {
    /// True if this is an FM frequency.
    pub fn is_fm(&self) -> bool {
        self.band.kind == BandKind::Fm
    }
}

/// An ordered, non-overlapping table of bands.
#[derive(Clone, Debug)]
pub struct BandMap {
    bands: Vec<Band>,
}

impl BandMap {
    /// Build a band map from a custom table.
    ///
    /// Lookups search the table in order. The table must be non-empty, every
    /// band needs a nonzero step and `min <= max`, and no two bands may
    /// overlap.
    pub fn new(bands: Vec<Band>) -> Result<Self, Error> {
        if bands.is_empty() {
            return Err(Error::InvalidParameter("band table is empty"));
        }
        for band in bands.iter() {
            if band.step == 0 {
                return Err(Error::InvalidParameter("band step must be nonzero"));
            }
            if band.min > band.max {
                return Err(Error::InvalidParameter("band min is above band max"));
            }
        }
        for (first, a) in bands.iter().enumerate() {
            for (second, b) in bands.iter().enumerate().skip(first + 1) {
                if a.min <= b.max && b.min <= a.max {
                    return Err(Error::BandOverlap { first, second });
                }
            }
        }
        Ok(Self { bands })
    }

    /// The built-in table for a region.
    pub fn for_region(region: Region) -> Self {
        Self {
            bands: region.bands().to_vec(),
        }
    }

    /// All bands, in lookup order.
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// The first band containing `freq`, if any.
    pub fn band(&self, freq: u16) -> Option<Band> {
        self.bands.iter().copied().find(|b| b.contains(freq))
    }

    /// The band kind the tuner is on at `freq`.
    ///
    /// Uses the table first. A frequency outside every band, such as one the
    /// tuner was left on under another region's table, is classified by
    /// magnitude: below 2000 is AM kHz, 6400 and up is FM. Anything between
    /// is `None`.
    pub fn kind_of(&self, freq: u16) -> Option<BandKind> {
        if let Some(band) = self.band(freq) {
            return Some(band.kind);
        }
        match freq {
            f if f < AM_RAW_CEILING => Some(BandKind::Am),
            f if f >= FM_RAW_FLOOR => Some(BandKind::Fm),
            _ => None,
        }
    }

    /// Direct table access, for the fixed scan presets [`AM_INDEX`] and
    /// [`FM_INDEX`].
    pub fn band_by_index(&self, index: usize) -> Result<Band, Error> {
        self.bands.get(index).copied().ok_or(Error::BandIndex {
            index,
            len: self.bands.len(),
        })
    }

    /// `"AM"`, `"FM"`, or `"??"` if `freq` is in no band.
    pub fn band_name(&self, freq: u16) -> &'static str {
        self.band(freq).map_or("??", |b| b.kind.name())
    }

    /// Format a raw frequency with its unit, e.g. `"96.10 MHz"` or `"999 kHz"`.
    pub fn format_freq(&self, freq: u16) -> String {
        match self.band(freq).map(|b| b.kind) {
            Some(BandKind::Fm) => format!("{}.{:02} MHz", freq / 100, freq % 100),
            Some(BandKind::Am) => format!("{freq} kHz"),
            None => String::from("---- Hz"),
        }
    }

    /// The full sweep range for a band kind.
    ///
    /// Split tables (FM in [`Region::Wide`]) are merged: the result runs from
    /// the first matching band's minimum to the last one's maximum, with the
    /// first one's step.
    pub fn scan_span(&self, kind: BandKind) -> Option<Band> {
        let mut matching = self.bands.iter().filter(|b| b.kind == kind);
        let first = *matching.next()?;
        let last = matching.last().copied().unwrap_or(first);
        Some(Band {
            max: last.max,
            ..first
        })
    }

    /// Resolve a free-form user frequency.
    ///
    /// The same number is tried twice: first as MHz against the FM bands
    /// (`user_freq * 100`), then truncated to an integer as kHz against the AM
    /// bands. Unless `exact` is set, the result is rounded to the nearest
    /// channel of the matched band.
    ///
    /// Returns `None` if neither reading lands in a band.
    pub fn tuning_freq(&self, user_freq: f64, exact: bool) -> Option<Tuning> {
        if !user_freq.is_finite() || user_freq < 0.0 {
            return None;
        }

        // Snap only binary noise (90.05 * 100 = 9004.999...) onto the 10 kHz
        // grid. A real fraction such as 75.996 stays outside 76.00.
        let scaled = user_freq * 100.0;
        let nearest = scaled.round();
        let fm = if (scaled - nearest).abs() < FM_NOISE {
            nearest
        } else {
            scaled
        };
        if let Some(band) = self.bands.iter().copied().find(|b| {
            b.kind == BandKind::Fm && f64::from(b.min) <= fm && fm <= f64::from(b.max)
        }) {
            // Inside [min, max], so the nearest integer is too.
            let raw = nearest as u16;
            return Some(Tuning {
                freq: if exact { raw } else { band.round_to_step(raw) },
                band,
            });
        }

        let am = user_freq.trunc();
        if am > f64::from(u16::MAX) {
            return None;
        }
        let raw = am as u16;
        let band = self
            .bands
            .iter()
            .copied()
            .find(|b| b.kind == BandKind::Am && b.contains(raw))?;
        Some(Tuning {
            freq: if exact { raw } else { band.round_to_step(raw) },
            band,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn japan() -> BandMap {
        BandMap::for_region(Region::Japan)
    }

    #[test]
    fn band_edges_inclusive() {
        let map = japan();
        assert_eq!(map.band(531).unwrap().kind, BandKind::Am);
        assert_eq!(map.band(1602).unwrap().kind, BandKind::Am);
        assert_eq!(map.band(7600).unwrap().kind, BandKind::Fm);
        assert_eq!(map.band(9490).unwrap().kind, BandKind::Fm);
    }

    #[test]
    fn band_outside_all_ranges() {
        let map = japan();
        for freq in [0, 530, 1603, 5000, 7599, 9491, u16::MAX] {
            assert_eq!(map.band(freq), None, "{freq}");
        }
    }

    #[test]
    fn band_every_value_in_range() {
        for region in [Region::Japan, Region::Wide] {
            let map = BandMap::for_region(region);
            for band in map.bands() {
                for freq in band.min..=band.max {
                    assert_eq!(map.band(freq), Some(*band));
                }
            }
        }
    }

    #[test]
    fn band_by_index() {
        let map = japan();
        assert_eq!(map.band_by_index(AM_INDEX).unwrap().kind, BandKind::Am);
        assert_eq!(map.band_by_index(FM_INDEX).unwrap().kind, BandKind::Fm);
        assert!(matches!(
            map.band_by_index(2),
            Err(Error::BandIndex { index: 2, len: 2 })
        ));
    }

    #[test]
    fn band_name() {
        let map = japan();
        assert_eq!(map.band_name(999), "AM");
        assert_eq!(map.band_name(8000), "FM");
        assert_eq!(map.band_name(5000), "??");
    }

    #[test]
    fn format_am() {
        let map = japan();
        let s = map.format_freq(999);
        assert_eq!(s, "999 kHz");
        assert!(s.ends_with("kHz"));
    }

    #[test]
    fn format_fm_reconstructs() {
        let map = japan();
        for freq in (7600..=9490).step_by(7) {
            let s = map.format_freq(freq);
            let num = s.strip_suffix(" MHz").unwrap();
            let (whole, frac) = num.split_once('.').unwrap();
            assert_eq!(frac.len(), 2, "{s}");
            let whole: u16 = whole.parse().unwrap();
            let frac: u16 = frac.parse().unwrap();
            assert_eq!(whole * 100 + frac, freq);
        }
        assert_eq!(map.format_freq(8005), "80.05 MHz");
    }

    #[test]
    fn format_no_band() {
        assert_eq!(japan().format_freq(5000), "---- Hz");
    }

    #[test]
    fn tuning_fm_on_raster() {
        let t = BandMap::for_region(Region::Wide)
            .tuning_freq(95.5, false)
            .unwrap();
        assert_eq!(t.freq, 9550);
        assert_eq!(t.band, Band::new(BandKind::Fm, 9005, 10800, 5));
        assert!(t.is_fm());

        let t = japan().tuning_freq(80.0, false).unwrap();
        assert_eq!(t.freq, 8000);
        assert_eq!(t.band, Band::new(BandKind::Fm, 7600, 9490, 10));
    }

    #[test]
    fn tuning_fm_outside_japan_table() {
        assert_eq!(japan().tuning_freq(95.5, false), None);
    }

    #[test]
    fn tuning_am_on_raster() {
        let t = japan().tuning_freq(999.0, false).unwrap();
        assert_eq!(t.freq, 999);
        assert_eq!(t.band.kind, BandKind::Am);
        assert!(!t.is_fm());
    }

    #[test]
    fn tuning_out_of_range() {
        let map = japan();
        assert_eq!(map.tuning_freq(5000.0, false), None);
        assert_eq!(map.tuning_freq(5000.0, true), None);
        assert_eq!(map.tuning_freq(-95.5, false), None);
        assert_eq!(map.tuning_freq(f64::NAN, false), None);
        assert_eq!(map.tuning_freq(f64::INFINITY, false), None);
        assert_eq!(map.tuning_freq(1e12, false), None);
    }

    #[test]
    fn tuning_rounds_half_up() {
        let map = japan();
        // 1003 is 4 above 999 and 5 below 1008.
        assert_eq!(map.tuning_freq(1003.0, false).unwrap().freq, 999);
        assert_eq!(map.tuning_freq(1004.0, false).unwrap().freq, 1008);
        // 80.05 sits exactly between two 100 kHz channels.
        assert_eq!(map.tuning_freq(80.05, false).unwrap().freq, 8010);
        assert_eq!(map.tuning_freq(80.04, false).unwrap().freq, 8000);
    }

    #[test]
    fn tuning_am_truncates_fraction() {
        let map = japan();
        assert_eq!(map.tuning_freq(999.9, true).unwrap().freq, 999);
    }

    #[test]
    fn tuning_fm_rounds_float_noise() {
        // 96.1 * 100 is 9609.999... in binary floating point.
        let wide = BandMap::for_region(Region::Wide);
        assert_eq!(wide.tuning_freq(96.1, true).unwrap().freq, 9610);
        assert_eq!(wide.tuning_freq(90.05, true).unwrap().freq, 9005);
        let map = japan();
        assert_eq!(map.tuning_freq(80.1, true).unwrap().freq, 8010);
        assert_eq!(map.tuning_freq(94.9, true).unwrap().freq, 9490);
    }

    #[test]
    fn tuning_fm_edges_are_not_widened() {
        let map = japan();
        assert_eq!(map.tuning_freq(75.996, false), None);
        assert_eq!(map.tuning_freq(75.996, true), None);
        assert_eq!(map.tuning_freq(94.904, false), None);
        assert_eq!(map.tuning_freq(76.0, true).unwrap().freq, 7600);
        // Inside the band, a sub-resolution input still rounds to the grid.
        assert_eq!(map.tuning_freq(80.071, true).unwrap().freq, 8007);
    }

    #[test]
    fn kind_of_falls_back_to_magnitude() {
        let map = japan();
        assert_eq!(map.kind_of(999), Some(BandKind::Am));
        assert_eq!(map.kind_of(8000), Some(BandKind::Fm));
        // Outside the Japanese table, but clearly FM or AM.
        assert_eq!(map.kind_of(9610), Some(BandKind::Fm));
        assert_eq!(map.kind_of(1629), Some(BandKind::Am));
        assert_eq!(map.kind_of(5000), None);
    }

    #[test]
    fn tuning_exact_is_unrounded_and_stable() {
        let map = japan();
        let a = map.tuning_freq(80.07, true).unwrap();
        let b = map.tuning_freq(80.07, true).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.freq, 8007);
        assert_eq!(map.tuning_freq(1000.0, true).unwrap().freq, 1000);
    }

    #[test]
    fn rounding_law_over_all_bands() {
        for region in [Region::Japan, Region::Wide] {
            let map = BandMap::for_region(region);
            for band in map.bands() {
                for raw in band.min..=band.max {
                    let user = match band.kind {
                        BandKind::Fm => f64::from(raw) / 100.0,
                        BandKind::Am => f64::from(raw),
                    };
                    let t = map.tuning_freq(user, false).unwrap();
                    assert_eq!(t.band, *band);
                    assert_eq!(t.freq % band.step, 0, "{region} {raw}");
                    assert!(t.freq.abs_diff(raw) <= band.step / 2, "{region} {raw}");
                    assert!(band.contains(t.freq));
                }
            }
        }
    }

    #[test]
    fn wide_split_fm() {
        let map = BandMap::for_region(Region::Wide);
        let t = map.tuning_freq(100.07, false).unwrap();
        assert_eq!(t.freq, 10005);
        assert_eq!(t.band.step, 5);
        let t = map.tuning_freq(89.96, false).unwrap();
        assert_eq!(t.freq, 9000);
        assert_eq!(t.band.step, 10);
        // The gap between the two FM bands belongs to nothing.
        assert_eq!(map.tuning_freq(90.02, false), None);
    }

    #[test]
    fn scan_span_merges_split_bands() {
        let map = BandMap::for_region(Region::Wide);
        let fm = map.scan_span(BandKind::Fm).unwrap();
        assert_eq!((fm.min, fm.max, fm.step), (7600, 10800, 10));
        let am = map.scan_span(BandKind::Am).unwrap();
        assert_eq!((am.min, am.max), (522, 1629));

        let fm_only = BandMap::new(vec![Band::new(BandKind::Fm, 7600, 9490, 10)]).unwrap();
        assert_eq!(fm_only.scan_span(BandKind::Am), None);
    }

    #[test]
    fn custom_table_validation() {
        assert!(matches!(
            BandMap::new(vec![]),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            BandMap::new(vec![Band::new(BandKind::Am, 531, 1602, 0)]),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            BandMap::new(vec![Band::new(BandKind::Am, 1602, 531, 9)]),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            BandMap::new(vec![
                Band::new(BandKind::Am, 531, 1602, 9),
                Band::new(BandKind::Fm, 7600, 9490, 10),
                Band::new(BandKind::Am, 1600, 1700, 10),
            ]),
            Err(Error::BandOverlap { first: 0, second: 2 })
        ));
        assert!(BandMap::new(JAPAN.to_vec()).is_ok());
        assert!(BandMap::new(WIDE.to_vec()).is_ok());
    }

    #[test]
    fn parse_names() {
        assert_eq!("fm".parse::<BandKind>(), Ok(BandKind::Fm));
        assert_eq!("AM".parse::<BandKind>(), Ok(BandKind::Am));
        assert_eq!("Frequency".parse::<BandKind>(), Ok(BandKind::Fm));
        assert!("sw".parse::<BandKind>().is_err());
        assert!("".parse::<BandKind>().is_err());
        assert_eq!("JP".parse::<Region>(), Ok(Region::Japan));
        assert_eq!("world".parse::<Region>(), Ok(Region::Wide));
        assert_eq!(Region::Wide.to_string().parse::<Region>(), Ok(Region::Wide));
        assert!("mars".parse::<Region>().is_err());
    }
}
