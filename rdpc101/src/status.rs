//! Decoding of the tuner's status report.
//!
//! The tuner reports its state on the interrupt endpoint as a short byte
//! buffer:
//!
//! | Offset | Meaning |
//! |---|---|
//! | 1 | bit 0: stereo, bit 4: seek in progress |
//! | 2 | signal intensity, 0-255 |
//! | 3 | tuned frequency, high byte |
//! | 4 | tuned frequency, low byte |
use std::fmt;

use crate::Error;
use crate::consts::*;

/// Audio channel mode of the tuner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelMode {
    #[allow(missing_docs)]
    Mono,
    #[allow(missing_docs)]
    Stereo,
}

impl ChannelMode {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::Mono => 0x00,
            Self::Stereo => 0x01,
        }
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mono => f.pad("Mono"),
            Self::Stereo => f.pad("Stereo"),
        }
    }
}

/// A snapshot of one status report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceStatus {
    /// Mono or stereo reception.
    pub channel_mode: ChannelMode,
    /// The tuner's own seek is still running.
    pub seeking: bool,
    /// Received signal strength, 0-255.
    pub signal_intensity: u8,
    /// Tuned frequency, in the units of its band.
    pub freq_raw: u16,
}

impl DeviceStatus {
    /// Minimum report length that can be decoded.
    pub const MIN_LEN: usize = STATUS_INDEX_FREQ_LO + 1;

    /// Decode a status report.
    pub fn from_report(report: &[u8]) -> Result<Self, Error> {
        if report.len() < Self::MIN_LEN {
            return Err(Error::ShortReport {
                len: report.len(),
                needed: Self::MIN_LEN,
            });
        }
        let mode = report[STATUS_INDEX_MODE];
        Ok(Self {
            channel_mode: if mode & MODE_STEREO_MASK != 0 {
                ChannelMode::Stereo
            } else {
                ChannelMode::Mono
            },
            seeking: mode & MODE_SEEKING_MASK != 0,
            signal_intensity: report[STATUS_INDEX_INTENSITY],
            freq_raw: u16::from_be_bytes([
                report[STATUS_INDEX_FREQ_HI],
                report[STATUS_INDEX_FREQ_LO],
            ]),
        })
    }
}
