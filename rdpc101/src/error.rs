use std::time::Duration;

/// An error from operating the tuner.
///
/// Some errors are recoverable:
///
/// - `Io` & `Transfer` may just be a failed report on the USB cable. Nothing
///   is retried; the operation that hit it gives up, but runs its cleanup
///   (unmute, band restore) first.
/// - `BandIndex`, `BandOverlap`, and `InvalidParameter` mean the arguments to a
///   function were out of range.
/// - `SeekTimeout` & `Cancelled` stop a poll on the seeking bit. The tuner
///   itself is still usable afterwards.
/// - `NoDevice` & `DevicePath` mean no tuner could be opened at all.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Underlying OS I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Transfer error from `nusb`.
    #[error("USB transfer error")]
    Transfer(#[from] nusb::transfer::TransferError),

    /// No tuner with the well-known VID/PID is attached.
    #[error("No RDPC-101 tuner found")]
    NoDevice,

    /// No tuner is attached at the given device path.
    #[error("No RDPC-101 tuner at path {0}")]
    DevicePath(String),

    /// The status report read back from the tuner was too short to decode.
    #[error("Status report too short ({len} bytes, need {needed})")]
    #[allow(missing_docs)]
    ShortReport { len: usize, needed: usize },

    /// A band table index was out of range.
    #[error("Band index {index} out of range (table has {len} bands)")]
    #[allow(missing_docs)]
    BandIndex { index: usize, len: usize },

    /// Two bands of a custom table overlap.
    #[error("Band {first} overlaps band {second}")]
    #[allow(missing_docs)]
    BandOverlap { first: usize, second: usize },

    /// Some argument to a function is invalid in a way not easily expressed as
    /// a range.
    #[error("Invalid Parameter: {0}")]
    InvalidParameter(&'static str),

    /// The tuner was still seeking when the deadline passed.
    #[error("Tuner still seeking after {0:?}")]
    SeekTimeout(Duration),

    /// Waiting on the tuner was cancelled.
    #[error("Cancelled while waiting for the tuner")]
    Cancelled,
}
