/*!

Host crate for the RDPC-101 USB AM/FM radio tuner, made using the pure-rust
[`nusb`] crate for USB interfacing.

The tuner is a HID device: it reports its state (tuned frequency, stereo/mono,
signal strength, and whether its hardware seek is still running) in a small
status report, and takes every command as a 3-byte feature report. There is no
reply to a command; the only way to see its effect is to read the status again.

The standard entry point for this library is [`open_tuner()`], which will open
the first available tuner. [`list_tuner_devices()`] enumerates all of them.

Frequencies go through a [`BandMap`], which holds the regional band table the
tuner is used with and resolves a free-form user frequency (`"95.5"` or
`"999"`) onto a band and channel.

Here's what tuning to a station and printing the result looks like:

```no_run
use std::time::Duration;

use anyhow::{Result, anyhow};
use rdpc101::{BandMap, Region, SeekWait};

fn main() -> Result<()> {
    let map = BandMap::for_region(Region::Japan);
    let tuning = map
        .tuning_freq(80.0, false)
        .ok_or_else(|| anyhow!("frequency out of range"))?;

    let mut tuner = rdpc101::open_tuner()?;
    let wait = SeekWait::default().with_timeout(Duration::from_secs(10));
    let status = tuner.tune(&map, &tuning, &wait)?;

    println!(
        "{} {} {} {}dB",
        map.band_name(status.freq_raw),
        map.format_freq(status.freq_raw),
        status.channel_mode,
        status.signal_intensity
    );
    Ok(())
}
```

The tuner's interface is released when the [`Tuner`] is dropped, on every exit
path.

*/

#![warn(missing_docs)]

mod band;
mod consts;
mod error;
mod scan;
mod status;
pub mod transport;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::consts::*;

pub use crate::band::{AM_INDEX, Band, BandKind, BandMap, FM_INDEX, Region, Tuning};
pub use crate::error::Error;
pub use crate::status::{ChannelMode, DeviceStatus};
pub use crate::transport::{Transport, UsbTransport};

/// Direction of a hardware seek.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekDirection {
    /// Toward higher frequencies.
    Up,
    /// Toward lower frequencies.
    Down,
}

impl SeekDirection {
    fn as_u8(self) -> u8 {
        match self {
            Self::Up => 0x01,
            Self::Down => 0x02,
        }
    }
}

/// A flag for stopping a wait on the tuner from elsewhere, like a signal
/// handler.
///
/// Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Make a new, un-raised flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Any wait checking it gives up at its next poll.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Check if the flag has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// How to wait for the tuner's seek to settle.
///
/// The tuner never signals completion, so waiting means reading the status
/// every `poll_interval` until the seeking bit clears. Without a timeout or a
/// cancel flag, a tuner that never clears the bit blocks forever.
#[derive(Clone, Debug)]
pub struct SeekWait {
    /// Delay between status reads.
    pub poll_interval: Duration,
    /// Give up with [`Error::SeekTimeout`] after this long.
    pub timeout: Option<Duration>,
    /// Give up with [`Error::Cancelled`] once this is raised.
    pub cancel: Option<CancelFlag>,
}

impl Default for SeekWait {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            timeout: None,
            cancel: None,
        }
    }
}

impl SeekWait {
    /// Set the delay between status reads.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set a deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a cancel flag.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

/// A tuner device descriptor, which can be opened.
///
/// These are returned from calling [`list_tuner_devices`], but can also be
/// formed by trying to convert a [`nusb::DeviceInfo`] into one.
pub struct TunerDescriptor {
    info: nusb::DeviceInfo,
}

impl TunerDescriptor {
    /// A stable path for this device, `"<bus>:<address>"`.
    pub fn path(&self) -> String {
        format!(
            "{:03}:{:03}",
            self.info.bus_number(),
            self.info.device_address()
        )
    }

    /// Get the serial number of this tuner, as a string.
    pub fn serial(&self) -> Option<&str> {
        self.info.serial_number()
    }

    /// Try and open this tuner.
    pub fn open(self) -> Result<Tuner, Error> {
        let path = self.path();
        let device = self.info.open()?;
        let transport = UsbTransport::open(&device)?;
        tracing::debug!(%path, "opened tuner");
        Ok(Tuner::new(transport))
    }
}

/// Try and turn any [`nusb::DeviceInfo`] descriptor into a tuner, failing if
/// the VID and PID don't match.
impl TryFrom<nusb::DeviceInfo> for TunerDescriptor {
    type Error = &'static str;
    fn try_from(value: nusb::DeviceInfo) -> Result<Self, Self::Error> {
        if value.vendor_id() != RDPC101_USB_VID {
            Err("VID doesn't match for RDPC-101")
        } else if value.product_id() != RDPC101_USB_PID {
            Err("VID recognized, PID not recognized")
        } else {
            Ok(TunerDescriptor { info: value })
        }
    }
}

/// List all available tuners, sorted by [path][TunerDescriptor::path].
pub fn list_tuner_devices() -> Result<Vec<TunerDescriptor>, std::io::Error> {
    let mut devices = nusb::list_devices()?
        .filter(|d| d.vendor_id() == RDPC101_USB_VID && d.product_id() == RDPC101_USB_PID)
        .map(|d| TunerDescriptor { info: d })
        .collect::<Vec<TunerDescriptor>>();
    devices.sort_by_key(TunerDescriptor::path);
    Ok(devices)
}

/// Open the first detected tuner in the system.
///
/// This is a shortcut for calling [`list_tuner_devices`] and opening the first
/// one.
pub fn open_tuner() -> Result<Tuner, Error> {
    list_tuner_devices()?
        .into_iter()
        .next()
        .ok_or(Error::NoDevice)?
        .open()
}

/// Open the tuner at a given [path][TunerDescriptor::path].
pub fn open_tuner_path(path: &str) -> Result<Tuner, Error> {
    list_tuner_devices()?
        .into_iter()
        .find(|d| d.path() == path)
        .ok_or_else(|| Error::DevicePath(path.to_owned()))?
        .open()
}

/// A tuner. This is the main struct for talking to the RDPC-101.
///
/// The last status report read is cached. Reading a field with `force` unset
/// only goes to the device if nothing has been read yet; [`refresh`] always
/// does, and so does [`is_seeking`].
///
/// [`refresh`]: Tuner::refresh
/// [`is_seeking`]: Tuner::is_seeking
pub struct Tuner<T: Transport = UsbTransport> {
    transport: T,
    status: Option<DeviceStatus>,
}

impl<T: Transport> Tuner<T> {
    /// Drive a tuner through an already-open transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            status: None,
        }
    }

    /// Read a fresh status report and cache it.
    pub fn refresh(&mut self) -> Result<DeviceStatus, Error> {
        let report = self.transport.read_report(STATUS_REPORT_LEN)?;
        let status = DeviceStatus::from_report(&report)?;
        self.status = Some(status);
        Ok(status)
    }

    /// The cached status, read first if there is none or `force` is set.
    pub fn status(&mut self, force: bool) -> Result<DeviceStatus, Error> {
        match self.status {
            Some(status) if !force => Ok(status),
            _ => self.refresh(),
        }
    }

    /// Tuned frequency, in the units of its band.
    pub fn frequency(&mut self, force: bool) -> Result<u16, Error> {
        Ok(self.status(force)?.freq_raw)
    }

    /// Mono or stereo reception.
    pub fn channel_mode(&mut self, force: bool) -> Result<ChannelMode, Error> {
        Ok(self.status(force)?.channel_mode)
    }

    /// Received signal strength, 0-255.
    pub fn signal_intensity(&mut self, force: bool) -> Result<u8, Error> {
        Ok(self.status(force)?.signal_intensity)
    }

    /// Check if a hardware seek is still running. Always reads the device.
    pub fn is_seeking(&mut self) -> Result<bool, Error> {
        Ok(self.refresh()?.seeking)
    }

    fn send(&mut self, op: Opcode, arg1: u8, arg2: u8) -> Result<(), Error> {
        tracing::debug!(?op, arg1, arg2, "feature report");
        self.transport.send_feature_report(&[op as u8, arg1, arg2])
    }

    /// Force mono or allow stereo reception.
    pub fn set_channel_mode(&mut self, mode: ChannelMode) -> Result<(), Error> {
        self.send(Opcode::ChannelMode, mode.as_u8(), 0x00)
    }

    /// Mute or unmute the audio output.
    pub fn set_mute(&mut self, mute: bool) -> Result<(), Error> {
        self.send(Opcode::Mute, u8::from(mute), 0x00)
    }

    /// Switch between AM and FM.
    pub fn set_band(&mut self, kind: BandKind) -> Result<(), Error> {
        self.send(Opcode::Band, kind.as_u8(), BAND_ARG2)
    }

    /// Tune to a raw frequency, in the units of the current band.
    pub fn set_freq(&mut self, freq: u16) -> Result<(), Error> {
        let [hi, lo] = freq.to_be_bytes();
        self.send(Opcode::SetFreq, hi, lo)
    }

    /// Start a hardware seek for the next station. Returns immediately; see
    /// [`wait_seeking`][Tuner::wait_seeking].
    pub fn seek(&mut self, direction: SeekDirection) -> Result<(), Error> {
        self.send(Opcode::Seek, direction.as_u8(), 0x00)
    }

    /// Block until the seeking bit clears.
    ///
    /// Reads the status, then sleeps `poll_interval` between reads. Stops
    /// early on the timeout or cancel flag in `wait`.
    pub fn wait_seeking(&mut self, wait: &SeekWait) -> Result<(), Error> {
        let start = Instant::now();
        while self.is_seeking()? {
            if let Some(timeout) = wait.timeout {
                if start.elapsed() >= timeout {
                    return Err(Error::SeekTimeout(timeout));
                }
            }
            if wait.is_cancelled() {
                return Err(Error::Cancelled);
            }
            std::thread::sleep(wait.poll_interval);
        }
        Ok(())
    }

    /// Release the tuner now instead of at drop.
    pub fn close(self) {}
}

impl<T: Transport> Drop for Tuner<T> {
    fn drop(&mut self) {
        self.transport.close();
    }
}
