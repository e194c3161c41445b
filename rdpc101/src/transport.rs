//! The HID report capability a [`Tuner`][crate::Tuner] is driven through.
//!
//! [`UsbTransport`] talks to real hardware with [`nusb`]. Anything else that
//! can read a status report and send a feature report, like a scripted fake
//! in tests, can stand in for it.
use futures_lite::future::block_on;
use nusb::transfer::{ControlOut, ControlType, Recipient, RequestBuffer};

use crate::Error;
use crate::consts::*;

/// Raw HID access to one tuner.
pub trait Transport {
    /// Read one input report of up to `len` bytes.
    fn read_report(&mut self, len: usize) -> Result<Vec<u8>, Error>;

    /// Send one feature report. The first byte is the report ID.
    fn send_feature_report(&mut self, report: &[u8]) -> Result<(), Error>;

    /// Release the device. Calling it again must be harmless.
    fn close(&mut self) {}
}

/// HID transport over a claimed USB interface.
///
/// Status reads come from the interrupt IN endpoint; feature reports go out as
/// HID class `SET_REPORT` control transfers. The interface is released on
/// [`close`][Transport::close] or drop, whichever comes first.
pub struct UsbTransport {
    interface: Option<nusb::Interface>,
}

impl UsbTransport {
    /// Detach the kernel HID driver and claim the tuner's interface.
    pub fn open(device: &nusb::Device) -> Result<Self, Error> {
        let interface = device.detach_and_claim_interface(HID_INTERFACE)?;
        Ok(Self {
            interface: Some(interface),
        })
    }

    fn interface(&self) -> Result<&nusb::Interface, Error> {
        self.interface.as_ref().ok_or(Error::InvalidParameter(
            "transport has already been closed",
        ))
    }
}

impl Transport for UsbTransport {
    fn read_report(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let interface = self.interface()?;
        let report = block_on(interface.interrupt_in(STATUS_ENDPOINT, RequestBuffer::new(len)))
            .into_result()?;
        tracing::trace!(?report, "status report");
        Ok(report)
    }

    fn send_feature_report(&mut self, report: &[u8]) -> Result<(), Error> {
        let id = *report
            .first()
            .ok_or(Error::InvalidParameter("feature report is empty"))?;
        let interface = self.interface()?;
        Ok(block_on(interface.control_out(ControlOut {
            control_type: ControlType::Class,
            recipient: Recipient::Interface,
            request: HID_SET_REPORT,
            value: (HID_REPORT_TYPE_FEATURE << 8) | u16::from(id),
            index: u16::from(HID_INTERFACE),
            data: report,
        }))
        .status?)
    }

    fn close(&mut self) {
        if self.interface.take().is_some() {
            tracing::debug!("released tuner interface");
        }
    }
}
