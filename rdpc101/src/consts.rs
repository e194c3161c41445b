pub const RDPC101_USB_VID: u16 = 0x10c4;
pub const RDPC101_USB_PID: u16 = 0x818a;

/// HID interface carrying both the status reports and the feature reports.
pub const HID_INTERFACE: u8 = 0;
/// Interrupt IN endpoint the status report arrives on.
pub const STATUS_ENDPOINT: u8 = 0x81;
/// Size of the buffer handed to each status read.
pub const STATUS_REPORT_LEN: usize = 64;

pub const STATUS_INDEX_MODE: usize = 1;
pub const STATUS_INDEX_INTENSITY: usize = 2;
pub const STATUS_INDEX_FREQ_HI: usize = 3;
pub const STATUS_INDEX_FREQ_LO: usize = 4;

pub const MODE_STEREO_MASK: u8 = 0x01;
pub const MODE_SEEKING_MASK: u8 = 1 << 4;

/// HID class request: SET_REPORT.
pub const HID_SET_REPORT: u8 = 0x09;
/// HID report type "feature", as the high byte of `wValue`.
pub const HID_REPORT_TYPE_FEATURE: u16 = 0x03;

/// First byte of every 3-byte feature report.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    SetFreq = 0x02,
    Mute = 0x05,
    ChannelMode = 0x06,
    Seek = 0x09,
    Band = 0x0a,
}

pub const BAND_ARG2: u8 = 0x02;
