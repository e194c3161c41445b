use color_eyre::eyre::Context;
use rdpc101::{BandMap, DeviceStatus, list_tuner_devices};

/// One line of tuner status, e.g. `FM  80.00 MHz Stereo 42dB`.
pub fn status_line(map: &BandMap, status: &DeviceStatus) -> String {
    format!(
        "{} {:>10} {:<6} {}dB",
        map.band_name(status.freq_raw),
        map.format_freq(status.freq_raw),
        status.channel_mode,
        status.signal_intensity
    )
}

/// List every attached tuner along with its current status.
pub fn cmd(map: &BandMap) -> color_eyre::Result<()> {
    let devices = list_tuner_devices().wrap_err("Couldn't enumerate RDPC-101 tuners")?;
    if devices.is_empty() {
        println!("Couldn't find any RDPC-101 tuners");
        return Ok(());
    }

    for (i, dev) in devices.into_iter().enumerate() {
        let path = dev.path();
        let mut tuner = match dev.open() {
            Ok(tuner) => tuner,
            Err(e) => {
                println!("device {i}: ❌ Couldn't open tuner at {path}: {e}");
                continue;
            }
        };
        match tuner.refresh() {
            Ok(status) => println!("device {i}: {}", status_line(map, &status)),
            Err(e) => println!("device {i}: ❌ Failed to read status: {e}"),
        }
    }
    Ok(())
}
