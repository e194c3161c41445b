use std::time::Duration;

use anyhow::{Result, anyhow};
use rdpc101::{BandKind, BandMap, Region, SeekWait};

fn main() -> Result<()> {
    let map = BandMap::for_region(Region::Japan);
    let band = map
        .scan_span(BandKind::Fm)
        .ok_or_else(|| anyhow!("no FM band"))?;

    let mut tuner = rdpc101::open_tuner()?;

    // Each seek gets 5 seconds to settle, polled every 50 ms.
    let wait = SeekWait::default()
        .with_poll_interval(Duration::from_millis(50))
        .with_timeout(Duration::from_secs(5));

    // Sweep the band, printing every station found. The tuner goes back to
    // where it was afterwards.
    let count = tuner.scan(&map, &band, &wait, |status| {
        println!(
            "{:>10}  {:3}  {}",
            map.format_freq(status.freq_raw),
            status.signal_intensity,
            status.channel_mode
        );
    })?;
    println!("{count} stations");
    Ok(())
}
