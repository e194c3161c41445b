use std::time::Duration;

use clap::Args;
use color_eyre::eyre::eyre;
use rdpc101::{CancelFlag, Region, SeekWait};

#[derive(Args, Debug)]
pub struct TunerParams {
    /// Regional band table. `japan` is AM 531-1602 kHz & FM 76.0-94.9 MHz,
    /// `wide` is AM 522-1629 kHz & FM 76.0-108.0 MHz.
    #[arg(long, env = "RDPC101_REGION", default_value_t = Region::Japan)]
    pub region: Region,

    /// Delay between status polls while the tuner is seeking, in milliseconds.
    #[arg(long = "poll-ms", default_value_t = 100)]
    poll_ms: u64,

    /// Give up on a seek that hasn't settled after this many seconds. 0 waits
    /// forever.
    #[arg(long = "seek-timeout", default_value_t = 30.0)]
    seek_timeout_s: f64,
}

impl TunerParams {
    pub fn seek_wait(&self, cancel: CancelFlag) -> color_eyre::Result<SeekWait> {
        if !self.seek_timeout_s.is_finite() || self.seek_timeout_s < 0.0 {
            return Err(eyre!(
                "seek-timeout must be zero or a positive number of seconds, but got {}",
                self.seek_timeout_s
            ));
        }
        let mut wait = SeekWait::default()
            .with_poll_interval(Duration::from_millis(self.poll_ms))
            .with_cancel(cancel);
        if self.seek_timeout_s > 0.0 {
            wait = wait.with_timeout(Duration::from_secs_f64(self.seek_timeout_s));
        }
        Ok(wait)
    }
}
