//! Multi-step operations: tuning to a station, seeking, and band scans.
//!
//! Seek and scan mute the tuner while it moves around. Both always put things
//! back (unmute, and for a scan the original band and frequency) before
//! returning, whether the operation succeeded or not.
use crate::{
    Band, BandKind, BandMap, DeviceStatus, Error, SeekDirection, SeekWait, Transport, Tuner,
    Tuning,
};

/// Pick the error to report from an operation and its cleanup.
///
/// The operation's own failure wins; a cleanup failure is only returned if
/// the operation itself succeeded.
fn with_cleanup<R>(result: Result<R, Error>, cleanup: Result<(), Error>) -> Result<R, Error> {
    match (result, cleanup) {
        (Ok(r), Ok(())) => Ok(r),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup)) => {
            tracing::warn!(error = %cleanup, "cleanup failed after error");
            Err(e)
        }
    }
}

impl<T: Transport> Tuner<T> {
    /// Tune directly to a resolved frequency.
    ///
    /// The band and frequency commands are only sent if they differ from what
    /// the tuner is already on, as every retune is audible. Waits for the
    /// tuner to settle and returns its fresh status.
    pub fn tune(
        &mut self,
        map: &BandMap,
        target: &Tuning,
        wait: &SeekWait,
    ) -> Result<DeviceStatus, Error> {
        let cur_freq = self.frequency(false)?;
        let cur_band = map.band(cur_freq);

        if cur_band.map(|b| b.kind) != Some(target.band.kind) {
            self.set_band(target.band.kind)?;
        }
        if cur_freq != target.freq {
            self.set_freq(target.freq)?;
        }
        self.wait_seeking(wait)?;
        self.refresh()
    }

    /// Seek to the next station in `direction`.
    ///
    /// The tuner is muted for the duration of the seek, and unmuted again even
    /// if the seek fails or is cancelled.
    pub fn seek_station(
        &mut self,
        direction: SeekDirection,
        wait: &SeekWait,
    ) -> Result<DeviceStatus, Error> {
        self.set_mute(true)?;
        let result = self
            .seek(direction)
            .and_then(|()| self.wait_seeking(wait));
        let unmute = self.set_mute(false);
        with_cleanup(result, unmute)?;
        self.refresh()
    }

    /// Sweep `band` from bottom to top, calling `found` with the status of
    /// every station the tuner stops on.
    ///
    /// Pass a band from [`BandMap::scan_span`] or [`BandMap::band_by_index`].
    /// The sweep ends once the tuner reaches the band maximum, or when a seek
    /// fails to move it any higher (the tuner wrapped around), or with
    /// [`Error::Cancelled`] once the cancel flag is raised. Afterwards the
    /// original band and frequency are restored and the tuner is unmuted, even
    /// if the sweep failed. The original band comes from
    /// [`BandMap::kind_of`], so a frequency outside `map` still gets its band
    /// back.
    ///
    /// Returns the number of stations found.
    pub fn scan<F>(
        &mut self,
        map: &BandMap,
        band: &Band,
        wait: &SeekWait,
        mut found: F,
    ) -> Result<usize, Error>
    where
        F: FnMut(&DeviceStatus),
    {
        let orig_freq = self.frequency(false)?;
        let orig_kind = map.kind_of(orig_freq);

        self.set_mute(true)?;
        let result = self.sweep(band, wait, &mut found);
        let restore = self.restore(band.kind, orig_kind, orig_freq);
        with_cleanup(result, restore)
    }

    fn sweep(
        &mut self,
        band: &Band,
        wait: &SeekWait,
        found: &mut dyn FnMut(&DeviceStatus),
    ) -> Result<usize, Error> {
        tracing::debug!(kind = %band.kind, min = band.min, max = band.max, "starting scan");
        self.set_band(band.kind)?;
        self.set_freq(band.min)?;
        self.wait_seeking(wait)?;

        let mut prev = band.min;
        let mut cur = self.frequency(true)?;
        let mut count = 0;
        while cur < band.max {
            if wait.is_cancelled() {
                return Err(Error::Cancelled);
            }
            self.seek(SeekDirection::Up)?;
            self.wait_seeking(wait)?;
            let status = self.refresh()?;
            cur = status.freq_raw;
            if cur <= prev {
                tracing::debug!(cur, prev, "seek made no progress, ending scan");
                break;
            }
            found(&status);
            count += 1;
            prev = cur;
        }
        Ok(count)
    }

    fn restore(
        &mut self,
        scan_kind: BandKind,
        orig_kind: Option<BandKind>,
        orig_freq: u16,
    ) -> Result<(), Error> {
        let mut result = Ok(());
        if let Some(kind) = orig_kind {
            if kind != scan_kind {
                result = self.set_band(kind);
            }
        }
        let result = result.and_then(|()| self.set_freq(orig_freq));
        let unmute = self.set_mute(false);
        with_cleanup(result, unmute)
    }
}
