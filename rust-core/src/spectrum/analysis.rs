//! Achieved-vs-requested response report for a designed kernel

use log::{debug, info};

/// Requested and achieved amplitude at one analysis bin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinResponse {
    /// Bin center frequency in Hz
    pub frequency: f64,

    /// Amplitude sampled from the response curve
    pub requested: f64,

    /// Magnitude of the kernel's spectrum at this bin
    pub achieved: f64,
}

impl BinResponse {
    /// Deviation from the requested amplitude in dB (power ratio)
    ///
    /// Infinite when exactly one side is zero, NaN when both are.
    pub fn deviation_db(&self) -> f64 {
        10.0 * (self.achieved / self.requested).log10()
    }
}

/// Per-bin response of a designed filter, bins 0..=N/2
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AchievedResponse {
    bins: Vec<BinResponse>,
    sample_rate: f64,
}

impl AchievedResponse {
    pub fn new(bins: Vec<BinResponse>, sample_rate: f64) -> Self {
        Self { bins, sample_rate }
    }

    pub fn bins(&self) -> &[BinResponse] {
        &self.bins
    }

    /// Bin closest to `frequency` (Hz)
    pub fn nearest(&self, frequency: f64) -> Option<&BinResponse> {
        let spacing = match self.bins.len() {
            0 => return None,
            1 => return self.bins.first(),
            len => self.sample_rate / (2 * (len - 1)) as f64,
        };
        let index = (frequency / spacing).round().max(0.0) as usize;
        self.bins.get(index.min(self.bins.len() - 1))
    }

    /// Largest |achieved - requested| over all bins
    pub fn max_abs_error(&self) -> f64 {
        self.bins
            .iter()
            .map(|b| (b.achieved - b.requested).abs())
            .fold(0.0, f64::max)
    }

    /// Emit the requested/achieved table, one line per bin
    pub fn log_table(&self) {
        for b in &self.bins {
            info!(
                "{:.1} Hz: requested {:.2}, got {:.7} (log10 = {:.2}), {:.7} dB",
                b.frequency,
                b.requested,
                b.achieved,
                b.achieved.log10(),
                b.deviation_db()
            );
        }
    }

    /// Emit every tap with its time offset
    pub fn log_taps(&self, kernel: &[f64]) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        for (i, tap) in kernel.iter().enumerate() {
            debug!("{:.3} ms: {:.3}", 1000.0 * i as f64 / self.sample_rate, tap);
        }
    }
}
