//! Reload server: owns the active kernel and installs new ones
//!
//! Single-threaded. Each request is designed and applied to completion
//! before the next one is received.

use super::channel::{ChannelError, ReloadChannel};
use super::sink::{DeviceSink, SinkError};
use crate::config::Verbosity;
use crate::filters::curve::ResponseCurve;
use crate::filters::design::{DesignError, FilterDesign, FilterDesigner};
use crate::spectrum::analysis::AchievedResponse;
use log::{info, warn};
use std::sync::Arc;

/// What happened to one reload request
#[derive(Debug)]
pub enum ReloadOutcome {
    /// New kernel is active; `failed` lists channels the device refused
    Installed { failed: Vec<usize> },

    /// New kernel is active but the device could not be opened
    DeviceUnavailable(SinkError),

    /// Request discarded, previous kernel still active
    Rejected(DesignError),
}

impl ReloadOutcome {
    /// Whether the request replaced the active kernel
    pub fn replaced_kernel(&self) -> bool {
        !matches!(self, ReloadOutcome::Rejected(_))
    }
}

pub struct ReloadServer<S: DeviceSink> {
    designer: FilterDesigner,
    sink: S,
    channels: usize,
    verbosity: Verbosity,

    /// Replaced on every successful design, never modified in place
    active: Arc<[f64]>,

    /// Achieved response of `active`
    response: AchievedResponse,
}

impl<S: DeviceSink> ReloadServer<S> {
    /// Create a server whose active kernel is the flat unity response
    pub fn new(
        mut designer: FilterDesigner,
        sink: S,
        channels: usize,
        verbosity: Verbosity,
    ) -> Result<Self, DesignError> {
        let design = designer.design(&ResponseCurve::flat())?;

        let mut server = Self {
            designer,
            sink,
            channels,
            verbosity,
            active: Arc::from(Vec::new()),
            response: AchievedResponse::default(),
        };
        server.accept(design);
        Ok(server)
    }

    /// Make `design` the active kernel and report its response
    fn accept(&mut self, design: FilterDesign) {
        if self.verbosity.reports() {
            design.response.log_table();
        }
        if self.verbosity.details() {
            design.response.log_taps(&design.kernel);
        }

        self.active = design.kernel.into();
        self.response = design.response;
    }

    /// Push the active kernel to every channel
    pub fn install_active(&mut self) -> ReloadOutcome {
        self.push_active()
    }

    /// Design a kernel for `spec` and install it
    pub fn reload(&mut self, spec: &str) -> ReloadOutcome {
        if self.verbosity.reports() {
            info!("Reloading amplification specifications: {:?}", spec);
        }

        let design = match self.designer.design_spec(spec) {
            Ok(design) => design,
            Err(e) => {
                if self.verbosity.reports() {
                    warn!("Rejected reload: {}", e);
                }
                return ReloadOutcome::Rejected(e);
            }
        };

        self.accept(design);
        self.push_active()
    }

    fn push_active(&mut self) -> ReloadOutcome {
        let mut handle = match self.sink.open() {
            Ok(handle) => handle,
            Err(e) => {
                if self.verbosity.reports() {
                    warn!("{}", e);
                }
                return ReloadOutcome::DeviceUnavailable(e);
            }
        };

        let mut failed = Vec::new();
        for channel in 0..self.channels {
            if let Err(e) = handle.apply_kernel(channel, &self.active) {
                if self.verbosity.reports() {
                    warn!("{}", e);
                }
                failed.push(channel);
            }
        }
        drop(handle);

        if self.verbosity.reports() && failed.is_empty() {
            info!(
                "Installed {}-tap kernel on {} channel(s)",
                self.active.len(),
                self.channels
            );
        }
        ReloadOutcome::Installed { failed }
    }

    /// Receive and process one request
    pub fn serve_one(&mut self, channel: &mut ReloadChannel) -> Result<ReloadOutcome, ChannelError> {
        let spec = channel.recv_request()?;
        Ok(self.reload(&spec))
    }

    /// Process requests forever, in arrival order
    pub fn serve(&mut self, channel: &mut ReloadChannel) -> ! {
        loop {
            if let Err(e) = self.serve_one(channel) {
                if self.verbosity.reports() {
                    warn!("{}", e);
                }
            }
        }
    }

    /// Kernel currently considered installed
    pub fn active_kernel(&self) -> &Arc<[f64]> {
        &self.active
    }

    /// Achieved response of the active kernel
    pub fn active_response(&self) -> &AchievedResponse {
        &self.response
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn designer(&self) -> &FilterDesigner {
        &self.designer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
