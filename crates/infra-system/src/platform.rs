// Platform probe selection
//
// Picked once at startup; the core never branches on the operating system.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use valet_core::domain::Platform;
use valet_core::port::{ProbeError, StatusProbe};

use crate::{BrewProbe, SystemctlProbe};

/// Default limit for a single service manager invocation (10s)
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Probe for `platform`
///
/// # Errors
/// - ProbeError::Unsupported when no service manager adapter exists
pub fn probe_for(
    platform: Platform,
    command_timeout: Duration,
) -> Result<Arc<dyn StatusProbe>, ProbeError> {
    let probe: Arc<dyn StatusProbe> = match platform {
        Platform::Linux => Arc::new(SystemctlProbe::new(command_timeout)),
        Platform::Darwin => Arc::new(BrewProbe::new(command_timeout)),
        Platform::Windows | Platform::Other => {
            return Err(ProbeError::Unsupported(platform.to_string()))
        }
    };
    info!(platform = %platform, "Service manager selected");
    Ok(probe)
}

/// Probe for the platform this binary runs on
pub fn default_probe(command_timeout: Duration) -> Result<Arc<dyn StatusProbe>, ProbeError> {
    probe_for(Platform::current(), command_timeout)
}
