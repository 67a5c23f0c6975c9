// systemd probe (Linux)
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use valet_core::port::{ProbeError, ProbeReading, StatusProbe};

use crate::command::{ensure_success, run_command};

/// How start/stop requests gain privileges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    /// Run `systemctl` directly
    None,
    /// Prefix with `pkexec` (polkit prompt)
    Pkexec,
}

impl Elevation {
    /// `None` when already root, `Pkexec` otherwise
    pub fn detect() -> Self {
        #[cfg(unix)]
        {
            if nix::unistd::geteuid().is_root() {
                return Elevation::None;
            }
        }
        Elevation::Pkexec
    }
}

/// Queries and controls units through `systemctl`
pub struct SystemctlProbe {
    command_timeout: Duration,
    elevation: Elevation,
}

impl SystemctlProbe {
    pub fn new(command_timeout: Duration) -> Self {
        Self {
            command_timeout,
            elevation: Elevation::detect(),
        }
    }

    pub fn with_elevation(mut self, elevation: Elevation) -> Self {
        self.elevation = elevation;
        self
    }

    /// Program and arguments for `systemctl <verb> <unit>`
    fn control_command<'a>(&self, verb: &'a str, unit: &'a str) -> (&'static str, Vec<&'a str>) {
        match self.elevation {
            Elevation::None => ("systemctl", vec![verb, unit]),
            Elevation::Pkexec => ("pkexec", vec!["systemctl", verb, unit]),
        }
    }

    async fn control(&self, verb: &str, unit: &str) -> Result<(), ProbeError> {
        let (program, args) = self.control_command(verb, unit);
        info!(unit = %unit, verb = %verb, elevation = ?self.elevation, "Requesting unit state change");
        let output = run_command(program, &args, self.command_timeout).await?;
        ensure_success(program, &args, &output)
    }
}

/// Interpret `systemctl is-active` stdout
///
/// `is-active` exits non-zero for every state but `active`, so only the
/// printed state is meaningful.
pub fn parse_is_active(unit: &str, stdout: &str) -> Result<ProbeReading, ProbeError> {
    let state = stdout.lines().next().unwrap_or("").trim();
    match state {
        "" => Err(ProbeError::InvalidOutput(format!(
            "systemctl printed no state for {}",
            unit
        ))),
        "active" => Ok(ProbeReading::new(true, format!("{} is running", unit))),
        "inactive" => Ok(ProbeReading::new(false, format!("{} is stopped", unit))),
        other => Ok(ProbeReading::new(false, format!("{} is {}", unit, other))),
    }
}

#[async_trait]
impl StatusProbe for SystemctlProbe {
    async fn check_status(&self, id: &str) -> Result<ProbeReading, ProbeError> {
        let output = run_command("systemctl", &["is-active", id], self.command_timeout).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let reading = parse_is_active(id, &stdout)?;
        debug!(unit = %id, is_running = reading.is_running, "systemctl is-active");
        Ok(reading)
    }

    async fn start(&self, id: &str) -> Result<(), ProbeError> {
        self.control("start", id).await
    }

    async fn stop(&self, id: &str) -> Result<(), ProbeError> {
        self.control("stop", id).await
    }
}
