// Homebrew services probe (macOS)
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use valet_core::port::{ProbeError, ProbeReading, StatusProbe};

use crate::command::{ensure_success, run_command};

/// One entry of `brew services info <formula> --json`
#[derive(Debug, Deserialize)]
struct BrewServiceInfo {
    name: String,
    #[serde(default)]
    running: bool,
    #[serde(default)]
    status: Option<String>,
}

/// Queries and controls formulae through `brew services`
pub struct BrewProbe {
    command_timeout: Duration,
}

impl BrewProbe {
    pub fn new(command_timeout: Duration) -> Self {
        Self { command_timeout }
    }

    async fn control(&self, verb: &str, formula: &str) -> Result<(), ProbeError> {
        let args = ["services", verb, formula];
        info!(formula = %formula, verb = %verb, "Requesting brew service state change");
        let output = run_command("brew", &args, self.command_timeout).await?;
        ensure_success("brew", &args, &output)
    }
}

/// Interpret `brew services info --json` stdout
pub fn parse_services_info(formula: &str, stdout: &str) -> Result<ProbeReading, ProbeError> {
    let entries: Vec<BrewServiceInfo> = serde_json::from_str(stdout)
        .map_err(|e| ProbeError::InvalidOutput(format!("brew services info: {}", e)))?;
    let entry = entries
        .into_iter()
        .find(|e| e.name == formula)
        .ok_or_else(|| ProbeError::InvalidOutput(format!("brew has no service {}", formula)))?;

    if entry.running {
        return Ok(ProbeReading::new(true, format!("{} is running", formula)));
    }
    let message = match entry.status.as_deref() {
        Some("none") | None => format!("{} is stopped", formula),
        Some(status) => format!("{} is {}", formula, status),
    };
    Ok(ProbeReading::new(false, message))
}

#[async_trait]
impl StatusProbe for BrewProbe {
    async fn check_status(&self, id: &str) -> Result<ProbeReading, ProbeError> {
        let args = ["services", "info", id, "--json"];
        let output = run_command("brew", &args, self.command_timeout).await?;
        ensure_success("brew", &args, &output)?;
        let reading = parse_services_info(id, &String::from_utf8_lossy(&output.stdout))?;
        debug!(formula = %id, is_running = reading.is_running, "brew services info");
        Ok(reading)
    }

    async fn start(&self, id: &str) -> Result<(), ProbeError> {
        self.control("start", id).await
    }

    async fn stop(&self, id: &str) -> Result<(), ProbeError> {
        self.control("stop", id).await
    }
}
