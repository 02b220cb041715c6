pub mod auth_url;
pub mod completions;
pub mod discover;
pub mod policy;
pub mod run;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use rsprobe_client::SuiteConfig;
use rsprobe_core::CaseOutcome;
use std::path::PathBuf;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_DISCOVERY_ERROR: u8 = 3;

/// Configuration given on the command line. Each set field wins over the
/// config file or the environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub servers: Vec<String>,
    pub account: Option<String>,
    pub scope: Option<String>,
    pub spec_version: Option<u32>,
}

impl Overrides {
    pub fn apply(&self, config: &mut SuiteConfig) {
        if !self.servers.is_empty() {
            config.servers = self
                .servers
                .iter()
                .map(|s| s.trim().trim_end_matches('/').to_owned())
                .collect();
        }
        if let Some(account) = &self.account {
            config.account.clone_from(account);
        }
        if let Some(scope) = &self.scope {
            config.scope.clone_from(scope);
        }
        if self.spec_version.is_some() {
            config.spec_version = self.spec_version;
        }
    }
}

/// Load the file named by `--config`, or the environment, then apply flags.
pub fn load_config(overrides: &Overrides) -> Result<SuiteConfig, String> {
    let mut config = match &overrides.config {
        Some(path) => SuiteConfig::load(path)
            .map_err(|e| format!("config error: cannot load {}: {e}", path.display()))?,
        None => SuiteConfig::from_env().map_err(|e| e.to_string())?,
    };
    overrides.apply(&mut config);
    Ok(config)
}

pub fn load_validated(overrides: &Overrides) -> Result<SuiteConfig, String> {
    let config = load_config(overrides)?;
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn outcome_mark(outcome: &CaseOutcome) -> String {
    match outcome {
        CaseOutcome::Pass => Style::new().green().apply_to("✓").to_string(),
        CaseOutcome::Fail { .. } => Style::new().red().bold().apply_to("✗").to_string(),
        CaseOutcome::Skipped { .. } => Style::new().yellow().apply_to("-").to_string(),
    }
}
