use super::{
    json_pretty, load_validated, outcome_mark, spin_fail, spin_ok, spinner, Overrides,
    EXIT_DISCOVERY_ERROR, EXIT_FAILURE, EXIT_SUCCESS,
};
use console::Style;
use rsprobe_core::{resolve_and_run, CaseOutcome, RunReport, ScenarioGroup, ServerReport};
use tracing::debug;

fn parse_groups(names: &[String]) -> Result<Vec<ScenarioGroup>, String> {
    if names.is_empty() {
        return Ok(ScenarioGroup::ALL.to_vec());
    }
    let mut groups = Vec::new();
    for name in names {
        let group = name
            .trim()
            .parse::<ScenarioGroup>()
            .map_err(|e| format!("config error: {e}"))?;
        if !groups.contains(&group) {
            groups.push(group);
        }
    }
    Ok(groups)
}

fn exit_code(report: &RunReport) -> u8 {
    if report.has_failures() {
        EXIT_FAILURE
    } else if report.has_setup_errors() {
        EXIT_DISCOVERY_ERROR
    } else {
        EXIT_SUCCESS
    }
}

pub fn run(overrides: &Overrides, group_names: &[String], json: bool) -> Result<u8, String> {
    let config = load_validated(overrides)?;
    if config.tokens.read_write.is_none() {
        return Err("config error: a read-write token is required (set TOKEN_READ_WRITE)".to_owned());
    }
    let groups = parse_groups(group_names)?;
    debug!("groups: {groups:?}");

    let mut report = RunReport::default();
    for server in &config.servers {
        let pb = (!json).then(|| spinner(&format!("testing {server}…")));
        let server_report = resolve_and_run(&config, server, &groups);
        if let Some(pb) = &pb {
            match &server_report.error {
                Some(e) => spin_fail(pb, &format!("{server}: {e}")),
                None => spin_ok(
                    pb,
                    &format!(
                        "{server}: storage at {} (draft {:02})",
                        server_report.base_url.as_deref().unwrap_or_default(),
                        server_report.version.unwrap_or_default()
                    ),
                ),
            }
        }
        if !json {
            print_server(&server_report);
        }
        report.servers.push(server_report);
    }

    if json {
        let payload = serde_json::json!({
            "success": report.success(),
            "summary": report.summary(),
            "servers": report.servers,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        let summary = report.summary();
        println!(
            "{} passed, {} failed, {} skipped across {} server(s)",
            summary.passed,
            summary.failed,
            summary.skipped,
            report.servers.len()
        );
    }
    Ok(exit_code(&report))
}

fn print_server(report: &ServerReport) {
    let dim = Style::new().dim();
    for group in &report.groups {
        println!("  {}", Style::new().bold().apply_to(group.group));
        for case in &group.cases {
            let detail = match &case.outcome {
                CaseOutcome::Pass => String::new(),
                CaseOutcome::Fail { reason } | CaseOutcome::Skipped { reason } => {
                    format!(": {reason}")
                }
            };
            println!("    {} {}{detail}", outcome_mark(&case.outcome), case.name);
            for warning in &case.warnings {
                println!("      {}", dim.apply_to(format!("warning: {warning}")));
            }
        }
    }
}
