use crate::report::{CaseOutcome, CaseReport, GroupReport, RunReport, ServerReport};
use crate::scenarios::{self, CaseDef, CaseEnv};
use crate::{CaseError, CoreError, FixtureGenerator, ServerContext};
use chrono::Utc;
use rsprobe_client::SuiteConfig;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioGroup {
    Authorization,
    Create,
    Read,
    List,
    Update,
    Delete,
    Cors,
    Public,
}

impl ScenarioGroup {
    pub const ALL: [ScenarioGroup; 8] = [
        ScenarioGroup::Authorization,
        ScenarioGroup::Create,
        ScenarioGroup::Read,
        ScenarioGroup::List,
        ScenarioGroup::Update,
        ScenarioGroup::Delete,
        ScenarioGroup::Cors,
        ScenarioGroup::Public,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authorization => "authorization",
            Self::Create => "create",
            Self::Read => "read",
            Self::List => "list",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Cors => "cors",
            Self::Public => "public",
        }
    }

    pub fn cases(self) -> &'static [CaseDef] {
        match self {
            Self::Authorization => scenarios::authorization::CASES,
            Self::Create => scenarios::create::CASES,
            Self::Read => scenarios::read::CASES,
            Self::List => scenarios::list::CASES,
            Self::Update => scenarios::update::CASES,
            Self::Delete => scenarios::delete::CASES,
            Self::Cors => scenarios::cors::CASES,
            Self::Public => scenarios::public::CASES,
        }
    }
}

impl fmt::Display for ScenarioGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioGroup {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownGroup(s.to_owned()))
    }
}

fn run_case(ctx: &ServerContext, fixtures: &FixtureGenerator, case: &CaseDef) -> CaseReport {
    let started = Instant::now();
    let mut env = CaseEnv::new(ctx, fixtures);
    let result = (case.run)(&mut env);
    let outcome = match result {
        Ok(()) => CaseOutcome::Pass,
        Err(CaseError::Skip(reason)) => CaseOutcome::Skipped { reason },
        Err(e) => CaseOutcome::Fail {
            reason: e.to_string(),
        },
    };
    match &outcome {
        CaseOutcome::Pass => info!("{}: {} passed", ctx.server, case.name),
        CaseOutcome::Skipped { reason } => info!("{}: {} skipped: {reason}", ctx.server, case.name),
        CaseOutcome::Fail { reason } => info!("{}: {} failed: {reason}", ctx.server, case.name),
    }
    CaseReport {
        name: case.name.to_owned(),
        outcome,
        warnings: env.into_warnings(),
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

/// Run the cases of one group in order. A failing case never stops the next.
pub fn run_group(ctx: &ServerContext, fixtures: &FixtureGenerator, group: ScenarioGroup) -> GroupReport {
    GroupReport {
        group,
        cases: group
            .cases()
            .iter()
            .map(|case| run_case(ctx, fixtures, case))
            .collect(),
    }
}

/// Run `groups` against one server, one scoped thread per group. Reports
/// come back in the order of `groups`.
pub fn run_server(ctx: &ServerContext, groups: &[ScenarioGroup]) -> ServerReport {
    let started_at = Utc::now();
    let generator = FixtureGenerator::new();
    let fixtures = &generator;
    info!("{}: run {} with {} groups", ctx.server, fixtures.run_id(), groups.len());

    let reports = std::thread::scope(|s| {
        let handles: Vec<_> = groups
            .iter()
            .map(|&group| (group, s.spawn(move || run_group(ctx, fixtures, group))))
            .collect();
        handles
            .into_iter()
            .map(|(group, handle)| {
                handle.join().unwrap_or_else(|_| {
                    error!("{}: {group} group panicked", ctx.server);
                    GroupReport {
                        group,
                        cases: vec![CaseReport {
                            name: group.as_str().to_owned(),
                            outcome: CaseOutcome::Fail {
                                reason: "scenario group panicked".to_owned(),
                            },
                            warnings: Vec::new(),
                            duration_ms: 0,
                        }],
                    }
                })
            })
            .collect()
    });

    ServerReport {
        server: ctx.server.clone(),
        base_url: Some(ctx.base_url.clone()),
        version: Some(ctx.version()),
        error: None,
        started_at,
        groups: reports,
    }
}

/// Resolve `server` and run `groups` against it. A server that cannot be
/// resolved comes back as a setup failure with no groups.
pub fn resolve_and_run(config: &SuiteConfig, server: &str, groups: &[ScenarioGroup]) -> ServerReport {
    match ServerContext::resolve(config, server) {
        Ok(ctx) => run_server(&ctx, groups),
        Err(e) => {
            error!("{server}: {e}");
            ServerReport::setup_failed(server, e)
        }
    }
}

/// Discover and test every configured server in turn. A server that cannot
/// be resolved is reported and the next one still runs.
pub fn run_suite(config: &SuiteConfig, groups: &[ScenarioGroup]) -> RunReport {
    RunReport {
        servers: config
            .servers
            .iter()
            .map(|server| resolve_and_run(config, server, groups))
            .collect(),
    }
}
