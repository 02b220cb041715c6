use crate::ScenarioGroup;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CaseOutcome {
    Pass,
    Fail { reason: String },
    Skipped { reason: String },
}

impl CaseOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub name: String,
    #[serde(flatten)]
    pub outcome: CaseOutcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub group: ScenarioGroup,
    pub cases: Vec<CaseReport>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    fn add(&mut self, outcome: &CaseOutcome) {
        match outcome {
            CaseOutcome::Pass => self.passed += 1,
            CaseOutcome::Fail { .. } => self.failed += 1,
            CaseOutcome::Skipped { .. } => self.skipped += 1,
        }
    }

    fn merge(&mut self, other: Summary) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Results for one server. `error` is set when discovery or setup failed and
/// no scenario ran.
#[derive(Debug, Clone, Serialize)]
pub struct ServerReport {
    pub server: String,
    pub base_url: Option<String>,
    pub version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub groups: Vec<GroupReport>,
}

impl ServerReport {
    pub fn setup_failed(server: &str, error: impl ToString) -> Self {
        Self {
            server: server.to_owned(),
            base_url: None,
            version: None,
            error: Some(error.to_string()),
            started_at: Utc::now(),
            groups: Vec::new(),
        }
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for case in self.groups.iter().flat_map(|g| &g.cases) {
            summary.add(&case.outcome);
        }
        summary
    }

    pub fn failures(&self) -> impl Iterator<Item = (ScenarioGroup, &CaseReport)> {
        self.groups.iter().flat_map(|g| {
            g.cases
                .iter()
                .filter(|c| c.outcome.is_failure())
                .map(move |c| (g.group, c))
        })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub servers: Vec<ServerReport>,
}

impl RunReport {
    pub fn summary(&self) -> Summary {
        let mut total = Summary::default();
        for server in &self.servers {
            total.merge(server.summary());
        }
        total
    }

    pub fn has_failures(&self) -> bool {
        self.summary().failed > 0
    }

    pub fn has_setup_errors(&self) -> bool {
        self.servers.iter().any(|s| s.error.is_some())
    }

    /// Every case passed or was skipped, and every server was reachable.
    pub fn success(&self) -> bool {
        !self.has_failures() && !self.has_setup_errors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(name: &str, outcome: CaseOutcome) -> CaseReport {
        CaseReport {
            name: name.to_owned(),
            outcome,
            warnings: Vec::new(),
            duration_ms: 1,
        }
    }

    fn server(cases: Vec<CaseReport>) -> ServerReport {
        ServerReport {
            server: "https://h".to_owned(),
            base_url: Some("https://h/storage/a".to_owned()),
            version: Some(2),
            error: None,
            started_at: Utc::now(),
            groups: vec![GroupReport {
                group: ScenarioGroup::Read,
                cases,
            }],
        }
    }

    #[test]
    fn summary_counts_outcomes() {
        let report = RunReport {
            servers: vec![server(vec![
                case("a", CaseOutcome::Pass),
                case(
                    "b",
                    CaseOutcome::Fail {
                        reason: "x".to_owned(),
                    },
                ),
                case(
                    "c",
                    CaseOutcome::Skipped {
                        reason: "y".to_owned(),
                    },
                ),
            ])],
        };
        assert_eq!(
            report.summary(),
            Summary {
                passed: 1,
                failed: 1,
                skipped: 1
            }
        );
        assert!(!report.success());
        let failures: Vec<_> = report.servers[0].failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].1.name, "b");
    }

    #[test]
    fn setup_error_is_not_success() {
        let report = RunReport {
            servers: vec![ServerReport::setup_failed("https://h", "no storage link")],
        };
        assert!(!report.has_failures());
        assert!(report.has_setup_errors());
        assert!(!report.success());
    }

    #[test]
    fn serializes_outcome_inline() {
        let json = serde_json::to_value(case(
            "get_missing",
            CaseOutcome::Fail {
                reason: "boom".to_owned(),
            },
        ))
        .unwrap();
        assert_eq!(json["name"], "get_missing");
        assert_eq!(json["outcome"], "fail");
        assert_eq!(json["reason"], "boom");
        assert!(json.get("warnings").is_none());
    }
}
