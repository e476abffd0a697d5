// logsleuth-analyzer - inspectors/mod.rs
//
// Inspectors run unconditionally over a freshly loaded repo and surface a
// handful of headline findings (panics, build info, user agents, execution
// boundaries) without the caller having to know what to ask for.

pub mod comlib;

use crate::flavor::Flavor;
use crate::repo::LinesRepo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub category: &'static str,
    pub text: String,
    pub line_index: Option<usize>,
}

pub struct InspectorInfo {
    pub execute: fn(&LinesRepo, &mut Vec<Finding>),
}

pub struct InspectorRegistry {
    pub inspectors: Vec<InspectorInfo>,
}

/// Returns the inspectors applicable to a repo's flavor; empty if none
/// apply. ComLib and AndroidLogcat (which may embed ComLib lines) share the
/// same set.
pub fn registry_for(flavor: Flavor) -> InspectorRegistry {
    match flavor {
        Flavor::ComLib | Flavor::AndroidLogcat => InspectorRegistry {
            inspectors: vec![
                InspectorInfo {
                    execute: comlib::inspect_executions,
                },
                InspectorInfo {
                    execute: comlib::inspect_panics,
                },
                InspectorInfo {
                    execute: comlib::inspect_build_info,
                },
                InspectorInfo {
                    execute: comlib::inspect_user_agents,
                },
            ],
        },
        Flavor::Server => InspectorRegistry {
            inspectors: Vec::new(),
        },
    }
}

/// Runs every applicable inspector over `repo`, skipping entirely if the
/// repo has no lines.
pub fn run_all(repo: &LinesRepo) -> Vec<Finding> {
    let mut findings = Vec::new();
    if repo.num_lines() == 0 {
        return findings;
    }
    for inspector in registry_for(repo.flavor()).inspectors {
        (inspector.execute)(repo, &mut findings);
    }
    findings
}
