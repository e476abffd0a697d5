// logsleuth-analyzer - inspectors/comlib.rs
//
// The four ComLib inspectors: execution boundaries, panics, build info
// banners, and negotiated user agents.

use std::collections::BTreeSet;

use regex::Regex;

use crate::commands::comlib_utils;
use crate::model::MatchType;
use crate::repo::LinesRepo;

use super::{Finding, Severity};

pub fn inspect_executions(repo: &LinesRepo, findings: &mut Vec<Finding>) {
    for range in comlib_utils::executions_ranges(repo) {
        findings.push(Finding {
            severity: Severity::Info,
            category: "Execution",
            text: format!(
                "process execution spanning lines {}..{}",
                range.start, range.end
            ),
            line_index: Some(range.start),
        });
    }
}

pub fn inspect_panics(repo: &LinesRepo, findings: &mut Vec<Finding>) {
    for (index, line) in repo.lines().iter().enumerate() {
        let bytes = repo.bytes_for(line);
        if line.level == crate::model::LogLevel::Error
            && line.check_tag(bytes, "COMLib.Debug", MatchType::Exact)
            && line.check_method(bytes, "panic", MatchType::Exact)
        {
            findings.push(Finding {
                severity: Severity::Warning,
                category: "Panic / Exception",
                text: String::from_utf8_lossy(line.msg_str(bytes)).into_owned(),
                line_index: Some(index),
            });
        }
    }
}

pub fn inspect_build_info(repo: &LinesRepo, findings: &mut Vec<Finding>) {
    let validator = Regex::new(r"\*{6} \w+ \d\d \d{4} \d\d:\d\d:\d\d \* .+ \* \w+").unwrap();
    let mut seen = BTreeSet::new();

    for line in repo.lines() {
        let bytes = repo.bytes_for(line);
        if line.level != crate::model::LogLevel::Info
            || !line.check_tag(bytes, "COMLib", MatchType::Exact)
        {
            continue;
        }
        let msg = line.msg_str(bytes);
        if !msg.starts_with(b"****** ") {
            continue;
        }
        let text = String::from_utf8_lossy(msg).into_owned();
        if !validator.is_match(&text) {
            continue;
        }
        if seen.insert(text.clone()) {
            findings.push(Finding {
                severity: Severity::Info,
                category: "Build info",
                text,
                line_index: None,
            });
        }
    }
}

pub fn inspect_user_agents(repo: &LinesRepo, findings: &mut Vec<Finding>) {
    let extract = Regex::new(r"(?i)User-Agent: (\S+/\S+ \S+/\S+ \S+/\S+ \S+/\S+)").unwrap();
    let mut seen = BTreeSet::new();

    for line in repo.lines() {
        let bytes = repo.bytes_for(line);
        if !line.check_tag(bytes, "COMLib.PJSIP", MatchType::Exact) {
            continue;
        }
        let text = String::from_utf8_lossy(line.msg_str(bytes));
        if let Some(caps) = extract.captures(&text) {
            let ua = caps[1].to_string();
            if seen.insert(ua.clone()) {
                findings.push(Finding {
                    severity: Severity::Info,
                    category: "User-Agent",
                    text: ua,
                    line_index: None,
                });
            }
        }
    }
}
