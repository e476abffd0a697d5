// logsleuth-analyzer - commands/server.rs
//
// The Server command set. Much smaller than ComLib's: server logs don't
// carry a scheduler or thread-migration model, so "find everything about
// this message" reduces to a literal search plus same-tag neighbour growth.

use std::collections::BTreeSet;

use crate::line_tools::{self, Filter};
use crate::model::MatchType;
use crate::repo::LinesRepo;

use super::{register, CommandInfo, CommandParams, CommandResult, Registry};

pub fn registry() -> Registry {
    let mut commands = Vec::new();

    register(
        &mut commands,
        CommandInfo {
            name: "Message",
            help: "Finds every log line related to a message's content",
            params_help: "message content",
            supports_line_execution: false,
            execute: cmd_msg,
        },
    );

    Registry {
        tag: "Server",
        commands,
    }
}

fn cmd_msg(
    repo: &LinesRepo,
    _anchor: Option<usize>,
    params: &CommandParams,
    result: &mut CommandResult,
) -> bool {
    let Some(needle) = params.get("content") else {
        return false;
    };
    if needle.is_empty() {
        return false;
    }

    let lines = repo.lines();
    let mut already_grouped: BTreeSet<usize> = BTreeSet::new();
    let mut found_any = false;

    for index in 0..lines.len() {
        let line = &lines[index];
        let bytes = repo.bytes_for(line);
        if !line.check_msg(bytes, needle, MatchType::Contains) {
            continue;
        }
        if already_grouped.contains(&index) {
            continue;
        }
        found_any = true;

        let mut group = vec![index];
        let tag_owned = String::from_utf8_lossy(line.tag_str(bytes)).into_owned();
        let filter: Box<Filter> = Box::new(move |candidate, candidate_bytes| {
            candidate.check_tag(candidate_bytes, &tag_owned, MatchType::Exact)
        });

        if index > 0 {
            line_tools::iterate_backwards(lines, &repo.bytes_resolver(), index - 1, &*filter, |idx, _| {
                group.push(idx);
                true
            });
        }
        line_tools::iterate_forward(lines, &repo.bytes_resolver(), index + 1, &*filter, |idx, _| {
            group.push(idx);
            true
        });

        already_grouped.extend(group.iter().copied());
        result.add_line_indices(None, group);
    }

    found_any
}
