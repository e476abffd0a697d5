// logsleuth-analyzer - commands/comlib.rs
//
// The ComLib command set: task/HTTP request reconstruction, deadlock
// detection, message-flow tracing, SIP dialog grouping and PJSIP thread
// collection. Registered under the "COMLib" tag; AndroidLogcat corpora that
// turn out to carry embedded ComLib lines reuse the same registry.

use std::collections::{BTreeMap, BTreeSet};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use regex::Regex;

use crate::line_tools::{self, Filter};
use crate::model::{LineIndexRange, LogLevel, MatchType};
use crate::repo::LinesRepo;

use super::comlib_utils::{self, TaskExecution};
use super::{register, CommandInfo, CommandParams, CommandResult, LineContentRef, Registry};

pub fn registry() -> Registry {
    let mut commands = Vec::new();

    register(
        &mut commands,
        CommandInfo {
            name: "Deadlocks",
            help: "Finds tasks that started waiting on something and never resumed",
            params_help: "",
            supports_line_execution: false,
            execute: cmd_deadlocks,
        },
    );
    register(
        &mut commands,
        CommandInfo {
            name: "Task execution",
            help: "Reconstructs everything that happened during one scheduled task",
            params_help: "task id or name",
            supports_line_execution: true,
            execute: cmd_task_execution,
        },
    );
    register(
        &mut commands,
        CommandInfo {
            name: "HTTP request",
            help: "Reconstructs everything that happened during one HTTP request",
            params_help: "HTTP request id",
            supports_line_execution: true,
            execute: cmd_http_request_execution,
        },
    );
    register(
        &mut commands,
        CommandInfo {
            name: "Message flow",
            help: "Finds every task involved in storing and sending one message",
            params_help: "message id or network id",
            supports_line_execution: false,
            execute: cmd_msg_flow,
        },
    );
    register(
        &mut commands,
        CommandInfo {
            name: "SIP flows",
            help: "Groups SIP TX/RX traffic into dialogs and synthesizes the packets",
            params_help: "optional SIP method name filter",
            supports_line_execution: true,
            execute: cmd_sip_flows,
        },
    );
    register(
        &mut commands,
        CommandInfo {
            name: "PJSIP threads",
            help: "Collects every line on threads that ever ran PJSIP's event loop",
            params_help: "",
            supports_line_execution: false,
            execute: cmd_pjsip_threads,
        },
    );

    Registry {
        tag: "COMLib",
        commands,
    }
}

fn emit(result: &mut CommandResult, execution: &TaskExecution) {
    result.add_line_indices(None, execution.line_indices.iter().copied().collect());
}

fn cmd_task_execution(
    repo: &LinesRepo,
    anchor: Option<usize>,
    params: &CommandParams,
    result: &mut CommandResult,
) -> bool {
    // `:N` form: resolve the task id active at the anchor line.
    if let Some(line_index) = anchor {
        if let Some(task_id) = comlib_utils::task_at_line(repo, line_index) {
            if let Some(execution) = comlib_utils::task_full_execution(repo, task_id, repo.full_range()) {
                emit(result, &execution);
                return true;
            }
        }
        return false;
    }

    let Some(task_param) = params.get("task") else {
        return false;
    };

    if let Ok(task_id) = task_param.parse::<i64>() {
        if let Some(execution) = comlib_utils::task_full_execution(repo, task_id, repo.full_range()) {
            emit(result, &execution);
            return true;
        }
        return false;
    }

    // name form: every "task scheduled" line whose `name` param matches.
    let lines = repo.lines();
    let mut found_any = false;
    for line in lines {
        let bytes = repo.bytes_for(line);
        if line.check_tag(bytes, "COMLib.Scheduler", MatchType::Exact)
            && line.check_msg(bytes, "task scheduled", MatchType::Exact)
            && line.param_check(bytes, "name", task_param)
        {
            if let Some(id) = line.param_extract_i64(bytes, "id") {
                if let Some(execution) = comlib_utils::task_full_execution(repo, id, repo.full_range()) {
                    emit(result, &execution);
                    found_any = true;
                }
            }
        }
    }
    found_any
}

fn cmd_http_request_execution(
    repo: &LinesRepo,
    anchor: Option<usize>,
    params: &CommandParams,
    result: &mut CommandResult,
) -> bool {
    let request_id = if let Some(line_index) = anchor {
        comlib_utils::http_request_at_line(repo, line_index)
    } else {
        params.get("request").and_then(|v| v.parse::<i64>().ok())
    };

    let Some(request_id) = request_id else {
        return false;
    };
    match comlib_utils::http_request_full_execution(repo, request_id) {
        Some(execution) => {
            emit(result, &execution);
            true
        }
        None => false,
    }
}

/// Replays every `COMLib.Scheduler` event in one execution range into the
/// `waiting`/`finishing`/`executing` task-id sets; whatever is still in one
/// of those sets once the range ends never reached `finished` and is a
/// deadlock candidate.
#[derive(Default)]
struct SchedulerReplay {
    waiting: BTreeSet<i64>,
    finishing: BTreeSet<i64>,
    executing: BTreeSet<i64>,
    thread_ids: BTreeSet<i32>,
}

enum TaskStep {
    Waiting,
    Finishing,
    Finished,
    Executing,
}

fn replay_scheduler_events(repo: &LinesRepo, range: LineIndexRange) -> SchedulerReplay {
    let lines = repo.lines();
    let mut replay = SchedulerReplay::default();

    for index in range.start..range.end.min(lines.len()) {
        let line = &lines[index];
        let bytes = repo.bytes_for(line);
        if !line.check_tag(bytes, "COMLib.Scheduler", MatchType::Exact) {
            continue;
        }

        let step = if line.check_msg(bytes, "task waiting", MatchType::StartsWith) {
            TaskStep::Waiting
        } else if line.check_msg(bytes, "task finishing", MatchType::Exact) {
            TaskStep::Finishing
        } else if line.check_msg(bytes, "task finished", MatchType::Exact) {
            TaskStep::Finished
        } else if line.check_msg(bytes, "task executing", MatchType::Exact) {
            TaskStep::Executing
        } else {
            continue;
        };

        if matches!(step, TaskStep::Executing) {
            replay.thread_ids.insert(line.thread_id);
        }

        let Some(task_id) = line.param_extract_i64(bytes, "id") else {
            continue;
        };

        match step {
            TaskStep::Waiting => {
                replay.waiting.insert(task_id);
                replay.finishing.remove(&task_id);
                replay.executing.remove(&task_id);
            }
            TaskStep::Finishing => {
                replay.waiting.remove(&task_id);
                replay.finishing.insert(task_id);
                replay.executing.remove(&task_id);
            }
            TaskStep::Finished => {
                replay.waiting.remove(&task_id);
                replay.finishing.remove(&task_id);
                replay.executing.remove(&task_id);
            }
            TaskStep::Executing => {
                replay.waiting.remove(&task_id);
                replay.finishing.remove(&task_id);
                replay.executing.insert(task_id);
            }
        }
    }

    replay
}

fn scheduled_task_name(repo: &LinesRepo, range: LineIndexRange, task_id: i64) -> String {
    let lines = repo.lines();
    for index in range.start..range.end.min(lines.len()) {
        let line = &lines[index];
        let bytes = repo.bytes_for(line);
        if line.check_tag(bytes, "COMLib.Scheduler", MatchType::Exact)
            && line.check_msg(bytes, "task scheduled", MatchType::Exact)
            && line.param_check_i64(bytes, "id", task_id)
        {
            return line.param_extract_str(bytes, "name").unwrap_or_default();
        }
    }
    String::new()
}

fn cmd_deadlocks(
    repo: &LinesRepo,
    _anchor: Option<usize>,
    _params: &CommandParams,
    result: &mut CommandResult,
) -> bool {
    let mut executions_json = Vec::new();
    let mut found_any = false;

    for execution_range in comlib_utils::executions_ranges(repo) {
        let replay = replay_scheduler_events(repo, execution_range);

        if replay.waiting.is_empty() && replay.finishing.is_empty() && replay.executing.is_empty() {
            continue;
        }

        let mut task_ids: BTreeSet<i64> = BTreeSet::new();
        task_ids.extend(&replay.executing);
        task_ids.extend(&replay.waiting);
        task_ids.extend(&replay.finishing);

        let mut tasks_json = Vec::new();
        for &task_id in &task_ids {
            let task_lines = comlib_utils::task_full_execution(repo, task_id, execution_range)
                .map(|e| e.line_indices.into_iter().collect::<Vec<_>>())
                .unwrap_or_default();
            let name = scheduled_task_name(repo, execution_range, task_id);
            let group_id = result.add_line_indices(None, task_lines);

            tasks_json.push(serde_json::json!({
                "id": task_id,
                "name": name,
                "linesIndex": group_id,
            }));
            found_any = true;
        }

        executions_json.push(serde_json::json!({
            "lineIndexRange": [execution_range.start, execution_range.end],
            "threadIds": replay.thread_ids.iter().collect::<Vec<_>>(),
            "tasks": {
                "executing": replay.executing.iter().collect::<Vec<_>>(),
                "waiting": replay.waiting.iter().collect::<Vec<_>>(),
                "finishing": replay.finishing.iter().collect::<Vec<_>>(),
                "data": tasks_json,
            },
        }));
    }

    if found_any {
        *result.json() = serde_json::Value::Array(executions_json);
    }

    found_any
}

fn cmd_msg_flow(
    repo: &LinesRepo,
    _anchor: Option<usize>,
    params: &CommandParams,
    result: &mut CommandResult,
) -> bool {
    let lines = repo.lines();
    let wanted_id = params.get("id");
    let wanted_network_id = params.get("networkId");
    if wanted_id.is_none() && wanted_network_id.is_none() {
        return false;
    }

    let store_idx = lines.iter().enumerate().find(|(_, line)| {
        let bytes = repo.bytes_for(line);
        if !(line.check_tag(bytes, "ChatController", MatchType::Exact)
            && line.check_msg(bytes, "message stored", MatchType::Exact))
        {
            return false;
        }
        wanted_id
            .map(|v| line.param_check(bytes, "id", v))
            .unwrap_or(false)
            || wanted_network_id
                .map(|v| {
                    line.param_check(bytes, "networkId", v)
                        || line.param_check(bytes, "MessageNetworkId", v)
                })
                .unwrap_or(false)
    });

    let Some((store_index, _store_line)) = store_idx else {
        return false;
    };

    let mut group = vec![store_index];
    if let Some(task_id) = comlib_utils::task_at_line(repo, store_index) {
        if let Some(execution) = comlib_utils::task_full_execution(repo, task_id, repo.full_range()) {
            group.extend(execution.line_indices);
        }
    }
    result.add_line_indices(None, group);
    true
}

fn cmd_pjsip_threads(
    repo: &LinesRepo,
    _anchor: Option<usize>,
    _params: &CommandParams,
    result: &mut CommandResult,
) -> bool {
    let lines = repo.lines();
    let mut thread_ids: BTreeSet<i32> = Default::default();

    for line in lines {
        let bytes = repo.bytes_for(line);
        if line.check_tag(bytes, "COMLib.PJSIP", MatchType::Exact)
            && line.check_method(bytes, "operator()", MatchType::Exact)
        {
            thread_ids.insert(line.thread_id);
        }
    }

    if thread_ids.is_empty() {
        return false;
    }

    let indices: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| thread_ids.contains(&line.thread_id))
        .map(|(index, _)| index)
        .collect();
    result.add_line_indices(None, indices);
    true
}

struct SipRegexes {
    call_id: Regex,
    cseq: Regex,
    tx: Regex,
    rx: Regex,
    network_data: Regex,
}

impl SipRegexes {
    fn new() -> Self {
        Self {
            call_id: Regex::new(r"(?i)Call-ID: (.*)").unwrap(),
            cseq: Regex::new(r"(?i)CSeq: .+ (.+)").unwrap(),
            tx: Regex::new(r"(?i)\.TX \d+ bytes ").unwrap(),
            rx: Regex::new(r"(?i)\.RX \d+ bytes ").unwrap(),
            network_data: Regex::new(r"\) (to|from) (?:TCP|UDP) (\d+\.\d+\.\d+\.\d+):(\d+):").unwrap(),
        }
    }
}

/// One Call-ID's worth of TX/RX lines and the CSeq method first seen on it.
#[derive(Default)]
struct DialogData {
    method: String,
    tx: Vec<usize>,
    rx: Vec<usize>,
    all: Vec<usize>,
}

fn cmd_sip_flows(
    repo: &LinesRepo,
    anchor: Option<usize>,
    params: &CommandParams,
    result: &mut CommandResult,
) -> bool {
    let lines = repo.lines();
    if lines.is_empty() {
        return false;
    }
    let res = SipRegexes::new();
    let method_filter = params.get("method").map(|s| s.as_str());

    // line-execution form: resolve the Call-ID active at the anchor line by
    // walking backward on the same thread, then restrict the scan to it.
    let mut filter_call_id: Option<String> = None;
    if let Some(line_index) = anchor {
        if line_index >= lines.len() {
            return false;
        }
        let thread_id = lines[line_index].thread_id;
        let backward_filter: Box<Filter> = Box::new(move |candidate, candidate_bytes| {
            candidate.thread_id == thread_id
                && candidate.check_tag(candidate_bytes, "COMLib.PJSIP", MatchType::Exact)
                && candidate.check_msg(candidate_bytes, "pjsua_core.c", MatchType::Contains)
        });
        line_tools::iterate_backwards(
            lines,
            &repo.bytes_resolver(),
            line_index,
            &*backward_filter,
            |_idx, candidate| {
                let bytes = repo.bytes_for(candidate);
                let text = String::from_utf8_lossy(candidate.msg_str(bytes));
                if let Some(caps) = res.call_id.captures(&text) {
                    filter_call_id = Some(caps[1].to_string());
                    return false;
                }
                true
            },
        );

        if filter_call_id.is_none() {
            return false;
        }
    }

    let scan_filter: Box<Filter> = Box::new(|candidate, candidate_bytes| {
        candidate.level == LogLevel::Debug
            && candidate.check_tag(candidate_bytes, "COMLib.PJSIP", MatchType::Exact)
            && candidate.check_msg(candidate_bytes, "pjsua_core.c", MatchType::Contains)
    });

    let mut executions_json = Vec::new();
    let mut found_any = false;
    const BODY_SEPARATOR: &str = ":\n";
    const BODY_SUFFIX: &[u8] = b"\n--end msg--";

    for execution_range in comlib_utils::executions_ranges(repo) {
        let mut dialogs: BTreeMap<String, DialogData> = BTreeMap::new();

        line_tools::window_iterate(
            lines,
            &repo.bytes_resolver(),
            execution_range,
            &*scan_filter,
            |line_index, line| {
                let bytes = repo.bytes_for(line);
                let msg = line.msg_str(bytes);
                let text = String::from_utf8_lossy(msg);

                // isolate the SIP body after the headers/body separator;
                // without one there is nothing to correlate or forward.
                let Some(sep) = text.find(BODY_SEPARATOR) else {
                    return true;
                };
                let body_start = sep + BODY_SEPARATOR.len();
                if body_start >= msg.len() {
                    return true;
                }
                let mut body_end = msg.len();
                if msg.len() - body_start >= BODY_SUFFIX.len()
                    && &msg[msg.len() - BODY_SUFFIX.len()..] == BODY_SUFFIX
                {
                    body_end = msg.len() - BODY_SUFFIX.len();
                }

                let Some(caps) = res.call_id.captures(&text) else {
                    return true;
                };
                let call_id = caps[1].to_string();
                if let Some(wanted) = &filter_call_id {
                    if wanted != &call_id {
                        return true;
                    }
                }

                let dialog = dialogs.entry(call_id).or_default();
                if dialog.method.is_empty() {
                    if let Some(m) = res.cseq.captures(&text) {
                        dialog.method = m[1].to_string();
                    }
                }

                if res.tx.is_match(&text) {
                    dialog.tx.push(line_index);
                } else if res.rx.is_match(&text) {
                    dialog.rx.push(line_index);
                }
                dialog.all.push(line_index);

                if let Some(caps) = res.network_data.captures(&text) {
                    let direction = &caps[1];
                    let ip: Ipv4Addr = caps[2].parse().unwrap_or(Ipv4Addr::LOCALHOST);
                    let port: u16 = caps[3].parse().unwrap_or(0);
                    let remote = SocketAddr::new(IpAddr::V4(ip), port);
                    let local = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
                    let (source, destination) = if direction == "to" {
                        (local, remote)
                    } else {
                        (remote, local)
                    };

                    let msg_offset = line.msg.map(|s| s.offset as usize).unwrap_or(0);
                    result.add_network_packet_ipv4(
                        source,
                        destination,
                        line.timestamp_ms,
                        LineContentRef {
                            index: line_index,
                            offset: msg_offset + body_start,
                            size: body_end - body_start,
                        },
                    );
                }

                true
            },
        );

        if dialogs.is_empty() {
            continue;
        }

        let mut dialogs_json = Vec::new();
        for (call_id, dialog) in dialogs {
            if let Some(wanted_method) = method_filter {
                if dialog.method != wanted_method {
                    continue;
                }
            }

            let group_id = result.add_line_indices(None, dialog.all);
            dialogs_json.push(serde_json::json!({
                "callId": call_id,
                "method": dialog.method,
                "txLineIndices": dialog.tx,
                "rxLineIndices": dialog.rx,
                "linesIndex": group_id,
            }));
            found_any = true;
        }

        if !dialogs_json.is_empty() {
            executions_json.push(serde_json::json!({
                "lineIndexRange": [execution_range.start, execution_range.end],
                "dialogs": dialogs_json,
            }));
        }
    }

    if found_any {
        *result.json() = serde_json::Value::Array(executions_json);
    }

    found_any
}
