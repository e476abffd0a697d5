// logsleuth-analyzer - commands/comlib_utils.rs
//
// Shared reconstruction helpers used by several ComLib commands: splitting a
// corpus into per-process-execution ranges, and walking a task's full
// lifecycle (scheduled -> executing/waiting/finishing -> finished) across
// however many threads it migrates between.

use std::collections::BTreeSet;

use crate::line_tools::{self, Filter};
use crate::model::{LineIndexRange, MatchType};
use crate::repo::LinesRepo;
use crate::util::constants::{EXECUTION_START_BANNER, TASK_WAIT_FINISH_QUERIES};

/// Splits the corpus into the ranges bounded by "log start" banner lines.
/// A banner at line 0 doesn't start a new range (the corpus already begins
/// there); if no banner is found at all, the whole corpus is one execution.
pub fn executions_ranges(repo: &LinesRepo) -> Vec<LineIndexRange> {
    let hits = banner_hits(repo);

    let boundaries: Vec<usize> = hits.into_iter().filter(|&idx| idx != 0).collect();

    if boundaries.is_empty() {
        return vec![repo.full_range()];
    }

    let mut ranges = Vec::with_capacity(boundaries.len() + 1);
    let mut start = 0usize;
    for &boundary in &boundaries {
        ranges.push(LineIndexRange::new(start, boundary));
        start = boundary;
    }
    ranges.push(LineIndexRange::new(start, repo.num_lines()));
    ranges
}

/// `line_tools::window_search`/`window_find_all` need a single byte buffer,
/// but a repo's lines may span several mapped files. This drives the search
/// per-line against each line's own file bytes instead.
fn banner_hits(repo: &LinesRepo) -> Vec<usize> {
    let needle = EXECUTION_START_BANNER.as_bytes();
    find_all_scoped(repo, repo.full_range(), needle)
}

/// Like `line_tools::window_find_all` but tolerant of lines backed by
/// different mapped files, since a repo's corpus can span several of them.
fn find_all_scoped(repo: &LinesRepo, scope: LineIndexRange, needle: &[u8]) -> Vec<usize> {
    let lines = repo.lines();
    (scope.start..scope.end.min(lines.len()))
        .filter(|&i| {
            let bytes = repo.bytes_for(&lines[i]);
            let raw = lines[i].raw(bytes);
            needle.len() <= raw.len() && raw.windows(needle.len()).any(|w| w == needle)
        })
        .collect()
}

/// One task's complete reconstructed execution: every line that touches it,
/// across every thread it ran or waited on.
#[derive(Debug, Default, Clone)]
pub struct TaskExecution {
    pub line_indices: BTreeSet<usize>,
}

const SCHEDULER_TAG: &str = "COMLib.Scheduler";

/// Finds the full execution of the task with the given id within
/// `search_range`, bounded by its "task scheduled" and (if present) "task
/// finished" lines, plus every waiting/finishing/cancellation line the fixed
/// query templates match. Callers that don't need to isolate one process
/// execution from another (the plain "Task execution" command) pass
/// `repo.full_range()`; deadlock detection passes the owning execution range
/// so two unrelated processes that happen to reuse the same task id don't
/// get merged together.
pub fn task_full_execution(
    repo: &LinesRepo,
    task_id: i64,
    search_range: LineIndexRange,
) -> Option<TaskExecution> {
    let lines = repo.lines();
    let search_end = search_range.end.min(lines.len());
    let scheduled_idx = (search_range.start..search_end).find(|&i| {
        let line = &lines[i];
        let bytes = repo.bytes_for(line);
        line.check_tag(bytes, SCHEDULER_TAG, MatchType::Exact)
            && line.check_msg(bytes, "task scheduled", MatchType::Exact)
            && line.param_check_i64(bytes, "id", task_id)
    })?;

    let finished_idx = (scheduled_idx + 1..search_end).find(|&i| {
        let line = &lines[i];
        let bytes = repo.bytes_for(line);
        line.check_tag(bytes, SCHEDULER_TAG, MatchType::Exact)
            && line.check_msg(bytes, "task finished", MatchType::Exact)
            && line.param_check_i64(bytes, "id", task_id)
    });

    let scope_end = finished_idx.map(|i| i + 1).unwrap_or(search_end);
    let scope = LineIndexRange::new(scheduled_idx, scope_end);

    let mut execution = TaskExecution::default();
    execution.line_indices.insert(scheduled_idx);
    if let Some(f) = finished_idx {
        execution.line_indices.insert(f);
    }

    for template in TASK_WAIT_FINISH_QUERIES {
        let needle = template.replacen("{}", &task_id.to_string(), 1);
        for hit in find_all_scoped(repo, scope, needle.as_bytes()) {
            execution.line_indices.insert(hit);
        }
    }

    // "task executing"/"task finishing" occurrences: each one pulls in every
    // subsequent line up to the next scheduler dispatch event (on any
    // thread, since the task itself may keep migrating) or the scope end.
    for i in scope.start..scope.end {
        let line = &lines[i];
        let bytes = repo.bytes_for(line);
        let is_executing = line.check_msg(bytes, "task executing", MatchType::Exact)
            && line.param_check_i64(bytes, "id", task_id);
        let is_finishing = line.check_msg(bytes, "task finishing", MatchType::Exact)
            && line.param_check_i64(bytes, "id", task_id);
        if !is_executing && !is_finishing {
            continue;
        }
        execution.line_indices.insert(i);

        for j in (i + 1)..scope.end {
            let candidate = &lines[j];
            let candidate_bytes = repo.bytes_for(candidate);
            if candidate.check_tag(candidate_bytes, SCHEDULER_TAG, MatchType::Exact)
                && candidate.check_msg(candidate_bytes, "task scheduled", MatchType::Exact)
            {
                break;
            }
            execution.line_indices.insert(j);
        }
    }

    Some(execution)
}

/// Resolves the task id active at `line_index` by walking backward for the
/// nearest "task executing" line on the same thread.
pub fn task_at_line(repo: &LinesRepo, line_index: usize) -> Option<i64> {
    let lines = repo.lines();
    let anchor = lines.get(line_index)?;
    let thread_id = anchor.thread_id;
    let filter: Box<Filter> = Box::new(move |line, _bytes| line.thread_id == thread_id);

    let mut found = None;
    line_tools::iterate_backwards(lines, &repo.bytes_resolver(), line_index, &*filter, |_idx, candidate| {
        let bytes = repo.bytes_for(candidate);
        if candidate.check_tag(bytes, SCHEDULER_TAG, MatchType::Exact)
            && candidate.check_msg(bytes, "task executing", MatchType::Exact)
        {
            found = candidate.param_extract_i64(bytes, "id");
            return false;
        }
        true
    });
    found
}

const HTTP_TAG: &str = "COMLib.HTTP";

pub fn http_request_full_execution(repo: &LinesRepo, request_id: i64) -> Option<TaskExecution> {
    let lines = repo.lines();
    let start_idx = (0..lines.len()).find(|&i| {
        let line = &lines[i];
        let bytes = repo.bytes_for(line);
        line.check_tag(bytes, HTTP_TAG, MatchType::StartsWith)
            && line.param_check_i64(bytes, "id", request_id)
    })?;

    let mut execution = TaskExecution::default();
    let filter: Box<Filter> = Box::new(|line, bytes| line.check_tag(bytes, HTTP_TAG, MatchType::StartsWith));
    line_tools::iterate_forward(lines, &repo.bytes_resolver(), start_idx, &*filter, |idx, candidate| {
        let bytes = repo.bytes_for(candidate);
        if candidate.param_check_i64(bytes, "id", request_id) {
            execution.line_indices.insert(idx);
        }
        true
    });

    Some(execution)
}

pub fn http_request_at_line(repo: &LinesRepo, line_index: usize) -> Option<i64> {
    let lines = repo.lines();
    let anchor = lines.get(line_index)?;
    let thread_id = anchor.thread_id;
    let filter: Box<Filter> = Box::new(move |line, _bytes| line.thread_id == thread_id);

    let mut found = None;
    line_tools::iterate_backwards(lines, &repo.bytes_resolver(), line_index, &*filter, |_idx, candidate| {
        let bytes = repo.bytes_for(candidate);
        if candidate.check_tag(bytes, HTTP_TAG, MatchType::StartsWith) {
            found = candidate.param_extract_i64(bytes, "id");
            return false;
        }
        true
    });
    found
}
