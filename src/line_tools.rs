// logsleuth-analyzer - line_tools.rs
//
// Line-store traversal primitives shared by commands, inspectors and
// translators: windowed iteration with a filter predicate, and substring
// search across a window of lines. Every function takes a `bytes_of`
// resolver rather than a flat byte slice, since a repo's lines can be
// backed by more than one mapped file.

use crate::model::{LineIndexRange, LineRecord};

/// A filter predicate: given a candidate line and the bytes it's parsed
/// from, decide whether it's part of the set being iterated.
pub type Filter<'a> = dyn Fn(&LineRecord, &[u8]) -> bool + 'a;

/// Resolves the byte buffer a given line's offsets are relative to.
pub type BytesOf<'a> = dyn Fn(&LineRecord) -> &'a [u8] + 'a;

/// Result of a successful substring search within a line window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub line_index: usize,
    /// Byte offset of the match within that line's raw text.
    pub line_offset: usize,
}

/// Iterates `range` forward over `lines`, calling `visitor(index, line)` for
/// every line that satisfies `filter`. Lines that don't match are skipped
/// (iteration continues); `visitor` returning `false` stops it. Returns the
/// number of line indices looked at (matching or not) before stopping, so a
/// caller can resume a later call from `range.start + result`.
pub fn window_iterate<'a>(
    lines: &[LineRecord],
    bytes_of: &BytesOf<'a>,
    range: LineIndexRange,
    filter: &Filter,
    mut visitor: impl FnMut(usize, &LineRecord) -> bool,
) -> usize {
    let mut visited = 0usize;
    for index in range.start..range.end.min(lines.len()) {
        let line = &lines[index];
        visited += 1;
        if !filter(line, bytes_of(line)) {
            continue;
        }
        if !visitor(index, line) {
            break;
        }
    }
    visited
}

/// Iterates backward from `from_index` (inclusive) down to 0, stopping at the
/// first line the filter rejects, or when `visitor` returns false.
pub fn iterate_backwards<'a>(
    lines: &[LineRecord],
    bytes_of: &BytesOf<'a>,
    from_index: usize,
    filter: &Filter,
    mut visitor: impl FnMut(usize, &LineRecord) -> bool,
) {
    if lines.is_empty() {
        return;
    }
    let mut index = from_index.min(lines.len() - 1);
    loop {
        let line = &lines[index];
        if !filter(line, bytes_of(line)) {
            break;
        }
        if !visitor(index, line) {
            break;
        }
        if index == 0 {
            break;
        }
        index -= 1;
    }
}

/// Iterates forward from `from_index` (inclusive) to the end of the store,
/// stopping at the first line the filter rejects, or when `visitor` returns
/// false.
pub fn iterate_forward<'a>(
    lines: &[LineRecord],
    bytes_of: &BytesOf<'a>,
    from_index: usize,
    filter: &Filter,
    mut visitor: impl FnMut(usize, &LineRecord) -> bool,
) {
    for index in from_index..lines.len() {
        let line = &lines[index];
        if !filter(line, bytes_of(line)) {
            break;
        }
        if !visitor(index, line) {
            break;
        }
    }
}

/// Searches for `needle` within the raw text of the lines in `range`,
/// honouring `start_char_index` as a starting offset within the *first*
/// line only (every subsequent line is searched from its own start).
pub fn window_search<'a>(
    lines: &[LineRecord],
    bytes_of: &BytesOf<'a>,
    range: LineIndexRange,
    start_char_index: usize,
    needle: &[u8],
) -> Option<SearchResult> {
    if needle.is_empty() {
        return None;
    }
    for index in range.start..range.end.min(lines.len()) {
        let line = &lines[index];
        let raw = line.raw(bytes_of(line));
        let search_from = if index == range.start {
            start_char_index.min(raw.len())
        } else {
            0
        };
        if let Some(found) = find_substring(&raw[search_from..], needle) {
            return Some(SearchResult {
                line_index: index,
                line_offset: search_from + found,
            });
        }
    }
    None
}

/// Collects every non-overlapping occurrence of `needle` across `range`,
/// driving `window_search` repeatedly and advancing past each hit's line.
pub fn window_find_all<'a>(
    lines: &[LineRecord],
    bytes_of: &BytesOf<'a>,
    range: LineIndexRange,
    needle: &[u8],
) -> Vec<SearchResult> {
    let mut results = Vec::new();
    let mut cursor = range.start;
    while cursor < range.end {
        let sub_range = LineIndexRange::new(cursor, range.end);
        match window_search(lines, bytes_of, sub_range, 0, needle) {
            Some(result) => {
                results.push(result);
                cursor = result.line_index + 1;
            }
            None => break,
        }
    }
    results
}

pub fn window_find_first<'a>(
    lines: &[LineRecord],
    bytes_of: &BytesOf<'a>,
    range: LineIndexRange,
    needle: &[u8],
) -> Option<SearchResult> {
    window_search(lines, bytes_of, range, 0, needle)
}

/// Plain substring scan. The source engine uses a Boyer-Moore searcher here;
/// line lengths in practice are short enough (single log lines) that the
/// asymptotic win doesn't matter, so a direct scan is used instead.
fn find_substring(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileLineRange, LogLevel};

    fn line(start: usize, end: usize) -> LineRecord {
        let mut r = LineRecord::blank(FileLineRange { start, end });
        r.level = LogLevel::Info;
        r
    }

    #[test]
    fn window_search_finds_across_lines() {
        let bytes: &[u8] = b"hello world\nfoo needle bar\nbaz";
        let bytes_of: &BytesOf = &|_line: &LineRecord| bytes;
        let lines = vec![line(0, 11), line(12, 26), line(27, 30)];
        let range = LineIndexRange::new(0, 3);
        let result = window_search(&lines, bytes_of, range, 0, b"needle").unwrap();
        assert_eq!(result.line_index, 1);
        assert_eq!(result.line_offset, 4);
    }

    #[test]
    fn window_iterate_reports_lines_visited_before_stopping() {
        let bytes: &[u8] = b"a\nb\nc\nd";
        let bytes_of: &BytesOf = &|_line: &LineRecord| bytes;
        let lines = vec![line(0, 1), line(2, 3), line(4, 5), line(6, 7)];
        let always: &Filter = &|_, _| true;
        let mut seen = 0usize;
        let visited = window_iterate(&lines, bytes_of, LineIndexRange::new(0, 4), always, |_, _| {
            seen += 1;
            seen < 2
        });
        assert_eq!(visited, 2);
    }

    #[test]
    fn window_find_all_collects_every_hit() {
        let bytes: &[u8] = b"aXa\naXa\na..a";
        let bytes_of: &BytesOf = &|_line: &LineRecord| bytes;
        let lines = vec![line(0, 3), line(4, 7), line(8, 12)];
        let range = LineIndexRange::new(0, 3);
        let hits = window_find_all(&lines, bytes_of, range, b"X");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].line_index, 0);
        assert_eq!(hits[1].line_index, 1);
    }
}
