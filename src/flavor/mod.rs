// logsleuth-analyzer - flavor/mod.rs
//
// Flavor registry: each flavor knows how to recognise its own files, sort
// rotated file sets into chronological order, and parse one line of its own
// text into a LineRecord. Everything here is pure/data-only so it can be
// exercised without touching the filesystem.

pub mod android_logcat;
pub mod comlib;
pub mod server;

use regex::Regex;

use crate::model::{FileLineRange, LineRecord, LogLevel};
use crate::util::constants::TIMESTAMP_PREFIX_LEN;

/// The three log families this engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    ComLib,
    Server,
    AndroidLogcat,
}

impl Flavor {
    pub fn name(self) -> &'static str {
        match self {
            Self::ComLib => "ComLib",
            Self::Server => "Server",
            Self::AndroidLogcat => "AndroidLogcat",
        }
    }

    /// Regex that a candidate file name must match to belong to this flavor.
    pub fn file_name_filter(self) -> &'static str {
        match self {
            Self::ComLib => r"comlib\.\d\d\d\.log",
            Self::Server => r"server\.\d{4}-\d\d-\d\d\.log",
            Self::AndroidLogcat => r"logcat\.\d+\.txt",
        }
    }

    /// Regex with one capture group whose value sorts the rotated files.
    pub fn file_name_sort(self) -> &'static str {
        match self {
            Self::ComLib => r"comlib\.(\d\d\d)\.log",
            Self::Server => r"server\.(\d{4}-\d\d-\d\d)\.log",
            Self::AndroidLogcat => r"logcat\.(\d+)\.txt",
        }
    }

    /// Newest-file-first when true (ComLib rotates with lower numbers being
    /// newer); ascending sort order otherwise.
    pub fn reverse_sort(self) -> bool {
        matches!(self, Self::ComLib)
    }

    /// Regex matched against a file's first line to positively identify it.
    pub fn line_identification(self) -> &'static str {
        match self {
            Self::ComLib => {
                r"^\d\d\d\d-\d\d-\d\d \d\d:\d\d:\d\d\.\d\d\d \d+ \|[A-Z]{4,} ?\|[\-0-9]{2}\|\w"
            }
            Self::Server => r"^\d\d\d\d-\d\d-\d\d \d\d:\d\d:\d\d\.\d\d\d \[\w+\] \[[\w.]+\]",
            Self::AndroidLogcat => r"^\d\d-\d\d \d\d:\d\d:\d\d\.\d\d\d +\d+ +\d+ \w ",
        }
    }

    /// Parses one already-isolated line (no trailing terminator) into a record.
    pub fn parse_line(self, bytes: &[u8], range: FileLineRange) -> Option<LineRecord> {
        match self {
            Self::ComLib => comlib::parse_line(bytes, range),
            Self::Server => server::parse_line(bytes, range),
            Self::AndroidLogcat => android_logcat::parse_line(bytes, range),
        }
    }
}

pub const ALL_FLAVORS: &[Flavor] = &[Flavor::ComLib, Flavor::Server, Flavor::AndroidLogcat];

/// Identifies a file's flavor from its first line, trying each flavor's
/// identification regex in declaration order and returning the first hit.
pub fn retrieve_file_type(first_line: &[u8]) -> Option<Flavor> {
    let text = String::from_utf8_lossy(first_line);
    for &flavor in ALL_FLAVORS {
        // Regex construction here is cheap relative to file I/O and keeps
        // each flavor's pattern colocated with its other metadata; callers
        // that process many files should prefer `FlavorMatcher`.
        if let Ok(re) = Regex::new(flavor.line_identification()) {
            if re.is_match(&text) {
                return Some(flavor);
            }
        }
    }
    None
}

/// Pre-compiled identification matcher for hot paths that check many files.
pub struct FlavorMatcher {
    compiled: Vec<(Flavor, Regex)>,
}

impl FlavorMatcher {
    pub fn new() -> Self {
        let compiled = ALL_FLAVORS
            .iter()
            .filter_map(|&f| Regex::new(f.line_identification()).ok().map(|re| (f, re)))
            .collect();
        Self { compiled }
    }

    pub fn identify(&self, first_line: &[u8]) -> Option<Flavor> {
        let text = String::from_utf8_lossy(first_line);
        self.compiled
            .iter()
            .find(|(_, re)| re.is_match(&text))
            .map(|(f, _)| *f)
    }
}

impl Default for FlavorMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Filters `candidates` down to those matching `flavor`'s file-name filter,
/// then orders them by the numeric/lexical value captured by the flavor's
/// sort regex, honouring `reverse_sort`. Files whose name doesn't match the
/// sort regex are dropped, mirroring the original's silent-skip behaviour.
pub fn list_and_sort(candidates: &[String], flavor: Flavor) -> Vec<String> {
    let filter = match Regex::new(flavor.file_name_filter()) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    let sort_re = match Regex::new(flavor.file_name_sort()) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };

    let mut keyed: Vec<(String, String)> = candidates
        .iter()
        .filter(|name| filter.is_match(name))
        .filter_map(|name| {
            sort_re
                .captures(name)
                .and_then(|c| c.get(1))
                .map(|m| (m.as_str().to_string(), name.clone()))
        })
        .collect();

    // Stable sort preserves original relative order for equal keys, matching
    // std::multimap's insertion-order behaviour for duplicate keys.
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    if flavor.reverse_sort() {
        keyed.reverse();
    }

    keyed.into_iter().map(|(_, name)| name).collect()
}

/// Converts a `YYYY-MM-DD HH:MM:SS.mmm` prefix at the start of `bytes` into
/// epoch milliseconds, interpreting the wall-clock value in the *local*
/// system time zone (matching the source system's use of `mktime`). Returns
/// `None` if the prefix is malformed or too short.
pub fn translate_timestamp(bytes: &[u8]) -> Option<i64> {
    if bytes.len() < TIMESTAMP_PREFIX_LEN {
        return None;
    }
    let text = std::str::from_utf8(&bytes[..TIMESTAMP_PREFIX_LEN]).ok()?;

    let year: i32 = text.get(0..4)?.parse().ok()?;
    if text.as_bytes().get(4) != Some(&b'-') {
        return None;
    }
    let month: u32 = text.get(5..7)?.parse().ok()?;
    if text.as_bytes().get(7) != Some(&b'-') {
        return None;
    }
    let day: u32 = text.get(8..10)?.parse().ok()?;
    if text.as_bytes().get(10) != Some(&b' ') {
        return None;
    }
    let hour: u32 = text.get(11..13)?.parse().ok()?;
    if text.as_bytes().get(13) != Some(&b':') {
        return None;
    }
    let min: u32 = text.get(14..16)?.parse().ok()?;
    if text.as_bytes().get(16) != Some(&b':') {
        return None;
    }
    let sec: u32 = text.get(17..19)?.parse().ok()?;
    if text.as_bytes().get(19) != Some(&b'.') {
        return None;
    }
    let millis: u32 = text.get(20..23)?.parse().ok()?;

    use chrono::{Local, TimeZone};
    let naive = chrono::NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_milli_opt(hour, min, sec, millis)?;
    match Local.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => Some(dt.timestamp_millis()),
        chrono::LocalResult::Ambiguous(dt, _) => Some(dt.timestamp_millis()),
        chrono::LocalResult::None => None,
    }
}

pub fn translate_log_level(c: u8) -> LogLevel {
    LogLevel::from_char(c).unwrap_or(LogLevel::Info)
}

/// Walks `bytes` line-by-line, delegating each line to `flavor`'s parser and
/// folding unparsable lines into the previous record as a continuation
/// (extending `data.end`, and the `msg` section length when present).
pub fn process_file_data(bytes: &[u8], flavor: Flavor, file_index: u32) -> Vec<LineRecord> {
    let mut out: Vec<LineRecord> = Vec::new();
    let mut pos = 0usize;
    let len = bytes.len();

    while pos < len {
        let line_start = pos;
        while pos < len && bytes[pos] != b'\n' && bytes[pos] != b'\r' {
            pos += 1;
        }
        let line_end = pos;

        // skip the terminator (one \n, or \r optionally followed by \n)
        if pos < len {
            let term = bytes[pos];
            pos += 1;
            if term == b'\r' && pos < len && bytes[pos] == b'\n' {
                pos += 1;
            }
        }
        // skip a run of embedded NULs some rotated files pad lines with
        while pos < len && bytes[pos] == 0 {
            pos += 1;
        }

        if line_start == line_end {
            continue;
        }

        let range = FileLineRange {
            start: line_start,
            end: line_end,
        };

        match flavor.parse_line(bytes, range) {
            Some(mut record) => {
                record.file_index = file_index;
                out.push(record);
            }
            None => {
                if let Some(last) = out.last_mut() {
                    last.data.end = line_end;
                    if let Some(msg) = last.msg.as_mut() {
                        let new_section_end = line_end - last.data.start;
                        msg.len = (new_section_end - msg.offset as usize) as u32;
                    }
                }
                // a continuation line before any line has parsed is dropped
            }
        }
    }

    out
}
