// logsleuth-analyzer - model.rs
//
// The zero-copy line record and the byte-range types it is built from.
// A LineRecord never owns text: every section is an offset/length pair
// resolved against the file bytes the record's `data` range points into.

use std::fmt;

/// Log severity, ordered low-to-high for anyone that wants numeric comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    /// Case-insensitive single-character classifier shared by every flavor.
    pub fn from_char(c: u8) -> Option<Self> {
        match c {
            b't' | b'T' => Some(Self::Trace),
            b'd' | b'D' => Some(Self::Debug),
            b'i' | b'I' => Some(Self::Info),
            b'w' | b'W' => Some(Self::Warn),
            b'e' | b'E' => Some(Self::Error),
            b'f' | b'F' => Some(Self::Fatal),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        };
        f.write_str(s)
    }
}

/// A half-open byte range `[start, end)` within one file's raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileLineRange {
    pub start: usize,
    pub end: usize,
}

impl FileLineRange {
    pub fn empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> usize {
        if self.start < self.end {
            self.end - self.start
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty()
    }
}

/// A half-open index range `[start, end)` into a line store's line vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineIndexRange {
    pub start: usize,
    pub end: usize,
}

impl LineIndexRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.empty()
    }

    pub fn num_lines(&self) -> usize {
        if self.start < self.end {
            self.end - self.start
        } else {
            0
        }
    }
}

/// An offset+length pair relative to a `LineRecord`'s `data.start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubRange {
    pub offset: u16,
    pub len: u32,
}

impl SubRange {
    pub fn new(offset: usize, len: usize) -> Self {
        Self {
            offset: offset as u16,
            len: len as u32,
        }
    }
}

/// String-match discriminators shared by the filter DSL and parameter checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Exact,
    StartsWith,
    EndsWith,
    Contains,
}

fn matches(haystack: &[u8], needle: &[u8], kind: MatchType) -> bool {
    match kind {
        MatchType::Exact => haystack == needle,
        MatchType::StartsWith => haystack.starts_with(needle),
        MatchType::EndsWith => haystack.ends_with(needle),
        MatchType::Contains => {
            if needle.is_empty() {
                return true;
            }
            haystack
                .windows(needle.len())
                .any(|window| window == needle)
        }
    }
}

/// A single, zero-copy parsed line. Offsets are resolved against `bytes`,
/// the owning file's full mapped buffer, via `data`.
#[derive(Debug, Clone)]
pub struct LineRecord {
    /// 1-based, assigned globally after every file has been processed.
    /// `0` means "not yet assigned" (only true transiently during construction).
    pub id: u64,
    /// Index into the owning repo's `FileSet::files`, resolving which
    /// mapped buffer `data` and every section offset is relative to.
    pub file_index: u32,
    pub level: LogLevel,
    pub thread_id: i32,
    pub timestamp_ms: i64,
    pub data: FileLineRange,
    pub thread_name: Option<SubRange>,
    pub tag: Option<SubRange>,
    pub method: Option<SubRange>,
    pub msg: Option<SubRange>,
    pub params: Option<SubRange>,
}

impl LineRecord {
    /// A blank record anchored at `data`; parsers start from this and fill
    /// in sections as they validate them.
    pub fn blank(data: FileLineRange) -> Self {
        Self {
            id: 0,
            file_index: 0,
            level: LogLevel::Fatal,
            thread_id: 0,
            timestamp_ms: 0,
            data,
            thread_name: None,
            tag: None,
            method: None,
            msg: None,
            params: None,
        }
    }

    fn section<'a>(&self, bytes: &'a [u8], section: Option<SubRange>) -> &'a [u8] {
        match section {
            Some(s) => {
                let start = self.data.start + s.offset as usize;
                let end = start + s.len as usize;
                &bytes[start..end]
            }
            None => &[],
        }
    }

    pub fn raw<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.data.start..self.data.end]
    }

    pub fn thread_name_str<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        self.section(bytes, self.thread_name)
    }

    pub fn tag_str<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        self.section(bytes, self.tag)
    }

    pub fn method_str<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        self.section(bytes, self.method)
    }

    pub fn msg_str<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        self.section(bytes, self.msg)
    }

    pub fn params_str<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        self.section(bytes, self.params)
    }

    pub fn check_thread_name(&self, bytes: &[u8], needle: &str, kind: MatchType) -> bool {
        matches(self.thread_name_str(bytes), needle.as_bytes(), kind)
    }

    pub fn check_tag(&self, bytes: &[u8], needle: &str, kind: MatchType) -> bool {
        matches(self.tag_str(bytes), needle.as_bytes(), kind)
    }

    pub fn check_method(&self, bytes: &[u8], needle: &str, kind: MatchType) -> bool {
        matches(self.method_str(bytes), needle.as_bytes(), kind)
    }

    pub fn check_msg(&self, bytes: &[u8], needle: &str, kind: MatchType) -> bool {
        matches(self.msg_str(bytes), needle.as_bytes(), kind)
    }

    /// Extracts the value of a `name=value` entry from the params section.
    /// Mirrors the original's "; "-delimited entry walk, including the rule
    /// that a value may itself contain `;` so long as it isn't followed by
    /// a space.
    pub fn param_extract<'a>(&self, bytes: &'a [u8], name: &str) -> Option<&'a [u8]> {
        let mut params = self.params_str(bytes);
        if name.is_empty() {
            return None;
        }

        loop {
            if params.is_empty() {
                return None;
            }

            let prefix_len = name.len() + 1; // "name="
            if params.len() >= prefix_len
                && &params[..name.len()] == name.as_bytes()
                && params[name.len()] == b'='
            {
                let value_start = &params[prefix_len..];
                // value ends at "; " or end-of-section (the last entry has no
                // trailing delimiter at all)
                let mut i = 0usize;
                loop {
                    while i < value_start.len() && value_start[i] != b';' {
                        i += 1;
                    }
                    if i >= value_start.len() {
                        return Some(&value_start[..i]);
                    }
                    if i + 1 < value_start.len() && value_start[i + 1] == b' ' {
                        break;
                    }
                    if i + 1 >= value_start.len() {
                        // trailing ';' with nothing after it is part of the value
                        return Some(&value_start[..i + 1]);
                    }
                    i += 1;
                }
                return Some(&value_start[..i]);
            }

            // advance to the next "; "-delimited entry
            let mut i = 0usize;
            loop {
                while i < params.len() && params[i] != b';' {
                    i += 1;
                }
                if i >= params.len() {
                    return None;
                }
                i += 1;
                if i >= params.len() {
                    return None;
                }
                if params[i] == b' ' {
                    break;
                }
            }
            params = &params[i + 1..];
        }
    }

    pub fn param_extract_i64(&self, bytes: &[u8], name: &str) -> Option<i64> {
        self.param_extract(bytes, name)
            .and_then(|v| std::str::from_utf8(v).ok())
            .and_then(|v| v.parse::<i64>().ok())
    }

    pub fn param_extract_i32(&self, bytes: &[u8], name: &str) -> Option<i32> {
        self.param_extract(bytes, name)
            .and_then(|v| std::str::from_utf8(v).ok())
            .and_then(|v| v.parse::<i32>().ok())
    }

    pub fn param_extract_str(&self, bytes: &[u8], name: &str) -> Option<String> {
        self.param_extract(bytes, name)
            .map(|v| String::from_utf8_lossy(v).into_owned())
    }

    pub fn param_check(&self, bytes: &[u8], name: &str, value: &str) -> bool {
        self.param_extract(bytes, name) == Some(value.as_bytes())
    }

    pub fn param_check_i64(&self, bytes: &[u8], name: &str, value: i64) -> bool {
        self.param_extract_i64(bytes, name) == Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_params(line: &str, params_offset: usize) -> (Vec<u8>, LineRecord) {
        let bytes = line.as_bytes().to_vec();
        let mut rec = LineRecord::blank(FileLineRange {
            start: 0,
            end: bytes.len(),
        });
        rec.params = Some(SubRange::new(params_offset, bytes.len() - params_offset));
        (bytes, rec)
    }

    #[test]
    fn param_extract_simple() {
        let (bytes, rec) = record_with_params("id=5; name=foo", 0);
        assert_eq!(rec.param_extract_i64(&bytes, "id"), Some(5));
        assert_eq!(rec.param_extract_str(&bytes, "name"), Some("foo".into()));
    }

    #[test]
    fn param_extract_value_with_semicolon() {
        let (bytes, rec) = record_with_params("msg=a;b; id=7", 0);
        assert_eq!(rec.param_extract_str(&bytes, "msg"), Some("a;b".into()));
        assert_eq!(rec.param_extract_i64(&bytes, "id"), Some(7));
    }

    #[test]
    fn param_extract_last_entry_runs_to_end_of_section() {
        let (bytes, rec) = record_with_params("id=5; name=foo", 0);
        assert_eq!(rec.param_extract_str(&bytes, "name"), Some("foo".into()));
        let (bytes, rec) = record_with_params("name=foo", 0);
        assert_eq!(rec.param_extract_str(&bytes, "name"), Some("foo".into()));
        let (bytes, rec) = record_with_params("name=foo;", 0);
        assert_eq!(rec.param_extract_str(&bytes, "name"), Some("foo;".into()));
    }

    #[test]
    fn param_extract_missing() {
        let (bytes, rec) = record_with_params("id=5", 0);
        assert_eq!(rec.param_extract_str(&bytes, "name"), None);
    }

    #[test]
    fn line_index_range_basics() {
        let r = LineIndexRange::new(3, 3);
        assert!(r.empty());
        let r = LineIndexRange::new(3, 5);
        assert_eq!(r.num_lines(), 2);
    }
}
