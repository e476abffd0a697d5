// logsleuth-analyzer - flavor/comlib.rs
//
// Parser for the ComLib native-client flavor. Line shape:
//
//   2024-01-01 12:00:00.000 1234 |INFO    |-1|COMLib.Scheduler:run| started |id=7
//   ^timestamp              ^tid  ^level   ^acct ^tag    ^method  ^msg      ^params
//
// Every section is walked byte-by-byte; a line that doesn't match the shape
// exactly is rejected (None) and folded into the previous line by the caller.

use crate::model::{FileLineRange, LineRecord, SubRange};
use crate::util::constants::TIMESTAMP_PREFIX_LEN;

use super::{translate_log_level, translate_timestamp};

pub fn parse_line(bytes: &[u8], range: FileLineRange) -> Option<LineRecord> {
    let line = &bytes[range.start..range.end];
    if line.len() <= TIMESTAMP_PREFIX_LEN {
        return None;
    }

    let timestamp_ms = translate_timestamp(line)?;
    let mut pos = TIMESTAMP_PREFIX_LEN;
    if line.get(pos) != Some(&b' ') {
        return None;
    }
    pos += 1;

    let tid_start = pos;
    while pos < line.len() && line[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos == tid_start {
        return None;
    }
    let thread_id: i32 = std::str::from_utf8(&line[tid_start..pos]).ok()?.parse().ok()?;
    if line.get(pos) != Some(&b' ') {
        return None;
    }
    pos += 1;

    if line.get(pos) != Some(&b'|') {
        return None;
    }
    pos += 1;

    let level_start = pos;
    while pos < line.len() && line[pos].is_ascii_uppercase() {
        pos += 1;
    }
    if pos - level_start < 4 {
        return None;
    }
    let level = translate_log_level(line[level_start]);
    while pos < line.len() && line[pos] == b' ' {
        pos += 1;
    }
    if line.get(pos) != Some(&b'|') {
        return None;
    }
    pos += 1;

    // account section, exactly two characters of [-0-9]
    if line.len() < pos + 2 {
        return None;
    }
    let acct = &line[pos..pos + 2];
    if !acct
        .iter()
        .all(|b| b.is_ascii_digit() || *b == b'-')
    {
        return None;
    }
    pos += 2;
    if line.get(pos) != Some(&b'|') {
        return None;
    }
    pos += 1;

    let tag_start = pos;
    while pos < line.len() && line[pos] != b':' {
        pos += 1;
    }
    if pos >= line.len() {
        return None;
    }
    let tag_end = pos;
    pos += 1; // skip ':'

    let method_start = pos;
    while pos < line.len() && line[pos] != b'|' {
        pos += 1;
    }
    if pos >= line.len() {
        return None;
    }
    let mut method_end = pos;
    while method_end > method_start && line[method_end - 1] == b' ' {
        method_end -= 1;
    }
    pos += 1; // skip '|'
    if line.get(pos) == Some(&b' ') {
        pos += 1;
    }

    let msg_start = pos;
    while pos < line.len() && line[pos] != b'|' {
        pos += 1;
    }
    let mut msg_end = pos;
    while msg_end > msg_start && line[msg_end - 1] == b' ' {
        msg_end -= 1;
    }

    let params = if pos < line.len() {
        pos += 1; // skip '|'
        Some(SubRange::new(pos, line.len() - pos))
    } else {
        None
    };

    let mut record = LineRecord::blank(range);
    record.level = level;
    record.thread_id = thread_id;
    record.timestamp_ms = timestamp_ms;
    record.tag = Some(SubRange::new(tag_start, tag_end - tag_start));
    record.method = Some(SubRange::new(method_start, method_end - method_start));
    record.msg = Some(SubRange::new(msg_start, msg_end - msg_start));
    record.params = params;
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_line() {
        let line = b"2024-01-01 12:00:00.000 1234 |INFO    |-1|COMLib.Scheduler:run| task scheduled |id=7; name=foo";
        let range = FileLineRange {
            start: 0,
            end: line.len(),
        };
        let rec = parse_line(line, range).expect("should parse");
        assert_eq!(rec.thread_id, 1234);
        assert_eq!(rec.tag_str(line), b"COMLib.Scheduler");
        assert_eq!(rec.method_str(line), b"run");
        assert_eq!(rec.msg_str(line), b"task scheduled");
        assert_eq!(rec.param_extract_i64(line, "id"), Some(7));
    }

    #[test]
    fn rejects_malformed_line() {
        let line = b"not a comlib line at all";
        let range = FileLineRange {
            start: 0,
            end: line.len(),
        };
        assert!(parse_line(line, range).is_none());
    }
}
