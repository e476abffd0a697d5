// logsleuth-analyzer - flavor/server.rs
//
// Parser for the Server flavor. Line shape:
//
//   2024-01-01 12:00:00.000 [INFO] [Server.Http] request handled
//   ^timestamp              ^level  ^tag          ^msg (right-trimmed only)
//
// Unlike ComLib, the message section runs to end-of-line; rotated Server
// files are occasionally padded with trailing whitespace or a stray '\r'
// that survived a Windows-to-Unix transfer, so only the trailing edge is
// trimmed — the original text is never trimmed on the left.

use crate::model::{FileLineRange, LineRecord, SubRange};
use crate::util::constants::TIMESTAMP_PREFIX_LEN;

use super::translate_timestamp;

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

    if line.get(pos) != Some(&b'[') {
        return None;
    }
    pos += 1;
    let level_start = pos;
    while pos < line.len() && line[pos] != b']' {
        pos += 1;
    }
    if pos >= line.len() {
        return None;
    }
    let level_word = &line[level_start..pos];
    let level = super::translate_log_level(*level_word.first()?);
    pos += 1; // skip ']'
    if line.get(pos) != Some(&b' ') {
        return None;
    }
    pos += 1;

    if line.get(pos) != Some(&b'[') {
        return None;
    }
    pos += 1;
    let tag_start = pos;
    while pos < line.len() && line[pos] != b']' {
        pos += 1;
    }
    if pos >= line.len() {
        return None;
    }
    let tag_end = pos;
    pos += 1; // skip ']'
    if line.get(pos) == Some(&b' ') {
        pos += 1;
    }

    let msg_start = pos;
    let mut msg_end = line.len();
    while msg_end > msg_start && (line[msg_end - 1] == b' ' || line[msg_end - 1] == b'\r') {
        msg_end -= 1;
    }

    let mut record = LineRecord::blank(range);
    record.level = level;
    record.thread_id = 0;
    record.timestamp_ms = timestamp_ms;
    record.tag = Some(SubRange::new(tag_start, tag_end - tag_start));
    record.msg = Some(SubRange::new(msg_start, msg_end - msg_start));
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_line() {
        let line = b"2024-01-01 12:00:00.000 [INFO] [Server.Http] request handled   \r";
        let range = FileLineRange {
            start: 0,
            end: line.len(),
        };
        let rec = parse_line(line, range).expect("should parse");
        assert_eq!(rec.tag_str(line), b"Server.Http");
        assert_eq!(rec.msg_str(line), b"request handled");
    }
}
