// logsleuth-analyzer - flavor/android_logcat.rs
//
// Parser for logcat captures taken from an Android host running the same
// native client as the ComLib flavor. Two line shapes occur in the wild:
//
//   1. Plain logcat:
//      08-14 10:02:01.123  1234  1250 I ActivityManager: Start proc foo
//
//   2. ComLib's own line, re-emitted verbatim as logcat's message once the
//      client's internal logger is bridged through `__android_log_print`:
//      08-14 10:02:01.123  1234  1250 I ComLib  : 2024-08-14 10:02:01.123 1250 |INFO |-1|COMLib.Scheduler:run| task scheduled |id=7
//
// Case 2 is detected by attempting the ComLib parser against the message
// text; when it succeeds we keep ComLib's tag/method/msg/params (the useful
// structured data) and the logcat envelope's pid as thread_id, since that's
// the identifier that is stable across the file. Case 1 falls back to
// logcat's own tag/message split with no method/params.

use chrono::Datelike;

use crate::model::{FileLineRange, LineRecord, SubRange};

use super::translate_log_level;

fn read_digits(line: &[u8], pos: &mut usize) -> Option<usize> {
    let start = *pos;
    while *pos < line.len() && line[*pos].is_ascii_digit() {
        *pos += 1;
    }
    if *pos == start {
        return None;
    }
    std::str::from_utf8(&line[start..*pos]).ok()?.parse().ok()
}

fn skip_spaces(line: &[u8], pos: &mut usize) {
    while *pos < line.len() && line[*pos] == b' ' {
        *pos += 1;
    }
}

pub fn parse_line(bytes: &[u8], range: FileLineRange) -> Option<LineRecord> {
    let line = &bytes[range.start..range.end];
    let mut pos = 0usize;

    let month: u32 = read_digits(line, &mut pos)? as u32;
    if line.get(pos) != Some(&b'-') {
        return None;
    }
    pos += 1;
    let day: u32 = read_digits(line, &mut pos)? as u32;
    if line.get(pos) != Some(&b' ') {
        return None;
    }
    pos += 1;
    let hour: u32 = read_digits(line, &mut pos)? as u32;
    if line.get(pos) != Some(&b':') {
        return None;
    }
    pos += 1;
    let min: u32 = read_digits(line, &mut pos)? as u32;
    if line.get(pos) != Some(&b':') {
        return None;
    }
    pos += 1;
    let sec: u32 = read_digits(line, &mut pos)? as u32;
    if line.get(pos) != Some(&b'.') {
        return None;
    }
    pos += 1;
    let millis: u32 = read_digits(line, &mut pos)? as u32;
    skip_spaces(line, &mut pos);

    let pid = read_digits(line, &mut pos)?;
    skip_spaces(line, &mut pos);
    let _tid = read_digits(line, &mut pos)?;
    skip_spaces(line, &mut pos);

    let level_char = *line.get(pos)?;
    pos += 1;
    if line.get(pos) != Some(&b' ') {
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
    let mut tag_end = pos;
    while tag_end > tag_start && line[tag_end - 1] == b' ' {
        tag_end -= 1;
    }
    pos += 1; // skip ':'
    if line.get(pos) == Some(&b' ') {
        pos += 1;
    }
    let msg_start = pos;

    // logcat carries no year; anchor to the current local year, which is
    // correct for freshly captured logs and close enough for archived ones
    // since this engine never needs cross-year ordering precision here.
    let year = chrono::Local::now().year();
    let naive = chrono::NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_milli_opt(hour, min, sec, millis)?;
    let timestamp_ms = match chrono::TimeZone::from_local_datetime(&chrono::Local, &naive) {
        chrono::LocalResult::Single(dt) => chrono::DateTime::timestamp_millis(&dt),
        chrono::LocalResult::Ambiguous(dt, _) => chrono::DateTime::timestamp_millis(&dt),
        chrono::LocalResult::None => return None,
    };

    // case 2: the message itself is a complete ComLib line
    if let Some(inner) = super::comlib::parse_line(
        line,
        FileLineRange {
            start: msg_start,
            end: line.len(),
        },
    ) {
        let rebase = |s: SubRange| SubRange::new(msg_start + s.offset as usize, s.len as usize);
        let mut record = LineRecord::blank(range);
        record.level = inner.level;
        record.thread_id = pid as i32;
        record.timestamp_ms = timestamp_ms;
        record.tag = inner.tag.map(rebase);
        record.method = inner.method.map(rebase);
        record.msg = inner.msg.map(rebase);
        record.params = inner.params.map(rebase);
        return Some(record);
    }

    // case 1: plain logcat line
    let mut msg_end = line.len();
    while msg_end > msg_start && (line[msg_end - 1] == b' ' || line[msg_end - 1] == b'\r') {
        msg_end -= 1;
    }

    let mut record = LineRecord::blank(range);
    record.level = translate_log_level(level_char);
    record.thread_id = pid as i32;
    record.timestamp_ms = timestamp_ms;
    record.tag = Some(SubRange::new(tag_start, tag_end - tag_start));
    record.msg = Some(SubRange::new(msg_start, msg_end - msg_start));
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_logcat_line() {
        let line = b"08-14 10:02:01.123  1234  1250 I ActivityManager: Start proc foo";
        let range = FileLineRange {
            start: 0,
            end: line.len(),
        };
        let rec = parse_line(line, range).expect("should parse");
        assert_eq!(rec.thread_id, 1234);
        assert_eq!(rec.tag_str(line), b"ActivityManager");
        assert_eq!(rec.msg_str(line), b"Start proc foo");
    }

    #[test]
    fn parses_embedded_comlib_line() {
        let line = b"08-14 10:02:01.123  1234  1250 I ComLib  : 2024-08-14 10:02:01.123 1250 |INFO    |-1|COMLib.Scheduler:run| task scheduled |id=7";
        let range = FileLineRange {
            start: 0,
            end: line.len(),
        };
        let rec = parse_line(line, range).expect("should parse");
        assert_eq!(rec.thread_id, 1234);
        assert_eq!(rec.tag_str(line), b"COMLib.Scheduler");
        assert_eq!(rec.method_str(line), b"run");
        assert_eq!(rec.param_extract_i64(line, "id"), Some(7));
    }
}
