// logsleuth-analyzer - translators/mod.rs
//
// Translators turn one structured line into export text. Three output
// shapes (line/JSON-full/JSON-single-params) cross two render modes
// (raw/translated): raw modes format the record's own fields; translated
// mode hands the line to a flavor-specific humanizer first and only falls
// back to raw if the humanizer has nothing to say about this line.

pub mod comlib;

use serde_json::{json, Value};

use crate::flavor::Flavor;
use crate::model::LineRecord;
use crate::repo::LinesRepo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Line,
    JsonFull,
    JsonSingleParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Raw,
    Translated,
}

/// Splits a params byte range into (name, value) pairs, honouring the rule
/// that a `;` inside a value doesn't end the entry unless followed by a
/// space.
pub fn iterate_params(params: &[u8]) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut rest = params;
    loop {
        if rest.is_empty() {
            break;
        }
        let mut end = 0usize;
        loop {
            while end < rest.len() && rest[end] != b';' {
                end += 1;
            }
            if end >= rest.len() {
                break;
            }
            if end + 1 < rest.len() && rest[end + 1] == b' ' {
                break;
            }
            end += 1;
        }
        let entry = &rest[..end.min(rest.len())];
        if let Some(eq) = entry.iter().position(|&b| b == b'=') {
            let name = String::from_utf8_lossy(&entry[..eq]).into_owned();
            let value = String::from_utf8_lossy(&entry[eq + 1..]).into_owned();
            out.push((name, value));
        }
        if end + 2 > rest.len() {
            break;
        }
        rest = &rest[end + 2..];
    }
    out
}

fn raw_json(repo: &LinesRepo, line: &LineRecord, format: OutputFormat) -> Value {
    let bytes = repo.bytes_for(line);
    let mut obj = serde_json::Map::new();
    obj.insert("timestamp".into(), json!(line.timestamp_ms));
    obj.insert("threadId".into(), json!(line.thread_id));
    obj.insert("level".into(), json!(line.level.to_string()));
    obj.insert(
        "tag".into(),
        json!(String::from_utf8_lossy(line.tag_str(bytes))),
    );
    obj.insert(
        "method".into(),
        json!(String::from_utf8_lossy(line.method_str(bytes))),
    );
    obj.insert(
        "msg".into(),
        json!(String::from_utf8_lossy(line.msg_str(bytes))),
    );

    match format {
        OutputFormat::JsonFull => {
            let params = iterate_params(line.params_str(bytes));
            obj.insert(
                "params".into(),
                json!(params
                    .into_iter()
                    .map(|(name, value)| json!({"name": name, "value": value}))
                    .collect::<Vec<_>>()),
            );
        }
        OutputFormat::JsonSingleParams => {
            obj.insert(
                "params".into(),
                json!(String::from_utf8_lossy(line.params_str(bytes))),
            );
        }
        OutputFormat::Line => unreachable!("raw_json only called for JSON formats"),
    }

    Value::Object(obj)
}

/// Renders one line to export text according to `mode`/`format`.
pub fn translate(repo: &LinesRepo, line: &LineRecord, mode: RenderMode, format: OutputFormat) -> String {
    if mode == RenderMode::Translated {
        if let Some(text) = humanize(repo, line) {
            return text;
        }
        // fall through to raw rendering when no translator had anything to say
    }

    match format {
        OutputFormat::Line => {
            let bytes = repo.bytes_for(line);
            String::from_utf8_lossy(line.raw(bytes)).into_owned()
        }
        OutputFormat::JsonFull | OutputFormat::JsonSingleParams => {
            raw_json(repo, line, format).to_string()
        }
    }
}

fn humanize(repo: &LinesRepo, line: &LineRecord) -> Option<String> {
    match repo.flavor() {
        Flavor::ComLib | Flavor::AndroidLogcat => comlib::translate(repo, line),
        Flavor::Server => None,
    }
}
