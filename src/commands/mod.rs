// logsleuth-analyzer - commands/mod.rs
//
// Command registry: each flavor contributes a tagged set of named, scriptable
// analyses over a repo's lines. Registration is insertion-order preserving
// and deduplicates by name (first registration for a given tag/name wins),
// mirroring the source system's iteration-based registry build.
//
// `CommandResult` is the wire envelope itself, not an intermediate value
// that gets translated into one later: commands mutate it in place via
// `add_line_indices`/`add_network_packet_ipv4`/`json`, and the repo façade
// fills in `command`/`executed` around the call.

pub mod comlib;
pub mod comlib_utils;
pub mod server;

use std::collections::HashMap;

use crate::flavor::Flavor;
use crate::repo::LinesRepo;

/// User-supplied command parameters, always string-keyed and string-valued;
/// commands parse numeric params themselves since the accepted shapes vary
/// (a task command accepts either a task id or a task name, for instance).
pub type CommandParams = HashMap<String, String>;

/// Identifies which command produced an envelope and with what it was
/// invoked, echoed back so a caller can tell envelopes apart without keeping
/// its own bookkeeping.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CommandDescriptor {
    pub tag: String,
    pub name: String,
    pub params: String,
}

/// One named (or anonymous) group of line indices inside an envelope. A
/// command that reports several independent findings (one per task
/// execution, one per SIP dialog, ...) gets one group per finding rather
/// than flattening everything into a single list.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LineIndexGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub indices: Vec<usize>,
}

/// A pointer into one existing line's own raw bytes — never a copy, and
/// never bytes from a different line than `index`.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct LineContentRef {
    pub index: usize,
    pub offset: usize,
    pub size: usize,
}

/// A synthesized network packet, carrying only a pointer to the line content
/// it was derived from; `export_command_network_packets` resolves the actual
/// bytes against the repo at export time.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NetworkPacket {
    pub domain: &'static str,
    pub timestamp: i64,
    pub endpoints: [String; 2],
    pub line: LineContentRef,
}

/// Accumulates one command execution's output. This struct *is* the JSON
/// envelope: `command`/`executed` are filled in by the repo façade around
/// the call, everything else by the command itself.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CommandResult {
    pub command: CommandDescriptor,
    pub executed: bool,
    #[serde(rename = "linesIndices")]
    pub lines_indices: Vec<LineIndexGroup>,
    #[serde(rename = "networkPackets")]
    pub network_packets: Vec<NetworkPacket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
}

impl CommandResult {
    pub fn new(tag: &str, name: &str, params: String) -> Self {
        Self {
            command: CommandDescriptor {
                tag: tag.to_string(),
                name: name.to_string(),
                params,
            },
            executed: false,
            lines_indices: Vec::new(),
            network_packets: Vec::new(),
            output: None,
        }
    }

    /// Appends a named (or anonymous) group of line indices, sorted and
    /// deduplicated, and returns its group id — the id other envelope
    /// entries (a SIP dialog, a deadlocked task) reference via `linesIndex`.
    pub fn add_line_indices(&mut self, name: Option<&str>, mut indices: Vec<usize>) -> usize {
        indices.sort_unstable();
        indices.dedup();
        self.lines_indices.push(LineIndexGroup {
            name: name.map(str::to_string),
            indices,
        });
        self.lines_indices.len() - 1
    }

    /// Convenience for the common "one group, one index" case.
    pub fn add_line_index(&mut self, index: usize) -> usize {
        self.add_line_indices(None, vec![index])
    }

    /// Records a synthetic IPv4 packet whose payload is a slice of `line`'s
    /// own content — never bytes copied from elsewhere. IPv6 framing is out
    /// of scope (see export.rs), so there is no `_ipv6` counterpart yet.
    pub fn add_network_packet_ipv4(
        &mut self,
        source: std::net::SocketAddr,
        destination: std::net::SocketAddr,
        timestamp_ms: i64,
        line: LineContentRef,
    ) {
        self.network_packets.push(NetworkPacket {
            domain: "ipv4",
            timestamp: timestamp_ms,
            endpoints: [source.to_string(), destination.to_string()],
            line,
        });
    }

    /// The mutable `output` value a command builds in place. Left untouched
    /// (and so omitted from the serialized envelope) by commands that only
    /// ever report line groups.
    pub fn json(&mut self) -> &mut serde_json::Value {
        self.output.get_or_insert(serde_json::Value::Null)
    }
}

/// A single registered command. `execute` takes an optional anchor line
/// index (present for the `:N` "starting from this line" invocation form),
/// the caller's parameters, and the repo to read from, and returns whether
/// the command found anything to report.
pub struct CommandInfo {
    pub name: &'static str,
    pub help: &'static str,
    pub params_help: &'static str,
    pub supports_line_execution: bool,
    pub execute: fn(&LinesRepo, Option<usize>, &CommandParams, &mut CommandResult) -> bool,
}

/// All commands registered under one flavor's tag.
pub struct Registry {
    pub tag: &'static str,
    pub commands: Vec<CommandInfo>,
}

pub(crate) fn register(commands: &mut Vec<CommandInfo>, info: CommandInfo) {
    if !commands.iter().any(|c| c.name == info.name) {
        commands.push(info);
    }
}

/// Builds every flavor's command registry. Flavors that have no commands of
/// their own (AndroidLogcat reuses ComLib's once lines are identified as
/// embedded ComLib) simply don't appear here.
pub fn all_registries() -> Vec<Registry> {
    vec![comlib::registry(), server::registry()]
}

/// Looks up the registry whose tag matches a repo's flavor, if any.
pub fn registry_for(flavor: Flavor) -> Option<Registry> {
    match flavor {
        Flavor::ComLib | Flavor::AndroidLogcat => Some(comlib::registry()),
        Flavor::Server => Some(server::registry()),
    }
}
