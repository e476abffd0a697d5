// logsleuth-analyzer - util/constants.rs
//
// Single source of truth for named constants referenced by more than one
// module. The engine places far fewer hard caps than a GUI frontend would:
// per the concurrency & resource model, bounding input size is the caller's
// responsibility, not this crate's.

/// Crate version, surfaced through diagnostics.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Timestamp prefix layout (fixed-width, shared by ComLib/Server/AndroidLogcat)
// =============================================================================

/// Byte length of the `YYYY-MM-DD HH:MM:SS.mmm` timestamp prefix every
/// flavor validates before attempting to translate it.
pub const TIMESTAMP_PREFIX_LEN: usize = 23;

// =============================================================================
// ComLib execution-range banner
// =============================================================================

/// The full raw text of the banner line that bounds a ComLib execution.
pub const EXECUTION_START_BANNER: &str =
    "|COMLib:  | ******************************* log start *******************************";

// =============================================================================
// Task/HTTP reconstruction message templates
// =============================================================================

/// Fixed set of scheduler message templates collected verbatim (with the
/// task id substituted in) while reconstructing one task's full execution.
/// Order does not matter; every hit across every template is gathered.
pub const TASK_WAIT_FINISH_QUERIES: &[&str] = &[
    "| task waiting (sync) | id={}; waiting for=",
    "| task waiting (time) | id={}; ms=",
    "| task waiting (task) | id={}; waiting for=",
    "| task moving on (sync) | id={}; waited for=",
    "| task moving on (task) | id={}; waited for=",
    "| task cancelled | id={};",
    "| scheduler canceled a task that didn't have support to be canceled | id={}; name=",
    "| canceling task because task is already running | id={}; name=",
    "| ignoring task remove because task is already running | id={}; name=",
    "| removed task | id={}; name=",
];

// =============================================================================
// PCAP export
// =============================================================================

/// Standard PCAP global-header magic number (microsecond resolution).
pub const PCAP_MAGIC: u32 = 0xa1b2_c3d4;

/// Linux "cooked capture" (SLL) link-layer type.
pub const PCAP_LINKTYPE_LINUX_SLL: u32 = 0x71;

/// Maximum captured-bytes-per-packet recorded in the PCAP global header.
pub const PCAP_SNAPLEN: u32 = 65535;

// =============================================================================
// Export
// =============================================================================

/// Default export format used by `config::ExportConfig` when not overridden.
pub const DEFAULT_EXPORT_FORMAT: &str = "raw-line";

// =============================================================================
// Logging
// =============================================================================

/// Default log level used by `util::logging::init` when nothing else
/// (RUST_LOG, embedder override) specifies one.
pub const DEFAULT_LOG_LEVEL: &str = "info";
