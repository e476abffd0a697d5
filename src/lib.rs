// logsleuth-analyzer - lib.rs
//
// Offline analysis engine for rotated ComLib/Server/AndroidLogcat log
// corpora: memory-maps a file set, parses it into a zero-copy line store,
// and exposes tag summaries, named per-flavor commands, inspectors and
// export as a library surface for a console or GUI frontend to drive.

pub mod commands;
pub mod config;
pub mod export;
pub mod files;
pub mod flavor;
pub mod inspectors;
pub mod line_tools;
pub mod model;
pub mod repo;
pub mod translators;
pub mod util;

pub use commands::{CommandParams, CommandResult};
pub use config::ExportConfig;
pub use flavor::Flavor;
pub use model::{LineRecord, LogLevel};
pub use repo::LinesRepo;
pub use util::error::{EngineError, Result};
