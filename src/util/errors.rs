use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::resolve::entry::EntryError;
use crate::runtime::module::LoadError;
use crate::runtime::vm::Fault;

pub type Result<T> = miette::Result<T>;

/// A terminal failure of one `run` invocation. Every variant maps to a
/// non-zero process exit; compile diagnostics are carried as data so the
/// CLI can print them line by line.
#[derive(Error, Debug, Diagnostic)]
pub enum RunFailure {
    #[error("failed to read {}: {source}", path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error("compilation failed")]
    Compile {
        diagnostics: Vec<crate::diag::Diagnostic>,
    },

    #[error("entry point signature not supported: `{type_name}.Main` has {arity} parameters")]
    Signature { type_name: String, arity: u8 },

    #[error("entry symbol `{type_name}.Main` missing from compiled image")]
    MissingEntrySymbol { type_name: String },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Runtime(#[from] Fault),
}
