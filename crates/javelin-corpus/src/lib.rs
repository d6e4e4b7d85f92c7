//! API corpus boundary: descriptor records, the type-string parser, and
//! member-selection rule files.
//!
//! Everything here is lenient by design: a record or signature that cannot be
//! understood is skipped with a diagnostic, never fatal to the rest of the
//! corpus (the graph builder applies the same policy member by member).

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

mod parse;
mod records;
mod rules;

pub use parse::{TypeParamDecl, TypeParser, TypeVarScope};
pub use records::{AccessMod, ClassRecord, FieldRecord, MethodRecord};
pub use rules::{MatchFunc, Matcher, RuleSet};

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid rule pattern `{pattern}`: {reason}")]
    Rule { pattern: String, reason: String },
    #[error("rule row has {got} patterns but the file declares {expected} columns")]
    RuleArity { expected: usize, got: usize },
}

/// Load an API corpus: a JSON array of per-class records.
pub fn load_corpus(path: &Path) -> Result<Vec<ClassRecord>, CorpusError> {
    let text = fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CorpusError::Json {
        path: path.to_path_buf(),
        source,
    })
}
