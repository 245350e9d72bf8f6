use std::path::PathBuf;

use super::StageKind;

/// A stage failed to compile; `log` is the rendered compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage} stage failed to compile:\n{log}")]
pub struct CompileError {
    pub stage: StageKind,
    pub log: String,
}

impl CompileError {
    pub(crate) fn new(stage: StageKind, log: impl Into<String>) -> Self {
        Self {
            stage,
            log: log.into(),
        }
    }
}

/// The compiled stages do not form a valid program.
///
/// `log` holds one line per problem found, in the order they were detected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("program failed to link:\n{log}")]
pub struct LinkError {
    pub log: String,
}

/// Any failure while building a [`Program`](super::Program).
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("failed to read shader source {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
