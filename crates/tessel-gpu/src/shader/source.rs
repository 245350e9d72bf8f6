use std::collections::BTreeMap;
use std::path::Path;

use super::{CompileError, ProgramError, ShaderStage, StageKind};

/// Stage sources of a program, keyed by stage kind.
///
/// Attaching a second source for the same kind replaces the first.
#[derive(Debug, Clone, Default)]
pub struct ProgramSource {
    stages: BTreeMap<StageKind, String>,
}

impl ProgramSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(mut self, kind: StageKind, source: impl Into<String>) -> Self {
        self.stages.insert(kind, source.into());
        self
    }

    /// The common vertex + fragment pair.
    pub fn vertex_fragment(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::new()
            .with_stage(StageKind::Vertex, vertex)
            .with_stage(StageKind::Fragment, fragment)
    }

    /// Reads both stage sources from disk.
    pub fn from_files(
        vertex: impl AsRef<Path>,
        fragment: impl AsRef<Path>,
    ) -> Result<Self, ProgramError> {
        Ok(Self::vertex_fragment(
            read_source(vertex.as_ref())?,
            read_source(fragment.as_ref())?,
        ))
    }

    pub fn stage(&self, kind: StageKind) -> Option<&str> {
        self.stages.get(&kind).map(String::as_str)
    }

    /// Compiles every attached stage in stage order, stopping at the first
    /// failure.
    pub fn compile(&self) -> Result<Vec<ShaderStage>, CompileError> {
        self.stages
            .iter()
            .map(|(kind, source)| ShaderStage::compile(*kind, source))
            .collect()
    }
}

fn read_source(path: &Path) -> Result<String, ProgramError> {
    std::fs::read_to_string(path).map_err(|source| ProgramError::Io {
        path: path.to_path_buf(),
        source,
    })
}
