use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::reflect::StageInterface;
use super::CompileError;

/// One phase of a program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    fn naga(self) -> naga::ShaderStage {
        match self {
            StageKind::Vertex => naga::ShaderStage::Vertex,
            StageKind::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StageKind::Vertex => "vertex",
            StageKind::Fragment => "fragment",
        })
    }
}

/// A compiled WGSL stage, ready to be linked.
///
/// Compilation runs entirely on the CPU: the source is parsed and validated
/// by naga and the single entry point of the requested kind is reflected.
/// The device is only involved once stages are linked into a program.
#[derive(Debug, Clone)]
pub struct ShaderStage {
    kind: StageKind,
    source: String,
    entry_point: String,
    interface: StageInterface,
}

impl ShaderStage {
    /// Compiles `source` as a `kind` stage.
    ///
    /// The module must contain exactly one entry point of that kind; other
    /// entry points are ignored.
    pub fn compile(kind: StageKind, source: &str) -> Result<Self, CompileError> {
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|err| CompileError::new(kind, err.emit_to_string(source)))?;

        let info = Validator::new(ValidationFlags::all(), Capabilities::empty())
            .validate(&module)
            .map_err(|err| CompileError::new(kind, err.emit_to_string(source)))?;

        let mut entries = module
            .entry_points
            .iter()
            .enumerate()
            .filter(|(_, ep)| ep.stage == kind.naga());

        let Some((index, entry)) = entries.next() else {
            return Err(CompileError::new(kind, format!("no @{kind} entry point")));
        };
        if let Some((_, other)) = entries.next() {
            return Err(CompileError::new(
                kind,
                format!(
                    "more than one @{kind} entry point (`{}` and `{}`)",
                    entry.name, other.name
                ),
            ));
        }

        let interface = StageInterface::reflect(&module, entry, info.get_entry_point(index));
        log::debug!(
            "compiled {kind} stage `{}`: {} inputs, {} outputs, {} resources",
            entry.name,
            interface.inputs.len(),
            interface.outputs.len(),
            interface.resources.len()
        );

        Ok(Self {
            kind,
            source: source.to_owned(),
            entry_point: entry.name.clone(),
            interface,
        })
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub(crate) fn interface(&self) -> &StageInterface {
        &self.interface
    }
}
