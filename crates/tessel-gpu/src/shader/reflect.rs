//! Stage interface reflection over naga IR.
//!
//! Only what linking and drawing need is extracted: located inputs/outputs of
//! the entry point and the resources (uniform buffers, textures, samplers) the
//! entry point actually uses. Unused globals are invisible, like inactive
//! uniforms in GL.

use std::fmt;

use naga::{
    AddressSpace, ArraySize, Binding, Handle, ImageClass, ImageDimension, Interpolation, Module,
    Sampling, ScalarKind, Type, TypeInner,
};

/// Scalar component type of a reflected value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ScalarType {
    F32,
    F16,
    I32,
    U32,
    Bool,
    Other,
}

impl ScalarType {
    fn of(scalar: naga::Scalar) -> Self {
        match (scalar.kind, scalar.width) {
            (ScalarKind::Float, 4) => ScalarType::F32,
            (ScalarKind::Float, 2) => ScalarType::F16,
            (ScalarKind::Sint, 4) => ScalarType::I32,
            (ScalarKind::Uint, 4) => ScalarType::U32,
            (ScalarKind::Bool, _) => ScalarType::Bool,
            _ => ScalarType::Other,
        }
    }

    fn wgsl(self) -> &'static str {
        match self {
            ScalarType::F32 => "f32",
            ScalarType::F16 => "f16",
            ScalarType::I32 => "i32",
            ScalarType::U32 => "u32",
            ScalarType::Bool => "bool",
            ScalarType::Other => "?",
        }
    }
}

/// Shape of a varying or uniform value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ValueType {
    Scalar(ScalarType),
    Vector(ScalarType, u32),
    Matrix {
        columns: u32,
        rows: u32,
        scalar: ScalarType,
    },
    /// Structs, arrays and anything else without a direct setter. Array
    /// elements are reflected one by one instead.
    Other,
}

impl ValueType {
    pub(crate) fn of(inner: &TypeInner) -> Self {
        match *inner {
            TypeInner::Scalar(scalar) => ValueType::Scalar(ScalarType::of(scalar)),
            TypeInner::Vector { size, scalar } => {
                ValueType::Vector(ScalarType::of(scalar), size as u32)
            }
            TypeInner::Matrix {
                columns,
                rows,
                scalar,
            } => ValueType::Matrix {
                columns: columns as u32,
                rows: rows as u32,
                scalar: ScalarType::of(scalar),
            },
            _ => ValueType::Other,
        }
    }

    /// Scalar type for scalars and vectors.
    pub fn scalar(self) -> Option<ScalarType> {
        match self {
            ValueType::Scalar(s) | ValueType::Vector(s, _) => Some(s),
            ValueType::Matrix { scalar, .. } => Some(scalar),
            ValueType::Other => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ValueType::Scalar(s) => f.write_str(s.wgsl()),
            ValueType::Vector(s, n) => write!(f, "vec{n}<{}>", s.wgsl()),
            ValueType::Matrix {
                columns,
                rows,
                scalar,
            } => write!(f, "mat{columns}x{rows}<{}>", scalar.wgsl()),
            ValueType::Other => f.write_str("<composite>"),
        }
    }
}

/// A `@location(n)` input or output of an entry point.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Varying {
    pub location: u32,
    pub name: Option<String>,
    pub ty: ValueType,
    /// `None` for integer varyings, which are always flat.
    pub interpolation: Option<Interpolation>,
    pub sampling: Option<Sampling>,
}

/// One scalar/vector/matrix leaf inside a uniform buffer.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformField {
    /// `name` for a plain uniform, `block.member[.member]` inside structs,
    /// `name[i]` per array element.
    pub path: String,
    pub offset: u32,
    pub ty: ValueType,
}

/// What a bound global is.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ResourceKind {
    /// `var<uniform>`; `size` is the byte size of the bound type.
    Uniform { size: u32, fields: Vec<UniformField> },
    /// `texture_2d<f32>`.
    Texture,
    /// Filtering `sampler`.
    Sampler,
    /// Anything this crate cannot bind; carries a description for diagnostics.
    Unsupported(String),
}

impl ResourceKind {
    pub(crate) fn describe(&self) -> &str {
        match self {
            ResourceKind::Uniform { .. } => "uniform buffer",
            ResourceKind::Texture => "texture_2d<f32>",
            ResourceKind::Sampler => "sampler",
            ResourceKind::Unsupported(what) => what,
        }
    }
}

/// A global bound with `@group(g) @binding(b)`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Resource {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub kind: ResourceKind,
}

/// Everything the linker needs to know about one compiled stage.
#[derive(Debug, Clone, Default)]
pub(crate) struct StageInterface {
    pub inputs: Vec<Varying>,
    pub outputs: Vec<Varying>,
    pub resources: Vec<Resource>,
}

impl StageInterface {
    pub(crate) fn reflect(
        module: &Module,
        entry: &naga::EntryPoint,
        usage: &naga::valid::FunctionInfo,
    ) -> Self {
        let mut interface = StageInterface::default();

        for arg in &entry.function.arguments {
            collect_located(
                module,
                arg.ty,
                arg.binding.as_ref(),
                arg.name.as_deref(),
                &mut interface.inputs,
            );
        }
        if let Some(result) = &entry.function.result {
            collect_located(
                module,
                result.ty,
                result.binding.as_ref(),
                None,
                &mut interface.outputs,
            );
        }

        for (handle, var) in module.global_variables.iter() {
            if usage[handle].is_empty() {
                continue;
            }
            let Some(binding) = var.binding.as_ref() else {
                continue;
            };
            let name = var
                .name
                .clone()
                .unwrap_or_else(|| format!("<binding {}>", binding.binding));
            let kind = match var.space {
                AddressSpace::Uniform => reflect_uniform(module, &name, var.ty),
                AddressSpace::Handle => reflect_handle(&module.types[var.ty].inner),
                AddressSpace::Function | AddressSpace::Private | AddressSpace::WorkGroup => {
                    continue;
                }
                other => ResourceKind::Unsupported(format!("{other:?} buffer")),
            };
            interface.resources.push(Resource {
                name,
                group: binding.group,
                binding: binding.binding,
                kind,
            });
        }

        interface
    }
}

fn collect_located(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    name: Option<&str>,
    out: &mut Vec<Varying>,
) {
    match binding {
        Some(Binding::Location {
            location,
            interpolation,
            sampling,
            ..
        }) => out.push(Varying {
            location: *location,
            name: name.map(str::to_owned),
            ty: ValueType::of(&module.types[ty].inner),
            interpolation: *interpolation,
            sampling: *sampling,
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { ref members, .. } = module.types[ty].inner {
                for member in members {
                    collect_located(
                        module,
                        member.ty,
                        member.binding.as_ref(),
                        member.name.as_deref(),
                        out,
                    );
                }
            }
        }
    }
}

fn reflect_uniform(module: &Module, name: &str, ty: Handle<Type>) -> ResourceKind {
    let size = module.types[ty].inner.size(module.to_ctx());
    let mut fields = Vec::new();
    collect_fields(module, ty, name.to_owned(), 0, &mut fields);
    ResourceKind::Uniform { size, fields }
}

fn collect_fields(
    module: &Module,
    ty: Handle<Type>,
    path: String,
    offset: u32,
    out: &mut Vec<UniformField>,
) {
    match module.types[ty].inner {
        TypeInner::Struct { ref members, .. } => {
            for member in members {
                let Some(member_name) = member.name.as_deref() else {
                    continue;
                };
                collect_fields(
                    module,
                    member.ty,
                    format!("{path}.{member_name}"),
                    offset + member.offset,
                    out,
                );
            }
        }
        TypeInner::Array {
            base,
            size: ArraySize::Constant(len),
            stride,
        } => {
            for i in 0..len.get() {
                collect_fields(module, base, format!("{path}[{i}]"), offset + i * stride, out);
            }
        }
        ref inner => {
            let ty = ValueType::of(inner);
            if ty != ValueType::Other {
                out.push(UniformField { path, offset, ty });
            }
        }
    }
}

fn reflect_handle(inner: &TypeInner) -> ResourceKind {
    match *inner {
        TypeInner::Image {
            dim: ImageDimension::D2,
            arrayed: false,
            class:
                ImageClass::Sampled {
                    kind: ScalarKind::Float,
                    multi: false,
                },
        } => ResourceKind::Texture,
        TypeInner::Sampler { comparison: false } => ResourceKind::Sampler,
        TypeInner::Sampler { comparison: true } => {
            ResourceKind::Unsupported("comparison sampler".to_owned())
        }
        _ => ResourceKind::Unsupported("texture type other than texture_2d<f32>".to_owned()),
    }
}
