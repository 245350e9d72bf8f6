use std::collections::{BTreeMap, HashMap};

use super::reflect::{ScalarType, ValueType};

/// A value that can be uploaded to a named uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Uint(u32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Column-major.
    Mat2([[f32; 2]; 2]),
    /// Column-major.
    Mat3([[f32; 3]; 3]),
    /// Column-major.
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    pub fn value_type(&self) -> ValueType {
        use ScalarType::{F32, I32, U32};
        match self {
            UniformValue::Float(_) => ValueType::Scalar(F32),
            UniformValue::Int(_) => ValueType::Scalar(I32),
            UniformValue::Uint(_) => ValueType::Scalar(U32),
            UniformValue::Vec2(_) => ValueType::Vector(F32, 2),
            UniformValue::Vec3(_) => ValueType::Vector(F32, 3),
            UniformValue::Vec4(_) => ValueType::Vector(F32, 4),
            UniformValue::Mat2(_) => mat(2),
            UniformValue::Mat3(_) => mat(3),
            UniformValue::Mat4(_) => mat(4),
        }
    }

    /// Bytes in WGSL uniform layout (mat3 columns padded to 16 bytes).
    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        match self {
            UniformValue::Float(v) => bytes(std::slice::from_ref(v)),
            UniformValue::Int(v) => bytes(std::slice::from_ref(v)),
            UniformValue::Uint(v) => bytes(std::slice::from_ref(v)),
            UniformValue::Vec2(v) => bytes(v),
            UniformValue::Vec3(v) => bytes(v),
            UniformValue::Vec4(v) => bytes(v),
            UniformValue::Mat2(m) => bytes(m),
            UniformValue::Mat3(m) => {
                let padded = m.map(|[x, y, z]| [x, y, z, 0.0]);
                bytes(&padded)
            }
            UniformValue::Mat4(m) => bytes(m),
        }
    }
}

fn bytes<T: bytemuck::Pod>(values: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

fn mat(n: u32) -> ValueType {
    ValueType::Matrix {
        columns: n,
        rows: n,
        scalar: ScalarType::F32,
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for UniformValue {
            fn from(value: $ty) -> Self {
                UniformValue::$variant(value)
            }
        })*
    };
}

impl_from! {
    f32 => Float,
    i32 => Int,
    u32 => Uint,
    [f32; 2] => Vec2,
    [f32; 3] => Vec3,
    [f32; 4] => Vec4,
    [[f32; 2]; 2] => Mat2,
    [[f32; 3]; 3] => Mat3,
    [[f32; 4]; 4] => Mat4,
}

/// What a uniform name resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UniformTarget {
    /// A leaf inside the uniform buffer at `binding`.
    Value {
        binding: u32,
        offset: u32,
        ty: ValueType,
    },
    /// Texture/sampler bindings that read from one texture unit.
    Unit { bindings: Vec<u32> },
}

/// Outcome of [`Uniforms::set`].
///
/// None of these are errors for the caller: names a program does not use
/// are ignored, as GL ignores location -1.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UniformUpdate {
    Written,
    /// A texture or sampler was moved to this unit.
    TextureUnit(u32),
    NotFound,
    TypeMismatch {
        expected: ValueType,
        found: ValueType,
    },
    NegativeUnit(i32),
    /// The value would run past the end of its uniform buffer.
    OutOfRange {
        binding: u32,
        offset: u32,
    },
}

/// CPU-side uniform values and texture-unit assignments of one program.
///
/// Buffers start zeroed and every texture/sampler starts on unit 0. The GPU
/// copy is taken at draw time.
#[derive(Debug, Clone)]
pub struct Uniforms {
    targets: HashMap<String, UniformTarget>,
    blocks: BTreeMap<u32, Vec<u8>>,
    units: BTreeMap<u32, u32>,
}

impl Uniforms {
    pub(crate) fn new(
        targets: HashMap<String, UniformTarget>,
        block_sizes: impl IntoIterator<Item = (u32, u32)>,
        unit_bindings: impl IntoIterator<Item = u32>,
    ) -> Self {
        let blocks = block_sizes
            .into_iter()
            .map(|(binding, size)| (binding, vec![0u8; size.next_multiple_of(16) as usize]))
            .collect();
        let units = unit_bindings.into_iter().map(|binding| (binding, 0)).collect();

        Self {
            targets,
            blocks,
            units,
        }
    }

    /// Sets `name` to `value`.
    ///
    /// `name` may be a plain uniform, a `block.member` path or an unambiguous
    /// bare member name. Array elements are addressed as `name[i]`. An `i32` set on a texture or sampler name assigns it
    /// to that texture unit.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> UniformUpdate {
        let value = value.into();
        let Some(target) = self.targets.get(name) else {
            log::trace!("uniform `{name}` is not used by the program; ignored");
            return UniformUpdate::NotFound;
        };

        match (target, value) {
            (UniformTarget::Unit { bindings }, UniformValue::Int(unit)) => {
                let Ok(unit) = u32::try_from(unit) else {
                    log::warn!("uniform `{name}`: texture unit {unit} is negative; ignored");
                    return UniformUpdate::NegativeUnit(unit);
                };
                for binding in bindings {
                    self.units.insert(*binding, unit);
                }
                UniformUpdate::TextureUnit(unit)
            }
            (UniformTarget::Unit { .. }, value) => {
                let found = value.value_type();
                log::warn!("uniform `{name}` selects a texture unit and takes i32, got {found}");
                UniformUpdate::TypeMismatch {
                    expected: ValueType::Scalar(ScalarType::I32),
                    found,
                }
            }
            (&UniformTarget::Value { binding, offset, ty }, value) => {
                let found = value.value_type();
                if found != ty {
                    log::warn!("uniform `{name}` is {ty}, got {found}; ignored");
                    return UniformUpdate::TypeMismatch { expected: ty, found };
                }
                let bytes = value.to_bytes();
                let start = offset as usize;
                let slot = self
                    .blocks
                    .get_mut(&binding)
                    .and_then(|block| block.get_mut(start..start + bytes.len()));
                match slot {
                    Some(slot) => {
                        slot.copy_from_slice(&bytes);
                        UniformUpdate::Written
                    }
                    None => {
                        log::warn!("uniform `{name}` does not fit its buffer; ignored");
                        UniformUpdate::OutOfRange { binding, offset }
                    }
                }
            }
        }
    }

    /// Current bytes of the uniform buffer at `binding`.
    pub fn block(&self, binding: u32) -> Option<&[u8]> {
        self.blocks.get(&binding).map(Vec::as_slice)
    }

    /// Texture unit the texture or sampler at `binding` reads from.
    pub fn unit(&self, binding: u32) -> Option<u32> {
        self.units.get(&binding).copied()
    }

    /// Whether `name` resolves to anything in this program.
    pub fn contains(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mat3_columns_are_padded() {
        let m = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let bytes = UniformValue::Mat3(m).to_bytes();
        assert_eq!(bytes.len(), 48);
        let floats: Vec<f32> = bytemuck::pod_collect_to_vec(&bytes);
        assert_eq!(&floats[..5], &[1.0, 2.0, 3.0, 0.0, 4.0]);
    }

    #[test]
    fn value_types_follow_the_rust_type() {
        assert_eq!(UniformValue::from(1.0f32).value_type(), ValueType::Scalar(ScalarType::F32));
        assert_eq!(UniformValue::from(1i32).value_type(), ValueType::Scalar(ScalarType::I32));
        assert_eq!(
            UniformValue::from([0.0f32; 3]).value_type(),
            ValueType::Vector(ScalarType::F32, 3)
        );
        assert_eq!(UniformValue::from([[0.0f32; 4]; 4]).value_type(), mat(4));
    }

    #[test]
    fn blocks_are_zeroed_and_padded() {
        let uniforms = Uniforms::new(HashMap::new(), [(2, 4)], []);
        assert_eq!(uniforms.block(2), Some(&[0u8; 16][..]));
        assert_eq!(uniforms.block(0), None);
    }

    #[test]
    fn value_past_the_buffer_end_is_out_of_range() {
        let ty = ValueType::Vector(ScalarType::F32, 4);
        let targets = HashMap::from([
            ("tail".to_owned(), UniformTarget::Value { binding: 0, offset: 8, ty }),
            ("orphan".to_owned(), UniformTarget::Value { binding: 5, offset: 0, ty }),
        ]);
        let mut uniforms = Uniforms::new(targets, [(0, 16)], []);

        assert_eq!(
            uniforms.set("tail", [1.0f32; 4]),
            UniformUpdate::OutOfRange { binding: 0, offset: 8 }
        );
        assert_eq!(
            uniforms.set("orphan", [1.0f32; 4]),
            UniformUpdate::OutOfRange { binding: 5, offset: 0 }
        );
        assert_eq!(uniforms.set("missing", [1.0f32; 4]), UniformUpdate::NotFound);
        assert_eq!(uniforms.block(0), Some(&[0u8; 16][..]));
    }
}
