use std::collections::{BTreeMap, HashMap};

use wgpu::{TextureFormat, TextureSampleType};

use super::reflect::{Resource, ResourceKind, ScalarType, StageInterface, ValueType, Varying};
use super::uniform::{UniformTarget, Uniforms};
use super::{LinkError, ShaderStage, StageKind};
use crate::geometry::AttributeLayout;
use crate::render::DrawError;

/// The linked interface of a vertex + fragment pair.
///
/// Linking is pure CPU work over the reflected stages; the device only sees
/// a program once this succeeds.
#[derive(Debug, Clone)]
pub struct ProgramInterface {
    vertex_entry: String,
    fragment_entry: String,
    vertex_inputs: Vec<Varying>,
    fragment_outputs: Vec<Varying>,
    resources: Vec<Resource>,
    targets: HashMap<String, UniformTarget>,
}

impl ProgramInterface {
    /// Links compiled stages.
    ///
    /// Every problem found is reported, one per line of the error log.
    pub fn link(stages: &[ShaderStage]) -> Result<Self, LinkError> {
        let mut problems = Vec::new();

        let vertex = find_stage(stages, StageKind::Vertex, &mut problems);
        let fragment = find_stage(stages, StageKind::Fragment, &mut problems);
        let (Some(vertex), Some(fragment)) = (vertex, fragment) else {
            return Err(LinkError {
                log: problems.join("\n"),
            });
        };

        check_varyings(vertex.interface(), fragment.interface(), &mut problems);
        let resources = merge_resources(&[vertex, fragment], &mut problems);

        if !problems.is_empty() {
            return Err(LinkError {
                log: problems.join("\n"),
            });
        }

        let targets = uniform_targets(&resources);
        Ok(Self {
            vertex_entry: vertex.entry_point().to_owned(),
            fragment_entry: fragment.entry_point().to_owned(),
            vertex_inputs: vertex.interface().inputs.clone(),
            fragment_outputs: fragment.interface().outputs.clone(),
            resources,
            targets,
        })
    }

    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }

    /// Located inputs of the vertex stage (attribute slots it reads).
    pub fn vertex_inputs(&self) -> &[Varying] {
        &self.vertex_inputs
    }

    /// Located outputs of the fragment stage.
    pub fn fragment_outputs(&self) -> &[Varying] {
        &self.fragment_outputs
    }

    /// Bound resources of both stages, ordered by binding.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Every name `set_uniform` resolves, sorted.
    pub fn uniform_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Fresh uniform state: zeroed buffers, every texture on unit 0.
    pub fn new_uniforms(&self) -> Uniforms {
        let blocks = self.resources.iter().filter_map(|r| match r.kind {
            ResourceKind::Uniform { size, .. } => Some((r.binding, size)),
            _ => None,
        });
        let units = self
            .resources
            .iter()
            .filter(|r| matches!(r.kind, ResourceKind::Texture | ResourceKind::Sampler))
            .map(|r| r.binding);
        Uniforms::new(self.targets.clone(), blocks, units)
    }

    /// Checks that `layout` can feed every vertex input.
    ///
    /// Only presence and scalar kind are checked: wgpu rejects a pipeline
    /// with an unfed or non-float input outright. Component counts, offsets
    /// and extra attributes are the caller's contract and are not validated.
    pub fn check_vertex_layout(&self, layout: &AttributeLayout) -> Result<(), DrawError> {
        for input in &self.vertex_inputs {
            if !layout.feeds(input.location) {
                return Err(DrawError::UnfedVertexInput {
                    location: input.location,
                });
            }
            if input.ty.scalar() != Some(ScalarType::F32) {
                return Err(DrawError::NonFloatVertexInput {
                    location: input.location,
                    ty: input.ty,
                });
            }
        }
        Ok(())
    }

    /// Checks that the `@location(0)` output can be written to `format`.
    ///
    /// The output must have the format's scalar kind and at least as many
    /// components. Outputs at other locations have no target and are dropped.
    pub fn check_target(&self, format: TextureFormat) -> Result<(), DrawError> {
        let Some(output) = self.fragment_outputs.iter().find(|o| o.location == 0) else {
            return Ok(());
        };
        let components = match output.ty {
            ValueType::Scalar(_) => 1,
            ValueType::Vector(_, n) => n,
            _ => 0,
        };
        let scalar = match format.sample_type(None, None) {
            Some(TextureSampleType::Float { .. }) => Some(ScalarType::F32),
            Some(TextureSampleType::Uint) => Some(ScalarType::U32),
            Some(TextureSampleType::Sint) => Some(ScalarType::I32),
            Some(TextureSampleType::Depth) | None => None,
        };
        if scalar.is_some()
            && output.ty.scalar() == scalar
            && components >= u32::from(format.components())
        {
            Ok(())
        } else {
            Err(DrawError::IncompatibleTarget {
                format,
                output: output.ty,
            })
        }
    }
}

fn find_stage<'s>(
    stages: &'s [ShaderStage],
    kind: StageKind,
    problems: &mut Vec<String>,
) -> Option<&'s ShaderStage> {
    let mut found = stages.iter().filter(|s| s.kind() == kind);
    let first = found.next();
    if first.is_none() {
        problems.push(format!("no {kind} stage attached"));
    }
    if found.next().is_some() {
        problems.push(format!("more than one {kind} stage attached"));
    }
    first
}

fn check_varyings(vs: &StageInterface, fs: &StageInterface, problems: &mut Vec<String>) {
    for input in &fs.inputs {
        let name = input.name.as_deref().unwrap_or("<unnamed>");
        match vs.outputs.iter().find(|o| o.location == input.location) {
            None => problems.push(format!(
                "fragment input `{name}` at @location({}) is not written by the vertex stage",
                input.location
            )),
            Some(output) if output.ty != input.ty => problems.push(format!(
                "@location({}): vertex stage writes {} but fragment input `{name}` is {}",
                input.location, output.ty, input.ty
            )),
            Some(output) if output.interpolation != input.interpolation => problems.push(format!(
                "@location({}): vertex stage writes {} interpolation but fragment input `{name}` expects {}",
                input.location,
                qualifier(output.interpolation),
                qualifier(input.interpolation)
            )),
            Some(output) if output.sampling != input.sampling => problems.push(format!(
                "@location({}): vertex stage writes {} sampling but fragment input `{name}` expects {}",
                input.location,
                qualifier(output.sampling),
                qualifier(input.sampling)
            )),
            Some(_) => {}
        }
    }
}

fn qualifier<T: std::fmt::Debug>(q: Option<T>) -> String {
    q.map_or_else(|| "no".to_owned(), |q| format!("{q:?}").to_lowercase())
}

fn merge_resources(stages: &[&ShaderStage], problems: &mut Vec<String>) -> Vec<Resource> {
    let mut by_binding: BTreeMap<u32, Resource> = BTreeMap::new();
    let mut binding_of: HashMap<String, u32> = HashMap::new();

    for res in stages.iter().flat_map(|s| &s.interface().resources) {
        if res.group != 0 {
            problems.push(format!(
                "`{}` is in @group({}); only group 0 is supported",
                res.name, res.group
            ));
            continue;
        }
        if let ResourceKind::Unsupported(what) = &res.kind {
            problems.push(format!("`{}` is a {what}, which cannot be bound", res.name));
            continue;
        }
        if let Some(&binding) = binding_of.get(&res.name) {
            if binding != res.binding {
                problems.push(format!(
                    "`{}` is declared at @binding({binding}) and @binding({})",
                    res.name, res.binding
                ));
                continue;
            }
        }
        match by_binding.get(&res.binding) {
            Some(existing) if existing.name != res.name => problems.push(format!(
                "@binding({}) is declared as both `{}` and `{}`",
                res.binding, existing.name, res.name
            )),
            Some(existing) if existing.kind != res.kind => problems.push(format!(
                "`{}` is a {} in one stage and a differently laid out {} in the other",
                res.name,
                existing.kind.describe(),
                res.kind.describe()
            )),
            Some(_) => {}
            None => {
                binding_of.insert(res.name.clone(), res.binding);
                by_binding.insert(res.binding, res.clone());
            }
        }
    }

    by_binding.into_values().collect()
}

fn uniform_targets(resources: &[Resource]) -> HashMap<String, UniformTarget> {
    let mut targets = HashMap::new();
    // Bare member names; `None` once a name turns out to be ambiguous.
    let mut bare: HashMap<String, Option<UniformTarget>> = HashMap::new();

    for res in resources {
        match &res.kind {
            ResourceKind::Uniform { fields, .. } => {
                for field in fields {
                    let target = UniformTarget::Value {
                        binding: res.binding,
                        offset: field.offset,
                        ty: field.ty,
                    };
                    if let Some((_, member)) = field.path.split_once('.') {
                        bare.entry(member.to_owned())
                            .and_modify(|slot| *slot = None)
                            .or_insert_with(|| Some(target.clone()));
                    }
                    targets.insert(field.path.clone(), target);
                }
            }
            ResourceKind::Texture => {
                let sampler_name = format!("{}_sampler", res.name);
                let mut bindings = vec![res.binding];
                bindings.extend(
                    resources
                        .iter()
                        .filter(|r| r.kind == ResourceKind::Sampler && r.name == sampler_name)
                        .map(|r| r.binding),
                );
                targets.insert(res.name.clone(), UniformTarget::Unit { bindings });
            }
            ResourceKind::Sampler => {
                targets.insert(
                    res.name.clone(),
                    UniformTarget::Unit {
                        bindings: vec![res.binding],
                    },
                );
            }
            ResourceKind::Unsupported(_) => {}
        }
    }

    for (name, target) in bare {
        if let Some(target) = target {
            targets.entry(name).or_insert(target);
        }
    }
    targets
}
