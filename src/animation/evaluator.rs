use glam::{Quat, Vec3, Vec4};

use super::{
    interpolation::hermite,
    sampler::{bracket, KeyframeSearch},
};
use crate::{
    asset::{
        accessor::AccessorReader,
        schema::{self, Interpolation, TargetPath},
        Asset,
    },
    error::EvaluationError,
    scene_graph::SceneGraph,
};

/// A sampled value, tagged by the node property it drives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Property {
    Translation(Vec3),
    Rotation(Quat),
    Scale(Vec3),
}
impl Property {
    pub fn apply(self, graph: &mut SceneGraph, node: usize) {
        match self {
            Property::Translation(v) => graph.set_translation(node, v),
            Property::Rotation(q) => graph.set_rotation(node, q),
            Property::Scale(v) => graph.set_scale(node, v),
        }
    }
}

/// Keyframe data of one sampler, decoded and validated.
#[derive(Debug, Clone)]
pub struct SamplerData {
    pub times: Vec<f32>,
    /// flattened output elements, `components` floats each
    pub values: Vec<f32>,
    pub components: usize,
    pub interpolation: Interpolation,
}

impl SamplerData {
    fn decode(
        reader: &AccessorReader,
        animation: usize,
        index: usize,
        sampler: &schema::AnimationSampler,
    ) -> Result<Self, EvaluationError> {
        let times = reader.read_f32s(sampler.input)?;
        let (values, components) = reader.read_floats(sampler.output)?;
        if times.is_empty() {
            return Err(EvaluationError::EmptySampler { animation, sampler: index });
        }
        let per_key = match sampler.interpolation {
            Interpolation::CubicSpline => 3,
            Interpolation::Linear | Interpolation::Step => 1,
        };
        let elements = values.len() / components;
        if elements != times.len() * per_key {
            return Err(EvaluationError::KeyframeCountMismatch {
                animation,
                sampler: index,
                times: times.len(),
                values: elements,
                expected: times.len() * per_key,
            });
        }
        Ok(Self { times, values, components, interpolation: sampler.interpolation })
    }

    fn element(&self, i: usize) -> Vec4 {
        let c = self.components;
        let mut out = [0.0; 4];
        out[..c.min(4)].copy_from_slice(&self.values[i * c..i * c + c.min(4)]);
        Vec4::from_array(out)
    }

    /// in-tangent, value, out-tangent of keyframe `key`
    fn cubic_triple(&self, key: usize) -> (Vec4, Vec4, Vec4) {
        (self.element(3 * key), self.element(3 * key + 1), self.element(3 * key + 2))
    }

    fn value(&self, key: usize) -> Vec4 {
        match self.interpolation {
            Interpolation::CubicSpline => self.element(3 * key + 1),
            _ => self.element(key),
        }
    }

    pub fn duration(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Samples at `t`. Rotations come back as unit quaternions in xyzw.
    pub fn sample(&self, t: f32, search: KeyframeSearch, rotation: bool) -> Vec4 {
        if self.times.len() == 1 {
            return self.value(0);
        }
        let b = bracket(&self.times, t, search);
        // keyframe values verbatim at segment ends, zero-length segments included
        if b.local_t >= 1.0 {
            return self.value(b.after);
        }
        if b.local_t <= 0.0 {
            return self.value(b.before);
        }
        match self.interpolation {
            Interpolation::Step => self.value(b.before),
            Interpolation::Linear => {
                let (vb, va) = (self.value(b.before), self.value(b.after));
                if rotation {
                    Quat::from_vec4(vb).slerp(Quat::from_vec4(va), b.local_t).into()
                } else {
                    vb.lerp(va, b.local_t)
                }
            }
            Interpolation::CubicSpline => {
                let dt = self.times[b.after] - self.times[b.before];
                let (_, vb, out_b) = self.cubic_triple(b.before);
                let (in_a, va, _) = self.cubic_triple(b.after);
                let v = hermite(vb, out_b, in_a, va, b.local_t, dt);
                if rotation { v.normalize_or_zero() } else { v }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Channel {
    node: usize,
    path: TargetPath,
    sampler: usize,
}

/// The evaluable form of one animation.
#[derive(Debug, Clone)]
pub struct DecodedAnimation {
    channels: Vec<Channel>,
    samplers: Vec<Option<SamplerData>>,
    pub duration: f32,
}

impl DecodedAnimation {
    pub fn decode(asset: &Asset, animation: usize) -> Result<Self, EvaluationError> {
        let animations = &asset.document.animations;
        let source = animations
            .get(animation)
            .ok_or(EvaluationError::AnimationOutOfRange { animation, len: animations.len() })?;
        let reader = asset.reader();
        let node_count = asset.scene.len();

        let mut channels = Vec::with_capacity(source.channels.len());
        let mut samplers: Vec<Option<SamplerData>> = vec![None; source.samplers.len()];
        for (index, channel) in source.channels.iter().enumerate() {
            let sampler = channel.sampler;
            let sampler_def = source.samplers.get(sampler).ok_or(EvaluationError::SamplerOutOfRange {
                animation,
                channel: index,
                sampler,
                len: source.samplers.len(),
            })?;
            let Some(node) = channel.target.node else {
                tracing::warn!("animation {} channel {} has no target node, skipped", animation, index);
                continue;
            };
            if node >= node_count {
                return Err(EvaluationError::NodeOutOfRange { animation, channel: index, node, len: node_count });
            }
            let expected = match channel.target.path {
                TargetPath::Translation | TargetPath::Scale => 3,
                TargetPath::Rotation => 4,
                TargetPath::Weights => {
                    tracing::warn!("animation {} channel {} targets morph weights, skipped", animation, index);
                    continue;
                }
            };

            if samplers[sampler].is_none() {
                samplers[sampler] = Some(SamplerData::decode(&reader, animation, sampler, sampler_def)?);
            }
            let found = samplers[sampler].as_ref().map_or(0, |s| s.components);
            if found != expected {
                return Err(EvaluationError::UnexpectedComponents {
                    animation,
                    channel: index,
                    path: channel.target.path.as_str(),
                    expected,
                    found,
                });
            }
            channels.push(Channel { node, path: channel.target.path, sampler });
        }

        let duration = samplers.iter().flatten().map(SamplerData::duration).fold(0.0, f32::max);
        tracing::debug!(
            "animation {} ({}) decoded: {} channels, {:.3}s",
            animation,
            source.name.as_deref().unwrap_or("unnamed"),
            channels.len(),
            duration
        );
        Ok(Self { channels, samplers, duration })
    }

    /// Samples every channel at `t` in table order.
    pub fn sample(&self, t: f32, search: KeyframeSearch) -> impl Iterator<Item = (usize, Property)> + '_ {
        self.channels.iter().filter_map(move |channel| {
            let sampler = self.samplers[channel.sampler].as_ref()?;
            let property = match channel.path {
                TargetPath::Translation => Property::Translation(sampler.sample(t, search, false).truncate()),
                TargetPath::Scale => Property::Scale(sampler.sample(t, search, false).truncate()),
                TargetPath::Rotation => Property::Rotation(Quat::from_vec4(sampler.sample(t, search, true))),
                TargetPath::Weights => return None,
            };
            Some((channel.node, property))
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

/// Writes animation values into a scene graph. Decoded keyframe data is kept
/// per animation after first use, so accessor errors surface on the first
/// evaluation and not at load.
#[derive(Debug, Default)]
pub struct AnimationEvaluator {
    pub search: KeyframeSearch,
    decoded: Vec<Option<DecodedAnimation>>,
}

impl AnimationEvaluator {
    pub fn new(search: KeyframeSearch) -> Self {
        Self { search, decoded: vec![] }
    }

    pub fn decoded(&mut self, asset: &Asset, animation: usize) -> Result<&DecodedAnimation, EvaluationError> {
        if self.decoded.len() < asset.document.animations.len() {
            self.decoded.resize(asset.document.animations.len(), None);
        }
        let slot = self
            .decoded
            .get_mut(animation)
            .ok_or(EvaluationError::AnimationOutOfRange { animation, len: asset.document.animations.len() })?;
        if slot.is_none() {
            *slot = Some(DecodedAnimation::decode(asset, animation)?);
        }
        slot.as_ref().ok_or(EvaluationError::AnimationOutOfRange { animation, len: asset.document.animations.len() })
    }

    pub fn duration(&mut self, asset: &Asset, animation: usize) -> Result<f32, EvaluationError> {
        Ok(self.decoded(asset, animation)?.duration)
    }

    /// Applies `animation` at time `t` (seconds) to `graph`. Returns the number
    /// of channels written.
    pub fn evaluate(
        &mut self,
        asset: &Asset,
        animation: usize,
        t: f32,
        graph: &mut SceneGraph,
    ) -> Result<usize, EvaluationError> {
        let search = self.search;
        let decoded = self.decoded(asset, animation)?;
        let mut written = 0;
        for (node, property) in decoded.sample(t, search) {
            property.apply(graph, node);
            written += 1;
        }
        Ok(written)
    }
}
