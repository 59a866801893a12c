pub mod evaluator;
pub mod interpolation;
pub mod sampler;

pub use evaluator::{AnimationEvaluator, DecodedAnimation, Property, SamplerData};
pub use sampler::KeyframeSearch;
