use serde::Serialize;

use scene_anim::render_snapshot::RenderSnapshot;

#[derive(Serialize, Debug)]
pub struct AnimationInfo {
    pub index: usize,
    pub name: Option<String>,
    pub duration: f32,
}

#[derive(Serialize, Debug)]
pub struct Output {
    pub source: String,
    pub animation: Option<AnimationInfo>,
    pub samples: Vec<RenderSnapshot>,
}
