//! Per-tick driver: a frame timeline fed by a clock, and scene instances that
//! evaluate animations, refresh world matrices and then joint palettes.

use std::{cell::Cell, sync::Arc, time::Instant};

use serde::Deserialize;

use crate::{
    animation::{AnimationEvaluator, KeyframeSearch},
    asset::Asset,
    config::PlaybackConfig,
    error::EvaluationError,
    scene_graph::SceneGraph,
    skinning::{JointPalette, SkinningEngine},
};

/// Monotonic seconds.
pub trait Clock {
    fn now(&self) -> f64;
}

pub struct SystemClock {
    start: Instant,
}
impl Default for SystemClock {
    fn default() -> Self {
        Self { start: Instant::now() }
    }
}
impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

#[derive(Default)]
pub struct ManualClock {
    now: Cell<f64>,
}
impl ManualClock {
    pub fn set(&self, seconds: f64) {
        self.now.set(seconds);
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}
impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeWrapMode {
    Clamp,
    #[default]
    Repeat,
    PingPong,
}
impl TimeWrapMode {
    /// Maps a player time onto `[0, duration]`. A positive time landing
    /// exactly on a multiple of the duration maps to the end, not the start.
    pub fn apply(self, time: f32, duration: f32) -> f32 {
        if duration <= f32::EPSILON {
            return 0.0;
        }
        match self {
            TimeWrapMode::Clamp => time.clamp(0.0, duration),
            TimeWrapMode::Repeat => {
                let t = time.rem_euclid(duration);
                if t == 0.0 && time > 0.0 { duration } else { t }
            }
            TimeWrapMode::PingPong => {
                let period = duration * 2.0;
                let t2 = time.rem_euclid(period);
                if t2 <= duration { t2 } else { period - t2 }
            }
        }
    }
}

/// Frame counter advanced from wall-clock time.
#[derive(Debug, Clone)]
pub struct Timeline {
    pub fps: u32,
    pub num_frames: u32,
    pub current_frame: u32,
    pub playing: bool,
    pub max_frames_per_tick: u32,
    pub looping: bool,
    last_frame_change: f64,
}

impl Timeline {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            fps: config.fps.max(1),
            num_frames: config.num_frames,
            current_frame: 0,
            playing: false,
            max_frames_per_tick: config.max_frames_per_tick.max(1),
            looping: config.looping,
            last_frame_change: 0.0,
        }
    }

    /// seconds per frame
    pub fn spf(&self) -> f64 {
        1.0 / self.fps as f64
    }

    pub fn set_fps(&mut self, fps: u32) {
        if fps > 0 {
            self.fps = fps;
        }
    }

    pub fn play(&mut self, now: f64) {
        self.playing = true;
        self.last_frame_change = now;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn rewind(&mut self) {
        self.current_frame = 0;
    }

    pub fn step_back(&mut self) {
        self.current_frame = self.current_frame.saturating_sub(1);
    }

    pub fn step_forward(&mut self) {
        self.current_frame = (self.current_frame + 1).min(self.num_frames);
    }

    pub fn seek_end(&mut self) {
        self.current_frame = self.num_frames;
        self.playing = false;
    }

    /// Advances by the whole frames elapsed since the last change. Late ticks
    /// skip frames, at most `max_frames_per_tick` at once. Past the last frame
    /// a looping timeline restarts at 0, any other stops on the last frame.
    /// Returns the number of frames advanced.
    pub fn advance(&mut self, now: f64) -> u32 {
        if !self.playing {
            return 0;
        }
        let spf = self.spf();
        let dt = now - self.last_frame_change;
        if dt < spf {
            return 0;
        }
        let frames = ((dt / spf).round() as u32).clamp(1, self.max_frames_per_tick);
        self.current_frame += frames;
        if self.current_frame > self.num_frames {
            if self.looping {
                self.current_frame = 0;
            } else {
                self.current_frame = self.num_frames;
                self.stop();
            }
        }
        self.last_frame_change = now;
        frames
    }

    pub fn current_time(&self) -> f32 {
        (self.current_frame as f64 * self.spf()) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveAnimation {
    pub animation: usize,
    pub wrap: TimeWrapMode,
    pub speed: f32,
    /// player time the animation started at
    pub start_time: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub channels_written: usize,
    pub nodes_updated: usize,
    pub palettes_refreshed: usize,
}

/// One animated copy of an asset. The asset's tables are shared, the node
/// transforms and joint palettes are private to the instance.
pub struct SceneInstance {
    pub asset: Arc<Asset>,
    pub graph: SceneGraph,
    pub palettes: Vec<JointPalette>,
    pub active: Vec<ActiveAnimation>,
    evaluator: AnimationEvaluator,
}

impl SceneInstance {
    pub fn new(asset: Arc<Asset>, search: KeyframeSearch) -> Self {
        let graph = asset.scene.clone();
        let mut palettes: Vec<JointPalette> = asset
            .skins
            .iter()
            .enumerate()
            .map(|(i, skin)| JointPalette::new(i, skin.joints.len()))
            .collect();
        for palette in &mut palettes {
            let skin = &asset.skins[palette.skin];
            SkinningEngine::refresh(palette, skin, &graph);
        }
        Self { asset, graph, palettes, active: vec![], evaluator: AnimationEvaluator::new(search) }
    }

    /// Starts `animation` at player time `start_time`. Its keyframe data is
    /// decoded and validated here.
    pub fn play(&mut self, animation: usize, wrap: TimeWrapMode, speed: f32, start_time: f32) -> Result<(), EvaluationError> {
        self.evaluator.decoded(&self.asset, animation)?;
        self.active.retain(|a| a.animation != animation);
        self.active.push(ActiveAnimation { animation, wrap, speed, start_time });
        self.active.sort_by_key(|a| a.animation);
        Ok(())
    }

    pub fn stop(&mut self, animation: usize) {
        self.active.retain(|a| a.animation != animation);
    }

    pub fn duration(&mut self, animation: usize) -> Result<f32, EvaluationError> {
        self.evaluator.duration(&self.asset, animation)
    }

    /// Writes every active animation at player time `t` in animation table
    /// order, the last write to a property wins. Then world matrices and
    /// palettes of skins whose joints moved are refreshed.
    pub fn tick(&mut self, t: f32) -> Result<TickReport, EvaluationError> {
        let mut report = TickReport::default();
        for active in &self.active {
            let duration = self.evaluator.duration(&self.asset, active.animation)?;
            let local = active.wrap.apply((t - active.start_time) * active.speed, duration);
            report.channels_written += self.evaluator.evaluate(&self.asset, active.animation, local, &mut self.graph)?;
        }

        report.nodes_updated = self.graph.update_world_matrices();

        for palette in &mut self.palettes {
            let skin = &self.asset.skins[palette.skin];
            if SkinningEngine::refresh(palette, skin, &self.graph) {
                report.palettes_refreshed += 1;
            }
        }
        Ok(report)
    }

    /// Returns every node to its load-time transform.
    pub fn reset_to_bind_pose(&mut self) {
        self.graph.reset_all_to_bind_pose();
        self.graph.update_world_matrices();
        for palette in &mut self.palettes {
            let skin = &self.asset.skins[palette.skin];
            SkinningEngine::refresh(palette, skin, &self.graph);
        }
    }
}
