use std::{env, io::Write};

use scene_anim::{
    config::Config,
    render_snapshot::RenderSnapshot,
    sim::{SceneInstance, Timeline},
    AssetStore,
};

mod json;

const USAGE: &str = "usage: sample_anim <scene.gltf|scene.glb> [--config file.toml] [--animation N] [--time SECONDS | --frames]";

#[derive(Debug, PartialEq)]
enum Mode {
    Time(f32),
    Frames,
}

#[derive(Debug, PartialEq)]
struct Args {
    path: String,
    config: Option<String>,
    animation: usize,
    mode: Mode,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut path = None;
    let mut config = None;
    let mut animation = 0;
    let mut mode = Mode::Time(0.0);

    let mut it = args.iter().skip(1);
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| it.next().cloned().ok_or_else(|| format!("{} needs a value\n{}", flag, USAGE));
        match arg.as_str() {
            "--config" => config = Some(value("--config")?),
            "--animation" => {
                animation = value("--animation")?.parse().map_err(|e| format!("bad --animation: {}", e))?;
            }
            "--time" => {
                mode = Mode::Time(value("--time")?.parse().map_err(|e| format!("bad --time: {}", e))?);
            }
            "--frames" => mode = Mode::Frames,
            "-h" | "--help" => return Err(USAGE.to_string()),
            other if other.starts_with("--") => return Err(format!("unknown flag {}\n{}", other, USAGE)),
            other => path = Some(other.to_string()),
        }
    }

    Ok(Args {
        path: path.ok_or_else(|| USAGE.to_string())?,
        config,
        animation,
        mode,
    })
}

pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    scene_anim::init_logging();
    let args: Vec<String> = env::args().collect();
    let args = parse_args(&args)?;

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let mut store = AssetStore::new(config.import.clone());
    let id = store.load(&args.path)?;
    let asset = store.get(id).cloned().ok_or("asset missing from store after load")?;
    let mut instance = SceneInstance::new(asset, config.import.keyframe_search);

    let animation = if args.animation < instance.asset.animation_count() {
        let playback = &config.playback;
        instance.play(args.animation, playback.wrap, playback.speed, 0.0)?;
        Some(json::AnimationInfo {
            index: args.animation,
            name: instance.asset.document.animations[args.animation].name.clone(),
            duration: instance.duration(args.animation)?,
        })
    } else {
        tracing::warn!(
            "animation {} not present ({} available), sampling the bind pose",
            args.animation,
            instance.asset.animation_count()
        );
        None
    };

    let mut samples = vec![];
    match args.mode {
        Mode::Time(t) => {
            instance.tick(t)?;
            samples.push(RenderSnapshot::build(&instance, t));
        }
        Mode::Frames => {
            let mut timeline = Timeline::new(&config.playback);
            for frame in 0..=timeline.num_frames {
                timeline.current_frame = frame;
                let t = timeline.current_time();
                instance.tick(t)?;
                samples.push(RenderSnapshot::build(&instance, t));
            }
        }
    }
    tracing::info!("sampled {} time points", samples.len());

    let output = json::Output { source: args.path.clone(), animation, samples };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &output)?;
    writeln!(out)?;
    Ok(())
}
