use std::{
    fs::File,
    io::{BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sonoviz::{
    AudioFeatureTrack, Canvas, Evaluator, Fps, FrameIndex, Scene, SceneObject, SonovizResult,
    configure::{
        BlurConfig, ProgressionBarConfig, ResizeConfig, ShakeConfig, SwingRotationConfig,
        VisualizerConfig,
    },
    vectorial::BarPosition,
};

#[derive(Parser, Debug)]
#[command(name = "sonoviz", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesize a deterministic test feature track to JSON.
    Features(FeaturesArgs),
    /// Resolve the demo music scene frame-by-frame to JSON lines.
    Resolve(ResolveArgs),
}

#[derive(Parser, Debug)]
struct FeaturesArgs {
    /// Output JSON path.
    #[arg(long)]
    out: PathBuf,

    /// Number of frames to synthesize.
    #[arg(long, default_value_t = 300)]
    frames: u64,

    /// Frames per second (integer).
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Number of FFT bands per frame.
    #[arg(long, default_value_t = 64)]
    bands: usize,
}

#[derive(Parser, Debug)]
struct ResolveArgs {
    /// Feature track JSON (from `sonoviz features`); synthesized when absent.
    #[arg(long)]
    features: Option<PathBuf>,

    /// Number of frames when synthesizing features.
    #[arg(long, default_value_t = 300)]
    frames: u64,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Seed for the shake modifiers.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Output path for resolved-frame JSON lines; stdout when absent.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Features(args) => cmd_features(args),
        Command::Resolve(args) => cmd_resolve(args),
    }
}

fn cmd_features(args: FeaturesArgs) -> anyhow::Result<()> {
    let fps = Fps::new(args.fps, 1)?;
    let track = AudioFeatureTrack::synthetic(fps, args.frames, args.bands);
    let f = File::create(&args.out)
        .with_context(|| format!("create feature track '{}'", args.out.display()))?;
    serde_json::to_writer(BufWriter::new(f), &track).context("write feature track JSON")?;
    tracing::info!(frames = args.frames, out = %args.out.display(), "feature track written");
    Ok(())
}

fn cmd_resolve(args: ResolveArgs) -> anyhow::Result<()> {
    let fps = Fps::new(args.fps, 1)?;
    let track = match &args.features {
        Some(path) => read_features(path)?,
        None => AudioFeatureTrack::synthetic(fps, args.frames, 64),
    };

    let frames = track.len_frames();
    let mut scene = music_scene(
        Canvas {
            width: args.width,
            height: args.height,
        },
        fps,
        FrameIndex(frames),
        args.seed,
    )?;

    let mut out: Box<dyn std::io::Write> = match &args.out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("create output '{}'", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };

    let mut eval = Evaluator::new();
    for n in 0..frames {
        let resolved = eval.resolve_frame(&mut scene, &track, FrameIndex(n))?;
        serde_json::to_writer(&mut out, &resolved).context("write resolved frame")?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    tracing::info!(frames, "scene resolved");
    Ok(())
}

fn read_features(path: &Path) -> anyhow::Result<AudioFeatureTrack> {
    let f = File::open(path).with_context(|| format!("open feature track '{}'", path.display()))?;
    let track = serde_json::from_reader(BufReader::new(f)).context("parse feature track JSON")?;
    Ok(track)
}

/// The stock music-mode scene: shaking blurred background, a swinging logo,
/// frequency bars, a progression bar, and a vignette overlay.
fn music_scene(
    canvas: Canvas,
    fps: Fps,
    duration: FrameIndex,
    seed: u64,
) -> SonovizResult<Scene> {
    let mut scene = Scene::new(fps, canvas, duration)?;
    let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
    let shake = 20.0;

    let mut background = SceneObject::image("background");
    {
        let mut c = background.configure();
        c.init_animation_layer();
        // Over-shoot the position by the shake distance so the border never shows.
        c.add_path_point(-shake, -shake);
        c.simple_add_path_modifier_shake(ShakeConfig {
            shake_max_distance: shake,
            x_smoothness: 0.01,
            y_smoothness: 0.02,
            seed,
        })?;
        c.add_module_resize(ResizeConfig::new(0.08, shake * 1.5))?;
        c.add_module_blur(BlurConfig {
            smooth: 0.1,
            scalar: 20.0,
        })?;
    }
    scene.add(background, 0);

    let mut logo = SceneObject::image("logo");
    {
        let logo_size = h * 0.25;
        let mut c = logo.configure();
        c.init_animation_layer();
        c.add_path_point((w - logo_size) / 2.0, (h - logo_size) / 2.0);
        c.add_module_resize(ResizeConfig::new(0.08, logo_size * 0.56))?;
        c.add_module_swing_rotation(SwingRotationConfig {
            max_angle: 6.0_f64.to_radians(),
            smooth: 100.0,
            phase: 0.0,
        })?;
    }
    scene.add(logo, 2);

    let mut bars = SceneObject::generator("music-bars");
    {
        let mut c = bars.configure();
        c.init_animation_layer();
        c.add_path_point(0.0, h / 2.0);
        c.add_module_visualizer(VisualizerConfig {
            minimum_bar_size: h * 0.02,
            maximum_bar_size: h * 0.4,
            bar_responsiveness: 0.25,
            bar_magnitude_multiplier: h * 0.12,
            fft_20hz_multiplier: 0.8,
            fft_20khz_multiplier: 12.0,
        })?;
    }
    scene.add(bars, 1);

    let mut progression = SceneObject::generator("progression-bar");
    {
        let mut c = progression.configure();
        c.init_animation_layer();
        c.add_module_progression_bar(ProgressionBarConfig {
            position: BarPosition::Bottom,
            shake_scalar: 14.0,
            thickness: 9.0,
        })?;
    }
    scene.add(progression, 3);

    let mut vignette = SceneObject::generator("vignetting");
    {
        let mut c = vignette.configure();
        c.init_animation_layer();
        c.simple_add_vignetting("medium")?;
    }
    scene.add(vignette, 4);

    Ok(scene)
}
