//! Companion Avatar - headless driver for the avatar animation engine
//!
//! Main entry point for the CLI application.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use companion_avatar::{
    avatar::{
        AnimationStateMachine, AnimationTiming, AvatarSnapshot, Clock, ManualClock,
        ReactionEvent, StudyPhase,
    },
    config::Config,
    model::{LoadedModel, ModelLoader},
    render::{AvatarRenderer, FrameLoop, FrameRenderer, RecordingSurface},
};

/// Companion Avatar - animated study companion engine
#[derive(Parser, Debug)]
#[command(name = "companion-avatar", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a model directory and print its assets as JSON
    Inspect {
        /// Model directory (defaults to the configured model)
        dir: Option<PathBuf>,
    },

    /// Run the state machine and renderer headlessly on virtual time
    Simulate {
        /// Model directory (defaults to the configured model)
        dir: Option<PathBuf>,

        /// Simulated duration in seconds
        #[arg(short, long, default_value_t = 10.0)]
        seconds: f64,

        /// Scheduled signal as SECS:EVENT, e.g. `1.5:correct_answer` or `0:focus`
        #[arg(short, long = "event", value_parser = parse_scheduled)]
        events: Vec<Scheduled>,
    },
}

/// A signal delivered to the state machine
#[derive(Debug, Clone, Copy)]
enum Signal {
    Reaction(ReactionEvent),
    Phase(StudyPhase),
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(event) = s.parse::<ReactionEvent>() {
            return Ok(Self::Reaction(event));
        }
        s.parse::<StudyPhase>()
            .map(Self::Phase)
            .map_err(|_| format!("unknown event or study phase: {}", s))
    }
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    at: Duration,
    signal: Signal,
}

fn parse_scheduled(s: &str) -> Result<Scheduled, String> {
    let (secs, signal) = s
        .split_once(':')
        .ok_or_else(|| format!("expected SECS:EVENT, got '{}'", s))?;
    let at = secs
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|v| Duration::try_from_secs_f64(v).ok())
        .ok_or_else(|| format!("invalid time: {}", secs))?;

    Ok(Scheduled {
        at,
        signal: signal.parse()?,
    })
}

#[derive(Debug, Serialize)]
struct SimulationSummary {
    model: String,
    seconds: f64,
    frames: u64,
    /// State changes only; expression-only changes are logged but not counted
    transitions: usize,
    last: AvatarSnapshot,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", companion_avatar::NAME, companion_avatar::VERSION);

    let config = match args.config {
        Some(ref path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env_overrides();
            config
        }
        None => Config::load()?,
    };
    config.validate()?;

    match args.command {
        Command::Inspect { dir } => {
            let model = load_model(&config, dir)?;
            println!("{}", serde_json::to_string_pretty(&model)?);
        }
        Command::Simulate {
            dir,
            seconds,
            events,
        } => {
            let model = load_model(&config, dir)?;
            let summary = simulate(&config, model, seconds, events)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

/// Resolve the requested model, or the configured default, off the main thread
fn load_model(config: &Config, dir: Option<PathBuf>) -> anyhow::Result<LoadedModel> {
    let mut loader = ModelLoader::from_config(&config.model);

    let dir = match dir {
        Some(dir) => dir,
        None => {
            let name = config
                .model
                .default_model
                .as_deref()
                .context("No model directory given and no default_model configured")?;
            loader.models_dir().join(name)
        }
    };

    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let model = runtime
        .block_on(loader.load_async(&dir))
        .with_context(|| format!("Failed to load model from {}", dir.display()))?;

    info!(
        "Loaded '{}': {} textures, {} motions, {} expressions",
        model.name(),
        model.textures().len(),
        model.motions().len(),
        model.expressions().len()
    );
    Ok(model)
}

fn simulate(
    config: &Config,
    model: LoadedModel,
    seconds: f64,
    mut events: Vec<Scheduled>,
) -> anyhow::Result<SimulationSummary> {
    let end = Duration::try_from_secs_f64(seconds).context("Invalid simulation length")?;
    let step = Duration::try_from_secs_f64(1.0 / config.render.frame_rate)?;
    let model_name = model.name().to_string();

    let clock = ManualClock::new();
    let renderer = Rc::new(RefCell::new(FrameRenderer::new(RecordingSurface::new())));
    {
        let mut renderer = renderer.borrow_mut();
        renderer.set_frame_rate(config.render.frame_rate);
        renderer.update_model(model);
    }

    let mut machine = AnimationStateMachine::new(Rc::new(clock.clone()))
        .with_timing(AnimationTiming::from(&config.animation))
        .with_renderer(&renderer);
    let mut frame_loop = FrameLoop::new(Rc::new(clock.clone()));

    events.sort_by_key(|e| e.at);
    let mut pending = events.into_iter().peekable();
    let mut last = machine.snapshot();
    let mut transitions = 0;

    frame_loop.appear(&*renderer);
    while clock.now() <= end {
        while let Some(scheduled) = pending.next_if(|e| e.at <= clock.now()) {
            match scheduled.signal {
                Signal::Reaction(event) => machine.react(event),
                Signal::Phase(phase) => machine.update_state(phase),
            }
        }

        frame_loop.pump(&mut machine, &*renderer);

        let snapshot = machine.snapshot();
        if snapshot != last {
            info!(
                "{:>7.3}s  {} -> {}  expression={}",
                clock.now().as_secs_f64(),
                last.state,
                snapshot.state,
                snapshot.expression
            );
            if snapshot.state != last.state {
                transitions += 1;
            }
            last = snapshot;
        }

        clock.advance(step);
    }
    frame_loop.disappear(&*renderer);

    Ok(SimulationSummary {
        model: model_name,
        seconds,
        frames: frame_loop.frames(),
        transitions,
        last,
    })
}
