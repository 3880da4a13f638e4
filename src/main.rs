//! Camera Director - Command Line Entry Point
//!
//! Records the built-in headless scene and plays session files back in any
//! of the director's playback modes.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use camdirector::{
    config::{self, DirectorConfig},
    scene::SceneAdapter,
    session::{DirectorEvent, SessionFile},
    DirectorState, HeadlessScene, ModelKind, SessionDirector,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "camdirector", version, about = "Record scenes and direct their playback")]
struct Cli {
    /// Config file (defaults to the one in the app data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Also write daily rolling logs to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    /// Follow the recorded tick interval instead of running flat out
    #[arg(long, global = true)]
    realtime: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record the demo scene
    Record {
        /// Number of ticks to capture
        #[arg(long, default_value_t = 120)]
        ticks: usize,
        /// Output file (defaults to a timestamped file in the output directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay a session, following its labels when given a label file
    Replay { path: PathBuf },
    /// Replay a session and write the on-air camera as labels
    Label {
        path: PathBuf,
        /// Scripted operator cuts as TICK=CAMERA
        #[arg(long = "cut", value_parser = parse_cut)]
        cuts: Vec<(usize, usize)>,
    },
    /// Replay a session with the classifier choosing cameras
    Predict {
        path: PathBuf,
        #[arg(long)]
        model: Option<ModelKind>,
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Replay a session with random cuts
    Random { path: PathBuf },
    /// Print a session's header and tick count
    Inspect { path: PathBuf },
}

fn parse_cut(s: &str) -> Result<(usize, usize), String> {
    let (tick, camera) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TICK=CAMERA, got {s:?}"))?;
    let tick = tick.trim().parse().map_err(|e| format!("tick: {e}"))?;
    let camera = camera.trim().parse().map_err(|e| format!("camera: {e}"))?;
    Ok((tick, camera))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let (file_layer, _guard) = match &cli.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "camdirector.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,camdirector=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    let config = match &cli.config {
        Some(path) => DirectorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => config::config_path()
            .map(DirectorConfig::load_or_default)
            .unwrap_or_default(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting tick runtime")?;
    runtime.block_on(run(cli.command, config, cli.realtime))
}

async fn run(command: Command, mut config: DirectorConfig, realtime: bool) -> anyhow::Result<()> {
    match command {
        Command::Inspect { path } => inspect(&path, config.recording.delimiter),
        Command::Record { ticks, output } => {
            let scene = if realtime {
                HeadlessScene::demo().with_wall_clock()
            } else {
                HeadlessScene::demo()
            };
            let interval = config.recording.tick_interval_secs;
            let mut director = SessionDirector::new(scene, config);
            let started = match output {
                Some(path) => director.start_record_to(path)?,
                None => director.start_record()?,
            };
            if !started {
                bail!("director is busy");
            }
            let path = director
                .recorder()
                .map(|r| r.path().to_path_buf())
                .unwrap_or_default();
            drive(
                &mut director,
                realtime,
                |d| {
                    d.scene_mut().advance(interval);
                    d.scene_mut().animate();
                },
                |d| d.recorder().is_some_and(|r| r.ticks_recorded() >= ticks),
            )
            .await?;
            println!("Recorded {ticks} ticks to {}", path.display());
            Ok(())
        }
        Command::Replay { path } => {
            let mut director = SessionDirector::new(HeadlessScene::new(), config);
            director.start_replay(&path)?;
            play(&mut director, realtime, |_| {}).await
        }
        Command::Label { path, cuts } => {
            let mut director = SessionDirector::new(HeadlessScene::new(), config);
            director.start_write_label(&path)?;
            play(&mut director, realtime, |d| {
                let index = d.data_index();
                for &(_, camera) in cuts.iter().filter(|(tick, _)| *tick == index) {
                    d.scene_mut().switch_camera(camera);
                }
            })
            .await
        }
        Command::Predict {
            path,
            model,
            threshold,
        } => {
            if let Some(threshold) = threshold {
                config.prediction.forecast_threshold = threshold;
            }
            config.validate()?;
            let kind = model.unwrap_or(config.prediction.model);
            let mut director = SessionDirector::new(HeadlessScene::new(), config);
            director
                .change_model(kind)
                .with_context(|| format!("loading {kind} model"))?;
            director.start_predict(&path)?;
            play(&mut director, realtime, |_| {}).await
        }
        Command::Random { path } => {
            let mut director = SessionDirector::new(HeadlessScene::new(), config);
            director.start_random(&path)?;
            play(&mut director, realtime, |_| {}).await
        }
    }
}

/// Run a playback session to its end and summarise the cuts
async fn play<F>(
    director: &mut SessionDirector<HeadlessScene>,
    realtime: bool,
    before_tick: F,
) -> anyhow::Result<()>
where
    F: FnMut(&mut SessionDirector<HeadlessScene>),
{
    let events = director.subscribe();
    let total = director.tick_count();
    drive(director, realtime, before_tick, |_| false).await?;

    let mut cuts = 0;
    for event in events.try_iter() {
        match event {
            DirectorEvent::CameraSwitched { .. } => cuts += 1,
            DirectorEvent::LabelsWritten {
                path,
                labelled,
                total,
            } => println!("Wrote {labelled}/{total} labels to {}", path.display()),
            _ => {}
        }
    }
    println!("Played {total} ticks with {cuts} camera cuts");
    Ok(())
}

/// Tick the director until it goes inactive or `done` says so
async fn drive<F, D>(
    director: &mut SessionDirector<HeadlessScene>,
    realtime: bool,
    mut before_tick: F,
    done: D,
) -> anyhow::Result<()>
where
    F: FnMut(&mut SessionDirector<HeadlessScene>),
    D: Fn(&SessionDirector<HeadlessScene>) -> bool,
{
    while director.state() != DirectorState::Inactive {
        if done(director) {
            director.stop()?;
            break;
        }
        if realtime {
            let Some(due) = director.next_due() else {
                break;
            };
            tokio::select! {
                _ = tokio::time::sleep_until(tokio::time::Instant::from_std(due)) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, stopping session");
                    director.stop()?;
                    break;
                }
            }
            before_tick(director);
            director.poll(Instant::now())?;
        } else {
            before_tick(director);
            director.tick()?;
        }
    }
    Ok(())
}

fn inspect(path: &Path, delimiter: char) -> anyhow::Result<()> {
    let file = SessionFile::open(path, delimiter)?;
    let header = file.header();
    println!("Data file:   {}", file.data_path().display());
    println!("Interval:    {}s", header.invoke_interval);
    println!("Cameras:     {}", header.num_cameras);
    println!("Avatars:     {}", header.num_avatars);
    println!("Ticks:       {}", file.tick_count());
    if file.tick_count() > 0 {
        let first = file.tick(1)?;
        let last = file.tick(file.tick_count())?;
        println!(
            "Time span:   {:.2}s .. {:.2}s",
            first.time_elapsed, last.time_elapsed
        );
    }
    if let Some(labels) = file.labels() {
        println!("Labels:      {}/{} set", labels.labelled(), labels.len());
    }
    Ok(())
}
