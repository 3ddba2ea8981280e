use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use engine::default_worker_count;
use model::Vec2i;
use protocol::{InputFlags, InputFrame};
use replay_protocol::{ReplayEvent, ReplaySession, read_session};
use sketchpad::{CanvasCore, CoreConfig, NoPicker};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Replay a recorded input session headlessly and save the canvas as PNG"
)]
struct Arguments {
    /// Recorded session (JSON lines).
    replay: PathBuf,
    /// Output PNG path.
    #[arg(long, short = 'o', value_parser, default_value = "canvas.png")]
    output: PathBuf,
    /// Screen width, overriding the session header.
    #[arg(long)]
    width: Option<i32>,
    /// Screen height, overriding the session header.
    #[arg(long)]
    height: Option<i32>,
    /// Render worker count. Defaults to twice the available cores.
    #[arg(long)]
    workers: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let arguments = Arguments::parse();

    let file = File::open(&arguments.replay)
        .with_context(|| format!("open replay {}", arguments.replay.display()))?;
    let mut session = read_session(&mut BufReader::new(file))
        .with_context(|| format!("read replay {}", arguments.replay.display()))?;
    if let Some(width) = arguments.width {
        session.screen_size.x = width;
    }
    if let Some(height) = arguments.height {
        session.screen_size.y = height;
    }

    let max_size = largest_screen(&session);
    let config = CoreConfig {
        max_width: max_size.x,
        max_height: max_size.y,
        worker_count: arguments.workers.unwrap_or_else(default_worker_count),
        ..CoreConfig::default()
    };
    let mut core = CanvasCore::new(config, NoPicker::default()).context("create canvas core")?;
    core.resize(Vec2i::ZERO, session.screen_size)
        .context("apply session screen size")?;

    let mut warning_count = 0usize;
    for event in &session.events {
        match *event {
            ReplayEvent::Resize {
                pan_delta,
                screen_size,
            } => {
                if let Err(error) = core.resize(pan_delta, screen_size) {
                    warn!(%error, "replayed resize ignored");
                }
            }
            ReplayEvent::Input(frame) => {
                let report = core.update(&frame).context("update cycle")?;
                warning_count += report.warnings.len();
            }
        }
    }
    core.update(&InputFrame::flags(InputFlags::FULL_REFRESH))
        .context("final full redraw")?;

    let frame = core.active_frame();
    if frame.size.x <= 0 || frame.size.y <= 0 {
        bail!("replay ends with an empty screen");
    }
    let image = image::RgbaImage::from_raw(
        frame.size.x as u32,
        frame.size.y as u32,
        frame.pixels.to_vec(),
    )
    .context("active raster buffer matches the screen size")?;
    image
        .save(&arguments.output)
        .with_context(|| format!("write {}", arguments.output.display()))?;

    info!(
        events = session.events.len(),
        strokes = core.store().num_strokes(),
        warnings = warning_count,
        output = %arguments.output.display(),
        "replay finished"
    );
    Ok(())
}

fn largest_screen(session: &ReplaySession) -> Vec2i {
    session
        .events
        .iter()
        .filter_map(|event| match event {
            ReplayEvent::Resize { screen_size, .. } => Some(*screen_size),
            ReplayEvent::Input(_) => None,
        })
        .fold(session.screen_size, |largest, size| {
            Vec2i::new(largest.x.max(size.x), largest.y.max(size.y))
        })
}
