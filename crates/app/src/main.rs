use std::{io::Write, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use glowgrid_core::{
    ascii_frame, catalog, AppConfig, CaptureConfig, ExportHost, FrameLoop, GridView,
    PreviewCatalog, Recorder, SelectionConfig, Theme,
};
use tracing_subscriber::EnvFilter;

mod encode;
mod protocol;
mod sink;

use sink::{GridLayout, PngSequenceSink};

fn main() -> glowgrid_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::List => run_list(),
        Commands::Sample { selection, at } => {
            run_sample(&selection.apply(&config.selection, false), &at)
        }
        Commands::Live {
            selection,
            fps,
            duration_ms,
        } => run_live(
            &selection.apply(&config.selection, false),
            fps.unwrap_or(config.capture.fps),
            duration_ms,
        ),
        Commands::Bridge { selection } => run_bridge(&selection.apply(&config.selection, true)),
        Commands::Capture { selection, capture } => run_capture(
            &selection.apply(&config.selection, true),
            &capture.apply(&config.capture),
        ),
        Commands::Run { selection, export } => {
            let mut selection = selection.apply(&config.selection, config.selection.export);
            selection.export |= export;
            if selection.export {
                run_bridge(&selection)
            } else {
                run_live(&selection, config.capture.fps, None)
            }
        }
    }
}

fn run_list() -> glowgrid_core::Result<()> {
    let previews = PreviewCatalog::build(catalog());
    for pattern in catalog().iter() {
        let peak = previews
            .get(&pattern.id)
            .map(|preview| preview.snapshot.peak())
            .unwrap_or(0.0);
        println!(
            "{:<10} loop {:>6} ms  beat {:>4} ms  pulse {:>5} ms  {}  preview peak {:.2}",
            pattern.id,
            pattern.loop_ms,
            pattern.beat_ms,
            pattern.pulse_ms,
            if pattern.is_procedural() { "seeded" } else { "steps " },
            peak,
        );
    }

    let themes: Vec<&str> = Theme::all().iter().map(|theme| theme.id).collect();
    println!("themes: {}", themes.join(", "));
    Ok(())
}

fn run_sample(selection: &SelectionConfig, at: &[f64]) -> glowgrid_core::Result<()> {
    let view = GridView::from_selection(selection);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for &t_ms in at {
        let line = serde_json::json!({
            "pattern": view.resolved().id(),
            "t_ms": t_ms,
            "intensities": view.sample_at(t_ms),
        });
        serde_json::to_writer(&mut out, &line)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

fn run_live(
    selection: &SelectionConfig,
    fps: f64,
    duration_ms: Option<f64>,
) -> glowgrid_core::Result<()> {
    tracing::info!(pattern = %selection.pattern, fps, ?duration_ms, "starting live mode");

    let view = GridView::from_selection(selection);
    let frame_loop = FrameLoop::new(fps)?;
    let token = frame_loop.cancel_token();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut first = true;

    let frames = view.run_realtime(&frame_loop, |t_abs, frame| {
        if !first {
            // Redraw in place over the previous three rows.
            out.write_all(b"\x1b[3A")?;
        }
        first = false;
        out.write_all(ascii_frame(frame).as_bytes())?;
        out.flush()?;

        if duration_ms.is_some_and(|limit| t_abs >= limit) {
            token.cancel();
        }
        Ok(())
    })?;

    tracing::info!(frames, "live mode finished");
    Ok(())
}

fn run_bridge(selection: &SelectionConfig) -> glowgrid_core::Result<()> {
    let view = GridView::from_selection(selection);
    let host = ExportHost::new();
    let bridge = view.export_bridge(&host)?;
    tracing::info!(loop_ms = view.loop_ms(), "export bridge listening on stdin");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let handled = protocol::serve(bridge.host(), &view, stdin.lock(), stdout.lock())?;

    bridge.unregister();
    tracing::info!(requests = handled, "export bridge closed");
    Ok(())
}

fn run_capture(selection: &SelectionConfig, capture: &CaptureConfig) -> glowgrid_core::Result<()> {
    let view = GridView::from_selection(selection);
    let theme = Theme::by_id_or_default(selection.theme.as_deref());
    let layout = GridLayout {
        cell_px: capture.cell_px,
        gap_px: capture.gap_px,
    };

    let mut sink = PngSequenceSink::new(&capture.output_dir, &capture.frame_prefix, theme, layout);
    let summary = Recorder::new(capture.fps).capture_view(&view, &mut sink)?;
    tracing::info!(
        pattern = %summary.pattern_id,
        frames = summary.plan.frame_count,
        seamless = summary.seamless,
        dir = %capture.output_dir.display(),
        "capture finished"
    );

    if let Some(out) = &capture.encode {
        encode::encode_sequence(sink.dir(), sink.prefix(), capture.fps, out)?;
    }

    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Seamless looping 3x3 glow grid", long_about = None)]
struct Cli {
    /// Optional JSON config file; command line flags take precedence.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the built-in patterns.
    List,
    /// Print the intensities of a pattern at the given times as JSON lines.
    Sample {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Absolute times in milliseconds.
        #[arg(long, num_args = 1.., required = true, allow_negative_numbers = true)]
        at: Vec<f64>,
    },
    /// Animate a pattern in the terminal from the realtime clock.
    Live {
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(long)]
        fps: Option<f64>,
        /// Stop after this many milliseconds. Runs until killed otherwise.
        #[arg(long)]
        duration_ms: Option<f64>,
    },
    /// Serve export-mode time control over stdin/stdout for an external driver.
    Bridge {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Capture exactly one loop as numbered PNG frames.
    Capture {
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        capture: CaptureArgs,
    },
    /// Start in the mode chosen by the config file or `--export`.
    Run {
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(long)]
        export: bool,
    },
}

#[derive(Args, Debug)]
struct SelectionArgs {
    /// Pattern id; unknown ids fall back to the default pattern.
    #[arg(short, long)]
    pattern: Option<String>,
    /// Seed for procedural patterns.
    #[arg(short, long)]
    seed: Option<String>,
    /// Colour theme for rendered frames.
    #[arg(short, long)]
    theme: Option<String>,
}

impl SelectionArgs {
    fn apply(&self, base: &SelectionConfig, export: bool) -> SelectionConfig {
        SelectionConfig {
            pattern: self.pattern.clone().unwrap_or_else(|| base.pattern.clone()),
            seed: self.seed.clone().or_else(|| base.seed.clone()),
            export,
            theme: self.theme.clone().or_else(|| base.theme.clone()),
        }
    }
}

#[derive(Args, Debug)]
struct CaptureArgs {
    #[arg(long)]
    fps: Option<f64>,
    /// Directory receiving the numbered frames.
    #[arg(short, long)]
    out_dir: Option<PathBuf>,
    #[arg(long)]
    prefix: Option<String>,
    #[arg(long)]
    cell_px: Option<u32>,
    #[arg(long)]
    gap_px: Option<u32>,
    /// Encode the frames into this video file with ffmpeg.
    #[arg(long)]
    encode: Option<PathBuf>,
}

impl CaptureArgs {
    fn apply(&self, base: &CaptureConfig) -> CaptureConfig {
        CaptureConfig {
            fps: self.fps.unwrap_or(base.fps),
            output_dir: self.out_dir.clone().unwrap_or_else(|| base.output_dir.clone()),
            frame_prefix: self.prefix.clone().unwrap_or_else(|| base.frame_prefix.clone()),
            cell_px: self.cell_px.unwrap_or(base.cell_px),
            gap_px: self.gap_px.unwrap_or(base.gap_px),
            encode: self.encode.clone().or_else(|| base.encode.clone()),
        }
    }
}
