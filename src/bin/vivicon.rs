use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "vivicon", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a single icon.
    Generate(GenerateArgs),
    /// Generate every icon in a batch JSON file.
    Batch(BatchArgs),
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Input SVG path, or inline markup (recognized by a leading '<').
    source: String,

    /// Output path; the extension picks the container.
    #[arg(long, short = 'o')]
    out: PathBuf,

    /// Icon color: a name or hex value, or a "(start,end)" gradient pair.
    #[arg(long)]
    color: Option<String>,

    /// Gradient direction for an icon gradient color.
    #[arg(long, value_enum, default_value_t = DirectionChoice::Horizontal)]
    direction: DirectionChoice,

    /// Canvas size in pixels.
    #[arg(long, default_value_t = 256)]
    size: u32,

    /// Background color, or a "(start,end)" gradient pair.
    #[arg(long)]
    bg_color: Option<String>,

    /// Gradient direction for a background gradient.
    #[arg(long, value_enum, default_value_t = DirectionChoice::Horizontal)]
    bg_direction: DirectionChoice,

    /// Background corner radius in pixels.
    #[arg(long, default_value_t = 0.0)]
    border_radius: f64,

    /// Background outline width in pixels.
    #[arg(long, default_value_t = 0.0)]
    outline_width: f64,

    /// Background outline color.
    #[arg(long)]
    outline_color: Option<String>,

    /// Animation preset: "spin", "pulse", "flip-h", "flip-v", with an
    /// optional duration ("spin:2s").
    #[arg(long)]
    animation: Option<String>,

    /// Frames per second for animated raster output.
    #[arg(long, default_value_t = 20)]
    fps: u32,

    /// GIF repeats; 0 loops forever.
    #[arg(long, default_value_t = 0)]
    loop_count: u16,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = 95)]
    quality: u8,

    /// Animated sprite size as a fraction of the canvas.
    #[arg(long, default_value_t = 0.85)]
    scale: f64,

    /// Worker threads for frame rendering (default: all cores).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Batch JSON file.
    batch: PathBuf,

    /// Output directory.
    #[arg(long, short = 'o', default_value = "icons")]
    out_dir: PathBuf,

    /// Container for entries that do not pick one themselves.
    #[arg(long, value_enum)]
    format: Option<FormatChoice>,

    /// Animated sprite size as a fraction of the canvas.
    #[arg(long, default_value_t = 0.85)]
    scale: f64,

    /// Worker threads for frame rendering (default: all cores).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DirectionChoice {
    Horizontal,
    Vertical,
    Diagonal,
}

impl From<DirectionChoice> for vivicon::GradientDirection {
    fn from(choice: DirectionChoice) -> Self {
        match choice {
            DirectionChoice::Horizontal => Self::Horizontal,
            DirectionChoice::Vertical => Self::Vertical,
            DirectionChoice::Diagonal => Self::Diagonal,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Svg,
    Png,
    Webp,
    Gif,
    Ico,
    Jpeg,
}

impl From<FormatChoice> for vivicon::OutputFormat {
    fn from(choice: FormatChoice) -> Self {
        match choice {
            FormatChoice::Svg => Self::Svg,
            FormatChoice::Png => Self::Png,
            FormatChoice::Webp => Self::Webp,
            FormatChoice::Gif => Self::Gif,
            FormatChoice::Ico => Self::Ico,
            FormatChoice::Jpeg => Self::Jpeg,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Batch(args) => cmd_batch(args),
    }
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let format = vivicon::OutputFormat::from_extension(&args.out).with_context(|| {
        format!(
            "cannot infer a format from '{}' (expected svg, png, webp, gif, ico, or jpg)",
            args.out.display()
        )
    })?;

    let mut request = vivicon::IconRequest::new(args.source);
    request.size = args.size;
    request.color = args.color;
    request.direction = args.direction.into();
    request.background = vivicon::BackgroundStyle {
        color: args.bg_color,
        direction: args.bg_direction.into(),
        corner_radius: args.border_radius,
        outline_width: args.outline_width,
        outline_color: args.outline_color,
    };
    request.animation = args.animation.map(vivicon::AnimationRequest::Shorthand);
    request.fps = args.fps;
    request.loop_count = args.loop_count;
    request.quality = args.quality;

    let options = vivicon::RenderOptions {
        icon_scale: args.scale,
        threads: args.threads,
    };
    vivicon::generate_icon(
        &request,
        format,
        &args.out,
        &vivicon::ResvgRasterizer,
        &options,
    )?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let mut batch = vivicon::read_batch_spec(&args.batch)?;
    if let Some(format) = args.format {
        batch.format = Some(format.into());
    }

    let options = vivicon::RenderOptions {
        icon_scale: args.scale,
        threads: args.threads,
    };
    let report = vivicon::generate_batch(
        &batch,
        &args.out_dir,
        &vivicon::ResvgRasterizer,
        &options,
    )?;

    for outcome in &report.outcomes {
        match &outcome.error {
            None => eprintln!("wrote {}", outcome.path.display()),
            Some(err) => eprintln!("failed {}: {err}", outcome.name),
        }
    }
    if report.failed() > 0 {
        anyhow::bail!(
            "{} of {} icons failed",
            report.failed(),
            report.outcomes.len()
        );
    }
    Ok(())
}
