use clap::{Args, Parser, Subcommand, ValueEnum};
use std::error::Error as _;
use std::io::{IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use tikzgen::extract::{TIKZ_ENVIRONMENT, VectorFragment};
use tikzgen::gemini::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, GeminiClient, GeminiError};
use tikzgen::raster::{self, RasterError, RasterOptions};
use tikzgen::viewport::{Point, Rect, Size, ViewportState};
use tikzgen::{GenerationSettings, ImagePayload, MathTopic, Pipelines};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Generation(#[from] tikzgen::Error),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Gemini(#[from] GeminiError),
    #[error("No {0} found in input")]
    NothingExtracted(&'static str),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_)
            | CliError::Gemini(GeminiError::MissingApiKey)
            | CliError::Generation(tikzgen::Error::InputRejected { .. })
            | CliError::Generation(tikzgen::Error::MalformedDataUrl) => 2,
            CliError::NothingExtracted(_)
            | CliError::Generation(tikzgen::Error::ExtractionEmpty { .. }) => 3,
            _ => 1,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "tikzgen-cli",
    version,
    about = "Generate TikZ and SVG for mathematical figures (headless)"
)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Generation settings as JSON (models, temperatures, thinking budgets)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Model API key; falls back to GEMINI_API_KEY and API_KEY
    #[arg(long, global = true, env = "TIKZGEN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the generateContent REST API
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Turn a textual description into TikZ
    Describe(DescribeArgs),
    /// Compile TikZ into SVG (or PNG) through the model
    Compile(CompileArgs),
    /// Reconstruct TikZ (or a description) from a photo of a figure
    Photo(PhotoArgs),
    /// Extract a TikZ environment or an SVG document from text (offline)
    Extract(ExtractArgs),
    /// Export the crop rectangle of a panned/zoomed SVG to PNG (offline)
    Export(ExportArgs),
}

#[derive(Args)]
struct Reasoning {
    /// Disable deep reasoning: lower-effort temperatures, no thinking budget
    #[arg(long, conflicts_with = "deep")]
    fast: bool,

    /// Force deep reasoning on even if the settings disable it
    #[arg(long)]
    deep: bool,
}

impl Reasoning {
    fn resolve(&self, settings: &GenerationSettings) -> bool {
        if self.fast {
            false
        } else {
            self.deep || settings.deep_reasoning
        }
    }
}

#[derive(Args)]
struct DescribeArgs {
    /// Mathematical topic guiding the drawing conventions
    #[arg(long, default_value = "plane-geometry", value_parser = parse_topic)]
    topic: MathTopic,

    #[command(flatten)]
    reasoning: Reasoning,

    /// Write TikZ here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Description text; `-` or omitted reads stdin
    description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Svg,
    Png,
}

#[derive(Args)]
struct CompileArgs {
    #[arg(long, value_enum, default_value = "svg")]
    format: OutputFormat,

    /// Raster scale for `--format png`
    #[arg(long, default_value_t = 1.0, value_parser = parse_scale)]
    scale: f32,

    /// Background for `--format png` (`white`, `transparent`, `#rrggbb[aa]`)
    #[arg(long, default_value = "white")]
    background: String,

    #[command(flatten)]
    reasoning: Reasoning,

    /// Output path; SVG defaults to stdout, PNG to the input path with a `.png` extension
    #[arg(long)]
    out: Option<PathBuf>,

    /// TikZ source file; `-` or omitted reads stdin
    input: Option<PathBuf>,
}

#[derive(Args)]
struct PhotoArgs {
    /// Produce a detailed description instead of TikZ
    #[arg(long)]
    describe: bool,

    #[command(flatten)]
    reasoning: Reasoning,

    #[arg(long)]
    out: Option<PathBuf>,

    /// Image file (PNG or JPEG)
    image: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FragmentKind {
    Tikz,
    Svg,
}

#[derive(Args)]
struct ExtractArgs {
    #[arg(long, value_enum, default_value = "tikz")]
    kind: FragmentKind,

    /// LaTeX environment to extract for `--kind tikz`
    #[arg(long, default_value = TIKZ_ENVIRONMENT)]
    environment: String,

    /// Fail unless the SVG document is closed
    #[arg(long)]
    complete: bool,

    #[arg(long)]
    out: Option<PathBuf>,

    /// Text to search; `-` or omitted reads stdin
    input: Option<PathBuf>,
}

#[derive(Args)]
struct ExportArgs {
    /// Viewport state as JSON (`pan`, `zoom`, `crop`); flags below override it
    #[arg(long, value_name = "FILE")]
    viewport: Option<PathBuf>,

    /// Crop rectangle in screen pixels: `left,top,width,height` (sides at least 50)
    #[arg(long, value_parser = parse_rect, allow_hyphen_values = true)]
    crop: Option<Rect>,

    /// Pan offset in screen pixels: `x,y`
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pan: Option<Point>,

    #[arg(long, value_parser = parse_zoom)]
    zoom: Option<f64>,

    /// Size of the preview surface the image is centered in: `width,height`
    #[arg(long, default_value = "800,600", value_parser = parse_size)]
    container: Size,

    /// Defaults to `tikz_export_<unix-millis>.png` in the current directory
    #[arg(long)]
    out: Option<PathBuf>,

    /// SVG file (surrounding text is ignored); `-` or omitted reads stdin
    input: Option<PathBuf>,
}

fn parse_topic(s: &str) -> Result<MathTopic, String> {
    s.parse::<MathTopic>().map_err(|err| {
        let names: Vec<_> = MathTopic::ALL.iter().map(|t| t.name()).collect();
        format!("{err}; expected one of: {}", names.join(", "))
    })
}

fn parse_numbers<const N: usize>(s: &str) -> Result<[f64; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {N} comma-separated numbers, got `{s}`"));
    }
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        let v = part
            .parse::<f64>()
            .map_err(|_| format!("`{part}` is not a number"))?;
        if !v.is_finite() {
            return Err(format!("`{part}` is not finite"));
        }
        *slot = v;
    }
    Ok(out)
}

fn parse_rect(s: &str) -> Result<Rect, String> {
    let [left, top, width, height] = parse_numbers::<4>(s)?;
    let rect = Rect::new(left, top, width, height);
    let min = tikzgen::viewport::MIN_CROP_SIZE;
    if rect.width < min || rect.height < min {
        return Err(format!("crop width and height must be at least {min}"));
    }
    Ok(rect)
}

fn parse_point(s: &str) -> Result<Point, String> {
    let [x, y] = parse_numbers::<2>(s)?;
    Ok(Point::new(x, y))
}

fn parse_size(s: &str) -> Result<Size, String> {
    let [width, height] = parse_numbers::<2>(s)?;
    let size = Size::new(width, height);
    if !size.is_positive() {
        return Err("width and height must be positive".to_string());
    }
    Ok(size)
}

fn parse_zoom(s: &str) -> Result<f64, String> {
    let [zoom] = parse_numbers::<1>(s)?;
    if zoom < tikzgen::viewport::MIN_ZOOM {
        return Err(format!(
            "zoom must be at least {}",
            tikzgen::viewport::MIN_ZOOM
        ));
    }
    Ok(zoom)
}

fn parse_scale(s: &str) -> Result<f32, String> {
    let scale = s
        .parse::<f32>()
        .map_err(|_| format!("`{s}` is not a number"))?;
    if !(scale.is_finite() && scale > 0.0) {
        return Err("scale must be a positive number".to_string());
    }
    Ok(scale)
}

fn read_input(input: Option<&Path>) -> Result<String, CliError> {
    match input {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn read_text_arg(arg: Option<&str>) -> Result<String, CliError> {
    match arg {
        Some(text) if text != "-" => Ok(text.to_string()),
        _ => read_input(None),
    }
}

fn write_text(text: &str, out: Option<&Path>) -> Result<(), CliError> {
    match out {
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn default_raster_out_path(input: Option<&Path>) -> PathBuf {
    match input {
        Some(path) if path != Path::new("-") => path.with_extension("png"),
        _ => PathBuf::from("out.png"),
    }
}

fn load_settings(path: Option<&Path>) -> Result<GenerationSettings, CliError> {
    match path {
        None => Ok(GenerationSettings::default()),
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(GenerationSettings::from_json_str(&text)?)
        }
    }
}

fn build_client(cli: &Cli) -> Result<GeminiClient, CliError> {
    let key = cli
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| {
            ["GEMINI_API_KEY", "API_KEY"]
                .iter()
                .filter_map(|var| std::env::var(var).ok())
                .find(|v| !v.trim().is_empty())
        })
        .ok_or(GeminiError::MissingApiKey)?;
    Ok(GeminiClient::with_options(
        key,
        cli.base_url.as_str(),
        DEFAULT_TIMEOUT,
    )?)
}

fn run_describe(cli: &Cli, args: &DescribeArgs) -> Result<(), CliError> {
    let description = read_text_arg(args.description.as_deref())?;
    if description.trim().is_empty() {
        return Err(CliError::Usage("description is empty".to_string()));
    }
    let settings = load_settings(cli.config.as_deref())?;
    let client = build_client(cli)?;
    let deep = args.reasoning.resolve(&settings);
    let markup = Pipelines::new(&client, &settings).markup_from_description(
        args.topic,
        &description,
        deep,
    )?;
    write_text(&markup, args.out.as_deref())
}

fn run_compile(cli: &Cli, args: &CompileArgs) -> Result<(), CliError> {
    let markup = read_input(args.input.as_deref())?;
    if markup.trim().is_empty() {
        return Err(CliError::Usage("TikZ input is empty".to_string()));
    }
    let settings = load_settings(cli.config.as_deref())?;
    let client = build_client(cli)?;
    let deep = args.reasoning.resolve(&settings);

    let show_progress = std::io::stderr().is_terminal();
    let mut on_partial = |partial: &str| {
        if show_progress {
            eprint!("\rreceived {} bytes of SVG", partial.len());
        }
    };
    let svg = Pipelines::new(&client, &settings).vector_from_markup(
        &markup,
        deep,
        Some(&mut on_partial),
    );
    if show_progress {
        eprintln!();
    }
    let svg = svg?;

    match args.format {
        OutputFormat::Svg => write_text(&svg, args.out.as_deref()),
        OutputFormat::Png => {
            let options = RasterOptions {
                scale: args.scale,
                background: Some(args.background.clone()),
            };
            let bytes = raster::svg_to_png(&svg, &options)?;
            let out = args
                .out
                .clone()
                .unwrap_or_else(|| default_raster_out_path(args.input.as_deref()));
            std::fs::write(&out, bytes)?;
            tracing::info!(path = %out.display(), "wrote PNG");
            Ok(())
        }
    }
}

fn run_photo(cli: &Cli, args: &PhotoArgs) -> Result<(), CliError> {
    let image = ImagePayload::sniff(std::fs::read(&args.image)?)?;
    let settings = load_settings(cli.config.as_deref())?;
    let client = build_client(cli)?;
    let pipelines = Pipelines::new(&client, &settings);
    let text = if args.describe {
        pipelines.description_from_image(&image)?
    } else {
        pipelines.markup_from_image(&image, args.reasoning.resolve(&settings))?
    };
    write_text(&text, args.out.as_deref())
}

fn run_extract(args: &ExtractArgs) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let fragment = match args.kind {
        FragmentKind::Tikz if args.environment == TIKZ_ENVIRONMENT => {
            tikzgen::extract_markup(&text)
        }
        FragmentKind::Tikz => tikzgen::extract_environment(&text, &args.environment),
        FragmentKind::Svg => match tikzgen::classify_vector_image(&text) {
            VectorFragment::Empty => String::new(),
            VectorFragment::Partial(_) if args.complete => {
                return Err(CliError::NothingExtracted("complete SVG document"));
            }
            VectorFragment::Partial(svg) => {
                tracing::warn!("SVG document is not closed");
                svg.to_string()
            }
            VectorFragment::Complete(svg) => svg.to_string(),
        },
    };
    if fragment.is_empty() {
        return Err(CliError::NothingExtracted(match args.kind {
            FragmentKind::Tikz => "TikZ",
            FragmentKind::Svg => "SVG",
        }));
    }
    write_text(&fragment, args.out.as_deref())
}

fn run_export(args: &ExportArgs) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let svg = tikzgen::extract_vector_image(&text);

    let mut viewport = match &args.viewport {
        Some(path) => serde_json::from_str::<ViewportState>(&std::fs::read_to_string(path)?)?,
        None => ViewportState::default(),
    };
    if let Some(crop) = args.crop {
        viewport.crop = crop;
    }
    if let Some(pan) = args.pan {
        viewport.pan = pan;
    }
    if let Some(zoom) = args.zoom {
        viewport.zoom = zoom;
    }
    let normalized = viewport.normalized();
    if normalized != viewport {
        tracing::warn!(zoom = normalized.zoom, crop = ?normalized.crop, "viewport clamped to limits");
    }

    let Some(bytes) = raster::export_crop(&svg, &normalized, args.container)? else {
        return Err(CliError::NothingExtracted("SVG"));
    };
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(raster::export_file_name(chrono::Utc::now())));
    std::fs::write(&out, bytes)?;
    println!("{}", out.display());
    Ok(())
}

fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::Describe(args) => run_describe(cli, args),
        Command::Compile(args) => run_compile(cli, args),
        Command::Photo(args) => run_photo(cli, args),
        Command::Extract(args) => run_extract(args),
        Command::Export(args) => run_export(args),
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(&cli) {
        eprintln!("{err}");
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(err.exit_code());
    }
}
