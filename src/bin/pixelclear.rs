use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pixel_clear::presentation::SINGLE_EXPORT_NAME;
use pixel_clear::{
    default_output_path, export_all, export_one, parse_strokes, Config, GeminiClient, ImageRecord,
    ImageStatus, Orchestrator, RefineOutcome, SourceFile, Viewport, Workspace,
};

#[derive(Parser)]
#[command(
    name = "pixelclear",
    about = "Erase watermarks, logos and overlaid text with a generative image model",
    version,
    after_help = "Simple usage: pixelclear clear <images...> -o <dir>\n\n\
                  The API key is read from GEMINI_API_KEY (or API_KEY) unless --api-key is given."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// API key for the edit service
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Model identifier (default: gemini-2.5-flash-image)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Service root URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Clear a batch of images and save the results as cleared_<n>.png
    Clear {
        /// Input image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Delay between successive saves, in milliseconds
        #[arg(long, default_value_t = 300)]
        stagger_ms: u64,
    },
    /// Clear one image, then refine it with a painted mask
    Refine {
        /// Input image file
        input: PathBuf,

        /// JSON stroke file of viewport positions:
        /// [{"brush_size": 30, "points": [{"x": 10, "y": 20}, ...]}, ...]
        #[arg(long)]
        strokes: PathBuf,

        /// Output file or directory (default: {name}_cleared.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Editor viewport the strokes were drawn in
        #[arg(long, default_value = "800x600")]
        viewport: Viewport,

        /// Brush size for strokes that do not set one (10-100)
        #[arg(long)]
        brush: Option<f32>,

        /// Also save the painted mask to this path
        #[arg(long)]
        mask_out: Option<PathBuf>,

        /// Send the painted mask to the model alongside the image
        #[arg(long)]
        send_mask: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose && cli.quiet {
        eprintln!("Error: Cannot specify both --verbose and --quiet");
        process::exit(1);
    }
    init_tracing(cli.verbose, cli.quiet);

    let mut config = Config::from_env();
    if let Some(key) = cli.api_key.clone() {
        config.api_key = Some(key);
    }
    if let Some(model) = cli.model.clone() {
        config.model = model;
    }
    if let Some(url) = cli.base_url.clone() {
        config.base_url = url;
    }

    if let Command::Refine { send_mask: true, .. } = cli.command {
        config.send_mask = true;
    }

    let workspace = Workspace::new(Orchestrator::new(GeminiClient::new(&config)));

    let ok = match cli.command {
        Command::Clear {
            ref inputs,
            ref output,
            stagger_ms,
        } => {
            config.stagger = Duration::from_millis(stagger_ms);
            run_clear(workspace, inputs, output, &config, cli.quiet).await
        }
        Command::Refine {
            ref input,
            ref strokes,
            ref output,
            viewport,
            brush,
            ref mask_out,
            ..
        } => {
            config.viewport = viewport;
            if let Some(brush) = brush {
                config.brush_size = brush;
            }
            let output = match output {
                Some(o) if o.is_dir() => o.join(SINGLE_EXPORT_NAME),
                Some(o) => o.clone(),
                None => default_output_path(input),
            };
            let job = RefineJob {
                input,
                strokes,
                output: &output,
                mask_out: mask_out.as_deref(),
            };
            run_refine(workspace, &job, &config, cli.quiet).await
        }
    };

    if !ok {
        process::exit(1);
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Expand directories into their files; other paths are taken as given.
fn collect_files(inputs: &[PathBuf]) -> Result<Vec<SourceFile>, String> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let entries = std::fs::read_dir(input)
                .map_err(|e| format!("Failed to read directory {}: {e}", input.display()))?;
            let mut paths: Vec<PathBuf> = entries
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .collect();
            paths.sort();
            for path in paths {
                files.push(read_source(&path)?);
            }
        } else if input.exists() {
            files.push(read_source(input)?);
        } else {
            return Err(format!("Input path does not exist: {}", input.display()));
        }
    }
    Ok(files)
}

fn read_source(path: &Path) -> Result<SourceFile, String> {
    SourceFile::from_path(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))
}

async fn run_clear(
    mut workspace: Workspace<GeminiClient>,
    inputs: &[PathBuf],
    output: &Path,
    config: &Config,
    quiet: bool,
) -> bool {
    let files = match collect_files(inputs) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error: {e}");
            return false;
        }
    };

    match workspace.upload(files).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            eprintln!("Error: No image files among the inputs");
            return false;
        }
        Err(e) => {
            eprintln!("Error: {e}");
            return false;
        }
    }

    let records = workspace.records();
    for r in &records {
        print_result(r, quiet);
    }

    if let Some(label) = workspace.download_all_label() {
        if !quiet {
            eprintln!();
            eprintln!("{label} -> {}", output.display());
        }
        match export_all(&records, output, config.stagger).await {
            Ok(written) => {
                for path in &written {
                    if !quiet {
                        eprintln!("  saved {}", path.display());
                    }
                }
            }
            Err(e) => {
                eprintln!("Error: Failed to save results: {e}");
                return false;
            }
        }
    }

    let done = records.iter().filter(|r| r.status == ImageStatus::Done).count();
    let failed = records.len() - done;
    if records.len() > 1 && !quiet {
        eprintln!();
        eprint!("[Summary] Cleared: {done}");
        if failed > 0 {
            eprint!(", Failed: {failed}");
        }
        eprintln!(" (Total: {})", records.len());
    }

    failed == 0
}

struct RefineJob<'a> {
    input: &'a Path,
    strokes: &'a Path,
    output: &'a Path,
    mask_out: Option<&'a Path>,
}

async fn run_refine(
    mut workspace: Workspace<GeminiClient>,
    job: &RefineJob<'_>,
    config: &Config,
    quiet: bool,
) -> bool {
    let strokes = match std::fs::read_to_string(job.strokes)
        .map_err(pixel_clear::Error::from)
        .and_then(|json| parse_strokes(&json))
    {
        Ok(strokes) => strokes,
        Err(e) => {
            eprintln!("Error: {}: {e}", job.strokes.display());
            return false;
        }
    };
    let file = match read_source(job.input) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: {e}");
            return false;
        }
    };

    match workspace.upload(vec![file]).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            eprintln!("Error: {} is not an image", job.input.display());
            return false;
        }
        Err(e) => {
            eprintln!("Error: {e}");
            return false;
        }
    }

    let Some(record) = workspace.records().into_iter().next() else {
        return false;
    };
    print_result(&record, quiet);
    if record.status != ImageStatus::Done {
        return false;
    }

    if let Err(e) = workspace.start_refine(&record.id, config.viewport) {
        eprintln!("Error: {e}");
        return false;
    }
    if let Some(editor) = workspace.editor_mut() {
        editor.set_brush_size(config.brush_size);
        editor.replay(&strokes);
        if let Some(path) = job.mask_out {
            if let Err(e) = editor.mask().save(path) {
                eprintln!("Error: Failed to save mask to {}: {e}", path.display());
                return false;
            }
        }
    }

    let outcome = match workspace.finish_refine().await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {e}");
            return false;
        }
    };

    let Some(record) = workspace.orchestrator().record(&record.id) else {
        return false;
    };
    let refined = !matches!(outcome, RefineOutcome::Failed(_));
    match outcome {
        RefineOutcome::Refined => {
            if !quiet {
                eprintln!("[OK] {}: refined", record.source.name);
            }
        }
        RefineOutcome::NoResult => {
            if !quiet {
                eprintln!(
                    "[SKIP] {}: no refined image returned, keeping first pass",
                    record.source.name
                );
            }
        }
        RefineOutcome::Failed(e) => {
            let notice = workspace.notice().unwrap_or_default();
            eprintln!("[FAIL] {}: {notice} {e}", record.source.name);
        }
    }

    match export_one(&record, job.output).await {
        Ok(true) => {
            if !quiet {
                eprintln!("  saved {}", job.output.display());
            }
            refined
        }
        Ok(false) => false,
        Err(e) => {
            eprintln!("Error: Failed to save {}: {e}", job.output.display());
            false
        }
    }
}

fn print_result(record: &ImageRecord, quiet: bool) {
    let name = &record.source.name;
    match record.status {
        ImageStatus::Done => {
            if !quiet {
                eprintln!("[OK] {name} ({}x{})", record.width, record.height);
            }
        }
        ImageStatus::Error => eprintln!("[FAIL] {name}"),
        ImageStatus::Pending | ImageStatus::Processing => {
            eprintln!("[FAIL] {name}: did not settle");
        }
    }
}
