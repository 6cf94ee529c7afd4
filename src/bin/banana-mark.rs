use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use image::Rgb;
use tracing_subscriber::EnvFilter;

use banana_editor_core::{
    default_output_path, EditorConfig, MaskEditor, Point, ProcessOptions, ProcessResult,
    Viewport, WatermarkEngine, DEFAULT_STROKE_COLOR, DEFAULT_WATERMARK_TEXT,
};

#[derive(Parser)]
#[command(
    name = "banana-mark",
    about = "Stamp invisible LSB text watermarks and render edit masks",
    version,
    after_help = "NOTE: watermarks live in the lowest bit of each color channel.\n\
                  Outputs are always lossless; re-saving as JPEG destroys them."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Embed a text watermark into an image file or every image in a directory
    Embed(EmbedArgs),
    /// Read back the watermark text from an image
    Extract {
        /// Watermarked image file
        input: PathBuf,
    },
    /// Replay strokes over an image and write the resulting mask
    Mask(MaskArgs),
}

#[derive(Args)]
struct EmbedArgs {
    /// Input image file or directory
    input: PathBuf,

    /// Output file or directory (default: {name}_marked.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Text to embed
    #[arg(short, long, default_value = DEFAULT_WATERMARK_TEXT)]
    text: String,

    /// Treat images too small for the payload as failures
    #[arg(long)]
    strict: bool,
}

#[derive(Args)]
struct MaskArgs {
    /// Source image the mask is painted over
    image: PathBuf,

    /// Output PNG for the mask
    #[arg(short, long)]
    output: PathBuf,

    /// Viewport size the image is letterboxed into, as WIDTHxHEIGHT
    #[arg(long, default_value = "512x512", value_parser = parse_viewport)]
    viewport: Viewport,

    /// One stroke as viewport points "x,y;x,y;..." (repeatable)
    #[arg(short, long = "stroke", value_parser = parse_stroke)]
    strokes: Vec<Stroke>,

    /// Brush diameter in pixels (clamped to 5-100)
    #[arg(short, long, default_value = "20")]
    brush: u32,

    /// Stroke color as RRGGBB hex
    #[arg(long, value_parser = parse_color)]
    color: Option<Rgb<u8>>,

    /// Undo this many steps after replaying the strokes
    #[arg(long, default_value = "0")]
    undo: usize,

    /// Write a binary mask on the source image's pixel grid instead of the
    /// viewport raster
    #[arg(long)]
    source_aligned: bool,
}

/// Points of one pointer-down to pointer-up gesture.
#[derive(Clone)]
struct Stroke(Vec<Point>);

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let opts = ProcessOptions {
        strict: false,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let code = match cli.command {
        Command::Embed(args) => {
            let opts = ProcessOptions {
                strict: args.strict,
                ..opts
            };
            run_embed(args, opts)
        }
        Command::Extract { input } => run_extract(&input, &opts),
        Command::Mask(args) => run_mask(&args, &opts),
    };
    process::exit(code);
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_embed(args: EmbedArgs, opts: ProcessOptions) -> i32 {
    if !args.input.exists() {
        eprintln!("Error: Input path does not exist: {}", args.input.display());
        return 1;
    }

    let engine = WatermarkEngine::new(args.text);
    if !opts.quiet {
        eprintln!(
            "Embedding {:?} ({} bits)",
            engine.text(),
            banana_editor_core::watermark::payload_bits(engine.text())
        );
        eprintln!();
    }

    let results = if args.input.is_dir() {
        let Some(output_dir) = args.output else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: banana-mark embed <input_dir> -o <output_dir>");
            return 1;
        };
        engine.process_directory(&args.input, &output_dir, &opts)
    } else {
        let output = args
            .output
            .unwrap_or_else(|| default_output_path(&args.input));
        vec![engine.process_file(&args.input, &output, &opts)]
    };

    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.skipped {
            skip_count += 1;
        } else if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Embedded: {success_count}");
        if skip_count > 0 {
            eprint!(", Skipped: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    i32::from(fail_count > 0)
}

fn run_extract(input: &Path, opts: &ProcessOptions) -> i32 {
    match WatermarkEngine::extract_file(input) {
        Ok(Some(text)) => {
            println!("{text}");
            0
        }
        Ok(None) => {
            if !opts.quiet {
                eprintln!("No watermark found in {}", input.display());
            }
            2
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn run_mask(args: &MaskArgs, opts: &ProcessOptions) -> i32 {
    let bytes = match std::fs::read(&args.image) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: Failed to read {}: {e}", args.image.display());
            return 1;
        }
    };

    let config = EditorConfig {
        brush_size: args.brush,
        ..EditorConfig::default()
    };
    let color = args.color.unwrap_or(DEFAULT_STROKE_COLOR);
    let mut editor = MaskEditor::new(config, args.viewport);
    if let Err(e) = editor.load_image(&bytes) {
        eprintln!("Error: {e}");
        return 1;
    }
    editor.set_tool_active(true);

    for stroke in &args.strokes {
        let Some((first, rest)) = stroke.0.split_first() else {
            continue;
        };
        editor.begin_stroke(*first);
        for point in rest {
            editor.continue_stroke(*point, color);
        }
        editor.end_stroke();
    }
    for _ in 0..args.undo {
        editor.undo();
    }

    let mask = if args.source_aligned {
        editor.export_source_aligned()
    } else {
        editor.export()
    };
    let Some(mask) = mask else {
        if !opts.quiet {
            eprintln!("[SKIP] Mask is empty, nothing written");
        }
        return 0;
    };

    match banana_editor_core::save_image(&mask, &args.output) {
        Ok(()) => {
            if !opts.quiet {
                eprintln!(
                    "[OK] {} ({}x{})",
                    args.output.display(),
                    mask.width(),
                    mask.height()
                );
            }
            0
        }
        Err(e) => {
            eprintln!("[FAIL] {}: {e}", args.output.display());
            1
        }
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    for line in status_lines(result, opts) {
        eprintln!("{line}");
    }
}

fn status_lines(result: &ProcessResult, opts: &ProcessOptions) -> Vec<String> {
    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if !result.success {
        return vec![format!("[FAIL] {filename}: {}", result.message)];
    }
    if opts.quiet {
        return Vec::new();
    }
    if result.skipped {
        return vec![format!("[SKIP] {filename}: {}", result.message)];
    }

    let mut lines = vec![format!("[OK] {filename}")];
    if opts.verbose && !result.message.is_empty() {
        lines.push(format!("  -> {}", result.message));
    }
    lines
}

fn parse_viewport(s: &str) -> Result<Viewport, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let width = w.trim().parse::<u32>().map_err(|e| format!("bad width: {e}"))?;
    let height = h.trim().parse::<u32>().map_err(|e| format!("bad height: {e}"))?;
    if width == 0 || height == 0 {
        return Err("viewport dimensions must be positive".to_string());
    }
    Ok(Viewport::new(width, height))
}

fn parse_stroke(s: &str) -> Result<Stroke, String> {
    s.split(';')
        .filter(|p| !p.trim().is_empty())
        .map(|p| {
            let (x, y) = p
                .split_once(',')
                .ok_or_else(|| format!("expected x,y point, got {p:?}"))?;
            let x = x.trim().parse::<f64>().map_err(|e| format!("bad x in {p:?}: {e}"))?;
            let y = y.trim().parse::<f64>().map_err(|e| format!("bad y in {p:?}: {e}"))?;
            Ok(Point::new(x, y))
        })
        .collect::<Result<Vec<_>, String>>()
        .map(Stroke)
}

fn parse_color(s: &str) -> Result<Rgb<u8>, String> {
    let hex = s.trim_start_matches('#');
    if hex.len() != 6 {
        return Err(format!("expected RRGGBB, got {s:?}"));
    }
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .ok_or_else(|| format!("bad hex color {s:?}"))
    };
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}
