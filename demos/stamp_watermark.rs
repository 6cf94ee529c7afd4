//! Stamp an invisible text watermark into a single image and verify it.
//!
//! Usage:
//! ```sh
//! cargo run --example stamp_watermark -- input.png output.png ["text"]
//! ```

use std::env;
use std::path::Path;
use std::process;

use banana_editor_core::{ProcessOptions, WatermarkEngine, DEFAULT_WATERMARK_TEXT};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <output> [text]", args[0]);
        process::exit(1);
    }

    let input = Path::new(&args[1]);
    let output = Path::new(&args[2]);
    let text = args.get(3).map_or(DEFAULT_WATERMARK_TEXT, String::as_str);

    let engine = WatermarkEngine::new(text);
    let result = engine.process_file(input, output, &ProcessOptions::default());

    if result.skipped {
        println!("Skipped: {}", result.message);
        return;
    }
    if !result.success {
        eprintln!("Error: {}", result.message);
        process::exit(1);
    }

    match WatermarkEngine::extract_file(output) {
        Ok(Some(found)) => println!("Done: {} reads back {found:?}", output.display()),
        Ok(None) => {
            eprintln!("Error: watermark missing from {}", output.display());
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
