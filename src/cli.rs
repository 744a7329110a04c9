// ============================================================================
// ShaderFX CLI — headless batch rendering via command-line arguments
// ============================================================================
//
// Usage examples:
//   shaderfx --input photo.png --pipeline lensSwirl --output swirl.png
//   shaderfx -i shots/*.jpg -p ryuukishi --output-dir out/
//   shaderfx -i big.jpg --max-size 1600 -o small.png
//   shaderfx --list
//
// No window is opened.  Inputs are decoded in parallel (rayon), then run one
// after another through a single controller bound to a headless wgpu
// compositor.  Every output is a PNG at the input's (possibly capped) size.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use rayon::prelude::*;

use crate::effects::ImageHandle;
use crate::export::DirectoryExportSink;
use crate::controller::PipelineController;
use crate::gpu::GpuCompositor;
use crate::io::load_image_sync;
use crate::pipelines::{PipelineId, Registry};
use crate::{log_err, log_info};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// ShaderFX headless effect renderer.
#[derive(Parser, Debug)]
#[command(
    name = "shaderfx",
    about = "ShaderFX headless effect-pipeline renderer",
    long_about = "Run a built-in effect pipeline over image files without opening\n\
                  the GUI.  Inputs may be JPEG, PNG, BMP, GIF or WEBP; outputs are PNG.\n\n\
                  Example:\n  \
                  shaderfx --input photo.png --pipeline lensSwirl --output result.png\n  \
                  shaderfx -i *.jpg -p anisotropicKuwahara --output-dir out/"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, num_args = 1.., required_unless_present = "list")]
    pub input: Vec<String>,

    /// Pipeline key, e.g. anisotropicKuwahara, lensSwirl, ryuukishi.
    #[arg(short, long, default_value = "anisotropicKuwahara", value_name = "KEY")]
    pub pipeline: String,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.  Files keep their stem and get
    /// a `.png` extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Downscale inputs whose longer side exceeds this many pixels.
    #[arg(long, value_name = "PIXELS")]
    pub max_size: Option<u32>,

    /// GPU preference: "high performance" or "low power".
    #[arg(long, default_value = "", value_name = "PREF")]
    pub gpu: String,

    /// Print the available pipelines and exit.
    #[arg(long)]
    pub list: bool,

    /// Mirror the log to stderr and print per-file timing.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process arguments.
    /// Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i" || a == "--list")
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    crate::logger::set_echo(args.verbose);
    let registry = Registry::builtin();

    if args.list {
        print!("{}", pipeline_listing(&registry));
        return ExitCode::SUCCESS;
    }

    let pipeline: PipelineId = match args.pipeline.parse() {
        Ok(id) => id,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
        return ExitCode::FAILURE;
    }

    let compositor = match GpuCompositor::headless(&args.gpu) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if args.verbose {
        println!("GPU: {}", compositor.adapter_name());
    }

    let sink = DirectoryExportSink::new(args.output_dir.clone().unwrap_or_else(|| PathBuf::from(".")));
    let mut controller = PipelineController::new(registry, compositor, sink, pipeline);
    if let Err(e) = controller.initialize() {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    // Decode everything up front; rendering shares one device so stays serial.
    let decode_start = Instant::now();
    let max_size = args.max_size;
    let decoded: Vec<(PathBuf, Result<ImageHandle, String>)> = inputs
        .par_iter()
        .map(|path| (path.clone(), load_image_sync(path, max_size)))
        .collect();
    log_info!("decoded {} input(s) in {:.0}ms", decoded.len(), decode_start.elapsed().as_secs_f64() * 1000.0);

    let total = decoded.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, (input_path, image)) in decoded.into_iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        let Some(output_path) = build_output_path(&input_path, args.output.as_deref(), args.output_dir.as_deref())
        else {
            eprintln!("  error: cannot determine output path for '{}'.", input_path.display());
            any_failure = true;
            continue;
        };

        let image = match image {
            Ok(img) => img,
            Err(e) => {
                eprintln!("  error: load failed: {}", e);
                any_failure = true;
                continue;
            }
        };

        match render_one(&mut controller, image, &output_path) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                log_err!("{}: {}", input_path.display(), e);
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing
// ============================================================================

fn render_one(
    controller: &mut PipelineController<GpuCompositor, DirectoryExportSink>,
    image: ImageHandle,
    output: &Path,
) -> crate::error::Result<()> {
    let (w, h) = (image.width(), image.height());
    controller.set_input_image(Some(image));
    controller.set_size(w, h);
    controller.sink_mut().set_target(Some(output.to_path_buf()));
    let result = controller.export_image();
    controller.sink_mut().set_target(None);
    result
}

// ============================================================================
// Helpers
// ============================================================================

/// One line per registered pipeline: key, label and effect count.
fn pipeline_listing(registry: &Registry) -> String {
    let mut out = String::new();
    for descriptor in registry.list() {
        out.push_str(&format!(
            "{:<22} {} ({} effect{})\n",
            descriptor.id.as_str(),
            descriptor.label,
            descriptor.effects.len(),
            if descriptor.effects.len() == 1 { "" } else { "s" }
        ));
    }
    out
}

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: next to the input with a `.png` extension
///    (appends `_fx` to the stem if it would collide with the input path)
fn build_output_path(input: &Path, output: Option<&Path>, output_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.png", stem)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.png", stem));

    if candidate == input {
        Some(parent.join(format!("{}_fx.png", stem)))
    } else {
        Some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_output_wins() {
        let p = build_output_path(Path::new("in/a.jpg"), Some(Path::new("x/y.png")), Some(Path::new("dir")));
        assert_eq!(p, Some(PathBuf::from("x/y.png")));
    }

    #[test]
    fn output_dir_keeps_the_stem() {
        let p = build_output_path(Path::new("in/photo.jpg"), None, Some(Path::new("out")));
        assert_eq!(p, Some(Path::new("out").join("photo.png")));
    }

    #[test]
    fn fallback_never_overwrites_the_input() {
        assert_eq!(
            build_output_path(Path::new("in/photo.jpg"), None, None),
            Some(Path::new("in").join("photo.png"))
        );
        assert_eq!(
            build_output_path(Path::new("in/photo.png"), None, None),
            Some(Path::new("in").join("photo_fx.png"))
        );
    }

    #[test]
    fn args_parse_with_defaults() {
        let args = CliArgs::try_parse_from(["shaderfx", "-i", "a.png", "b.png", "--output-dir", "out"]).unwrap();
        assert_eq!(args.input, vec!["a.png".to_string(), "b.png".to_string()]);
        assert_eq!(args.pipeline, "anisotropicKuwahara");
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert!(args.max_size.is_none());
        assert!(!args.list);
    }

    #[test]
    fn list_does_not_need_inputs() {
        let args = CliArgs::try_parse_from(["shaderfx", "--list"]).unwrap();
        assert!(args.list);
        assert!(CliArgs::try_parse_from(["shaderfx"]).is_err());
    }

    #[test]
    fn listing_names_every_pipeline() {
        let listing = pipeline_listing(&Registry::builtin());
        for id in PipelineId::ALL {
            assert!(listing.contains(id.as_str()), "{} missing", id);
        }
        assert_eq!(listing.lines().count(), PipelineId::ALL.len());
    }

    #[test]
    fn resolve_inputs_expands_globs_and_dedups() {
        let dir = std::env::temp_dir().join(format!("shaderfx-cli-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["one.png", "two.png", "skip.txt"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }
        let literal = dir.join("one.png").to_string_lossy().into_owned();
        let pattern = dir.join("*.png").to_string_lossy().into_owned();
        let missing = dir.join("nothing-*.jpg").to_string_lossy().into_owned();

        let found = resolve_inputs(&[literal, pattern, missing]);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], dir.join("one.png"));
        assert!(found.contains(&dir.join("two.png")));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
