//! Shadebox CLI - encrypted image containers and viewer core
//!
//! Command-line interface for generating key files, sealing images into
//! authenticated `.enc` containers, and decrypting containers back into
//! memory for viewing/export. Batch operations report failures per file
//! and keep going; only an unusable key file aborts a run.

use clap::{Parser, Subcommand};
use std::error::Error as StdError;
use std::path::PathBuf;
use std::process;

use shadebox::error::ShadeboxError;
use shadebox::keystore::{self, KeyMaterial};
use shadebox::navigator::Navigator;
use shadebox::{file_ops, viewport};

#[derive(Parser)]
#[command(name = "shadebox")]
#[command(version)]
#[command(about = "Encrypted image containers and viewer core.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a key file holding fresh 256-bit random key material
    #[command(alias = "k")]
    Keygen {
        /// Path to write the new key file to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Encrypt images into .enc containers written next to their inputs
    #[command(alias = "e")]
    Encrypt {
        /// Path to the key file
        #[arg(value_name = "KEY_FILE")]
        key: PathBuf,

        /// Image files to encrypt
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,
    },

    /// Decrypt containers in memory and report their fitted geometry
    #[command(name = "decrypt-view", alias = "v")]
    DecryptView {
        /// Path to the key file
        #[arg(value_name = "KEY_FILE")]
        key: PathBuf,

        /// Encrypted image files to walk through
        #[arg(value_name = "ENC_FILE", required = true)]
        images: Vec<PathBuf>,

        /// Viewport size the images are fitted into
        #[arg(long, value_name = "WxH", default_value = "1920x1080", value_parser = parse_viewport)]
        viewport: (u32, u32),

        /// Write the last successfully decoded image to this path as PNG
        #[arg(long, value_name = "FILE")]
        export: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Keygen { output } => run_keygen(&output),
        Commands::Encrypt { key, images } => load_key(&key).map(|k| run_encrypt(&k, &images)),
        Commands::DecryptView {
            key,
            images,
            viewport,
            export,
        } => load_key(&key).map(|k| run_decrypt_view(&k, images, viewport, export.as_deref())),
    };

    match result {
        Err(e) => {
            // No key means no operation is possible: fatal for the session.
            eprintln!("Error: {}", render(&e));
            process::exit(1);
        }
        Ok(failed) if failed > 0 => {
            eprintln!("{} file(s) failed", failed);
            process::exit(1);
        }
        Ok(_) => {}
    }
}

fn load_key(path: &std::path::Path) -> Result<KeyMaterial, ShadeboxError> {
    keystore::load(path)
}

fn run_keygen(output: &std::path::Path) -> Result<usize, ShadeboxError> {
    let key = KeyMaterial::generate();
    file_ops::write_key_file(&key, output)?;
    println!("wrote key file {}", output.display());
    Ok(0)
}

fn run_encrypt(key: &KeyMaterial, images: &[PathBuf]) -> usize {
    let mut failed = 0;
    for input in images {
        let output = file_ops::enc_output_path(input);
        match file_ops::encrypt_image_file(key, input, &output) {
            Ok(()) => {
                log::info!("{} -> {}", input.display(), output.display());
                println!("encrypted {}", output.display());
            }
            Err(e) => {
                failed += 1;
                report_file_failure(input, &e);
            }
        }
    }
    failed
}

fn run_decrypt_view(
    key: &KeyMaterial,
    images: Vec<PathBuf>,
    (viewport_width, viewport_height): (u32, u32),
    export: Option<&std::path::Path>,
) -> usize {
    let mut failed = 0;
    let mut navigator = Navigator::new();
    navigator.load(images);

    for i in 0..navigator.len() {
        let path = match navigator.jump_to(i) {
            Ok(p) => p.to_path_buf(),
            Err(e) => {
                failed += 1;
                eprintln!("Error: {}", render(&e));
                break;
            }
        };
        match file_ops::open_image_file(key, &path) {
            Ok(decoded) => {
                let geometry = viewport::fit(
                    decoded.width(),
                    decoded.height(),
                    viewport_width,
                    viewport_height,
                );
                println!(
                    "{}: {}x{} drawn {}x{} margins {}+{} in {}x{}",
                    path.display(),
                    decoded.width(),
                    decoded.height(),
                    geometry.width,
                    geometry.height,
                    geometry.margin_horizontal,
                    geometry.margin_vertical,
                    viewport_width,
                    viewport_height,
                );
                navigator.store_decoded(decoded);
            }
            Err(e) => {
                failed += 1;
                report_file_failure(&path, &e);
            }
        }
    }

    if let Some(export_path) = export {
        match navigator.take_decoded() {
            Some(decoded) => match file_ops::export_image(&decoded, export_path) {
                Ok(()) => println!("exported {}", export_path.display()),
                Err(e) => {
                    failed += 1;
                    report_file_failure(export_path, &e);
                }
            },
            None => {
                failed += 1;
                log::error!("nothing to export: no image was decoded successfully");
            }
        }
    }

    failed
}

fn parse_viewport(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width: u32 = width
        .parse()
        .map_err(|_| format!("invalid viewport width '{}'", width))?;
    let height: u32 = height
        .parse()
        .map_err(|_| format!("invalid viewport height '{}'", height))?;
    if width == 0 || height == 0 {
        return Err("viewport dimensions must be positive".to_string());
    }
    Ok((width, height))
}

/// Each failure names the offending file path and the error kind; the run
/// then continues with the next file.
fn report_file_failure(path: &std::path::Path, err: &ShadeboxError) {
    let kind = err
        .kind
        .map(|k| format!("{:?}", k))
        .unwrap_or_else(|| "Error".to_string());
    log::error!("{}: [{}] {}", path.display(), kind, render(err));
}

/// Renders the error message followed by its source chain.
fn render(err: &ShadeboxError) -> String {
    let mut message = err.message().to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
