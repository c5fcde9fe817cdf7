//! Command-line driver surfaces for the three tools.
//!
//! The binaries are thin shells: argument parsing and exit-code mapping live
//! there, the actual work happens in the `run_*` functions here. Exit codes
//! are 0 on success, 1 on usage errors and 2 on runtime errors.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::codec::{decode_from_container, encode_to_container};
use crate::error::{McdcError, Result};
use crate::io::{load_medical, save_pgm};
use crate::metrics::{distortion, error_map};
use crate::Image;

/// Arguments for the `encode` tool.
#[derive(Parser, Debug)]
#[command(name = "encode")]
#[command(version)]
#[command(about = "Compress a medical image into an MCDC container")]
pub struct EncodeArgs {
    /// Input image (uncompressed grayscale DICOM or PGM P5)
    #[arg(long = "in", value_name = "PATH")]
    pub input: PathBuf,

    /// Output MCDC file
    #[arg(long = "out", value_name = "PATH")]
    pub output: PathBuf,

    /// Quantization quality (1 = coarsest, 100 = finest)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=100))]
    pub quality: u16,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `decode` tool.
#[derive(Parser, Debug)]
#[command(name = "decode")]
#[command(version)]
#[command(about = "Decode an MCDC container into a PGM image")]
pub struct DecodeArgs {
    /// Input MCDC file
    #[arg(long = "in", value_name = "PATH")]
    pub input: PathBuf,

    /// Output PGM file (written at the stored bit depth)
    #[arg(long = "out", value_name = "PATH")]
    pub output: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `evaluate` tool.
#[derive(Parser, Debug)]
#[command(name = "evaluate")]
#[command(version)]
#[command(about = "Encode, decode and measure distortion across qualities")]
pub struct EvaluateArgs {
    /// Reference image (uncompressed grayscale DICOM or PGM P5)
    #[arg(long = "ref", value_name = "PATH")]
    pub reference: PathBuf,

    /// Qualities to evaluate (at least three; the first three are used)
    #[arg(long, num_args = 3.., value_parser = clap::value_parser!(u16).range(1..=100))]
    pub quality: Vec<u16>,

    /// Directory for intermediate MCDC files
    #[arg(long = "tmp_dir", value_name = "DIR")]
    pub tmp_dir: PathBuf,

    /// Output CSV with one row per quality
    #[arg(long = "out", value_name = "PATH")]
    pub out_csv: PathBuf,

    /// Directory for reconstruction and error-map figures
    #[arg(long = "fig_dir", value_name = "DIR")]
    pub fig_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Initialize logging for a driver run.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .try_init();
}

/// Run the `encode` driver.
pub fn run_encode(args: EncodeArgs) -> Result<()> {
    init_logging(args.verbose, args.quiet);

    let image = load_medical(&args.input)?;
    let raw_size = image.pixels.len() * usize::from(image.bits_allocated / 8);
    let bytes = encode_to_container(&image, args.quality)?;
    fs::write(&args.output, &bytes)?;

    if !args.quiet {
        println!("input raw size: {} bytes", raw_size);
        println!("Wrote: {} ({} bytes)", args.output.display(), bytes.len());
    }
    Ok(())
}

/// Run the `decode` driver.
pub fn run_decode(args: DecodeArgs) -> Result<()> {
    init_logging(args.verbose, args.quiet);

    let bytes = fs::read(&args.input)?;
    let image = decode_from_container(&bytes)?;
    save_pgm(&args.output, &image)?;

    if !args.quiet {
        println!("Wrote: {}", args.output.display());
    }
    Ok(())
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string()
}

fn check_reconstruction(reference: &Image, reconstruction: &Image) -> Result<()> {
    if reconstruction.width != reference.width
        || reconstruction.height != reference.height
        || reconstruction.channels != reference.channels
    {
        return Err(McdcError::Validation(
            "decoded dimensions do not match the reference".to_string(),
        ));
    }
    if reconstruction.bits_stored != reference.bits_stored {
        return Err(McdcError::Validation(
            "decoded bits_stored does not match the reference".to_string(),
        ));
    }
    if reconstruction.is_signed != reference.is_signed {
        return Err(McdcError::Validation(
            "decoded signedness does not match the reference".to_string(),
        ));
    }
    Ok(())
}

/// Run the `evaluate` driver: encode → decode → metrics and figures.
pub fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    init_logging(args.verbose, args.quiet);

    // clap enforces at least three; the original evaluator uses the first three
    let qualities = &args.quality[..3];

    fs::create_dir_all(&args.tmp_dir)?;
    fs::create_dir_all(&args.fig_dir)?;

    let reference = load_medical(&args.reference)?;
    let raw_bytes =
        reference.pixels.len() as u64 * u64::from(reference.bits_allocated / 8);
    let stem = stem_of(&args.reference);

    // dump the reference at its original bit depth alongside the figures
    save_pgm(args.fig_dir.join(format!("{}_ref.pgm", stem)), &reference)?;

    let mut csv = fs::File::create(&args.out_csv)?;
    writeln!(
        csv,
        "quality,block_size,compressed_bytes,bpp,raw_bytes,compression_ratio,rmse,psnr"
    )?;

    for &quality in qualities {
        let container_path = args.tmp_dir.join(format!("{}_q{}.mcdc", stem, quality));
        let bytes = encode_to_container(&reference, quality)?;
        fs::write(&container_path, &bytes)?;
        let compressed_bytes = bytes.len() as u64;

        let bpp = 8.0 * compressed_bytes as f64
            / (f64::from(reference.width) * f64::from(reference.height));
        let ratio = if compressed_bytes > 0 {
            raw_bytes as f64 / compressed_bytes as f64
        } else {
            0.0
        };

        let reconstruction = decode_from_container(&bytes)?;
        check_reconstruction(&reference, &reconstruction)?;
        let d = distortion(&reference, &reconstruction)?;

        save_pgm(
            args.fig_dir.join(format!("{}_q{}_recon.pgm", stem, quality)),
            &reconstruction,
        )?;
        save_pgm(
            args.fig_dir.join(format!("{}_q{}_err.pgm", stem, quality)),
            &error_map(&reference, &reconstruction)?,
        )?;

        writeln!(
            csv,
            "{},{},{},{},{},{},{},{}",
            quality, 8, compressed_bytes, bpp, raw_bytes, ratio, d.rmse, d.psnr_db
        )?;
        log::info!(
            "quality {}: {} bytes, {:.3} bpp, {}",
            quality,
            compressed_bytes,
            bpp,
            d
        );
    }

    if !args.quiet {
        println!("Evaluation completed -> {}", args.out_csv.display());
    }
    Ok(())
}
