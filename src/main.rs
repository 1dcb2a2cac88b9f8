use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use meshconvert::backend::NativeBackend;
use meshconvert::convert_error::ConvertError;
use meshconvert::format::Encoding;
use meshconvert::pipeline::{ConversionRequest, convert};
use tracing::{Level, info};

/// Convert between mesh file formats.
///
/// Reads STL, VTK, OBJ (BIC object) and PLY, writes the same formats and MNI tag
/// point files. The formats are chosen by file name extension.
#[derive(Parser, Debug)]
#[command(
    name = "meshconvert",
    version,
    about,
    long_about,
    after_help = "Example:\n  meshconvert -v --ascii -i foo.vtk -o bar.stl"
)]
struct Cli {
    #[arg(short = 'i', long = "input", value_name = "INFILE", help = "input mesh (stl, vtk, obj, ply)")]
    input: PathBuf,

    #[arg(short = 'o', long = "output", value_name = "OUTFILE", help = "output mesh (stl, vtk, obj, ply, tag)")]
    output: PathBuf,

    #[arg(short = 'a', long = "ascii", help = "save in ascii format")]
    ascii: bool,

    #[arg(long = "noclean", help = "keep duplicate points and degenerate data")]
    noclean: bool,

    #[arg(short = 'v', long = "verbose", help = "more verbose output")]
    verbose: bool,
}

impl Cli {
    fn into_request(self) -> ConversionRequest {
        let encoding = if self.ascii { Encoding::Ascii } else { Encoding::Binary };
        ConversionRequest::new(self.input, self.output)
            .with_clean(!self.noclean)
            .with_encoding(encoding)
            .with_verbose(self.verbose)
    }
}

/// Stage diagnostics go to standard output, plain, without timestamps.
fn init_logging(verbose: bool) {
    let level = if verbose { Level::INFO } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stdout)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .with_level(false)
        .init();
}

fn run(request: &ConversionRequest) -> Result<()> {
    let report = convert(&NativeBackend, request).with_context(|| {
        format!(
            "cannot convert {} to {}",
            request.input().display(),
            request.output().display()
        )
    })?;
    info!(
        "{} -> {}: {} polygons read, {} points and {} triangles written",
        report.input_format,
        report.output_format,
        report.polygons_read,
        report.points_written,
        report.triangles_written
    );
    Ok(())
}

/// 2 for usage errors, as clap uses for its own, 1 for any other failure.
fn exit_status(err: &anyhow::Error) -> u8 {
    let usage = err
        .downcast_ref::<ConvertError>()
        .is_some_and(ConvertError::is_usage);
    if usage { 2 } else { 1 }
}

fn main() -> ExitCode {
    let request = Cli::parse().into_request();
    init_logging(request.verbose());

    match run(&request) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("meshconvert: {:#}", err);
            ExitCode::from(exit_status(&err))
        }
    }
}
