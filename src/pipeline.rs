//! One conversion: validate the request, read, normalize, write.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::backend::MeshBackend;
use crate::convert_error::ConvertError;
use crate::format::{Encoding, FormatDescriptor, MeshFormat, extension_of, resolve_reader, resolve_writer};

/// Everything a single conversion needs. Built once from the command line and not
/// changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    input: PathBuf,
    output: PathBuf,
    clean: bool,
    encoding: Encoding,
    verbose: bool,
}

impl ConversionRequest {
    /// Request with the defaults: cleanup on, binary output, quiet.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        ConversionRequest {
            input: input.into(),
            output: output.into(),
            clean: true,
            encoding: Encoding::Binary,
            verbose: false,
        }
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn clean(&self) -> bool {
        self.clean
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// Summary of a finished conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub input_format: MeshFormat,
    pub output_format: MeshFormat,
    pub polygons_read: usize,
    pub cleaned: bool,
    pub points_written: usize,
    pub triangles_written: usize,
}

/// Checks done before any file is opened, in this order: both paths given, input
/// exists, output directory exists, both extensions supported.
pub fn preflight(
    request: &ConversionRequest,
) -> Result<(&'static FormatDescriptor, &'static FormatDescriptor), ConvertError> {
    if request.input.as_os_str().is_empty() {
        return Err(ConvertError::UsageError("INFILE not specified (-i)".to_string()));
    }
    if request.output.as_os_str().is_empty() {
        return Err(ConvertError::UsageError("OUTFILE not specified (-o)".to_string()));
    }
    if !request.input.exists() {
        return Err(ConvertError::FileNotFound(request.input.clone()));
    }
    if let Some(dir) = request.output.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.is_dir() {
            return Err(ConvertError::DirectoryNotFound(dir.to_path_buf()));
        }
    }

    let reader = resolve_reader(&extension_of(&request.input))?;
    let writer = resolve_writer(&extension_of(&request.output))?;
    Ok((reader, writer))
}

/// Runs the whole conversion described by `request` on `backend`.
///
/// Any failure aborts the conversion and is returned as is. Nothing is written unless
/// reading and normalization succeeded.
pub fn convert<B: MeshBackend + ?Sized>(
    backend: &B,
    request: &ConversionRequest,
) -> Result<ConversionReport, ConvertError> {
    let (reader, writer) = preflight(request)?;

    let mesh = backend.load(&request.input, reader.format)?;
    let polygons_read = mesh.n_polys();
    info!("read {} polygons from file {}", polygons_read, request.input.display());

    let mesh = if request.clean {
        let cleaned = backend.clean(mesh);
        info!("cleaned poly data");
        cleaned
    } else {
        mesh
    };

    let mesh = backend.triangulate(mesh);
    info!("finished reading {}", request.input.display());

    if writer.has_binary() {
        info!("setting output to {}", request.encoding);
    } else {
        debug!("{} has no binary variant, ignoring {} encoding", writer.name, request.encoding);
    }
    backend.save(&mesh, &request.output, writer.format, request.encoding)?;
    info!("wrote {}", request.output.display());

    Ok(ConversionReport {
        input_format: reader.format,
        output_format: writer.format,
        polygons_read,
        cleaned: request.clean,
        points_written: mesh.n_points(),
        triangles_written: mesh.n_polys(),
    })
}
