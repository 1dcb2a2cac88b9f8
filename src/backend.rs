//! The mesh processing capabilities the conversion pipeline depends on.

use std::path::Path;

use tracing::debug;

use crate::clean::clean;
use crate::convert_error::{ConvertError, Direction};
use crate::format::{Encoding, MeshFormat};
use crate::mesh::Mesh;
use crate::triangulate::triangulate;

/// Narrow interface over loading, cleaning, triangulating and saving meshes.
///
/// [`crate::pipeline::convert`] only calls these four operations, so it can run against
/// [`NativeBackend`] or against a test double.
pub trait MeshBackend {
    /// Loads the file at `path`, which is known to exist, as `format`.
    fn load(&self, path: &Path, format: MeshFormat) -> Result<Mesh, ConvertError>;

    /// Merges duplicate points and removes unused points and degenerate cells.
    fn clean(&self, mesh: Mesh) -> Mesh;

    /// Converts all polygons and strips into triangles.
    fn triangulate(&self, mesh: Mesh) -> Mesh;

    /// Writes the mesh to `path` as `format`. Formats without a binary variant ignore
    /// `encoding`.
    fn save(&self, mesh: &Mesh, path: &Path, format: MeshFormat, encoding: Encoding) -> Result<(), ConvertError>;
}

/// Backend built on the codecs of the format table and the geometry module.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeBackend;

impl MeshBackend for NativeBackend {
    fn load(&self, path: &Path, format: MeshFormat) -> Result<Mesh, ConvertError> {
        let descriptor = format.descriptor();
        let reader = descriptor.reader.ok_or_else(|| ConvertError::UnsupportedFormat {
            extension: descriptor.extension.to_string(),
            direction: Direction::Read,
        })?;
        reader(path)
    }

    fn clean(&self, mesh: Mesh) -> Mesh {
        let (cleaned, report) = clean(&mesh);
        debug!(
            "cleanup merged {} points, removed {} cells and {} unused points",
            report.merged_points, report.removed_cells, report.removed_points
        );
        cleaned
    }

    fn triangulate(&self, mesh: Mesh) -> Mesh {
        triangulate(mesh)
    }

    fn save(&self, mesh: &Mesh, path: &Path, format: MeshFormat, encoding: Encoding) -> Result<(), ConvertError> {
        let descriptor = format.descriptor();
        let writer = descriptor.writer.ok_or_else(|| ConvertError::UnsupportedFormat {
            extension: descriptor.extension.to_string(),
            direction: Direction::Write,
        })?;
        writer(mesh, path, encoding)
    }
}
