//! MNI tag point files. Only the points of the mesh are written; the format has no
//! connectivity and no binary variant, and there is no reader.

use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::convert_error::ConvertError;
use crate::format::{Encoding, write_with};
use crate::mesh::Mesh;

/// Writes every point as a tag. `encoding` is accepted for a uniform writer signature
/// and ignored.
pub fn write_tag(mesh: &Mesh, path: &Path, encoding: Encoding) -> Result<(), ConvertError> {
    if encoding == Encoding::Binary {
        debug!("tag point files have no binary variant, writing text");
    }
    write_with(path, |out| encode_tag(mesh, out))
}

pub fn encode_tag<W: Write>(mesh: &Mesh, out: &mut W) -> io::Result<()> {
    writeln!(out, "MNI Tag Point File")?;
    writeln!(out, "Volumes = 1;")?;
    writeln!(out, "% {} points written by meshconvert", mesh.n_points())?;
    writeln!(out)?;
    write!(out, "Points =")?;
    for p in &mesh.points {
        write!(out, "\n {} {} {}", p.x, p.y, p.z)?;
    }
    writeln!(out, ";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_last_point_closes_the_list() {
        let mesh = Mesh::from_triangles(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.5, 0.0, 0.0), Point3::new(0.0, -2.0, 3.25)],
            &[[0, 1, 2]],
        );
        let mut buffer = Vec::new();
        encode_tag(&mesh, &mut buffer).expect("encode");
        let text = String::from_utf8(buffer).expect("text");
        assert!(text.starts_with("MNI Tag Point File\nVolumes = 1;\n"));
        assert!(text.ends_with("Points =\n 0 0 0\n 1.5 0 0\n 0 -2 3.25;\n"), "{}", text);
    }

    #[test]
    fn test_encoding_does_not_change_output() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mesh = Mesh::from_triangles(
            vec![Point3::new(1.0, 2.0, 3.0), Point3::new(4.0, 5.0, 6.0), Point3::new(7.0, 8.0, 9.0)],
            &[[0, 1, 2]],
        );
        let binary = dir.path().join("binary.tag");
        let ascii = dir.path().join("ascii.tag");
        write_tag(&mesh, &binary, Encoding::Binary).expect("write binary request");
        write_tag(&mesh, &ascii, Encoding::Ascii).expect("write ascii request");
        assert_eq!(
            std::fs::read(&binary).expect("read"),
            std::fs::read(&ascii).expect("read")
        );
    }
}
