//! STL reading and writing. Reading and binary output go through `stl_io`, ASCII
//! output is written directly.

use std::io::{self, Cursor, Write};
use std::path::Path;

use nalgebra::Point3;
use stl_io::{Normal, Triangle, Vertex};

use crate::convert_error::ConvertError;
use crate::format::{Encoding, read_with, write_with};
use crate::mesh::Mesh;

const SOLID_NAME: &str = "meshconvert";

/// Reads ASCII or binary STL. Facet corners at identical coordinates are indexed as
/// one point by `stl_io`; facet normals are dropped.
pub fn read_stl(path: &Path) -> Result<Mesh, ConvertError> {
    read_with(path, decode_stl)
}

pub fn decode_stl(data: &[u8]) -> Result<Mesh, String> {
    let stl = stl_io::read_stl(&mut Cursor::new(data)).map_err(|e| e.to_string())?;

    let points = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();
    let polygons = stl
        .faces
        .iter()
        .map(|face| face.vertices.to_vec())
        .collect();

    Ok(Mesh { points, polygons, strips: Vec::new() })
}

pub fn write_stl(mesh: &Mesh, path: &Path, encoding: Encoding) -> Result<(), ConvertError> {
    if !mesh.is_triangulated() {
        return Err(ConvertError::write(path, "STL can only store triangles"));
    }
    write_with(path, |out| encode_stl(mesh, out, encoding))
}

pub fn encode_stl<W: Write>(mesh: &Mesh, out: &mut W, encoding: Encoding) -> io::Result<()> {
    let triangles: Vec<Triangle> = mesh.triangles().map(|t| to_facet(mesh, t)).collect();
    match encoding {
        Encoding::Binary => stl_io::write_stl(out, triangles.iter()),
        Encoding::Ascii => write_ascii(out, &triangles),
    }
}

fn to_facet(mesh: &Mesh, t: [usize; 3]) -> Triangle {
    let n = mesh.polygon_normal(&t);
    let corner = |i: usize| {
        let p = &mesh.points[t[i]];
        Vertex::new([p.x as f32, p.y as f32, p.z as f32])
    };
    Triangle {
        normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
        vertices: [corner(0), corner(1), corner(2)],
    }
}

fn write_ascii<W: Write>(out: &mut W, triangles: &[Triangle]) -> io::Result<()> {
    writeln!(out, "solid {}", SOLID_NAME)?;
    for t in triangles {
        writeln!(out, "  facet normal {:e} {:e} {:e}", t.normal[0], t.normal[1], t.normal[2])?;
        writeln!(out, "    outer loop")?;
        for v in &t.vertices {
            writeln!(out, "      vertex {:e} {:e} {:e}", v[0], v[1], v[2])?;
        }
        writeln!(out, "    endloop")?;
        writeln!(out, "  endfacet")?;
    }
    writeln!(out, "endsolid {}", SOLID_NAME)
}
