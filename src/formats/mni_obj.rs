//! BIC/MNI polygon object files (`.obj`), not to be confused with Wavefront OBJ.
//!
//! ```text
//! P ambient diffuse specular shininess transparency n_points
//! x y z            (n_points times)
//! nx ny nz         (n_points times)
//! n_items
//! colour_flag colours...
//! end_indices      (n_items cumulative counts)
//! indices
//! ```
//!
//! The binary variant starts with `p` and stores the same fields big-endian: surface
//! properties and coordinates as `f32`, counts and indices as `i32`, colours as four
//! bytes each.

use std::io::{self, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::byte_cursor::{ByteCursor, checked_count, to_index};
use crate::convert_error::ConvertError;
use crate::format::{Encoding, read_with, write_with};
use crate::mesh::{Cell, Mesh};

/// Ambient, diffuse, specular, shininess and transparency written for every object.
const SURFACE_PROPERTIES: [f32; 5] = [0.3, 0.3, 0.4, 10.0, 1.0];

/// How many colours follow the colour flag.
fn colour_count(flag: i32, n_items: usize, n_points: usize) -> Result<usize, String> {
    match flag {
        0 => Ok(1),
        1 => Ok(n_items),
        2 => Ok(n_points),
        other => Err(format!("invalid colour flag {}", other)),
    }
}

pub fn read_mni_obj(path: &Path) -> Result<Mesh, ConvertError> {
    read_with(path, decode_mni_obj)
}

pub fn write_mni_obj(mesh: &Mesh, path: &Path, encoding: Encoding) -> Result<(), ConvertError> {
    write_with(path, |out| encode_mni_obj(mesh, out, encoding))
}

pub fn decode_mni_obj(data: &[u8]) -> Result<Mesh, String> {
    match data.first() {
        Some(b'p') => decode_binary(&mut ByteCursor::new(&data[1..])),
        Some(_) => {
            let mut cursor = ByteCursor::new(data);
            match cursor.expect_token("object class")? {
                "P" => decode_ascii(&mut cursor),
                other => Err(format!("only polygon objects are supported, found class '{}'", other)),
            }
        }
        None => Err("empty file".to_string()),
    }
}

fn decode_ascii(cursor: &mut ByteCursor) -> Result<Mesh, String> {
    for _ in 0..SURFACE_PROPERTIES.len() {
        cursor.parse::<f64>("surface property")?;
    }
    let n_points = to_index(cursor.parse("point count")?, "point count")?;

    let mut points = Vec::new();
    for _ in 0..n_points {
        points.push(Point3::new(
            cursor.parse("x coordinate")?,
            cursor.parse("y coordinate")?,
            cursor.parse("z coordinate")?,
        ));
    }
    for _ in 0..checked_count(n_points, 3, "normal")? {
        cursor.parse::<f64>("normal component")?;
    }

    let n_items = to_index(cursor.parse("polygon count")?, "polygon count")?;
    let flag: i32 = cursor.parse("colour flag")?;
    for _ in 0..checked_count(colour_count(flag, n_items, n_points)?, 4, "colour")? {
        cursor.parse::<f64>("colour component")?;
    }

    let mut ends = Vec::new();
    for _ in 0..n_items {
        ends.push(to_index(cursor.parse("end index")?, "end index")?);
    }
    let total = ends.last().copied().unwrap_or(0);
    let mut indices = Vec::new();
    for _ in 0..total {
        indices.push(to_index(cursor.parse("vertex index")?, "vertex index")?);
    }

    Ok(Mesh { points, polygons: split_by_ends(&ends, &indices)?, strips: Vec::new() })
}

fn decode_binary(cursor: &mut ByteCursor) -> Result<Mesh, String> {
    for _ in 0..SURFACE_PROPERTIES.len() {
        cursor.be_f32("surface property")?;
    }
    let n_points = to_index(cursor.be_i32("point count")? as i64, "point count")?;

    let mut points = Vec::new();
    for _ in 0..n_points {
        points.push(Point3::new(
            cursor.be_f32("x coordinate")? as f64,
            cursor.be_f32("y coordinate")? as f64,
            cursor.be_f32("z coordinate")? as f64,
        ));
    }
    cursor.bytes(checked_count(n_points, 3 * 4, "normal")?, "normals")?;

    let n_items = to_index(cursor.be_i32("polygon count")? as i64, "polygon count")?;
    let flag = cursor.be_i32("colour flag")?;
    cursor.bytes(checked_count(colour_count(flag, n_items, n_points)?, 4, "colour")?, "colours")?;

    let mut ends = Vec::new();
    for _ in 0..n_items {
        ends.push(to_index(cursor.be_i32("end index")? as i64, "end index")?);
    }
    let total = ends.last().copied().unwrap_or(0);
    let mut indices = Vec::new();
    for _ in 0..total {
        indices.push(to_index(cursor.be_i32("vertex index")? as i64, "vertex index")?);
    }

    Ok(Mesh { points, polygons: split_by_ends(&ends, &indices)?, strips: Vec::new() })
}

fn split_by_ends(ends: &[usize], indices: &[usize]) -> Result<Vec<Cell>, String> {
    let mut start = 0;
    let mut polygons = Vec::with_capacity(ends.len());
    for &end in ends {
        let ids = indices
            .get(start..end)
            .ok_or_else(|| format!("end indices are not increasing at {}", end))?;
        polygons.push(ids.to_vec());
        start = end;
    }
    Ok(polygons)
}

pub fn encode_mni_obj<W: Write>(mesh: &Mesh, out: &mut W, encoding: Encoding) -> io::Result<()> {
    let normals = mesh.vertex_normals();
    let mut ends = Vec::with_capacity(mesh.n_polys());
    let mut total = 0;
    for polygon in &mesh.polygons {
        total += polygon.len();
        ends.push(to_i32(total)?);
    }
    let indices = mesh
        .polygons
        .iter()
        .flatten()
        .map(|&i| to_i32(i))
        .collect::<io::Result<Vec<i32>>>()?;

    match encoding {
        Encoding::Ascii => {
            write!(out, "P")?;
            for p in SURFACE_PROPERTIES {
                write!(out, " {}", p)?;
            }
            writeln!(out, " {}", mesh.n_points())?;
            for p in &mesh.points {
                writeln!(out, " {} {} {}", p.x as f32, p.y as f32, p.z as f32)?;
            }
            writeln!(out)?;
            for n in &normals {
                writeln!(out, " {} {} {}", n.x as f32, n.y as f32, n.z as f32)?;
            }
            writeln!(out)?;
            writeln!(out, " {}", mesh.n_polys())?;
            writeln!(out, " 0 1 1 1 1")?;
            writeln!(out)?;
            write_rows(out, &ends)?;
            writeln!(out)?;
            write_rows(out, &indices)
        }
        Encoding::Binary => {
            out.write_all(b"p")?;
            for p in SURFACE_PROPERTIES {
                out.write_all(&p.to_be_bytes())?;
            }
            out.write_all(&to_i32(mesh.n_points())?.to_be_bytes())?;
            for p in &mesh.points {
                for c in [p.x, p.y, p.z] {
                    out.write_all(&(c as f32).to_be_bytes())?;
                }
            }
            for n in &normals {
                for c in [n.x, n.y, n.z] {
                    out.write_all(&(c as f32).to_be_bytes())?;
                }
            }
            out.write_all(&to_i32(mesh.n_polys())?.to_be_bytes())?;
            out.write_all(&0i32.to_be_bytes())?;
            out.write_all(&[255u8, 255, 255, 255])?;
            for v in ends.iter().chain(indices.iter()) {
                out.write_all(&v.to_be_bytes())?;
            }
            Ok(())
        }
    }
}

/// Eight values per line.
fn write_rows<W: Write>(out: &mut W, values: &[i32]) -> io::Result<()> {
    for row in values.chunks(8) {
        for v in row {
            write!(out, " {}", v)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn to_i32(value: usize) -> io::Result<i32> {
    i32::try_from(value).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("{} does not fit a 32 bit index", value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEXAGON: &str = "P 0.3 0.3 0.4 10 1 6
 0 0 0
 1 0 0
 1.5 1 0
 1 2 0
 0 2 0
 -0.5 1 0

 0 0 1  0 0 1  0 0 1
 0 0 1  0 0 1  0 0 1

 2
 1 1 0 0 1 0 0 1 1

 3 6

 0 1 2 0 2 3
";

    #[test]
    fn test_reads_per_item_colours() {
        let mesh = decode_mni_obj(HEXAGON.as_bytes()).expect("valid object");
        assert_eq!(mesh.n_points(), 6);
        assert_eq!(mesh.points[2], Point3::new(1.5, 1.0, 0.0));
        assert_eq!(mesh.polygons, vec![vec![0, 1, 2], vec![0, 2, 3]]);
    }

    #[test]
    fn test_ascii_and_binary_read_back() {
        let mesh = Mesh {
            points: vec![Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0),
                         Point3::new(2.0, 2.0, 0.0), Point3::new(0.0, 2.0, 0.5)],
            polygons: vec![vec![0, 1, 2], vec![0, 2, 3]],
            strips: vec![],
        };
        for encoding in [Encoding::Ascii, Encoding::Binary] {
            let mut buffer = Vec::new();
            encode_mni_obj(&mesh, &mut buffer, encoding).expect("encode");
            assert_eq!(buffer[0], if encoding == Encoding::Ascii { b'P' } else { b'p' });
            let decoded = decode_mni_obj(&buffer).expect("decode own output");
            assert_eq!(decoded, mesh, "{:?}", encoding);
        }
    }

    #[test]
    fn test_huge_counts_are_parse_errors() {
        let points = "P 0.3 0.3 0.4 10 1 1000000000000000\n0 0 0\n";
        assert!(decode_mni_obj(points.as_bytes()).unwrap_err().contains("end of data"));

        let normals = "P 0.3 0.3 0.4 10 1 9223372036854775807\n";
        assert!(decode_mni_obj(normals.as_bytes()).is_err());

        let items = "P 0.3 0.3 0.4 10 1 1\n0 0 0\n0 0 1\n1000000000000000 0 1 1 1 1\n3\n";
        assert!(decode_mni_obj(items.as_bytes()).unwrap_err().contains("end of data"));

        let mut binary = vec![b'p'];
        for p in SURFACE_PROPERTIES {
            binary.extend_from_slice(&p.to_be_bytes());
        }
        binary.extend_from_slice(&i32::MAX.to_be_bytes());
        assert!(decode_mni_obj(&binary).unwrap_err().contains("end of data"));
    }

    #[test]
    fn test_rejects_other_objects_and_bad_ends() {
        let lines = "L 1 2\n";
        assert!(decode_mni_obj(lines.as_bytes()).unwrap_err().contains("'L'"));
        let bad = "P 0.3 0.3 0.4 10 1 3\n0 0 0 1 0 0 0 1 0\n0 0 1 0 0 1 0 0 1\n2\n0 1 1 1 1\n3 2\n0 1 2\n";
        assert!(decode_mni_obj(bad.as_bytes()).is_err());
    }
}
