//! Legacy VTK PolyData files (`.vtk`), ASCII and big-endian binary.
//!
//! Reading understands the classic cell layout (`POLYGONS n size` followed by
//! `count id id ...` records) as well as the 5.x layout with `OFFSETS` and
//! `CONNECTIVITY` arrays. Only surface cells are kept; vertex and line cells are read
//! and dropped, point and cell attributes are ignored. Writing always produces the
//! classic layout.

use std::io::{self, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::byte_cursor::{ByteCursor, checked_count, to_index};
use crate::convert_error::ConvertError;
use crate::format::{Encoding, read_with, write_with};
use crate::mesh::{Cell, Mesh};

const HEADER: &str = "# vtk DataFile Version 4.2";
const TITLE: &str = "vtk output";

pub fn read_vtk(path: &Path) -> Result<Mesh, ConvertError> {
    read_with(path, decode_vtk)
}

pub fn write_vtk(mesh: &Mesh, path: &Path, encoding: Encoding) -> Result<(), ConvertError> {
    write_with(path, |out| encode_vtk(mesh, out, encoding))
}

/// Data types that may appear after `POINTS`, `OFFSETS` and `CONNECTIVITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl ScalarType {
    fn parse(name: &str) -> Result<Self, String> {
        Ok(match name.to_ascii_lowercase().as_str() {
            "char" | "vtktypeint8" => ScalarType::I8,
            "unsigned_char" | "vtktypeuint8" => ScalarType::U8,
            "short" | "vtktypeint16" => ScalarType::I16,
            "unsigned_short" | "vtktypeuint16" => ScalarType::U16,
            "int" | "vtktypeint32" => ScalarType::I32,
            "unsigned_int" | "vtktypeuint32" => ScalarType::U32,
            "long" | "vtktypeint64" | "vtkidtype" => ScalarType::I64,
            "unsigned_long" | "vtktypeuint64" => ScalarType::U64,
            "float" | "vtktypefloat32" => ScalarType::F32,
            "double" | "vtktypefloat64" => ScalarType::F64,
            other => return Err(format!("unsupported data type '{}'", other)),
        })
    }

    fn size(self) -> usize {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::I64 | ScalarType::U64 | ScalarType::F64 => 8,
        }
    }

    /// Decodes one big-endian value.
    fn decode(self, b: &[u8]) -> f64 {
        match self {
            ScalarType::I8 => b[0] as i8 as f64,
            ScalarType::U8 => b[0] as f64,
            ScalarType::I16 => i16::from_be_bytes([b[0], b[1]]) as f64,
            ScalarType::U16 => u16::from_be_bytes([b[0], b[1]]) as f64,
            ScalarType::I32 => i32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64,
            ScalarType::U32 => u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64,
            ScalarType::F32 => f32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64,
            ScalarType::I64 => i64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f64,
            ScalarType::U64 => u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f64,
            ScalarType::F64 => f64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
        }
    }
}

pub fn decode_vtk(data: &[u8]) -> Result<Mesh, String> {
    let mut cursor = ByteCursor::new(data);

    let version = cursor.line().ok_or("empty file")?;
    if !version.starts_with("# vtk DataFile") {
        return Err(format!("not a legacy VTK file, first line is '{}'", version));
    }
    cursor.line().ok_or("missing title line")?;

    let binary = match cursor.expect_token("ASCII or BINARY")?.to_ascii_uppercase().as_str() {
        "ASCII" => false,
        "BINARY" => true,
        other => return Err(format!("unknown file type '{}'", other)),
    };

    let keyword = cursor.expect_token("DATASET")?;
    if !keyword.eq_ignore_ascii_case("DATASET") {
        return Err(format!("expected DATASET, found '{}'", keyword));
    }
    let dataset = cursor.expect_token("dataset type")?;
    if !dataset.eq_ignore_ascii_case("POLYDATA") {
        return Err(format!("only POLYDATA datasets are supported, found '{}'", dataset));
    }

    let mut mesh = Mesh::new();
    while let Some(keyword) = cursor.token() {
        match keyword.to_ascii_uppercase().as_str() {
            "POINTS" => {
                let n: usize = cursor.parse("point count")?;
                let ty = ScalarType::parse(cursor.expect_token("point data type")?)?;
                let count = checked_count(n, 3, "point")?;
                let values = read_values(&mut cursor, count, ty, binary, "point coordinates")?;
                mesh.points = values
                    .chunks_exact(3)
                    .map(|c| Point3::new(c[0], c[1], c[2]))
                    .collect();
            }
            "POLYGONS" => mesh.polygons = read_cells(&mut cursor, binary)?,
            "TRIANGLE_STRIPS" => mesh.strips = read_cells(&mut cursor, binary)?,
            "VERTICES" | "LINES" => {
                read_cells(&mut cursor, binary)?;
            }
            "METADATA" => skip_metadata(&mut cursor),
            "POINT_DATA" | "CELL_DATA" | "FIELD" => break,
            other => return Err(format!("unexpected keyword '{}'", other)),
        }
    }
    Ok(mesh)
}

fn read_values(
    cursor: &mut ByteCursor,
    count: usize,
    ty: ScalarType,
    binary: bool,
    what: &str,
) -> Result<Vec<f64>, String> {
    if binary {
        cursor.skip_line_end();
        let bytes = cursor.bytes(checked_count(count, ty.size(), what)?, what)?;
        Ok(bytes.chunks_exact(ty.size()).map(|b| ty.decode(b)).collect())
    } else {
        // Counts come from the file, so grow with the data actually present
        let mut values = Vec::new();
        for _ in 0..count {
            values.push(cursor.parse::<f64>(what)?);
        }
        Ok(values)
    }
}

fn read_indices(
    cursor: &mut ByteCursor,
    count: usize,
    ty: ScalarType,
    binary: bool,
    what: &str,
) -> Result<Vec<usize>, String> {
    read_values(cursor, count, ty, binary, what)?
        .into_iter()
        .map(|v| {
            if v.fract() != 0.0 {
                return Err(format!("non-integer {}: {}", what, v));
            }
            to_index(v as i64, what)
        })
        .collect()
}

fn read_cells(cursor: &mut ByteCursor, binary: bool) -> Result<Vec<Cell>, String> {
    let n: usize = cursor.parse("cell count")?;
    let size: usize = cursor.parse("cell list size")?;

    let modern = cursor
        .peek_token()
        .is_some_and(|t| t.eq_ignore_ascii_case("OFFSETS"));
    if !modern {
        let values = read_indices(cursor, size, ScalarType::I32, binary, "cell list")?;
        return split_counted(&values, n);
    }

    // Since 5.0 the first number counts offsets, one more than there are cells
    cursor.token();
    let ty = ScalarType::parse(cursor.expect_token("offsets data type")?)?;
    let offsets = read_indices(cursor, n, ty, binary, "offsets")?;

    let keyword = cursor.expect_token("CONNECTIVITY")?;
    if !keyword.eq_ignore_ascii_case("CONNECTIVITY") {
        return Err(format!("expected CONNECTIVITY, found '{}'", keyword));
    }
    let ty = ScalarType::parse(cursor.expect_token("connectivity data type")?)?;
    let connectivity = read_indices(cursor, size, ty, binary, "connectivity")?;

    offsets
        .windows(2)
        .map(|w| {
            connectivity
                .get(w[0]..w[1])
                .map(|ids| ids.to_vec())
                .ok_or_else(|| format!("invalid cell offsets {}..{}", w[0], w[1]))
        })
        .collect()
}

/// Splits `count id id ... count id ...` records.
fn split_counted(values: &[usize], n: usize) -> Result<Vec<Cell>, String> {
    let mut cells = Vec::with_capacity(n.min(values.len()));
    let mut k = 0;
    for c in 0..n {
        let count = *values
            .get(k)
            .ok_or_else(|| format!("cell list ends before cell {}", c))?;
        let end = (k + 1)
            .checked_add(count)
            .ok_or_else(|| format!("cell {} has an invalid size {}", c, count))?;
        let ids = values
            .get(k + 1..end)
            .ok_or_else(|| format!("cell {} runs past the end of the cell list", c))?;
        cells.push(ids.to_vec());
        k = end;
    }
    if k != values.len() {
        return Err(format!("cell list size is {} but cells use {}", values.len(), k));
    }
    Ok(cells)
}

/// `METADATA` blocks run until the next empty line.
fn skip_metadata(cursor: &mut ByteCursor) {
    cursor.skip_line_end();
    while let Some(line) = cursor.line() {
        if line.trim().is_empty() {
            break;
        }
    }
}

pub fn encode_vtk<W: Write>(mesh: &Mesh, out: &mut W, encoding: Encoding) -> io::Result<()> {
    writeln!(out, "{}", HEADER)?;
    writeln!(out, "{}", TITLE)?;
    writeln!(out, "{}", match encoding {
        Encoding::Ascii => "ASCII",
        Encoding::Binary => "BINARY",
    })?;
    writeln!(out, "DATASET POLYDATA")?;

    writeln!(out, "POINTS {} float", mesh.n_points())?;
    match encoding {
        Encoding::Ascii => {
            for p in &mesh.points {
                writeln!(out, "{} {} {}", p.x as f32, p.y as f32, p.z as f32)?;
            }
        }
        Encoding::Binary => {
            for p in &mesh.points {
                for c in [p.x, p.y, p.z] {
                    out.write_all(&(c as f32).to_be_bytes())?;
                }
            }
            writeln!(out)?;
        }
    }

    write_cells(out, "POLYGONS", &mesh.polygons, encoding)?;
    write_cells(out, "TRIANGLE_STRIPS", &mesh.strips, encoding)
}

fn write_cells<W: Write>(out: &mut W, keyword: &str, cells: &[Cell], encoding: Encoding) -> io::Result<()> {
    if cells.is_empty() {
        return Ok(());
    }
    let size: usize = cells.iter().map(|c| c.len() + 1).sum();
    writeln!(out, "{} {} {}", keyword, cells.len(), size)?;
    for cell in cells {
        match encoding {
            Encoding::Ascii => {
                write!(out, "{}", cell.len())?;
                for &i in cell {
                    write!(out, " {}", i)?;
                }
                writeln!(out)?;
            }
            Encoding::Binary => {
                out.write_all(&to_i32(cell.len())?.to_be_bytes())?;
                for &i in cell {
                    out.write_all(&to_i32(i)?.to_be_bytes())?;
                }
            }
        }
    }
    if encoding == Encoding::Binary {
        writeln!(out)?;
    }
    Ok(())
}

fn to_i32(value: usize) -> io::Result<i32> {
    i32::try_from(value).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("{} does not fit a 32 bit index", value))
    })
}
