//! Functionality for reading and writing PLY files with `ply-rs-bw`.

use std::io::{self, BufReader, Write};
use std::path::Path;

use nalgebra::Point3;
use ply_rs_bw::parser::Parser;
use ply_rs_bw::ply::{
    Addable, DefaultElement, ElementDef, Encoding as PlyEncoding, Ply, Property, PropertyDef,
    PropertyType, ScalarType,
};
use ply_rs_bw::writer::Writer;

use crate::convert_error::ConvertError;
use crate::format::{Encoding, read_with, write_with};
use crate::mesh::{Cell, Mesh};

pub fn read_ply(path: &Path) -> Result<Mesh, ConvertError> {
    read_with(path, decode_ply)
}

pub fn write_ply(mesh: &Mesh, path: &Path, encoding: Encoding) -> Result<(), ConvertError> {
    write_with(path, |out| encode_ply(mesh, out, encoding))
}

fn scalar(property: Option<&Property>, name: &str) -> Result<f64, String> {
    match property {
        Some(Property::Float(v)) => Ok(*v as f64),
        Some(Property::Double(v)) => Ok(*v),
        Some(Property::Char(v)) => Ok(*v as f64),
        Some(Property::UChar(v)) => Ok(*v as f64),
        Some(Property::Short(v)) => Ok(*v as f64),
        Some(Property::UShort(v)) => Ok(*v as f64),
        Some(Property::Int(v)) => Ok(*v as f64),
        Some(Property::UInt(v)) => Ok(*v as f64),
        Some(_) => Err(format!("vertex property '{}' is a list", name)),
        None => Err(format!("vertex without '{}'", name)),
    }
}

fn index_list(property: &Property) -> Result<Cell, String> {
    fn convert<T: Copy + TryInto<usize>>(values: &[T]) -> Result<Cell, String> {
        values
            .iter()
            .map(|&v| v.try_into().map_err(|_| "negative vertex index".to_string()))
            .collect()
    }
    match property {
        Property::ListChar(v) => convert(v),
        Property::ListUChar(v) => convert(v),
        Property::ListShort(v) => convert(v),
        Property::ListUShort(v) => convert(v),
        Property::ListInt(v) => convert(v),
        Property::ListUInt(v) => convert(v),
        _ => Err("face vertex indices are not an integer list".to_string()),
    }
}

pub fn decode_ply(data: &[u8]) -> Result<Mesh, String> {
    let parser = Parser::<DefaultElement>::new();
    let mut reader = BufReader::new(data);
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| format!("could not parse PLY: {}", e))?;

    let mut points = Vec::new();
    if let Some(vertices) = ply.payload.get("vertex") {
        points.reserve(vertices.len());
        for vertex in vertices {
            points.push(Point3::new(
                scalar(vertex.get("x"), "x")?,
                scalar(vertex.get("y"), "y")?,
                scalar(vertex.get("z"), "z")?,
            ));
        }
    }

    let mut polygons = Vec::new();
    if let Some(faces) = ply.payload.get("face") {
        polygons.reserve(faces.len());
        for face in faces {
            let list = face
                .get("vertex_indices")
                .or_else(|| face.get("vertex_index"))
                .ok_or("face without vertex_indices")?;
            polygons.push(index_list(list)?);
        }
    }

    Ok(Mesh { points, polygons, strips: Vec::new() })
}

fn element(name: &str, properties: &[(&str, PropertyType)]) -> ElementDef {
    let mut def = ElementDef::new(name.to_string());
    for (property, ty) in properties {
        def.properties.add(PropertyDef::new(property.to_string(), ty.clone()));
    }
    def
}

pub fn encode_ply<W: Write>(mesh: &Mesh, out: &mut W, encoding: Encoding) -> io::Result<()> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = match encoding {
        Encoding::Ascii => PlyEncoding::Ascii,
        Encoding::Binary => PlyEncoding::BinaryLittleEndian,
    };
    ply.header.comments.push("written by meshconvert".to_string());

    let float = || PropertyType::Scalar(ScalarType::Float);
    ply.header.elements.add(element("vertex", &[("x", float()), ("y", float()), ("z", float())]));
    ply.header.elements.add(element(
        "face",
        &[("vertex_indices", PropertyType::List(ScalarType::UChar, ScalarType::Int))],
    ));

    let vertices = mesh
        .points
        .iter()
        .map(|p| {
            let mut vertex = DefaultElement::new();
            vertex.insert("x".to_string(), Property::Float(p.x as f32));
            vertex.insert("y".to_string(), Property::Float(p.y as f32));
            vertex.insert("z".to_string(), Property::Float(p.z as f32));
            vertex
        })
        .collect();

    let mut faces = Vec::with_capacity(mesh.n_polys());
    for polygon in &mesh.polygons {
        if polygon.len() > u8::MAX as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("polygon with {} vertices does not fit a PLY uchar count", polygon.len()),
            ));
        }
        let ids = polygon
            .iter()
            .map(|&i| {
                i32::try_from(i).map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidInput, format!("index {} does not fit int", i))
                })
            })
            .collect::<io::Result<Vec<i32>>>()?;
        let mut face = DefaultElement::new();
        face.insert("vertex_indices".to_string(), Property::ListInt(ids));
        faces.push(face);
    }

    ply.payload.insert("vertex".to_string(), vertices);
    ply.payload.insert("face".to_string(), faces);
    ply.make_consistent()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{:?}", e)))?;

    Writer::new().write_ply(out, &mut ply)?;
    Ok(())
}
