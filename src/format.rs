//! Registry of supported file formats, keyed by file name extension.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use bitflags::bitflags;

use crate::convert_error::{ConvertError, Direction};
use crate::mesh::Mesh;
use crate::{mni_obj, ply, stl, tag, vtk};

bitflags! {
    /// What can be done with a format
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        const READ =   0b0000_0001;
        const WRITE =  0b0000_0010;

        /// The writer has a binary variant next to ASCII. Formats without it ignore
        /// the requested encoding.
        const BINARY = 0b0000_0100;

        /// Full featured surface mesh format
        const MESH = Self::READ.bits() | Self::WRITE.bits() | Self::BINARY.bits();
    }
}

/// Output encoding requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Binary,
    Ascii,
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Encoding::Binary => write!(f, "binary"),
            Encoding::Ascii => write!(f, "ascii"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    Stl,
    Vtk,
    MniObj,
    Ply,
    Tag,
}

pub type ReadFn = fn(&Path) -> Result<Mesh, ConvertError>;
pub type WriteFn = fn(&Mesh, &Path, Encoding) -> Result<(), ConvertError>;

/// One row of the format table.
pub struct FormatDescriptor {
    pub format: MeshFormat,
    pub extension: &'static str,
    pub name: &'static str,
    pub capabilities: Capabilities,
    pub reader: Option<ReadFn>,
    pub writer: Option<WriteFn>,
}

impl FormatDescriptor {
    pub fn can_read(&self) -> bool {
        self.capabilities.contains(Capabilities::READ)
    }

    pub fn can_write(&self) -> bool {
        self.capabilities.contains(Capabilities::WRITE)
    }

    pub fn has_binary(&self) -> bool {
        self.capabilities.contains(Capabilities::BINARY)
    }
}

impl std::fmt::Debug for FormatDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FormatDescriptor")
            .field("format", &self.format)
            .field("extension", &self.extension)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Every known format. Tag point files are written only: they carry no connectivity
/// and there is no binary variant.
pub static FORMATS: [FormatDescriptor; 5] = [
    FormatDescriptor {
        format: MeshFormat::Stl,
        extension: "stl",
        name: "STL",
        capabilities: Capabilities::MESH,
        reader: Some(stl::read_stl),
        writer: Some(stl::write_stl),
    },
    FormatDescriptor {
        format: MeshFormat::Vtk,
        extension: "vtk",
        name: "legacy VTK PolyData",
        capabilities: Capabilities::MESH,
        reader: Some(vtk::read_vtk),
        writer: Some(vtk::write_vtk),
    },
    FormatDescriptor {
        format: MeshFormat::MniObj,
        extension: "obj",
        name: "MNI object",
        capabilities: Capabilities::MESH,
        reader: Some(mni_obj::read_mni_obj),
        writer: Some(mni_obj::write_mni_obj),
    },
    FormatDescriptor {
        format: MeshFormat::Ply,
        extension: "ply",
        name: "PLY",
        capabilities: Capabilities::MESH,
        reader: Some(ply::read_ply),
        writer: Some(ply::write_ply),
    },
    FormatDescriptor {
        format: MeshFormat::Tag,
        extension: "tag",
        name: "MNI tag points",
        capabilities: Capabilities::WRITE,
        reader: None,
        writer: Some(tag::write_tag),
    },
];

impl MeshFormat {
    pub fn descriptor(self) -> &'static FormatDescriptor {
        FORMATS
            .iter()
            .find(|d| d.format == self)
            .unwrap_or_else(|| unreachable!("every MeshFormat has a row in FORMATS"))
    }
}

impl std::fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.descriptor().name)
    }
}

/// Exact, case sensitive lookup without a leading dot.
pub fn descriptor_for(extension: &str) -> Option<&'static FormatDescriptor> {
    FORMATS.iter().find(|d| d.extension == extension)
}

pub fn resolve_reader(extension: &str) -> Result<&'static FormatDescriptor, ConvertError> {
    descriptor_for(extension)
        .filter(|d| d.can_read())
        .ok_or_else(|| ConvertError::UnsupportedFormat {
            extension: extension.to_string(),
            direction: Direction::Read,
        })
}

pub fn resolve_writer(extension: &str) -> Result<&'static FormatDescriptor, ConvertError> {
    descriptor_for(extension)
        .filter(|d| d.can_write())
        .ok_or_else(|| ConvertError::UnsupportedFormat {
            extension: extension.to_string(),
            direction: Direction::Write,
        })
}

/// Extension of the file name, empty if there is none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Loads the whole file and hands it to a decoder; decoder messages become parse
/// errors for this path. The decoded mesh is checked for dangling indices.
pub(crate) fn read_with<F>(path: &Path, decode: F) -> Result<Mesh, ConvertError>
where
    F: FnOnce(&[u8]) -> Result<Mesh, String>,
{
    let data = std::fs::read(path)?;
    let mesh = decode(&data).map_err(|msg| ConvertError::parse(path, msg))?;
    mesh.validate().map_err(|msg| ConvertError::parse(path, msg))?;
    Ok(mesh)
}

/// Runs the encoder into memory and only then creates (or truncates) the file, so a
/// failing encoder leaves no partial output. Any failure is a write error for this path.
pub(crate) fn write_with<F>(path: &Path, encode: F) -> Result<(), ConvertError>
where
    F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
{
    let mut buffer = Vec::new();
    encode(&mut buffer).map_err(|e| ConvertError::write(path, e.to_string()))?;

    let written = File::create(path).and_then(|mut file| {
        file.write_all(&buffer)?;
        file.flush()
    });
    if let Err(e) = written {
        let _ = std::fs::remove_file(path);
        return Err(ConvertError::write(path, e.to_string()));
    }
    Ok(())
}
