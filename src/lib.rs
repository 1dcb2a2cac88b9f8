//! Conversion of 3D surface meshes between file formats.
//!
//! The format is chosen by file name extension only, file content is never sniffed:
//!
//! | extension | format                     | read | write | binary |
//! |-----------|----------------------------|------|-------|--------|
//! | `stl`     | STL                        | yes  | yes   | yes    |
//! | `vtk`     | legacy VTK PolyData        | yes  | yes   | yes    |
//! | `obj`     | BIC/MNI polygon object     | yes  | yes   | yes    |
//! | `ply`     | PLY                        | yes  | yes   | yes    |
//! | `tag`     | MNI tag points             | no   | yes   | no     |
//!
//! A conversion reads the input, optionally cleans it (merges points at identical
//! coordinates, drops degenerate cells and unused points), always triangulates it and
//! writes the result, binary by default:
//!
//! ```no_run
//! use meshconvert::backend::NativeBackend;
//! use meshconvert::pipeline::{convert, ConversionRequest};
//!
//! let request = ConversionRequest::new("cube.stl", "cube.vtk");
//! let report = convert(&NativeBackend, &request).expect("conversion failed");
//! println!("{} triangles written", report.triangles_written);
//! ```
//!
//! The pipeline talks to readers, writers and geometry through the
//! [`backend::MeshBackend`] trait only.

pub mod mesh;

pub mod convert_error;

pub mod format;

pub mod backend;

pub mod pipeline;

#[path = "geometry/clean.rs"]
pub mod clean;

#[path = "geometry/triangulate.rs"]
pub mod triangulate;

#[path = "formats/stl.rs"]
pub mod stl;

#[path = "formats/vtk.rs"]
pub mod vtk;

#[path = "formats/mni_obj.rs"]
pub mod mni_obj;

#[path = "formats/ply.rs"]
pub mod ply;

#[path = "formats/tag.rs"]
pub mod tag;

#[path = "utils/byte_cursor.rs"]
mod byte_cursor;

#[cfg(test)]
mod tests;
