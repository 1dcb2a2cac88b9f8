use std::cell::RefCell;
use std::fs;
use std::path::Path;

use crate::backend::MeshBackend;
use crate::convert_error::{ConvertError, Direction};
use crate::format::{Encoding, MeshFormat};
use crate::mesh::Mesh;
use crate::pipeline::{ConversionRequest, convert, preflight};
use crate::tests::test_utils::{scratch_dir, single_triangle};

/// Backend that records every call and returns a fixed mesh.
struct RecordingBackend {
    mesh: Mesh,
    fail_load: bool,
    calls: RefCell<Vec<String>>,
}

impl RecordingBackend {
    fn new(mesh: Mesh) -> Self {
        RecordingBackend { mesh, fail_load: false, calls: RefCell::new(Vec::new()) }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl MeshBackend for RecordingBackend {
    fn load(&self, path: &Path, format: MeshFormat) -> Result<Mesh, ConvertError> {
        self.calls.borrow_mut().push(format!("load {}", format));
        if self.fail_load {
            return Err(ConvertError::parse(path, "truncated"));
        }
        Ok(self.mesh.clone())
    }

    fn clean(&self, mesh: Mesh) -> Mesh {
        self.calls.borrow_mut().push("clean".to_string());
        mesh
    }

    fn triangulate(&self, mesh: Mesh) -> Mesh {
        self.calls.borrow_mut().push("triangulate".to_string());
        mesh
    }

    fn save(&self, mesh: &Mesh, path: &Path, format: MeshFormat, encoding: Encoding) -> Result<(), ConvertError> {
        self.calls.borrow_mut().push(format!("save {} {}", format, encoding));
        fs::write(path, format!("{} points", mesh.n_points()))?;
        Ok(())
    }
}

fn touch(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"placeholder").expect("Failed to create input file");
    path
}

#[test]
fn test_stages_run_in_order() {
    let dir = scratch_dir();
    let input = touch(dir.path(), "in.stl");
    let output = dir.path().join("out.vtk");
    let backend = RecordingBackend::new(single_triangle());

    let report = convert(&backend, &ConversionRequest::new(&input, &output)).expect("conversion failed");

    assert_eq!(
        backend.calls(),
        vec![
            format!("load {}", MeshFormat::Stl),
            "clean".to_string(),
            "triangulate".to_string(),
            format!("save {} binary", MeshFormat::Vtk),
        ]
    );
    assert_eq!(report.input_format, MeshFormat::Stl);
    assert_eq!(report.output_format, MeshFormat::Vtk);
    assert_eq!(report.polygons_read, 1);
    assert!(report.cleaned);
    assert_eq!(report.points_written, 3);
    assert_eq!(report.triangles_written, 1);
    assert!(output.exists());
}

#[test]
fn test_noclean_skips_cleanup_but_still_triangulates() {
    let dir = scratch_dir();
    let input = touch(dir.path(), "in.ply");
    let output = dir.path().join("out.obj");
    let backend = RecordingBackend::new(single_triangle());

    let request = ConversionRequest::new(&input, &output)
        .with_clean(false)
        .with_encoding(Encoding::Ascii);
    let report = convert(&backend, &request).expect("conversion failed");

    let calls = backend.calls();
    assert!(!calls.contains(&"clean".to_string()), "calls: {:?}", calls);
    assert!(calls.contains(&"triangulate".to_string()), "calls: {:?}", calls);
    assert_eq!(calls.last(), Some(&format!("save {} ascii", MeshFormat::MniObj)));
    assert!(!report.cleaned);
}

#[test]
fn test_missing_input_is_reported_before_loading() {
    let dir = scratch_dir();
    let input = dir.path().join("absent.stl");
    let output = dir.path().join("out.vtk");
    let backend = RecordingBackend::new(single_triangle());

    let err = convert(&backend, &ConversionRequest::new(&input, &output)).expect_err("input does not exist");

    assert!(matches!(&err, ConvertError::FileNotFound(p) if *p == input), "{:?}", err);
    assert!(backend.calls().is_empty());
    assert!(!output.exists());
}

#[test]
fn test_missing_output_directory_is_reported_before_loading() {
    let dir = scratch_dir();
    let input = touch(dir.path(), "in.stl");
    let missing = dir.path().join("no_such_dir");
    let output = missing.join("out.vtk");
    let backend = RecordingBackend::new(single_triangle());

    let err = convert(&backend, &ConversionRequest::new(&input, &output)).expect_err("directory does not exist");

    assert!(matches!(&err, ConvertError::DirectoryNotFound(p) if *p == missing), "{:?}", err);
    assert!(backend.calls().is_empty());
}

#[test]
fn test_output_in_current_directory_needs_no_parent() {
    let dir = scratch_dir();
    let input = touch(dir.path(), "in.stl");
    let request = ConversionRequest::new(&input, "out.vtk");
    preflight(&request).expect("bare file name refers to the working directory");
}

#[test]
fn test_unknown_input_extension() {
    let dir = scratch_dir();
    let input = touch(dir.path(), "in.xyz");
    let output = dir.path().join("out.stl");
    let backend = RecordingBackend::new(single_triangle());

    let err = convert(&backend, &ConversionRequest::new(&input, &output)).expect_err("xyz is not a format");

    match err {
        ConvertError::UnsupportedFormat { extension, direction } => {
            assert_eq!(extension, "xyz");
            assert_eq!(direction, Direction::Read);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(backend.calls().is_empty());
    assert!(!output.exists());
}

#[test]
fn test_unknown_output_extension() {
    let dir = scratch_dir();
    let input = touch(dir.path(), "in.vtk");
    let output = dir.path().join("out.off");
    let backend = RecordingBackend::new(single_triangle());

    let err = convert(&backend, &ConversionRequest::new(&input, &output)).expect_err("off is not writable");

    assert!(
        matches!(&err, ConvertError::UnsupportedFormat { extension, direction: Direction::Write } if extension == "off"),
        "{:?}",
        err
    );
    assert!(backend.calls().is_empty());
    assert!(!output.exists());
}

#[test]
fn test_tag_files_cannot_be_read() {
    let dir = scratch_dir();
    let input = touch(dir.path(), "points.tag");
    let output = dir.path().join("out.stl");
    let backend = RecordingBackend::new(single_triangle());

    let err = convert(&backend, &ConversionRequest::new(&input, &output)).expect_err("tag is write only");

    assert!(
        matches!(&err, ConvertError::UnsupportedFormat { extension, direction: Direction::Read } if extension == "tag"),
        "{:?}",
        err
    );
    assert!(backend.calls().is_empty());
}

#[test]
fn test_extension_match_is_case_sensitive() {
    let dir = scratch_dir();
    let input = touch(dir.path(), "IN.STL");
    let output = dir.path().join("out.vtk");

    let err = preflight(&ConversionRequest::new(&input, &output)).expect_err("STL is not stl");
    assert!(matches!(err, ConvertError::UnsupportedFormat { .. }), "{:?}", err);
}

#[test]
fn test_empty_paths_are_usage_errors() {
    let dir = scratch_dir();
    let input = touch(dir.path(), "in.stl");

    let err = preflight(&ConversionRequest::new("", dir.path().join("out.vtk"))).expect_err("no input");
    assert!(err.is_usage());
    assert!(err.to_string().contains("-i"), "{}", err);

    let err = preflight(&ConversionRequest::new(&input, "")).expect_err("no output");
    assert!(err.is_usage());
    assert!(err.to_string().contains("-o"), "{}", err);
}

#[test]
fn test_load_failure_stops_before_writing() {
    let dir = scratch_dir();
    let input = touch(dir.path(), "in.vtk");
    let output = dir.path().join("out.stl");
    let mut backend = RecordingBackend::new(single_triangle());
    backend.fail_load = true;

    let err = convert(&backend, &ConversionRequest::new(&input, &output)).expect_err("load fails");

    assert!(matches!(err, ConvertError::ParseError { .. }), "{:?}", err);
    assert_eq!(backend.calls(), vec![format!("load {}", MeshFormat::Vtk)]);
    assert!(!output.exists());
}
