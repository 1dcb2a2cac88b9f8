use std::fs;

use crate::backend::NativeBackend;
use crate::clean::clean;
use crate::format::Encoding;
use crate::pipeline::{ConversionRequest, convert};
use crate::tests::test_utils::{assert_all_triangles, data_file, read_back, scratch_dir};

#[test]
fn test_binary_stl_cube_to_vtk() {
    let dir = scratch_dir();
    let output = dir.path().join("cube.vtk");

    let report = convert(&NativeBackend, &ConversionRequest::new(data_file("cube.stl"), &output))
        .expect("cube conversion failed");
    assert_eq!(report.polygons_read, 12);
    assert_eq!(report.points_written, 8);
    assert_eq!(report.triangles_written, 12);

    let bytes = fs::read(&output).expect("Failed to read output");
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(80)]).to_string();
    assert!(head.contains("BINARY"), "{}", head);

    let mesh = read_back(&output);
    assert_all_triangles(&mesh);
    assert_eq!(mesh.n_points(), 8);
    assert_eq!(mesh.n_polys(), 12);
    assert!((mesh.area() - 6.0).abs() < 1e-6, "cube area {}", mesh.area());
}

#[test]
fn test_noclean_ascii_keeps_duplicate_points() {
    let dir = scratch_dir();
    let output = dir.path().join("raw.vtk");

    let request = ConversionRequest::new(data_file("two_quads.vtk"), &output)
        .with_clean(false)
        .with_encoding(Encoding::Ascii);
    convert(&NativeBackend, &request).expect("conversion failed");

    let text = fs::read_to_string(&output).expect("ascii output is text");
    assert!(text.contains("ASCII"), "{}", text);
    assert!(text.contains("POINTS 8 float"), "{}", text);

    let mesh = read_back(&output);
    assert_all_triangles(&mesh);
    assert_eq!(mesh.n_points(), 8);
    assert_eq!(mesh.n_polys(), 4);
}

#[test]
fn test_cleanup_merges_shared_edge() {
    let dir = scratch_dir();
    let output = dir.path().join("merged.vtk");

    convert(&NativeBackend, &ConversionRequest::new(data_file("two_quads.vtk"), &output))
        .expect("conversion failed");

    let mesh = read_back(&output);
    assert_eq!(mesh.n_points(), 6);
    assert_eq!(mesh.n_polys(), 4);
    assert!((mesh.area() - 2.0).abs() < 1e-6);
}

#[test]
fn test_mni_hexagon_to_ply() {
    let dir = scratch_dir();
    let output = dir.path().join("hexagon.ply");

    let report = convert(&NativeBackend, &ConversionRequest::new(data_file("hexagon.obj"), &output))
        .expect("conversion failed");
    assert_eq!(report.polygons_read, 1);
    assert_eq!(report.triangles_written, 4);

    let mesh = read_back(&output);
    assert_all_triangles(&mesh);
    assert_eq!(mesh.n_points(), 6);
    assert!((mesh.area() - 9.0).abs() < 1e-6, "hexagon area {}", mesh.area());
}

#[test]
fn test_ply_square_to_ascii_stl() {
    let dir = scratch_dir();
    let output = dir.path().join("square.stl");

    let request = ConversionRequest::new(data_file("square.ply"), &output).with_encoding(Encoding::Ascii);
    convert(&NativeBackend, &request).expect("conversion failed");

    let text = fs::read_to_string(&output).expect("ascii stl is text");
    assert!(text.starts_with("solid"), "{}", text);
    assert_eq!(text.matches("facet normal").count(), 2);
    assert_eq!(text.matches("outer loop").count(), 2);
}

#[test]
fn test_tag_output_ignores_encoding() {
    let dir = scratch_dir();
    let binary = dir.path().join("binary.tag");
    let ascii = dir.path().join("ascii.tag");

    let request = ConversionRequest::new(data_file("cube.stl"), &binary);
    convert(&NativeBackend, &request).expect("binary request failed");
    let request = ConversionRequest::new(data_file("cube.stl"), &ascii).with_encoding(Encoding::Ascii);
    convert(&NativeBackend, &request).expect("ascii request failed");

    let text = fs::read_to_string(&binary).expect("tag output is text");
    assert_eq!(text, fs::read_to_string(&ascii).expect("tag output is text"));
    assert!(text.starts_with("MNI Tag Point File\n"), "{}", text);
    assert!(text.trim_end().ends_with(';'));
    let point_lines = text.lines().skip_while(|l| !l.starts_with("Points =")).skip(1).count();
    assert_eq!(point_lines, 8);
}

#[test]
fn test_cleanup_is_idempotent_on_fixture() {
    let mesh = read_back(&data_file("two_quads.vtk"));
    let (once, _) = clean(&mesh);
    let (twice, report) = clean(&once);
    assert_eq!(once, twice);
    assert!(report.is_noop());
}
