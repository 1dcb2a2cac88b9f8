use std::fs;

use crate::backend::NativeBackend;
use crate::format::{Encoding, FORMATS};
use crate::pipeline::{ConversionRequest, convert};
use crate::tests::test_utils::{assert_all_triangles, read_back, scratch_dir, single_triangle, write_fixture};

/// Every readable format converts to every writable format in both encodings.
#[test]
fn test_every_supported_pair_converts() {
    let dir = scratch_dir();
    let readable: Vec<_> = FORMATS.iter().filter(|d| d.can_read()).collect();
    let writable: Vec<_> = FORMATS.iter().filter(|d| d.can_write()).collect();
    assert_eq!(readable.len(), 4);
    assert_eq!(writable.len(), 5);

    for source in &readable {
        let input = dir.path().join(format!("input.{}", source.extension));
        write_fixture(&single_triangle(), &input, Encoding::Ascii);

        for target in &writable {
            for encoding in [Encoding::Binary, Encoding::Ascii] {
                let output = dir
                    .path()
                    .join(format!("{}_{}.{}", source.extension, encoding, target.extension));
                let request = ConversionRequest::new(&input, &output).with_encoding(encoding);
                let report = convert(&NativeBackend, &request)
                    .unwrap_or_else(|e| panic!("{} -> {} ({}) failed: {}", source.name, target.name, encoding, e));

                assert_eq!(report.triangles_written, 1, "{} -> {}", source.name, target.name);
                let size = fs::metadata(&output).expect("output written").len();
                assert!(size > 0, "{} is empty", output.display());

                if target.can_read() {
                    let mesh = read_back(&output);
                    assert_all_triangles(&mesh);
                    assert_eq!(mesh.n_polys(), 1, "{}", output.display());
                    assert!((mesh.area() - 0.5).abs() < 1e-6, "{}", output.display());
                }
            }
        }
    }
}

#[test]
fn test_binary_input_files_are_read_as_well() {
    let dir = scratch_dir();
    for source in FORMATS.iter().filter(|d| d.can_read() && d.has_binary()) {
        let input = dir.path().join(format!("binary_in.{}", source.extension));
        write_fixture(&single_triangle(), &input, Encoding::Binary);
        let output = dir.path().join(format!("from_{}.ply", source.extension));

        let request = ConversionRequest::new(&input, &output).with_encoding(Encoding::Ascii);
        convert(&NativeBackend, &request).unwrap_or_else(|e| panic!("{}: {}", source.name, e));

        let text = fs::read_to_string(&output).expect("ascii ply is text");
        assert!(text.starts_with("ply") && text.contains("format ascii"), "{}", text);
        assert_eq!(read_back(&output).points, single_triangle().points);
    }
}
