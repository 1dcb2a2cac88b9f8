//! In-memory polygonal surface shared by all readers, the normalizer and all writers.

use nalgebra::{Point3, Vector3};

/// Index list of one polygon or one triangle strip.
pub type Cell = Vec<usize>;

/// Polygonal mesh: points plus the cells referencing them by index.
///
/// Readers may produce polygons of any arity and triangle strips. After
/// [`crate::triangulate::triangulate`] only three-vertex polygons remain and
/// `strips` is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub points: Vec<Point3<f64>>,
    pub polygons: Vec<Cell>,
    pub strips: Vec<Cell>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_triangles(points: Vec<Point3<f64>>, triangles: &[[usize; 3]]) -> Self {
        Mesh {
            points,
            polygons: triangles.iter().map(|t| t.to_vec()).collect(),
            strips: Vec::new(),
        }
    }

    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    pub fn n_polys(&self) -> usize {
        self.polygons.len()
    }

    /// True if the mesh has no strips and every polygon is a triangle.
    pub fn is_triangulated(&self) -> bool {
        self.strips.is_empty() && self.polygons.iter().all(|p| p.len() == 3)
    }

    /// Triangles as fixed arrays. Non-triangular polygons are skipped, call only on
    /// triangulated meshes.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.polygons
            .iter()
            .filter(|p| p.len() == 3)
            .map(|p| [p[0], p[1], p[2]])
    }

    /// Checks that every cell only references existing points.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.points.len();
        for (kind, cells) in [("polygon", &self.polygons), ("strip", &self.strips)] {
            for (c, cell) in cells.iter().enumerate() {
                if let Some(&bad) = cell.iter().find(|&&i| i >= n) {
                    return Err(format!(
                        "{} {} references point {} but only {} points exist",
                        kind, c, bad, n
                    ));
                }
            }
        }
        Ok(())
    }

    /// Total area covered by polygons and strip triangles.
    pub fn area(&self) -> f64 {
        let polys: f64 = self.polygons.iter().map(|p| polygon_area(&self.points, p)).sum();
        let strips: f64 = self
            .strips
            .iter()
            .flat_map(|s| s.windows(3))
            .map(|w| polygon_area(&self.points, w))
            .sum();
        polys + strips
    }

    /// Unit normal of each polygon, zero for degenerate ones.
    pub fn polygon_normal(&self, polygon: &[usize]) -> Vector3<f64> {
        newell_normal(&self.points, polygon)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Area weighted vertex normals. Points not used by any polygon get a zero normal.
    pub fn vertex_normals(&self) -> Vec<Vector3<f64>> {
        let mut normals = vec![Vector3::zeros(); self.points.len()];
        for polygon in &self.polygons {
            // Newell vector length is twice the area, so it already weights by area
            let n = newell_normal(&self.points, polygon);
            for &i in polygon {
                normals[i] += n;
            }
        }
        normals
            .into_iter()
            .map(|n| n.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros))
            .collect()
    }
}

/// Newell's normal of a polygon. Its length is twice the polygon area and its direction
/// follows the winding order, which makes it robust for non-planar and concave polygons.
pub fn newell_normal(points: &[Point3<f64>], polygon: &[usize]) -> Vector3<f64> {
    let mut n = Vector3::zeros();
    for (k, &i) in polygon.iter().enumerate() {
        let a = &points[i];
        let b = &points[polygon[(k + 1) % polygon.len()]];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n
}

pub fn polygon_area(points: &[Point3<f64>], polygon: &[usize]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    newell_normal(points, polygon).norm() / 2.0
}
