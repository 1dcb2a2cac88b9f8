//! Conversion of polygons and triangle strips into triangles.

use nalgebra::{Point3, Vector2, Vector3};

use crate::mesh::{Cell, Mesh, newell_normal};

/// Replaces every polygon and strip with triangles covering the same surface.
///
/// Triangles pass through unchanged, larger polygons are ear-clipped in their own
/// plane, strips are unrolled keeping a consistent winding. Polygons with fewer than
/// three vertices and strip triangles with repeated indices produce nothing.
pub fn triangulate(mesh: Mesh) -> Mesh {
    let Mesh { points, polygons, strips } = mesh;

    let mut triangles: Vec<Cell> = Vec::with_capacity(polygons.len());
    for polygon in polygons {
        match polygon.len() {
            0..=2 => {}
            3 => triangles.push(polygon),
            _ => triangles.extend(
                triangulate_polygon(&points, &polygon)
                    .into_iter()
                    .map(|t| t.to_vec()),
            ),
        }
    }
    for strip in &strips {
        unroll_strip(strip, &mut triangles);
    }

    Mesh { points, polygons: triangles, strips: Vec::new() }
}

/// Splits one polygon into `n - 2` triangles with the winding of the polygon.
pub fn triangulate_polygon(points: &[Point3<f64>], polygon: &[usize]) -> Vec<[usize; 3]> {
    if polygon.len() < 3 {
        return Vec::new();
    }
    let Some(normal) = newell_normal(points, polygon).try_normalize(f64::EPSILON) else {
        // No plane to project into, any split covers the same (zero) area
        return fan(polygon);
    };

    let (u, v) = plane_basis(&normal);
    let origin = points[polygon[0]];
    let flat: Vec<Vector2<f64>> = polygon
        .iter()
        .map(|&i| {
            let d = points[i] - origin;
            Vector2::new(d.dot(&u), d.dot(&v))
        })
        .collect();

    ear_clip(&flat)
        .into_iter()
        .map(|[a, b, c]| [polygon[a], polygon[b], polygon[c]])
        .collect()
}

/// Orthonormal in-plane axes such that (u, v, normal) is right handed.
fn plane_basis(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let (ax, ay, az) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
    let helper = if ax <= ay && ax <= az {
        Vector3::x()
    } else if ay <= az {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let u = normal.cross(&helper).normalize();
    let v = normal.cross(&u);
    (u, v)
}

fn cross(o: &Vector2<f64>, a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    (a - o).perp(&(b - o))
}

fn signed_area(flat: &[Vector2<f64>]) -> f64 {
    let n = flat.len();
    (0..n).map(|k| flat[k].perp(&flat[(k + 1) % n])).sum::<f64>() / 2.0
}

fn fan(ids: &[usize]) -> Vec<[usize; 3]> {
    (1..ids.len().saturating_sub(1))
        .map(|k| [ids[0], ids[k], ids[k + 1]])
        .collect()
}

/// Ear clipping over local indices into `flat`.
fn ear_clip(flat: &[Vector2<f64>]) -> Vec<[usize; 3]> {
    let orientation = if signed_area(flat) < 0.0 { -1.0 } else { 1.0 };

    let extent = flat
        .iter()
        .flat_map(|p| [p.x.abs(), p.y.abs()])
        .fold(0.0, f64::max);
    let eps = 1e-14 * extent * extent;

    let mut remaining: Vec<usize> = (0..flat.len()).collect();
    let mut triangles = Vec::with_capacity(flat.len() - 2);

    while remaining.len() > 3 {
        let m = remaining.len();
        let corner = |k: usize| (remaining[(k + m - 1) % m], remaining[k], remaining[(k + 1) % m]);

        let ear = (0..m).find(|&k| {
            let (a, b, c) = corner(k);
            if cross(&flat[a], &flat[b], &flat[c]) * orientation <= eps {
                return false; // reflex or flat corner
            }
            remaining
                .iter()
                .filter(|&&p| p != a && p != b && p != c)
                .all(|&p| !in_triangle(&flat[p], &flat[a], &flat[b], &flat[c], orientation))
        });

        match ear {
            Some(k) => {
                let (a, b, c) = corner(k);
                triangles.push([a, b, c]);
                remaining.remove(k);
            }
            None => {
                // Self intersecting or numerically flat remainder
                triangles.extend(fan(&remaining));
                return triangles;
            }
        }
    }
    triangles.push([remaining[0], remaining[1], remaining[2]]);
    triangles
}

/// Inclusive of the boundary, so vertices touching a candidate ear block it.
fn in_triangle(p: &Vector2<f64>, a: &Vector2<f64>, b: &Vector2<f64>, c: &Vector2<f64>, orientation: f64) -> bool {
    cross(a, b, p) * orientation >= 0.0
        && cross(b, c, p) * orientation >= 0.0
        && cross(c, a, p) * orientation >= 0.0
}

/// Strip `[v0, v1, v2, v3, ...]` is the triangles `(v0, v1, v2)`, `(v2, v1, v3)`, ...
/// with every second one flipped so that all share the winding of the first.
fn unroll_strip(strip: &[usize], out: &mut Vec<Cell>) {
    for (k, w) in strip.windows(3).enumerate() {
        if w[0] == w[1] || w[1] == w[2] || w[0] == w[2] {
            continue;
        }
        if k % 2 == 0 {
            out.push(vec![w[0], w[1], w[2]]);
        } else {
            out.push(vec![w[1], w[0], w[2]]);
        }
    }
}
