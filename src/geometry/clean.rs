//! Removal of duplicate points, unused points and degenerate cells.

use std::collections::HashMap;

use nalgebra::Point3;

use crate::mesh::{Cell, Mesh, polygon_area};

/// Polygons whose area is below this fraction of their squared longest edge are
/// treated as having zero area.
const DEGENERATE_AREA_RATIO: f64 = 1e-12;

/// What [`clean`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Points folded into an earlier point at identical coordinates
    pub merged_points: usize,
    /// Polygons and strips dropped as degenerate
    pub removed_cells: usize,
    /// Points dropped because no remaining cell referenced them
    pub removed_points: usize,
}

impl CleanReport {
    pub fn is_noop(&self) -> bool {
        *self == CleanReport::default()
    }
}

/// Cleans the mesh:
///
/// - points at bit-identical coordinates are merged, the first occurrence wins and the
///   relative order of surviving points is kept;
/// - consecutive repeated references inside a cell are collapsed;
/// - polygons with fewer than three vertices, with a vertex repeated anywhere, or with
///   zero area are dropped, as are strips shorter than three references;
/// - points no longer referenced by any cell are removed.
///
/// Cleaning an already clean mesh returns an equal mesh.
pub fn clean(mesh: &Mesh) -> (Mesh, CleanReport) {
    let mut report = CleanReport::default();

    let (points, remap) = merge_points(&mesh.points);
    report.merged_points = mesh.points.len() - points.len();

    let mut polygons = Vec::with_capacity(mesh.polygons.len());
    for polygon in &mesh.polygons {
        let cell = collapse_repeats(polygon.iter().map(|&i| remap[i]), true);
        if is_valid_polygon(&points, &cell) {
            polygons.push(cell);
        } else {
            report.removed_cells += 1;
        }
    }

    let mut strips = Vec::with_capacity(mesh.strips.len());
    for strip in &mesh.strips {
        let cell: Cell = strip.iter().map(|&i| remap[i]).collect();
        if cell.len() >= 3 {
            strips.push(cell);
        } else {
            report.removed_cells += 1;
        }
    }

    let mut cleaned = Mesh { points, polygons, strips };
    report.removed_points = remove_unused_points(&mut cleaned);
    (cleaned, report)
}

/// Bit pattern of a coordinate, with negative zero folded onto positive zero.
fn coordinate_key(v: f64) -> u64 {
    if v == 0.0 { 0 } else { v.to_bits() }
}

fn merge_points(points: &[Point3<f64>]) -> (Vec<Point3<f64>>, Vec<usize>) {
    let mut first_at: HashMap<[u64; 3], usize> = HashMap::with_capacity(points.len());
    let mut merged = Vec::with_capacity(points.len());
    let mut remap = Vec::with_capacity(points.len());

    for p in points {
        let key = [coordinate_key(p.x), coordinate_key(p.y), coordinate_key(p.z)];
        let index = *first_at.entry(key).or_insert_with(|| {
            merged.push(*p);
            merged.len() - 1
        });
        remap.push(index);
    }
    (merged, remap)
}

/// Drops each reference equal to the one before it. With `closed`, the last reference
/// is also compared with the first.
fn collapse_repeats(ids: impl Iterator<Item = usize>, closed: bool) -> Cell {
    let mut cell: Cell = Vec::new();
    for id in ids {
        if cell.last() != Some(&id) {
            cell.push(id);
        }
    }
    if closed {
        while cell.len() > 1 && cell.first() == cell.last() {
            cell.pop();
        }
    }
    cell
}

fn is_valid_polygon(points: &[Point3<f64>], cell: &[usize]) -> bool {
    if cell.len() < 3 {
        return false;
    }
    let mut seen = cell.to_vec();
    seen.sort_unstable();
    seen.dedup();
    if seen.len() != cell.len() {
        return false;
    }

    let longest_edge_sq = (0..cell.len())
        .map(|k| (points[cell[(k + 1) % cell.len()]] - points[cell[k]]).norm_squared())
        .fold(0.0, f64::max);
    polygon_area(points, cell) > DEGENERATE_AREA_RATIO * longest_edge_sq
}

/// Compacts the point list to the referenced points, returns how many were removed.
fn remove_unused_points(mesh: &mut Mesh) -> usize {
    let mut used = vec![false; mesh.points.len()];
    for &i in mesh.polygons.iter().chain(mesh.strips.iter()).flatten() {
        used[i] = true;
    }

    let mut new_index = vec![usize::MAX; mesh.points.len()];
    let mut kept = Vec::with_capacity(mesh.points.len());
    for (i, point) in mesh.points.iter().enumerate() {
        if used[i] {
            new_index[i] = kept.len();
            kept.push(*point);
        }
    }

    let removed = mesh.points.len() - kept.len();
    if removed > 0 {
        for i in mesh.polygons.iter_mut().chain(mesh.strips.iter_mut()).flatten() {
            *i = new_index[*i];
        }
        mesh.points = kept;
    }
    removed
}
