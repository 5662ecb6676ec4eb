//! Douglas-Peucker reduction of point chains. Tolerances are in scaled units.

use super::{Line, Point, Polygon};
use crate::CoordF;

/// Index and distance of the interior point of `span` furthest from the
/// chord joining its ends.
fn furthest_from_chord(span: &[Point]) -> Option<(usize, CoordF)> {
    let chord = Line::new(*span.first()?, *span.last()?);
    span[1..span.len().saturating_sub(1)]
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1, chord.distance_to(p)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

fn mark_kept(points: &[Point], tolerance: CoordF, keep: &mut [bool]) {
    // (start, len) spans still to be split
    let mut pending = vec![(0, points.len())];
    while let Some((start, len)) = pending.pop() {
        if len < 3 {
            continue;
        }
        match furthest_from_chord(&points[start..start + len]) {
            Some((split, dist)) if dist > tolerance => {
                keep[start + split] = true;
                pending.push((start, split + 1));
                pending.push((start + split, len - split));
            }
            _ => {}
        }
    }
}

/// Removes points lying within `tolerance` of the segment between their
/// retained neighbours. Both endpoints survive.
pub fn douglas_peucker(points: &[Point], tolerance: CoordF) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    mark_kept(points, tolerance, &mut keep);

    points
        .iter()
        .zip(&keep)
        .filter_map(|(p, &k)| k.then_some(*p))
        .collect()
}

/// Closed-ring variant: the ring is cut open at its first vertex, which is
/// therefore never dropped. Rings that would fall below three vertices come
/// back untouched.
pub fn douglas_peucker_polygon(polygon: &Polygon, tolerance: CoordF) -> Polygon {
    let ring = polygon.points();
    if ring.len() <= 3 {
        return polygon.clone();
    }
    let mut open: Vec<Point> = ring.iter().chain(ring.first()).copied().collect();
    open = douglas_peucker(&open, tolerance);
    open.pop();
    if open.len() < 3 {
        polygon.clone()
    } else {
        Polygon::from_points(open)
    }
}
