//! Voronoi diagrams of point sites.
//!
//! The diagram is the dual of a Delaunay triangulation built incrementally
//! (Bowyer-Watson) inside a large enclosing triangle. Only finite edges are
//! reported: an edge is finite when both triangles sharing its dual Delaunay
//! edge use real sites only.
//!
//! Sites are normalised to a unit box and perturbed by a deterministic jitter
//! far below one scaled unit, which breaks the co-circular and collinear
//! configurations regularly sampled boundaries produce.

use super::PointF;
use std::collections::{BTreeMap, HashSet};

/// Relative amplitude of the site perturbation.
const JITTER: f64 = 1e-9;

/// Size of the enclosing triangle relative to the normalised data.
const SUPER_EXTENT: f64 = 100.0;

/// A finite Voronoi edge separating the cells of two sites.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoronoiEdge {
    /// Indices into the site slice the diagram was built from.
    pub sites: (usize, usize),
    pub vertex0: PointF,
    pub vertex1: PointF,
}

#[derive(Clone, Debug, Default)]
pub struct VoronoiDiagram {
    edges: Vec<VoronoiEdge>,
}

#[derive(Clone, Copy, Debug)]
struct Triangle {
    v: [usize; 3],
    center: PointF,
    radius_sq: f64,
}

impl Triangle {
    /// Build a counter-clockwise triangle with its circumcircle.
    fn new(pts: &[PointF], a: usize, b: usize, c: usize) -> Self {
        let (pa, pb, pc) = (pts[a], pts[b], pts[c]);
        let orient = (pb.x - pa.x) * (pc.y - pa.y) - (pb.y - pa.y) * (pc.x - pa.x);
        let v = if orient < 0.0 { [a, c, b] } else { [a, b, c] };

        let d = 2.0 * (pa.x * (pb.y - pc.y) + pb.x * (pc.y - pa.y) + pc.x * (pa.y - pb.y));
        if d.abs() < f64::MIN_POSITIVE {
            // Degenerate: every later site falls inside, so it is replaced.
            return Self {
                v,
                center: pa,
                radius_sq: f64::INFINITY,
            };
        }
        let a2 = pa.x * pa.x + pa.y * pa.y;
        let b2 = pb.x * pb.x + pb.y * pb.y;
        let c2 = pc.x * pc.x + pc.y * pc.y;
        let center = PointF::new(
            (a2 * (pb.y - pc.y) + b2 * (pc.y - pa.y) + c2 * (pa.y - pb.y)) / d,
            (a2 * (pc.x - pb.x) + b2 * (pa.x - pc.x) + c2 * (pb.x - pa.x)) / d,
        );
        Self {
            v,
            center,
            radius_sq: center.distance_squared(&pa),
        }
    }

    #[inline]
    fn edges(&self) -> [(usize, usize); 3] {
        [
            (self.v[0], self.v[1]),
            (self.v[1], self.v[2]),
            (self.v[2], self.v[0]),
        ]
    }

    #[inline]
    fn is_finite(&self, site_count: usize) -> bool {
        self.radius_sq.is_finite() && self.v.iter().all(|&i| i < site_count)
    }
}

/// Deterministic xorshift sequence in `[-1, 1)`.
struct Jitter(u64);

impl Jitter {
    fn next(&mut self) -> f64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 >> 11) as f64 / (1u64 << 52) as f64 - 1.0
    }
}

impl VoronoiDiagram {
    /// Build the diagram of `sites`. Fewer than three distinct sites produce
    /// no finite edges.
    pub fn build(sites: &[PointF]) -> Self {
        let n = sites.len();
        if n < 3 {
            return Self::default();
        }

        let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
        let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
        for p in sites {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let extent = (max_x - min_x).max(max_y - min_y);
        if extent <= 0.0 {
            return Self::default();
        }

        let mut jitter = Jitter(0x9E37_79B9_7F4A_7C15);
        let mut pts: Vec<PointF> = sites
            .iter()
            .map(|p| {
                PointF::new(
                    (p.x - min_x) / extent + JITTER * jitter.next(),
                    (p.y - min_y) / extent + JITTER * jitter.next(),
                )
            })
            .collect();
        pts.push(PointF::new(0.5 - SUPER_EXTENT, -SUPER_EXTENT));
        pts.push(PointF::new(0.5 + SUPER_EXTENT, -SUPER_EXTENT));
        pts.push(PointF::new(0.5, SUPER_EXTENT));

        let mut triangles = vec![Triangle::new(&pts, n, n + 1, n + 2)];
        for i in 0..n {
            insert_site(&pts, &mut triangles, i);
        }

        // Undirected Delaunay edge -> triangles using it.
        let mut adjacency: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
        for (ti, t) in triangles.iter().enumerate() {
            for (a, b) in t.edges() {
                adjacency.entry((a.min(b), a.max(b))).or_default().push(ti);
            }
        }

        let denormalize = |p: PointF| PointF::new(p.x * extent + min_x, p.y * extent + min_y);
        let edges = adjacency
            .into_iter()
            .filter(|((a, b), _)| *a < n && *b < n)
            .filter_map(|(sites, tris)| match tris.as_slice() {
                [t0, t1] => {
                    let (t0, t1) = (&triangles[*t0], &triangles[*t1]);
                    (t0.is_finite(n) && t1.is_finite(n)).then(|| VoronoiEdge {
                        sites,
                        vertex0: denormalize(t0.center),
                        vertex1: denormalize(t1.center),
                    })
                }
                _ => None,
            })
            .collect();

        Self { edges }
    }

    #[inline]
    pub fn edges(&self) -> &[VoronoiEdge] {
        &self.edges
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Bowyer-Watson step: remove every triangle whose circumcircle contains the
/// site and re-triangulate the cavity around it.
fn insert_site(pts: &[PointF], triangles: &mut Vec<Triangle>, site: usize) {
    let p = pts[site];
    let bad: Vec<bool> = triangles
        .iter()
        .map(|t| p.distance_squared(&t.center) < t.radius_sq)
        .collect();
    if !bad.iter().any(|&b| b) {
        return;
    }

    let cavity: Vec<(usize, usize)> = triangles
        .iter()
        .zip(&bad)
        .filter(|(_, &b)| b)
        .flat_map(|(t, _)| t.edges())
        .collect();
    let shared: HashSet<(usize, usize)> = cavity.iter().copied().collect();

    let mut keep = bad.iter().map(|b| !b);
    triangles.retain(|_| keep.next().unwrap_or(true));

    for (a, b) in cavity {
        if !shared.contains(&(b, a)) {
            triangles.push(Triangle::new(pts, a, b, site));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_with_center() -> Vec<PointF> {
        vec![
            PointF::new(0.0, 0.0),
            PointF::new(10.0, 0.0),
            PointF::new(10.0, 10.0),
            PointF::new(0.0, 10.0),
            PointF::new(5.0, 5.0),
        ]
    }

    #[test]
    fn test_voronoi_square_with_center() {
        let diagram = VoronoiDiagram::build(&square_with_center());
        // Only the four spokes to the center have finite duals.
        assert_eq!(diagram.len(), 4);
        for edge in diagram.edges() {
            assert_eq!(edge.sites.1, 4);
            assert!((edge.vertex0.distance(&edge.vertex1) - 50f64.sqrt()).abs() < 1e-3);
            for v in [edge.vertex0, edge.vertex1] {
                // Vertices sit at the side midpoints.
                let on_side = (v.x.abs() < 1e-3 || (v.x - 10.0).abs() < 1e-3)
                    && (v.y - 5.0).abs() < 1e-3
                    || (v.y.abs() < 1e-3 || (v.y - 10.0).abs() < 1e-3) && (v.x - 5.0).abs() < 1e-3;
                assert!(on_side, "unexpected vertex {:?}", v);
            }
        }
    }

    #[test]
    fn test_voronoi_vertices_equidistant() {
        let sites: Vec<PointF> = (0..40)
            .map(|i| {
                let a = i as f64 * 0.7;
                PointF::new(100.0 * a.cos() + i as f64, 60.0 * a.sin() - i as f64 * 0.5)
            })
            .collect();
        let diagram = VoronoiDiagram::build(&sites);
        assert!(!diagram.is_empty());
        for edge in diagram.edges() {
            let (a, b) = (sites[edge.sites.0], sites[edge.sites.1]);
            for v in [edge.vertex0, edge.vertex1] {
                assert!((v.distance(&a) - v.distance(&b)).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_voronoi_deterministic() {
        let sites: Vec<PointF> = (0..30)
            .map(|i| PointF::new((i * 37 % 101) as f64, (i * 53 % 97) as f64))
            .collect();
        let a = VoronoiDiagram::build(&sites);
        let b = VoronoiDiagram::build(&sites);
        assert_eq!(a.edges(), b.edges());
    }

    #[test]
    fn test_voronoi_degenerate_inputs() {
        assert!(VoronoiDiagram::build(&[]).is_empty());
        assert!(VoronoiDiagram::build(&[PointF::new(1.0, 1.0), PointF::new(2.0, 2.0)]).is_empty());
        let same = vec![PointF::new(3.0, 3.0); 5];
        assert!(VoronoiDiagram::build(&same).is_empty());
    }
}
