//! Width-bounded medial axis extraction.
//!
//! The boundary of a region is sampled into point sites, each remembering the
//! boundary segment or vertex it came from. The Voronoi diagram of those sites
//! approximates the diagram of the segments themselves once edges between
//! sites of the same boundary feature are discarded. The surviving interior
//! edges are filtered by local wall thickness and stitched into polylines.

use super::voronoi::VoronoiDiagram;
use super::{ExPolygon, Line, Lines, MultiPoint, Point, PointF, Polylines, ThickPolyline, ThickPolylines};
use crate::CoordF;
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet};

/// Upper bound on the number of boundary samples.
pub const MAX_SITES: usize = 6000;

/// Slack for width comparisons so a wall exactly `min_width` thick survives rounding.
const WIDTH_EPSILON: CoordF = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SiteSource {
    /// Interior sample of a boundary segment.
    Segment(usize),
    /// Boundary vertex between two segments.
    Vertex { prev: usize, next: usize },
}

#[derive(Clone, Copy, Debug)]
struct Site {
    point: PointF,
    source: SiteSource,
}

#[derive(Clone, Copy, Debug)]
struct GraphEdge {
    from: usize,
    to: usize,
    from_width: CoordF,
    to_width: CoordF,
}

/// Medial axis of one region, limited to walls between `min_width` and `max_width`.
pub struct MedialAxis<'a> {
    expolygon: &'a ExPolygon,
    min_width: CoordF,
    max_width: CoordF,
    lines: Lines,
    sites: Vec<Site>,
}

impl<'a> MedialAxis<'a> {
    pub fn new(expolygon: &'a ExPolygon, min_width: CoordF, max_width: CoordF) -> Self {
        Self {
            expolygon,
            min_width,
            max_width,
            lines: Vec::new(),
            sites: Vec::new(),
        }
    }

    /// Skeleton without width annotation.
    pub fn build_polylines(self) -> Polylines {
        self.build().iter().map(ThickPolyline::to_polyline).collect()
    }

    /// Width-annotated skeleton.
    pub fn build(mut self) -> ThickPolylines {
        self.sample_boundary();
        if self.sites.len() < 3 {
            return Vec::new();
        }

        let points: Vec<PointF> = self.sites.iter().map(|s| s.point).collect();
        let diagram = VoronoiDiagram::build(&points);

        let mut nodes: BTreeMap<Point, usize> = BTreeMap::new();
        let mut node_points: Vec<Point> = Vec::new();
        let mut seen: BTreeSet<(usize, usize)> = BTreeSet::new();
        let mut edges: Vec<GraphEdge> = Vec::new();

        for edge in diagram.edges() {
            let a = edge.vertex0.to_point();
            let b = edge.vertex1.to_point();
            if a == b {
                continue;
            }
            let (sa, sb) = (self.sites[edge.sites.0], self.sites[edge.sites.1]);
            if is_secondary(sa.source, sb.source) {
                continue;
            }
            if !self.expolygon.contains_line(&Line::new(a, b)) {
                continue;
            }
            let (wa, wb) = self.edge_widths(edge.vertex0, edge.vertex1, sa, sb);
            let min = self.min_width - WIDTH_EPSILON;
            let max = self.max_width + WIDTH_EPSILON;
            if (wa < min && wb < min) || (wa > max && wb > max) {
                continue;
            }

            let mut node_of = |p: Point| {
                *nodes.entry(p).or_insert_with(|| {
                    node_points.push(p);
                    node_points.len() - 1
                })
            };
            let (from, to) = (node_of(a), node_of(b));
            if !seen.insert((from.min(to), from.max(to))) {
                continue;
            }
            edges.push(GraphEdge {
                from,
                to,
                from_width: wa,
                to_width: wb,
            });
        }

        trace!(
            "medial axis: {} sites, {} voronoi edges, {} kept",
            self.sites.len(),
            diagram.len(),
            edges.len()
        );

        let graph = Graph::new(node_points, edges, self.min_width, self.max_width);
        let chains = graph.stitch();
        let spur_edges: BTreeSet<usize> = chains
            .iter()
            .filter(|c| graph.is_spur(c, self.max_width))
            .flat_map(|c| c.edges.iter().copied())
            .collect();
        if spur_edges.is_empty() {
            debug!("medial axis: {} polylines", chains.len());
            return chains.into_iter().map(|c| c.polyline).collect();
        }

        // Restitch without the spurs so legs meeting at a former junction
        // become one path. Junctions inside closed structures stay split.
        let pruned = graph.without_edges(&spur_edges, self.min_width, self.max_width);
        let result: ThickPolylines = pruned.stitch().into_iter().map(|c| c.polyline).collect();
        debug!(
            "medial axis: {} polylines ({} spur edges pruned)",
            result.len(),
            spur_edges.len()
        );
        result
    }

    /// Sample every ring into vertex sites and evenly spaced segment sites.
    fn sample_boundary(&mut self) {
        let rings: Vec<Lines> = self.expolygon.rings().map(|r| r.lines()).collect();
        let total: CoordF = rings.iter().flatten().map(Line::length).sum();
        if total <= 0.0 {
            return;
        }
        let step = (self.min_width.max(self.max_width / 8.0) / 4.0)
            .max(total / MAX_SITES as CoordF)
            .max(1.0);

        for ring in rings {
            let base = self.lines.len();
            let nonzero: Vec<usize> = ring
                .iter()
                .enumerate()
                .filter(|(_, l)| !l.is_point())
                .map(|(i, _)| base + i)
                .collect();
            self.lines.extend(ring);

            for (k, &i) in nonzero.iter().enumerate() {
                let prev = nonzero[(k + nonzero.len() - 1) % nonzero.len()];
                let line = self.lines[i];
                self.sites.push(Site {
                    point: line.a.to_f64(),
                    source: SiteSource::Vertex { prev, next: i },
                });
                let len = line.length();
                let pieces = (len / step).ceil() as usize;
                let (a, v) = (line.a.to_f64(), line.vector_f());
                for j in 1..pieces {
                    let t = j as CoordF / pieces as CoordF;
                    self.sites.push(Site {
                        point: a + v * t,
                        source: SiteSource::Segment(i),
                    });
                }
            }
        }
    }

    /// Local wall thickness at both ends of a diagram edge. The diagram has
    /// one edge per site pair, so each edge is measured once.
    fn edge_widths(&self, v0: PointF, v1: PointF, sa: Site, sb: Site) -> (CoordF, CoordF) {
        let width_at = |p: PointF| self.distance_to_source(p, sa) + self.distance_to_source(p, sb);
        (width_at(v0), width_at(v1))
    }

    fn distance_to_source(&self, p: PointF, site: Site) -> CoordF {
        match site.source {
            SiteSource::Segment(i) => distance_to_segment(p, &self.lines[i]),
            SiteSource::Vertex { next, .. } => p.distance(&self.lines[next].a.to_f64()),
        }
    }
}

/// Edges whose two sites belong to the same boundary feature, or to a vertex
/// and one of its own segments, trace the boundary rather than the axis.
fn is_secondary(a: SiteSource, b: SiteSource) -> bool {
    match (a, b) {
        (SiteSource::Segment(i), SiteSource::Segment(j)) => i == j,
        (SiteSource::Vertex { prev, next }, SiteSource::Segment(j))
        | (SiteSource::Segment(j), SiteSource::Vertex { prev, next }) => j == prev || j == next,
        (
            SiteSource::Vertex {
                prev: p1,
                next: n1,
            },
            SiteSource::Vertex {
                prev: p2,
                next: n2,
            },
        ) => n1 == p2 || n2 == p1,
    }
}

fn distance_to_segment(p: PointF, line: &Line) -> CoordF {
    let a = line.a.to_f64();
    let ab = line.vector_f();
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq == 0.0 {
        return p.distance(&a);
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance(&(a + ab * t))
}

/// A stitched run of graph edges between two end nodes.
struct Chain {
    polyline: ThickPolyline,
    first: usize,
    last: usize,
    edges: Vec<usize>,
}

struct Graph {
    points: Vec<Point>,
    edges: Vec<GraphEdge>,
    adjacency: Vec<Vec<usize>>,
    node_width: Vec<CoordF>,
    /// Degree-2 nodes where stitching still stops.
    breaks: Vec<bool>,
}

impl Graph {
    fn new(points: Vec<Point>, edges: Vec<GraphEdge>, min_width: CoordF, max_width: CoordF) -> Self {
        let mut adjacency = vec![Vec::new(); points.len()];
        let mut width_sum = vec![0.0; points.len()];
        for (i, e) in edges.iter().enumerate() {
            adjacency[e.from].push(i);
            adjacency[e.to].push(i);
            width_sum[e.from] += e.from_width;
            width_sum[e.to] += e.to_width;
        }
        // Averaging at the node makes adjoining polylines agree on the width there.
        let node_width = width_sum
            .iter()
            .zip(&adjacency)
            .map(|(sum, adj)| {
                if adj.is_empty() {
                    min_width
                } else {
                    (sum / adj.len() as CoordF).clamp(min_width, max_width)
                }
            })
            .collect();
        let breaks = vec![false; points.len()];
        Self {
            points,
            edges,
            adjacency,
            node_width,
            breaks,
        }
    }

    /// The graph minus `removed` edges. A junction left with two edges is
    /// walked through only when its component still has a free end; in a
    /// closed structure it keeps separating the paths it joined.
    fn without_edges(
        &self,
        removed: &BTreeSet<usize>,
        min_width: CoordF,
        max_width: CoordF,
    ) -> Self {
        let kept = self
            .edges
            .iter()
            .enumerate()
            .filter(|(i, _)| !removed.contains(i))
            .map(|(_, e)| *e)
            .collect();
        let mut graph = Graph::new(self.points.clone(), kept, min_width, max_width);
        let open = graph.reaches_free_end();
        for node in 0..graph.points.len() {
            graph.breaks[node] = self.degree(node) >= 3 && !open[node];
        }
        graph
    }

    /// Nodes connected to some degree-1 node.
    fn reaches_free_end(&self) -> Vec<bool> {
        let mut reached = vec![false; self.points.len()];
        let mut stack: Vec<usize> = (0..self.points.len())
            .filter(|&n| self.degree(n) == 1)
            .collect();
        for &n in &stack {
            reached[n] = true;
        }
        while let Some(node) = stack.pop() {
            for &e in &self.adjacency[node] {
                let next = self.other_end(e, node);
                if !reached[next] {
                    reached[next] = true;
                    stack.push(next);
                }
            }
        }
        reached
    }

    #[inline]
    fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    #[inline]
    fn passes_through(&self, node: usize) -> bool {
        self.degree(node) == 2 && !self.breaks[node]
    }

    #[inline]
    fn other_end(&self, edge: usize, node: usize) -> usize {
        let e = &self.edges[edge];
        if e.from == node {
            e.to
        } else {
            e.from
        }
    }

    /// Chain edges through degree-2 nodes.
    fn stitch(&self) -> Vec<Chain> {
        let mut visited = vec![false; self.edges.len()];
        let mut out = Vec::new();

        for node in 0..self.points.len() {
            if self.passes_through(node) {
                continue;
            }
            for &edge in &self.adjacency[node] {
                if !visited[edge] {
                    out.push(self.walk(node, edge, &mut visited));
                }
            }
        }
        // Whatever is left forms closed loops.
        for edge in 0..self.edges.len() {
            if !visited[edge] {
                out.push(self.walk(self.edges[edge].from, edge, &mut visited));
            }
        }
        out
    }

    fn walk(&self, start: usize, first_edge: usize, visited: &mut [bool]) -> Chain {
        let mut nodes = vec![start];
        let mut edges = Vec::new();
        let mut current = start;
        let mut edge = first_edge;
        loop {
            visited[edge] = true;
            edges.push(edge);
            let next = self.other_end(edge, current);
            nodes.push(next);
            if next == start || !self.passes_through(next) {
                break;
            }
            match self.adjacency[next].iter().find(|&&e| e != edge) {
                Some(&e) if !visited[e] => {
                    edge = e;
                    current = next;
                }
                _ => break,
            }
        }

        let mut pl = ThickPolyline::new();
        for &n in &nodes {
            pl.push(self.points[n], self.node_width[n]);
        }
        let last = nodes[nodes.len() - 1];
        pl.endpoints = (self.degree(start) == 1, self.degree(last) == 1);
        Chain {
            polyline: pl,
            first: start,
            last,
            edges,
        }
    }

    /// A short branch from a junction to a free end.
    fn is_spur(&self, chain: &Chain, max_len: CoordF) -> bool {
        let (d0, d1) = (self.degree(chain.first), self.degree(chain.last));
        let dangling = (d0 == 1 && d1 >= 3) || (d1 == 1 && d0 >= 3);
        dangling && chain.polyline.length() < max_len
    }
}
