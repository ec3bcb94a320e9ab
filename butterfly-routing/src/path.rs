//! Paths over the network
//!
//! A [`Path`] is a sequence of directed edges. `offset1` is where the path
//! starts on its first edge and `offset2` where it ends on its last edge,
//! both measured in the direction the edge is travelled, `0` being the start
//! of the edge and [`MAX_OFFSET`] its end.

use butterfly_common::{EdgeId, Error, Result, VertexId};
use std::fmt;

use crate::enumerator::RoutingNetworkEdgeEnumerator;
use crate::network::RoutingNetwork;
use crate::search::MAX_OFFSET;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    edge: EdgeId,
    forward: bool,
    from: VertexId,
    to: VertexId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    segments: Vec<Segment>,
    pub offset1: u16,
    pub offset2: u16,
}

impl Default for Path {
    fn default() -> Self {
        Self::new()
    }
}

impl Path {
    /// Empty path covering its edges entirely.
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            offset1: 0,
            offset2: MAX_OFFSET,
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Appends the edge under the enumerator, which must start where the
    /// path ends.
    pub fn append(&mut self, enumerator: &RoutingNetworkEdgeEnumerator<'_>) -> Result<()> {
        let segment = Self::segment(enumerator)?;
        if let Some(last) = self.segments.last() {
            if last.to != segment.from {
                return Err(Error::PathDiscontinuity {
                    edge: segment.edge,
                    expected: last.to,
                    found: segment.from,
                });
            }
        }
        self.segments.push(segment);
        Ok(())
    }

    /// Prepends the edge under the enumerator, which must end where the path
    /// starts.
    pub fn prepend(&mut self, enumerator: &RoutingNetworkEdgeEnumerator<'_>) -> Result<()> {
        let segment = Self::segment(enumerator)?;
        if let Some(first) = self.segments.first() {
            if first.from != segment.to {
                return Err(Error::PathDiscontinuity {
                    edge: segment.edge,
                    expected: first.from,
                    found: segment.to,
                });
            }
        }
        self.segments.insert(0, segment);
        Ok(())
    }

    /// Drops a first edge the path only touches at its end and a last edge
    /// it only touches at its start. A single-edge path is left as is.
    pub fn trim(&mut self) {
        if self.segments.len() > 1 && self.offset1 == MAX_OFFSET {
            self.segments.remove(0);
            self.offset1 = 0;
        }
        if self.segments.len() > 1 && self.offset2 == 0 {
            self.segments.pop();
            self.offset2 = MAX_OFFSET;
        }
    }

    pub fn first(&self) -> Option<(EdgeId, bool)> {
        self.segments.first().map(|s| (s.edge, s.forward))
    }

    pub fn last(&self) -> Option<(EdgeId, bool)> {
        self.segments.last().map(|s| (s.edge, s.forward))
    }

    /// Vertex the first edge is travelled from.
    pub fn start_vertex(&self) -> Option<VertexId> {
        self.segments.first().map(|s| s.from)
    }

    /// Vertex the last edge is travelled to.
    pub fn end_vertex(&self) -> Option<VertexId> {
        self.segments.last().map(|s| s.to)
    }

    /// `(edge, forward, offset1, offset2)` per edge, offsets in travel
    /// direction.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (EdgeId, bool, u16, u16)> + '_ {
        let last = self.segments.len().saturating_sub(1);
        self.segments.iter().enumerate().map(move |(i, s)| {
            let offset1 = if i == 0 { self.offset1 } else { 0 };
            let offset2 = if i == last { self.offset2 } else { MAX_OFFSET };
            (s.edge, s.forward, offset1, offset2)
        })
    }

    /// Length in meters of the covered part of each edge.
    pub fn length(&self, network: &RoutingNetwork) -> Result<f64> {
        let mut enumerator = network.edge_enumerator();
        let mut total = 0.0;
        for (edge, forward, offset1, offset2) in self.iter() {
            if !enumerator.move_to_edge(edge, forward) {
                return Err(Error::EdgeNotFound(edge));
            }
            let covered = offset2.saturating_sub(offset1) as f64 / MAX_OFFSET as f64;
            total += enumerator.length() * covered;
        }
        Ok(total)
    }

    fn segment(enumerator: &RoutingNetworkEdgeEnumerator<'_>) -> Result<Segment> {
        if !enumerator.is_positioned() {
            return Err(Error::EdgeNotFound(enumerator.edge_id()));
        }
        Ok(Segment {
            edge: enumerator.edge_id(),
            forward: enumerator.forward(),
            from: enumerator.from(),
            to: enumerator.to(),
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.offset1)?;
        for (i, (edge, forward, _, _)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ->")?;
            }
            write!(f, " {}{}", edge, if forward { "" } else { "'" })?;
        }
        write!(f, " [{}]", self.offset2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use butterfly_common::Location;

    struct Line {
        network: RoutingNetwork,
        ab: EdgeId,
        bc: EdgeId,
        cd: EdgeId,
    }

    // a -- b -- c -- d
    fn line() -> Line {
        let network = RoutingNetwork::new(14).unwrap();
        let mut mutator = network.mutate();
        let a = mutator.add_vertex(Location::new(4.340, 50.85));
        let b = mutator.add_vertex(Location::new(4.341, 50.85));
        let c = mutator.add_vertex(Location::new(4.342, 50.85));
        let d = mutator.add_vertex(Location::new(4.343, 50.85));
        let ab = mutator.add_edge(a, b, &[], &[]).unwrap();
        let bc = mutator.add_edge(b, c, &[], &[]).unwrap();
        let cd = mutator.add_edge(c, d, &[], &[]).unwrap();
        Line {
            network: mutator.commit(),
            ab,
            bc,
            cd,
        }
    }

    fn path(line: &Line, edges: &[(EdgeId, bool)]) -> Path {
        let mut enumerator = line.network.edge_enumerator();
        let mut path = Path::new();
        for &(edge, forward) in edges {
            assert!(enumerator.move_to_edge(edge, forward));
            path.append(&enumerator).unwrap();
        }
        path
    }

    #[test]
    fn new_path_covers_whole_edges() {
        let path = Path::new();
        assert!(path.is_empty());
        assert_eq!((path.offset1, path.offset2), (0, MAX_OFFSET));
    }

    #[test]
    fn append_and_prepend_check_continuity() {
        let line = line();
        let mut enumerator = line.network.edge_enumerator();
        let mut path = Path::new();

        enumerator.move_to_edge(line.bc, true);
        path.append(&enumerator).unwrap();
        enumerator.move_to_edge(line.ab, true);
        assert!(matches!(path.append(&enumerator), Err(Error::PathDiscontinuity { .. })));
        path.prepend(&enumerator).unwrap();
        enumerator.move_to_edge(line.cd, false);
        assert!(matches!(path.append(&enumerator), Err(Error::PathDiscontinuity { .. })));
        enumerator.move_to_edge(line.cd, true);
        path.append(&enumerator).unwrap();

        assert_eq!(path.len(), 3);
        assert_eq!(path.first(), Some((line.ab, true)));
        assert_eq!(path.last(), Some((line.cd, true)));
    }

    #[test]
    fn unpositioned_enumerator_is_rejected() {
        let line = line();
        let enumerator = line.network.edge_enumerator();
        assert!(Path::new().append(&enumerator).is_err());
    }

    #[test]
    fn trim_drops_untouched_end_edges() {
        let line = line();
        let mut path = path(&line, &[(line.ab, true), (line.bc, true), (line.cd, true)]);
        path.offset1 = MAX_OFFSET;
        path.offset2 = 0;
        path.trim();
        assert_eq!(path.len(), 1);
        assert_eq!(path.first(), Some((line.bc, true)));
        assert_eq!((path.offset1, path.offset2), (0, MAX_OFFSET));

        let mut normal = self::path(&line, &[(line.ab, true), (line.bc, true)]);
        normal.offset1 = 100;
        normal.offset2 = 200;
        normal.trim();
        assert_eq!(normal.len(), 2);

        let mut single = self::path(&line, &[(line.ab, true)]);
        single.offset1 = MAX_OFFSET;
        single.trim();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn iteration_applies_offsets_at_the_ends() {
        let line = line();
        let mut path = path(&line, &[(line.cd, false), (line.bc, false), (line.ab, false)]);
        path.offset1 = 10;
        path.offset2 = 20;
        let items: Vec<_> = path.iter().collect();
        assert_eq!(
            items,
            vec![
                (line.cd, false, 10, MAX_OFFSET),
                (line.bc, false, 0, MAX_OFFSET),
                (line.ab, false, 0, 20),
            ]
        );
    }

    #[test]
    fn length_counts_covered_parts() {
        let line = line();
        let mut path = path(&line, &[(line.ab, true), (line.bc, true)]);
        let full = path.length(&line.network).unwrap();

        let mut enumerator = line.network.edge_enumerator();
        enumerator.move_to_edge(line.ab, true);
        let ab = enumerator.length();
        enumerator.move_to_edge(line.bc, true);
        let bc = enumerator.length();
        assert!((full - (ab + bc)).abs() < 1e-9);

        path.offset1 = MAX_OFFSET / 2;
        let half = path.length(&line.network).unwrap();
        assert!((half - (ab / 2.0 + bc)).abs() < 0.01);
    }

    #[test]
    fn display_lists_edges_and_offsets() {
        let line = line();
        let path = path(&line, &[(line.ab, true), (line.bc, true)]);
        let text = path.to_string();
        assert!(text.starts_with("[0] "));
        assert!(text.ends_with(" [65535]"));
        assert!(text.contains(" -> "));
    }
}
