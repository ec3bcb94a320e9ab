//! Spatial search: vertices and edges in a box, snapping a location to the
//! closest edge.

use butterfly_common::location::{interpolate, project_on_segment};
use butterfly_common::{BoundingBox, EdgeId, Location, Result, VertexId};
use rustc_hash::FxHashSet;

use crate::config::SnapSettings;
use crate::cost::CostFunction;
use crate::enumerator::RoutingNetworkEdgeEnumerator;
use crate::network::RoutingNetwork;
use crate::tiles::TileRange;

/// Largest offset, the end of an edge.
pub const MAX_OFFSET: u16 = u16::MAX;

/// A point on an edge, as a fraction of its length from vertex1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapPoint {
    pub edge: EdgeId,
    pub offset: u16,
}

impl SnapPoint {
    pub const fn new(edge: EdgeId, offset: u16) -> Self {
        Self { edge, offset }
    }

    /// Offset as a fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        self.offset as f64 / MAX_OFFSET as f64
    }

    /// Location of the point along the edge shape.
    pub fn location(&self, network: &RoutingNetwork) -> Option<Location> {
        let mut enumerator = network.edge_enumerator();
        if !enumerator.move_to_edge(self.edge, true) {
            return None;
        }
        let points = enumerator.complete_shape();
        let (first, rest) = points.split_first()?;

        let total: f64 = points.windows(2).map(|w| w[0].distance_estimate(&w[1])).sum();
        let target = total * self.fraction();
        let mut walked = 0.0;
        let mut previous = first;
        for point in rest {
            let segment = previous.distance_estimate(point);
            if segment > 0.0 && walked + segment >= target {
                return Some(interpolate(previous, point, (target - walked) / segment));
            }
            walked += segment;
            previous = point;
        }
        Some(*previous)
    }
}

/// Vertices inside the box.
pub fn search_vertices_in_box(
    network: &RoutingNetwork,
    bbox: &BoundingBox,
) -> Result<Vec<(VertexId, Location)>> {
    let range = TileRange::new(bbox, network.zoom())?;
    let mut vertices = Vec::new();
    for tile in &range {
        let Some(tile) = network.tile(tile.local_id()) else {
            continue;
        };
        vertices.extend(tile.vertices().filter(|(_, location)| bbox.contains(location)));
    }
    Ok(vertices)
}

/// Distinct edges with at least one endpoint inside the box.
pub fn search_edges_in_box(network: &RoutingNetwork, bbox: &BoundingBox) -> Result<Vec<EdgeId>> {
    let mut enumerator = network.edge_enumerator();
    let mut seen = FxHashSet::default();
    let mut edges = Vec::new();
    for (vertex, _) in search_vertices_in_box(network, bbox)? {
        if !enumerator.move_to(vertex) {
            continue;
        }
        while enumerator.move_next() {
            if seen.insert(enumerator.edge_id()) {
                edges.push(enumerator.edge_id());
            }
        }
    }
    Ok(edges)
}

/// Snaps the center of the box to the closest acceptable edge with an
/// endpoint in the box.
///
/// Distances are equirectangular estimates. A candidate closer than
/// `exact_tolerance_m` ends the search. `Ok(None)` when no acceptable edge is
/// found.
pub fn snap_in_box<F>(
    network: &RoutingNetwork,
    bbox: &BoundingBox,
    exact_tolerance_m: f64,
    mut acceptable: F,
) -> Result<Option<SnapPoint>>
where
    F: FnMut(&RoutingNetworkEdgeEnumerator<'_>) -> bool,
{
    let center = bbox.center();
    let mut enumerator = network.edge_enumerator();
    let mut seen = FxHashSet::default();
    let mut best: Option<(f64, SnapPoint)> = None;

    'vertices: for (vertex, _) in search_vertices_in_box(network, bbox)? {
        if !enumerator.move_to(vertex) {
            continue;
        }
        while enumerator.move_next() {
            if !seen.insert(enumerator.edge_id()) || !acceptable(&enumerator) {
                continue;
            }

            let best_distance = best.map_or(f64::MAX, |(d, _)| d);
            let points = enumerator.complete_shape();
            let Some((distance, fraction)) = closest_on_polyline(&center, &points, best_distance) else {
                continue;
            };
            if distance >= best_distance {
                continue;
            }

            let fraction = if enumerator.forward() { fraction } else { 1.0 - fraction };
            let offset = (fraction * MAX_OFFSET as f64).round() as u16;
            let point = SnapPoint::new(enumerator.edge_id(), offset);

            if distance < exact_tolerance_m {
                best = Some((0.0, point));
                break 'vertices;
            }
            best = Some((distance, point));
        }
    }

    if let Some((distance, point)) = best {
        tracing::trace!(edge = %point.edge, offset = point.offset, distance, "snapped");
    }
    Ok(best.map(|(_, point)| point))
}

/// Snaps a location using a box of `settings.default_offset_m` around it.
pub fn snap<F>(
    network: &RoutingNetwork,
    location: &Location,
    settings: &SnapSettings,
    acceptable: F,
) -> Result<Option<SnapPoint>>
where
    F: FnMut(&RoutingNetworkEdgeEnumerator<'_>) -> bool,
{
    let bbox = BoundingBox::around(location, settings.default_offset_m);
    snap_in_box(network, &bbox, settings.exact_tolerance_m, acceptable)
}

/// Edge filter accepting edges the cost function can access in at least one
/// direction and stop on.
pub fn acceptable<C>(cost: &C) -> impl Fn(&RoutingNetworkEdgeEnumerator<'_>) -> bool + '_
where
    C: CostFunction + ?Sized,
{
    move |enumerator: &RoutingNetworkEdgeEnumerator<'_>| {
        [true, false].into_iter().any(|forward| {
            let costs = cost.get(enumerator, forward, &[]);
            costs.can_access && costs.can_stop
        })
    }
}

/// Closest point of the polyline to `target` with its fraction of the
/// polyline length, skipping segments that cannot beat `best`.
fn closest_on_polyline(target: &Location, points: &[Location], best: f64) -> Option<(f64, f64)> {
    let (first, _) = points.split_first()?;

    let mut best = best;
    let mut found: Option<(f64, f64)> = None;
    let mut walked = 0.0;

    let mut previous_distance = target.distance_estimate(first);
    if previous_distance < best {
        best = previous_distance;
        found = Some((previous_distance, 0.0));
    }

    for window in points.windows(2) {
        let (a, b) = (&window[0], &window[1]);
        let segment = a.distance_estimate(b);
        let next_distance = target.distance_estimate(b);

        // no point of the segment can be closer than best
        let prunable = previous_distance > best + segment && next_distance > best + segment;
        if !prunable {
            let (t, projected) = project_on_segment(target, a, b);
            let distance = target.distance_estimate(&projected);
            if distance < best {
                best = distance;
                found = Some((distance, walked + t * segment));
            }
        }
        if next_distance < best {
            best = next_distance;
            found = Some((next_distance, walked + segment));
        }

        walked += segment;
        previous_distance = next_distance;
    }

    found.map(|(distance, position)| {
        let fraction = if walked > 0.0 { (position / walked).clamp(0.0, 1.0) } else { 0.0 };
        (distance, fraction)
    })
}
