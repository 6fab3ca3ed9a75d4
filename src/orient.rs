/*!
Consistent orientation of tangent planes. The sign of each normal is
propagated along a minimum spanning tree of the neighbour graph, weighted so
that nearly parallel planes are joined first. Each connected component is
rooted at an exterior anchor linked to its highest point, whose normal is made
to face up.
*/

use crate::{
    graph::{Graph, minimum_spanning_tree},
    tangent::TangentPlane,
};
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

/// Collect the component containing `start` in breadth first order, removing
/// its members from `unvisited`.
fn flood_component(
    start: usize,
    graph: &Graph<usize>,
    unvisited: &mut BTreeSet<usize>,
) -> Vec<usize> {
    let mut nodes = vec![start];
    let mut queue = VecDeque::from([start]);
    unvisited.remove(&start);
    while let Some(i) = queue.pop_front() {
        for j in graph.edges(i) {
            if unvisited.remove(&j) {
                nodes.push(j);
                queue.push_back(j);
            }
        }
    }
    nodes
}

/// The member with the highest origin. Ties go to the lowest index.
fn highest_point(nodes: &[usize], planes: &[TangentPlane]) -> usize {
    let mut best = nodes[0];
    for &i in &nodes[1..] {
        let (z, zbest) = (planes[i].origin.z, planes[best].origin.z);
        if z > zbest || (z == zbest && i < best) {
            best = i;
        }
    }
    best
}

/// Cost of joining two planes in the spanning tree. The anchor has no normal,
/// and counts as parallel to anything.
fn correlation(planes: &[TangentPlane], anchor: usize, i: usize, j: usize) -> f32 {
    let vdot = if i == anchor || j == anchor {
        1.
    } else {
        planes[i].normal.dot(planes[j].normal)
    };
    2. - vdot.abs()
}

fn orient_component(nodes: &[usize], planes: &mut [TangentPlane], graph: &mut Graph<usize>) {
    let anchor = planes.len();
    let top = highest_point(nodes, planes);
    graph.enter_vertex(anchor);
    graph.enter_undirected(top, anchor);
    let mut tree = Graph::new();
    for &i in nodes {
        tree.enter_vertex(i);
    }
    tree.enter_vertex(anchor);
    {
        let planes: &[TangentPlane] = planes;
        let connected =
            minimum_spanning_tree(graph, |i, j| correlation(planes, anchor, i, j), &mut tree);
        assert!(connected, "Component of point {top} is not connected");
    }
    debug!(
        points = nodes.len(),
        exterior_links = tree.out_degree(anchor),
        "Orienting component"
    );
    let mut stack = vec![anchor];
    while let Some(i) = stack.pop() {
        for j in tree.edges(i) {
            if j == anchor || planes[j].oriented {
                continue;
            }
            let vdot = if i == anchor {
                // Entering the component, the normal must face up.
                if planes[j].normal.z < 0. { -1. } else { 1. }
            } else {
                planes[i].normal.dot(planes[j].normal)
            };
            if vdot < 0. {
                planes[j].flip();
            }
            planes[j].oriented = true;
            stack.push(j);
        }
    }
    graph.remove_undirected(top, anchor);
    graph.remove_vertex(anchor);
}

/// Flip the normals of the planes so that neighbouring planes agree. `graph`
/// must have a vertex for the index of every plane. It is temporarily
/// extended with an anchor vertex, and is left as it was. Returns the number
/// of connected components that were oriented.
pub fn orient_tangent_planes(planes: &mut [TangentPlane], graph: &mut Graph<usize>) -> usize {
    assert_eq!(
        graph.num_vertices(),
        planes.len(),
        "Graph and tangent planes don't match"
    );
    for tp in planes.iter_mut() {
        tp.oriented = false;
    }
    let mut unvisited: BTreeSet<usize> = (0..planes.len()).collect();
    let mut ncomponents = 0usize;
    while let Some(&start) = unvisited.first() {
        let mut nodes = flood_component(start, graph, &mut unvisited);
        nodes.sort_unstable();
        orient_component(&nodes, planes, graph);
        ncomponents += 1;
    }
    assert!(
        planes.iter().all(|tp| tp.oriented),
        "Some tangent planes were not oriented"
    );
    ncomponents
}
