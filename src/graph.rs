/*!
Adjacency graph over copyable, ordered vertex keys, and Kruskal's minimum
spanning tree. Vertices and their adjacency lists are kept in ascending key
order so that every traversal is deterministic.
*/

use std::collections::BTreeMap;

/// Directed graph with no duplicate edges. Undirected graphs are represented
/// by entering both directions of every edge.
#[derive(Debug, Clone, Default)]
pub struct Graph<T: Copy + Ord> {
    adjacency: BTreeMap<T, Vec<T>>,
}

impl<T: Copy + Ord> Graph<T> {
    pub fn new() -> Self {
        Graph {
            adjacency: BTreeMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.adjacency.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn num_vertices(&self) -> usize {
        self.adjacency.len()
    }

    /// Add a vertex with no edges. The vertex must be new.
    pub fn enter_vertex(&mut self, v: T) {
        let prev = self.adjacency.insert(v, Vec::new());
        assert!(prev.is_none(), "Vertex is already in the graph");
    }

    pub fn contains_vertex(&self, v: T) -> bool {
        self.adjacency.contains_key(&v)
    }

    /// Remove a vertex, which must have no outgoing edges. Returns false if the
    /// vertex was not in the graph.
    pub fn remove_vertex(&mut self, v: T) -> bool {
        match self.adjacency.remove(&v) {
            Some(edges) => {
                assert!(edges.is_empty(), "Cannot remove a vertex with edges");
                true
            }
            None => false,
        }
    }

    fn adjacent(&self, v: T) -> &Vec<T> {
        match self.adjacency.get(&v) {
            Some(edges) => edges,
            None => panic!("Vertex is not in the graph"),
        }
    }

    fn adjacent_mut(&mut self, v: T) -> &mut Vec<T> {
        match self.adjacency.get_mut(&v) {
            Some(edges) => edges,
            None => panic!("Vertex is not in the graph"),
        }
    }

    /// Add the directed edge `v1 -> v2`. Both vertices must be present and the
    /// edge must be new.
    pub fn enter(&mut self, v1: T, v2: T) {
        assert!(self.contains_vertex(v2), "Vertex is not in the graph");
        assert!(!self.contains(v1, v2), "Edge is already in the graph");
        self.adjacent_mut(v1).push(v2);
    }

    pub fn enter_undirected(&mut self, v1: T, v2: T) {
        self.enter(v1, v2);
        self.enter(v2, v1);
    }

    /// Check for the directed edge `v1 -> v2`. Linear in the degree of `v1`.
    pub fn contains(&self, v1: T, v2: T) -> bool {
        self.adjacent(v1).contains(&v2)
    }

    /// Remove the directed edge `v1 -> v2`. Returns false if it didn't exist.
    pub fn remove(&mut self, v1: T, v2: T) -> bool {
        let edges = self.adjacent_mut(v1);
        match edges.iter().position(|v| *v == v2) {
            Some(i) => {
                edges.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn remove_undirected(&mut self, v1: T, v2: T) -> bool {
        let r1 = self.remove(v1, v2);
        let r2 = self.remove(v2, v1);
        assert_eq!(r1, r2, "Edge is only present in one direction");
        r1
    }

    pub fn out_degree(&self, v: T) -> usize {
        self.adjacent(v).len()
    }

    /// Vertices in ascending order.
    pub fn vertices(&self) -> impl Iterator<Item = T> + use<'_, T> {
        self.adjacency.keys().copied()
    }

    /// Targets of the edges going out of `v`, in the order they were entered.
    pub fn edges(&self, v: T) -> impl Iterator<Item = T> + use<'_, T> {
        self.adjacent(v).iter().copied()
    }

    /// Add all edges of `other` that are not already in this graph. Every
    /// vertex of `other` must already be in this graph.
    pub fn add(&mut self, other: &Graph<T>) {
        for (&v1, targets) in other.adjacency.iter() {
            let edges = self.adjacent_mut(v1);
            for &v2 in targets {
                if !edges.contains(&v2) {
                    edges.push(v2);
                }
            }
        }
    }
}

/// Disjoint sets over `0..n` with path compression and union by rank.
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Representative of the set containing `i`.
    pub fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut i = i;
        while self.parent[i] != root {
            let next = self.parent[i];
            self.parent[i] = root;
            i = next;
        }
        root
    }

    /// Merge the sets containing `i` and `j`. Returns false if they were
    /// already the same set.
    pub fn unify(&mut self, i: usize, j: usize) -> bool {
        let (ri, rj) = (self.find(i), self.find(j));
        if ri == rj {
            return false;
        }
        match self.rank[ri].cmp(&self.rank[rj]) {
            std::cmp::Ordering::Less => self.parent[ri] = rj,
            std::cmp::Ordering::Greater => self.parent[rj] = ri,
            std::cmp::Ordering::Equal => {
                self.parent[rj] = ri;
                self.rank[ri] += 1;
            }
        }
        true
    }
}

/// Kruskal's minimum spanning tree. `tree` must contain the vertices to span
/// and no edges. The undirected edges of `graph` between those vertices are
/// sorted by `weight`, and each one that joins two different components is
/// added to `tree` in both directions. Returns true if `tree` ends up
/// connected.
pub fn minimum_spanning_tree<T, F>(graph: &Graph<T>, weight: F, tree: &mut Graph<T>) -> bool
where
    T: Copy + Ord,
    F: Fn(T, T) -> f32,
{
    let index: BTreeMap<T, usize> = tree.vertices().enumerate().map(|(i, v)| (v, i)).collect();
    let nv = index.len();
    let mut edges: Vec<(usize, usize, T, T, f32)> = Vec::new();
    for (&v1, &i1) in index.iter() {
        for v2 in graph.edges(v1) {
            if v1 >= v2 {
                continue;
            }
            if let Some(&i2) = index.get(&v2) {
                edges.push((i1, i2, v1, v2, weight(v1, v2)));
            }
        }
    }
    // Stable, so equal weights keep the deterministic enumeration order.
    edges.sort_by(|a, b| a.4.total_cmp(&b.4));
    let mut sets = UnionFind::new(nv);
    let mut nadded = 0usize;
    for (i1, i2, v1, v2, _) in edges {
        if nadded + 1 >= nv {
            break;
        }
        if sets.unify(i1, i2) {
            tree.enter_undirected(v1, v2);
            nadded += 1;
        }
    }
    nadded + 1 >= nv
}
