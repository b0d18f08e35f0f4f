//! Reconstruction of shell topology from a soup of disconnected faces.
//!
//! Half-edges are matched to oppositely directed half-edges on the same
//! vertex pair. Pairs shared by exactly two half-edges are linked directly;
//! non-manifold pairs are resolved by the radial order of their faces
//! around the edge. Whatever cannot be matched stays open. Faces linked by
//! at least one edge end up in the same [`MeshData`] shell.

mod edge_graph;
mod edge_order;

pub use edge_graph::{EdgeGraph, VertexPair};
pub use edge_order::{
    pair_radially, radial_angle, radial_frame, sort_radially, EdgeOrderData, ANGLE_TOLERANCE,
};

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, trace};

use crate::error::{MeshError, Result};
use crate::math::DisjointSet;
use crate::options::MeshOptions;
use crate::topology::{EdgeId, FaceId, MeshData, MeshId, TopologyStore};

/// Stitches a set of faces into shells.
///
/// Any existing `rev` links of the faces are discarded first, and the faces
/// are detached from the meshes they belonged to.
pub struct StitchFaces {
    faces: Vec<FaceId>,
    options: MeshOptions,
}

impl StitchFaces {
    /// Creates a new `StitchFaces` operation.
    #[must_use]
    pub fn new(faces: Vec<FaceId>, options: MeshOptions) -> Self {
        Self { faces, options }
    }

    /// Executes the operation, returning the shells in order of their first
    /// face in the input.
    ///
    /// # Errors
    ///
    /// Returns an error if a face is listed twice, if a face or one of its
    /// edges is missing from the store, or if a face encloses no area (its
    /// plane is recomputed before the radial ordering reads it). Unmatchable edges are not
    /// errors; they are left open.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<Vec<MeshId>> {
        FaceStitcher::new(&self.faces, self.options)?.build(store)
    }
}

/// Counters reported once stitching finishes.
#[derive(Debug, Default, Clone, Copy)]
struct StitchStats {
    simple: usize,
    complex: usize,
    complex_linked: usize,
    open: usize,
}

/// Per-call stitching context. Built fresh for every call and dropped once
/// the shells exist.
struct FaceStitcher {
    options: MeshOptions,
    faces: Vec<FaceId>,
    face_index: HashMap<FaceId, usize>,
    /// Undirected vertex pair to every half-edge running along it.
    edges: BTreeMap<VertexPair, Vec<EdgeId>>,
    /// Pairs carried by three or more half-edges.
    complex_edges: BTreeSet<VertexPair>,
    face_groups: DisjointSet,
    /// Per face: whether it owns an edge left unmatched.
    is_open: Vec<bool>,
    stats: StitchStats,
}

impl FaceStitcher {
    fn new(faces: &[FaceId], options: MeshOptions) -> Result<Self> {
        let mut face_index = HashMap::with_capacity(faces.len());
        for (i, &face) in faces.iter().enumerate() {
            if face_index.insert(face, i).is_some() {
                return Err(MeshError::InvalidInput(format!("face listed twice at {i}")).into());
            }
        }
        Ok(Self {
            options,
            faces: faces.to_vec(),
            face_index,
            edges: BTreeMap::new(),
            complex_edges: BTreeSet::new(),
            face_groups: DisjointSet::new(faces.len()),
            is_open: vec![false; faces.len()],
            stats: StitchStats::default(),
        })
    }

    fn build(mut self, store: &mut TopologyStore) -> Result<Vec<MeshId>> {
        self.init_edges(store)?;
        self.match_simple_edges(store)?;
        self.construct(store)?;
        self.resolve_open_edges(store)?;
        let meshes = self.build_meshes(store)?;

        debug!(
            faces = self.faces.len(),
            simple = self.stats.simple,
            complex = self.stats.complex,
            complex_linked = self.stats.complex_linked,
            open = self.stats.open,
            meshes = meshes.len(),
            "stitched faces"
        );
        Ok(meshes)
    }

    /// Refreshes face planes, clears old links and buckets every half-edge
    /// by its vertex pair.
    fn init_edges(&mut self, store: &mut TopologyStore) -> Result<()> {
        for &face in &self.faces {
            store.recalc_face(face)?;
            for e in store.face_edges(face)? {
                store.clear_rev(e)?;
                let (a, b) = store.edge_vertices(e)?;
                self.edges.entry(VertexPair::new(a, b)).or_default().push(e);
            }
        }
        Ok(())
    }

    fn face_group_id(&mut self, store: &TopologyStore, edge: EdgeId) -> Result<usize> {
        let index = self.index_of_edge(store, edge)?;
        Ok(self.face_groups.find(index))
    }

    fn index_of_edge(&self, store: &TopologyStore, edge: EdgeId) -> Result<usize> {
        store
            .edge(edge)?
            .face
            .and_then(|f| self.face_index.get(&f).copied())
            .ok_or_else(|| MeshError::Failed("edge outside the stitched faces".into()).into())
    }

    fn join_groups(&mut self, store: &mut TopologyStore, a: EdgeId, b: EdgeId) -> Result<()> {
        store.link_rev(a, b)?;
        let ia = self.index_of_edge(store, a)?;
        let ib = self.index_of_edge(store, b)?;
        if self.face_groups.union(ia, ib) {
            trace!(a = ia, b = ib, "joined face groups");
        }
        Ok(())
    }

    /// Links every vertex pair carried by exactly two opposite half-edges of
    /// different faces, and queues the pairs with three or more.
    fn match_simple_edges(&mut self, store: &mut TopologyStore) -> Result<()> {
        let mut links = Vec::new();
        for (pair, list) in &self.edges {
            match list.as_slice() {
                [a, b] => {
                    let (a_from, a_to) = store.edge_vertices(*a)?;
                    let (b_from, b_to) = store.edge_vertices(*b)?;
                    let opposite = a_from == b_to && a_to == b_from;
                    if opposite && store.edge(*a)?.face != store.edge(*b)?.face {
                        links.push((*a, *b));
                    }
                }
                [_, _, _, ..] => {
                    self.complex_edges.insert(*pair);
                }
                _ => {}
            }
        }
        self.stats.simple = links.len();
        self.stats.complex = self.complex_edges.len();
        for (a, b) in links {
            self.join_groups(store, a, b)?;
        }
        Ok(())
    }

    /// Resolves the non-manifold pairs, one chain of them at a time.
    fn construct(&mut self, store: &mut TopologyStore) -> Result<()> {
        let mut graph = EdgeGraph::build(&self.complex_edges);
        while let Some(path) = graph.extract_path() {
            graph.remove_path(&path);
            for w in path.windows(2) {
                self.resolve_complex_edge(store, VertexPair::new(w[0], w[1]))?;
            }
        }
        Ok(())
    }

    fn resolve_complex_edge(&mut self, store: &mut TopologyStore, pair: VertexPair) -> Result<()> {
        let Some(list) = self.edges.get(&pair).cloned() else {
            return Ok(());
        };
        let from = store.vertex(pair.lo)?.point;
        let to = store.vertex(pair.hi)?.point;
        let axis = to - from;
        let length = axis.norm();
        if length == 0.0 {
            return Ok(());
        }
        let axis = axis / length;
        let frame = radial_frame(&axis);

        let mut order = Vec::with_capacity(list.len());
        for &edge in &list {
            let is_reversed = store.edge(edge)?.vert != pair.lo;
            let face_index = self.index_of_edge(store, edge)?;
            let normal = store.face(self.faces[face_index])?.normal;
            let direction = if is_reversed { -axis } else { axis };
            order.push(EdgeOrderData {
                edge,
                face_index,
                group: self.face_group_id(store, edge)?,
                angle: radial_angle(&normal, &direction, &frame),
                is_reversed,
            });
        }
        sort_radially(&mut order);

        let pairs = pair_radially(&order, self.options.avoid_cavities);
        trace!(
            incident = order.len(),
            linked = pairs.len(),
            "resolved non-manifold edge"
        );
        self.stats.complex_linked += pairs.len();
        for (i, j) in pairs {
            self.join_groups(store, order[i].edge, order[j].edge)?;
        }
        Ok(())
    }

    /// Marks every face owning an unmatched half-edge as open.
    fn resolve_open_edges(&mut self, store: &TopologyStore) -> Result<()> {
        let mut open = 0;
        for list in self.edges.values() {
            for &edge in list {
                if store.edge(edge)?.rev.is_none() {
                    let index = self.index_of_edge(store, edge)?;
                    self.is_open[index] = true;
                    open += 1;
                }
            }
        }
        self.stats.open = open;
        Ok(())
    }

    /// Turns each face group into a mesh, in order of its first face.
    fn build_meshes(&mut self, store: &mut TopologyStore) -> Result<Vec<MeshId>> {
        self.detach_from_old_meshes(store)?;

        let groups = self.face_groups.groups();
        let mut meshes = Vec::with_capacity(groups.len());
        for group in groups {
            let is_open = group.iter().any(|&i| self.is_open[i]);
            let faces: Vec<FaceId> = group.iter().map(|&i| self.faces[i]).collect();
            let mesh = store.add_mesh(MeshData::new(faces.clone()));
            for face in faces {
                store.face_mut(face)?.mesh = Some(mesh);
            }
            store.cache_mesh_edges(mesh)?;
            store.calc_mesh_orientation(mesh)?;
            debug_assert_eq!(is_open, !store.mesh(mesh)?.is_closed());
            meshes.push(mesh);
        }
        Ok(meshes)
    }

    fn detach_from_old_meshes(&self, store: &mut TopologyStore) -> Result<()> {
        let mut touched = BTreeSet::new();
        for &face in &self.faces {
            if let Some(old) = store.face_mut(face)?.mesh.take() {
                touched.insert(old);
            }
        }
        for old in touched {
            let Ok(data) = store.mesh_mut(old) else {
                continue;
            };
            data.faces.retain(|f| !self.face_index.contains_key(f));
            if data.faces.is_empty() {
                store.free_mesh(old);
            } else {
                store.cache_mesh_edges(old)?;
            }
        }
        Ok(())
    }
}
