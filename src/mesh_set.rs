use std::collections::HashMap;

use tracing::warn;

use crate::error::{HalfmeshError, MeshError, Result, TopologyError};
use crate::math::Point3;
use crate::operations::creation::MakeFace;
use crate::operations::modification::{Canonicalize, CollectVertices, MergeFaces, SeparateMeshes};
use crate::operations::query::{Aabb, BoundingBox, Volume};
use crate::operations::stitch::StitchFaces;
use crate::options::MeshOptions;
use crate::topology::{EdgeId, FaceId, MeshId, TopologyStore, VertexData, VertexId};

/// A set of shells sharing one vertex store.
///
/// This is the top-level entry point: build it from points and polygon
/// index runs (or from pre-built faces), and it stitches the faces into
/// [`MeshData`](crate::topology::MeshData) shells.
#[derive(Debug, Clone, Default)]
pub struct MeshSet {
    store: TopologyStore,
    meshes: Vec<MeshId>,
    dropped_faces: usize,
}

impl MeshSet {
    /// Builds a mesh set from length-prefixed polygon index runs.
    ///
    /// `face_indices` holds `n_faces` runs of the form
    /// `[n, v0, v1, .., v(n-1)]`. One vertex is created per input point.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidInput`] if the runs are truncated, do not
    /// number exactly `n_faces`, or reference a point that does not exist.
    /// Degenerate polygons are dropped, or rejected with
    /// [`TopologyError::DegenerateFace`] when [`MeshOptions::strict`] is set.
    pub fn from_indices(
        points: &[Point3],
        n_faces: usize,
        face_indices: &[usize],
        options: MeshOptions,
    ) -> Result<Self> {
        let runs = parse_face_runs(n_faces, face_indices)?;
        Self::build(points, &runs, options)
    }

    /// Builds a mesh set from one index list per polygon.
    ///
    /// # Errors
    ///
    /// Same as [`MeshSet::from_indices`], minus the run-format checks.
    pub fn from_polygons(
        points: &[Point3],
        polygons: &[Vec<usize>],
        options: MeshOptions,
    ) -> Result<Self> {
        let runs: Vec<&[usize]> = polygons.iter().map(Vec::as_slice).collect();
        Self::build(points, &runs, options)
    }

    /// Takes ownership of a store holding disconnected faces and stitches
    /// them.
    ///
    /// # Errors
    ///
    /// Returns an error if a face is missing or listed twice.
    pub fn from_faces(
        mut store: TopologyStore,
        faces: Vec<FaceId>,
        options: MeshOptions,
    ) -> Result<Self> {
        let meshes = StitchFaces::new(faces, options).execute(&mut store)?;
        Ok(Self {
            store,
            meshes,
            dropped_faces: 0,
        })
    }

    fn build(points: &[Point3], runs: &[&[usize]], options: MeshOptions) -> Result<Self> {
        let mut store = TopologyStore::new();
        let verts: Vec<VertexId> = points
            .iter()
            .map(|&p| store.add_vertex(VertexData::new(p)))
            .collect();

        let mut faces = Vec::with_capacity(runs.len());
        let mut dropped_faces = 0;
        for (index, run) in runs.iter().enumerate() {
            let loop_verts = run
                .iter()
                .map(|&i| {
                    verts.get(i).copied().ok_or_else(|| {
                        MeshError::InvalidInput(format!(
                            "face {index} references point {i} of {}",
                            points.len()
                        ))
                    })
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;

            match MakeFace::new(loop_verts).execute(&mut store) {
                Ok(face) => faces.push(face),
                Err(HalfmeshError::Topology(TopologyError::DegenerateFace(reason)))
                    if !options.strict =>
                {
                    warn!(face = index, %reason, "dropping degenerate face");
                    dropped_faces += 1;
                }
                Err(err) => return Err(err),
            }
        }

        let mut set = Self::from_faces(store, faces, options)?;
        set.dropped_faces = dropped_faces;
        Ok(set)
    }

    /// The underlying topology store.
    #[must_use]
    pub fn store(&self) -> &TopologyStore {
        &self.store
    }

    /// Mutable access to the underlying topology store.
    ///
    /// Edits made through the store do not refresh mesh caches on their own.
    pub fn store_mut(&mut self) -> &mut TopologyStore {
        &mut self.store
    }

    /// The shells of the set, in construction order.
    #[must_use]
    pub fn meshes(&self) -> &[MeshId] {
        &self.meshes
    }

    /// Number of input polygons dropped as degenerate.
    #[must_use]
    pub fn dropped_faces(&self) -> usize {
        self.dropped_faces
    }

    /// Iterates over the faces of every shell, shell by shell.
    pub fn faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.meshes
            .iter()
            .filter_map(|&m| self.store.mesh(m).ok())
            .flat_map(|data| data.faces.iter().copied())
    }

    /// Iterates over the vertex store.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &VertexData)> {
        self.store.vertices()
    }

    /// Returns `true` if the set has shells and all of them are closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !self.meshes.is_empty()
            && self
                .meshes
                .iter()
                .all(|&m| self.store.mesh(m).is_ok_and(|d| d.is_closed()))
    }

    /// Total volume of the closed, positive shells.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell references missing entities.
    pub fn volume(&self) -> Result<f64> {
        self.meshes
            .iter()
            .map(|&m| Volume::new(m).execute(&self.store))
            .sum()
    }

    /// Bounding box of every shell, or `None` for an empty set.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell references missing entities.
    pub fn aabb(&self) -> Result<Option<Aabb>> {
        let mut bounds: Option<Aabb> = None;
        for &mesh in &self.meshes {
            if self.store.mesh(mesh)?.faces.is_empty() {
                continue;
            }
            let b = BoundingBox::new(mesh).execute(&self.store)?;
            bounds = Some(bounds.map_or(b, |acc| acc.union(&b)));
        }
        Ok(bounds)
    }

    /// Inverts every shell.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell references missing entities.
    pub fn invert(&mut self) -> Result<()> {
        for &mesh in &self.meshes {
            self.store.invert_mesh(mesh)?;
        }
        Ok(())
    }

    /// Merges the two faces on either side of `edge`.
    ///
    /// See [`MergeFaces`]. Returns the surviving face, or `None` if the merge
    /// was refused.
    ///
    /// # Errors
    ///
    /// Returns an error if `edge` or its neighbourhood is missing.
    pub fn merge_faces(&mut self, edge: EdgeId) -> Result<Option<FaceId>> {
        MergeFaces::new(edge).execute(&mut self.store)
    }

    /// Rebuilds the vertex store from the vertices the shells use,
    /// merging positions that are bit-for-bit equal.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell references missing entities.
    pub fn collect_vertices(&mut self) -> Result<()> {
        CollectVertices::new(self.meshes.clone()).execute(&mut self.store)
    }

    /// Splits shells that are no longer edge-connected.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell references missing entities.
    pub fn separate_meshes(&mut self) -> Result<()> {
        self.meshes = SeparateMeshes::new(self.meshes.clone()).execute(&mut self.store)?;
        Ok(())
    }

    /// Rewrites the set into a canonical layout.
    ///
    /// Vertices are merged and shells separated, then every face starts at
    /// its smallest vertex and faces and shells are sorted by position.
    /// Applying it twice gives the same layout as applying it once.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell references missing entities.
    pub fn canonicalize(&mut self) -> Result<()> {
        let (store, meshes) = Canonicalize::new(self.meshes.clone()).execute(&mut self.store)?;
        self.store = store;
        self.meshes = meshes;
        Ok(())
    }

    /// Exports the set as vertex positions plus one index list per face.
    ///
    /// Positions follow the store's key order; faces follow shell order.
    ///
    /// # Errors
    ///
    /// Returns an error if a shell references missing entities.
    pub fn to_indexed(&self) -> Result<(Vec<Point3>, Vec<Vec<usize>>)> {
        let mut index_of = HashMap::with_capacity(self.store.vertex_count());
        let mut points = Vec::with_capacity(self.store.vertex_count());
        for (id, data) in self.store.vertices() {
            index_of.insert(id, points.len());
            points.push(data.point);
        }

        let mut polygons = Vec::new();
        for face in self.faces() {
            let polygon = self
                .store
                .face_vertices(face)?
                .into_iter()
                .map(|v| {
                    index_of.get(&v).copied().ok_or_else(|| {
                        HalfmeshError::from(TopologyError::EntityNotFound("vertex".into()))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            polygons.push(polygon);
        }
        Ok((points, polygons))
    }
}

/// Splits `[n, v0 .. v(n-1), n, ...]` into `n_faces` index runs.
fn parse_face_runs(n_faces: usize, face_indices: &[usize]) -> Result<Vec<&[usize]>> {
    let mut runs = Vec::with_capacity(n_faces);
    let mut cursor = 0;
    for face in 0..n_faces {
        let &len = face_indices.get(cursor).ok_or_else(|| {
            MeshError::InvalidInput(format!("index runs end before face {face}"))
        })?;
        let run = face_indices.get(cursor + 1..cursor + 1 + len).ok_or_else(|| {
            MeshError::InvalidInput(format!("face {face} needs {len} indices"))
        })?;
        runs.push(run);
        cursor += 1 + len;
    }
    if cursor != face_indices.len() {
        return Err(MeshError::InvalidInput(format!(
            "{} trailing indices after {n_faces} faces",
            face_indices.len() - cursor
        ))
        .into());
    }
    Ok(runs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::operations::query::IsValid;
    use crate::topology::fixtures::{
        cube_points, cube_quads, cube_set, init_tracing, open_box_set, unit_cubes,
    };

    fn flat_runs(polygons: &[Vec<usize>]) -> Vec<usize> {
        polygons
            .iter()
            .flat_map(|p| std::iter::once(p.len()).chain(p.iter().copied()))
            .collect()
    }

    // ── construction ──

    #[test]
    fn length_prefixed_cube() {
        let runs = flat_runs(&cube_quads());
        let set =
            MeshSet::from_indices(&cube_points(2.0), 6, &runs, MeshOptions::default()).unwrap();
        assert_eq!(set.meshes().len(), 1);
        assert!(set.is_closed());
        assert_eq!(set.faces().count(), 6);
        assert_eq!(set.vertices().count(), 8);
        assert_relative_eq!(set.volume().unwrap(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn truncated_runs_rejected() {
        let mut runs = flat_runs(&cube_quads());
        runs.pop();
        let result = MeshSet::from_indices(&cube_points(1.0), 6, &runs, MeshOptions::default());
        assert!(matches!(
            result,
            Err(HalfmeshError::Mesh(MeshError::InvalidInput(_)))
        ));
    }

    #[test]
    fn trailing_indices_rejected() {
        let runs = flat_runs(&cube_quads());
        let result = MeshSet::from_indices(&cube_points(1.0), 5, &runs, MeshOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn out_of_range_point_rejected() {
        let result = MeshSet::from_polygons(
            &cube_points(1.0),
            &[vec![0, 1, 8]],
            MeshOptions::default(),
        );
        assert!(matches!(
            result,
            Err(HalfmeshError::Mesh(MeshError::InvalidInput(_)))
        ));
    }

    #[test]
    fn degenerate_face_dropped_or_rejected() {
        init_tracing();
        let mut polygons = cube_quads();
        polygons.push(vec![0, 1, 1]);

        let set =
            MeshSet::from_polygons(&cube_points(1.0), &polygons, MeshOptions::default()).unwrap();
        assert_eq!(set.dropped_faces(), 1);
        assert!(set.is_closed());

        let strict = MeshSet::from_polygons(
            &cube_points(1.0),
            &polygons,
            MeshOptions::default().strict(true),
        );
        assert!(matches!(
            strict,
            Err(HalfmeshError::Topology(TopologyError::DegenerateFace(_)))
        ));
    }

    #[test]
    fn prebuilt_faces_are_stitched() {
        let mut store = TopologyStore::new();
        let verts: Vec<VertexId> = cube_points(1.0)
            .into_iter()
            .map(|p| store.add_vertex(VertexData::new(p)))
            .collect();
        let faces: Vec<FaceId> = cube_quads()
            .into_iter()
            .map(|q| {
                MakeFace::new(q.into_iter().map(|i| verts[i]).collect())
                    .execute(&mut store)
                    .unwrap()
            })
            .collect();
        let set = MeshSet::from_faces(store, faces, MeshOptions::default()).unwrap();
        assert!(set.is_closed());
        assert!(IsValid::new(set.meshes()[0]).execute(set.store()));
    }

    // ── queries ──

    #[test]
    fn micron_cube_keeps_every_face() {
        let set =
            MeshSet::from_polygons(&cube_points(1e-6), &cube_quads(), MeshOptions::default())
                .unwrap();
        assert_eq!(set.dropped_faces(), 0);
        assert_eq!(set.meshes().len(), 1);
        assert!(set.is_closed());
        assert_relative_eq!(set.volume().unwrap(), 1e-18, max_relative = 1e-9);
    }

    #[test]
    fn face_sharing_cubes_add_up() {
        let (points, polygons) = unit_cubes(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0)]);
        let set = MeshSet::from_polygons(&points, &polygons, MeshOptions::default()).unwrap();
        assert_eq!(set.meshes().len(), 2);
        assert!(set.is_closed());
        assert_relative_eq!(set.volume().unwrap(), 2.0, epsilon = 1e-9);

        let (points, polygons) = unit_cubes(&[
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (0.0, 1.0, 0.0),
            (1.0, 1.0, 0.0),
        ]);
        let set = MeshSet::from_polygons(&points, &polygons, MeshOptions::default()).unwrap();
        assert_eq!(set.meshes().len(), 4);
        assert_relative_eq!(set.volume().unwrap(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn cube_volume_both_windings() {
        for size in [1.0, 2.5] {
            let mut set = cube_set(size);
            assert_relative_eq!(set.volume().unwrap(), size * size * size, epsilon = 1e-9);

            set.invert().unwrap();
            assert!(set.is_closed());
            assert_relative_eq!(set.volume().unwrap(), 0.0);
            set.invert().unwrap();
            assert_relative_eq!(set.volume().unwrap(), size * size * size, epsilon = 1e-9);
        }

        let reversed: Vec<Vec<usize>> = cube_quads()
            .into_iter()
            .map(|q| q.into_iter().rev().collect())
            .collect();
        let mut set =
            MeshSet::from_polygons(&cube_points(1.0), &reversed, MeshOptions::default()).unwrap();
        assert!(set.is_closed());
        assert_relative_eq!(set.volume().unwrap(), 0.0);
        set.invert().unwrap();
        assert_relative_eq!(set.volume().unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn open_box_has_no_volume() {
        let set = open_box_set(1.0);
        assert!(!set.is_closed());
        assert_relative_eq!(set.volume().unwrap(), 0.0);
    }

    #[test]
    fn aabb_spans_cube() {
        let set = cube_set(3.0);
        let aabb = set.aabb().unwrap().unwrap();
        assert_relative_eq!(aabb.min, Point3::origin());
        assert_relative_eq!(aabb.max, Point3::new(3.0, 3.0, 3.0));
        assert!(MeshSet::default().aabb().unwrap().is_none());
    }

    #[test]
    fn indexed_export_roundtrips() {
        let set = cube_set(1.0);
        let (points, polygons) = set.to_indexed().unwrap();
        let again = MeshSet::from_polygons(&points, &polygons, MeshOptions::default()).unwrap();
        assert!(again.is_closed());
        assert_eq!(again.to_indexed().unwrap(), (points, polygons));
    }

    // ── editing ──

    #[test]
    fn merging_cube_faces_keeps_shell_valid() {
        let mut set = cube_set(1.0);
        let mesh = set.meshes()[0];
        let edge = set.store().mesh(mesh).unwrap().closed_edges[0];

        // Folding two perpendicular quads into one face is non-planar but
        // still a valid ring of six edges.
        let merged = set.merge_faces(edge).unwrap().unwrap();
        assert_eq!(set.store().face(merged).unwrap().n_edges, 6);
        let data = set.store().mesh(mesh).unwrap();
        assert_eq!(data.face_count(), 5);
        assert_eq!(data.closed_edges.len(), 11);
        assert!(data.is_closed());
        assert!(IsValid::new(mesh).execute(set.store()));
    }
}
