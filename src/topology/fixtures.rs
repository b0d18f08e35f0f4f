//! Shared test geometry.
#![allow(clippy::unwrap_used)]

use crate::math::Point3;
use crate::operations::creation::MakeFace;
use crate::{MeshOptions, MeshSet};

use super::{FaceId, TopologyStore, VertexData, VertexId};

/// Counter-clockwise unit square in the XY plane, as a lone face.
pub fn unit_square_face(store: &mut TopologyStore) -> (FaceId, Vec<VertexId>) {
    let verts: Vec<VertexId> = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
        .iter()
        .map(|&(x, y)| store.add_vertex(VertexData::new(Point3::new(x, y, 0.0))))
        .collect();
    let face = MakeFace::new(verts.clone()).execute(store).unwrap();
    (face, verts)
}

/// Corners of an axis-aligned cube at the origin; index bits are `x | y << 1 | z << 2`.
pub fn cube_points(size: f64) -> Vec<Point3> {
    (0..8)
        .map(|i| {
            let bit = |b: usize| if i & b == 0 { 0.0 } else { size };
            Point3::new(bit(1), bit(2), bit(4))
        })
        .collect()
}

/// Outward-facing quads of [`cube_points`].
pub fn cube_quads() -> Vec<Vec<usize>> {
    vec![
        vec![0, 2, 3, 1],
        vec![4, 5, 7, 6],
        vec![0, 1, 5, 4],
        vec![2, 6, 7, 3],
        vec![0, 4, 6, 2],
        vec![1, 3, 7, 5],
    ]
}

/// A stitched cube of edge length `size`.
pub fn cube_set(size: f64) -> MeshSet {
    MeshSet::from_polygons(&cube_points(size), &cube_quads(), MeshOptions::default()).unwrap()
}

/// A cube with its top face missing.
pub fn open_box_set(size: f64) -> MeshSet {
    let quads: Vec<Vec<usize>> = cube_quads()
        .into_iter()
        .filter(|q| q != &vec![4, 5, 7, 6])
        .collect();
    MeshSet::from_polygons(&cube_points(size), &quads, MeshOptions::default()).unwrap()
}

/// Three quads hinged on the spine from `(0,0,0)` to `(0,0,1)`, like pages of a book.
///
/// The first and third pages run up the spine, the second runs down it.
pub fn book_polygons() -> (Vec<Point3>, Vec<Vec<usize>>) {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 1.0),
        Point3::new(-1.0, 0.0, 1.0),
        Point3::new(-1.0, 0.0, 0.0),
    ];
    let polygons = vec![vec![0, 1, 2, 3], vec![1, 0, 4, 5], vec![0, 1, 6, 7]];
    (points, polygons)
}

/// Two unit cubes touching along the edge `x = 1, y = 1`.
///
/// The second cube is the first shifted by `(1, 1, 0)`; the two corners on
/// the shared edge are shared vertices.
pub fn two_cubes_sharing_edge() -> (Vec<Point3>, Vec<Vec<usize>>) {
    let mut points = cube_points(1.0);
    let mut polygons = cube_quads();

    // Corner 3 is (1,1,0) and corner 7 is (1,1,1); in the shifted cube they
    // are corners 0 and 4.
    let mut remap = [0usize; 8];
    for (i, slot) in remap.iter_mut().enumerate() {
        *slot = match i {
            0 => 3,
            4 => 7,
            _ => {
                let p = cube_points(1.0)[i];
                points.push(Point3::new(p.x + 1.0, p.y + 1.0, p.z));
                points.len() - 1
            }
        };
    }
    polygons.extend(
        cube_quads()
            .into_iter()
            .map(|q| q.into_iter().map(|i| remap[i]).collect::<Vec<_>>()),
    );
    (points, polygons)
}

/// Routes library events to the test output. `RUST_LOG` raises the level.
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

/// Unit cubes at the given corner offsets, with coincident corners shared.
///
/// Neighbouring cubes share whole faces, so every shared face appears twice
/// with opposite winding.
pub fn unit_cubes(offsets: &[(f64, f64, f64)]) -> (Vec<Point3>, Vec<Vec<usize>>) {
    let mut points: Vec<Point3> = Vec::new();
    let mut polygons = Vec::new();
    for &(dx, dy, dz) in offsets {
        let corners: Vec<usize> = cube_points(1.0)
            .into_iter()
            .map(|c| {
                let q = Point3::new(c.x + dx, c.y + dy, c.z + dz);
                points.iter().position(|p| *p == q).unwrap_or_else(|| {
                    points.push(q);
                    points.len() - 1
                })
            })
            .collect();
        polygons.extend(
            cube_quads()
                .into_iter()
                .map(|quad| quad.into_iter().map(|i| corners[i]).collect::<Vec<_>>()),
        );
    }
    (points, polygons)
}
