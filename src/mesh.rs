use glam::{Mat4, Vec2, Vec3, Vec4};
use rayon::prelude::*;

use crate::driver::GeometrySink;
use crate::error::WaterError;
use crate::tile::TileGeometry;

/// Axis-aligned bounds in a tile's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().fold(
            Bounds {
                min: first,
                max: first,
            },
            |b, &p| Bounds {
                min: b.min.min(p),
                max: b.max.max(p),
            },
        ))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }
}

/// Live geometry of one tile
#[derive(Debug, Clone)]
pub struct TileMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// xyz tangent, w handedness
    pub tangents: Vec<Vec4>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub bounds: Option<Bounds>,
    pub local_to_world: Mat4,
}

impl TileMesh {
    pub fn from_geometry(geometry: &TileGeometry) -> Self {
        let count = geometry.vertices.len();
        TileMesh {
            positions: geometry.vertices.clone(),
            normals: vec![Vec3::Y; count],
            tangents: vec![Vec4::new(1.0, 0.0, 0.0, 1.0); count],
            uvs: geometry.uvs.clone(),
            indices: geometry.indices.clone(),
            bounds: None,
            local_to_world: geometry.tile.local_to_world,
        }
    }

    /// Area-weighted vertex normals from the triangle list.
    pub fn recalculate_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.positions.len()];

        for tri in self.indices.chunks_exact(3) {
            let (i1, i2, i3) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let v1 = self.positions[i1];
            let edge1 = self.positions[i2] - v1;
            let edge2 = self.positions[i3] - v1;
            let normal = edge1.cross(edge2);

            accum[i1] += normal;
            accum[i2] += normal;
            accum[i3] += normal;
        }

        self.normals = accum.into_par_iter().map(Vec3::normalize_or_zero).collect();
    }

    pub fn recalculate_bounds(&mut self) {
        self.bounds = Bounds::from_points(&self.positions);
    }

    /// Per-vertex tangents from UV gradients, orthogonalized against the normals.
    pub fn recalculate_tangents(&mut self) {
        let count = self.positions.len();
        let mut tan = vec![Vec3::ZERO; count];
        let mut bitan = vec![Vec3::ZERO; count];

        for tri in self.indices.chunks_exact(3) {
            let (i1, i2, i3) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let e1 = self.positions[i2] - self.positions[i1];
            let e2 = self.positions[i3] - self.positions[i1];
            let d1 = self.uvs[i2] - self.uvs[i1];
            let d2 = self.uvs[i3] - self.uvs[i1];

            let det = d1.x * d2.y - d2.x * d1.y;
            if det.abs() < f32::EPSILON {
                continue;
            }
            let r = 1.0 / det;
            let sdir = (e1 * d2.y - e2 * d1.y) * r;
            let tdir = (e2 * d1.x - e1 * d2.x) * r;

            for i in [i1, i2, i3] {
                tan[i] += sdir;
                bitan[i] += tdir;
            }
        }

        self.tangents = (0..count)
            .into_par_iter()
            .map(|i| {
                let n = self.normals[i];
                let t = (tan[i] - n * n.dot(tan[i])).normalize_or_zero();
                if t == Vec3::ZERO {
                    return Vec4::new(1.0, 0.0, 0.0, 1.0);
                }
                let w = if n.cross(t).dot(bitan[i]) < 0.0 { -1.0 } else { 1.0 };
                t.extend(w)
            })
            .collect();
    }
}

/// In-memory geometry sink holding one [`TileMesh`] per tile.
#[derive(Debug, Clone, Default)]
pub struct TileMeshes {
    pub meshes: Vec<TileMesh>,
}

impl TileMeshes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tile: usize) -> Option<&TileMesh> {
        self.meshes.get(tile)
    }

    fn mesh_mut(&mut self, tile: usize) -> Result<&mut TileMesh, WaterError> {
        self.meshes.get_mut(tile).ok_or(WaterError::UnknownTile(tile))
    }

    /// Lowest and highest vertex height across all tiles.
    pub fn height_range(&self) -> Option<(f32, f32)> {
        self.meshes
            .iter()
            .flat_map(|m| m.positions.iter())
            .fold(None, |range, p| match range {
                None => Some((p.y, p.y)),
                Some((lo, hi)) => Some((lo.min(p.y), hi.max(p.y))),
            })
    }
}

impl GeometrySink for TileMeshes {
    fn set_geometry(&mut self, tile: usize, geometry: &TileGeometry) -> Result<(), WaterError> {
        let mesh = TileMesh::from_geometry(geometry);
        if tile < self.meshes.len() {
            self.meshes[tile] = mesh;
        } else if tile == self.meshes.len() {
            self.meshes.push(mesh);
        } else {
            return Err(WaterError::UnknownTile(tile));
        }
        Ok(())
    }

    fn set_vertices(&mut self, tile: usize, vertices: &[Vec3]) -> Result<(), WaterError> {
        let mesh = self.mesh_mut(tile)?;
        if mesh.positions.len() != vertices.len() {
            return Err(WaterError::VertexCountMismatch {
                tile,
                expected: mesh.positions.len(),
                got: vertices.len(),
            });
        }
        mesh.positions.copy_from_slice(vertices);
        Ok(())
    }

    fn set_local_to_world(&mut self, tile: usize, local_to_world: Mat4) -> Result<(), WaterError> {
        self.mesh_mut(tile)?.local_to_world = local_to_world;
        Ok(())
    }

    fn recalculate_normals(&mut self, tile: usize) -> Result<(), WaterError> {
        self.mesh_mut(tile)?.recalculate_normals();
        Ok(())
    }

    fn recalculate_bounds(&mut self, tile: usize) -> Result<(), WaterError> {
        self.mesh_mut(tile)?.recalculate_bounds();
        Ok(())
    }

    fn recalculate_tangents(&mut self, tile: usize) -> Result<(), WaterError> {
        self.mesh_mut(tile)?.recalculate_tangents();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{build_tile, TileSource, TileTransform};

    fn flat_geometry() -> TileGeometry {
        let source = TileSource {
            bounds_center: Vec3::ZERO,
            bounds_extents: Vec3::new(1.0, 0.0, 1.0),
            transform: TileTransform::default(),
        };
        build_tile(0, &source, 2, 100.0).unwrap()
    }

    #[test]
    fn test_flat_tile_normals_point_up() {
        let mut mesh = TileMesh::from_geometry(&flat_geometry());
        mesh.normals.iter_mut().for_each(|n| *n = Vec3::ZERO);
        mesh.recalculate_normals();
        for n in &mesh.normals {
            assert!((*n - Vec3::Y).length() < 1e-6, "normal {:?}", n);
        }
    }

    #[test]
    fn test_tilted_normals() {
        let mut mesh = TileMesh::from_geometry(&flat_geometry());
        // Plane y = x rises along +x, so normals lean towards -x
        for p in mesh.positions.iter_mut() {
            p.y = p.x;
        }
        mesh.recalculate_normals();
        let expected = Vec3::new(-1.0, 1.0, 0.0).normalize();
        for n in &mesh.normals {
            assert!((*n - expected).length() < 1e-5, "normal {:?}", n);
        }
    }

    #[test]
    fn test_bounds() {
        let mut mesh = TileMesh::from_geometry(&flat_geometry());
        mesh.positions[3].y = 0.5;
        mesh.positions[7].y = -0.25;
        mesh.recalculate_bounds();
        let bounds = mesh.bounds.unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -0.25, -1.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 0.5, 1.0));
        assert_eq!(bounds.center(), Vec3::new(0.0, 0.125, 0.0));
        assert!(Bounds::from_points(&[]).is_none());
    }

    #[test]
    fn test_tangents_follow_u() {
        let mut mesh = TileMesh::from_geometry(&flat_geometry());
        mesh.recalculate_normals();
        mesh.recalculate_tangents();
        for t in &mesh.tangents {
            assert!((t.truncate() - Vec3::X).length() < 1e-5, "tangent {:?}", t);
            assert!(t.w == 1.0 || t.w == -1.0);
        }
    }

    #[test]
    fn test_sink_rejects_bad_hand_off() {
        let geometry = flat_geometry();
        let mut sink = TileMeshes::new();
        sink.set_geometry(0, &geometry).unwrap();
        assert!(matches!(sink.set_geometry(2, &geometry), Err(WaterError::UnknownTile(2))));
        assert!(matches!(
            sink.set_vertices(0, &[Vec3::ZERO; 3]),
            Err(WaterError::VertexCountMismatch { tile: 0, expected: 25, got: 3 })
        ));
        assert!(matches!(sink.recalculate_normals(1), Err(WaterError::UnknownTile(1))));

        let raised = vec![Vec3::ONE; 25];
        sink.set_vertices(0, &raised).unwrap();
        assert_eq!(sink.get(0).unwrap().positions, raised);
        assert_eq!(sink.height_range(), Some((1.0, 1.0)));
    }
}
