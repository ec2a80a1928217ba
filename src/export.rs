use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tempfile::tempdir;

use crate::mesh::{TileMesh, TileMeshes};

impl TileMeshes {
    /// Export all tiles to a GLB file
    pub fn save_glb<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;
        self.export_glb(&mut file)
    }

    /// Export all tiles as one GLB scene, writing to the provided writer
    ///
    /// Each tile becomes its own mesh and node; the node carries the tile's
    /// local-to-world placement and the mesh keeps its local positions.
    pub fn export_glb<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        // mesh-tools only exports to a path
        let temp_dir = tempdir()?;
        let temp_file_path = temp_dir.path().join("water.glb");

        let mut builder = mesh_tools::GltfBuilder::new();

        let water_material = builder.create_metallic_material(
            Some("WaterMaterial".to_string()),
            [0.0, 0.4, 0.8, 0.8],
            0.9,
            0.1,
        );

        if let Some(materials) = &mut builder.gltf.materials {
            if let Some(material) = materials.get_mut(water_material) {
                material.double_sided = Some(true);
                material.alpha_mode = Some("BLEND".to_string());
            }
        }

        let mut tile_nodes = Vec::with_capacity(self.meshes.len());

        for (id, tile) in self.meshes.iter().enumerate() {
            let (positions, normals, texcoords, triangles) = gltf_arrays(tile);

            let mesh_index = builder.create_simple_mesh(
                Some(format!("WaterTile_{}", id)),
                &positions,
                &triangles,
                Some(normals),
                Some(texcoords),
                Some(water_material),
            );

            let (scale, rotation, translation) = tile.local_to_world.to_scale_rotation_translation();
            let node_index = builder.add_node(
                Some(format!("WaterTileNode_{}", id)),
                Some(mesh_index),
                Some(translation.to_array()),
                Some(rotation.to_array()),
                Some(scale.to_array()),
            );
            tile_nodes.push(node_index);
        }

        let surface = builder.add_node_with_children(
            Some("WaterSurface".to_string()),
            None,
            None,
            None,
            None,
            tile_nodes,
        );

        let scene_index = builder.add_scene(Some("WaterScene".to_string()), Some(vec![surface]));
        builder.gltf.scene = Some(scene_index);

        let temp_file_str = temp_file_path.to_str().ok_or_else(|| {
            io::Error::new(io::ErrorKind::Other, "Failed to convert path to string")
        })?;

        builder.export_glb(temp_file_str).map_err(|e| {
            io::Error::new(io::ErrorKind::Other, format!("Failed to export GLB: {}", e))
        })?;

        let glb_data = std::fs::read(&temp_file_path)?;
        writer.write_all(&glb_data)?;

        Ok(())
    }
}

type GltfArrays = (
    Vec<nalgebra::Point3<f32>>,
    Vec<nalgebra::Vector3<f32>>,
    Vec<nalgebra::Vector2<f32>>,
    Vec<mesh_tools::Triangle>,
);

fn gltf_arrays(tile: &TileMesh) -> GltfArrays {
    let positions = tile
        .positions
        .iter()
        .map(|p| nalgebra::Point3::new(p.x, p.y, p.z))
        .collect();
    let normals = tile
        .normals
        .iter()
        .map(|n| nalgebra::Vector3::new(n.x, n.y, n.z))
        .collect();
    let texcoords = tile
        .uvs
        .iter()
        .map(|uv| nalgebra::Vector2::new(uv.x, uv.y))
        .collect();
    let triangles = tile
        .indices
        .chunks_exact(3)
        .map(|t| mesh_tools::Triangle::new(t[0], t[1], t[2]))
        .collect();

    (positions, normals, texcoords, triangles)
}
