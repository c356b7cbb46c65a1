//! Wavefront OBJ import.
//!
//! Faces are triangulated and vertices de-duplicated into a single index buffer.
//! OBJ carries no tangents, so they are computed from the triangles. A missing or
//! broken material library is not fatal: the model simply has no material slots beyond
//! the default one.

use std::{
    io::{BufReader, Cursor},
    path::Path,
};

use crate::{
    data_structures::{
        mesh::{Mesh, ModelVertex},
        model::Model,
    },
    error::ImportError,
    resources::{model_name, read_model_file},
};

pub async fn import_obj(path: &Path) -> Result<Model, ImportError> {
    let obj_text = read_model_file(path).await?;
    let obj_cursor = Cursor::new(obj_text);
    let mut obj_reader = BufReader::new(obj_cursor);
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| {
            let mtl_path = base_dir.join(p);
            async move {
                let mtl_text = tokio::fs::read(&mtl_path)
                    .await
                    .map_err(|_| tobj::LoadError::OpenFileFailed)?;
                tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mtl_text)))
            }
        },
    )
    .await?;

    let material_count = match obj_materials {
        Ok(materials) => materials.len(),
        Err(e) => {
            log::warn!(
                "Material library of {} could not be loaded: {}",
                path.display(),
                e
            );
            0
        }
    };

    let mut meshes = Vec::with_capacity(models.len());
    let mut needs_default_slot = false;
    for m in &models {
        let vertex_count = m.mesh.positions.len() / 3;
        if vertex_count < 3 {
            return Err(ImportError::DegenerateMesh {
                mesh: m.name.clone(),
                vertices: vertex_count,
            });
        }
        let slot = match m.mesh.material_id {
            Some(id) if id < material_count => id,
            _ => {
                needs_default_slot = true;
                material_count
            }
        };
        let mesh = Mesh::with_tangents(&m.name, vertices_of(&m.mesh), m.mesh.indices.clone());
        meshes.push(mesh.with_material_slot(slot));
    }

    let slots = material_count + usize::from(needs_default_slot);
    let mut model = Model::with_material_slots(&model_name(path), slots);
    for mesh in meshes {
        model.add_mesh(mesh);
    }
    Ok(model)
}

fn vertices_of(mesh: &tobj::Mesh) -> Vec<ModelVertex> {
    (0..mesh.positions.len() / 3)
        .map(|i| ModelVertex {
            position: [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ],
            colour: [
                mesh.vertex_color.get(i * 3).copied().unwrap_or(1.0),
                mesh.vertex_color.get(i * 3 + 1).copied().unwrap_or(1.0),
                mesh.vertex_color.get(i * 3 + 2).copied().unwrap_or(1.0),
            ],
            tex_coords: [
                mesh.texcoords.get(i * 2).copied().unwrap_or(0.0),
                mesh.texcoords.get(i * 2 + 1).copied().unwrap_or(0.0),
            ],
            normal: [
                mesh.normals.get(i * 3).copied().unwrap_or(0.0),
                mesh.normals.get(i * 3 + 1).copied().unwrap_or(0.0),
                mesh.normals.get(i * 3 + 2).copied().unwrap_or(0.0),
            ],
            tangent: [0.0; 3],
        })
        .collect()
}
