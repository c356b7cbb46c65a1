//! glTF import.
//!
//! Node transforms are accumulated from the scene roots down, so every mesh ends up
//! with its transform relative to the model. Each triangle primitive becomes one
//! [`Mesh`]. Primitives without a material share one extra slot past the file's
//! materials.

use std::path::Path;

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    data_structures::{
        mesh::{Mesh, ModelVertex, compute_tangents},
        model::Model,
    },
    error::ImportError,
    resources::{model_name, read_model_file},
};

pub async fn import_gltf(path: &Path) -> Result<Model, ImportError> {
    let bytes = read_model_file(path).await?;
    let gltf = gltf::Gltf::from_slice(&bytes)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => buffer_data.push(blob.into()),
                None => return Err(ImportError::IncompleteScene(path.to_path_buf())),
            },
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                log::warn!("Embedded buffer data in {} is not supported", path.display());
                return Err(ImportError::UnsupportedFormat(path.to_path_buf()));
            }
            gltf::buffer::Source::Uri(uri) => {
                buffer_data.push(read_model_file(&base_dir.join(uri)).await?);
            }
        }
    }

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| ImportError::IncompleteScene(path.to_path_buf()))?;

    let material_count = gltf.materials().len();
    let mut model = Model::with_material_slots(&model_name(path), material_count);
    let mut needs_default_slot = false;

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        collect_node(
            &node,
            Matrix4::identity(),
            &buffer_data,
            material_count,
            &mut needs_default_slot,
            &mut meshes,
        )?;
    }

    if needs_default_slot {
        model.resize_material_slots(material_count + 1);
    }
    for mesh in meshes {
        model.add_mesh(mesh);
    }
    Ok(model)
}

fn collect_node(
    node: &gltf::Node<'_>,
    parent: Matrix4<f32>,
    buffers: &[Vec<u8>],
    material_count: usize,
    needs_default_slot: &mut bool,
    meshes: &mut Vec<Mesh>,
) -> Result<(), ImportError> {
    let transform = parent * Matrix4::from(node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh {}", mesh.index()));
        let primitive_count = mesh.primitives().len();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping primitive {} of {:?}: only triangle lists are supported",
                    primitive.index(),
                    mesh_name
                );
                continue;
            }
            let name = if primitive_count > 1 {
                format!("{} #{}", mesh_name, primitive.index())
            } else {
                mesh_name.clone()
            };
            let slot = match primitive.material().index() {
                Some(index) => index,
                None => {
                    *needs_default_slot = true;
                    material_count
                }
            };
            let mesh = convert_primitive(&primitive, buffers, &name)?
                .with_relative_transform(transform)
                .with_material_slot(slot);
            meshes.push(mesh);
        }
    }

    for child in node.children() {
        collect_node(
            &child,
            transform,
            buffers,
            material_count,
            needs_default_slot,
            meshes,
        )?;
    }
    Ok(())
}

fn convert_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[Vec<u8>],
    name: &str,
) -> Result<Mesh, ImportError> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .map(|p| p.collect())
        .unwrap_or_default();
    if positions.len() < 3 {
        return Err(ImportError::DegenerateMesh {
            mesh: name.to_string(),
            vertices: positions.len(),
        });
    }

    let mut vertices: Vec<ModelVertex> = positions
        .iter()
        .map(|&position| ModelVertex {
            position,
            ..Default::default()
        })
        .collect();

    if let Some(normals) = reader.read_normals() {
        for (vertex, normal) in vertices.iter_mut().zip(normals) {
            vertex.normal = normal;
        }
    }
    // glTF puts the texture origin top-left; textures are stored bottom row first.
    if let Some(tex_coords) = reader.read_tex_coords(0) {
        for (vertex, [u, v]) in vertices.iter_mut().zip(tex_coords.into_f32()) {
            vertex.tex_coords = [u, 1.0 - v];
        }
    }
    if let Some(colours) = reader.read_colors(0) {
        for (vertex, colour) in vertices.iter_mut().zip(colours.into_rgb_f32()) {
            vertex.colour = colour;
        }
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertices.len() as u32).collect(),
    };

    match reader.read_tangents() {
        Some(tangents) => {
            for (vertex, [x, y, z, _]) in vertices.iter_mut().zip(tangents) {
                vertex.tangent = [x, y, z];
            }
        }
        None => compute_tangents(&mut vertices, &indices),
    }

    Ok(Mesh::new(name, vertices, indices))
}
