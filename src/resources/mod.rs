//! Loading models, textures and materials from external files.
//!
//! Loaders are async and read through `tokio::fs`; textures referenced by a material
//! library are fetched concurrently. Every loader returns its failure instead of
//! logging it, so callers decide whether a missing asset matters.

use std::{
    io::{BufReader, Cursor},
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::Context;

use crate::{
    data_structures::{
        material::Material,
        model::Model,
        texture::{ColourSpace, Texture},
    },
    error::{ImportError, TextureError},
};

pub mod gltf;
pub mod obj;

pub async fn load_string(path: impl AsRef<Path>) -> anyhow::Result<String> {
    let path = path.as_ref();
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("could not read {}", path.display()))
}

pub async fn load_binary(path: impl AsRef<Path>) -> anyhow::Result<Vec<u8>> {
    let path = path.as_ref();
    tokio::fs::read(path)
        .await
        .with_context(|| format!("could not read {}", path.display()))
}

pub(crate) async fn read_model_file(path: &Path) -> Result<Vec<u8>, ImportError> {
    tokio::fs::read(path).await.map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Imports a model, picking the back-end from the file extension.
///
/// On success every mesh carries its accumulated node transform and a material slot
/// within the model's table. The table is sized to the file's material count and
/// starts unassigned.
pub async fn import_model(path: impl AsRef<Path>) -> Result<Model, ImportError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("gltf") | Some("glb") => gltf::import_gltf(path).await,
        Some("obj") => obj::import_obj(path).await,
        _ => Err(ImportError::UnsupportedFormat(path.to_path_buf())),
    }
}

pub async fn load_texture(name: &str, path: impl AsRef<Path>) -> Result<Texture, TextureError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| TextureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Texture::from_bytes(name, &bytes)?.with_path(path))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MapKind {
    BaseColour,
    Specular,
    Normal,
}

/// Builds materials from a Wavefront material library.
///
/// Texture paths are resolved relative to the library. All textures load concurrently;
/// a texture that fails is logged and its map left empty. The result keeps the
/// library's order, which is also the order OBJ material ids refer to.
pub async fn load_mtl_materials(path: impl AsRef<Path>) -> Result<Vec<Material>, ImportError> {
    let path = path.as_ref();
    let text = read_model_file(path).await?;
    let (mtl_materials, _) = tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(text)))?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut requests: Vec<(usize, MapKind, PathBuf)> = Vec::new();
    for (index, m) in mtl_materials.iter().enumerate() {
        let maps = [
            (MapKind::BaseColour, &m.diffuse_texture),
            (MapKind::Specular, &m.specular_texture),
            (MapKind::Normal, &m.normal_texture),
        ];
        for (kind, file) in maps {
            if let Some(file) = file {
                requests.push((index, kind, base_dir.join(file)));
            }
        }
    }

    let loads = requests.iter().map(|(_, _, file)| {
        let name = file.display().to_string();
        async move { load_texture(&name, file).await }
    });
    let textures = futures::future::join_all(loads).await;

    let mut materials: Vec<Material> = mtl_materials
        .iter()
        .map(|m| {
            let mut material = Material::new(&m.name);
            if let Some(shininess) = m.shininess {
                material.shininess = shininess;
            }
            material
        })
        .collect();

    for ((index, kind, file), texture) in requests.into_iter().zip(textures) {
        let texture = match texture {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!(
                    "Material {:?} could not load {}: {}",
                    materials[index].name,
                    file.display(),
                    e
                );
                continue;
            }
        };
        let material = &mut materials[index];
        match kind {
            MapKind::BaseColour => material.base_colour_map = Some(Rc::new(texture)),
            MapKind::Specular => {
                material.specular_map =
                    Some(Rc::new(texture.with_colour_space(ColourSpace::Linear)))
            }
            MapKind::Normal => {
                material.normal_map = Some(Rc::new(texture.with_colour_space(ColourSpace::Linear)))
            }
        }
    }

    Ok(materials)
}

/// Name used for an imported model: the file stem, or the whole path if it has none.
pub(crate) fn model_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
