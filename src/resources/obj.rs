//! Wavefront OBJ parsing into [`ParsedShape`]s.

use std::path::Path;

use anyhow::{Context, anyhow};

use crate::data_structures::model::{Corner, NO_MATERIAL, ParsedShape};

/// Parses an OBJ file into named triangle streams.
///
/// Faces are triangulated. tobj starts a new model whenever the material
/// changes, so consecutive models sharing a name are merged back into one
/// shape. A missing or broken `.mtl` only produces a warning: material ids
/// are kept either way.
pub fn parse_obj(path: &Path) -> anyhow::Result<Vec<ParsedShape>> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: false,
            ..Default::default()
        },
    )
    .with_context(|| format!("Failed to load OBJ file '{}'.", path.display()))?;

    if let Err(err) = materials {
        log::warn!("materials of {} could not be loaded: {err}", path.display());
    }

    let mut shapes: Vec<ParsedShape> = Vec::new();
    for model in &models {
        let corners = corners(&model.mesh)
            .with_context(|| format!("malformed object '{}'", model.name))
            .with_context(|| format!("Failed to load OBJ file '{}'.", path.display()))?;

        match shapes.last_mut() {
            Some(last) if last.name == model.name => last.corners.extend(corners),
            _ => shapes.push(ParsedShape {
                name: model.name.clone(),
                corners,
            }),
        }
    }

    log::debug!("parsed {} shapes from {}", shapes.len(), path.display());
    Ok(shapes)
}

fn corners(mesh: &tobj::Mesh) -> anyhow::Result<Vec<Corner>> {
    let material_id = match mesh.material_id {
        Some(id) => i32::try_from(id).context("material id out of range")?,
        None => NO_MATERIAL,
    };

    mesh.indices
        .iter()
        .enumerate()
        .map(|(i, &index)| -> anyhow::Result<Corner> {
            let position = fetch::<3>(&mesh.positions, index)?
                .ok_or_else(|| anyhow!("position index {index} out of range"))?;

            let uv = match mesh.texcoord_indices.get(i) {
                Some(&index) => fetch::<2>(&mesh.texcoords, index)?
                    .ok_or_else(|| anyhow!("texcoord index {index} out of range"))?,
                None => [0.0; 2],
            };

            let normal = match mesh.normal_indices.get(i) {
                Some(&index) => fetch::<3>(&mesh.normals, index)?
                    .ok_or_else(|| anyhow!("normal index {index} out of range"))?,
                None => [0.0; 3],
            };

            Ok(Corner {
                material_id,
                position,
                uv,
                normal,
            })
        })
        .collect()
}

/// Element `index` of a flat array of `N`-component vectors.
fn fetch<const N: usize>(data: &[f32], index: u32) -> anyhow::Result<Option<[f32; N]>> {
    let start = usize::try_from(index)?.checked_mul(N).context("index overflow")?;
    Ok(start
        .checked_add(N)
        .and_then(|end| data.get(start..end))
        .and_then(|slice| <[f32; N]>::try_from(slice).ok()))
}
