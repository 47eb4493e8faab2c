//! CPU-side geometry: model files, shapes and per-material meshes.
//!
//! Geometry enters as [`ParsedShape`]s (a flat stream of triangle corners
//! tagged with a material id) and is grouped by [`MeshBuilder`] into one
//! interleaved [`Mesh`] per material.

use std::collections::HashMap;

/// position (3) + texcoord (2) + normal (3)
pub const FLOATS_PER_VERTEX: usize = 8;

/// Byte stride of one interleaved vertex.
pub const VERTEX_STRIDE: usize = FLOATS_PER_VERTEX * std::mem::size_of::<f32>();

/// Material id of faces without a material.
pub const NO_MATERIAL: i32 = -1;

/// One triangle corner as delivered by the geometry parser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub material_id: i32,
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

/// A named group of triangles, three corners per triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedShape {
    pub name: String,
    pub corners: Vec<Corner>,
}

/// Interleaved vertices sharing one material.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub material_id: i32,
    pub vertices: Vec<f32>,
    pub num_vertices: usize,
}

impl Mesh {
    pub fn new(material_id: i32) -> Self {
        Self {
            material_id,
            vertices: Vec::new(),
            num_vertices: 0,
        }
    }

    pub fn has_material(&self) -> bool {
        self.material_id >= 0
    }

    /// Size of the vertex data in bytes, as uploaded to the GPU.
    pub fn byte_len(&self) -> usize {
        self.num_vertices * VERTEX_STRIDE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub name: String,
    pub meshes: Vec<Mesh>,
}

impl From<ParsedShape> for Shape {
    fn from(parsed: ParsedShape) -> Self {
        let mut builder = MeshBuilder::default();
        for c in &parsed.corners {
            builder.add(c.material_id, c.position, c.uv, c.normal);
        }
        Shape {
            name: parsed.name,
            meshes: builder.finish(),
        }
    }
}

/// Groups a stream of vertices into one mesh per material, in the order the
/// materials first appear.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    meshes: Vec<Mesh>,
    slots: HashMap<i32, usize>,
}

impl MeshBuilder {
    pub fn add(&mut self, material_id: i32, position: [f32; 3], uv: [f32; 2], normal: [f32; 3]) {
        let mesh = self.get_or_create(material_id);
        mesh.vertices.extend_from_slice(&position);
        mesh.vertices.extend_from_slice(&uv);
        mesh.vertices.extend_from_slice(&normal);
        mesh.num_vertices += 1;
    }

    pub fn finish(self) -> Vec<Mesh> {
        self.meshes
    }

    fn get_or_create(&mut self, material_id: i32) -> &mut Mesh {
        let slot = match self.slots.get(&material_id) {
            Some(&slot) => slot,
            None => {
                self.meshes.push(Mesh::new(material_id));
                self.slots.insert(material_id, self.meshes.len() - 1);
                self.meshes.len() - 1
            }
        };
        &mut self.meshes[slot]
    }
}

/// Parsed geometry of one model file. Shapes are sorted by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelFile {
    shapes: Vec<Shape>,
}

impl ModelFile {
    /// Stable sort: among equal names the first parsed shape wins lookups.
    pub fn new(mut shapes: Vec<Shape>) -> Self {
        shapes.sort_by(|a, b| a.name.cmp(&b.name));
        Self { shapes }
    }

    pub fn from_parsed(parsed: Vec<ParsedShape>) -> Self {
        Self::new(parsed.into_iter().map(Shape::from).collect())
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shape(&self, index: usize) -> Option<&Shape> {
        self.shapes.get(index)
    }

    /// Binary search by exact, case-sensitive name.
    pub fn find_shape(&self, name: &str) -> Option<usize> {
        let index = self.shapes.partition_point(|s| s.name.as_str() < name);
        match self.shapes.get(index) {
            Some(shape) if shape.name == name => Some(index),
            _ => None,
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.shapes.iter().map(|s| s.meshes.len()).sum()
    }
}
