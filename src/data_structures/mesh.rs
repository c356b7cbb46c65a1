//! Meshes: vertex and index data, a model-local transform and a material slot.
//!
//! Vertex data is immutable once the mesh is built. GPU buffers are created the first
//! time the mesh is drawn.

use std::{cell::OnceCell, fmt};

use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector2, Vector3};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub colour: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
}

impl Default for ModelVertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            colour: [1.0; 3],
            tex_coords: [0.0; 2],
            normal: [0.0; 3],
            tangent: [0.0; 3],
        }
    }
}

impl ModelVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x3,
        4 => Float32x3
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Vertex and index buffers of an uploaded mesh.
#[derive(Debug)]
pub struct MeshBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

pub struct Mesh {
    pub name: String,
    vertices: Vec<ModelVertex>,
    indices: Vec<u32>,
    /// Transform from mesh space into the owning model's space.
    pub relative_transform: Matrix4<f32>,
    /// Index into the owning model's material table.
    pub material_slot: usize,
    gpu: OnceCell<MeshBuffers>,
}

impl fmt::Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mesh")
            .field("name", &self.name)
            .field("vertices", &self.vertices.len())
            .field("indices", &self.indices.len())
            .field("material_slot", &self.material_slot)
            .field("uploaded", &self.is_uploaded())
            .finish()
    }
}

impl Mesh {
    pub fn new(name: &str, vertices: Vec<ModelVertex>, indices: Vec<u32>) -> Self {
        Self {
            name: name.to_string(),
            vertices,
            indices,
            relative_transform: Matrix4::identity(),
            material_slot: 0,
            gpu: OnceCell::new(),
        }
    }

    pub fn with_relative_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.relative_transform = transform;
        self
    }

    pub fn with_material_slot(mut self, slot: usize) -> Self {
        self.material_slot = slot;
        self
    }

    pub fn vertices(&self) -> &[ModelVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.get().is_some()
    }

    /// GPU buffers for this mesh, created on first use.
    pub fn buffers(&self, device: &wgpu::Device) -> &MeshBuffers {
        self.gpu.get_or_init(|| {
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Vertex Buffer", self.name)),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Index Buffer", self.name)),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            MeshBuffers {
                vertex_buffer,
                index_buffer,
                num_elements: self.indices.len() as u32,
            }
        })
    }

    /// A unit quad in the XZ plane facing +Y.
    pub fn quad(name: &str) -> Self {
        let corners = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];
        let vertices = corners
            .iter()
            .map(|&(x, z)| ModelVertex {
                position: [x, 0.0, z],
                tex_coords: [x + 0.5, z + 0.5],
                normal: [0.0, 1.0, 0.0],
                ..Default::default()
            })
            .collect::<Vec<_>>();
        let indices = vec![0, 2, 1, 0, 3, 2];
        Self::with_tangents(name, vertices, indices)
    }

    /// A unit cube centred on the origin with one UV island per face.
    pub fn cube(name: &str) -> Self {
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u_axis, v_axis) in faces {
            let n = Vector3::from(normal);
            let u = Vector3::from(u_axis);
            let v = Vector3::from(v_axis);
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0f32, -1.0f32), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = (n + u * su + v * sv) * 0.5;
                vertices.push(ModelVertex {
                    position: p.into(),
                    tex_coords: [(su + 1.0) * 0.5, (sv + 1.0) * 0.5],
                    normal,
                    tangent: u_axis,
                    ..Default::default()
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(name, vertices, indices)
    }

    /// Build a mesh and fill in tangents from its triangles and texture coordinates.
    pub fn with_tangents(name: &str, mut vertices: Vec<ModelVertex>, indices: Vec<u32>) -> Self {
        compute_tangents(&mut vertices, &indices);
        Self::new(name, vertices, indices)
    }
}

/// Sources without tangents need them calculated for normal maps to work.
///
/// Each triangle contributes one tangent to its three corners; corners shared by
/// several triangles get the average.
pub fn compute_tangents(vertices: &mut [ModelVertex], indices: &[u32]) {
    let mut triangles_included = vec![0u32; vertices.len()];
    let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); vertices.len()];

    for c in indices.chunks_exact(3) {
        let [i0, i1, i2] = [c[0] as usize, c[1] as usize, c[2] as usize];
        if i0 >= vertices.len() || i1 >= vertices.len() || i2 >= vertices.len() {
            continue;
        }
        let (v0, v1, v2) = (vertices[i0], vertices[i1], vertices[i2]);

        let pos0: Vector3<_> = v0.position.into();
        let pos1: Vector3<_> = v1.position.into();
        let pos2: Vector3<_> = v2.position.into();

        let uv0: Vector2<_> = v0.tex_coords.into();
        let uv1: Vector2<_> = v1.tex_coords.into();
        let uv2: Vector2<_> = v2.tex_coords.into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        //     delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        //     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) / det;

        for i in [i0, i1, i2] {
            sums[i] += tangent;
            triangles_included[i] += 1;
        }
    }

    for (i, n) in triangles_included.into_iter().enumerate() {
        if n == 0 {
            continue;
        }
        let averaged = sums[i] / n as f32;
        let averaged = if averaged.magnitude2() > 0.0 {
            averaged.normalize()
        } else {
            averaged
        };
        vertices[i].tangent = averaged.into();
    }
}
