/// Triangle-strip batches and the combined vertex buffer
use nalgebra::{Point3, Vector2, Vector3};

/// A vertex as read back from the combined buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub uv: Vector2<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, u: f32, v: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            uv: Vector2::new(u, v),
        }
    }
}

/// One triangle of a strip
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Face normal from the triangle's vertices, `None` for degenerate faces.
    ///
    /// Strips alternate winding, so callers that care about facing must flip
    /// every other triangle themselves.
    pub fn calculate_normal(&self) -> Option<Vector3<f32>> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).try_normalize(1e-12)
    }
}

/// A drawable triangle strip with parallel position and texture streams
#[derive(Debug, Clone, PartialEq)]
pub struct StripBatch {
    pub positions: Vec<[f64; 3]>,
    pub uvs: Vec<[f64; 2]>,
}

impl StripBatch {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            uvs: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            uvs: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, position: [f64; 3], uv: [f64; 2]) {
        self.positions.push(position);
        self.uvs.push(uv);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

impl Default for StripBatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Location of one batch inside the combined buffer, in vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRange {
    pub first: usize,
    pub count: usize,
}

/// All batches packed into one attribute-split buffer.
///
/// Layout is every position (3 floats per vertex, batch order) followed by
/// every texture coordinate (2 floats per vertex, same order). Built once and
/// never resized.
#[derive(Debug, Clone)]
pub struct VertexBuffer {
    data: Vec<f32>,
    vertex_count: usize,
    batches: Vec<BatchRange>,
}

impl VertexBuffer {
    pub fn from_batches(batches: &[StripBatch]) -> Self {
        let vertex_count: usize = batches.iter().map(StripBatch::vertex_count).sum();
        let mut data = Vec::with_capacity(vertex_count * 5);
        let mut ranges = Vec::with_capacity(batches.len());

        let mut first = 0;
        for batch in batches {
            ranges.push(BatchRange {
                first,
                count: batch.vertex_count(),
            });
            first += batch.vertex_count();
            data.extend(batch.positions.iter().flatten().map(|&c| c as f32));
        }
        for batch in batches {
            data.extend(batch.uvs.iter().flatten().map(|&c| c as f32));
        }

        Self {
            data,
            vertex_count,
            batches: ranges,
        }
    }

    /// The whole buffer as uploaded to the GPU
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn positions(&self) -> &[f32] {
        &self.data[..self.uv_offset()]
    }

    pub fn uvs(&self) -> &[f32] {
        &self.data[self.uv_offset()..]
    }

    /// Float offset at which the texture coordinate block starts
    pub fn uv_offset(&self) -> usize {
        self.vertex_count * 3
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn batches(&self) -> &[BatchRange] {
        &self.batches
    }

    pub fn vertex(&self, index: usize) -> Vertex {
        let p = &self.positions()[index * 3..index * 3 + 3];
        let t = &self.uvs()[index * 2..index * 2 + 2];
        Vertex::new(p[0], p[1], p[2], t[0], t[1])
    }

    /// Triangles of the strip covering `count` vertices starting at `first`
    pub fn strip_triangles(
        &self,
        first: usize,
        count: usize,
    ) -> impl Iterator<Item = Triangle> + '_ {
        let end = (first + count).min(self.vertex_count);
        (first..end.saturating_sub(2)).map(move |i| {
            Triangle::new(self.vertex(i), self.vertex(i + 1), self.vertex(i + 2))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(points: &[[f64; 3]]) -> StripBatch {
        let mut batch = StripBatch::new();
        for (i, p) in points.iter().enumerate() {
            batch.push(*p, [i as f64, 0.5]);
        }
        batch
    }

    #[test]
    fn test_buffer_layout_is_attribute_split() {
        let a = batch(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let b = batch(&[[2.0, 2.0, 2.0], [3.0, 3.0, 3.0]]);
        let buffer = VertexBuffer::from_batches(&[a, b]);

        assert_eq!(buffer.vertex_count(), 5);
        assert_eq!(buffer.as_slice().len(), 5 * 3 + 5 * 2);
        assert_eq!(buffer.uv_offset(), 15);
        assert_eq!(&buffer.positions()[9..12], &[2.0, 2.0, 2.0]);
        // second batch uvs follow the first batch uvs
        assert_eq!(&buffer.uvs()[6..8], &[0.0, 0.5]);
        assert_eq!(
            buffer.batches(),
            &[
                BatchRange { first: 0, count: 3 },
                BatchRange { first: 3, count: 2 }
            ]
        );
    }

    #[test]
    fn test_strip_triangles() {
        let a = batch(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
        ]);
        let buffer = VertexBuffer::from_batches(&[a]);
        let triangles: Vec<_> = buffer.strip_triangles(0, 4).collect();
        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[1].vertices[0].position, Point3::new(1.0, 0.0, 0.0));

        let normal = triangles[0].calculate_normal().unwrap();
        assert!((normal - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_degenerate_triangle_has_no_normal() {
        let v = Vertex::new(1.0, 1.0, 1.0, 0.0, 0.0);
        assert!(Triangle::new(v, v, v).calculate_normal().is_none());
    }
}
