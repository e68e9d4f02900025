//! Subdivided icosahedron meshes.
//!
//! Each of the 20 base faces is split into a triangular grid with
//! `detail + 1` segments per edge, so a face holds `(detail + 1)²`
//! triangles. Grid vertices are shared inside a face and duplicated along
//! face edges; every vertex is projected onto the sphere.

use glam::Vec3;

/// Golden ratio, the icosahedron's long/short edge proportion.
const PHI: f32 = 1.618_034;

const BASE_VERTICES: [[f32; 3]; 12] = [
    [-1.0, PHI, 0.0],
    [1.0, PHI, 0.0],
    [-1.0, -PHI, 0.0],
    [1.0, -PHI, 0.0],
    [0.0, -1.0, PHI],
    [0.0, 1.0, PHI],
    [0.0, -1.0, -PHI],
    [0.0, 1.0, -PHI],
    [PHI, 0.0, -1.0],
    [PHI, 0.0, 1.0],
    [-PHI, 0.0, -1.0],
    [-PHI, 0.0, 1.0],
];

/// Counter-clockwise when seen from outside.
const BASE_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// Indexed triangle mesh with per-vertex normals.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// Object-space positions.
    pub positions: Vec<[f32; 3]>,
    /// Unit normals, one per position.
    pub normals: Vec<[f32; 3]>,
    /// Triangle list, counter-clockwise front faces.
    pub indices: Vec<u32>,
}

impl Geometry {
    /// Icosahedron of the given radius subdivided `detail` times.
    #[must_use]
    pub fn icosahedron(radius: f32, detail: u32) -> Self {
        let cols = detail as usize + 1;
        let per_face = (cols + 1) * (cols + 2) / 2;
        let mut positions = Vec::with_capacity(BASE_FACES.len() * per_face);
        let mut normals = Vec::with_capacity(BASE_FACES.len() * per_face);
        let mut indices =
            Vec::with_capacity(BASE_FACES.len() * cols * cols * 3);

        for face in BASE_FACES {
            let [a, b, c] = face.map(|i| Vec3::from(BASE_VERTICES[i]));
            let base = positions.len() as u32;

            // Row i runs from lerp(a, c) to lerp(b, c) and holds
            // cols - i + 1 vertices.
            for i in 0..=cols {
                let t = i as f32 / cols as f32;
                let row_start = a.lerp(c, t);
                let row_end = b.lerp(c, t);
                let rows = cols - i;
                for j in 0..=rows {
                    let p = if rows == 0 {
                        row_start
                    } else {
                        row_start.lerp(row_end, j as f32 / rows as f32)
                    };
                    let n = p.normalize();
                    positions.push((n * radius).to_array());
                    normals.push(n.to_array());
                }
            }

            let row_offset = |i: usize| -> usize {
                // Vertices in rows 0..i
                i * (cols + 1) - i * (i.saturating_sub(1)) / 2
            };
            let vertex = |i: usize, j: usize| -> u32 {
                base + (row_offset(i) + j) as u32
            };

            for i in 0..cols {
                for j in 0..2 * (cols - i) - 1 {
                    let k = j / 2;
                    if j % 2 == 0 {
                        indices.extend_from_slice(&[
                            vertex(i, k + 1),
                            vertex(i + 1, k),
                            vertex(i, k),
                        ]);
                    } else {
                        indices.extend_from_slice(&[
                            vertex(i, k + 1),
                            vertex(i + 1, k + 1),
                            vertex(i + 1, k),
                        ]);
                    }
                }
            }
        }

        Self {
            positions,
            normals,
            indices,
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_count_follows_detail() {
        for detail in [0, 1, 2, 16] {
            let g = Geometry::icosahedron(1.0, detail);
            let cols = detail as usize + 1;
            assert_eq!(g.triangle_count(), 20 * cols * cols);
            assert_eq!(g.vertex_count(), 20 * (cols + 1) * (cols + 2) / 2);
        }
    }

    #[test]
    fn detail_zero_is_the_plain_icosahedron() {
        let g = Geometry::icosahedron(1.0, 0);
        assert_eq!(g.triangle_count(), 20);
        assert_eq!(g.vertex_count(), 60);
    }

    #[test]
    fn every_vertex_lies_on_the_sphere() {
        let g = Geometry::icosahedron(2.5, 3);
        for (p, n) in g.positions.iter().zip(&g.normals) {
            let p = Vec3::from(*p);
            assert!((p.length() - 2.5).abs() < 1e-5);
            assert!((Vec3::from(*n) - p / 2.5).length() < 1e-5);
        }
    }

    #[test]
    fn indices_stay_in_range() {
        let g = Geometry::icosahedron(1.0, 4);
        let max = g.vertex_count() as u32;
        assert!(g.indices.iter().all(|&i| i < max));
    }

    #[test]
    fn triangles_face_outward() {
        let g = Geometry::icosahedron(1.0, 5);
        for tri in g.indices.chunks_exact(3) {
            let [a, b, c] =
                [tri[0], tri[1], tri[2]].map(|i| Vec3::from(g.positions[i as usize]));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
    }
}
