//! Canonical die geometry and face-value layouts
//!
//! Each die is authored as a vertex list plus value-labelled polygons. The
//! builder orients and fan-triangulates the polygons into a closed convex
//! mesh that doubles as the convex-hull collider, and keeps one
//! [`FaceLayoutEntry`] per polygon. Models are built once and cached; value
//! assignment never depends on randomness.

pub mod d10;
pub mod d12;
pub mod d20;
pub mod d4;
pub mod d6;
pub mod d8;

use glam::Vec3;
use once_cell::sync::Lazy;

use crate::dice3d::types::{DieRole, DieShape};

pub use d10::create_d10;
pub use d12::create_d12;
pub use d20::create_d20;
pub use d4::create_d4;
pub use d6::create_d6;
pub use d8::create_d8;

/// Normals closer than this (as `1 - dot`) belong to the same face.
const NORMAL_TOLERANCE: f32 = 1e-4;

/// One geometric face: outward unit normal in die space plus its value
/// (a d10 uses `0` for its ten face).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceLayoutEntry {
    pub normal: Vec3,
    pub value: u32,
    /// Area centroid of the face, where its label is drawn.
    pub centroid: Vec3,
}

/// Triangles that share one outward normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceGroup {
    pub normal: Vec3,
    pub centroid: Vec3,
    pub area: f32,
}

/// Geometry and face layout of one die shape, at unit circumradius.
#[derive(Clone, Debug, PartialEq)]
pub struct DieModel {
    pub shape: DieShape,
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub faces: Vec<FaceLayoutEntry>,
}

impl DieModel {
    /// Build a model from raw vertices and `(polygon vertex indices, value)` pairs.
    ///
    /// Polygon vertices may be listed in any order; they are sorted
    /// counter-clockwise as seen from outside the solid.
    pub fn from_polygons(shape: DieShape, vertices: &[Vec3], polygons: &[(&[usize], u32)]) -> Self {
        let radius = vertices
            .iter()
            .map(|v| v.length())
            .fold(0.0_f32, f32::max)
            .max(f32::EPSILON);
        let vertices: Vec<Vec3> = vertices.iter().map(|v| *v / radius).collect();

        let mut triangles = Vec::new();
        let mut faces = Vec::with_capacity(polygons.len());

        for (indices, value) in polygons {
            let ring = wind_outward(&vertices, indices);
            for i in 1..ring.len() - 1 {
                triangles.push([ring[0] as u32, ring[i] as u32, ring[i + 1] as u32]);
            }

            let points: Vec<Vec3> = ring.iter().map(|&i| vertices[i]).collect();
            faces.push(FaceLayoutEntry {
                normal: newell_normal(&points),
                value: *value,
                centroid: area_centroid(&points),
            });
        }

        Self {
            shape,
            vertices,
            triangles,
            faces,
        }
    }

    /// Collider / render vertices for a die of circumradius `radius`.
    pub fn scaled_vertices(&self, radius: f32) -> Vec<Vec3> {
        self.vertices.iter().map(|v| *v * radius).collect()
    }

    /// Face groups recovered from the triangle soup.
    pub fn discover_faces(&self) -> Vec<FaceGroup> {
        discover_faces(&self.vertices, &self.triangles)
    }

    /// Layout entry whose normal matches `normal`, if any.
    pub fn face_for_normal(&self, normal: Vec3) -> Option<&FaceLayoutEntry> {
        self.faces
            .iter()
            .find(|f| 1.0 - f.normal.dot(normal) < NORMAL_TOLERANCE)
    }
}

/// Group triangles by (tolerance-deduped) outward normal, keeping each
/// group's area-weighted centroid for label placement.
pub fn discover_faces(vertices: &[Vec3], triangles: &[[u32; 3]]) -> Vec<FaceGroup> {
    let mut groups: Vec<(Vec3, Vec3, f32)> = Vec::new();

    for tri in triangles {
        let [a, b, c] = tri.map(|i| vertices[i as usize]);
        let cross = (b - a).cross(c - a);
        let area = cross.length() * 0.5;
        if area <= f32::EPSILON {
            continue;
        }
        let normal = cross.normalize();
        let centroid = (a + b + c) / 3.0;

        match groups
            .iter_mut()
            .find(|(n, _, _)| 1.0 - n.dot(normal) < NORMAL_TOLERANCE)
        {
            Some((_, weighted, total)) => {
                *weighted += centroid * area;
                *total += area;
            }
            None => groups.push((normal, centroid * area, area)),
        }
    }

    groups
        .into_iter()
        .map(|(normal, weighted, area)| FaceGroup {
            normal,
            centroid: weighted / area,
            area,
        })
        .collect()
}

fn wind_outward(vertices: &[Vec3], indices: &[usize]) -> Vec<usize> {
    let center = indices.iter().map(|&i| vertices[i]).sum::<Vec3>() / indices.len() as f32;
    let axis = center.normalize_or_zero();
    let u = (vertices[indices[0]] - center).normalize_or_zero();
    let w = axis.cross(u);

    let mut ring = indices.to_vec();
    ring.sort_by(|&a, &b| {
        let angle = |i: usize| {
            let d = vertices[i] - center;
            d.dot(w).atan2(d.dot(u))
        };
        angle(a).total_cmp(&angle(b))
    });
    ring
}

fn newell_normal(points: &[Vec3]) -> Vec3 {
    let mut n = Vec3::ZERO;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        n.x += (p.y - q.y) * (p.z + q.z);
        n.y += (p.z - q.z) * (p.x + q.x);
        n.z += (p.x - q.x) * (p.y + q.y);
    }
    n.normalize()
}

fn area_centroid(points: &[Vec3]) -> Vec3 {
    let mut weighted = Vec3::ZERO;
    let mut total = 0.0;
    for i in 1..points.len() - 1 {
        let (a, b, c) = (points[0], points[i], points[i + 1]);
        let area = (b - a).cross(c - a).length() * 0.5;
        weighted += (a + b + c) / 3.0 * area;
        total += area;
    }
    weighted / total
}

pub fn create_die_model(shape: DieShape) -> DieModel {
    match shape {
        DieShape::Tetrahedron => create_d4(),
        DieShape::Cube => create_d6(),
        DieShape::Octahedron => create_d8(),
        DieShape::Trapezohedron => create_d10(),
        DieShape::Dodecahedron => create_d12(),
        DieShape::Icosahedron => create_d20(),
    }
}

static MODELS: Lazy<Vec<DieModel>> =
    Lazy::new(|| DieShape::ALL.iter().map(|s| create_die_model(*s)).collect());

/// Cached model for `shape`.
pub fn die_model(shape: DieShape) -> &'static DieModel {
    &MODELS[shape.index()]
}

/// Text printed on a face: d10 faces read `0`-`9`, the percentile tens die
/// reads `00`-`90`.
pub fn label_text(shape: DieShape, role: DieRole, value: u32) -> String {
    match (shape, role) {
        (DieShape::Trapezohedron, DieRole::PercentileTens) => format!("{}0", value),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted_values(model: &DieModel) -> Vec<u32> {
        let mut values: Vec<u32> = model.faces.iter().map(|f| f.value).collect();
        values.sort();
        values
    }

    #[test]
    fn test_face_tables_are_permutations() {
        for shape in DieShape::ALL {
            let model = die_model(shape);
            let n = shape.face_count() as u32;
            let expected: Vec<u32> = if shape == DieShape::Trapezohedron {
                (0..n).collect()
            } else {
                (1..=n).collect()
            };
            assert_eq!(sorted_values(model), expected, "{shape:?}");
        }
    }

    #[test]
    fn test_discovered_faces_match_layout() {
        for shape in DieShape::ALL {
            let model = die_model(shape);
            let groups = model.discover_faces();
            assert_eq!(groups.len(), shape.face_count(), "{shape:?}");

            for group in &groups {
                let matches = model
                    .faces
                    .iter()
                    .filter(|f| 1.0 - f.normal.dot(group.normal) < NORMAL_TOLERANCE)
                    .count();
                assert_eq!(matches, 1, "{shape:?} group {:?}", group.normal);

                let face = model.face_for_normal(group.normal).unwrap();
                assert!(face.centroid.distance(group.centroid) < 1e-4);
            }
        }
    }

    #[test]
    fn test_faces_point_outward_and_mesh_is_convex() {
        for shape in DieShape::ALL {
            let model = die_model(shape);
            for face in &model.faces {
                assert!(face.normal.dot(face.centroid) > 0.0, "{shape:?}");
                let offset = face.normal.dot(face.centroid);
                for v in &model.vertices {
                    assert!(face.normal.dot(*v) <= offset + 1e-4, "{shape:?} not convex");
                }
            }
        }
    }

    #[test]
    fn test_unit_circumradius() {
        for shape in DieShape::ALL {
            let max = die_model(shape)
                .vertices
                .iter()
                .map(|v| v.length())
                .fold(0.0, f32::max);
            assert!((max - 1.0).abs() < 1e-5, "{shape:?}");
        }
    }

    #[test]
    fn test_opposite_faces_sum() {
        let cases = [
            (DieShape::Cube, 7),
            (DieShape::Octahedron, 9),
            (DieShape::Trapezohedron, 9),
            (DieShape::Dodecahedron, 13),
            (DieShape::Icosahedron, 21),
        ];
        for (shape, total) in cases {
            let model = die_model(shape);
            for face in &model.faces {
                let opposite = model.face_for_normal(-face.normal).unwrap();
                assert_eq!(face.value + opposite.value, total, "{shape:?}");
            }
        }
    }

    #[test]
    fn test_model_builder_is_deterministic() {
        for shape in DieShape::ALL {
            assert_eq!(create_die_model(shape), create_die_model(shape));
            assert_eq!(&create_die_model(shape), die_model(shape));
        }
    }

    #[test]
    fn test_label_text() {
        assert_eq!(label_text(DieShape::Trapezohedron, DieRole::PercentileTens, 0), "00");
        assert_eq!(label_text(DieShape::Trapezohedron, DieRole::PercentileTens, 7), "70");
        assert_eq!(label_text(DieShape::Trapezohedron, DieRole::PercentileOnes, 0), "0");
        assert_eq!(label_text(DieShape::Icosahedron, DieRole::Single, 20), "20");
    }
}
