use glam::Vec3;

use super::DieModel;
use crate::dice3d::types::DieShape;

/// Regular tetrahedron. Each face is named after the vertex it sits
/// opposite to, and a d4 reads the value of the face it rests on.
pub fn create_d4() -> DieModel {
    let vertices = [
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
    ];

    let faces: [(&[usize], u32); 4] = [
        (&[1, 2, 3], 1),
        (&[0, 2, 3], 2),
        (&[0, 1, 3], 3),
        (&[0, 1, 2], 4),
    ];

    DieModel::from_polygons(DieShape::Tetrahedron, &vertices, &faces)
}
