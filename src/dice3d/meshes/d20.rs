use glam::Vec3;

use super::DieModel;
use crate::dice3d::types::DieShape;

/// Icosahedron with opposite faces summing to 21.
pub fn create_d20() -> DieModel {
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;

    let vertices = [
        Vec3::new(0.0, 1.0, phi),
        Vec3::new(0.0, -1.0, phi),
        Vec3::new(0.0, 1.0, -phi),
        Vec3::new(0.0, -1.0, -phi),
        Vec3::new(1.0, phi, 0.0),
        Vec3::new(-1.0, phi, 0.0),
        Vec3::new(1.0, -phi, 0.0),
        Vec3::new(-1.0, -phi, 0.0),
        Vec3::new(phi, 0.0, 1.0),
        Vec3::new(-phi, 0.0, 1.0),
        Vec3::new(phi, 0.0, -1.0),
        Vec3::new(-phi, 0.0, -1.0),
    ];

    let faces: [(&[usize], u32); 20] = [
        (&[0, 1, 8], 1),
        (&[0, 9, 1], 2),
        (&[0, 4, 5], 3),
        (&[0, 8, 4], 4),
        (&[0, 5, 9], 5),
        (&[1, 7, 6], 6),
        (&[1, 6, 8], 7),
        (&[1, 9, 7], 8),
        (&[2, 10, 3], 19),
        (&[2, 3, 11], 20),
        (&[2, 5, 4], 15),
        (&[2, 4, 10], 13),
        (&[2, 11, 5], 14),
        (&[3, 6, 7], 18),
        (&[3, 10, 6], 16),
        (&[3, 7, 11], 17),
        (&[4, 8, 10], 9),
        (&[5, 11, 9], 10),
        (&[6, 10, 8], 11),
        (&[7, 9, 11], 12),
    ];

    DieModel::from_polygons(DieShape::Icosahedron, &vertices, &faces)
}
