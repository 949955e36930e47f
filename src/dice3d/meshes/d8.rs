use glam::Vec3;

use super::DieModel;
use crate::dice3d::types::DieShape;

/// Octahedron with opposite faces summing to 9.
pub fn create_d8() -> DieModel {
    let vertices = [
        Vec3::X,
        Vec3::NEG_X,
        Vec3::Y,
        Vec3::NEG_Y,
        Vec3::Z,
        Vec3::NEG_Z,
    ];

    // One face per octant, named by the signs of its normal.
    let faces: [(&[usize], u32); 8] = [
        (&[0, 2, 4], 1), // + + +
        (&[1, 3, 5], 8), // - - -
        (&[1, 2, 4], 7), // - + +
        (&[0, 3, 5], 2), // + - -
        (&[1, 2, 5], 3), // - + -
        (&[0, 3, 4], 6), // + - +
        (&[0, 2, 5], 5), // + + -
        (&[1, 3, 4], 4), // - - +
    ];

    DieModel::from_polygons(DieShape::Octahedron, &vertices, &faces)
}
