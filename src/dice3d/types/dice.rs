//! Dice-related types
//!
//! This module contains all types related to dice: DiceType, DieShape,
//! DiceTerm, ParsedExpression, DieRole and DiceRollResult.

use serde::{Deserialize, Serialize};

/// All supported dice types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiceType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DiceType {
    pub const ALL: [DiceType; 7] = [
        DiceType::D4,
        DiceType::D6,
        DiceType::D8,
        DiceType::D10,
        DiceType::D12,
        DiceType::D20,
        DiceType::D100,
    ];

    pub fn sides(&self) -> u32 {
        match self {
            DiceType::D4 => 4,
            DiceType::D6 => 6,
            DiceType::D8 => 8,
            DiceType::D10 => 10,
            DiceType::D12 => 12,
            DiceType::D20 => 20,
            DiceType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DiceType> {
        DiceType::ALL.into_iter().find(|d| d.sides() == sides)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiceType::D4 => "d4",
            DiceType::D6 => "d6",
            DiceType::D8 => "d8",
            DiceType::D10 => "d10",
            DiceType::D12 => "d12",
            DiceType::D20 => "d20",
            DiceType::D100 => "d100",
        }
    }

    pub fn parse(s: &str) -> Option<DiceType> {
        let digits = s.trim().to_lowercase();
        let digits = digits.strip_prefix('d')?;
        DiceType::from_sides(digits.parse().ok()?)
    }

    /// Physical body shape. A d100 is thrown as a pair of d10 bodies.
    pub fn shape(&self) -> DieShape {
        match self {
            DiceType::D4 => DieShape::Tetrahedron,
            DiceType::D6 => DieShape::Cube,
            DiceType::D8 => DieShape::Octahedron,
            DiceType::D10 | DiceType::D100 => DieShape::Trapezohedron,
            DiceType::D12 => DieShape::Dodecahedron,
            DiceType::D20 => DieShape::Icosahedron,
        }
    }

    /// Number of physical bodies this die occupies in the tray.
    pub fn body_count(&self) -> usize {
        match self {
            DiceType::D100 => 2,
            _ => 1,
        }
    }

    /// Get the physical density of the die for physics simulation.
    /// Larger dice are heavier, affecting how they roll and bounce.
    pub fn density(&self) -> f32 {
        match self {
            DiceType::D4 => 1.0,
            DiceType::D6 => 1.5,
            DiceType::D8 => 1.8,
            DiceType::D10 | DiceType::D100 => 2.0,
            DiceType::D12 => 2.5,
            DiceType::D20 => 3.0,
        }
    }

    /// Get the scale factor for the die mesh.
    /// This affects both visual size and collision volume.
    pub fn scale(&self) -> f32 {
        match self {
            DiceType::D4 => 0.9,
            DiceType::D6 => 1.0,
            DiceType::D8 => 1.0,
            DiceType::D10 | DiceType::D100 => 1.05,
            DiceType::D12 => 1.1,
            DiceType::D20 => 1.2,
        }
    }
}

/// Convex solid backing one physical die body
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieShape {
    Tetrahedron,
    Cube,
    Octahedron,
    /// Pentagonal trapezohedron (the d10 "bipyramid")
    Trapezohedron,
    Dodecahedron,
    Icosahedron,
}

impl DieShape {
    pub const ALL: [DieShape; 6] = [
        DieShape::Tetrahedron,
        DieShape::Cube,
        DieShape::Octahedron,
        DieShape::Trapezohedron,
        DieShape::Dodecahedron,
        DieShape::Icosahedron,
    ];

    pub fn face_count(&self) -> usize {
        match self {
            DieShape::Tetrahedron => 4,
            DieShape::Cube => 6,
            DieShape::Octahedron => 8,
            DieShape::Trapezohedron => 10,
            DieShape::Dodecahedron => 12,
            DieShape::Icosahedron => 20,
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            DieShape::Tetrahedron => 0,
            DieShape::Cube => 1,
            DieShape::Octahedron => 2,
            DieShape::Trapezohedron => 3,
            DieShape::Dodecahedron => 4,
            DieShape::Icosahedron => 5,
        }
    }
}

/// Sign a term contributes to the sum with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    pub fn apply(&self, value: i32) -> i32 {
        match self {
            Sign::Plus => value,
            Sign::Minus => -value,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Sign::Plus => "",
            Sign::Minus => "-",
        }
    }
}

/// One physical die requested by an expression. `3d6` expands into three
/// of these so each die gets its own body and orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceTerm {
    pub die: DiceType,
    pub sign: Sign,
}

impl DiceTerm {
    pub fn new(die: DiceType, sign: Sign) -> Self {
        Self { die, sign }
    }

    pub fn sides(&self) -> u32 {
        self.die.sides()
    }

    /// Breakdown label such as `d20:14` or `-d6:3`.
    pub fn describe(&self, value: u32) -> String {
        format!("{}{}:{}", self.sign.prefix(), self.die.name(), value)
    }
}

/// Output of the notation parser. `terms` is never empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedExpression {
    pub terms: Vec<DiceTerm>,
    pub modifier: i32,
}

impl ParsedExpression {
    /// Physical body slots needed; percentile terms take two.
    pub fn body_count(&self) -> usize {
        self.terms.iter().map(|t| t.die.body_count()).sum()
    }
}

/// What a physical body reads out as
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieRole {
    Single,
    PercentileTens,
    PercentileOnes,
}

/// Final outcome of one roll. `sum` is the sum of `values`, and `values`
/// already carry each term's sign.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRollResult {
    pub values: Vec<i32>,
    pub sum: i32,
    pub modifier: i32,
    pub total: i32,
    pub breakdown: Vec<String>,
    /// True when the roll was force-completed by the liveness timeout.
    #[serde(default)]
    pub timed_out: bool,
}

impl DiceRollResult {
    /// Assemble a result from `(term, face value)` pairs.
    pub fn from_faces(faces: &[(DiceTerm, u32)], modifier: i32, timed_out: bool) -> Self {
        let values: Vec<i32> = faces
            .iter()
            .map(|(term, value)| term.sign.apply(*value as i32))
            .collect();
        let breakdown = faces
            .iter()
            .map(|(term, value)| term.describe(*value))
            .collect();
        let sum = values.iter().sum();

        Self {
            values,
            sum,
            modifier,
            total: sum + modifier,
            breakdown,
            timed_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dice_type_sides() {
        assert_eq!(DiceType::D4.sides(), 4);
        assert_eq!(DiceType::D6.sides(), 6);
        assert_eq!(DiceType::D8.sides(), 8);
        assert_eq!(DiceType::D10.sides(), 10);
        assert_eq!(DiceType::D12.sides(), 12);
        assert_eq!(DiceType::D20.sides(), 20);
        assert_eq!(DiceType::D100.sides(), 100);
    }

    #[test]
    fn test_dice_type_parse() {
        assert_eq!(DiceType::parse("d4"), Some(DiceType::D4));
        assert_eq!(DiceType::parse("D20"), Some(DiceType::D20));
        assert_eq!(DiceType::parse("d100"), Some(DiceType::D100));
        assert_eq!(DiceType::parse("d7"), None);
        assert_eq!(DiceType::parse("20"), None);
        assert_eq!(DiceType::parse("invalid"), None);
    }

    #[test]
    fn test_d100_uses_two_d10_bodies() {
        assert_eq!(DiceType::D100.shape(), DieShape::Trapezohedron);
        assert_eq!(DiceType::D100.body_count(), 2);
        assert_eq!(DiceType::D20.body_count(), 1);
    }

    #[test]
    fn test_dice_type_density() {
        assert!(DiceType::D4.density() < DiceType::D6.density());
        assert!(DiceType::D6.density() < DiceType::D8.density());
        assert!(DiceType::D8.density() < DiceType::D10.density());
        assert!(DiceType::D10.density() < DiceType::D12.density());
        assert!(DiceType::D12.density() < DiceType::D20.density());
    }

    #[test]
    fn test_dice_type_scale() {
        assert!(DiceType::D4.scale() <= DiceType::D6.scale());
        assert!(DiceType::D6.scale() <= DiceType::D10.scale());
        assert!(DiceType::D10.scale() <= DiceType::D12.scale());
        assert!(DiceType::D12.scale() <= DiceType::D20.scale());
        assert_eq!(DiceType::D6.scale(), 1.0);
    }

    #[test]
    fn test_result_from_faces_honors_sign() {
        let d20 = DiceTerm::new(DiceType::D20, Sign::Plus);
        let d6 = DiceTerm::new(DiceType::D6, Sign::Minus);
        let result = DiceRollResult::from_faces(&[(d20, 14), (d6, 3)], 2, false);

        assert_eq!(result.values, vec![14, -3]);
        assert_eq!(result.sum, 11);
        assert_eq!(result.total, 13);
        assert_eq!(result.breakdown, vec!["d20:14", "-d6:3"]);
    }
}
