//! Engine settings types and persistence
//!
//! Every field carries a serde default so partial settings files load
//! cleanly. Files ending in `.json` or `.ron` are accepted.

use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::ConfigError;

// ============================================================================
// Tray
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraySettings {
    /// Half the floor width; walls sit at +/- this on X and Z.
    #[serde(default = "default_half_extent")]
    pub half_extent: f32,

    #[serde(default = "default_wall_height")]
    pub wall_height: f32,

    #[serde(default = "default_wall_thickness")]
    pub wall_thickness: f32,

    /// Height of the invisible containment walls and ceiling.
    #[serde(default = "default_containment_height")]
    pub containment_height: f32,

    #[serde(default = "default_floor_friction")]
    pub floor_friction: f32,

    #[serde(default = "default_floor_restitution")]
    pub floor_restitution: f32,

    #[serde(default = "default_wall_friction")]
    pub wall_friction: f32,

    #[serde(default = "default_wall_restitution")]
    pub wall_restitution: f32,

    #[serde(default = "default_gravity")]
    pub gravity: f32,
}

fn default_half_extent() -> f32 {
    2.0
}
fn default_wall_height() -> f32 {
    1.5
}
fn default_wall_thickness() -> f32 {
    0.15
}
fn default_containment_height() -> f32 {
    12.0
}
fn default_floor_friction() -> f32 {
    1.0
}
fn default_floor_restitution() -> f32 {
    0.15
}
fn default_wall_friction() -> f32 {
    0.55
}
fn default_wall_restitution() -> f32 {
    0.35
}
fn default_gravity() -> f32 {
    -9.81
}

impl Default for TraySettings {
    fn default() -> Self {
        Self {
            half_extent: default_half_extent(),
            wall_height: default_wall_height(),
            wall_thickness: default_wall_thickness(),
            containment_height: default_containment_height(),
            floor_friction: default_floor_friction(),
            floor_restitution: default_floor_restitution(),
            wall_friction: default_wall_friction(),
            wall_restitution: default_wall_restitution(),
            gravity: default_gravity(),
        }
    }
}

// ============================================================================
// Fixed timestep
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSettings {
    /// Physics timestep in seconds.
    #[serde(default = "default_dt")]
    pub dt: f32,

    /// Longest frame delta fed into the accumulator.
    #[serde(default = "default_max_frame_delta")]
    pub max_frame_delta: f32,

    /// Most physics steps run for a single frame.
    #[serde(default = "default_max_substeps")]
    pub max_substeps: u32,
}

fn default_dt() -> f32 {
    1.0 / 240.0
}
fn default_max_frame_delta() -> f32 {
    0.1
}
fn default_max_substeps() -> u32 {
    8
}

impl Default for StepSettings {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            max_frame_delta: default_max_frame_delta(),
            max_substeps: default_max_substeps(),
        }
    }
}

// ============================================================================
// Throw choreography
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrowSettings {
    /// Height above the floor the spawn grid sits at.
    #[serde(default = "default_spawn_height")]
    pub spawn_height: f32,

    #[serde(default = "default_spacing")]
    pub spacing: f32,

    #[serde(default = "default_max_per_row")]
    pub max_per_row: usize,

    /// Per-axis positional jitter, as a fraction of `spacing`.
    #[serde(default = "default_jitter")]
    pub jitter: f32,

    /// Horizontal speed imparted by the throw impulse, from zero to full
    /// strength.
    #[serde(default = "default_impulse")]
    pub impulse: Range<f32>,

    /// Upward speed range.
    #[serde(default = "default_lift")]
    pub lift: Range<f32>,

    /// Per-axis angular speed bound imparted by the torque impulse (rad/s).
    #[serde(default = "default_spin")]
    pub spin: f32,

    /// Throw strength, 0.0 to 1.0.
    #[serde(default = "default_strength")]
    pub strength: f32,

    /// Aim angle around the vertical axis in radians; unset throws randomly.
    #[serde(default)]
    pub aim: Option<f32>,
}

fn default_spawn_height() -> f32 {
    1.0
}
fn default_spacing() -> f32 {
    0.7
}
fn default_max_per_row() -> usize {
    5
}
fn default_jitter() -> f32 {
    0.15
}
fn default_impulse() -> Range<f32> {
    1.5..4.5
}
fn default_lift() -> Range<f32> {
    0.5..1.5
}
fn default_spin() -> f32 {
    18.0
}
fn default_strength() -> f32 {
    1.0
}

impl Default for ThrowSettings {
    fn default() -> Self {
        Self {
            spawn_height: default_spawn_height(),
            spacing: default_spacing(),
            max_per_row: default_max_per_row(),
            jitter: default_jitter(),
            impulse: default_impulse(),
            lift: default_lift(),
            spin: default_spin(),
            strength: default_strength(),
            aim: None,
        }
    }
}

// ============================================================================
// Settling
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettleSettings {
    #[serde(default = "default_linear_threshold")]
    pub linear_threshold: f32,

    #[serde(default = "default_angular_threshold")]
    pub angular_threshold: f32,

    /// Consecutive physics steps every die must stay below threshold.
    #[serde(default = "default_required_frames")]
    pub required_frames: u32,

    /// Ceiling on host time after which the roll is read as-is.
    ///
    /// Measured as the sum of the frame deltas handed to the engine, before
    /// clamping. Under `run_headless` those deltas are synthetic, so the
    /// ceiling counts simulated frames: 15 s at 1/60 s is 900 frames.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f32,
}

fn default_linear_threshold() -> f32 {
    0.1
}
fn default_angular_threshold() -> f32 {
    0.1
}
fn default_required_frames() -> u32 {
    48
}
fn default_timeout_seconds() -> f32 {
    15.0
}

impl Default for SettleSettings {
    fn default() -> Self {
        Self {
            linear_threshold: default_linear_threshold(),
            angular_threshold: default_angular_threshold(),
            required_frames: default_required_frames(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

// ============================================================================
// Dice bodies and tints
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiceSettings {
    /// Circumradius of a scale-1.0 die.
    #[serde(default = "default_die_radius")]
    pub radius: f32,

    #[serde(default = "default_die_friction")]
    pub friction: f32,

    #[serde(default = "default_die_restitution")]
    pub restitution: f32,

    /// Multiplier on every die type's base density.
    #[serde(default = "default_density_scale")]
    pub density_scale: f32,

    #[serde(default = "default_die_color")]
    pub color: String,

    /// Tint of the percentile tens die so it reads apart from the ones die.
    #[serde(default = "default_tens_color")]
    pub tens_color: String,
}

fn default_die_radius() -> f32 {
    0.35
}
fn default_die_friction() -> f32 {
    0.6
}
fn default_die_restitution() -> f32 {
    0.3
}
fn default_density_scale() -> f32 {
    1.0
}
fn default_die_color() -> String {
    "#f2f2f2".to_string()
}
fn default_tens_color() -> String {
    "#c0392b".to_string()
}

impl Default for DiceSettings {
    fn default() -> Self {
        Self {
            radius: default_die_radius(),
            friction: default_die_friction(),
            restitution: default_die_restitution(),
            density_scale: default_density_scale(),
            color: default_die_color(),
            tens_color: default_tens_color(),
        }
    }
}

// ============================================================================
// Root
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrayConfig {
    #[serde(default)]
    pub tray: TraySettings,
    #[serde(default)]
    pub step: StepSettings,
    #[serde(default)]
    pub throw: ThrowSettings,
    #[serde(default)]
    pub settle: SettleSettings,
    #[serde(default)]
    pub dice: DiceSettings,
}

impl TrayConfig {
    /// Load settings from a `.json` or `.ron` file and validate them.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        let config: TrayConfig = match extension.as_str() {
            "json" => serde_json::from_str(&contents)?,
            "ron" => ron::from_str(&contents)?,
            other => return Err(ConfigError::UnknownFormat(other.to_string())),
        };
        config.validate()?;

        info!("Loaded tray settings from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("tray.half_extent", self.tray.half_extent)?;
        positive("tray.wall_height", self.tray.wall_height)?;
        positive("tray.wall_thickness", self.tray.wall_thickness)?;
        if self.tray.containment_height <= self.tray.wall_height {
            return Err(ConfigError::OutOfRange {
                field: "tray.containment_height",
                reason: "must be above tray.wall_height".to_string(),
            });
        }
        if self.tray.gravity >= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "tray.gravity",
                reason: "must point down (negative)".to_string(),
            });
        }

        positive("step.dt", self.step.dt)?;
        positive("step.max_frame_delta", self.step.max_frame_delta)?;
        if self.step.max_substeps == 0 {
            return Err(ConfigError::OutOfRange {
                field: "step.max_substeps",
                reason: "must be at least 1".to_string(),
            });
        }

        positive("throw.spacing", self.throw.spacing)?;
        if self.throw.max_per_row == 0 {
            return Err(ConfigError::OutOfRange {
                field: "throw.max_per_row",
                reason: "must be at least 1".to_string(),
            });
        }
        ordered("throw.impulse", &self.throw.impulse)?;
        ordered("throw.lift", &self.throw.lift)?;
        positive("throw.spin", self.throw.spin)?;
        if !(0.0..=1.0).contains(&self.throw.strength) {
            return Err(ConfigError::OutOfRange {
                field: "throw.strength",
                reason: format!("must be within 0.0..=1.0, got {}", self.throw.strength),
            });
        }

        positive("settle.timeout_seconds", self.settle.timeout_seconds)?;
        positive("dice.radius", self.dice.radius)?;
        positive("dice.density_scale", self.dice.density_scale)?;

        parse_color(&self.dice.color)?;
        parse_color(&self.dice.tens_color)?;
        Ok(())
    }

    /// Linear RGBA tint for a die, distinguishing the percentile tens die.
    pub fn tint(&self, tens: bool) -> [f32; 4] {
        let source = if tens {
            &self.dice.tens_color
        } else {
            &self.dice.color
        };
        parse_color(source).unwrap_or([1.0, 1.0, 1.0, 1.0])
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            reason: format!("must be positive, got {value}"),
        })
    }
}

fn ordered(field: &'static str, range: &Range<f32>) -> Result<(), ConfigError> {
    if range.start >= 0.0 && range.start < range.end {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            reason: format!("expected 0 <= start < end, got {:?}", range),
        })
    }
}

pub fn parse_color(value: &str) -> Result<[f32; 4], ConfigError> {
    csscolorparser::parse(value)
        .map(|c| [c.r, c.g, c.b, c.a])
        .map_err(|e| ConfigError::Color {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrayConfig::default().validate().is_ok());
    }

    #[test]
    fn test_tray_material_defaults() {
        let tray = TraySettings::default();
        assert_eq!(tray.floor_friction, 1.0);
        assert_eq!(tray.floor_restitution, 0.15);
        assert_eq!(tray.wall_friction, 0.55);
        assert_eq!(tray.wall_restitution, 0.35);
        assert!(tray.containment_height > tray.wall_height);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TrayConfig =
            serde_json::from_str(r#"{ "settle": { "timeout_seconds": 5.0 } }"#).unwrap();
        assert_eq!(config.settle.timeout_seconds, 5.0);
        assert_eq!(config.settle.required_frames, default_required_frames());
        assert_eq!(config.step, StepSettings::default());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config: TrayConfig = ron::from_str("(step: (dt: 0.005))").unwrap();
        assert_eq!(config.step.dt, 0.005);
        assert_eq!(config.tray, TraySettings::default());
    }

    #[test]
    fn test_validate_rejects_zero_substeps() {
        let mut config = TrayConfig::default();
        config.step.max_substeps = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "step.max_substeps",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_impulse() {
        let mut config = TrayConfig::default();
        config.throw.impulse = 3.0..1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_strength_above_one() {
        let mut config = TrayConfig::default();
        config.throw.strength = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "throw.strength",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_color() {
        let mut config = TrayConfig::default();
        config.dice.tens_color = "not-a-color".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Color { .. })));
    }

    #[test]
    fn test_tens_tint_differs() {
        let config = TrayConfig::default();
        assert_ne!(config.tint(true), config.tint(false));
    }
}
