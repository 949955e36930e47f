//! Tests for dice notation, die models and tray settings

use dicetray::dice3d::types::{DiceType, DieRole, DieShape, RollError, Sign, TrayConfig};
use dicetray::dice3d::{die_model, discover_faces, label_text, parse};

#[test]
fn test_two_d6_plus_five() {
    let parsed = parse("2d6+5").unwrap();
    assert_eq!(parsed.terms.len(), 2);
    assert!(parsed
        .terms
        .iter()
        .all(|t| t.die == DiceType::D6 && t.sign == Sign::Plus));
    assert_eq!(parsed.modifier, 5);
}

#[test]
fn test_one_d4_has_no_modifier() {
    let parsed = parse("1d4").unwrap();
    assert_eq!(parsed.terms.len(), 1);
    assert_eq!(parsed.terms[0].die, DiceType::D4);
    assert_eq!(parsed.modifier, 0);
}

#[test]
fn test_modifier_only_is_rejected() {
    assert_eq!(parse("5"), Err(RollError::NoDiceInExpression));
}

#[test]
fn test_unsupported_die_is_rejected() {
    assert_eq!(parse("1d7"), Err(RollError::InvalidDie(7)));
}

#[test]
fn test_documented_examples_parse() {
    for expr in ["1d20", "2d6+5", "4d6", "-1d4+3", "1d100", " 2D8 - 1 "] {
        assert!(parse(expr).is_ok(), "{expr}");
    }
}

#[test]
fn test_every_die_has_complete_face_table() {
    for die in DiceType::ALL {
        let shape = die.shape();
        let model = die_model(shape);
        let faces = shape.face_count();

        let mut values: Vec<u32> = model.faces.iter().map(|f| f.value).collect();
        values.sort();
        values.dedup();
        assert_eq!(values.len(), faces, "{}", die.name());

        let groups = discover_faces(&model.vertices, &model.triangles);
        assert_eq!(groups.len(), faces, "{}", die.name());
    }
}

#[test]
fn test_percentile_labels() {
    let tens: Vec<String> = die_model(DieShape::Trapezohedron)
        .faces
        .iter()
        .map(|f| label_text(DieShape::Trapezohedron, DieRole::PercentileTens, f.value))
        .collect();
    assert!(tens.contains(&"00".to_string()));
    assert!(tens.contains(&"90".to_string()));
    assert!(tens.iter().all(|t| t.ends_with('0') && t.len() == 2));
}

#[test]
fn test_load_settings_files() {
    let dir = std::env::temp_dir().join(format!("dicetray-settings-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let json = dir.join("tray.json");
    std::fs::write(&json, r#"{ "throw": { "strength": 0.5 }, "dice": { "color": "navy" } }"#)
        .unwrap();
    let config = TrayConfig::load(&json).unwrap();
    assert_eq!(config.throw.strength, 0.5);
    assert_eq!(config.dice.color, "navy");

    let ron = dir.join("tray.ron");
    std::fs::write(&ron, "(settle: (timeout_seconds: 3.0))").unwrap();
    assert_eq!(TrayConfig::load(&ron).unwrap().settle.timeout_seconds, 3.0);

    let bad = dir.join("tray.json");
    std::fs::write(&bad, r#"{ "step": { "dt": -1.0 } }"#).unwrap();
    assert!(TrayConfig::load(&bad).is_err());

    let yaml = dir.join("tray.yaml");
    std::fs::write(&yaml, "step: {}").unwrap();
    assert!(TrayConfig::load(&yaml).is_err());

    std::fs::remove_dir_all(&dir).ok();
}
