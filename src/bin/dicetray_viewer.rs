//! Dice Tray viewer
//!
//! Renders the tray and replays the engine's visual commands as Bevy
//! entities. SPACE rolls, C clears.
//!
//! Usage: `dicetray-viewer [EXPRESSION] [CONFIG]`

use std::collections::HashMap;

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use dicetray::dice3d::{
    die_model, tray_blocks, DiceEngine, DiceRollResult, PendingRoll, RecordingVisuals,
    RollError, TrayBlockKind, TrayConfig, VisualCommand, VisualHandle, VisualSpec,
};

const DEFAULT_EXPRESSION: &str = "1d20+2d6";

/// Engine plus the bookkeeping that maps its visuals onto entities.
/// The engine is single-threaded, so this lives as a non-send resource.
struct Viewer {
    engine: DiceEngine,
    recorder: RecordingVisuals,
    expression: String,
    pending: Option<PendingRoll>,
    entities: HashMap<VisualHandle, Entity>,
}

#[derive(Component)]
struct ViewerDie;

#[derive(Component)]
struct ResultsText;

fn main() {
    let mut args = std::env::args().skip(1);
    let expression = args.next().unwrap_or_else(|| DEFAULT_EXPRESSION.to_string());
    let config = match args.next() {
        Some(path) => match TrayConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        None => TrayConfig::default(),
    };

    let recorder = RecordingVisuals::new();
    let engine = match DiceEngine::ready(config) {
        Ok(engine) => engine.with_visuals(recorder.clone()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Dice Tray".to_string(),
                resolution: (1280, 720).into(),
                ..default()
            }),
            ..default()
        }))
        .insert_non_send_resource(Viewer {
            engine,
            recorder,
            expression,
            pending: None,
            entities: HashMap::new(),
        })
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (handle_input, drive_engine, update_results_display).chain(),
        )
        .run();
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    viewer: NonSend<Viewer>,
) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 6.5, 5.5).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        DirectionalLight {
            illuminance: 9000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(3.0, 8.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let felt = materials.add(StandardMaterial {
        base_color: Color::srgb(0.12, 0.35, 0.2),
        perceptual_roughness: 0.9,
        ..default()
    });
    let wood = materials.add(StandardMaterial {
        base_color: Color::srgb(0.4, 0.25, 0.12),
        perceptual_roughness: 0.6,
        ..default()
    });

    for block in tray_blocks(&viewer.engine.config().tray) {
        if !block.kind.is_visible() {
            continue;
        }
        let size = block.half_extents * 2.0;
        let material = match block.kind {
            TrayBlockKind::Floor => felt.clone(),
            _ => wood.clone(),
        };
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::new(size.x, size.y, size.z))),
            MeshMaterial3d(material),
            Transform::from_translation(block.center),
        ));
    }

    commands.spawn((
        Text::new(format!("SPACE: roll {}   C: clear", viewer.expression)),
        TextFont {
            font_size: 22.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
        ResultsText,
    ));
}

/// Keyboard input for rolling and clearing dice
fn handle_input(keyboard: Res<ButtonInput<KeyCode>>, mut viewer: NonSendMut<Viewer>) {
    if keyboard.just_pressed(KeyCode::Space) {
        let expression = viewer.expression.clone();
        let pending = viewer.engine.roll(&expression);
        viewer.pending = Some(pending);
    }
    if keyboard.just_pressed(KeyCode::KeyC) {
        viewer.engine.clear();
    }
}

/// Step the engine and mirror its visual commands onto entities
fn drive_engine(
    mut commands: Commands,
    time: Res<Time>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut viewer: NonSendMut<Viewer>,
    mut dice: Query<&mut Transform, With<ViewerDie>>,
) {
    viewer.engine.frame(time.delta_secs());

    for command in viewer.recorder.drain() {
        match command {
            VisualCommand::Create { handle, spec } => {
                let material = materials.add(StandardMaterial {
                    base_color: Color::linear_rgba(
                        spec.tint[0],
                        spec.tint[1],
                        spec.tint[2],
                        spec.tint[3],
                    ),
                    perceptual_roughness: 0.3,
                    ..default()
                });
                let entity = commands
                    .spawn((
                        Mesh3d(meshes.add(die_mesh(&spec))),
                        MeshMaterial3d(material),
                        Transform::default(),
                        ViewerDie,
                    ))
                    .id();
                viewer.entities.insert(handle, entity);
            }
            VisualCommand::Update { handle, pose } => {
                let Some(&entity) = viewer.entities.get(&handle) else {
                    continue;
                };
                let transform =
                    Transform::from_translation(pose.position).with_rotation(pose.rotation);
                match dice.get_mut(entity) {
                    Ok(mut current) => *current = transform,
                    // Spawned this frame; the command has not been applied yet.
                    Err(_) => {
                        commands.entity(entity).insert(transform);
                    }
                }
            }
            VisualCommand::Dispose { handle } => {
                if let Some(entity) = viewer.entities.remove(&handle) {
                    commands.entity(entity).despawn();
                }
            }
        }
    }
}

/// Flat-shaded mesh: every triangle gets its own vertices and face normal.
fn die_mesh(spec: &VisualSpec) -> Mesh {
    let model = die_model(spec.shape);
    let vertices = model.scaled_vertices(spec.radius);

    let mut positions = Vec::with_capacity(model.triangles.len() * 3);
    let mut normals = Vec::with_capacity(model.triangles.len() * 3);
    for tri in &model.triangles {
        let [a, b, c] = tri.map(|i| vertices[i as usize]);
        let normal = (b - a).cross(c - a).normalize_or_zero();
        for p in [a, b, c] {
            positions.push(p.to_array());
            normals.push(normal.to_array());
        }
    }
    let uvs: Vec<[f32; 2]> = vec![[0.5, 0.5]; positions.len()];
    let indices: Vec<u32> = (0..positions.len() as u32).collect();

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(indices))
}

/// Show the latest result once the pending roll completes
fn update_results_display(
    mut viewer: NonSendMut<Viewer>,
    mut text_query: Query<&mut Text, With<ResultsText>>,
) {
    let Some(outcome) = viewer.pending.as_mut().and_then(|p| p.try_take()) else {
        return;
    };
    viewer.pending = None;

    let message = format_outcome(&viewer.expression, outcome);
    for mut text in text_query.iter_mut() {
        *text = Text::new(message.clone());
    }
}

fn format_outcome(expression: &str, outcome: Result<DiceRollResult, RollError>) -> String {
    match outcome {
        Ok(result) => {
            let mut line = format!(
                "{}  [{}]  total {}",
                expression,
                result.breakdown.join(", "),
                result.total
            );
            if result.modifier != 0 {
                line.push_str(&format!(" ({:+})", result.modifier));
            }
            if result.timed_out {
                line.push_str("  (timed out)");
            }
            line
        }
        Err(e) => format!("{expression}: {e}"),
    }
}
