//! Dice Tray CLI
//!
//! Rolls physically simulated dice headlessly from the command line.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use dicetray::dice3d::{
    die_model, label_text, parse, DiceEngine, DiceRollResult, DiceType, DieRole, Sign, TrayConfig,
};

/// Dice Tray - physically simulated dice rolls
#[derive(Parser)]
#[command(name = "dicetray")]
#[command(
    author,
    version,
    about = "Dice Tray - physically simulated, provably fair dice rolls"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Throw dice into the tray and read the result
    Roll {
        /// Dice expressions (e.g. "2d6+5", "1d20", "-1d4+3")
        #[arg(required = true)]
        expressions: Vec<String>,

        /// Roll each expression this many times
        #[arg(short = 'n', long, default_value_t = 1)]
        times: u32,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Tray settings file (.json or .ron)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Throw strength from 0.0 to 1.0
        #[arg(short, long)]
        strength: Option<f32>,
    },

    /// Show how an expression parses
    Parse {
        expression: String,
    },

    /// Show the face-value table of a die
    Faces {
        /// Side count: 4, 6, 8, 10, 12, 20 or 100
        sides: u32,
    },
}

#[derive(Serialize)]
struct RollReport<'a> {
    expression: &'a str,
    #[serde(flatten)]
    result: DiceRollResult,
}

/// Host frame time used when driving the tray headlessly.
const FRAME_DELTA: f32 = 1.0 / 60.0;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Roll {
            expressions,
            times,
            json,
            config,
            strength,
        } => roll(&expressions, times, json, config, strength).await,
        Commands::Parse { expression } => show_parse(&expression),
        Commands::Faces { sides } => show_faces(sides),
    }
}

async fn roll(
    expressions: &[String],
    times: u32,
    json: bool,
    config: Option<PathBuf>,
    strength: Option<f32>,
) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => TrayConfig::load(&path)
            .with_context(|| format!("loading tray settings from {}", path.display()))?,
        None => TrayConfig::default(),
    };

    let mut engine = DiceEngine::ready(config)?;
    if let Some(strength) = strength {
        let control = engine.throw_control().clone().with_strength(strength);
        engine.set_throw_control(control);
    }

    debug!(
        "Rolling {} expression(s) {} time(s) each",
        expressions.len(),
        times
    );
    let mut reports = Vec::new();
    for expression in expressions {
        for _ in 0..times {
            let result = engine
                .run_headless(expression, FRAME_DELTA)
                .await
                .with_context(|| format!("rolling `{expression}`"))?;

            if json {
                reports.push(RollReport {
                    expression,
                    result,
                });
            } else {
                print_roll(expression, &result);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!("{}", "═══════════════════════════════════════".cyan());
    }
    Ok(())
}

fn print_roll(expression: &str, result: &DiceRollResult) {
    println!("{}", "═══════════════════════════════════════".cyan());
    println!("{} {}", "Rolling:".bold().white(), expression.yellow().bold());

    let natural = single_d20(expression, result);
    let dice: Vec<String> = result
        .breakdown
        .iter()
        .map(|entry| match natural {
            Some(20) => format!("[{}]", entry).bright_green().bold().to_string(),
            Some(1) => format!("[{}]", entry).bright_red().bold().to_string(),
            _ => format!("[{}]", entry).bright_white().bold().to_string(),
        })
        .collect();
    println!("{} {}", "Dice:".bold().white(), dice.join(", "));

    if result.modifier != 0 {
        println!(
            "{} {}",
            "Modifier:".bold().white(),
            format!("{:+}", result.modifier).cyan()
        );
    }

    let total = match natural {
        Some(20) => result.total.to_string().bright_green().bold(),
        Some(1) => result.total.to_string().bright_red().bold(),
        _ => result.total.to_string().white().bold(),
    };
    println!("{} {}", "Total:".bold().white(), total);

    if result.timed_out {
        println!("{}", "(dice never fully settled; read as they lay)".dimmed());
    }
    match natural {
        Some(20) => println!("{}", "NATURAL 20! CRITICAL SUCCESS!".bright_green().bold()),
        Some(1) => println!("{}", "NATURAL 1! CRITICAL FAILURE!".bright_red().bold()),
        _ => {}
    }
}

/// The face of a lone d20, for critical highlighting.
fn single_d20(expression: &str, result: &DiceRollResult) -> Option<i32> {
    let parsed = parse(expression).ok()?;
    match parsed.terms.as_slice() {
        [term] if term.die == DiceType::D20 && term.sign == Sign::Plus => {
            result.values.first().copied()
        }
        _ => None,
    }
}

fn show_parse(expression: &str) -> anyhow::Result<()> {
    let parsed = parse(expression)?;

    println!("{} {}", "Expression:".bold().white(), expression.yellow().bold());
    for (index, term) in parsed.terms.iter().enumerate() {
        let sign = match term.sign {
            Sign::Plus => "+".green(),
            Sign::Minus => "-".red(),
        };
        println!("  {:>2}. {} {}", index + 1, sign, term.die.name().bright_white().bold());
    }
    println!(
        "{} {}",
        "Modifier:".bold().white(),
        format!("{:+}", parsed.modifier).cyan()
    );
    println!(
        "{} {}",
        "Bodies:".bold().white(),
        parsed.body_count().to_string().cyan()
    );
    Ok(())
}

fn show_faces(sides: u32) -> anyhow::Result<()> {
    let Some(die) = DiceType::from_sides(sides) else {
        bail!("unsupported die d{sides} (expected 4, 6, 8, 10, 12, 20 or 100)");
    };

    let roles: &[DieRole] = if die == DiceType::D100 {
        &[DieRole::PercentileTens, DieRole::PercentileOnes]
    } else {
        &[DieRole::Single]
    };

    let model = die_model(die.shape());
    for role in roles {
        println!(
            "{} {} ({:?}, {} faces)",
            "Die:".bold().white(),
            die.name().yellow().bold(),
            role,
            model.faces.len()
        );
        for face in &model.faces {
            println!(
                "  {:>3}  normal ({:>6.3}, {:>6.3}, {:>6.3})",
                label_text(die.shape(), *role, face.value).bright_white().bold(),
                face.normal.x,
                face.normal.y,
                face.normal.z
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_roll_arguments() {
        let cli = Cli::try_parse_from(["dicetray", "roll", "2d6+5", "1d20", "-n", "3", "--json"])
            .unwrap();
        match cli.command {
            Commands::Roll {
                expressions,
                times,
                json,
                ..
            } => {
                assert_eq!(expressions, vec!["2d6+5", "1d20"]);
                assert_eq!(times, 3);
                assert!(json);
            }
            _ => panic!("expected roll"),
        }
    }

    #[test]
    fn test_single_d20_detection() {
        let result = DiceRollResult::from_faces(
            &[(
                dicetray::dice3d::DiceTerm::new(DiceType::D20, Sign::Plus),
                20,
            )],
            2,
            false,
        );
        assert_eq!(single_d20("1d20+2", &result), Some(20));
        assert_eq!(single_d20("2d20", &result), None);
    }

    #[test]
    fn test_faces_rejects_unknown_die() {
        assert!(show_faces(7).is_err());
        assert!(show_faces(100).is_ok());
    }
}
