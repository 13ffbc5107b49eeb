//! Command scripts - drive a TurnEngine from plain text
//!
//! One command per line; `#` starts a comment.
//!
//! ```text
//! target <q> <r>     click a tile
//! miss               click outside the grid
//! end                end the current turn
//! deselect
//! dig                dig in the selected unit
//! found              start founding from the selected city
//! improve <id>       farm | mine | barracks
//! recruit <id>       warrior | cavalry | archer | crossbowman
//! save <path>
//! load <path>
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use hexrealm_core::{ActionError, Hex, ImprovementKind, TargetOutcome, TurnEngine, UnitKind};

// ============================================================================
// COMMANDS
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Target(Hex),
    Miss,
    EndTurn,
    Deselect,
    DigIn,
    Found,
    Improve(ImprovementKind),
    Recruit(UnitKind),
    Save(PathBuf),
    Load(PathBuf),
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(|| anyhow!("empty command"))?;
        let mut arg = |what: &str| {
            words
                .next()
                .ok_or_else(|| anyhow!("`{verb}` needs {what}"))
        };

        let command = match verb {
            "target" => {
                let q = arg("q")?.parse().context("q must be an integer")?;
                let r = arg("r")?.parse().context("r must be an integer")?;
                Command::Target(Hex::axial(q, r))
            }
            "miss" => Command::Miss,
            "end" => Command::EndTurn,
            "deselect" => Command::Deselect,
            "dig" => Command::DigIn,
            "found" => Command::Found,
            "improve" => {
                let id = arg("an improvement")?;
                Command::Improve(
                    ImprovementKind::from_id(id).ok_or_else(|| anyhow!("unknown improvement `{id}`"))?,
                )
            }
            "recruit" => {
                let id = arg("a unit type")?;
                Command::Recruit(UnitKind::from_id(id).ok_or_else(|| anyhow!("unknown unit `{id}`"))?)
            }
            "save" => Command::Save(PathBuf::from(arg("a path")?)),
            "load" => Command::Load(PathBuf::from(arg("a path")?)),
            other => bail!("unknown command `{other}`"),
        };

        if let Some(extra) = words.next() {
            bail!("unexpected argument `{extra}`");
        }
        Ok(command)
    }
}

/// Parse a whole script, skipping blanks and comments
pub fn parse_script(text: &str) -> Result<Vec<(usize, Command)>> {
    text.lines()
        .enumerate()
        .map(|(i, raw)| (i + 1, raw.split('#').next().unwrap_or("").trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(n, line)| {
            line.parse()
                .map(|cmd| (n, cmd))
                .with_context(|| format!("line {n}: `{line}`"))
        })
        .collect()
}

// ============================================================================
// EXECUTION
// ============================================================================

/// Run one command and describe what happened
pub fn execute(engine: &mut TurnEngine, command: &Command) -> Result<String> {
    let line = match command {
        Command::Target(hex) => describe(engine.target_tile(Some(*hex))?),
        Command::Miss => describe(engine.target_tile(None)?),
        Command::EndTurn => {
            engine.end_turn()?;
            if engine.is_game_over() {
                engine.game_over_message().to_string()
            } else {
                match engine.current_player_id() {
                    Some(id) => format!("round {}: {id} to move", engine.current_round()),
                    None => "no players left".to_string(),
                }
            }
        }
        Command::Deselect => {
            engine.deselect();
            "deselected".to_string()
        }
        Command::DigIn => {
            engine.dig_in_selected_unit()?;
            "dug in".to_string()
        }
        Command::Found => {
            engine.begin_city_founding()?;
            "choose a site for the new city".to_string()
        }
        Command::Improve(kind) => {
            engine.start_improvement(*kind)?;
            format!("started {}", kind.blueprint().name)
        }
        Command::Recruit(kind) => {
            engine.start_recruitment(*kind)?;
            format!("recruiting {}", kind.blueprint().name)
        }
        Command::Save(path) => {
            engine.save_game(path)?;
            format!("saved to {}", path.display())
        }
        Command::Load(path) => {
            engine.load_game(path)?;
            format!("loaded {} (round {})", path.display(), engine.current_round())
        }
    };
    Ok(line)
}

fn describe(outcome: TargetOutcome) -> String {
    match outcome {
        TargetOutcome::Inspected(hex) => format!("inspected ({}, {})", hex.q(), hex.r()),
        TargetOutcome::Selected(entity) => format!("selected {entity:?}"),
        TargetOutcome::Deselected => "deselected".to_string(),
        TargetOutcome::Moved { unit, to, cost } => {
            format!("unit {} moved to ({}, {}) for {cost}", unit.0, to.q(), to.r())
        }
        TargetOutcome::Attacked(report) => format!(
            "{:?} hit {:?} for {}{}",
            report.attacker,
            report.target,
            report.damage,
            if report.destroyed { ", destroyed" } else { "" }
        ),
        TargetOutcome::CityFounded(id) => format!("founded city {}", id.0),
    }
}

/// Run a script. Rejected game commands are reported and skipped; parse and
/// save/load failures abort.
pub fn run_script(engine: &mut TurnEngine, text: &str) -> Result<Vec<String>> {
    let commands = parse_script(text)?;
    let mut transcript = Vec::with_capacity(commands.len());

    for (n, command) in commands {
        match execute(engine, &command) {
            Ok(line) => {
                tracing::debug!(line = n, "{line}");
                transcript.push(line);
            }
            Err(e) => match e.downcast_ref::<ActionError>() {
                Some(rejected) => {
                    tracing::warn!(line = n, "rejected: {rejected}");
                    transcript.push(format!("rejected: {rejected}"));
                }
                None => return Err(e.context(format!("line {n}"))),
            },
        }
    }

    Ok(transcript)
}
