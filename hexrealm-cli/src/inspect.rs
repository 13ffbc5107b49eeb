//! Human-readable game summaries

use std::fmt::{self, Write};

use hexrealm_core::{Resources, TurnEngine};

fn ledger(r: &Resources) -> String {
    format!(
        "gold {} wood {} stone {} metal {} food {}",
        r.gold, r.wood, r.stone, r.metal, r.food
    )
}

/// Round, turn, players and every entity on the board
pub fn summary(engine: &TurnEngine) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_summary(&mut out, engine)?;
    Ok(out)
}

pub fn write_summary(out: &mut impl Write, engine: &TurnEngine) -> fmt::Result {
    let world = engine.world();

    writeln!(
        out,
        "round {} on a {}x{} board",
        engine.current_round(),
        world.board().rows(),
        world.board().cols()
    )?;
    if engine.is_game_over() {
        writeln!(out, "{}", engine.game_over_message())?;
        for (id, score) in engine.player_scores() {
            writeln!(out, "  {id}: {score} points")?;
        }
    } else if let Some(id) = engine.current_player_id() {
        writeln!(out, "{id} to move")?;
    }

    for &id in engine.roster() {
        let Some(player) = world.player(id) else {
            continue;
        };
        writeln!(
            out,
            "{id}: {} units, {} cities, score {}",
            player.units.len(),
            player.buildings.len(),
            player.score
        )?;
        writeln!(out, "  stock   {}", ledger(&player.resources))?;
        writeln!(out, "  income  {}", ledger(&player.income))?;
        writeln!(out, "  expense {}", ledger(&player.expense))?;

        for city in world.cities().filter(|c| c.owner == id) {
            let built: Vec<_> = city.completed.iter().map(|k| k.id()).collect();
            writeln!(
                out,
                "  {} at ({}, {}) hp {}/{} built [{}]",
                city.name(),
                city.position.q(),
                city.position.r(),
                city.hp,
                city.max_hp,
                built.join(", ")
            )?;
            if let Some(order) = city.improvement {
                writeln!(
                    out,
                    "    building {} ({} turns left)",
                    order.kind.id(),
                    order.turns_remaining
                )?;
            }
            if let Some(order) = city.recruitment {
                writeln!(
                    out,
                    "    recruiting {} ({} turns left)",
                    order.kind.blueprint().id,
                    order.turns_remaining
                )?;
            }
        }
        for unit in world.units().filter(|u| u.owner == id) {
            writeln!(
                out,
                "  {} at ({}, {}) hp {}/{} move {}/{}{}",
                unit.name(),
                unit.position.q(),
                unit.position.r(),
                unit.hp,
                unit.max_hp,
                unit.movement,
                unit.max_movement,
                if unit.is_dug_in { " dug in" } else { "" }
            )?;
        }
    }

    Ok(())
}
