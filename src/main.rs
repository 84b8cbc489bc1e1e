mod game;
mod input;
mod signal;
mod snake;
mod term;

use std::ops::Add;

use anyhow::Context;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::game::{GameConfig, Outcome, Session};
use crate::term::{KeyInput, TermManager};

/// Grid cell, also used as a one-step movement delta.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    let config = GameConfig::default();
    config.validate()?;

    let mut term = TermManager::new().context("Failed to query terminal")?;
    term.ensure_fits(&config)?;

    let mut session = Session::new(&config, StdRng::from_entropy());

    // Restore runs on every path once setup has been attempted, since setup
    // may fail after raw mode is already on.
    let played = term.setup().context("Failed to prepare terminal").and_then(|_| {
        info!("Session started on a {}x{} grid", config.width, config.height);
        // The input thread blocks on the keyboard and is never joined; it
        // ends with the process.
        input::spawn(KeyInput, session.snake().heading().clone(), session.shutdown().clone())
            .context("Failed to start input task")?;
        session.play(&mut term, config.tick)
    });
    let restored = term.restore().context("Failed to restore terminal");

    let outcome = finish(played, restored)?;
    println!("{} Final score: {}", describe(outcome), session.score());
    Ok(())
}

/// A restore failure is returned over a play failure, which is logged so it
/// is not lost.
fn finish(played: anyhow::Result<Outcome>, restored: anyhow::Result<()>) -> anyhow::Result<Outcome> {
    if let Err(e) = &played {
        error!("Session aborted: {:#}", e);
    }
    restored?;
    played
}

fn describe(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Quit => "Quit.",
        Outcome::HitWall => "Game over: hit the wall.",
        Outcome::HitSelf => "Game over: ran into yourself.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn finish_passes_outcome_through() {
        assert_eq!(finish(Ok(Outcome::HitWall), Ok(())).unwrap(), Outcome::HitWall);
    }

    #[test]
    fn finish_reports_play_error_when_restored() {
        let err = finish(Err(anyhow!("draw failed")), Ok(())).unwrap_err();
        assert_eq!(err.to_string(), "draw failed");
    }

    #[test]
    fn finish_prefers_restore_error() {
        let err = finish(Err(anyhow!("draw failed")), Err(anyhow!("restore failed"))).unwrap_err();
        assert_eq!(err.to_string(), "restore failed");

        let err = finish(Ok(Outcome::Quit), Err(anyhow!("restore failed"))).unwrap_err();
        assert_eq!(err.to_string(), "restore failed");
    }
}
