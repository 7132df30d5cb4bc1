//! Unique game-pin allocation.
//!
//! Pins are short, human-enterable join codes. Uniqueness is checked against
//! a full scan of the stored pins rather than per-draw round trips: the
//! active-game population is tiny compared to the 900,000-value pin space, so
//! collisions are rare and the scan is cheap.

use std::collections::HashSet;
use std::time::SystemTime;

use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::{dao::models::GameEntity, error::ServiceError, state::SharedState};

/// Lowest assignable pin; the range excludes leading zeros by construction.
pub const PIN_RANGE_START: u32 = 100_000;
/// Highest assignable pin.
pub const PIN_RANGE_END: u32 = 999_999;

/// The draw loop ran out of attempts before finding an unassigned pin.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("pin space exhausted after {attempts} draw attempt(s)")]
pub struct PinSpaceExhausted {
    /// Total candidate draws performed before giving up.
    pub attempts: u32,
}

/// Outcome of a pin allocation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinAssignment {
    /// The game's pin, existing or newly drawn.
    pub pin: String,
    /// Whether this call assigned the pin (false when already present).
    pub freshly_assigned: bool,
}

/// Draw a random six-digit pin candidate.
fn draw_pin(rng: &mut impl Rng) -> String {
    rng.random_range(PIN_RANGE_START..=PIN_RANGE_END).to_string()
}

/// Draw a pin that is not in `existing`, bounded by `draw_attempts` candidate
/// draws per round and `round_limit` rounds overall.
///
/// Never returns a member of `existing`; fails with [`PinSpaceExhausted`]
/// once the bounds are spent. Callers must treat that as a hard failure —
/// retrying further would spin as the pin space fills up.
pub fn draw_unique_pin(
    existing: &HashSet<String>,
    rng: &mut impl Rng,
    draw_attempts: u32,
    round_limit: u32,
) -> Result<String, PinSpaceExhausted> {
    let mut attempts = 0;

    for _ in 0..round_limit {
        for _ in 0..draw_attempts {
            attempts += 1;
            let candidate = draw_pin(rng);
            if !existing.contains(&candidate) {
                return Ok(candidate);
            }
        }
    }

    Err(PinSpaceExhausted { attempts })
}

/// Return the game's pin, allocating and persisting one when absent.
///
/// Idempotent: a game that already carries a pin gets it back unchanged and
/// no write is issued. A missing game id still receives a pin — the write
/// upserts a shell document, matching the game-level upsert discipline of the
/// question merge.
pub async fn generate_game_pin(
    state: &SharedState,
    id: &str,
) -> Result<PinAssignment, ServiceError> {
    if id.trim().is_empty() {
        return Err(ServiceError::InvalidInput("game id is required".into()));
    }

    let store = state.require_game_store().await?;
    let game = store.find_game(id.to_owned()).await?;

    if let Some(existing) = game.as_ref().and_then(|game| game.game_pin.clone()) {
        info!(game_id = %id, pin = %existing, "game already has a pin");
        return Ok(PinAssignment {
            pin: existing,
            freshly_assigned: false,
        });
    }

    let assigned: HashSet<String> = store.list_pins().await?.into_iter().collect();
    let config = state.config();
    let pin = draw_unique_pin(
        &assigned,
        &mut rand::rng(),
        config.pin_draw_attempts,
        config.pin_round_limit,
    )
    .map_err(|err| ServiceError::PinExhausted {
        attempts: err.attempts,
    })?;

    let now = SystemTime::now();
    match game {
        Some(mut game) => {
            let mut retries_left = config.write_retries;
            loop {
                // A concurrent allocator may have won the race; keep its pin.
                if let Some(existing) = game.game_pin {
                    return Ok(PinAssignment {
                        pin: existing,
                        freshly_assigned: false,
                    });
                }

                let expected = game.revision;
                game.game_pin = Some(pin.clone());
                game.updated_at = now;
                game.revision = expected + 1;

                if store.update_game_guarded(game.clone(), expected).await? {
                    break;
                }

                if retries_left == 0 {
                    return Err(ServiceError::Conflict(format!(
                        "game `{id}` was modified concurrently; pin not assigned"
                    )));
                }
                retries_left -= 1;

                game = store
                    .find_game(id.to_owned())
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("game `{id}` not found")))?;
            }
        }
        None => {
            let mut shell = GameEntity::shell(id.to_owned(), now);
            shell.game_pin = Some(pin.clone());
            store.save_game(shell).await?;
        }
    }

    info!(game_id = %id, pin = %pin, "assigned game pin");
    Ok(PinAssignment {
        pin,
        freshly_assigned: true,
    })
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn empty_pin_set_yields_six_digit_pin() {
        let pin = draw_unique_pin(&HashSet::new(), &mut rng(), 100, 1000).unwrap();
        assert_eq!(pin.len(), 6);
        assert!(pin.chars().all(|c| c.is_ascii_digit()));
        assert!(!pin.starts_with('0'));
    }

    #[test]
    fn never_returns_an_assigned_pin() {
        let assigned: HashSet<String> = ["123456", "234567", "345678"]
            .iter()
            .map(|pin| pin.to_string())
            .collect();

        let mut generator = rng();
        for _ in 0..500 {
            let pin = draw_unique_pin(&assigned, &mut generator, 100, 1000).unwrap();
            assert!(!assigned.contains(&pin));
        }
    }

    #[test]
    fn exhausted_pin_space_fails_within_the_bound() {
        let full_space: HashSet<String> = (PIN_RANGE_START..=PIN_RANGE_END)
            .map(|pin| pin.to_string())
            .collect();

        let err = draw_unique_pin(&full_space, &mut rng(), 10, 5).unwrap_err();
        assert_eq!(err.attempts, 50);
    }
}
