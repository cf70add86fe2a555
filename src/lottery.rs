use cosmwasm_std::{Addr, Env, Timestamp, Uint128};
use sha2::{Digest, Sha256};

use crate::error::ContractError;

/// A scheduled draw lands 1..=31 slots ahead of the current block.
pub const DRAW_WINDOW_SLOTS: u64 = 31;
/// Seconds per scheduling slot.
pub const SLOT_SECONDS: u64 = 16;

fn hash_to_u64(bytes: &[u8]) -> u64 {
    let digest = Sha256::digest(bytes);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Weak local randomness for picking the draw slot. Block data is not
/// manipulation-proof; it only has to be unknown ahead of time.
pub fn schedule_seed(env: &Env) -> u64 {
    let mut bytes = Vec::with_capacity(16);
    bytes.extend_from_slice(&env.block.time.nanos().to_be_bytes());
    bytes.extend_from_slice(&env.block.height.to_be_bytes());
    hash_to_u64(&bytes)
}

/// Earliest execution time for the next scheduled draw.
pub fn draw_time(env: &Env) -> Timestamp {
    let slot = schedule_seed(env) % DRAW_WINDOW_SLOTS + 1;
    env.block.time.plus_seconds(slot * SLOT_SECONDS)
}

/// Winner seed, derived from the decider address's balance. The balance moves
/// with third-party activity, so it is unknown to the owner at schedule time.
pub fn winner_seed(balance: Uint128) -> u64 {
    hash_to_u64(&balance.u128().to_be_bytes())
}

/// Picks the winning participant: seed modulo (count - 1), then forward past
/// any owner entries, wrapping at the end of the list. The owner never wins.
pub fn pick_winner<'a>(
    participants: &'a [Addr],
    owner: &Addr,
    seed: u64,
) -> Result<(usize, &'a Addr), ContractError> {
    if participants.is_empty() {
        return Err(ContractError::NoParticipants {});
    }
    if participants.iter().all(|participant| participant == owner) {
        return Err(ContractError::NoEligibleWinner {});
    }

    let count = (participants.len() - 1) as u64;
    let mut index = if count == 0 {
        0
    } else {
        (seed % count) as usize
    };
    while participants[index] == *owner {
        index = (index + 1) % participants.len();
    }

    Ok((index, &participants[index]))
}
