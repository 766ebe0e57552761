use rand::Rng;

use crate::error::AppError;
use crate::store::AccountStore;

pub const SYNC_CODE_PREFIX: &str = "SIGNAL-";
pub const CODE_BODY_LEN: usize = 6;
const MAX_ALLOCATION_ATTEMPTS: usize = 10;

/// 32 symbols; visually ambiguous 0/O and 1/I are excluded so codes survive
/// being read aloud or handwritten.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Canonical form: trimmed, uppercased, prefix ensured. Input is
/// case-insensitive and may omit the prefix.
pub fn normalize_sync_code(input: &str) -> String {
    let upper = input.trim().to_uppercase();
    if upper.starts_with(SYNC_CODE_PREFIX) {
        upper
    } else {
        format!("{SYNC_CODE_PREFIX}{upper}")
    }
}

pub fn is_valid_sync_code(code: &str) -> bool {
    let Some(body) = code.strip_prefix(SYNC_CODE_PREFIX) else {
        return false;
    };
    body.len() == CODE_BODY_LEN && body.bytes().all(|b| ALPHABET.contains(&b))
}

fn generate_candidate() -> String {
    let mut rng = rand::thread_rng();
    let body: String = (0..CODE_BODY_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{SYNC_CODE_PREFIX}{body}")
}

/// Draw candidates until one is free in the store, up to the attempt
/// ceiling. Exhaustion is reported, not retried: 10 straight collisions out
/// of 32^6 codes points at a store problem, not bad luck.
pub async fn allocate_sync_code(store: &dyn AccountStore) -> Result<String, AppError> {
    for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
        let candidate = generate_candidate();
        if !store.exists(&candidate).await? {
            tracing::debug!(sync_code = %candidate, attempt, "Allocated sync code");
            return Ok(candidate);
        }
        tracing::warn!(sync_code = %candidate, attempt, "Sync code collision, retrying");
    }
    Err(AppError::AllocationExhausted)
}
