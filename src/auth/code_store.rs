//! Short-lived, single-use authorization codes.
//!
//! Codes are minted by the authorize endpoint and redeemed exactly once at
//! the token endpoint. The mutex serializes redemption, so concurrent
//! exchanges of the same code resolve to at-most-one success.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

/// Codes older than this are rejected even if never redeemed.
pub const CODE_TTL: Duration = Duration::from_secs(600);

struct CodeEntry {
    created_at: Instant,
}

/// In-memory store of outstanding authorization codes.
#[derive(Default)]
pub struct CodeStore {
    codes: Mutex<HashMap<String, CodeEntry>>,
}

impl CodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh random code and record it.
    pub fn issue(&self) -> String {
        let code = Uuid::new_v4().simple().to_string();
        self.insert(code.clone());
        code
    }

    /// Record an externally chosen code (used by tests and the authorize
    /// flow when the code value is fixed upstream).
    pub fn insert(&self, code: String) {
        let mut codes = self.codes.lock().expect("code store lock poisoned");
        codes.insert(
            code,
            CodeEntry {
                created_at: Instant::now(),
            },
        );
    }

    /// Redeem a code. Returns `true` exactly once per valid, unexpired
    /// code; unknown, expired, and already-consumed codes all return
    /// `false`.
    pub fn verify_and_consume(&self, code: &str) -> bool {
        self.consume_at(code, Instant::now())
    }

    fn consume_at(&self, code: &str, now: Instant) -> bool {
        let mut codes = self.codes.lock().expect("code store lock poisoned");
        match codes.remove(code) {
            Some(entry) => now.duration_since(entry.created_at) < CODE_TTL,
            None => false,
        }
    }

    /// Number of outstanding (unredeemed) codes.
    pub fn outstanding(&self) -> usize {
        self.codes.lock().expect("code store lock poisoned").len()
    }
}
