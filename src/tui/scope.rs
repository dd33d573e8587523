//! Cancellation scopes tied to the lifetime of a screen.
//!
//! Every backend request carries a token from the scope of the screen that
//! issued it. Navigating replaces the scope, which cancels the old one, and
//! responses tagged with an old generation are discarded.

use tokio_util::sync::CancellationToken;

pub struct ScreenScope {
    generation: u64,
    token: CancellationToken,
}

impl ScreenScope {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            token: CancellationToken::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel this scope and start the one for the next screen.
    pub fn advance(&mut self) {
        *self = ScreenScope::new(self.generation + 1);
    }
}

impl Drop for ScreenScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
