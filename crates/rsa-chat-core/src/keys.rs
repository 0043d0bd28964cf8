use serde::{Deserialize, Serialize};

use crate::error::Rejected;
use crate::gateway::{GenerateKeysResponse, WireKey};
use crate::party::Party;

/// Public half of a party's RSA key pair. The private half never leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyBundle {
    pub owner: Party,
    pub public_exponent: String,
    pub modulus: String,
}

impl KeyBundle {
    fn from_wire(owner: Party, key: WireKey) -> Self {
        Self {
            owner,
            public_exponent: key.e,
            modulus: key.n,
        }
    }

    /// Short `(e, n…)` form for status displays.
    pub fn fingerprint(&self) -> String {
        let n: String = self.modulus.chars().take(8).collect();
        let ellipsis = if self.modulus.chars().count() > 8 { "…" } else { "" };
        format!("(e={}, n={}{})", self.public_exponent, n, ellipsis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyPhase {
    Uninitialized,
    Ready { alice: KeyBundle, bob: KeyBundle },
}

/// Tracks whether keys exist, which generation they belong to, and whether a
/// generation round trip is currently running.
#[derive(Debug, Clone)]
pub struct KeySession {
    phase: KeyPhase,
    epoch: u64,
    generating: bool,
}

impl Default for KeySession {
    fn default() -> Self {
        Self {
            phase: KeyPhase::Uninitialized,
            epoch: 0,
            generating: false,
        }
    }
}

impl KeySession {
    pub fn is_ready(&self) -> bool {
        matches!(self.phase, KeyPhase::Ready { .. })
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn bundle(&self, party: Party) -> Option<&KeyBundle> {
        match &self.phase {
            KeyPhase::Uninitialized => None,
            KeyPhase::Ready { alice, bob } => Some(match party {
                Party::Alice => alice,
                Party::Bob => bob,
            }),
        }
    }

    pub fn ensure_ready(&self) -> Result<(), Rejected> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(Rejected::KeysNotReady)
        }
    }

    pub(crate) fn begin_generation(&mut self) -> Result<(), Rejected> {
        if self.generating {
            return Err(Rejected::GenerationInProgress);
        }
        self.generating = true;
        Ok(())
    }

    /// Leaves phase and epoch exactly as they were before the attempt.
    pub(crate) fn abort_generation(&mut self) {
        self.generating = false;
    }

    /// Replaces both bundles wholesale and starts a new epoch.
    pub(crate) fn install(&mut self, keys: GenerateKeysResponse) -> u64 {
        self.phase = KeyPhase::Ready {
            alice: KeyBundle::from_wire(Party::Alice, keys.alice),
            bob: KeyBundle::from_wire(Party::Bob, keys.bob),
        };
        self.epoch += 1;
        self.generating = false;
        self.epoch
    }
}
