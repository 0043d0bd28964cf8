//! Message records and their lifecycle.
//!
//! Sender side: `Pending` (optimistic insert, encrypt in flight) → `Sent`, or
//! `Pending` → `Unsent` when the service refused. Receiver side: a `Sent`
//! message is locked until its receiver explicitly decrypts it; the reveal is
//! one-way and writes `plaintext`, `decrypted` and `verified` together.
//!
//! Records are keyed by [`MessageId`]; ids are creation-ordered, so iterating
//! the map yields creation order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Rejected;
use crate::gateway::{Ciphertext, EncryptResponse, SignatureBlob};
use crate::party::Party;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Sent,
    Unsent,
}

/// Outcome of the signature check. `Unset` means no signature was attached,
/// which is a different fact from a signature that failed (`Invalid`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    #[default]
    Unset,
    Valid,
    Invalid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub sender: Party,
    pub receiver: Party,
    pub plaintext: String,
    pub encrypted_payload: Option<Ciphertext>,
    pub signature_payload: Option<SignatureBlob>,
    pub hex_preview: Option<String>,
    /// Signature mode at composition time.
    pub signature_requested: bool,
    pub status: DeliveryStatus,
    pub decrypted: bool,
    pub verified: Verification,
    pub created_at: DateTime<Utc>,
    pub epoch: u64,
}

impl Message {
    pub fn is_signed(&self) -> bool {
        self.signature_payload.is_some()
    }

    /// The receiver holds ciphertext it has not opened yet.
    pub fn is_locked_for(&self, party: Party) -> bool {
        party == self.receiver && self.status == DeliveryStatus::Sent && !self.decrypted
    }

    /// Plaintext as `party` is allowed to see it.
    pub fn visible_text_for(&self, party: Party) -> Option<&str> {
        if party == self.sender || (party == self.receiver && self.decrypted) {
            Some(&self.plaintext)
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
pub struct MessageStore {
    messages: BTreeMap<MessageId, Message>,
    last_id: u64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Milliseconds since the epoch, bumped so ids stay strictly increasing.
    fn next_id(&mut self) -> MessageId {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let id = now.max(self.last_id + 1);
        self.last_id = id;
        MessageId(id)
    }

    /// Inserts the optimistic `Pending` record the sender sees right away.
    pub(crate) fn compose(
        &mut self,
        sender: Party,
        text: &str,
        signature_requested: bool,
        epoch: u64,
    ) -> Message {
        let id = self.next_id();
        let message = Message {
            id,
            sender,
            receiver: sender.peer(),
            plaintext: text.to_string(),
            encrypted_payload: None,
            signature_payload: None,
            hex_preview: None,
            signature_requested,
            status: DeliveryStatus::Pending,
            decrypted: false,
            verified: Verification::Unset,
            created_at: Utc::now(),
            epoch,
        };
        self.messages.insert(id, message.clone());
        message
    }

    /// Writes the service-confirmed fields. Only a `Pending` record accepts
    /// them, so the ciphertext is written at most once.
    pub(crate) fn confirm_sent(&mut self, id: MessageId, res: EncryptResponse) -> Option<&Message> {
        let message = self.messages.get_mut(&id)?;
        if message.status != DeliveryStatus::Pending {
            return None;
        }
        message.encrypted_payload = Some(res.encrypted_data);
        message.signature_payload = if message.signature_requested {
            res.signature_data
        } else {
            None
        };
        message.hex_preview = Some(res.hex_view);
        message.status = DeliveryStatus::Sent;
        Some(message)
    }

    pub(crate) fn mark_unsent(&mut self, id: MessageId) -> Option<&Message> {
        let message = self.messages.get_mut(&id)?;
        if message.status != DeliveryStatus::Pending {
            return None;
        }
        message.status = DeliveryStatus::Unsent;
        Some(message)
    }

    /// Checks everything `decrypt` needs before it goes to the network.
    pub fn check_decryptable(&self, id: MessageId, actor: Party) -> Result<&Message, Rejected> {
        let message = self.messages.get(&id).ok_or(Rejected::UnknownMessage(id))?;
        if message.receiver != actor {
            return Err(Rejected::NotReceiver { id, actor });
        }
        if message.decrypted {
            return Err(Rejected::AlreadyDecrypted(id));
        }
        if message.status != DeliveryStatus::Sent || message.encrypted_payload.is_none() {
            return Err(Rejected::NotDelivered(id));
        }
        Ok(message)
    }

    /// One mutation: plaintext, `decrypted` and `verified` change together.
    pub(crate) fn reveal(
        &mut self,
        id: MessageId,
        plaintext: String,
        is_valid: Option<bool>,
    ) -> Result<&Message, Rejected> {
        let message = self
            .messages
            .get_mut(&id)
            .ok_or(Rejected::UnknownMessage(id))?;
        if message.decrypted {
            return Err(Rejected::AlreadyDecrypted(id));
        }
        message.verified = match (message.is_signed(), is_valid) {
            (false, _) => Verification::Unset,
            (true, Some(true)) => Verification::Valid,
            (true, _) => Verification::Invalid,
        };
        message.plaintext = plaintext;
        message.decrypted = true;
        Ok(message)
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }
}
