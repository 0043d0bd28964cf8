use thiserror::Error;

use crate::party::Party;
use crate::store::MessageId;

/// Failures reported by the remote cryptographic service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Crypto service unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
}

/// Precondition violations caught locally, before any network call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejected {
    #[error("Keys have not been generated")]
    KeysNotReady,

    #[error("Key generation already in progress")]
    GenerationInProgress,

    #[error("Message text is empty")]
    EmptyMessage,

    #[error("Unknown message {0}")]
    UnknownMessage(MessageId),

    #[error("{actor} is not the receiver of message {id}")]
    NotReceiver { id: MessageId, actor: Party },

    #[error("Message {0} has no ciphertext yet")]
    NotDelivered(MessageId),

    #[error("Message {0} is already decrypted")]
    AlreadyDecrypted(MessageId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Rejected(#[from] Rejected),

    /// The key epoch changed while the call was in flight; the response was dropped.
    #[error("Response discarded: keys were regenerated (epoch {issued} → {current})")]
    StaleEpoch { issued: u64, current: u64 },
}

impl ChatError {
    /// Only an unreachable backend is fatal to the session.
    pub fn is_blocking(&self) -> bool {
        matches!(self, ChatError::Gateway(GatewayError::BackendUnavailable(_)))
    }
}
