//! The orchestrator: drives key generation, sends and decrypts through the
//! gateway while keeping store, log and both phones consistent.
//!
//! All state sits in one [`SessionState`] behind a mutex that is only ever
//! taken between suspension points. Each operation records local intent,
//! awaits the service, then applies the outcome by message id. Every call
//! remembers the key epoch it was issued under; if keys were regenerated in
//! the meantime the response is dropped without touching anything.

use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ChatError, Rejected};
use crate::event_log::{EventLog, LogEntry, LogKind};
use crate::gateway::{CryptoGateway, DecryptRequest, EncryptRequest};
use crate::keys::{KeyBundle, KeySession};
use crate::mode::ModeController;
use crate::party::Party;
use crate::store::{Message, MessageId, MessageStore, Verification};
use crate::views::{self, Bubble, LogLine};

#[derive(Debug, Default)]
pub struct SessionState {
    pub keys: KeySession,
    pub store: MessageStore,
    pub log: EventLog,
    pub mode: ModeController,
}

#[derive(Clone)]
pub struct Conversation {
    gateway: Arc<dyn CryptoGateway>,
    state: Arc<Mutex<SessionState>>,
}

impl Conversation {
    pub fn new(gateway: Arc<dyn CryptoGateway>) -> Self {
        Self {
            gateway,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    /// Initial signature mode, applied silently (no narration).
    pub fn with_signature_mode(self, enabled: bool) -> Self {
        self.state.lock().mode = ModeController::new(enabled);
        self
    }

    // ── Key session ──────────────────────────────────────────────────────────

    /// Generates (or regenerates) both key pairs. On success every message and
    /// log line from the previous epoch is gone.
    pub async fn generate_keys(&self) -> Result<(KeyBundle, KeyBundle), ChatError> {
        self.state.lock().keys.begin_generation()?;
        let in_flight = GenerationInFlight {
            state: Some(self.state.clone()),
        };

        let result = self.gateway.generate_keys().await;

        in_flight.disarm();
        let mut guard = self.state.lock();
        let s = &mut *guard;
        match result {
            Ok(keys) => {
                s.store.clear();
                s.log.reset();
                let epoch = s.keys.install(keys);
                s.log.append("Starting RSA server...", LogKind::System);
                s.log
                    .append("Generating primes p and q for Alice...", LogKind::System);
                s.log
                    .append("Generating primes p and q for Bob...", LogKind::System);
                s.log
                    .append("✓ Public/private keys generated!", LogKind::Success);
                info!(epoch, "key pairs installed");
                let alice = s.keys.bundle(Party::Alice).cloned();
                let bob = s.keys.bundle(Party::Bob).cloned();
                alice.zip(bob).ok_or(ChatError::Rejected(Rejected::KeysNotReady))
            }
            Err(err) => {
                s.keys.abort_generation();
                warn!(error = %err, "key generation failed");
                Err(err.into())
            }
        }
    }

    // ── Mode ─────────────────────────────────────────────────────────────────

    pub fn set_signature_mode(&self, enabled: bool) -> bool {
        let mut guard = self.state.lock();
        let s = &mut *guard;
        s.mode.set(enabled, &mut s.log)
    }

    pub fn signature_mode(&self) -> bool {
        self.state.lock().mode.signature_mode()
    }

    // ── Messages ─────────────────────────────────────────────────────────────

    /// Encrypts `text` for the sender's peer. `with_signature` is the signature
    /// mode the caller read at composition time.
    pub async fn send(
        &self,
        sender: Party,
        text: &str,
        with_signature: bool,
    ) -> Result<Message, ChatError> {
        if text.trim().is_empty() {
            return Err(Rejected::EmptyMessage.into());
        }

        let (id, epoch, receiver) = {
            let mut guard = self.state.lock();
            let s = &mut *guard;
            s.keys.ensure_ready()?;
            let epoch = s.keys.epoch();
            let pending = s.store.compose(sender, text, with_signature, epoch);
            let receiver = pending.receiver;
            s.log
                .append(format!("{sender}: starting send to {receiver}"), LogKind::Info);
            s.log.append(
                format!("> Fetching public key of {receiver}..."),
                LogKind::Math,
            );
            s.log.append("> Applying C = M^e mod n", LogKind::Math);
            if with_signature {
                s.log.append(
                    format!("> Signing with private key of {sender}: S = H(M)^d mod n"),
                    LogKind::Secure,
                );
            }
            (pending.id, epoch, receiver)
        };
        debug!(%id, epoch, "message composed");

        let request = EncryptRequest {
            sender,
            receiver,
            message: text.to_string(),
            with_signature,
        };
        let result = self.gateway.encrypt(&request).await;

        let mut guard = self.state.lock();
        let s = &mut *guard;
        check_epoch(&s.keys, epoch, id)?;
        match result {
            Ok(mut res) => {
                s.log.extend_remote(std::mem::take(&mut res.detailed_logs));
                let preview: String = res.hex_view.chars().take(15).collect();
                let message = s
                    .store
                    .confirm_sent(id, res)
                    .cloned()
                    .ok_or(Rejected::UnknownMessage(id))?;
                s.log
                    .append(format!("✓ Encrypted: [{preview}...]"), LogKind::Success);
                if message.is_signed() {
                    s.log.append("✓ Signature attached", LogKind::Secure);
                }
                info!(%id, signed = message.is_signed(), "message sent");
                Ok(message)
            }
            Err(err) => {
                s.store.mark_unsent(id);
                s.log.append("Encryption failed.", LogKind::Error);
                warn!(%id, error = %err, "encrypt failed");
                Err(err.into())
            }
        }
    }

    /// Tap-to-decrypt: `actor` must be the receiver and the message still locked.
    pub async fn decrypt(&self, actor: Party, id: MessageId) -> Result<Message, ChatError> {
        let (request, epoch) = {
            let mut guard = self.state.lock();
            let s = &mut *guard;
            s.keys.ensure_ready()?;
            let message = s.store.check_decryptable(id, actor)?;
            let request = DecryptRequest {
                receiver: message.receiver,
                sender: message.sender,
                encrypted_data: message
                    .encrypted_payload
                    .clone()
                    .ok_or(Rejected::NotDelivered(id))?,
                signature_data: message.signature_payload.clone(),
            };
            s.log.append(
                format!("{}: received encrypted message.", request.receiver),
                LogKind::Info,
            );
            s.log.append(
                format!("> Using private key of {}...", request.receiver),
                LogKind::Math,
            );
            (request, s.keys.epoch())
        };

        let result = self.gateway.decrypt(&request).await;

        let mut guard = self.state.lock();
        let s = &mut *guard;
        check_epoch(&s.keys, epoch, id)?;
        match result {
            Ok(mut res) => {
                // A second tap may have raced this one to the service.
                if s.store.get(id).map_or(true, |m| m.decrypted) {
                    debug!(%id, "duplicate decrypt response dropped");
                    return Err(Rejected::AlreadyDecrypted(id).into());
                }
                s.log.extend_remote(std::mem::take(&mut res.detailed_logs));
                s.log.append("> Applying M = C^d mod n", LogKind::Math);
                s.log.append(
                    format!("✓ Original text recovered: \"{}\"", res.original_message),
                    LogKind::Success,
                );
                let message = s
                    .store
                    .reveal(id, res.original_message, res.is_valid)?
                    .clone();
                match message.verified {
                    Verification::Valid => {
                        s.log.append(
                            format!("✓ Signature valid: authored by {}", message.sender),
                            LogKind::Secure,
                        );
                    }
                    Verification::Invalid => {
                        s.log.append(
                            format!(
                                "✗ Signature invalid: authenticity of {} not confirmed",
                                message.sender
                            ),
                            LogKind::Error,
                        );
                    }
                    Verification::Unset => {}
                }
                info!(%id, verified = ?message.verified, "message revealed");
                Ok(message)
            }
            Err(err) => {
                s.log.append("Decryption failed.", LogKind::Error);
                warn!(%id, error = %err, "decrypt failed");
                Err(err.into())
            }
        }
    }

    // ── Snapshots ────────────────────────────────────────────────────────────

    pub fn is_ready(&self) -> bool {
        self.state.lock().keys.is_ready()
    }

    pub fn epoch(&self) -> u64 {
        self.state.lock().keys.epoch()
    }

    pub fn key_bundle(&self, party: Party) -> Option<KeyBundle> {
        self.state.lock().keys.bundle(party).cloned()
    }

    pub fn message(&self, id: MessageId) -> Option<Message> {
        self.state.lock().store.get(id).cloned()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().store.iter().cloned().collect()
    }

    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.state.lock().log.entries().to_vec()
    }

    pub fn inbox(&self, party: Party) -> Vec<Bubble> {
        views::inbox(&self.state.lock().store, party)
    }

    pub fn log_panel(&self) -> Vec<LogLine> {
        views::log_panel(&self.state.lock().log)
    }

    pub fn status_line(&self) -> String {
        let guard = self.state.lock();
        views::status_line(&guard.keys, guard.mode.signature_mode())
    }

    pub fn export_log<W: Write>(&self, out: W) -> anyhow::Result<()> {
        self.state.lock().log.write_jsonl(out)
    }
}

/// Clears the generating flag if `generate_keys` is dropped mid-flight.
struct GenerationInFlight {
    state: Option<Arc<Mutex<SessionState>>>,
}

impl GenerationInFlight {
    /// The completion path takes over clearing the flag.
    fn disarm(mut self) {
        self.state = None;
    }
}

impl Drop for GenerationInFlight {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            state.lock().keys.abort_generation();
            debug!("key generation cancelled");
        }
    }
}

fn check_epoch(keys: &KeySession, issued: u64, id: MessageId) -> Result<(), ChatError> {
    let current = keys.epoch();
    if current != issued {
        debug!(%id, issued, current, "stale response discarded");
        return Err(ChatError::StaleEpoch { issued, current });
    }
    Ok(())
}
