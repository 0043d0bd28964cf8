//! rsa_chat_core: conversation orchestrator for the RSA messaging simulator.
//!
//! Two simulated parties exchange messages whose cryptography is performed by
//! a remote service. This crate keeps the shared conversation state: key
//! readiness, the message lifecycle, the signature-mode flag and the
//! observability log, plus the read-only projections the front end renders.
//!
//! # Modules
//! - `gateway`       Wire types and the `CryptoGateway` trait (HTTP client included)
//! - `keys`          Key session: readiness, epoch, public bundles
//! - `store`         Id-keyed message records and their lifecycle
//! - `mode`          Signature-mode flag
//! - `event_log`     Append-only typed log
//! - `views`         Per-party inbox and log panel projections
//! - `conversation`  The orchestrator tying everything together

pub mod conversation;
pub mod error;
pub mod event_log;
pub mod gateway;
pub mod keys;
pub mod mode;
pub mod party;
pub mod paths;
pub mod settings;
pub mod store;
pub mod views;

pub use conversation::Conversation;
pub use error::{ChatError, GatewayError, Rejected};
pub use event_log::{EventLog, LogEntry, LogKind};
pub use gateway::{CryptoGateway, HttpGateway};
pub use keys::{KeyBundle, KeySession};
pub use party::Party;
pub use settings::Settings;
pub use store::{DeliveryStatus, Message, MessageId, MessageStore, Verification};
