//! Read-only projections the front end renders. Nothing here owns state;
//! every view is recomputed from the store and the log.

use serde::Serialize;

use crate::event_log::{EventLog, LogKind};
use crate::keys::KeySession;
use crate::party::Party;
use crate::store::{DeliveryStatus, Message, MessageId, MessageStore, Verification};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BubbleBody {
    /// The party's own message.
    Plain { text: String, status: DeliveryStatus },
    /// Received ciphertext nobody has opened yet.
    Locked { fingerprint: String },
    /// Received and decrypted.
    Revealed { text: String, verified: Verification },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bubble {
    pub id: MessageId,
    pub from_me: bool,
    pub time: String,
    pub body: BubbleBody,
}

/// `0x` plus the first six characters of the service's hex view.
pub fn lock_fingerprint(message: &Message) -> String {
    match &message.hex_preview {
        Some(hex) => {
            let prefix: String = hex.chars().take(6).collect();
            format!("0x{prefix}..")
        }
        None => "0x...".to_string(),
    }
}

fn bubble_for(message: &Message, party: Party) -> Option<Bubble> {
    let body = if message.sender == party {
        BubbleBody::Plain {
            text: message.plaintext.clone(),
            status: message.status,
        }
    } else if message.receiver == party {
        if message.status != DeliveryStatus::Sent {
            return None;
        }
        if message.decrypted {
            BubbleBody::Revealed {
                text: message.plaintext.clone(),
                verified: message.verified,
            }
        } else {
            BubbleBody::Locked {
                fingerprint: lock_fingerprint(message),
            }
        }
    } else {
        return None;
    };
    Some(Bubble {
        id: message.id,
        from_me: message.sender == party,
        time: message.created_at.format("%H:%M").to_string(),
        body,
    })
}

/// Everything one phone shows, in creation order.
pub fn inbox(store: &MessageStore, party: Party) -> Vec<Bubble> {
    store.iter().filter_map(|m| bubble_for(m, party)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub line: String,
    pub kind: LogKind,
}

pub fn log_panel(log: &EventLog) -> Vec<LogLine> {
    log.entries()
        .iter()
        .map(|e| LogLine {
            line: e.render(),
            kind: e.kind,
        })
        .collect()
}

pub fn status_line(keys: &KeySession, signature_mode: bool) -> String {
    let mut out = if keys.is_ready() {
        String::from("ONLINE")
    } else {
        String::from("OFFLINE")
    };
    if keys.is_generating() {
        out.push_str(" (generating keys)");
    }
    for party in Party::ALL {
        if let Some(bundle) = keys.bundle(party) {
            out.push_str(&format!("  {party} {}", bundle.fingerprint()));
        }
    }
    if signature_mode {
        out.push_str("  [signature mode]");
    }
    out
}
