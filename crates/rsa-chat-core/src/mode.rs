use crate::event_log::{EventLog, LogKind};

/// Whether newly composed messages ask the service for a signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeController {
    signature_mode: bool,
}

impl ModeController {
    pub fn new(signature_mode: bool) -> Self {
        Self { signature_mode }
    }

    pub fn signature_mode(&self) -> bool {
        self.signature_mode
    }

    /// Narrates the change, then applies it. Returns whether anything changed.
    pub fn set(&mut self, enabled: bool, log: &mut EventLog) -> bool {
        if enabled == self.signature_mode {
            return false;
        }
        if enabled {
            log.append("Signature mode enabled", LogKind::Secure);
            log.append(
                "> New messages will be signed with the sender's private key",
                LogKind::Info,
            );
            log.append(
                "> S = H(M)^d mod n, checked by the receiver with S^e mod n",
                LogKind::Math,
            );
        } else {
            log.append("Signature mode disabled", LogKind::Info);
        }
        self.signature_mode = enabled;
        true
    }
}
