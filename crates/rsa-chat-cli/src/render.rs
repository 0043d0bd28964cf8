use rsa_chat_core::views::{Bubble, BubbleBody, LogLine};
use rsa_chat_core::{ChatError, DeliveryStatus, LogKind, Party, Verification};

pub fn inbox(party: Party, bubbles: &[Bubble]) -> String {
    let mut out = format!("── {party} ──\n");
    if bubbles.is_empty() {
        out.push_str("  (no messages)\n");
        return out;
    }
    for bubble in bubbles {
        out.push_str(&bubble_line(party, bubble));
        out.push('\n');
    }
    out
}

fn bubble_line(party: Party, bubble: &Bubble) -> String {
    let who = if bubble.from_me {
        "me".to_string()
    } else {
        party.peer().to_string()
    };
    let body = match &bubble.body {
        BubbleBody::Plain { text, status } => {
            let mark = match status {
                DeliveryStatus::Pending => "… sending",
                DeliveryStatus::Sent => "✓ sent encrypted",
                DeliveryStatus::Unsent => "✗ not sent",
            };
            format!("{text}  {mark}")
        }
        BubbleBody::Locked { fingerprint } => {
            format!(
                "🔒 {fingerprint}  (open {} {})",
                party.as_str().to_ascii_lowercase(),
                bubble.id
            )
        }
        BubbleBody::Revealed { text, verified } => {
            let mark = match verified {
                Verification::Unset => "🔓",
                Verification::Valid => "🔓 ✓ signature valid",
                Verification::Invalid => "🔓 ✗ signature invalid",
            };
            format!("{text}  {mark}")
        }
    };
    format!("  #{} [{}] {who}: {body}", bubble.id, bubble.time)
}

pub fn log_panel(lines: &[LogLine]) -> String {
    if lines.is_empty() {
        return "  (log is empty)\n".to_string();
    }
    let mut out = String::new();
    for line in lines {
        out.push_str(&format!("{:>7} {}\n", kind_tag(line.kind), line.line));
    }
    out
}

fn kind_tag(kind: LogKind) -> &'static str {
    match kind {
        LogKind::Info => "info",
        LogKind::Math => "math",
        LogKind::System => "system",
        LogKind::Success => "ok",
        LogKind::Secure => "secure",
        LogKind::Error => "error",
    }
}

/// Backend outages get a banner; everything else is a one-line notice.
pub fn failure(err: &ChatError) -> String {
    if err.is_blocking() {
        format!("!! {err}\n!! Is the crypto service running? Try `keys` again once it is up.")
    } else {
        format!("error: {err}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa_chat_core::{GatewayError, MessageId, Rejected};

    fn bubble(from_me: bool, body: BubbleBody) -> Bubble {
        Bubble {
            id: MessageId(42),
            from_me,
            time: "12:01".into(),
            body,
        }
    }

    #[test]
    fn locked_bubble_shows_open_hint() {
        let out = inbox(
            Party::Bob,
            &[bubble(
                false,
                BubbleBody::Locked {
                    fingerprint: "0xAE6521..".into(),
                },
            )],
        );
        assert!(out.contains("Alice: 🔒 0xAE6521..  (open bob 42)"));
    }

    #[test]
    fn own_message_shows_delivery_status() {
        let out = inbox(
            Party::Alice,
            &[bubble(
                true,
                BubbleBody::Plain {
                    text: "hi".into(),
                    status: DeliveryStatus::Unsent,
                },
            )],
        );
        assert!(out.contains("#42 [12:01] me: hi  ✗ not sent"));
    }

    #[test]
    fn revealed_bubble_shows_verification() {
        let out = inbox(
            Party::Bob,
            &[bubble(
                false,
                BubbleBody::Revealed {
                    text: "hi".into(),
                    verified: Verification::Invalid,
                },
            )],
        );
        assert!(out.contains("hi  🔓 ✗ signature invalid"));
    }

    #[test]
    fn empty_inbox_is_labelled() {
        assert_eq!(inbox(Party::Alice, &[]), "── Alice ──\n  (no messages)\n");
    }

    #[test]
    fn outage_gets_banner() {
        let err = ChatError::Gateway(GatewayError::BackendUnavailable("refused".into()));
        assert!(failure(&err).starts_with("!! "));
        let err = ChatError::Rejected(Rejected::EmptyMessage);
        assert_eq!(failure(&err), "error: Message text is empty");
    }
}
