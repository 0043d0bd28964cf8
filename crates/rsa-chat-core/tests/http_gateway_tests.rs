//! `HttpGateway` against a one-shot local HTTP responder standing in for the
//! crypto service.

use rsa_chat_core::gateway::{
    Ciphertext, CryptoGateway, DecryptRequest, EncryptRequest, HttpGateway, SignatureBlob,
};
use rsa_chat_core::settings::GatewaySettings;
use rsa_chat_core::{GatewayError, Party};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

fn gateway_for(base_url: String) -> HttpGateway {
    HttpGateway::new(&GatewaySettings {
        base_url,
        ..GatewaySettings::default()
    })
    .unwrap()
}

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = header_end(&buf) {
            let head = String::from_utf8_lossy(&buf[..pos]).to_ascii_lowercase();
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= pos + 4 + len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// Answers exactly one request and hands back what it received.
async fn serve_once(status: &'static str, body: Value) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let body = body.to_string();
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = stream.shutdown().await;
        request
    });
    (format!("http://{addr}"), handle)
}

fn split_request(raw: &str) -> (String, Value) {
    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    let request_line = head.lines().next().unwrap().to_string();
    (request_line, serde_json::from_str(body).unwrap())
}

#[tokio::test]
async fn generate_keys_reads_both_bundles() {
    let (url, server) = serve_once(
        "200 OK",
        json!({"Alice": {"e": 65537, "n": "3233"}, "Bob": {"e": "17", "n": 2773}}),
    )
    .await;
    let keys = gateway_for(url).generate_keys().await.unwrap();
    assert_eq!(keys.alice.e, "65537");
    assert_eq!(keys.alice.n, "3233");
    assert_eq!(keys.bob.e, "17");
    assert_eq!(keys.bob.n, "2773");

    let (line, body) = split_request(&server.await.unwrap());
    assert!(line.starts_with("POST /generate_keys "));
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn encrypt_posts_contract_body() {
    let (url, server) = serve_once(
        "200 OK",
        json!({
            "encrypted_data": ["2790", "1313"],
            "signature_data": ["99"],
            "hex_view": "AE6 521",
            "detailed_logs": ["c = m^e mod n"],
        }),
    )
    .await;
    let res = gateway_for(url)
        .encrypt(&EncryptRequest {
            sender: Party::Alice,
            receiver: Party::Bob,
            message: "hi".into(),
            with_signature: true,
        })
        .await
        .unwrap();
    assert_eq!(res.encrypted_data, Ciphertext(json!(["2790", "1313"])));
    assert_eq!(res.signature_data, Some(SignatureBlob(json!(["99"]))));
    assert_eq!(res.detailed_logs, ["c = m^e mod n"]);

    let (line, body) = split_request(&server.await.unwrap());
    assert!(line.starts_with("POST /encrypt "));
    assert_eq!(
        body,
        json!({"sender": "Alice", "receiver": "Bob", "message": "hi", "with_signature": true})
    );
}

#[tokio::test]
async fn decrypt_error_body_is_surfaced() {
    let (url, server) = serve_once(
        "500 Internal Server Error",
        json!({"error": "keys lost, restart"}),
    )
    .await;
    let err = gateway_for(url)
        .decrypt(&DecryptRequest {
            receiver: Party::Bob,
            sender: Party::Alice,
            encrypted_data: Ciphertext(json!(["2790"])),
            signature_data: None,
        })
        .await
        .unwrap_err();
    match err {
        GatewayError::DecryptionFailed(msg) => {
            assert!(msg.contains("keys lost, restart"));
            assert!(msg.contains("500"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let (line, body) = split_request(&server.await.unwrap());
    assert!(line.starts_with("POST /decrypt "));
    assert!(body.get("signature_data").is_none());
}

#[tokio::test]
async fn malformed_encrypt_response_is_encryption_failure() {
    let (url, _server) = serve_once("200 OK", json!({"unexpected": true})).await;
    let err = gateway_for(url)
        .encrypt(&EncryptRequest {
            sender: Party::Bob,
            receiver: Party::Alice,
            message: "x".into(),
            with_signature: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::EncryptionFailed(_)));
}

#[tokio::test]
async fn unreachable_service_is_backend_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = gateway_for(format!("http://{addr}"))
        .generate_keys()
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::BackendUnavailable(_)));
}

#[tokio::test]
async fn base_url_trailing_slash_is_trimmed() {
    let gateway = gateway_for("http://localhost:5000/".into());
    assert_eq!(gateway.base_url(), "http://localhost:5000");
}
