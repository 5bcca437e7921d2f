//! GeminiStreamProvider against a local one-shot HTTP server.

use futures::StreamExt;
use neurobot_core::provider::{HistoryEntry, Role};
use neurobot_core::{NeurobotError, SessionRequest, StreamingProvider};
use neurobot_interaction::GeminiStreamProvider;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serves exactly one request with `response` and hands back the raw request.
async fn serve_once(response: String) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/v1beta", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        let _ = tx.send(request);
    });

    (base_url, rx)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn request() -> SessionRequest {
    SessionRequest {
        model: "gemini-2.5-flash".to_string(),
        history: vec![HistoryEntry::text(Role::Model, "Hello!")],
        system_instruction: "Be brief.".to_string(),
        temperature: 0.7,
        top_k: 40,
        top_p: 0.95,
        message: "Hi".to_string(),
    }
}

#[tokio::test]
async fn test_streams_text_deltas() {
    let body = concat!(
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Hi\"}]}}]}\r\n\r\n",
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\" there\"}]},\"finishReason\":\"STOP\"}]}\r\n\r\n",
    );
    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n{body}"
    );
    let (base_url, captured) = serve_once(response).await;

    let provider = GeminiStreamProvider::new("secret-key").with_base_url(base_url);
    let stream = provider.open_stream(&request()).await.unwrap();
    let deltas: Vec<String> = stream.map(|item| item.unwrap()).collect().await;
    assert_eq!(deltas, vec!["Hi".to_string(), " there".to_string()]);

    let raw = captured.await.unwrap();
    assert!(raw.starts_with(
        "POST /v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse HTTP/1.1"
    ));
    assert!(raw.to_ascii_lowercase().contains("x-goog-api-key: secret-key"));
    assert!(raw.contains("\"systemInstruction\""));
    assert!(raw.contains("\"topK\":40"));
}

#[tokio::test]
async fn test_http_error_maps_to_provider_error() {
    let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
    let response = format!(
        "HTTP/1.1 429 Too Many Requests\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    let (base_url, _captured) = serve_once(response).await;

    let provider = GeminiStreamProvider::new("k").with_base_url(base_url);
    let err = provider.open_stream(&request()).await.err().unwrap();
    assert_eq!(
        err,
        NeurobotError::provider(Some(429), "RESOURCE_EXHAUSTED: Quota exceeded")
    );
}

#[tokio::test]
async fn test_connection_refused_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let provider = GeminiStreamProvider::new("k").with_base_url(format!("http://{addr}/v1beta"));
    let err = provider.open_stream(&request()).await.err().unwrap();
    assert!(matches!(err, NeurobotError::Transport(_)));
}
