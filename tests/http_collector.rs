use serde_json::{json, Value};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use ivr_kernel::services::collect::HttpCollector;
use ivr_kernel::{Collector, CollectResult, IvrError, MenuDefinition, Prompt};

/// What the fake media server received.
struct Received {
    request_line: String,
    body: Value,
}

/// Serves exactly one canned HTTP reply on a local port.
async fn serve_once(status: &'static str, reply: &'static str) -> (String, JoinHandle<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let received = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reply.len(),
            reply
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        received
    });

    (format!("http://{}", addr), handle)
}

async fn read_request(socket: &mut TcpStream) -> Received {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed the connection mid-request");
        buf.extend_from_slice(&chunk[..n]);

        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().unwrap())
            })
            .unwrap_or(0);

        let body_start = head_end + 4;
        if buf.len() >= body_start + length {
            return Received {
                request_line: head.lines().next().unwrap_or_default().to_string(),
                body: serde_json::from_slice(&buf[body_start..body_start + length]).unwrap(),
            };
        }
    }
}

fn local_collector(base_url: &str) -> HttpCollector {
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    HttpCollector::with_client(client, base_url)
}

#[tokio::test]
async fn test_http_collect_posts_prompt_and_options() {
    let (base_url, server) = serve_once("200 OK", r#"{ "status": "match", "utterance": "Paris", "mode": "voice" }"#).await;
    let menu = MenuDefinition::<()>::builder()
        .grammar("cities")
        .barge_in(true)
        .timeout(Duration::from_millis(5000))
        .build()
        .unwrap();
    let options = menu.build_collect_options(0).unwrap();

    let result = local_collector(&base_url)
        .collect(&Prompt::from("Where to?"), &options)
        .await
        .expect("a 200 reply decodes");

    assert_eq!(result.kind(), ivr_kernel::CollectKind::Match);
    assert_eq!(result.utterance().and_then(|u| u.text()), Some("Paris"));

    let received = server.await.unwrap();
    assert!(received.request_line.starts_with("POST /collect "), "got {}", received.request_line);
    assert_eq!(
        received.body,
        json!({
            "prompt": "Where to?",
            "options": { "grammar": "cities", "interruptible": true, "timeout": 5000 }
        }),
        "criteria are flattened and the timeout travels in milliseconds"
    );
}

#[tokio::test]
async fn test_http_collect_maps_server_errors() {
    let (base_url, server) = serve_once("503 Service Unavailable", r#"{ "error": "busy" }"#).await;
    let menu = MenuDefinition::<()>::builder().limit(4).build().unwrap();
    let options = menu.build_collect_options(1).unwrap();

    let err = local_collector(&base_url)
        .collect(&Prompt::from("Enter your PIN"), &options)
        .await
        .unwrap_err();

    match err {
        IvrError::Collector(message) => assert!(message.contains("503"), "got {}", message),
        other => panic!("Expected a collector error, got {:?}", other),
    }
    let received = server.await.unwrap();
    assert_eq!(received.body["options"], json!({ "limit": 4, "interruptible": false }));
}

#[tokio::test]
async fn test_http_collect_rejects_unknown_outcomes() {
    let (base_url, server) = serve_once("200 OK", r#"{ "status": "maybe" }"#).await;
    let menu = MenuDefinition::<()>::builder().grammar("g").build().unwrap();
    let options = menu.build_collect_options(0).unwrap();

    let result: Result<CollectResult, IvrError> = local_collector(&base_url).collect(&Prompt::from("Hi"), &options).await;

    assert!(matches!(result, Err(IvrError::ContractViolation(_))), "got {:?}", result);
    server.await.unwrap();
}
