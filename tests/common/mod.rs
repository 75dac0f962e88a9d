//! Throw-away HTTP servers for exercising the backend client

#![allow(dead_code)]

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// What the client sent
#[derive(Debug, Clone)]
pub struct RecordedRequest
{   pub method: String
  , pub path: String
  , /// Header block, lowercased
    pub head: String
  , pub body: serde_json::Value
}

fn header_end(buf: &[u8]) -> Option<usize>
{   buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn content_length(head: &str) -> usize
{   head.lines()
      .filter_map(|line| line.strip_prefix("content-length:"))
      .filter_map(|value| value.trim().parse().ok())
      .next()
      .unwrap_or(0)
}

async fn read_request(stream: &mut TcpStream) -> RecordedRequest
{   let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let end = loop
    {   let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending a request");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = header_end(&buf)
        {   let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            if buf.len() >= end + 4 + content_length(&head)
            {   break end;
            }
        }
    };

    let head = String::from_utf8_lossy(&buf[..end]).to_string();
    let mut request_line = head.lines().next().unwrap().split_whitespace();
    let method = request_line.next().unwrap().to_string();
    let path = request_line.next().unwrap().to_string();
    let body = serde_json::from_slice(&buf[end + 4..])
      .unwrap_or(serde_json::Value::Null);

    RecordedRequest
    {   method
      , path
      , head: head.to_lowercase()
      , body
    }
}

/// Answer a single request with `status` and `body`.
/// Returns the base url and a handle yielding what was received.
pub async fn serve_once(
  status: u16
, body: &str
) -> (String, JoinHandle<RecordedRequest>)
{   let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let body = body.to_string();

    let handle = tokio::spawn(async move {
      let (mut stream, _) = listener.accept().await.unwrap();
      let request = read_request(&mut stream).await;
      let response = format!(
        "HTTP/1.1 {} Canned\r\n\
         content-type: application/json\r\n\
         content-length: {}\r\n\
         connection: close\r\n\r\n{}",
        status, body.len(), body
      );
      stream.write_all(response.as_bytes()).await.unwrap();
      let _ = stream.shutdown().await;
      request
    });

    (url, handle)
}

/// Accept connections and never answer
pub async fn serve_silent() -> (String, JoinHandle<()>)
{   let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
      let mut held = vec![];
      loop
      {   match listener.accept().await
          {   Ok((stream, _)) => held.push(stream)
            , Err(_) => break
          }
      }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    (url, handle)
}

/// Read one request, then close the connection without answering
pub async fn serve_hangup() -> (String, JoinHandle<RecordedRequest>)
{   let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
      let (mut stream, _) = listener.accept().await.unwrap();
      let request = read_request(&mut stream).await;
      let _ = stream.shutdown().await;
      request
    });

    (url, handle)
}

/// A local url with nothing listening on it
pub fn dead_url() -> String
{   let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn ollama_at(base: &str) -> textassist::BackendProfile
{   let mut profile = textassist::BackendProfile::ollama().with_timeout(5);
    profile.endpoint_url = format!("{}/api/generate", base);
    profile
}

pub fn lmstudio_at(base: &str) -> textassist::BackendProfile
{   let mut profile = textassist::BackendProfile::lmstudio().with_timeout(5);
    profile.endpoint_url = format!("{}/v1/chat/completions", base);
    profile
}

pub fn config_with(profile: textassist::BackendProfile)
  -> textassist::AssistantConfig
{   textassist::AssistantConfig
    {   default_profile: profile.name.clone()
      , profiles: vec![profile]
    }
}
