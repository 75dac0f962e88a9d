//! Inference backends, one module per wire shape

pub mod chat;
pub mod completion;

use std::time::Duration;
use log::{debug, trace, error};

use crate::config::{BackendProfile, RequestShape};
use crate::error::Error;

/// Longest server message kept in a `ServerError`
const MAX_ERROR_CHARS: usize = 200;

/// Sends one prompt to one backend profile.
///
/// Holds no state: every call builds its own HTTP client with the profile's
/// timeout and drops it when the call returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendClient;

impl BackendClient
{   pub fn new() -> Self
    {   BackendClient
    }

    /// Run one inference and return the model's full text output
    pub async fn infer(
      &self
    , profile: &BackendProfile
    , prompt: &str
    ) -> crate::InferenceResult
    {   if prompt.trim().is_empty()
        {   return Err(Error::InvalidInput(
              "prompt is empty".to_string()
            ));
        }
        profile.validate()?;

        debug!(
          "Sending {} chars to {} ({:?}, model {})",
          prompt.len(), profile.name, profile.request_shape, profile.model
        );

        let http_client = reqwest::Client::builder()
          .timeout(Duration::from_secs(profile.timeout_secs))
          .pool_max_idle_per_host(0)
          .build()
          .map_err(|e| {
            error!("Failed to build HTTP client: {}", e);
            Error::InvalidConfiguration(e.to_string())
          })?;

        let request = http_client
          .post(&profile.endpoint_url)
          .header("Content-Type", "application/json");
        let request = match profile.request_shape
        {   RequestShape::LegacyCompletion => {
              let body = completion::request_body(profile, prompt);
              trace!("Legacy completion request: {:?}", body);
              request.json(&body)
            }
          , RequestShape::ChatCompletion => {
              let body = chat::request_body(profile, prompt);
              trace!("Chat completion request: {:?}", body);
              request.json(&body)
            }
        };

        let response = request
          .send()
          .await
          .map_err(|e| classify(e, profile))?;

        let status = response.status();
        trace!("{} response status: {}", profile.name, status);

        let body = response
          .text()
          .await
          .map_err(|e| classify(e, profile))?;
        trace!("{} response body: {}", profile.name, body);

        if !status.is_success()
        {   let message = server_message(&body)
              .unwrap_or_else(|| {
                status.canonical_reason()
                  .unwrap_or("Unknown error")
                  .to_string()
              });
            error!("{} returned {}: {}", profile.name, status, message);
            return Err(Error::ServerError
            {   status: status.as_u16()
              , message
            });
        }

        let text = match profile.request_shape
        {   RequestShape::LegacyCompletion => {
              completion::extract_text(status.as_u16(), &body)
            }
          , RequestShape::ChatCompletion => chat::extract_text(&body)
        };
        match &text
        {   Ok(text) => debug!(
              "{} generated {} chars", profile.name, text.len()
            )
          , Err(e) => error!("{}: {}", profile.name, e)
        }
        text
    }

    /// Same as [`BackendClient::infer`], for callers without a runtime.
    ///
    /// Drives the call on a private current-thread runtime. Inside an async
    /// context it returns `Error::Other` instead; use `infer` there.
    pub fn infer_blocking(
      &self
    , profile: &BackendProfile
    , prompt: &str
    ) -> crate::InferenceResult
    {   if tokio::runtime::Handle::try_current().is_ok()
        {   error!("infer_blocking called inside an async runtime");
            return Err(Error::Other(
              "infer_blocking called inside an async runtime".to_string()
            ));
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
          .enable_all()
          .build()
          .map_err(|e| {
            error!("Failed to start runtime: {}", e);
            Error::Other(e.to_string())
          })?;
        runtime.block_on(self.infer(profile, prompt))
    }
}

/// Map a transport failure onto the error kinds callers act on
fn classify(err: reqwest::Error, profile: &BackendProfile) -> Error
{   let detail = error_chain(&err);
    if err.is_timeout()
    {   error!(
          "{} timed out after {}s: {}",
          profile.name, profile.timeout_secs, detail
        );
        Error::Timeout
        {   seconds: profile.timeout_secs
        }
    } else if err.is_connect()
    {   error!("{} unreachable: {}", profile.name, detail);
        Error::Unreachable
        {   endpoint: profile.endpoint_url.clone()
          , detail
        }
    } else if err.is_request()
    {   // Connected, but the server hung up before answering
        error!("{} dropped the request: {}", profile.name, detail);
        Error::MalformedResponse(format!(
          "connection closed before a response: {}", detail
        ))
    } else if err.is_body() || err.is_decode()
    {   error!("{} sent an unreadable body: {}", profile.name, detail);
        Error::MalformedResponse(detail)
    } else if err.is_builder()
    {   Error::InvalidConfiguration(detail)
    } else
    {   error!("{} request failed: {}", profile.name, detail);
        Error::Other(detail)
    }
}

/// The error and its sources, innermost cause last
fn error_chain(err: &dyn std::error::Error) -> String
{   let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source
    {   parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

/// Best-effort message from an error body
fn server_message(body: &str) -> Option<String>
{   let body = body.trim();
    if body.is_empty()
    {   return None;
    }

    let from_json = serde_json::from_str::<serde_json::Value>(body)
      .ok()
      .and_then(|value| {
        let error = value.get("error")?;
        match error
        {   serde_json::Value::String(message) => Some(message.clone())
          , other => other.get("message")
              .and_then(|m| m.as_str())
              .map(str::to_string)
        }
      });

    let message = from_json.unwrap_or_else(|| body.to_string());
    Some(truncate(&message, MAX_ERROR_CHARS))
}

fn truncate(text: &str, max_chars: usize) -> String
{   match text.char_indices().nth(max_chars)
    {   Some((end, _)) => format!("{}...", &text[..end])
      , None => text.to_string()
    }
}
