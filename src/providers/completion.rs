//! Legacy completion shape (Ollama `/api/generate`)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a>
{   pub model: &'a str
  , pub prompt: &'a str
  , pub stream: bool
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse
{   #[serde(default)]
    pub response: Option<String>
  , #[serde(default)]
    pub error: Option<String>
  , #[serde(default)]
    pub done: Option<bool>
}

pub fn request_body<'a>(
  profile: &'a crate::config::BackendProfile
, prompt: &'a str
) -> CompletionRequest<'a>
{   CompletionRequest
    {   model: &profile.model
      , prompt
      , stream: false
    }
}

/// Pull the generated text out of a 2xx body
pub fn extract_text(
  status: u16
, body: &str
) -> Result<String, crate::error::Error>
{   let parsed: CompletionResponse = serde_json::from_str(body)
      .map_err(|e| {
        crate::error::Error::MalformedResponse(format!(
          "legacy completion body: {}", e
        ))
      })?;

    // Ollama reports model errors in the body
    if let Some(message) = parsed.error
    {   return Err(crate::error::Error::ServerError
        {   status
          , message
        });
    }

    match parsed.response
    {   Some(text) if !text.trim().is_empty() => Ok(text)
      , Some(_) => Err(crate::error::Error::MalformedResponse(
          "legacy completion returned empty text".to_string()
        ))
      , None => Err(crate::error::Error::MalformedResponse(
          "legacy completion body has no `response` field".to_string()
        ))
    }
}
