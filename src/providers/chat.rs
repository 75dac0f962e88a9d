//! Chat completion shape (OpenAI-compatible, e.g. LM Studio)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage
{   #[serde(default)]
    pub role: String
  , #[serde(default)]
    pub content: Option<String>
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub stream: bool
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse
{   pub choices: Vec<Choice>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ChatMessage
  , #[serde(default)]
    pub finish_reason: Option<String>
}

pub fn request_body(
  profile: &crate::config::BackendProfile
, prompt: &str
) -> ChatRequest
{   ChatRequest
    {   model: profile.model.clone()
      , messages: vec![
          ChatMessage
          {   role: "user".to_string()
            , content: Some(prompt.to_string())
          }
        ]
      , stream: false
      , temperature: profile.temperature
    }
}

/// Pull the first choice's message out of a 2xx body
pub fn extract_text(body: &str)
  -> Result<String, crate::error::Error>
{   let parsed: ChatResponse = serde_json::from_str(body)
      .map_err(|e| {
        crate::error::Error::MalformedResponse(format!(
          "chat completion body: {}", e
        ))
      })?;

    let choice = parsed.choices.into_iter().next()
      .ok_or_else(|| {
        crate::error::Error::MalformedResponse(
          "chat completion has no choices".to_string()
        )
      })?;

    match choice.message.content
    {   Some(text) if !text.trim().is_empty() => Ok(text)
      , _ => Err(crate::error::Error::MalformedResponse(
          "chat completion returned empty content".to_string()
        ))
    }
}
