//! Backend profiles and assistant configuration

use std::collections::HashSet;
use std::path::Path;
use serde::{Deserialize, Serialize};
use log::debug;

/// Profile used when nothing else is selected
pub const DEFAULT_PROFILE: &str = "ollama";

/// Request timeout applied when a profile does not set one
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

fn default_timeout_secs() -> u64
{   DEFAULT_TIMEOUT_SECS
}

fn default_profile_name() -> String
{   DEFAULT_PROFILE.to_string()
}

/// Request/response layout spoken by an inference server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RequestShape
{   /// `{model, prompt}` in, `{response}` out (Ollama /api/generate)
    LegacyCompletion
  , /// `{model, messages}` in, `{choices[0].message.content}` out
    ChatCompletion
}

/// One locally hosted inference server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendProfile
{   /// Name used to select the profile
    pub name: String
  , /// Human-readable label
    #[serde(default)]
    pub label: String
  , /// Full URL the request is POSTed to
    pub endpoint_url: String
  , /// Model identifier sent with every request
    pub model: String
  , /// Wire shape of the server
    pub request_shape: RequestShape
  , /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64
  , /// Sampling temperature, chat-completion only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>
}

impl BackendProfile
{   /// Built-in profile for a local Ollama server
    pub fn ollama() -> Self
    {   BackendProfile
        {   name: "ollama".to_string()
          , label: "Ollama".to_string()
          , endpoint_url: "http://localhost:11434/api/generate".to_string()
          , model: "llama3.2".to_string()
          , request_shape: RequestShape::LegacyCompletion
          , timeout_secs: DEFAULT_TIMEOUT_SECS
          , temperature: None
        }
    }

    /// Built-in profile for LM Studio's OpenAI-compatible server
    pub fn lmstudio() -> Self
    {   BackendProfile
        {   name: "lmstudio".to_string()
          , label: "LM Studio".to_string()
          , endpoint_url:
              "http://127.0.0.1:1234/v1/chat/completions".to_string()
          , model: "default".to_string()
          , request_shape: RequestShape::ChatCompletion
          , timeout_secs: DEFAULT_TIMEOUT_SECS
          , temperature: Some(0.7)
        }
    }

    /// Same profile with a different timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self
    {   self.timeout_secs = timeout_secs;
        self
    }

    /// Check that the profile can be used for a request
    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   let url = reqwest::Url::parse(&self.endpoint_url)
          .map_err(|e| {
            crate::error::Error::InvalidConfiguration(format!(
              "profile {}: bad endpoint url {:?}: {}",
              self.name, self.endpoint_url, e
            ))
          })?;
        if url.scheme() != "http" && url.scheme() != "https"
        {   return Err(crate::error::Error::InvalidConfiguration(
              format!(
                "profile {}: endpoint must be http or https",
                self.name
              )
            ));
        }
        if self.model.trim().is_empty()
        {   return Err(crate::error::Error::InvalidConfiguration(
              format!("profile {}: model is empty", self.name)
            ));
        }
        if self.timeout_secs == 0
        {   return Err(crate::error::Error::InvalidConfiguration(
              format!("profile {}: timeout must be positive", self.name)
            ));
        }
        Ok(())
    }
}

/// Assistant configuration: the named profiles and which one is default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig
{   /// Profile selected at startup
    #[serde(default = "default_profile_name")]
    pub default_profile: String
  , /// All configured profiles
    pub profiles: Vec<BackendProfile>
}

impl Default for AssistantConfig
{   fn default() -> Self
    {   AssistantConfig
        {   default_profile: default_profile_name()
          , profiles: vec![
              BackendProfile::ollama()
            , BackendProfile::lmstudio()
            ]
        }
    }
}

impl AssistantConfig
{   /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str)
      -> Result<Self, crate::error::Error>
    {   let config: AssistantConfig = serde_json::from_str(json)
          .map_err(|e| {
            crate::error::Error::InvalidConfiguration(e.to_string())
          })?;
        config.validate()?;
        debug!(
          "Loaded configuration with {} profiles",
          config.profiles.len()
        );
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>)
      -> Result<Self, crate::error::Error>
    {   let path = path.as_ref();
        debug!("Reading configuration from {}", path.display());
        let json = std::fs::read_to_string(path).map_err(|e| {
          crate::error::Error::InvalidConfiguration(format!(
            "{}: {}", path.display(), e
          ))
        })?;
        Self::from_json_str(&json)
    }

    /// Check profile names are unique, valid, and the default exists
    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   let mut seen = HashSet::new();
        for profile in &self.profiles
        {   if !seen.insert(profile.name.as_str())
            {   return Err(crate::error::Error::InvalidConfiguration(
                  format!("duplicate profile name: {}", profile.name)
                ));
            }
            profile.validate()?;
        }
        if !seen.contains(self.default_profile.as_str())
        {   return Err(crate::error::Error::InvalidConfiguration(
              format!(
                "default profile {} is not configured",
                self.default_profile
              )
            ));
        }
        Ok(())
    }

    /// Look up a profile by name
    pub fn profile(&self, name: &str)
      -> Result<&BackendProfile, crate::error::Error>
    {   self.profiles.iter()
          .find(|p| p.name == name)
          .ok_or_else(|| {
            crate::error::Error::UnknownProfile(name.to_string())
          })
    }

    /// The configured default profile
    pub fn default_backend(&self)
      -> Result<&BackendProfile, crate::error::Error>
    {   self.profile(&self.default_profile)
    }

    /// Names of all profiles, in configuration order
    pub fn profile_names(&self) -> Vec<String>
    {   self.profiles.iter().map(|p| p.name.clone()).collect()
    }
}
