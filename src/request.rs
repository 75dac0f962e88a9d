//! Request and response types shared by the backend and the session

use serde::{Deserialize, Serialize};

/// Outcome of one inference: the model's full text, or why there is none
pub type InferenceResult = Result<String, crate::error::Error>;

/// A rendered prompt bound to the profile it will be sent to.
/// Built fresh for every generate; it has no identity beyond that call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest
{   /// Finished prompt text
    pub prompt: String
  , /// Profile active when the request was made
    pub profile: crate::config::BackendProfile
}

impl InferenceRequest
{   pub fn new(
      prompt: String
    , profile: crate::config::BackendProfile
    ) -> Self
    {   InferenceRequest
        {   prompt
          , profile
        }
    }

    /// Perform the request once
    pub async fn send(&self) -> InferenceResult
    {   crate::providers::BackendClient::new()
          .infer(&self.profile, &self.prompt)
          .await
    }
}

/// What the user asked for in the dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRequest
{   pub action: crate::prompt::Action
  , pub text: String
  , #[serde(default)]
    pub options: crate::prompt::ActionOptions
}

impl TextRequest
{   pub fn new(
      action: crate::prompt::Action
    , text: impl Into<String>
    , options: crate::prompt::ActionOptions
    ) -> Self
    {   TextRequest
        {   action
          , text: text.into()
          , options
        }
    }

    /// Render the prompt for this request
    pub fn prompt(&self) -> Result<String, crate::error::Error>
    {   crate::prompt::build_prompt(self.action, &self.text, &self.options)
    }
}

/// Configured profiles and which one is active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileListing
{   pub active: String
  , pub profiles: Vec<crate::config::BackendProfile>
}
