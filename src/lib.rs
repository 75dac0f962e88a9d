pub mod error;
pub mod config;
pub mod prompt;
pub mod providers;
pub mod request;
pub mod client;
pub mod session;

pub use client::AssistantBackend;
pub use config::{AssistantConfig, BackendProfile, RequestShape};
pub use error::Error;
pub use prompt::{build_prompt, Action, ActionOptions, Placement, Tone};
pub use providers::BackendClient;
pub use request::{InferenceRequest, InferenceResult, ProfileListing, TextRequest};
pub use session::{AssistantSession, DocumentHost, MemoryDocument, OutputMode};

/*

textassist applies AI text actions (rewrite, summarize, translate, ...)
to a passage selected in a document, using a model served locally by
Ollama or an OpenAI-compatible server such as LM Studio.

textassist/
├── src/
│   ├── lib.rs          # Channel interface and re-exports
│   ├── error.rs        # Error kinds and remediation hints
│   ├── config.rs       # Backend profiles
│   ├── prompt.rs       # Action templates
│   ├── providers/      # One module per wire shape
│   │   ├── mod.rs      # BackendClient::infer
│   │   ├── completion.rs
│   │   └── chat.rs
│   ├── request.rs      # Request/result types
│   ├── client.rs       # AssistantBackend task
│   ├── session.rs      # Generate/apply flow against a DocumentHost
│   └── main.rs         # Command-line host
└── tests/

*/

/// TEXTASSIST API INTERFACE:

// ===== Generate =====

pub type GenerateReply = InferenceResult;
pub type GenerateReplySender
  = tokio::sync::mpsc::UnboundedSender<GenerateReply>;

pub struct GenerateArgs
{   pub request: TextRequest
  , pub reply: GenerateReplySender
}

// ===== SetActiveProfile =====

pub type SetActiveProfileReply = Result<(), crate::error::Error>;
pub type SetActiveProfileReplySender
  = tokio::sync::mpsc::UnboundedSender<SetActiveProfileReply>;

pub struct SetActiveProfileArgs
{   pub name: String
  , pub reply: SetActiveProfileReplySender
}

// ===== GetProfiles =====

pub type GetProfilesReply
  = Result<ProfileListing, crate::error::Error>;
pub type GetProfilesReplySender
  = tokio::sync::mpsc::UnboundedSender<GetProfilesReply>;

pub struct GetProfilesArgs
{   pub reply: GetProfilesReplySender
}

// ===== KillProcess =====

pub type KillProcessReply = Result<(), crate::error::Error>;
pub type KillProcessReplySender
  = tokio::sync::mpsc::UnboundedSender<KillProcessReply>;

pub struct KillProcessArgs
{   pub reply: KillProcessReplySender
}

// ===== AssistantHand (sender side) =====

pub struct AssistantHand
{   pub generate_tx
      : tokio::sync::mpsc::UnboundedSender<GenerateArgs>
  , pub set_active_profile_tx
      : tokio::sync::mpsc::UnboundedSender<SetActiveProfileArgs>
  , pub get_profiles_tx
      : tokio::sync::mpsc::UnboundedSender<GetProfilesArgs>
  , pub kill_process_tx
      : tokio::sync::mpsc::UnboundedSender<KillProcessArgs>
}

// ===== AssistantFoot (receiver side) =====

pub struct AssistantFoot
{   pub generate_rx
      : tokio::sync::mpsc::UnboundedReceiver<GenerateArgs>
  , pub set_active_profile_rx
      : tokio::sync::mpsc::UnboundedReceiver<SetActiveProfileArgs>
  , pub get_profiles_rx
      : tokio::sync::mpsc::UnboundedReceiver<GetProfilesArgs>
  , pub kill_process_rx
      : tokio::sync::mpsc::UnboundedReceiver<KillProcessArgs>
}
