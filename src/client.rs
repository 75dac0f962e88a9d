use tokio::sync::mpsc;
use log::{debug, trace, error, info};
use crate::AssistantFoot;

/// Backend state owned by the assistant task
pub struct AssistantBackendState
{   pub config: crate::config::AssistantConfig
  , pub active_profile: String
  , pub client: crate::providers::BackendClient
}

impl AssistantBackendState
{   /// Start on the configuration's default profile
    pub fn new(
      config: crate::config::AssistantConfig
    ) -> Self
    {   debug!("Initializing AssistantBackendState");
        let active_profile = config.default_profile.clone();
        AssistantBackendState
        {   config
          , active_profile
          , client: crate::providers::BackendClient::new()
        }
    }

    async fn handle_generate(
      &self
    , request: crate::TextRequest
    ) -> crate::InferenceResult
    {   let prompt = request.prompt()?;
        let profile = self.config.profile(&self.active_profile)?;
        self.client.infer(profile, &prompt).await
    }

    fn handle_set_active_profile(
      &mut self
    , name: String
    ) -> Result<(), crate::error::Error>
    {   self.config.profile(&name)?;
        info!("Active profile: {}", name);
        self.active_profile = name;
        Ok(())
    }

    fn listing(&self) -> crate::ProfileListing
    {   crate::ProfileListing
        {   active: self.active_profile.clone()
          , profiles: self.config.profiles.clone()
        }
    }
}

/// Public API for the assistant backend - owns the task
pub struct AssistantBackend
{   hand: crate::AssistantHand
  , _task_handle: tokio::task::JoinHandle<()>
}

impl AssistantBackend
{   /// Create and spawn a new assistant backend.
    /// Returns immediately - spawns background task, so it must be called
    /// from within a tokio runtime.
    pub fn new(
      config: crate::config::AssistantConfig
    ) -> Result<Self, crate::error::Error>
    {   config.validate()?;
        debug!("Creating AssistantBackend with task ownership");

        let (generate_tx, generate_rx)
          = mpsc::unbounded_channel();
        let (set_active_profile_tx, set_active_profile_rx)
          = mpsc::unbounded_channel();
        let (get_profiles_tx, get_profiles_rx)
          = mpsc::unbounded_channel();
        let (kill_process_tx, kill_process_rx)
          = mpsc::unbounded_channel();

        let hand = crate::AssistantHand
        {   generate_tx
          , set_active_profile_tx
          , get_profiles_tx
          , kill_process_tx
        };

        let foot = crate::AssistantFoot
        {   generate_rx
          , set_active_profile_rx
          , get_profiles_rx
          , kill_process_rx
        };

        let _task_handle = tokio::spawn(async move {
          run_backend_loop(foot, config).await
        });

        Ok(AssistantBackend
        {   hand
          , _task_handle
        })
    }

    /// Queue a generate request - returns immediately.
    /// Dropping the receiver abandons the request; its result is discarded.
    pub fn generate(
      &self
    , request: crate::TextRequest
    ) -> Result<
        mpsc::UnboundedReceiver<crate::GenerateReply>,
        crate::error::Error
      >
    {   debug!("generate queuing {} request", request.action);
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::GenerateArgs
        {   request
          , reply: reply_tx
        };

        self.hand.generate_tx
          .send(cmd)
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Select the profile used by later requests - returns immediately
    pub fn set_active_profile(
      &self
    , name: impl Into<String>
    ) -> Result<
        mpsc::UnboundedReceiver<crate::SetActiveProfileReply>,
        crate::error::Error
      >
    {   let name = name.into();
        debug!("set_active_profile queuing {}", name);
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::SetActiveProfileArgs
        {   name
          , reply: reply_tx
        };

        self.hand.set_active_profile_tx
          .send(cmd)
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// List profiles - returns immediately
    pub fn get_profiles(
      &self
    ) -> Result<
        mpsc::UnboundedReceiver<crate::GetProfilesReply>,
        crate::error::Error
      >
    {   debug!("get_profiles queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::GetProfilesArgs
        {   reply: reply_tx
        };

        self.hand.get_profiles_tx
          .send(cmd)
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Gracefully shutdown the backend
    pub async fn shutdown(self)
      -> Result<(), crate::error::Error>
    {   debug!("Shutting down AssistantBackend");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::KillProcessArgs
        {   reply: reply_tx
        };

        self.hand.kill_process_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel already closed");
            crate::error::Error::Other(
              "Backend already shutdown".to_string()
            )
          })?;

        // Wait for shutdown confirmation
        if let Some(result) = reply_rx.recv().await
        {   debug!("Backend shutdown confirmed");
            result
        } else
        {   error!("Backend exited without confirming shutdown");
            Err(disconnected())
        }
    }
}

fn disconnected() -> crate::error::Error
{   error!("Backend channel closed");
    crate::error::Error::Other(
      "Backend disconnected".to_string()
    )
}

/// Main backend event loop
///
/// Commands are handled one at a time in arrival order, so a generate
/// runs to completion before the next command is looked at and at most
/// one inference is ever in flight.
async fn run_backend_loop(
  foot: crate::AssistantFoot
, config: crate::config::AssistantConfig
)
{   debug!("Starting AssistantBackend event loop");
    let mut state = AssistantBackendState::new(config);
    let AssistantFoot
    {   mut generate_rx
      , mut set_active_profile_rx
      , mut get_profiles_rx
      , mut kill_process_rx
    } = foot;

    loop
    { tokio::select!
      { Some(cmd) = generate_rx.recv() => {
          debug!(
            "Received Generate ({}) for profile: {}",
            cmd.request.action, state.active_profile
          );
          let result = state.handle_generate(cmd.request).await;
          if cmd.reply.send(result).is_err()
          {   trace!("Caller abandoned generate; result dropped");
          }
        }
      , Some(cmd) = set_active_profile_rx.recv() => {
          debug!("Received SetActiveProfile: {}", cmd.name);
          let result = state.handle_set_active_profile(cmd.name);
          let _ = cmd.reply.send(result);
        }
      , Some(cmd) = get_profiles_rx.recv() => {
          debug!("Received GetProfiles");
          let _ = cmd.reply.send(Ok(state.listing()));
        }
      , Some(cmd) = kill_process_rx.recv() => {
          debug!("Received KillProcess");
          let _ = cmd.reply.send(Ok(()));
          info!("AssistantBackend shutting down");
          break;
        }
      , else => {
          debug!("All command channels closed");
          break;
        }
      }
    }
}
