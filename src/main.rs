use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, error};

use textassist::{
  Action, ActionOptions, AssistantBackend, AssistantConfig, AssistantSession,
  Error, MemoryDocument, OutputMode, Tone,
};

/// Apply an AI text action to a passage using a local model server.
///
/// The passage is read from FILE, or from stdin when no file is given.
#[derive(Debug, Parser)]
#[command(name = "textassist", version)]
struct Args
{   /// rewrite, summarize, grammar, translate, continue, simplify or custom
    #[arg(short, long, default_value = "rewrite")]
    action: Action

  , /// Tone for rewrite: formal, concise or academic
    #[arg(short, long)]
    tone: Option<Tone>

  , /// Target language for translate
    #[arg(short, long)]
    language: Option<String>

  , /// Extra directive, or the whole prompt for custom
    #[arg(short, long)]
    instruction: Option<String>

  , /// Backend profile name (defaults to the configured default)
    #[arg(short, long)]
    backend: Option<String>

  , /// Override the profile's timeout, in seconds
    #[arg(long)]
    timeout: Option<u64>

  , /// JSON file with backend profiles
    #[arg(short, long)]
    config: Option<PathBuf>

  , /// Print the rendered prompt and exit without contacting a backend
    #[arg(long)]
    print_prompt: bool

  , /// Print the whole passage with the result applied instead of the
    /// result alone (continue appends, other actions replace)
    #[arg(long)]
    apply: bool

  , /// Passage to transform
    file: Option<PathBuf>
}

impl Args
{   fn options(&self) -> ActionOptions
    {   ActionOptions
        {   tone: self.tone
          , target_language: self.language.clone()
          , instruction: self.instruction.clone()
        }
    }

    fn read_passage(&self) -> Result<String, Error>
    {   match &self.file
        {   Some(path) => std::fs::read_to_string(path).map_err(|e| {
              Error::InvalidInput(format!("{}: {}", path.display(), e))
            })
          , None => {
              let mut text = String::new();
              std::io::stdin().read_to_string(&mut text).map_err(|e| {
                Error::InvalidInput(format!("stdin: {}", e))
              })?;
              Ok(text)
            }
        }
    }

    fn load_config(&self) -> Result<AssistantConfig, Error>
    {   let mut config = match &self.config
        {   Some(path) => AssistantConfig::from_file(path)?
          , None => AssistantConfig::default()
        };
        if let Some(name) = &self.backend
        {   config.profile(name)?;
            config.default_profile = name.clone();
        }
        if let Some(seconds) = self.timeout
        {   let active = config.default_profile.clone();
            for profile in config.profiles.iter_mut()
              .filter(|p| p.name == active)
            {   profile.timeout_secs = seconds;
            }
        }
        config.validate()?;
        Ok(config)
    }
}

/// The failure came from a missing language or custom prompt
fn needs_instruction(action: Action, error: &Error) -> bool
{   matches!(error, Error::InvalidInput(_))
      && matches!(action, Action::Translate | Action::CustomPrompt)
}

async fn run(args: Args) -> Result<String, Error>
{   let passage = args.read_passage()?;
    let options = args.options();

    if args.print_prompt
    {   return textassist::build_prompt(args.action, &passage, &options);
    }

    let config = args.load_config()?;
    debug!("Using profile {}", config.default_profile);

    let mut session = AssistantSession::new(AssistantBackend::new(config)?);
    let mut document = MemoryDocument::selecting_all(passage);

    let generated = session.generate(&document, args.action, options).await;
    let output = match generated
    {   Ok(_) if args.apply => {
          session.apply(&mut document, OutputMode::Replace)?;
          Ok(document.text().to_string())
        }
      , Ok(text) => Ok(text)
      , Err(e) => {
          eprintln!("{}", session.status());
          Err(e)
        }
    };

    if let Err(e) = session.close().await
    {   error!("Backend shutdown failed: {}", e);
    }
    output
}

#[tokio::main]
async fn main() -> ExitCode
{   env_logger::init();
    let args = Args::parse();
    let action = args.action;

    match run(args).await
    {   Ok(text) => {
          println!("{}", text);
          ExitCode::SUCCESS
        }
      , Err(e) => {
          error!("{}", e);
          eprintln!("textassist: {}", e);
          if needs_instruction(action, &e)
          {   eprintln!("--instruction: {}", action.instruction_hint());
          }
          ExitCode::FAILURE
        }
    }
}
