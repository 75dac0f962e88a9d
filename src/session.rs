//! Generate/apply flow between a host document and the assistant backend

use std::ops::Range;
use log::{debug, error, info};

use crate::error::Error;
use crate::prompt::{Action, ActionOptions, Placement};

/// Longest selection excerpt shown in the dialog
const SELECTION_PREVIEW_CHARS: usize = 300;

/// Author recorded on inserted comments
pub const COMMENT_AUTHOR: &str = "AI Assistant";

/// What the host editor must provide.
///
/// Hosts should keep the range read by `selected_text` so that the writes
/// still land on it after focus has moved to the dialog.
pub trait DocumentHost
{   /// Current selection as plain text, `None` when nothing is selected
    fn selected_text(&self) -> Option<String>;

    /// Replace the selection with `text`
    fn replace_selection(&mut self, text: &str) -> Result<(), Error>;

    /// Insert `text` right after the selection
    fn append_after_selection(&mut self, text: &str) -> Result<(), Error>;

    /// Attach `text` to the selection as an annotation
    fn insert_comment(&mut self, text: &str) -> Result<(), Error>;
}

/// How an accepted result is written back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode
{   /// Replace the selection, or append after it for ContinueWriting
    #[default]
    Replace
  , /// Insert as a comment and leave the text alone
    Comment
}

/// Summary of the selection shown above the action buttons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSummary
{   pub words: usize
  , pub chars: usize
  , pub preview: String
}

impl SelectionSummary
{   pub fn of(text: &str) -> Self
    {   let mut preview: String = text.chars()
          .take(SELECTION_PREVIEW_CHARS)
          .collect();
        let chars = text.chars().count();
        if chars > SELECTION_PREVIEW_CHARS
        {   preview.push_str("...");
        }
        SelectionSummary
        {   words: text.split_whitespace().count()
          , chars
          , preview
        }
    }

    pub fn is_empty(&self) -> bool
    {   self.words == 0
    }

    pub fn describe(&self) -> String
    {   if self.is_empty()
        {   "No text selected - highlight text in the document".to_string()
        } else
        {   format!(
              "{} words, {} characters selected",
              self.words, self.chars
            )
        }
    }
}

/// One dialog's worth of state: the last result and where it should go
pub struct AssistantSession
{   backend: crate::client::AssistantBackend
  , last_action: Option<Action>
  , preview: String
  , status: String
}

impl AssistantSession
{   pub fn new(backend: crate::client::AssistantBackend) -> Self
    {   AssistantSession
        {   backend
          , last_action: None
          , preview: String::new()
          , status: "Select text in document, then click Generate."
              .to_string()
        }
    }

    pub fn backend(&self) -> &crate::client::AssistantBackend
    {   &self.backend
    }

    /// Release the backend task
    pub async fn close(self) -> Result<(), Error>
    {   self.backend.shutdown().await
    }

    /// Editable result preview
    pub fn preview(&self) -> &str
    {   &self.preview
    }

    /// Replace the preview with the user's edits
    pub fn set_preview(&mut self, text: impl Into<String>)
    {   self.preview = text.into();
    }

    pub fn status(&self) -> &str
    {   &self.status
    }

    pub fn last_action(&self) -> Option<Action>
    {   self.last_action
    }

    /// Re-read the selection and update the status line
    pub fn refresh_selection(
      &mut self
    , host: &impl DocumentHost
    ) -> SelectionSummary
    {   let text = host.selected_text().unwrap_or_default();
        let summary = SelectionSummary::of(&text);
        self.status = if summary.is_empty()
        {   "No text selected.".to_string()
        } else
        {   "Selection updated. Ready to generate.".to_string()
        };
        summary
    }

    /// Run `action` on the host's selection and keep the result as the
    /// preview. Nothing is written to the document.
    pub async fn generate(
      &mut self
    , host: &impl DocumentHost
    , action: Action
    , options: ActionOptions
    ) -> crate::InferenceResult
    {   let text = host.selected_text().unwrap_or_default();
        let summary = SelectionSummary::of(&text);
        if summary.is_empty()
        {   self.status = "No text selected - highlight text first"
              .to_string();
            self.preview.clear();
            return Err(Error::InvalidInput(
              "no text selected".to_string()
            ));
        }

        self.status = format!(
          "{} {} words...",
          action.progress_label(), summary.words
        );
        debug!("{}", self.status);

        let request = crate::TextRequest::new(action, text, options);
        let result = match self.backend.generate(request)
        {   Ok(mut reply_rx) => reply_rx.recv().await
              .unwrap_or_else(|| {
                error!("Backend dropped the request");
                Err(Error::Other("Backend disconnected".to_string()))
              })
          , Err(e) => Err(e)
        };

        match &result
        {   Ok(output) => {
              let words = output.split_whitespace().count();
              self.last_action = Some(action);
              self.preview = output.clone();
              self.status = match action.placement()
              {   Placement::Append => format!(
                    "Done! {} words generated. \
                     Apply will append after your text.",
                    words
                  )
                , Placement::Replace => format!(
                    "Done! {} words generated. Click Apply to use.",
                    words
                  )
              };
            }
          , Err(e) => {
              self.preview.clear();
              self.status = failure_status(e);
            }
        }
        result
    }

    /// Write the preview back into the document
    pub fn apply(
      &mut self
    , host: &mut impl DocumentHost
    , mode: OutputMode
    ) -> Result<(), Error>
    {   if self.preview.trim().is_empty()
        {   self.status = "Nothing to apply - Generate first".to_string();
            return Err(Error::InvalidInput(
              "nothing to apply".to_string()
            ));
        }

        let placement = self.last_action
          .map(|a| a.placement())
          .unwrap_or(Placement::Replace);
        let written = match (mode, placement)
        {   (OutputMode::Comment, _) => host
              .insert_comment(&self.preview)
              .map(|_| "Inserted as comment!")
          , (OutputMode::Replace, Placement::Append) => host
              .append_after_selection(&self.preview)
              .map(|_| "Text appended after selection!")
          , (OutputMode::Replace, Placement::Replace) => host
              .replace_selection(&self.preview)
              .map(|_| "Selection replaced!")
        };

        match written
        {   Ok(status) => {
              info!("{}", status);
              self.status = status.to_string();
              self.preview.clear();
              Ok(())
            }
          , Err(e) => {
              error!("Apply failed: {}", e);
              self.status = format!("Error applying: {}", e);
              Err(e)
            }
        }
    }
}

/// Status line for a failed generate
fn failure_status(err: &Error) -> String
{   match (err, err.hint())
    {   (Error::Timeout { .. }, Some(hint)) => {
          format!("Timed out - {}", hint)
        }
      , (Error::Unreachable { .. }, Some(hint)) => {
          format!("Cannot reach the backend - {}", hint)
        }
      , (_, Some(hint)) => format!("Error: {} ({})", err, hint)
      , (_, None) => format!("Error: {}", err)
    }
}

/// A plain-text document held in memory.
///
/// Comments are kept beside the text as `(range, author, body)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDocument
{   text: String
  , selection: Range<usize>
  , comments: Vec<(Range<usize>, String, String)>
}

impl MemoryDocument
{   /// Document with nothing selected
    pub fn new(text: impl Into<String>) -> Self
    {   MemoryDocument
        {   text: text.into()
          , selection: 0..0
          , comments: vec![]
        }
    }

    /// Document with all of its text selected
    pub fn selecting_all(text: impl Into<String>) -> Self
    {   let mut doc = Self::new(text);
        doc.selection = 0..doc.text.len();
        doc
    }

    /// Select the first occurrence of `needle`
    pub fn select(&mut self, needle: &str) -> Result<(), Error>
    {   let start = self.text.find(needle).ok_or_else(|| {
          Error::Host(format!("{:?} is not in the document", needle))
        })?;
        self.selection = start..start + needle.len();
        Ok(())
    }

    pub fn text(&self) -> &str
    {   &self.text
    }

    pub fn comments(&self) -> &[(Range<usize>, String, String)]
    {   &self.comments
    }
}

impl DocumentHost for MemoryDocument
{   fn selected_text(&self) -> Option<String>
    {   if self.selection.is_empty()
        {   return None;
        }
        self.text.get(self.selection.clone()).map(str::to_string)
    }

    fn replace_selection(&mut self, text: &str) -> Result<(), Error>
    {   if self.selection.is_empty()
        {   return Err(Error::Host("no selection to replace".to_string()));
        }
        let start = self.selection.start;
        self.text.replace_range(self.selection.clone(), text);
        self.selection = start..start + text.len();
        Ok(())
    }

    fn append_after_selection(&mut self, text: &str) -> Result<(), Error>
    {   let at = self.selection.end;
        let insert = format!(" {}", text);
        self.text.insert_str(at, &insert);
        self.selection = at..at + insert.len();
        Ok(())
    }

    fn insert_comment(&mut self, text: &str) -> Result<(), Error>
    {   if self.selection.is_empty()
        {   return Err(Error::Host("no selection to comment on".to_string()));
        }
        self.comments.push((
          self.selection.clone()
        , COMMENT_AUTHOR.to_string()
        , text.to_string()
        ));
        Ok(())
    }
}
