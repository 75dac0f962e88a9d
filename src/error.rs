use std::fmt;

/// Error type for textassist operations
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Empty selection or a missing required option
    InvalidInput(String)
  , /// Backend server could not be reached
    Unreachable
    {   endpoint: String
      , detail: String
    }
  , /// No response within the profile timeout
    Timeout
    {   seconds: u64
    }
  , /// Response body does not match the configured request shape
    MalformedResponse(String)
  , /// Backend answered with a non-success status
    ServerError
    {   status: u16
      , message: String
    }
  , /// Profile or configuration file is unusable
    InvalidConfiguration(String)
  , /// No backend profile with this name
    UnknownProfile(String)
  , /// Host document refused a read or write
    Host(String)
  , /// Generic error
    Other(String)
}

impl Error
{   /// Short remediation hint for the status line, if there is one.
    pub fn hint(&self) -> Option<&'static str>
    {   match self
        {   Error::Unreachable { .. } => {
              Some("start the backend server and check its address")
            }
          , Error::Timeout { .. } => {
              Some("try a shorter selection or raise the timeout")
            }
          , Error::MalformedResponse(_) => {
              Some("check that the profile's request shape matches the server")
            }
          , Error::InvalidInput(_) => {
              Some("highlight some text and fill in the required fields")
            }
          , _ => None
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::InvalidInput(msg) => {
              write!(f, "Invalid input: {}", msg)
            }
          , Error::Unreachable { endpoint, detail } => {
              write!(f,
                "Cannot reach backend at {} ({}); is the server running?",
                endpoint, detail
              )
            }
          , Error::Timeout { seconds } => {
              write!(f,
                "Backend did not answer within {} seconds",
                seconds
              )
            }
          , Error::MalformedResponse(msg) => {
              write!(f, "Unexpected response from backend: {}", msg)
            }
          , Error::ServerError { status, message } => {
              write!(f, "Backend returned {}: {}", status, message)
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::UnknownProfile(name) => {
              write!(f, "Unknown backend profile: {}", name)
            }
          , Error::Host(msg) => {
              write!(f, "Document error: {}", msg)
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}
