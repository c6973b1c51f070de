// ai
//! 💀 errors.rs: the four horsemen of "the list is empty and nobody knows why".
//!
//! Everything else in cdx rides on `anyhow`. This is the one place with typed
//! errors, because the presentation layer genuinely needs to tell a 401 apart
//! from a malformed CSV. One gets "check your API key", the other gets
//! "check your commas". Mixing those up is how support tickets are born.
//!
//! 🧠 Knowledge graph:
//! - Raised by: `sources::*` adapters and `sources::transport`
//! - Caught by: `pipeline` at the attempt boundary, turned into a message on `Failed`
//! - Past the pipeline only `AttemptFailed` travels, the message plus an auth flag. 🦆

use std::path::PathBuf;

use thiserror::Error;

/// 🏷️ Everything a source adapter can trip over, sorted by who to blame.
#[derive(Debug, Error)]
pub enum SourceError {
    /// 🔒 The server looked at our headers and said no (HTTP 401/403).
    #[error(
        "🔒 Authentication failed for the {source_title} source (HTTP {status}). {}",
        auth_hint(.source_title)
    )]
    Authentication { status: u16, source_title: String },

    /// 🗝️ The configured data key walked into the response body and found nothing.
    #[error("🗝️ Data key '{key}' doesn't exist on the response body")]
    DataKeyNotFound { key: String },

    /// 🧾 The body came back, but it was not the shape we were promised.
    #[error("🧾 Failed to parse {format}: {code} {message}")]
    Parse {
        format: String,
        code: String,
        message: String,
    },

    /// 🤷 A source/file-type combination we don't speak.
    #[error("🤷 Unknown data source or file type: {source_title} / {file_type}")]
    UnsupportedSource {
        source_title: String,
        file_type: String,
    },

    /// 📡 The request never made it, or the response never made it back.
    #[error("📡 Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// 📂 A local file that refused to be read.
    #[error("📂 Could not read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, SourceError::Authentication { .. })
    }

    /// 🏗️ Shorthand for the many "the JSON was not an array" moments in life.
    pub(crate) fn parse(
        format: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        SourceError::Parse {
            format: format.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// 🚧 A pipeline attempt that ended in `Failed`, as handed back by [`crate::run`].
///
/// Carries the user-facing message plus the one bit the CLI needs to decide on a
/// credentials hint, so nobody has to sniff error strings.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AttemptFailed {
    pub message: String,
    pub auth_failed: bool,
}

fn auth_hint(source_title: &str) -> &'static str {
    // -- 🔧 each source hides its keys in a different drawer
    match source_title {
        "External table" => {
            "Make sure the URL carries a valid API key, or set an Authorization header with a personal access token."
        }
        "API" => "Check the Authorization header and any custom headers your API expects.",
        _ => "The file host requires credentials. Check the URL and your headers.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_auth_errors_do_not_look_like_everybody_else() {
        let auth = SourceError::Authentication {
            status: 401,
            source_title: "API".into(),
        };
        let parse = SourceError::parse("csv", "UnequalLengths", "row 3 has 2 fields");

        assert!(auth.is_authentication());
        assert!(!parse.is_authentication());
        assert!(auth.to_string().contains("Authentication failed"));
        assert!(auth.to_string().contains("401"));
        assert_eq!(
            parse.to_string(),
            "🧾 Failed to parse csv: UnequalLengths row 3 has 2 fields"
        );
    }
}
