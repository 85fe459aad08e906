#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("SOURCE must be a digits-only modpack id or a CurseForge modpack URL, got '{0}'")]
    InvalidSource(String),

    #[error("Choose only one of --use-saved or --use-arg")]
    ConflictingFlags,

    #[error("This folder is configured for packId={saved} but you provided {arg}. Re-run with --use-saved or --use-arg (or drop --no-prompt)")]
    AmbiguousSource { saved: i32, arg: i32 },

    #[error("Invalid choice '{0}', expected 's' or 'a'")]
    InvalidChoice(String),

    #[error("No SOURCE provided and no saved packId found in .mcserver/state.json")]
    NoSourceAvailable,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    NoServerPack(String),

    #[error("File id {file_id} not found for pack {pack_id}")]
    FileNotFound { pack_id: i32, file_id: i32 },

    #[error("Could not resolve download URL for file {file_id} of pack {pack_id}")]
    ResolutionFailed { pack_id: i32, file_id: i32 },

    #[error("CurseForge API returned 403 Forbidden (API key invalid). Update it with: mcserver config set-api-key")]
    InvalidCredential,

    #[error("CurseForge API request failed: {0}")]
    TransportError(String),

    #[error("Missing CurseForge API key. Run: mcserver config set-api-key")]
    MissingCredential,

    #[error("{0}")]
    Other(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Error while parsing json, {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("{0}")]
    Dialoguer(#[from] dialoguer::Error),

    #[error("Error walking directory, {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Error stripping directory prefix {0}")]
    Prefix(#[from] std::path::StripPrefixError),

    #[error("{0}")]
    Template(#[from] indicatif::style::TemplateError),

    #[error("{0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl Error {
    // user facing errors get a plain message and exit code 2,
    // everything else is unexpected and exits with 1
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Error::Io(_)
                | Error::Reqwest(_)
                | Error::Json(_)
                | Error::Zip(_)
                | Error::Dialoguer(_)
                | Error::WalkDir(_)
                | Error::Prefix(_)
                | Error::Template(_)
                | Error::JoinError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn ambiguous_source_names_both_ids() {
        let msg = Error::AmbiguousSource { saved: 111, arg: 222 }.to_string();
        assert!(msg.contains("111"));
        assert!(msg.contains("222"));
    }

    #[test]
    fn io_errors_are_not_user_facing() {
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"));
        assert!(!err.is_user_facing());
        assert!(Error::NoSourceAvailable.is_user_facing());
        assert!(Error::InvalidCredential.is_user_facing());
    }
}
