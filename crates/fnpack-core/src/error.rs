use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid function '{name}': {reason}")]
    InvalidFunction { name: String, reason: &'static str },

    // ── Language templates ──
    #[error("failed to read language template at {path}")]
    TemplateLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error reading language template at {path}")]
    TemplateParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("handler_folder {folder:?} in {path} must be a single folder name")]
    InvalidHandlerFolder { path: PathBuf, folder: String },

    #[error("build option '{name}' is declared more than once in {path}")]
    DuplicateBuildOption { path: PathBuf, name: String },

    #[error("unknown tag format '{0}' — expected one of: latest, sha, branch, describe")]
    UnknownTagFormat(String),
}
