use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory, relative to the project, that holds one folder per language.
pub const TEMPLATE_DIR: &str = "template";

/// Descriptor file inside each language template folder.
pub const TEMPLATE_DESCRIPTOR: &str = "template.yml";

/// Handler folder used when the descriptor leaves `handler_folder` empty.
pub const DEFAULT_HANDLER_FOLDER: &str = "function";

/// Language name that switches to custom-Dockerfile mode.
pub const DOCKERFILE_LANGUAGE: &str = "dockerfile";

/// A named bundle of extra packages a template lets callers opt into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOption {
    pub name: String,
    #[serde(default)]
    pub packages: Vec<String>,
}

/// Parsed `template/<language>/template.yml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageTemplate {
    /// Language the template declares itself for (informational).
    #[serde(default)]
    pub language: Option<String>,
    /// Process the watchdog runs (informational).
    #[serde(default)]
    pub fprocess: Option<String>,
    /// Message shown after scaffolding a new function (informational).
    #[serde(default)]
    pub welcome_message: Option<String>,
    /// Subfolder of the build context that receives the handler files.
    #[serde(default)]
    pub handler_folder: String,
    #[serde(default)]
    pub build_options: Vec<BuildOption>,
}

impl LanguageTemplate {
    /// Parse a descriptor, rejecting duplicate build option names.
    pub fn from_yaml(content: &str, path: &Path) -> crate::Result<Self> {
        let template: Self =
            serde_yaml::from_str(content).map_err(|e| crate::Error::TemplateParse {
                path: path.to_path_buf(),
                source: e,
            })?;

        let mut seen = HashSet::new();
        for option in &template.build_options {
            if !seen.insert(option.name.as_str()) {
                return Err(crate::Error::DuplicateBuildOption {
                    path: path.to_path_buf(),
                    name: option.name.clone(),
                });
            }
        }

        if !template.handler_folder.is_empty() && !is_single_segment(&template.handler_folder) {
            return Err(crate::Error::InvalidHandlerFolder {
                path: path.to_path_buf(),
                folder: template.handler_folder.clone(),
            });
        }

        Ok(template)
    }

    /// Load the descriptor for `language` from the project's template folder.
    pub fn load(project_dir: &Path, language: &str) -> crate::Result<Self> {
        let path = descriptor_path(project_dir, language);
        tracing::debug!(path = %path.display(), "loading language template");
        let content = std::fs::read_to_string(&path).map_err(|e| crate::Error::TemplateLoad {
            path: path.clone(),
            source: e,
        })?;
        Self::from_yaml(&content, &path)
    }

    /// Handler folder name, falling back to [`DEFAULT_HANDLER_FOLDER`].
    pub fn handler_folder_or_default(&self) -> &str {
        if self.handler_folder.is_empty() {
            DEFAULT_HANDLER_FOLDER
        } else {
            &self.handler_folder
        }
    }
}

/// True when `name` is exactly one normal path component, so joining it
/// onto a directory stays inside that directory.
pub fn is_single_segment(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// `<project>/template/<language>`
pub fn template_path(project_dir: &Path, language: &str) -> PathBuf {
    project_dir.join(TEMPLATE_DIR).join(language)
}

/// `<project>/template/<language>/template.yml`
pub fn descriptor_path(project_dir: &Path, language: &str) -> PathBuf {
    template_path(project_dir, language).join(TEMPLATE_DESCRIPTOR)
}

/// False for the `dockerfile` pseudo-language (any case), true otherwise.
pub fn is_language_template(language: &str) -> bool {
    !language.eq_ignore_ascii_case(DOCKERFILE_LANGUAGE)
}

/// Whether `language` can be built from this project: either the
/// `dockerfile` pseudo-language or a template folder that exists.
pub fn is_valid_template(project_dir: &Path, language: &str) -> bool {
    !is_language_template(language) || template_path(project_dir, language).is_dir()
}
