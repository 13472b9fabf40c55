use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fnpack_core::template::{self, LanguageTemplate};
use fnpack_core::{TagFormat, image_name};

use crate::context::{ContextError, ContextRequest, DirPermissions, create_build_context};
use crate::docker::{DockerBuild, ProxySettings, docker_build_command};
use crate::executor::{BuildExecutor, ExecError, ExecTask, RealExecutor};
use crate::packages::{BuildOptionError, build_option_packages};
use crate::tag::{TagError, resolve_tag_values};
use crate::vcs::{GitCli, VersionControl};

/// Everything needed to build one function's image.
#[derive(Debug, Clone, Default)]
pub struct BuildImageConfig {
    /// Image name before the version-control suffix.
    pub image: String,
    /// Handler directory, relative to the project unless absolute.
    pub handler: PathBuf,
    pub function_name: String,
    pub language: String,
    pub no_cache: bool,
    pub squash: bool,
    /// Stop after assembling the build context.
    pub shrink_wrap: bool,
    /// Capture build output instead of streaming it.
    pub quiet: bool,
    pub build_args: BTreeMap<String, String>,
    pub build_labels: BTreeMap<String, String>,
    pub build_flags: Vec<String>,
    pub build_options: Vec<String>,
    pub copy_extra_paths: Vec<String>,
    pub tag_format: TagFormat,
}

/// How a successful [`ImageBuilder::build_image`] call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The context was assembled and `docker build` was skipped.
    ShrinkWrapped { image: String, context: PathBuf },
    /// `docker build` exited successfully.
    Built { image: String, context: PathBuf },
}

impl BuildOutcome {
    pub fn image(&self) -> &str {
        match self {
            Self::ShrinkWrapped { image, .. } | Self::Built { image, .. } => image,
        }
    }

    pub fn context(&self) -> &Path {
        match self {
            Self::ShrinkWrapped { context, .. } | Self::Built { context, .. } => context,
        }
    }
}

/// Builds function images from a project directory, parameterized over the
/// process executor and version control for testability.
pub struct ImageBuilder<E: BuildExecutor = RealExecutor, V: VersionControl = GitCli> {
    project_dir: PathBuf,
    executor: E,
    vcs: V,
    proxy: Option<ProxySettings>,
    permissions: Option<DirPermissions>,
}

impl ImageBuilder<RealExecutor, GitCli> {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        Self::with_parts(project_dir.clone(), RealExecutor, GitCli::new(project_dir))
    }
}

impl<E: BuildExecutor, V: VersionControl> ImageBuilder<E, V> {
    pub fn with_parts(project_dir: impl Into<PathBuf>, executor: E, vcs: V) -> Self {
        Self {
            project_dir: project_dir.into(),
            executor,
            vcs,
            proxy: None,
            permissions: None,
        }
    }

    /// Use fixed proxy settings instead of reading the environment per build.
    pub fn with_proxy(mut self, proxy: ProxySettings) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Use fixed directory permissions instead of checking `CI` per build.
    pub fn with_permissions(mut self, permissions: DirPermissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Assemble the build context for one function and, unless
    /// shrink-wrapping, run `docker build` in it.
    ///
    /// Stages run in order and the first failure is returned. A context
    /// directory created before the failure is left in place.
    pub async fn build_image(&self, config: &BuildImageConfig) -> Result<BuildOutcome, BuildError> {
        // 1. Template
        if !template::is_single_segment(&config.language) {
            return Err(BuildError::InvalidConfig {
                function: config.function_name.clone(),
                reason: "language must be a single template folder name",
            });
        }
        if !template::is_valid_template(&self.project_dir, &config.language) {
            return Err(BuildError::UnsupportedLanguage {
                language: config.language.clone(),
            });
        }
        let descriptor = template::descriptor_path(&self.project_dir, &config.language);
        if !descriptor.is_file() {
            return Err(BuildError::MissingTemplate {
                language: config.language.clone(),
                path: descriptor,
            });
        }
        let lang_template = LanguageTemplate::load(&self.project_dir, &config.language)?;

        // 2. Tag
        let tag = resolve_tag_values(config.tag_format, &self.vcs)?;
        let image = image_name(config.tag_format, &config.image, &tag.version, &tag.branch);

        // 3. Handler
        validate_function_name(&config.function_name)?;
        let handler = self.project_dir.join(&config.handler);
        if config.handler.as_os_str().is_empty() || !handler.is_dir() {
            return Err(BuildError::InvalidHandler {
                image,
                path: config.handler.clone(),
            });
        }

        // 4. Context
        tracing::info!(
            function = %config.function_name,
            "Building: {image} with {} template. Please wait..",
            config.language
        );
        let permissions = self
            .permissions
            // arch-lint: allow(no-silent-result-drop) reason="no override means CI is read from the environment"
            .unwrap_or_else(DirPermissions::from_env);
        let context = create_build_context(&ContextRequest {
            project_dir: &self.project_dir,
            function_name: &config.function_name,
            handler: &config.handler,
            language: &config.language,
            use_template: template::is_language_template(&config.language),
            handler_folder: lang_template.handler_folder_or_default(),
            extra_paths: &config.copy_extra_paths,
            permissions,
        })
        .map_err(|e| BuildError::Context {
            function: config.function_name.clone(),
            source: e,
        })?;

        if config.shrink_wrap {
            tracing::info!(function = %config.function_name, context = %context.display(), "shrink-wrapped");
            return Ok(BuildOutcome::ShrinkWrapped { image, context });
        }

        // 5. Build options
        let packages = build_option_packages(
            &config.build_options,
            &config.language,
            &lang_template.build_options,
        )?;

        // 6. Arguments
        let docker = DockerBuild {
            image: image.clone(),
            no_cache: config.no_cache,
            squash: config.squash,
            proxy: self
                .proxy
                .clone()
                // arch-lint: allow(no-silent-result-drop) reason="no override means proxies are read from the environment"
                .unwrap_or_else(ProxySettings::from_env),
            build_args: config.build_args.clone(),
            build_option_packages: packages,
            labels: config.build_labels.clone(),
            build_flags: config.build_flags.clone(),
        };
        let (command, args) = docker_build_command(&docker);

        // 7. Invoke
        let task = ExecTask {
            command,
            args,
            cwd: context.clone(),
            stream_output: !config.quiet,
        };
        let output = self
            .executor
            .exec(&task)
            .await
            .map_err(|e| BuildError::Exec {
                function: config.function_name.clone(),
                source: e,
            })?;

        if !output.success() {
            return Err(BuildError::NonZeroExit {
                function: config.function_name.clone(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        tracing::info!(function = %config.function_name, image = %image, "image built");
        Ok(BuildOutcome::Built { image, context })
    }
}

/// The function name becomes a single directory under `build/`.
fn validate_function_name(name: &str) -> Result<(), BuildError> {
    let invalid = |reason| {
        Err(BuildError::InvalidConfig {
            function: name.to_owned(),
            reason,
        })
    };

    if name.trim().is_empty() {
        return invalid("function name is empty");
    }
    if !template::is_single_segment(name) {
        return invalid("function name must be a single path segment");
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("language template: {language} not supported, build a custom Dockerfile")]
    UnsupportedLanguage { language: String },

    #[error("template descriptor for {language} not found at {path}")]
    MissingTemplate { language: String, path: PathBuf },

    #[error(transparent)]
    Template(#[from] fnpack_core::Error),

    #[error(transparent)]
    Tag(#[from] TagError),

    #[error("invalid function '{function}': {reason}")]
    InvalidConfig {
        function: String,
        reason: &'static str,
    },

    #[error("building {image}, {path} is an invalid path")]
    InvalidHandler { image: String, path: PathBuf },

    #[error("[{function}] failed to assemble build context")]
    Context {
        function: String,
        source: ContextError,
    },

    #[error(transparent)]
    BuildOption(#[from] BuildOptionError),

    #[error("[{function}] failed to run build")]
    Exec { function: String, source: ExecError },

    #[error("[{function}] received non-zero exit code {exit_code} from build, error: {stderr}")]
    NonZeroExit {
        function: String,
        exit_code: i32,
        stderr: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_function_name_is_valid() {
        assert!(validate_function_name("hello-world").is_ok());
    }

    #[test]
    fn empty_function_name_is_rejected() {
        assert!(matches!(
            validate_function_name(""),
            Err(BuildError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn function_name_cannot_escape_build_dir() {
        for name in ["..", "../etc", "a/b", "/abs", "."] {
            assert!(
                validate_function_name(name).is_err(),
                "accepted {name:?}"
            );
        }
    }
}
