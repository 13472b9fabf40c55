//! Build context assembly and image builds for fnpack.
//!
//! # Build pipeline
//!
//! ```text
//! fnpack build
//!   1. Template   ── template/<lang>/template.yml must exist and parse
//!   2. Tag        ── git sha / branch / describe → image name
//!   3. Handler    ── handler directory must exist
//!   4. Context    ── build/<fn>/ recreated: template, handler, extra paths
//!   5. Options    ── template build options → ADDITIONAL_PACKAGE
//!   6. Arguments  ── docker build [flags] --tag <image> .
//!   7. Invoke     ── run in build/<fn>/ (skipped when shrink-wrapping)
//! ```
//!
//! # Context layout
//!
//! In template mode the language template is copied to `build/<fn>/` and
//! the handler is overlaid on `build/<fn>/<handler_folder>/` (default
//! `function`). For the `dockerfile` language the handler is copied to
//! `build/<fn>/` directly. Handler entries named `build` or `template` are
//! never copied, and extra paths must stay inside the project directory.

pub mod builder;
pub mod context;
pub mod copy;
pub mod docker;
pub mod executor;
pub mod packages;
pub mod scope;
pub mod tag;
pub mod vcs;

pub use builder::{BuildError, BuildImageConfig, BuildOutcome, ImageBuilder};
pub use context::{ContextRequest, DirPermissions, create_build_context};
pub use docker::{ADDITIONAL_PACKAGE_BUILD_ARG, DockerBuild, ProxySettings, docker_build_command};
pub use executor::{BuildExecutor, ExecOutput, ExecTask, RealExecutor};
pub use vcs::{GitCli, VersionControl};
