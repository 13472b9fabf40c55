use std::path::{Path, PathBuf};

use fnpack_build::{BuildImageConfig, BuildOutcome, ImageBuilder};
use fnpack_core::{FnpackConfig, FunctionConfig, TagFormat};

/// Command-line overrides for `fnpack build`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct BuildOpts {
    /// Path to the config file
    #[arg(long, short = 'f', default_value = fnpack_core::config::CONFIG_FILE)]
    pub file: PathBuf,
    /// Build only the named function
    #[arg(long)]
    pub filter: Option<String>,
    /// Do not use the Docker build cache
    #[arg(long)]
    pub no_cache: bool,
    /// Squash the image layers (requires experimental Docker)
    #[arg(long)]
    pub squash: bool,
    /// Assemble the build context only, without running docker
    #[arg(long)]
    pub shrinkwrap: bool,
    /// Do not stream docker output
    #[arg(long, short = 'q')]
    pub quiet: bool,
    /// Tag format: latest, sha, branch, describe
    #[arg(long)]
    pub tag: Option<TagFormat>,
    /// Build-arg in KEY=VALUE format (repeatable, overrides fnpack.toml)
    #[arg(long = "build-arg", short = 'b', value_parser = parse_key_value)]
    pub build_args: Vec<(String, String)>,
    /// Image label in KEY=VALUE format (repeatable, overrides fnpack.toml)
    #[arg(long = "build-label", value_parser = parse_key_value)]
    pub build_labels: Vec<(String, String)>,
    /// Template build option to enable (repeatable)
    #[arg(long = "build-option", short = 'o')]
    pub build_options: Vec<String>,
    /// Extra flag passed to docker build (repeatable)
    #[arg(long = "build-flag")]
    pub build_flags: Vec<String>,
    /// Extra path, inside the project, to copy into the build context (repeatable)
    #[arg(long = "copy-extra")]
    pub copy_extra: Vec<String>,
}

/// Build every function in the config file, or only the filtered one.
pub async fn build(opts: BuildOpts) -> anyhow::Result<()> {
    let project_dir = PathBuf::from(".");
    let config = FnpackConfig::load_file(&opts.file)?;

    let selected = select_functions(&config, opts.filter.as_deref(), &opts.file)?;
    tracing::debug!(config = %opts.file.display(), functions = selected.len(), "loaded config");
    let builder = ImageBuilder::new(&project_dir);

    for (name, function) in selected {
        let build_config = build_config(&config, name, function, &opts);

        match builder.build_image(&build_config).await? {
            BuildOutcome::ShrinkWrapped { context, .. } => {
                println!("{name} shrink-wrapped to {}", context.display());
            }
            BuildOutcome::Built { image, .. } => {
                println!("Image: {image} built.");
            }
        }
    }

    Ok(())
}

fn select_functions<'a>(
    config: &'a FnpackConfig,
    filter: Option<&str>,
    file: &Path,
) -> anyhow::Result<Vec<(&'a String, &'a FunctionConfig)>> {
    if config.functions.is_empty() {
        anyhow::bail!(
            "no functions defined in {}, add a [functions.<name>] table",
            file.display()
        );
    }

    let Some(name) = filter else {
        return Ok(config.functions.iter().collect());
    };
    match config.functions.get_key_value(name) {
        Some(selected) => Ok(vec![selected]),
        None => anyhow::bail!("function '{name}' not found in {}", file.display()),
    }
}

/// Merge file settings with command-line overrides for one function.
fn build_config(
    config: &FnpackConfig,
    name: &str,
    function: &FunctionConfig,
    opts: &BuildOpts,
) -> BuildImageConfig {
    let mut build_args = function.build_args.clone();
    build_args.extend(opts.build_args.iter().cloned());

    let mut build_labels = function.build_labels.clone();
    build_labels.extend(opts.build_labels.iter().cloned());

    let mut copy_extra_paths = config.copy_paths_for(function);
    copy_extra_paths.extend(opts.copy_extra.iter().cloned());

    BuildImageConfig {
        image: function.image.clone(),
        handler: PathBuf::from(&function.handler),
        function_name: name.to_owned(),
        language: function.lang.clone(),
        no_cache: opts.no_cache,
        squash: opts.squash,
        shrink_wrap: opts.shrinkwrap,
        quiet: opts.quiet,
        build_args,
        build_labels,
        build_flags: concat(&config.build.build_flags, &opts.build_flags),
        build_options: concat(&function.build_options, &opts.build_options),
        copy_extra_paths,
        tag_format: opts
            .tag
            // arch-lint: allow(no-silent-result-drop) reason="no --tag means the fnpack.toml tag format applies"
            .unwrap_or(config.build.tag),
    }
}

fn concat(first: &[String], second: &[String]) -> Vec<String> {
    first.iter().chain(second).cloned().collect()
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE format, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}
