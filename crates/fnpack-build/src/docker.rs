use std::collections::BTreeMap;

use crate::packages::dedupe;

/// Build-arg key whose value is merged into the resolved package list
/// instead of being passed through.
pub const ADDITIONAL_PACKAGE_BUILD_ARG: &str = "ADDITIONAL_PACKAGE";

/// Proxy settings forwarded into the build as build-args.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxySettings {
    pub http_proxy: String,
    pub https_proxy: String,
}

impl ProxySettings {
    /// Reads `http_proxy` and `https_proxy` from the process environment.
    pub fn from_env() -> Self {
        Self {
            http_proxy: env_or_empty("http_proxy"),
            https_proxy: env_or_empty("https_proxy"),
        }
    }
}

fn env_or_empty(key: &str) -> String {
    std::env::var(key)
        // arch-lint: allow(no-silent-result-drop) reason="an unset proxy variable means no proxy is configured"
        .unwrap_or_default()
}

/// Fully resolved inputs for one `docker build` invocation.
#[derive(Debug, Clone, Default)]
pub struct DockerBuild {
    pub image: String,
    pub no_cache: bool,
    pub squash: bool,
    pub proxy: ProxySettings,
    pub build_args: BTreeMap<String, String>,
    /// Packages resolved from the template's build options.
    pub build_option_packages: Vec<String>,
    pub labels: BTreeMap<String, String>,
    /// Free-form flags; each entry may hold several whitespace-separated tokens.
    pub build_flags: Vec<String>,
}

/// Returns the command and arguments for `docker build`, run from the
/// build context directory.
pub fn docker_build_command(build: &DockerBuild) -> (String, Vec<String>) {
    let mut args = vec!["build".to_owned()];
    args.extend(build_flags(build));
    args.extend(["--tag".to_owned(), build.image.clone(), ".".to_owned()]);
    ("docker".to_owned(), args)
}

/// Flags in a fixed class order: cache, squash, proxies, free-form flags,
/// build-args, additional packages, labels. Map-derived classes follow key
/// order.
pub fn build_flags(build: &DockerBuild) -> Vec<String> {
    let mut flags = Vec::new();

    if build.no_cache {
        flags.push("--no-cache".to_owned());
    }
    if build.squash {
        flags.push("--squash".to_owned());
    }

    if !build.proxy.http_proxy.is_empty() {
        push_pair(&mut flags, "--build-arg", "http_proxy", &build.proxy.http_proxy);
    }
    if !build.proxy.https_proxy.is_empty() {
        push_pair(&mut flags, "--build-arg", "https_proxy", &build.proxy.https_proxy);
    }

    for flag in &build.build_flags {
        flags.extend(flag.split_whitespace().map(str::to_owned));
    }

    let mut packages = build.build_option_packages.clone();
    for (key, value) in &build.build_args {
        if key == ADDITIONAL_PACKAGE_BUILD_ARG {
            packages.extend(value.split_whitespace().map(str::to_owned));
        } else {
            push_pair(&mut flags, "--build-arg", key, value);
        }
    }

    if !packages.is_empty() {
        let packages = dedupe(&packages).join(" ");
        push_pair(&mut flags, "--build-arg", ADDITIONAL_PACKAGE_BUILD_ARG, &packages);
    }

    for (key, value) in &build.labels {
        push_pair(&mut flags, "--label", key, value);
    }

    flags
}

fn push_pair(flags: &mut Vec<String>, flag: &str, key: &str, value: &str) {
    flags.push(flag.to_owned());
    flags.push(format!("{key}={value}"));
}
