use fnpack_build::packages::{
    BuildOptionError, build_option_packages, dedupe, resolve_packages,
};
use fnpack_core::BuildOption;
use proptest::prelude::*;

fn option(name: &str, packages: &[&str]) -> BuildOption {
    BuildOption {
        name: name.to_owned(),
        packages: packages.iter().map(|p| (*p).to_owned()).collect(),
    }
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_owned()).collect()
}

fn available() -> Vec<BuildOption> {
    vec![
        option("dev", &["git", "make"]),
        option("debug", &["gdb", "make"]),
        option("ssl", &["libssl-dev"]),
    ]
}

// ── dedupe ──

#[test]
fn dedupe_keeps_first_occurrence() {
    assert_eq!(dedupe(&["b", "a", "b"]), vec!["b", "a"]);
}

#[test]
fn dedupe_empty() {
    assert!(dedupe::<&str>(&[]).is_empty());
}

// ── resolve_packages ──

#[test]
fn resolves_single_option() {
    let (packages, all_found) = resolve_packages(&names(&["dev"]), &available());
    assert_eq!(packages, vec!["git", "make"]);
    assert!(all_found);
}

#[test]
fn resolves_multiple_options_deduplicated() {
    let (packages, all_found) = resolve_packages(&names(&["dev", "debug"]), &available());
    assert_eq!(packages, vec!["git", "make", "gdb"]);
    assert!(all_found);
}

#[test]
fn unknown_option_reports_not_found() {
    let (_, all_found) = resolve_packages(&names(&["dev", "gpu", "ssl"]), &available());
    assert!(!all_found);
}

#[test]
fn unknown_option_returns_partial_accumulation() {
    let (packages, all_found) = resolve_packages(&names(&["dev", "gpu"]), &available());
    assert!(!all_found);
    assert_eq!(packages, vec!["git", "make"]);
}

#[test]
fn first_declared_option_wins_on_duplicate_names() {
    let options = vec![option("dev", &["git"]), option("dev", &["svn"])];
    let (packages, _) = resolve_packages(&names(&["dev"]), &options);
    assert_eq!(packages, vec!["git"]);
}

#[test]
fn nothing_requested_is_empty_and_found() {
    let (packages, all_found) = resolve_packages(&[], &available());
    assert!(packages.is_empty());
    assert!(all_found);
}

// ── build_option_packages ──

#[test]
fn build_option_packages_unknown_names_language_and_descriptor() {
    let err = build_option_packages(&names(&["gpu"]), "python3", &available()).unwrap_err();
    assert!(matches!(
        err,
        BuildOptionError::Unavailable { ref language, .. } if language == "python3"
    ));

    let message = err.to_string();
    assert!(message.contains("python3"), "got: {message}");
    assert!(message.contains("template/python3/template.yml"), "got: {message}");
    assert!(message.contains("gpu"), "got: {message}");
}

#[test]
fn build_option_packages_empty_request_ignores_template() {
    let packages = build_option_packages(&[], "python3", &[]).unwrap();
    assert!(packages.is_empty());
}

#[test]
fn build_option_packages_success() {
    let packages = build_option_packages(&names(&["ssl", "dev"]), "go", &available()).unwrap();
    assert_eq!(packages, vec!["libssl-dev", "git", "make"]);
}

// ── Property-based tests ──

fn package_list() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-d]{1,2}", 0..20)
}

proptest! {
    #[test]
    fn dedupe_is_idempotent(list in package_list()) {
        let once = dedupe(&list);
        prop_assert_eq!(dedupe(&once), once);
    }

    #[test]
    fn dedupe_has_no_duplicates_and_loses_nothing(list in package_list()) {
        let out = dedupe(&list);
        let unique: std::collections::HashSet<&String> = out.iter().collect();
        prop_assert_eq!(unique.len(), out.len());
        for item in &list {
            prop_assert!(out.contains(item));
        }
    }

    #[test]
    fn dedupe_preserves_first_seen_order(list in package_list()) {
        let out = dedupe(&list);
        let first_positions: Vec<usize> = out
            .iter()
            .map(|p| list.iter().position(|x| x == p).unwrap_or(usize::MAX))
            .collect();
        let mut sorted = first_positions.clone();
        sorted.sort_unstable();
        prop_assert_eq!(first_positions, sorted);
    }

    #[test]
    fn requesting_any_unknown_name_is_never_all_found(
        known in proptest::collection::vec(prop_oneof![Just("dev"), Just("debug"), Just("ssl")], 0..4),
        position in 0usize..4,
    ) {
        let mut requested: Vec<String> = known.iter().map(|s| (*s).to_owned()).collect();
        let at = position.min(requested.len());
        requested.insert(at, "not-declared".to_owned());
        let (_, all_found) = resolve_packages(&requested, &available());
        prop_assert!(!all_found);
    }
}
