use std::fs;
use std::path::{Path, PathBuf};

use shaderweave_compiler::config::ResolverConfig;
use shaderweave_compiler::diagnostics::codes;
use shaderweave_compiler::driver::{FileSetResolver, StaticPackageResolver};
use tempfile::TempDir;

// テスト用のソースツリーを作成するヘルパー関数
fn source_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::create_dir_all(root.join("axon/sub")).unwrap();
    fs::create_dir_all(root.join("mat32")).unwrap();
    for file in ["axon/neuron.go", "axon/act.go", "axon/.scratch.go", "axon/notes.txt", "axon/sub/learn.go", "mat32/fastexp.go"] {
        fs::write(root.join(file), "package x\n").unwrap();
    }
    fs::write(root.join("params.txt"), "gosl params\n").unwrap();
    dir
}

fn spec(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

fn resolver_with(packages: StaticPackageResolver) -> FileSetResolver<StaticPackageResolver> {
    FileSetResolver::new(ResolverConfig::default(), packages)
}

#[test]
fn test_directory_walk_is_lexical_and_filtered() {
    let tree = source_tree();
    let root = tree.path();
    let mut resolver = resolver_with(StaticPackageResolver::new());

    let files = resolver.resolve(&[spec(&root.join("axon"))]);

    assert_eq!(
        files,
        vec![
            root.join("axon/act.go"),
            root.join("axon/neuron.go"),
            root.join("axon/sub/learn.go"),
        ]
    );
    assert!(resolver.diagnostics().is_empty());
}

#[test]
fn test_file_reached_twice_is_listed_once() {
    let tree = source_tree();
    let root = tree.path();
    let mut resolver = resolver_with(StaticPackageResolver::new());

    let files = resolver.resolve(&[
        spec(&root.join("axon/neuron.go")),
        spec(&root.join("axon")),
        spec(&root.join("axon/neuron.go")),
    ]);

    assert_eq!(
        files,
        vec![
            root.join("axon/neuron.go"),
            root.join("axon/act.go"),
            root.join("axon/sub/learn.go"),
        ]
    );
}

#[test]
fn test_explicit_file_is_taken_without_extension_check() {
    let tree = source_tree();
    let root = tree.path();
    let mut resolver = resolver_with(StaticPackageResolver::new());

    let files = resolver.resolve(&[spec(&root.join("params.txt"))]);
    assert_eq!(files, vec![root.join("params.txt")]);
}

#[test]
fn test_package_names_skip_shared_package() {
    let tree = source_tree();
    let root = tree.path();
    let mut resolver = resolver_with(StaticPackageResolver::new());

    resolver.resolve(&[spec(&root.join("axon")), spec(&root.join("mat32"))]);

    let names: Vec<&str> = resolver.loaded_packages().iter().map(String::as_str).collect();
    assert_eq!(names, vec!["axon", "sub"]);
}

#[test]
fn test_package_names_accumulate_across_calls() {
    let tree = source_tree();
    let root = tree.path();
    let mut resolver = resolver_with(StaticPackageResolver::new());

    resolver.resolve(&[spec(&root.join("axon/neuron.go"))]);
    let set = resolver.resolve_file_set(&[spec(&root.join("axon/sub/learn.go"))]);

    assert_eq!(set.files, vec![root.join("axon/sub/learn.go")]);
    assert!(set.packages.contains("axon"));
    assert!(set.packages.contains("sub"));
}

#[test]
fn test_package_import_keeps_reported_order() {
    let packages = StaticPackageResolver::new().with_package(
        "github.com/emer/axon/kinase",
        ["/go/src/kinase/synca.go", "/go/src/kinase/params.go"],
    );
    let mut resolver = resolver_with(packages);

    let files = resolver.resolve(&["github.com/emer/axon/kinase"]);

    assert_eq!(
        files,
        vec![
            PathBuf::from("/go/src/kinase/synca.go"),
            PathBuf::from("/go/src/kinase/params.go"),
        ]
    );
    assert!(resolver.loaded_packages().contains("kinase"));
}

#[test]
fn test_package_file_specifier_selects_one_file() {
    let packages = StaticPackageResolver::new().with_package(
        "github.com/emer/axon/kinase",
        ["/go/src/kinase/synca.go", "/go/src/kinase/params.go"],
    );
    let mut resolver = resolver_with(packages);

    let files = resolver.resolve(&["github.com/emer/axon/kinase/params.go"]);
    assert_eq!(files, vec![PathBuf::from("/go/src/kinase/params.go")]);

    let files = resolver.resolve(&["github.com/emer/axon/kinase/missing.go"]);
    assert!(files.is_empty());
    assert_eq!(resolver.diagnostics().len(), 1);
    assert_eq!(resolver.diagnostics()[0].code, Some(codes::UNRESOLVED_PATH));
}

#[test]
fn test_package_file_specifier_prefers_exact_file_name() {
    let packages = StaticPackageResolver::new().with_package(
        "github.com/emer/axon/kinase",
        ["/go/src/kinase/myparams.go", "/go/src/kinase/params.go"],
    );
    let mut resolver = resolver_with(packages);

    let files = resolver.resolve(&["github.com/emer/axon/kinase/params.go"]);
    assert_eq!(files, vec![PathBuf::from("/go/src/kinase/params.go")]);

    let files = resolver.resolve(&["github.com/emer/axon/kinase/yparams.go"]);
    assert_eq!(files, vec![PathBuf::from("/go/src/kinase/myparams.go")]);
}

#[test]
fn test_unresolved_specifier_does_not_abort_batch() {
    let tree = source_tree();
    let root = tree.path();
    let mut resolver = resolver_with(StaticPackageResolver::new());

    let files = resolver.resolve(&[
        "example.com/does/not/exist".to_string(),
        spec(&root.join("axon/act.go")),
    ]);

    assert_eq!(files, vec![root.join("axon/act.go")]);
    assert_eq!(resolver.diagnostics().len(), 1);
    assert_eq!(resolver.diagnostics()[0].code, Some(codes::UNRESOLVED_PATH));
}

#[test]
fn test_custom_extension_and_shared_package() {
    let tree = source_tree();
    let root = tree.path();
    let config = ResolverConfig {
        source_extension: "txt".to_string(),
        shared_package: "axon".to_string(),
        ..ResolverConfig::default()
    };
    let mut resolver = FileSetResolver::new(config, StaticPackageResolver::new());

    let files = resolver.resolve(&[spec(root)]);

    assert_eq!(files, vec![root.join("axon/notes.txt"), root.join("params.txt")]);
    assert!(!resolver.loaded_packages().contains("axon"));
}
