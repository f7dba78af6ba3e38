//! Integration tests for the grainpack binary.

use assert_cmd::Command;
use grainpack::Bundle;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use wasm_encoder::{EntityType, ImportSection, Module};

fn module_importing(namespaces: &[&str]) -> Vec<u8> {
    let mut module = Module::new();
    let mut section = ImportSection::new();
    for namespace in namespaces {
        section.import(namespace, "f", EntityType::Function(0));
    }
    module.section(&section);
    module.finish()
}

/// app/main.gr.wasm imports lists and console; lists comes from the stdlib
fn create_project(root: &Path) {
    fs::create_dir_all(root.join("app")).unwrap();
    fs::create_dir_all(root.join("grain/stdlib")).unwrap();
    fs::create_dir_all(root.join("grain/runtime/dist")).unwrap();

    fs::write(
        root.join("app/main.gr.wasm"),
        module_importing(&["GRAIN$MODULE$lists", "console"]),
    )
    .unwrap();
    fs::write(root.join("grain/stdlib/lists.gr.wasm"), module_importing(&[])).unwrap();
    fs::write(
        root.join("grain/runtime/dist/grain-runtime-browser.js"),
        "var Grain = {};",
    )
    .unwrap();
}

fn grainpack() -> Command {
    let mut cmd = Command::cargo_bin("grainpack").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("GRAINPACK_LOG");
    cmd
}

#[test]
fn test_bundle_binary_with_dep_file() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    create_project(root);

    grainpack()
        .current_dir(root)
        .args([
            "bundle",
            "app/main.gr.wasm",
            "--grain-home",
            "grain",
            "--format",
            "binary",
            "-o",
            "out.grpk",
            "--dep-file",
            "out.d",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bundled"));

    let bundle = Bundle::decode(&fs::read(root.join("out.grpk")).unwrap()).unwrap();
    assert_eq!(bundle.shim, "var Grain = {};");
    assert_eq!(
        bundle.module_names().collect::<Vec<_>>(),
        vec!["GRAIN$MODULE$lists"]
    );
    assert_eq!(bundle.root, fs::read(root.join("app/main.gr.wasm")).unwrap());

    let deps = fs::read_to_string(root.join("out.d")).unwrap();
    assert!(deps.starts_with("out.grpk: grain/runtime/dist/grain-runtime-browser.js"));
    assert!(deps.contains("grain/stdlib/lists.gr.wasm"));
}

#[test]
fn test_bundle_js_default_output() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    create_project(root);
    fs::write(root.join("grainpack.toml"), "grain-home = \"grain\"\n").unwrap();

    grainpack()
        .current_dir(root)
        .args(["bundle", "app/main.gr.wasm"])
        .assert()
        .success();

    let js = fs::read_to_string(root.join("app/main.gr.js")).unwrap();
    assert!(js.starts_with("var Grain = {};"));
    assert!(js.contains("grainModules[\"GRAIN$MODULE$lists\"]"));
}

#[test]
fn test_bundle_unresolved_import_fails() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    create_project(root);
    fs::remove_file(root.join("grain/stdlib/lists.gr.wasm")).unwrap();

    grainpack()
        .current_dir(root)
        .args(["bundle", "app/main.gr.wasm", "--grain-home", "grain", "-o", "out.js"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Could not find required Grain import lists for bundling",
        ));

    assert!(!root.join("out.js").exists());
}

#[test]
fn test_bundle_requires_grain_home() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    create_project(root);

    grainpack()
        .current_dir(root)
        .args(["bundle", "app/main.gr.wasm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("grain-home"));
}

#[test]
fn test_imports_lists_classification() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    create_project(root);

    grainpack()
        .current_dir(root)
        .args(["imports", "app/main.gr.wasm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lists -> GRAIN$MODULE$lists"))
        .stdout(predicate::str::contains("console (runtime)"));
}

#[test]
fn test_resolve_prints_modules() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    create_project(root);

    grainpack()
        .current_dir(root)
        .args([
            "resolve",
            "app/main.gr.wasm",
            "--grain-home",
            "grain",
            "--resolve",
            "index",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("GRAIN$MODULE$lists"))
        .stdout(predicate::str::contains("lists.gr.wasm"));
}

#[test]
fn test_inspect_bundle() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    create_project(root);

    grainpack()
        .current_dir(root)
        .args([
            "bundle",
            "app/main.gr.wasm",
            "--grain-home",
            "grain",
            "--format",
            "binary",
            "-o",
            "out.grpk",
        ])
        .assert()
        .success();

    grainpack()
        .current_dir(root)
        .args(["inspect", "out.grpk"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Modules (1):"))
        .stdout(predicate::str::contains("GRAIN$MODULE$lists"));
}

#[test]
fn test_inspect_rejects_non_bundle() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("junk.grpk"), b"junk").unwrap();

    grainpack()
        .current_dir(temp.path())
        .args(["inspect", "junk.grpk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid bundle"));
}
