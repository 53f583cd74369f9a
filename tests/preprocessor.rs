use std::{fs, rc::Rc};

use scriptum::{
    DiagnosticKind, Preprocessor,
    config::FolderConfig,
    filesystem::LocalFileSystem,
    preprocessor::DirectivePreprocessor,
};
use tempfile::tempdir;

fn preprocessor(root: &std::path::Path) -> DirectivePreprocessor {
    DirectivePreprocessor::new(Rc::new(LocalFileSystem::new(root, FolderConfig::default())))
}

#[test]
fn collects_prologue_directives_and_keeps_code() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("main.csx");
    fs::write(
        &script,
        "// header\n#r \"Dapper.dll\"\nusing System.Data;\n\nvar x = 1;\nusing System.Late;\n#r \"Late.dll\"\n",
    )
    .expect("write script");

    let result = preprocessor(dir.path()).process_file(&script).unwrap();
    assert_eq!(result.references, ["Dapper.dll", "Late.dll"]);
    assert_eq!(result.namespaces, ["System.Data"]);
    assert_eq!(result.code, "// header\n\nvar x = 1;\nusing System.Late;");
}

#[test]
fn inlines_loaded_files_once() {
    let dir = tempdir().expect("create temp dir");
    fs::create_dir_all(dir.path().join("lib")).expect("create lib dir");
    fs::write(
        dir.path().join("lib/util.csx"),
        "#r \"Util.dll\"\nusing Util;\nvoid Util() {}",
    )
    .expect("write util");
    fs::write(
        dir.path().join("main.csx"),
        "#load \"lib/util.csx\"\n#load \"./lib/../lib/util.csx\"\n#r \"Util.dll\"\nMain();",
    )
    .expect("write main");

    let result = preprocessor(dir.path())
        .process_file(&dir.path().join("main.csx"))
        .unwrap();
    assert_eq!(result.code, "void Util() {}\nMain();");
    assert_eq!(result.references, ["Util.dll"]);
    assert_eq!(result.namespaces, ["Util"]);
}

#[test]
fn load_cycle_is_reported() {
    let dir = tempdir().expect("create temp dir");
    fs::write(dir.path().join("a.csx"), "#load \"b.csx\"\nA();").expect("write a");
    fs::write(dir.path().join("b.csx"), "#load \"a.csx\"\nB();").expect("write b");

    let err = preprocessor(dir.path())
        .process_file(&dir.path().join("a.csx"))
        .unwrap_err();
    assert_eq!(err.kind(), Some(&DiagnosticKind::Preprocess));
    assert!(err.to_string().contains("cycle"));
}

#[test]
fn inline_text_loads_relative_to_working_directory() {
    let dir = tempdir().expect("create temp dir");
    fs::write(dir.path().join("helpers.csx"), "void Help() {}").expect("write helpers");

    let result = preprocessor(dir.path())
        .process_script("#load \"helpers.csx\"\nHelp();")
        .unwrap();
    assert_eq!(result.code, "void Help() {}\nHelp();");
}

#[test]
fn missing_load_target_is_a_preprocess_error() {
    let dir = tempdir().expect("create temp dir");
    let err = preprocessor(dir.path())
        .process_script("#load \"nope.csx\"")
        .unwrap_err();
    assert_eq!(err.kind(), Some(&DiagnosticKind::Preprocess));
}
