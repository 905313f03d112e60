use assert_cmd::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn stdout_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout")
}

#[test]
fn cli_extracts_tikz_environment_from_model_output() {
    let fixture = repo_root().join("fixtures").join("model_output.md");
    assert!(fixture.exists(), "fixture missing: {}", fixture.display());

    let exe = assert_cmd::cargo_bin!("tikzgen-cli");
    let out = stdout_of(
        Command::new(exe)
            .args(["extract", fixture.to_string_lossy().as_ref()])
            .assert()
            .success(),
    );
    assert!(out.starts_with("\\begin{tikzpicture}"), "got: {out}");
    assert!(out.trim_end().ends_with("\\end{tikzpicture}"), "got: {out}");
    assert!(!out.contains("```"));
}

#[test]
fn cli_extracts_svg_document_from_stdin() {
    let exe = assert_cmd::cargo_bin!("tikzgen-cli");
    let out = stdout_of(
        assert_cmd::Command::new(exe)
            .args(["extract", "--kind", "svg"])
            .write_stdin("Sure! <svg viewBox=\"0 0 4 4\"><rect width=\"4\" height=\"4\"/></svg> Done.")
            .assert()
            .success(),
    );
    assert_eq!(
        out.trim_end(),
        "<svg viewBox=\"0 0 4 4\"><rect width=\"4\" height=\"4\"/></svg>"
    );
}

#[test]
fn cli_prints_unclosed_svg_unless_complete_is_required() {
    let exe = assert_cmd::cargo_bin!("tikzgen-cli");
    let out = stdout_of(
        assert_cmd::Command::new(exe)
            .args(["extract", "--kind", "svg", "-"])
            .write_stdin("<svg><circle r=\"1\"")
            .assert()
            .success(),
    );
    assert_eq!(out.trim_end(), "<svg><circle r=\"1\"");

    assert_cmd::Command::new(exe)
        .args(["extract", "--kind", "svg", "--complete"])
        .write_stdin("<svg><circle r=\"1\"")
        .assert()
        .code(3);
}

#[test]
fn cli_extract_with_nothing_to_find_exits_3() {
    let exe = assert_cmd::cargo_bin!("tikzgen-cli");
    assert_cmd::Command::new(exe)
        .args(["extract", "--kind", "svg"])
        .write_stdin("I could not draw that, sorry.")
        .assert()
        .code(3);

    assert_cmd::Command::new(exe)
        .args(["extract", "--environment", "axis"])
        .write_stdin("```latex\n```\n")
        .assert()
        .code(3);
}

#[test]
fn cli_extract_falls_back_to_fence_stripped_text() {
    let exe = assert_cmd::cargo_bin!("tikzgen-cli");
    let out = stdout_of(
        assert_cmd::Command::new(exe)
            .args(["extract", "--environment", "axis"])
            .write_stdin("```latex\n\\begin{tikzpicture}\\end{tikzpicture}\n```")
            .assert()
            .success(),
    );
    assert_eq!(out.trim_end(), "\\begin{tikzpicture}\\end{tikzpicture}");
}

#[test]
fn cli_extracts_custom_environment() {
    let exe = assert_cmd::cargo_bin!("tikzgen-cli");
    let out = stdout_of(
        assert_cmd::Command::new(exe)
            .args(["extract", "--environment", "axis"])
            .write_stdin("x \\begin{axis}\\addplot {x};\\end{axis} y")
            .assert()
            .success(),
    );
    assert_eq!(out.trim_end(), "\\begin{axis}\\addplot {x};\\end{axis}");
}

#[test]
fn cli_usage_errors_exit_2() {
    let exe = assert_cmd::cargo_bin!("tikzgen-cli");
    Command::new(exe)
        .args(["extract", "--kind", "pdf"])
        .assert()
        .code(2);

    Command::new(exe)
        .args(["describe", "--topic", "astrology", "a circle"])
        .assert()
        .code(2);
}

#[test]
fn cli_describe_without_api_key_exits_2() {
    let exe = assert_cmd::cargo_bin!("tikzgen-cli");
    Command::new(exe)
        .env_remove("TIKZGEN_API_KEY")
        .env_remove("GEMINI_API_KEY")
        .env_remove("API_KEY")
        .args(["describe", "a right triangle with legs 3 and 4"])
        .assert()
        .code(2);
}
