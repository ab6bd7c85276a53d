use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("repo root")
        .to_path_buf()
}

fn fixture(name: &str) -> PathBuf {
    repo_root().join("tests/mockgen/fixtures").join(name)
}

fn golden() -> String {
    std::fs::read_to_string(fixture("thing_mock.go")).expect("read golden")
}

fn mockgen(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mockgen"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("run mockgen")
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn stage_fixtures(dir: &Path) {
    for name in ["thing.model.json", "manifest.json"] {
        std::fs::copy(fixture(name), dir.join(name)).expect("copy fixture");
    }
}

#[test]
fn generate_writes_the_golden_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    stage_fixtures(tmp.path());

    let out = mockgen(
        &[
            "generate",
            "--model",
            "thing.model.json",
            "--package",
            "mocks",
            "--source",
            "thing.go",
            "--out",
            "mocks/mock_thing_test.go",
        ],
        tmp.path(),
    );
    assert!(out.status.success(), "{}", stderr(&out));

    let written =
        std::fs::read_to_string(tmp.path().join("mocks/mock_thing_test.go")).expect("read output");
    assert_eq!(written, golden());
}

#[test]
fn generate_without_out_prints_to_stdout() {
    let tmp = tempfile::tempdir().expect("tempdir");
    stage_fixtures(tmp.path());

    let out = mockgen(
        &[
            "generate",
            "--model",
            "thing.model.json",
            "--package",
            "mocks",
            "--source",
            "thing.go",
        ],
        tmp.path(),
    );
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(String::from_utf8_lossy(&out.stdout), golden());
}

#[test]
fn check_mode_detects_stale_output_without_writing() {
    let tmp = tempfile::tempdir().expect("tempdir");
    stage_fixtures(tmp.path());
    let target = tmp.path().join("mock_thing_test.go");
    std::fs::write(&target, golden()).expect("seed output");

    let args = [
        "generate",
        "--model",
        "thing.model.json",
        "--package",
        "mocks",
        "--source",
        "thing.go",
        "--out",
        "mock_thing_test.go",
        "--check",
    ];
    let ok = mockgen(&args, tmp.path());
    assert!(ok.status.success(), "{}", stderr(&ok));

    std::fs::write(&target, "package stale\n").expect("overwrite output");
    let stale = mockgen(&args, tmp.path());
    assert!(!stale.status.success());
    assert!(stderr(&stale).contains("generated output differs"), "{}", stderr(&stale));
    assert_eq!(
        std::fs::read_to_string(&target).expect("read output"),
        "package stale\n"
    );
}

#[test]
fn batch_resolves_paths_against_the_manifest() {
    let tmp = tempfile::tempdir().expect("tempdir");
    stage_fixtures(tmp.path());
    let cwd = tempfile::tempdir().expect("cwd");
    let manifest = tmp.path().join("manifest.json");

    let out = mockgen(
        &["batch", "--manifest", manifest.to_str().expect("utf-8 path")],
        cwd.path(),
    );
    assert!(out.status.success(), "{}", stderr(&out));
    let written = std::fs::read_to_string(tmp.path().join("out/mock_thing_test.go"))
        .expect("read batch output");
    assert_eq!(written, golden());

    let check = mockgen(
        &[
            "batch",
            "--manifest",
            manifest.to_str().expect("utf-8 path"),
            "--check",
        ],
        cwd.path(),
    );
    assert!(check.status.success(), "{}", stderr(&check));
}

#[test]
fn batch_errors_name_the_failing_entry() {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        tmp.path().join("broken.model.json"),
        r#"{"schema_version":"mockgen.model@0.0.1","package":{"name":"x"}}"#,
    )
    .expect("write model");
    std::fs::write(
        tmp.path().join("manifest.json"),
        r#"{"schema_version":"mockgen.manifest@0.1.0","entries":[{"model":"broken.model.json","out":"x.go","package":"mocks"}]}"#,
    )
    .expect("write manifest");

    let out = mockgen(&["batch", "--manifest", "manifest.json"], tmp.path());
    assert!(!out.status.success());
    let err = stderr(&out);
    assert!(err.contains("manifest entry[0] broken.model.json"), "{err}");
    assert!(err.contains("MG0002"), "{err}");
    assert!(!tmp.path().join("x.go").exists());
}

#[test]
fn batch_rejects_unknown_manifest_versions() {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        tmp.path().join("manifest.json"),
        r#"{"schema_version":"mockgen.manifest@9.0.0","entries":[]}"#,
    )
    .expect("write manifest");

    let out = mockgen(&["batch", "--manifest", "manifest.json"], tmp.path());
    assert!(!out.status.success());
    assert!(
        stderr(&out).contains("manifest schema_version mismatch"),
        "{}",
        stderr(&out)
    );
}

#[test]
fn diagnostics_prints_the_catalog() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = mockgen(&["diagnostics"], tmp.path());
    assert!(out.status.success(), "{}", stderr(&out));
    let md = String::from_utf8_lossy(&out.stdout);
    assert!(md.starts_with("# mockgen diagnostics catalog"), "{md}");
    assert!(md.contains("| MG0121 | Validate |"), "{md}");
}
