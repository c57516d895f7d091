use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn webpub() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("webpub");
    cmd.env_remove("NODE_ENV")
        .env_remove("npm_package_name")
        .env("RUST_LOG", "warn");
    cmd
}

/// Bundler stand-in: emits two templates and a script into `build/`, then
/// prints webpack-style stats.
const BUNDLER_SCRIPT: &str = r#"
[ "$1" = "--config" ] || exit 9
mkdir -p build/board build/js
echo '<h1>home</h1>' > build/index.html
echo '<h1>topic</h1>' > build/board/topic.html
echo 'app()' > build/js/app.js
echo '{"hash":"f00d","time":1500,"builtAt":90000,"errors":[],"warnings":[]}'
"#;

/// Deployer stand-in: records the request and reports success.
const PUBLISH_SCRIPT: &str = r#"
cat > publish-request.json
echo '{"code":0,"uploaded":1}'
"#;

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn project(bundler: &str, publisher: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write(
        &root.join("webpub.toml"),
        &format!(
            "[bundler]\nprogram = \"sh\"\nargs = [\"-c\", '''{bundler}''', \"sh\"]\n\n\
             [publish]\nprogram = \"sh\"\nargs = [\"-c\", '''{publisher}''']\nimagemin = false\n"
        ),
    );
    for env in ["development", "production"] {
        write(
            &root.join(format!("config/webpack.config.{env}.json")),
            r#"{"mode":"production","output":{"path":"build","publicPath":"https://cdn.example.com/bbs/"}}"#,
        );
    }
    write(
        &root.join("process.json"),
        r#"{"apps":[{"name":"web","script":"server/index.js"},{"name":"myapp-worker"}]}"#,
    );
    write(&root.join("package.json"), r#"{"name":"myapp"}"#);
    write(&root.join("server/views/stale.html"), "stale");
    tmp
}

// ── Help / Version ──

#[test]
fn shows_help() {
    webpub()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("publish its static assets"));
}

#[test]
fn shows_version() {
    webpub()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("webpub"));
}

// ── Compile ──

#[cfg(unix)]
#[test]
fn compile_production_builds_and_publishes() {
    let tmp = project(BUNDLER_SCRIPT, PUBLISH_SCRIPT);
    let root = tmp.path();

    webpub()
        .current_dir(root)
        .env("NODE_ENV", "production")
        .arg("compile")
        .assert()
        .success()
        .stdout(predicate::str::contains("start compiling..."))
        .stdout(predicate::str::contains("using production config"))
        .stdout(predicate::str::contains("bundler build success in 1.50 s"))
        .stdout(predicate::str::contains("publish success"))
        .stdout(predicate::str::contains("\"uploaded\": 1"))
        .stdout(predicate::str::contains("compile success in"));

    assert!(!root.join("server/views/stale.html").exists());
    assert!(root.join("server/views/index.html").exists());
    assert!(root.join("server/views/board/topic.html").exists());
    assert!(!root.join("build/index.html").exists());
    assert!(root.join("build/js/app.js").exists());

    let descriptor: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(root.join("process.json")).unwrap()).unwrap();
    assert_eq!(descriptor["apps"][0]["name"], "myapp-web");
    assert_eq!(descriptor["apps"][0]["script"], "server/index.js");
    assert_eq!(descriptor["apps"][1]["name"], "myapp-worker");

    let request: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(root.join("publish-request.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(request["env"], "production");
    assert_eq!(request["path"], "/bbs/");
    assert_eq!(request["imagemin"], false);
    assert!(request["cwd"].as_str().unwrap().ends_with("build"));
}

#[cfg(unix)]
#[test]
fn compile_development_skips_publish() {
    let tmp = project(BUNDLER_SCRIPT, "exit 7");

    webpub()
        .current_dir(tmp.path())
        .arg("compile")
        .assert()
        .success()
        .stdout(predicate::str::contains("using development config"))
        .stdout(predicate::str::contains("publishing").not());

    assert!(!tmp.path().join("publish-request.json").exists());
}

#[cfg(unix)]
#[test]
fn compile_prefers_package_name_from_env() {
    let tmp = project(BUNDLER_SCRIPT, PUBLISH_SCRIPT);

    webpub()
        .current_dir(tmp.path())
        .env("npm_package_name", "board")
        .arg("compile")
        .assert()
        .success();

    let content = std::fs::read_to_string(tmp.path().join("process.json")).unwrap();
    assert!(content.contains("\"board-web\""), "{content}");
    assert!(content.contains("\"board-myapp-worker\""), "{content}");
}

#[cfg(unix)]
#[test]
fn compile_staging_uses_test_config_and_keeps_raw_node_env() {
    let bundler = r#"echo "$NODE_ENV" > bundler-node-env.txt; echo '{"errors":[]}'"#;
    let tmp = project(bundler, PUBLISH_SCRIPT);
    write(
        &tmp.path().join("config/webpack.config.test.json"),
        r#"{"output":{"path":"build","publicPath":"/static/"}}"#,
    );

    webpub()
        .current_dir(tmp.path())
        .env("NODE_ENV", "staging")
        .arg("compile")
        .assert()
        .success()
        .stdout(predicate::str::contains("using test config"));

    let seen = std::fs::read_to_string(tmp.path().join("bundler-node-env.txt")).unwrap();
    assert_eq!(seen.trim(), "staging");

    let request: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(tmp.path().join("publish-request.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(request["env"], "test");
    assert_eq!(request["path"], "/static/");
}

#[cfg(unix)]
#[test]
fn compile_reports_bundler_errors() {
    let failing = r#"echo '{"errors":[{"message":"Unexpected token","moduleName":"./client/app.js"}]}'; exit 2"#;
    let tmp = project(failing, PUBLISH_SCRIPT);

    webpub()
        .current_dir(tmp.path())
        .env("NODE_ENV", "production")
        .arg("compile")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("ERROR in ./client/app.js"))
        .stderr(predicate::str::contains("compile failed while building"));

    assert!(!tmp.path().join("publish-request.json").exists());
}

#[cfg(unix)]
#[test]
fn compile_fails_when_publish_is_rejected() {
    let rejecting = r#"cat > /dev/null; echo '{"code":2,"error":"bucket not found"}'"#;
    let tmp = project(BUNDLER_SCRIPT, rejecting);

    webpub()
        .current_dir(tmp.path())
        .env("NODE_ENV", "production")
        .arg("compile")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("compile failed while publishing"))
        .stderr(predicate::str::contains("bucket not found"));
}

#[test]
fn compile_without_config_for_environment() {
    let tmp = project("exit 0", "exit 0");

    webpub()
        .current_dir(tmp.path())
        .env("NODE_ENV", "staging")
        .arg("compile")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no bundler configuration"))
        .stderr(predicate::str::contains("'test'"));

    // Nothing was touched
    assert!(tmp.path().join("server/views/stale.html").exists());
}

#[test]
fn compile_rejects_invalid_settings() {
    let tmp = project("exit 0", "exit 0");
    write(
        &tmp.path().join("webpub.toml"),
        "[templates]\nconcurrency = 0\n",
    );

    webpub()
        .current_dir(tmp.path())
        .arg("compile")
        .assert()
        .failure()
        .stderr(predicate::str::contains("concurrency"));
}

#[cfg(unix)]
#[test]
fn compile_accepts_root_flag() {
    let tmp = project(BUNDLER_SCRIPT, PUBLISH_SCRIPT);
    let elsewhere = TempDir::new().unwrap();

    webpub()
        .current_dir(elsewhere.path())
        .args(["compile", "--root"])
        .arg(tmp.path())
        .assert()
        .success();

    assert!(tmp.path().join("server/views/index.html").exists());
}

// ── Plan ──

#[test]
fn plan_previews_without_side_effects() {
    let tmp = project("exit 1", "exit 1");

    webpub()
        .current_dir(tmp.path())
        .env("NODE_ENV", "production")
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("Environment:  production"))
        .stdout(predicate::str::contains("web -> myapp-web"))
        .stdout(predicate::str::contains("  myapp-worker"))
        .stdout(predicate::str::contains("Publish:      /bbs/"));

    assert!(tmp.path().join("server/views/stale.html").exists());
    let content = std::fs::read_to_string(tmp.path().join("process.json")).unwrap();
    assert!(content.contains("\"web\""));
}

#[test]
fn plan_development_skips_publish() {
    let tmp = project("exit 1", "exit 1");

    webpub()
        .current_dir(tmp.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped (development does not publish)"));
}

#[test]
fn plan_requires_package_name() {
    let tmp = project("exit 1", "exit 1");
    std::fs::remove_file(tmp.path().join("package.json")).unwrap();

    webpub()
        .current_dir(tmp.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "package name unknown: set npm_package_name",
        ));
}
