use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn html_builder() -> Command {
  Command::cargo_bin("html-builder").unwrap()
}

#[test]
fn missing_input_prints_usage() {
  html_builder()
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("Please provide an html file"))
    .stderr(predicate::str::contains("Usage"));
}

#[test]
fn missing_config_prints_usage() {
  let dir = tempdir().unwrap();
  fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

  html_builder()
    .arg(dir.path().join("index.html"))
    .assert()
    .code(1)
    .stderr(predicate::str::contains("builder config file not found"))
    .stderr(predicate::str::contains("Usage"));
}

#[test]
fn missing_entry_file_fails() {
  let dir = tempdir().unwrap();

  html_builder()
    .arg("--input")
    .arg(dir.path().join("missing.html"))
    .assert()
    .code(1)
    .stderr(predicate::str::contains("entry html file not found"));
}

#[test]
fn unsupported_merge_destination_is_reported() {
  let dir = tempdir().unwrap();
  fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
  fs::write(
    dir.path().join("builder_config.json"),
    r#"{"merge": {"bundle.txt": ["a.txt"]}}"#,
  )
  .unwrap();

  html_builder()
    .arg(dir.path().join("index.html"))
    .assert()
    .code(1)
    .stderr(predicate::str::contains("bundle.txt"));
  assert!(!dir.path().join("build").exists());
}

#[test]
fn builds_site_with_real_minifiers() {
  let dir = tempdir().unwrap();
  let root = dir.path();
  fs::create_dir_all(root.join("js")).unwrap();
  fs::create_dir_all(root.join("css")).unwrap();
  fs::write(
    root.join("index.html"),
    "<html>\n<head>\n<link rel=\"stylesheet\" href=\"css/site.css\">\n</head>\n<body>\n<script src=\"js/a.js\"></script>\n<script src=\"js/b.js\"></script>\n</body>\n</html>\n",
  )
  .unwrap();
  fs::write(root.join("js/a.js"), "function first() {\n  return 1;\n}\n").unwrap();
  fs::write(root.join("js/b.js"), "function second() {\n  return first() + 1;\n}\n").unwrap();
  fs::write(root.join("css/site.css"), "body {\n  margin: 0px;\n}\n").unwrap();
  fs::write(root.join("settings.json"), r#"{"merge": {"js/app.js": ["js/*"]}, "minify": "css"}"#).unwrap();

  html_builder()
    .arg("-c")
    .arg(root.join("settings.json"))
    .arg(root.join("index.html"))
    .assert()
    .success();

  let build = root.join("build");
  let html = fs::read_to_string(build.join("index.html")).unwrap();
  assert!(html.contains(r#"<script type="text/javascript" src="js/app.js"></script>"#));
  assert!(html.contains(r#"href="css/site.min.css""#));
  assert_eq!(html.matches("<script").count(), 1);

  let bundle = fs::read_to_string(build.join("js/app.js")).unwrap();
  assert!(bundle.contains("first"));
  assert!(bundle.contains("second"));
  assert!(build.join("css/site.min.css").exists());
  assert!(!build.join("settings.json").exists());
}
