//! Integration tests for the metahead binary.
//!
//! Every command runs in an isolated directory with HOME and
//! XDG_CONFIG_HOME pointed at it, so no user configuration leaks in.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = r#"
[[route]]
pattern = "^/products/[0-9]+/$"
view = "product_detail"

[[definition]]
name = "Coverage"
verbose_name = "Basic metadata"
use_cache = true
seo_models = ["page"]

[definition.groups]
advanced = ["raw1", "raw2"]

[[definition.field]]
key = "title"
kind = "tag"
head = true
max_length = 68

[[definition.field]]
key = "description"
kind = "meta_tag"

[[definition.field]]
key = "raw1"
kind = "raw"

[[definition.field]]
key = "raw2"
kind = "raw"
head = false

[[definition.field]]
key = "og_title"
kind = "meta_tag"
name = "og:title"
editable = false
populate_from = { field = "title" }
"#;

const RECORDS: &str = r#"[
  {
    "definition": "Coverage",
    "backend": "path",
    "path": "/about/",
    "values": {
      "title": "About us",
      "description": "Who we are",
      "raw1": "<title>Raw 1</title>",
      "raw2": "<title>Raw 1</title>"
    }
  },
  {
    "definition": "Coverage",
    "backend": "view",
    "view_name": "product_detail",
    "values": { "title": "{{ shop }} product" }
  },
  {
    "definition": "Coverage",
    "backend": "path",
    "path": "/",
    "site": 2,
    "values": { "title": "Second site" }
  }
]"#;

/// Isolated working directory with config and record fixtures.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        fs::write(dir.path().join("site.toml"), CONFIG).unwrap();
        fs::write(dir.path().join("records.json"), RECORDS).unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// A metahead command running inside the workspace.
    fn metahead(&self) -> Command {
        let mut cmd = Command::cargo_bin("metahead").unwrap();
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join("xdg"))
            .env_remove("METAHEAD_CONFIG")
            .env_remove("RUST_LOG");
        cmd
    }

    /// `metahead --config site.toml <args> --records records.json`
    fn resolve(&self, args: &[&str]) -> Command {
        let mut cmd = self.metahead();
        cmd.arg("--config")
            .arg(self.file("site.toml"))
            .arg("resolve")
            .args(args)
            .arg("--records")
            .arg(self.file("records.json"));
        cmd
    }
}

#[test]
fn version_flag_works() {
    Workspace::new()
        .metahead()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("metahead"));
}

#[test]
fn check_lists_definitions_and_schemas() {
    let ws = Workspace::new();
    ws.metahead()
        .arg("--config")
        .arg(ws.file("site.toml"))
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Definition: Coverage (Basic metadata)"))
        .stdout(predicate::str::contains("coverage_path (Basic metadata (Path))"))
        .stdout(predicate::str::contains("og_title"))
        .stdout(predicate::str::contains("1 definition(s) OK"));
}

#[test]
fn check_without_config_uses_the_default_definition() {
    Workspace::new()
        .metahead()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Config: (defaults)"))
        .stdout(predicate::str::contains("Definition: DefaultMetadata"));
}

#[test]
fn check_finds_local_config() {
    let ws = Workspace::new();
    fs::copy(ws.file("site.toml"), ws.file("metahead.toml")).unwrap();
    ws.metahead()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Definition: Coverage"));
}

#[test]
fn check_reports_configuration_errors() {
    let ws = Workspace::new();
    fs::write(
        ws.file("bad.toml"),
        r#"
        [[definition]]
        name = "Broken"
        [definition.groups]
        title = ["title"]
        [[definition.field]]
        key = "title"
        kind = "tag"
        "#,
    )
    .unwrap();
    ws.metahead()
        .arg("--config")
        .arg(ws.file("bad.toml"))
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("clashes with a field name"));
}

#[test]
fn resolve_prints_the_head_block() {
    Workspace::new()
        .resolve(&["/about/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<title>About us</title>"))
        .stdout(predicate::str::contains(
            "<meta name=\"description\" content=\"Who we are\" />",
        ))
        .stdout(predicate::str::contains(
            "<meta name=\"og:title\" content=\"About us\" />",
        ));
}

#[test]
fn resolve_prints_one_field() {
    Workspace::new()
        .resolve(&["/about/", "--field", "title"])
        .assert()
        .success()
        .stdout("<title>About us</title>\n");
}

#[test]
fn resolve_prints_one_group() {
    Workspace::new()
        .resolve(&["/about/", "--group", "advanced"])
        .assert()
        .success()
        .stdout("<title>Raw 1</title>\n<title>Raw 1</title>\n");
}

#[test]
fn resolve_prints_json_values() {
    Workspace::new()
        .resolve(&["/about/", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"About us\""))
        .stdout(predicate::str::contains("\"og_title\": \"About us\""));
}

#[test]
fn resolve_rejects_unknown_fields() {
    Workspace::new()
        .resolve(&["/about/", "--field", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a field or group"));
}

#[test]
fn resolve_uses_routes_and_context() {
    let ws = Workspace::new();
    fs::write(ws.file("context.json"), r#"{ "shop": "Acme" }"#).unwrap();
    let context = ws.file("context.json");
    ws.resolve(&["/products/7/", "--field", "title", "--context", context.to_str().unwrap()])
        .assert()
        .success()
        .stdout("<title>Acme product</title>\n");
}

#[test]
fn resolve_ignores_sites_when_disabled() {
    // The definition does not use sites, so the site column of the record
    // at "/" plays no part in matching.
    Workspace::new()
        .resolve(&["/", "--field", "title", "--site", "7", "--domain", "seven.example"])
        .assert()
        .success()
        .stdout("<title>Second site</title>\n");
}

#[test]
fn resolve_requires_a_domain_with_a_site() {
    Workspace::new()
        .resolve(&["/", "--site", "2"])
        .assert()
        .failure();
}

#[test]
fn inject_inserts_after_head() {
    let ws = Workspace::new();
    fs::write(
        ws.file("page.html"),
        "<html><head><link rel=\"icon\"></head><body>Hi</body></html>",
    )
    .unwrap();
    ws.metahead()
        .arg("--config")
        .arg(ws.file("site.toml"))
        .arg("inject")
        .arg(ws.file("page.html"))
        .arg("/about/")
        .arg("--records")
        .arg(ws.file("records.json"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "<html><head>\n<title>About us</title>",
        ))
        .stdout(predicate::str::ends_with("<link rel=\"icon\"></head><body>Hi</body></html>"));
}

#[test]
fn inject_leaves_documents_without_head_alone() {
    let ws = Workspace::new();
    fs::write(ws.file("fragment.html"), "<p>fragment</p>").unwrap();
    ws.metahead()
        .arg("inject")
        .arg(ws.file("fragment.html"))
        .arg("/")
        .assert()
        .success()
        .stdout("<p>fragment</p>");
}

#[test]
fn invalid_records_are_reported() {
    let ws = Workspace::new();
    fs::write(ws.file("broken.json"), "{ not json").unwrap();
    ws.metahead()
        .arg("resolve")
        .arg("/")
        .arg("--records")
        .arg(ws.file("broken.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid records"));
}
