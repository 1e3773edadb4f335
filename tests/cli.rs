use assert_cmd::Command;
use mockito::{Matcher, Server};
use predicates::str::{contains, starts_with};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct TestEnv {
    tmp: TempDir,
    store: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let store = tmp.path().join("cfg").join("auth.json");
        Self { tmp, store }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("solutions_search_cli").unwrap();
        cmd.env("HOME", self.tmp.path())
            .env("XDG_CONFIG_HOME", self.tmp.path().join("xdg"))
            .env_remove("AUTH_HEADER_SOLUTIONS")
            .env_remove("SOLUTIONS_SEARCH_URL")
            .arg(format!("--store={}", self.store.display()));
        cmd
    }

    fn saved_cookie(&self) -> String {
        let raw = fs::read_to_string(&self.store).expect("read store");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        value["cookie"].as_str().expect("cookie field").to_string()
    }
}

#[test]
fn help_exits_zero() {
    TestEnv::new()
        .cmd()
        .args(["-h", "--logout"])
        .assert()
        .success()
        .stdout(contains("Auth resolution order"));
}

#[test]
fn no_terms_prints_usage_and_exits_two() {
    TestEnv::new()
        .cmd()
        .assert()
        .code(2)
        .stdout(contains("--login"));
}

#[test]
fn missing_credential_is_fatal() {
    TestEnv::new()
        .cmd()
        .arg("1234")
        .assert()
        .code(1)
        .stderr(contains("No auth cookie found. Run:"))
        .stderr(contains("--login"));
}

#[test]
fn login_reads_piped_cookie() {
    let env = TestEnv::new();
    env.cmd()
        .arg("--login")
        .write_stdin("  JSESSIONID=abc; lang=en \n")
        .assert()
        .success()
        .stdout(starts_with("Saved auth cookie to:"));
    assert_eq!(env.saved_cookie(), "JSESSIONID=abc; lang=en");
}

#[test]
fn login_rejects_empty_cookie() {
    let env = TestEnv::new();
    env.cmd()
        .arg("--login")
        .write_stdin("\n")
        .assert()
        .code(1)
        .stderr(contains("empty cookie"));
    assert!(!env.store.exists());
}

#[test]
fn logout_deletes_store() {
    let env = TestEnv::new();
    env.cmd().arg("--login").write_stdin("a=1\n").assert().success();
    env.cmd()
        .arg("--logout")
        .assert()
        .success()
        .stdout(contains("Deleted:"));
    assert!(!env.store.exists());

    env.cmd().arg("--logout").assert().code(1).stderr(contains("logout"));
}

#[test]
fn search_prints_table_and_saves_session() {
    let env = TestEnv::new();
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/user/quickSearch")
        .match_header("cookie", Matcher::Regex("JSESSIONID=from-env".into()))
        .match_body(Matcher::Json(json!({
            "serviceProviderId": 1,
            "searchKey": "#1234",
            "start": 0
        })))
        .with_status(200)
        .with_header("set-cookie", "JSESSIONID=rotated; Path=/")
        .with_body(
            json!({
                "data": [{
                    "userId": 42,
                    "phoneNumber": "555",
                    "fullName": "Jo",
                    "countryId": null,
                    "companyId": 9,
                    "email": "jo@example.com",
                    "companyName": "Acme"
                }]
            })
            .to_string(),
        )
        .create();

    let expected = format!(
        "{:<14}{:<10}{:<24}{:<4}{:<6}{:<54}{:<32}\n",
        "555", "42", "Jo", "-", "9", "jo@example.com", "Acme"
    );
    env.cmd()
        .env("SOLUTIONS_SEARCH_URL", format!("{}/user/quickSearch", server.url()))
        .env("AUTH_HEADER_SOLUTIONS", "JSESSIONID=from-env")
        .arg("+1234")
        .assert()
        .success()
        .stdout(expected);
    mock.assert();
    assert_eq!(env.saved_cookie(), "JSESSIONID=rotated");
}

#[test]
fn auth_flag_with_save_persists_and_ids_only() {
    let env = TestEnv::new();
    let mut server = Server::new();
    server
        .mock("POST", "/user/quickSearch")
        .match_header("cookie", Matcher::Regex("JSESSIONID=flag".into()))
        .match_body(Matcher::PartialJson(json!({ "searchKey": "971500000000" })))
        .with_status(200)
        .with_body(r#"{"data":[{"userId":7},{"userId":8}]}"#)
        .create();
    server
        .mock("POST", "/user/quickSearch")
        .match_body(Matcher::PartialJson(json!({ "searchKey": "#bad" })))
        .with_status(403)
        .create();

    env.cmd()
        .env("SOLUTIONS_SEARCH_URL", format!("{}/user/quickSearch", server.url()))
        .env("AUTH_HEADER_SOLUTIONS", "JSESSIONID=env")
        .args(["-u", "--auth=JSESSIONID=flag", "--save", "bad", "971500000000"])
        .assert()
        .success()
        .stdout("7\n8\n")
        .stderr(contains("auth failed (403)"));
    assert_eq!(env.saved_cookie(), "JSESSIONID=flag");
}

#[test]
fn invalid_endpoint_is_fatal() {
    TestEnv::new()
        .cmd()
        .env("SOLUTIONS_SEARCH_URL", "not a url")
        .env("AUTH_HEADER_SOLUTIONS", "a=1")
        .arg("1234")
        .assert()
        .code(1)
        .stderr(contains("Invalid endpoint URL"));
}
