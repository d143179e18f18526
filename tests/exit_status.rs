use std::path::Path;
use std::process::{Command, Output};

use wiremock::{Mock, MockServer, ResponseTemplate, matchers::any};

fn write_corpus(dir: &Path) {
    let data = dir.join("data");
    std::fs::create_dir(&data).unwrap();
    let body = serde_json::json!({
        "source": "faq",
        "documentTemplate": "Q: ${q}",
        "documents": [{"q": "hours"}]
    });
    std::fs::write(data.join("faq.json"), body.to_string()).unwrap();
}

/// Run the binary in `dir` with only the given variables set.
fn run_vecseed(dir: &Path, vars: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vecseed"));
    cmd.current_dir(dir)
        .env_clear()
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "info")
        .env("VECSEED_DATA_DIR", dir.join("data"));
    for (key, value) in vars {
        cmd.env(key, value);
    }
    cmd.output().unwrap()
}

fn combined(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn unreachable_index_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());

    let output = run_vecseed(
        dir.path(),
        &[
            ("OPENAI_API_KEY", "sk-test"),
            ("CHROMA_HOST", "127.0.0.1"),
            ("CHROMA_PORT", "1"),
        ],
    );

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    assert!(combined(&output).contains("reachability"));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_api_key_fails_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());

    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let port = server.address().port().to_string();

    let path = dir.path().to_path_buf();
    let output = tokio::task::spawn_blocking(move || {
        run_vecseed(
            &path,
            &[
                ("CHROMA_HOST", "127.0.0.1"),
                ("CHROMA_PORT", port.as_str()),
                ("OPENAI_BASE_URL", "http://127.0.0.1:1/v1"),
            ],
        )
    })
    .await
    .unwrap();

    assert!(!output.status.success());
    assert!(combined(&output).contains("OPENAI_API_KEY"));
    server.verify().await;
}

#[test]
fn invalid_env_value_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    write_corpus(dir.path());

    let output = run_vecseed(
        dir.path(),
        &[("OPENAI_API_KEY", "sk-test"), ("CHROMA_PORT", "not-a-port")],
    );

    assert!(!output.status.success());
    assert!(combined(&output).contains("CHROMA_PORT"));
}
