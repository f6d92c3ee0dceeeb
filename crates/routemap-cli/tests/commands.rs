#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for the routemap commands using temporary files

use std::io::Write;
use std::path::Path;

use clap::Parser;
use pretty_assertions::assert_eq;
use routemap_buffer::CancellationToken;
use routemap_cli::{CliConfig, CliError, dump_file, encode_file, file_info, get_value, run};
use routemap_formats::{EncoderConfig, Value};
use tempfile::{NamedTempFile, TempDir};

fn write_input(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temporary input file");
    file.write_all(json.as_bytes())
        .expect("Failed to write JSON input");
    file
}

async fn run_args(args: &[&str]) -> String {
    let config = CliConfig::try_parse_from(args).expect("arguments should parse");
    config.validate().expect("configuration should be valid");
    let mut out = Vec::new();
    run(&config, &mut out).await.expect("command should succeed");
    String::from_utf8(out).expect("output should be UTF-8")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temporary path should be UTF-8")
}

#[tokio::test]
async fn encode_then_query() {
    let input = write_input(r#"{"a": 1, "ab": "two", "b": -3, "bytes": [1, 2, 3], "none": null}"#);
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("map.bin");

    let header = encode_file(
        input.path(),
        &output,
        EncoderConfig::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();
    assert_eq!(header.element_count, 5);

    assert_eq!(get_value(&output, b"a").await.unwrap(), Some(Value::UInt(1)));
    assert_eq!(get_value(&output, b"ab").await.unwrap(), Some(Value::from("two")));
    assert_eq!(get_value(&output, b"b").await.unwrap(), Some(Value::Int(-3)));
    assert_eq!(
        get_value(&output, b"bytes").await.unwrap(),
        Some(Value::Bytes(vec![1, 2, 3]))
    );
    assert_eq!(get_value(&output, b"none").await.unwrap(), Some(Value::Null));
    assert_eq!(get_value(&output, b"c").await.unwrap(), None);

    let mut pairs = dump_file(&output).await.unwrap();
    pairs.sort_by(|x, y| x.0.cmp(&y.0));
    let keys: Vec<&[u8]> = pairs.iter().map(|(k, _)| k.as_slice()).collect();
    assert_eq!(
        keys,
        vec![&b"a"[..], &b"ab"[..], &b"b"[..], &b"bytes"[..], &b"none"[..]]
    );

    let (info, total) = file_info(&output).await.unwrap();
    assert_eq!(info, header);
    assert_eq!(total as u64, std::fs::metadata(&output).unwrap().len());
}

#[tokio::test]
async fn cancelled_encode_leaves_no_output() {
    let input = write_input(r#"{"k": 1}"#);
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("map.bin");

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = encode_file(input.path(), &output, EncoderConfig::default(), &cancel).await;
    assert!(matches!(result, Err(CliError::Map(_))));
    assert!(!output.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn cancelled_encode_keeps_previous_output() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("map.bin");

    let first = write_input(r#"{"k": 1}"#);
    encode_file(
        first.path(),
        &output,
        EncoderConfig::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();
    let before = std::fs::read(&output).unwrap();

    let second = write_input(r#"{"k": 2, "other": 3}"#);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = encode_file(second.path(), &output, EncoderConfig::default(), &cancel).await;
    assert!(result.is_err());

    assert_eq!(std::fs::read(&output).unwrap(), before);
    assert_eq!(get_value(&output, b"k").await.unwrap(), Some(Value::UInt(1)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn invalid_json_is_reported() {
    let input = write_input("[1, 2]");
    let dir = TempDir::new().unwrap();
    let result = encode_file(
        input.path(),
        &dir.path().join("map.bin"),
        EncoderConfig::default(),
        &CancellationToken::new(),
    )
    .await;
    assert!(matches!(result, Err(CliError::InvalidJson(_))));
}

#[tokio::test]
async fn command_output() {
    let input = write_input(r#"{"alpha": 10, "beta": "x"}"#);
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("map.bin");
    let output = path_str(&output);

    let text = run_args(&[
        "routemap",
        "--buffer-mode",
        "shared",
        "encode",
        path_str(input.path()),
        output,
    ])
    .await;
    assert!(text.starts_with("encoded 2 keys"));

    assert_eq!(run_args(&["routemap", "get", output, "alpha"]).await, "10\n");
    assert_eq!(
        run_args(&["routemap", "get", output, "0x62657461", "--hex"]).await,
        "\"x\"\n"
    );
    assert_eq!(
        run_args(&["routemap", "get", output, "gamma"]).await,
        "key gamma not found\n"
    );

    let dump = run_args(&["routemap", "dump", output]).await;
    let mut lines: Vec<&str> = dump.lines().collect();
    lines.sort_unstable();
    assert_eq!(lines, vec!["alpha\t10", "beta\t\"x\""]);

    let json = run_args(&["routemap", "dump", output, "--json"]).await;
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["alpha"], 10);

    let info = run_args(&["routemap", "info", output]).await;
    assert!(info.contains("elements:    2"));
    assert!(info.contains("max depth:   1"));
}
