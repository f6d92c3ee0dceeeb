//! Subcommand implementations.
//!
//! Every command writes its human-readable output to the supplied writer
//! so the binary can print to stdout while tests capture a buffer.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use routemap_buffer::{CancellationToken, SegmentWriter};
use routemap_formats::{
    EncoderConfig, MapEncoder, MapError, MapHeader, RouteMap, Value, decode_map, lookup,
};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::{CliConfig, Command};
use crate::error::{CliError, CliResult};

/// Render a key as text when it is printable UTF-8, otherwise as hex.
///
/// Text keys starting with `0x` are rendered as hex too, so every
/// `0x`-prefixed rendering decodes back to exactly one key.
pub fn display_key(key: &[u8]) -> String {
    match std::str::from_utf8(key) {
        Ok(text) if !text.starts_with("0x") && !text.chars().any(char::is_control) => {
            text.to_string()
        }
        _ => format!("0x{}", hex::encode(key)),
    }
}

/// Decode a key argument
pub fn parse_key(key: &str, is_hex: bool) -> CliResult<Vec<u8>> {
    if !is_hex {
        return Ok(key.as_bytes().to_vec());
    }
    let digits = key.strip_prefix("0x").unwrap_or(key);
    hex::decode(digits).map_err(|e| CliError::InvalidKey(key.to_string(), e.to_string()))
}

async fn read_file(path: &Path) -> CliResult<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| CliError::io(path, e))
}

fn temp_path_for(output: &Path) -> PathBuf {
    let mut name = output.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    output.with_file_name(name)
}

/// Encode the JSON object in `input` into a route map at `output`.
///
/// The encoded buffer is streamed to a temporary sibling file segment by
/// segment and renamed to `output` once complete; `cancel` is honoured
/// between segments. On error `output` is left untouched.
pub async fn encode_file(
    input: &Path,
    output: &Path,
    config: EncoderConfig,
    cancel: &CancellationToken,
) -> CliResult<MapHeader> {
    let text = read_file(input).await?;
    let object: BTreeMap<String, Value> = serde_json::from_slice(&text)?;
    let pairs: Vec<(String, Value)> = object.into_iter().collect();
    debug!(keys = pairs.len(), input = %input.display(), "loaded input");

    let encoder = MapEncoder::<Value>::new()?.with_config(config);
    let mut writer = SegmentWriter::with_mode(config.mode, config.buffer);
    let header = encoder.encode_with_writer(&pairs, &mut writer)?;

    // Stream into a sibling file and move it into place only when complete
    let temp_path = temp_path_for(output);
    let write_result = async {
        let mut file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| CliError::io(&temp_path, e))?;
        writer
            .copy_to_async(&mut file, cancel)
            .await
            .map_err(MapError::from)?;
        file.flush().await.map_err(|e| CliError::io(&temp_path, e))?;
        drop(file);

        tokio::fs::rename(&temp_path, output)
            .await
            .map_err(|e| CliError::io(output, e))
    }
    .await;

    if write_result.is_err() {
        let _ = tokio::fs::remove_file(&temp_path).await;
    }
    write_result?;

    info!(
        keys = header.element_count,
        segments = writer.segment_count(),
        output = %output.display(),
        "wrote route map"
    );
    Ok(header)
}

/// Look up `key` in the route map at `path`
pub async fn get_value(path: &Path, key: &[u8]) -> CliResult<Option<Value>> {
    let bytes = read_file(path).await?;
    Ok(lookup::<Value>(&bytes, key)?)
}

/// Decode every pair in the route map at `path`
pub async fn dump_file(path: &Path) -> CliResult<Vec<(Vec<u8>, Value)>> {
    let bytes = read_file(path).await?;
    Ok(decode_map::<Value>(&bytes)?)
}

/// Header and total size of the route map at `path`
pub async fn file_info(path: &Path) -> CliResult<(MapHeader, usize)> {
    let bytes = read_file(path).await?;
    let map = RouteMap::parse(&bytes)?;
    Ok((*map.header(), map.encoded_len()))
}

fn write_out<W: Write>(out: &mut W, line: std::fmt::Arguments<'_>) -> CliResult<()> {
    out.write_fmt(line)
        .and_then(|()| out.write_all(b"\n"))
        .map_err(|e| CliError::io("<output>", e))
}

/// Run the configured command
pub async fn run<W: Write>(config: &CliConfig, out: &mut W) -> CliResult<()> {
    match &config.command {
        Command::Encode { input, output } => {
            let cancel = CancellationToken::new();
            let watcher = {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        cancel.cancel();
                    }
                })
            };
            let result = encode_file(input, output, config.encoder_config(), &cancel).await;
            watcher.abort();
            let header = result?;

            write_out(
                out,
                format_args!(
                    "encoded {} keys ({} route bytes, {} data bytes) into {}",
                    header.element_count,
                    header.meta_length,
                    header.data_length,
                    output.display()
                ),
            )
        }
        Command::Get { file, key, hex } => {
            let key_bytes = parse_key(key, *hex)?;
            match get_value(file, &key_bytes).await? {
                Some(value) => write_out(out, format_args!("{value}")),
                None => write_out(out, format_args!("key {} not found", display_key(&key_bytes))),
            }
        }
        Command::Dump { file, json } => {
            let pairs = dump_file(file).await?;
            if *json {
                let object: BTreeMap<String, Value> = pairs
                    .into_iter()
                    .map(|(key, value)| (display_key(&key), value))
                    .collect();
                let text = serde_json::to_string_pretty(&object)?;
                write_out(out, format_args!("{text}"))
            } else {
                for (key, value) in pairs {
                    write_out(out, format_args!("{}\t{value}", display_key(&key)))?;
                }
                Ok(())
            }
        }
        Command::Info { file } => {
            let (header, total) = file_info(file).await?;
            write_out(out, format_args!("elements:    {}", header.element_count))?;
            write_out(out, format_args!("max depth:   {}", header.max_depth))?;
            write_out(out, format_args!("route bytes: {}", header.meta_length))?;
            write_out(out, format_args!("data bytes:  {}", header.data_length))?;
            write_out(out, format_args!("total bytes: {total}"))
        }
    }
}
