use std::fmt::Write;
use std::path::Path;

use gguf_parser::{ByteCursor, DecodedFile, EntryError, TracingSink};
use serde::Serialize;
use tracing::info;

use crate::cli::{DumpArgs, GlobalArgs, Source, read_source};
use crate::config::AppConfig;

/// Bytes shown by `--hexdump`.
const PEEK_LEN: usize = 64;

#[derive(Serialize)]
struct DumpReport<'a> {
    file_path: &'a Path,
    file_size: u64,
    bytes_read: usize,
    #[serde(flatten)]
    decoded: &'a DecodedFile,
    skipped: Vec<ErrorReport>,
    error: Option<ErrorReport>,
}

#[derive(Serialize)]
struct ErrorReport {
    index: u64,
    offset: usize,
    key: Option<String>,
    message: String,
}

impl From<&EntryError> for ErrorReport {
    fn from(e: &EntryError) -> Self {
        Self {
            index: e.index,
            offset: e.offset,
            key: e.key.clone(),
            message: e.error.to_string(),
        }
    }
}

pub async fn execute(global: GlobalArgs, args: DumpArgs) -> anyhow::Result<()> {
    let cfg = AppConfig::load_or_default()?;
    let opts = args.decode_options(&cfg.decode);
    let scan_limit = global.scan_limit.unwrap_or(cfg.scan_limit_bytes);

    info!(path = %args.path.display(), scan_limit, "reading GGUF file");
    let source = read_source(&args.path, scan_limit).await?;
    let decoded = gguf_parser::decode_file(&source.bytes, &opts, &mut TracingSink)
        .map_err(|e| anyhow::anyhow!("{}: {e}", args.path.display()))?;

    if args.json {
        let report = DumpReport {
            file_path: &args.path,
            file_size: source.file_size,
            bytes_read: source.bytes.len(),
            decoded: &decoded,
            skipped: decoded.metadata.skipped.iter().map(ErrorReport::from).collect(),
            error: decoded.error.as_ref().map(ErrorReport::from),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&args.path, &source, &decoded, args.hexdump));
    }
    Ok(())
}

/// Human-readable listing of a decoded file.
fn render(path: &Path, source: &Source, decoded: &DecodedFile, hexdump: bool) -> String {
    let mut out = String::new();
    let h = &decoded.header;

    let _ = writeln!(out, "Reading GGUF file: {} ({})", path.display(), human_size(source.file_size));
    let _ = writeln!(out, "GGUF version: {}", h.version);
    let _ = writeln!(out, "Tensor count: {}", h.tensor_count);
    let _ = writeln!(out, "Metadata count: {}", h.metadata_count);
    if let Some(alignment) = h.alignment {
        let _ = writeln!(out, "Alignment: {alignment}");
    }
    let _ = writeln!(out, "Metadata starts at offset {}", h.encoded_len());

    if hexdump {
        let peek = ByteCursor::with_position(&source.bytes, h.encoded_len()).peek(PEEK_LEN);
        let hex: Vec<String> = peek.iter().map(|b| format!("{b:02x}")).collect();
        let _ = writeln!(out, "\nFirst {} bytes of metadata (hex):", peek.len());
        let _ = writeln!(out, "{}", hex.join(" "));
        let _ = writeln!(out, "First {} bytes of metadata (escaped):", peek.len());
        let _ = writeln!(out, "{}", peek.escape_ascii());
    }

    let _ = writeln!(out, "\nMetadata:");
    for entry in &decoded.metadata {
        let _ = writeln!(out, "  {}: {}", entry.key, entry.value);
    }

    if !decoded.metadata.skipped.is_empty() {
        let _ = writeln!(out, "\nSkipped entries:");
        for e in &decoded.metadata.skipped {
            let _ = writeln!(out, "  {e}");
        }
    }

    let _ = writeln!(out, "\nTokenizer-related metadata:");
    for entry in decoded.metadata.tokenizer_entries() {
        let _ = writeln!(out, "  {}: {}", entry.key, entry.value);
    }

    if let Some(err) = &decoded.error {
        let _ = writeln!(out, "\nDecoding stopped: {err}");
        if let Some(key) = &err.key {
            let _ = writeln!(out, "  while reading key {key:?}");
        }
        if source.is_windowed() && matches!(err.error.root(), gguf_parser::DecodeError::UnexpectedEof { .. }) {
            let _ = writeln!(
                out,
                "  only the first {} of the file were read; raise --scan-limit",
                human_size(source.bytes.len() as u64)
            );
        }
    }
    let _ = writeln!(out, "\nMetadata ends at offset {}", decoded.metadata.end_offset);
    out
}

fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    for &unit in UNITS {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} PiB")
}
