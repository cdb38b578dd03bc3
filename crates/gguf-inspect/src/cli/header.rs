use serde::Serialize;
use tracing::debug;

use crate::cli::{HeaderArgs, read_source};

/// Upper bound on the encoded header size.
const HEADER_WINDOW: u64 = 28;

#[derive(Serialize)]
struct HeaderReport {
    #[serde(flatten)]
    header: gguf_parser::Header,
    metadata_offset: usize,
    file_size: u64,
}

pub async fn execute(args: HeaderArgs) -> anyhow::Result<()> {
    let source = read_source(&args.path, HEADER_WINDOW).await?;
    let header = gguf_parser::decode_header(&source.bytes)
        .map_err(|e| anyhow::anyhow!("{}: {e}", args.path.display()))?;
    debug!(path = %args.path.display(), version = header.version, "header decoded");

    let report = HeaderReport {
        header,
        metadata_offset: header.encoded_len(),
        file_size: source.file_size,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
