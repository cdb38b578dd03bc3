pub mod config_cmd;
pub mod dump;
pub mod header;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use gguf_parser::DecodeOptions;
use tokio::io::AsyncReadExt;

#[derive(Parser)]
#[command(
    name = "gguf-inspect",
    version,
    about = "Inspect GGUF headers and metadata tables"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Args, Clone)]
pub struct GlobalArgs {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Bytes read from the front of each file (overrides config).
    #[arg(long, global = true, env = "GGUF_INSPECT_SCAN_LIMIT")]
    pub scan_limit: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the container header of a GGUF file.
    Header(HeaderArgs),

    /// Decode and print the metadata table.
    Dump(DumpArgs),

    /// View / edit configuration.
    Config(ConfigArgs),
}

//  Subcommand argument structs

#[derive(Debug, clap::Args, Clone)]
pub struct HeaderArgs {
    /// Path to the GGUF file.
    pub path: PathBuf,
}

#[derive(Debug, clap::Args, Clone)]
pub struct DumpArgs {
    /// Path to the GGUF file.
    pub path: PathBuf,

    /// Array elements shown per array (the rest are skipped).
    #[arg(long)]
    pub max_elements: Option<usize>,

    /// Longest accepted key, in bytes.
    #[arg(long)]
    pub max_key_len: Option<usize>,

    /// Deepest accepted array nesting.
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Decode at most this many entries.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Stop at the first corrupt entry instead of skipping it.
    #[arg(long)]
    pub strict: bool,

    /// Print the first 64 bytes of the metadata section.
    #[arg(long)]
    pub hexdump: bool,

    /// Print the decoded result as JSON.
    #[arg(long)]
    pub json: bool,
}

impl DumpArgs {
    /// Flags layered over the configured defaults.
    pub fn decode_options(&self, base: &DecodeOptions) -> DecodeOptions {
        DecodeOptions {
            max_elements_per_array: self.max_elements.unwrap_or(base.max_elements_per_array),
            max_key_string_len: self.max_key_len.unwrap_or(base.max_key_string_len),
            max_entries: self.limit.or(base.max_entries),
            strict: self.strict || base.strict,
            max_nesting_depth: self.max_depth.unwrap_or(base.max_nesting_depth),
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Display the current configuration.
    Show,
    /// Set a configuration value.
    Set { key: String, value: String },
}

//  File access

/// Front of a file, capped at `limit` bytes.
pub struct Source {
    pub bytes: Vec<u8>,
    pub file_size: u64,
}

impl Source {
    /// Whether the scan window ended before the file did.
    pub fn is_windowed(&self) -> bool {
        (self.bytes.len() as u64) < self.file_size
    }
}

pub async fn read_source(path: &Path, limit: u64) -> anyhow::Result<Source> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;
    let file_size = file.metadata().await?.len();

    let mut bytes = Vec::with_capacity(file_size.min(limit) as usize);
    file.take(limit).read_to_end(&mut bytes).await?;
    Ok(Source { bytes, file_size })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn dump_flags_override_config() {
        let cli = Cli::try_parse_from([
            "gguf-inspect",
            "dump",
            "model.gguf",
            "--max-elements",
            "3",
            "--limit",
            "7",
            "--strict",
        ])
        .unwrap();
        let Commands::Dump(args) = cli.command else {
            panic!("expected dump");
        };
        let base = DecodeOptions {
            max_key_string_len: 64,
            ..Default::default()
        };
        let opts = args.decode_options(&base);
        assert_eq!(opts.max_elements_per_array, 3);
        assert_eq!(opts.max_entries, Some(7));
        assert!(opts.strict);
        assert_eq!(opts.max_key_string_len, 64);
        assert_eq!(opts.max_nesting_depth, 16);
    }

    #[test]
    fn read_source_caps_at_limit() {
        let path = std::env::temp_dir().join(format!("gguf-inspect-{}.bin", std::process::id()));
        std::fs::write(&path, [7u8; 100]).unwrap();

        let rt = tokio::runtime::Runtime::new().unwrap();
        let src = rt.block_on(read_source(&path, 40)).unwrap();
        assert_eq!(src.bytes.len(), 40);
        assert_eq!(src.file_size, 100);
        assert!(src.is_windowed());

        let whole = rt.block_on(read_source(&path, 1000)).unwrap();
        assert_eq!(whole.bytes.len(), 100);
        assert!(!whole.is_windowed());

        std::fs::remove_file(&path).unwrap();
    }
}
