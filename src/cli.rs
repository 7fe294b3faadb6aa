use clap::{Parser, ValueEnum};

/// Store protocol to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// S3-compatible REST API (path-style URLs, Range header)
    S3,
    /// Blob-container REST API (x-ms-range header, SAS token in the endpoint)
    Blob,
}

#[derive(Parser, Debug)]
#[command(name = "rangefs")]
#[command(version)]
#[command(about = "Read remote S3 or blob-container objects like local files", long_about = None)]
#[command(after_help = "Examples:\n  \
  rangefs --endpoint http://127.0.0.1:9000 --bucket media clip.mp4 > clip.mp4\n  \
  rangefs --bucket media --offset -128 clip.mp4      print the last 128 bytes\n  \
  rangefs --backend blob --endpoint 'https://acct.blob.core.windows.net?<sas>' \\\n          --bucket media --stat clip.mp4")]
pub struct Cli {
    /// Object key
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Store protocol
    #[arg(long, value_enum, default_value_t = Backend::S3, env = "RANGEFS_BACKEND")]
    pub backend: Backend,

    /// Service URL, without the bucket or container
    #[arg(long, value_name = "URL", env = "RANGEFS_ENDPOINT")]
    pub endpoint: String,

    /// Bucket (S3) or container (blob) name
    #[arg(long, visible_alias = "container", value_name = "NAME", env = "RANGEFS_BUCKET")]
    pub bucket: String,

    /// Bytes per range request, 0 to download whole objects
    #[arg(short = 'c', long, value_name = "BYTES", default_value_t = 1024 * 1024)]
    pub chunk_size: u64,

    /// Start reading at this offset; negative values count from the end
    #[arg(long, value_name = "BYTES", default_value_t = 0, allow_hyphen_values = true)]
    pub offset: i64,

    /// Stop after this many bytes
    #[arg(long, value_name = "BYTES")]
    pub length: Option<u64>,

    /// Print name, size and modification time instead of the content
    #[arg(long)]
    pub stat: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Log fetches to stderr (-vv for every read)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode, no transfer summary
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Cli {
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from([
            "rangefs",
            "--endpoint",
            "http://localhost:9000",
            "--container",
            "media",
            "--offset",
            "-128",
            "-vv",
            "clip.mp4",
        ])
        .unwrap();

        assert_eq!(cli.key, "clip.mp4");
        assert_eq!(cli.bucket, "media");
        assert_eq!(cli.backend, Backend::S3);
        assert_eq!(cli.offset, -128);
        assert_eq!(cli.chunk_size, 1024 * 1024);
        assert_eq!(cli.log_filter(), "trace");
        assert!(!cli.stat);
    }

    #[test]
    fn test_backend_value() {
        let cli = Cli::try_parse_from([
            "rangefs",
            "--backend",
            "blob",
            "--endpoint",
            "https://acct.blob.core.windows.net",
            "--bucket",
            "c",
            "--stat",
            "k",
        ])
        .unwrap();
        assert_eq!(cli.backend, Backend::Blob);
        assert!(cli.stat);
    }
}
