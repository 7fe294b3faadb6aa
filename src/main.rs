//! Main entry point for the rangefs CLI application.
//!
//! Opens one object through a lazily buffered reader and copies it (or a
//! window of it) to stdout.

use std::io::SeekFrom;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use tokio::io::AsyncWriteExt;

use rangefs::cli::Backend;
use rangefs::{BlobStore, Cli, Context, HttpConfig, ObjectReader, ObjectStore, RemoteFs, S3Store};

/// Application entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    let config = HttpConfig {
        timeout_secs: cli.timeout,
        ..HttpConfig::default()
    };
    let store: Arc<dyn ObjectStore> = match cli.backend {
        Backend::S3 => Arc::new(S3Store::new(&cli.endpoint, cli.bucket.clone(), config)?),
        Backend::Blob => Arc::new(BlobStore::new(&cli.endpoint, cli.bucket.clone(), config)?),
    };
    let fs = RemoteFs::new(store).with_chunk_size(cli.chunk_size);

    // Ctrl-C cancels the in-flight fetch instead of killing the process mid-write
    let ctx = Context::new();
    let on_interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let mut file = fs
        .open_with_context(ctx, &cli.key)
        .await
        .with_context(|| format!("open {}", cli.key))?;

    if cli.stat {
        let info = file.stat();
        println!("{}\t{}\t{}", info.name, info.size, info.modified.to_rfc3339());
        return Ok(());
    }

    let start = if cli.offset < 0 {
        SeekFrom::End(cli.offset)
    } else {
        SeekFrom::Start(cli.offset as u64)
    };
    file.seek(start)?;

    let copied = copy_to_stdout(&mut file, cli.length)
        .await
        .with_context(|| format!("read {}", cli.key))?;

    // Display network transfer statistics
    if !cli.is_quiet() {
        eprintln!(
            "\n{} written, {} transferred in {} requests",
            format_size(copied),
            format_size(file.transferred_bytes()),
            file.fetch_count()
        );
    }

    Ok(())
}

/// Copy from the reader's position to stdout, stopping after `limit` bytes.
async fn copy_to_stdout<S: ObjectStore + ?Sized>(
    file: &mut ObjectReader<S>,
    limit: Option<u64>,
) -> Result<u64> {
    let mut stdout = tokio::io::stdout();
    let mut buf = vec![0u8; 64 * 1024];
    let mut remaining = limit.unwrap_or(u64::MAX);
    let mut copied = 0u64;

    while remaining > 0 {
        let want = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let n = file.read(&mut buf[..want]).await?;
        if n == 0 {
            break;
        }
        stdout.write_all(&buf[..n]).await?;
        copied += n as u64;
        remaining -= n as u64;
    }

    stdout.flush().await?;
    Ok(copied)
}

/// Format a byte size into a human-readable string.
///
/// Automatically selects the appropriate unit (bytes, KB, MB, GB)
/// based on the size magnitude.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(1048576), "1.00 MB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
