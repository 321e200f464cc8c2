use anyhow::{Context, Result};
use clap::Parser;
use reportflow_core::load_config;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

mod context;
mod shell;

use context::CliContext;
use shell::Shell;

/// Render report previews from an agent event stream (one JSON event per line)
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file, or a directory containing reportflow.json
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory exported reports are written to
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Read events from this file instead of stdin
    #[arg(long)]
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout only carries rendered surfaces.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());

    fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = load_config(args.config.as_deref());
    if let Some(dir) = args.export_dir {
        config.export_dir = Some(dir);
    }
    let export_dir = config.resolved_export_dir();
    info!("Export dir: {:?}", export_dir);

    let ctx = Arc::new(CliContext::new(export_dir));
    let mut shell = Shell::new(config, ctx);

    match args.input {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("failed to open {:?}", path))?;
            run(BufReader::new(file), &mut shell).await
        }
        None => run(BufReader::new(tokio::io::stdin()), &mut shell).await,
    }
}

async fn run<R>(mut reader: R, shell: &mut Shell) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    info!("reportflow shell ready");

    let mut line = String::new();
    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match shell.handle_line(trimmed).await {
            Ok(rendered) => {
                for surface in rendered {
                    println!("{}", surface);
                }
            }
            Err(e) => error!("Skipping event: {:#}", e),
        }
    }

    info!(
        "event stream closed: {} invocations, {} ui messages, {} surfaces mounted",
        shell.store().len(),
        shell.ui_messages().len(),
        shell.surface_count()
    );
    Ok(())
}
