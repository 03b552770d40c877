use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use domsnap::dom::Rgba;
use domsnap::{Document, FailurePolicy, SnapshotConfig};

#[derive(Parser)]
#[command(name = "domsnap", version, about = "Render laid-out document snapshots to PNG")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a JSON document snapshot to a PNG file
    Render {
        /// Document snapshot (JSON)
        input: PathBuf,
        /// Output PNG
        #[arg(short, long, default_value = "snapshot.png")]
        output: PathBuf,
        /// Image relay origin
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        relay: String,
        /// Font file for text; block glyphs are used when omitted
        #[arg(long)]
        font: Option<PathBuf>,
        /// Page background color
        #[arg(long, default_value = "white")]
        background: String,
        /// Relay request timeout in milliseconds
        #[arg(long, default_value_t = 30000)]
        timeout_ms: u64,
        /// Stop at the first node that fails to render
        #[arg(long)]
        strict: bool,
        /// Print the PNG as a data URL instead of writing a file
        #[arg(long)]
        data_url: bool,
    },
    /// Serve the image relay and static files
    #[cfg(feature = "relay")]
    Relay {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,
        /// Directory static files are served from
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            input,
            output,
            relay,
            font,
            background,
            timeout_ms,
            strict,
            data_url,
        } => {
            let background =
                Rgba::parse(&background).with_context(|| format!("unrecognized color {:?}", background))?;
            let config = SnapshotConfig {
                relay_url: relay,
                timeout_ms,
                font_path: font,
                background,
                failure_policy: if strict {
                    FailurePolicy::Abort
                } else {
                    FailurePolicy::Continue
                },
                ..SnapshotConfig::default()
            };
            let document = Document::from_path(&input)
                .with_context(|| format!("loading {}", input.display()))?;
            let snapshot = domsnap::render_document(Rc::new(document), &config)?;
            for failure in &snapshot.failures {
                log::warn!("node {}: {}", failure.node.0, failure.error);
            }
            if data_url {
                println!("{}", snapshot.screenshot.to_data_url());
            } else {
                snapshot.screenshot.save(&output)?;
                log::info!("wrote {}", output.display());
            }
        }
        #[cfg(feature = "relay")]
        Command::Relay { listen, root } => {
            let config = domsnap::relay::server::RelayConfig {
                root,
                ..Default::default()
            };
            let server = domsnap::relay::server::RelayServer::bind(&listen, config)?;
            server.serve();
        }
    }
    Ok(())
}
