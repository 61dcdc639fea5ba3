#![forbid(unsafe_code)]

use error_iter::ErrorIter as _;
use is_terminal::IsTerminal as _;
use onlyargs::{CliError, OnlyArgs as _};
use onlyargs_derive::OnlyArgs;
use std::io::{self, BufReader, Write as _};
use std::path::PathBuf;
use std::{env, process::ExitCode, sync::Arc};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;
use txreceipt::app::{spawn_input, App};
use txreceipt::client::{Endpoint, RpcClient};
use txreceipt::controller::{Controller, ResolvePolicy};
use txreceipt::errors::{AppError, ClientError, ExportError};
use txreceipt::ui::Screen;

/// Fetch a Rootstock transaction receipt, show it with its QR code, and export it as PDF.
#[derive(Debug, OnlyArgs)]
#[footer = "Environment variables:"]
#[footer = "  - RSK_API_KEY is the access key for the Rootstock RPC API."]
#[footer = "      Appended to the endpoint URL. Not checked locally."]
#[footer = "  - RSK_RPC_URL accepts a http: or https: URL"]
#[footer = "      default is \"https://rpc.testnet.rootstock.io\""]
#[footer = "  - RAYON_NUM_THREADS sets how many lookups may run at once in the"]
#[footer = "      interactive session. Default is 4."]
#[footer = "  - TERM_COLOR accepts \"always\" to override automatic terminal sensing"]
struct Args {
    /// Transaction hash to look up.
    ///   Starts an interactive session when omitted.
    ///
    #[short('t')]
    tx_hash: Option<String>,

    /// Export the PDF receipt after a successful lookup.
    pdf: bool,

    /// Directory for the exported PDF receipt.
    #[default(".")]
    output_dir: PathBuf,

    /// Write the QR code as an SVG image to this path.
    #[long]
    qr_svg: Option<PathBuf>,

    /// Ignore results of superseded lookups.
    ///   Without this, the last lookup to finish is shown, even
    ///   when a newer one was started in the meantime.
    ///
    #[long]
    latest_only: bool,
}

#[derive(Debug, Error)]
enum Error {
    #[error("Argument parsing error")]
    Args(#[from] CliError),

    #[error("I/O error")]
    Io(#[from] io::Error),

    #[error("RPC client error")]
    Client(#[from] ClientError),

    #[error("Export error")]
    Export(#[from] ExportError),

    #[error("Interactive session error")]
    App(#[from] AppError),
}

fn main() -> ExitCode {
    // Initialize the tracing subscriber for instrumentation.
    // Uses the `RUST_LOG` environment var for configuration. E.g. `RUST_LOG=debug cargo run`
    // Logs go to stderr so they do not interleave with the screen on stdout.
    //
    // See: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/struct.EnvFilter.html#directives
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let term_color = env::var("TERM_COLOR")
        .map(|color| color == "always")
        .unwrap_or_else(|_| io::stderr().is_terminal());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(term_color),
        )
        .with(env_filter)
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            if matches!(err, Error::Args(_)) {
                eprintln!("{}", Args::HELP);
            }

            eprintln!("Error: {err}");
            for source in err.sources().skip(1) {
                eprintln!("  Caused by: {source}");
            }

            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Error> {
    let args: Args = onlyargs::parse()?;

    let endpoint = Endpoint::from_env();
    info!("Using RPC endpoint {endpoint}");

    let client = RpcClient::new(&endpoint)?;
    let policy = if args.latest_only {
        ResolvePolicy::LatestSubmit
    } else {
        ResolvePolicy::LastResolved
    };
    let controller = Controller::new(policy);

    match args.tx_hash.clone() {
        Some(tx_hash) => lookup(&args, &client, controller, tx_hash),
        None => interactive(&args, client, controller),
    }
}

/// Look up one receipt, draw it, and run the requested exports.
fn lookup(
    args: &Args,
    client: &RpcClient,
    mut controller: Controller,
    tx_hash: String,
) -> Result<ExitCode, Error> {
    controller.set_query(tx_hash);
    controller.submit_with(client);

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", Screen(&controller))?;

    if controller.state().receipt().is_none() {
        return Ok(ExitCode::FAILURE);
    }

    if args.pdf {
        if let Some(path) = controller.export_pdf(&args.output_dir)? {
            writeln!(stdout, "Saved {}", path.display())?;
        }
    }
    if let Some(path) = &args.qr_svg {
        controller.export_qr_svg(path)?;
        writeln!(stdout, "Saved {}", path.display())?;
    }

    Ok(ExitCode::SUCCESS)
}

fn interactive(
    args: &Args,
    client: RpcClient,
    controller: Controller,
) -> Result<ExitCode, Error> {
    if args.pdf || args.qr_svg.is_some() {
        warn!("--pdf and --qr-svg need --tx-hash. Use `:pdf` and `:qr <path>` instead.");
    }

    let mut app = App::new(
        Arc::new(client),
        controller,
        args.output_dir.clone(),
        io::stdout(),
    )?;
    spawn_input(BufReader::new(io::stdin()), app.sender());
    app.run()?;

    Ok(ExitCode::SUCCESS)
}
