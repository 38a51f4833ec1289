#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # submissions
//!
//! Returns corrected submissions to the email address encoded in the
//! submission file name.
//!
//! Run `submissions send` inside a directory of
//! `<email>_<sheet>_corrected.pdf` files, pick the ones to return, and
//! authenticate against the mail relay when prompted. An optional JSON
//! config file at `~/.config/submissions` with `name` and `email` fields
//! skips the sender-identity prompts.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use bpaf::*;
use dotenvy::dotenv;
use submissions::{
    config::SenderConfig,
    mail::{self, Mailer},
    select, submission,
};
use tracing::{Level, metadata::LevelFilter, warn};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// List the submissions found in a directory without sending
    List(Option<PathBuf>),
    /// Send out corrected submissions
    Send(Option<PathBuf>),
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses the optional directory to scan
    fn d() -> impl Parser<Option<PathBuf>> {
        positional::<PathBuf>("DIR")
            .help("Directory containing corrected submissions (defaults to the current directory)")
            .optional()
    }

    let list = construct!(Cmd::List(d()))
        .to_options()
        .command("list")
        .help("List the corrected submissions found in the directory");

    let send = construct!(Cmd::Send(d()))
        .to_options()
        .command("send")
        .help("Email each corrected submission to the address in its file name");

    let cmd = construct!([list, send]);

    cmd.to_options()
        .descr("Returns corrected submissions to the email address in the file name")
        .run()
}

/// Resolves the directory argument, defaulting to the current directory.
fn dir_or_cwd(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().context("Could not determine the current directory"),
    }
}

/// Prints the recipients and sheet numbers parsed from the directory.
fn list(dir: PathBuf) -> Result<()> {
    let found = submission::scan_dir(&dir)?;
    if found.is_empty() {
        bail!("No submissions in {}.", dir.display());
    }

    for submission in &found {
        println!("[sheet {}] {} <- {}", submission.sheet, submission.recipient, submission.file_name);
    }
    if submission::single_sheet(&found).is_none() {
        warn!("corrected submissions for multiple sheets in {}", dir.display());
    }

    Ok(())
}

/// The full send flow: scan, sanity-check, choose, confirm, connect, send.
async fn send(dir: PathBuf) -> Result<()> {
    let found = submission::scan_dir(&dir)?;
    if found.is_empty() {
        bail!("No submissions in {}.", dir.display());
    }
    let Some(sheet) = submission::single_sheet(&found) else {
        bail!("Corrected submissions for multiple sheets in {}.", dir.display());
    };
    let sheet = sheet.to_string();

    let config = SenderConfig::load();
    let selected = select::choose(&found)?;
    if !select::confirm(&selected)? {
        bail!("Aborting.");
    }

    let mailer = Mailer::connect().await?;
    let report = mail::send_batch(&mailer, &selected, &sheet, &config).await?;

    if report.all_sent() {
        println!("\nAll corrected submissions were sent out successfully!");
    } else {
        println!("\nFailed to send out corrected submissions to:\n");
        for address in &report.failed {
            println!("{address}");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    match options() {
        Cmd::List(dir) => list(dir_or_cwd(dir)?),
        Cmd::Send(dir) => send(dir_or_cwd(dir)?).await,
    }
}
