#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use anyhow::{Context, Result, bail};
use dialoguer::{Input, Password};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{config::SenderConfig, submission::Submission};

/// SMTP relay used when `SUBMISSIONS_SMTP_HOST` is not set.
pub const DEFAULT_SMTP_HOST: &str = "mail.ethz.ch";

/// Submission port for the STARTTLS session.
pub const SMTP_PORT: u16 = 587;

/// SMTP failures the interactive loops react to.
#[derive(Debug, Error)]
pub enum MailError {
    /// The relay rejected the supplied credentials.
    #[error("user name or password rejected by the relay")]
    Auth,
    /// The relay refused the message with a permanent response.
    #[error("message rejected by the relay: {0}")]
    Rejected(String),
    /// The connection failed or dropped mid-session.
    #[error("connection to the relay failed: {0}")]
    Disconnected(String),
}

/// Delivery seam driven by the send loop.
///
/// The live [`Mailer`] session implements it over the lettre transport;
/// anything that can classify a delivery attempt as accepted, rejected, or
/// disconnected can stand in for the relay.
pub trait Transport {
    /// Attempts to deliver one message, classifying relay failures.
    fn deliver(&self, message: Message) -> impl Future<Output = Result<(), MailError>>;
}

/// Returns the relay host to use, honouring the `SUBMISSIONS_SMTP_HOST`
/// environment override.
pub fn smtp_host() -> String {
    std::env::var("SUBMISSIONS_SMTP_HOST")
        .map(|value| value.trim().to_owned())
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string())
}

/// Builds a STARTTLS transport for the relay and verifies the credentials
/// with a connection probe.
async fn try_login(
    host: &str,
    username: String,
    password: String,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
    let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        .map_err(|e| MailError::Disconnected(e.to_string()))?
        .port(SMTP_PORT)
        .credentials(Credentials::new(username, password))
        .build();

    match transport.test_connection().await {
        Ok(true) => Ok(transport),
        Ok(false) => Err(MailError::Disconnected("relay did not answer the probe".into())),
        Err(e) if e.is_permanent() => Err(MailError::Auth),
        Err(e) => Err(MailError::Disconnected(e.to_string())),
    }
}

/// Builds a mailbox with the display name attached to the given address.
fn mailbox(name: &str, address: &str) -> Result<Mailbox> {
    let address = address
        .trim()
        .parse::<lettre::Address>()
        .with_context(|| format!("Invalid sender address {address}"))?;
    Ok(Mailbox::new(Some(name.to_string()), address))
}

/// Builds the message for one submission: a plain-text body plus the PDF
/// attached under its original file name.
pub fn compose(submission: &Submission, sheet: &str, from: &Mailbox) -> Result<Message> {
    let to: Mailbox = submission
        .recipient
        .parse()
        .with_context(|| format!("Invalid recipient address {}", submission.recipient))?;

    let body = format!(
        "Hi,\n\nThe correction of your submission for exercise sheet {sheet} is \
         attached.\n\nBest regards,\n{name}",
        name = from.name.as_deref().unwrap_or_default()
    );

    let pdf = std::fs::read(&submission.path)
        .with_context(|| format!("Could not read {}", submission.path.display()))?;
    let content_type =
        ContentType::parse("application/pdf").context("Could not parse the attachment MIME type")?;
    let attachment = Attachment::new(submission.file_name.clone()).body(pdf, content_type);

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(format!("Corrected submission {sheet}"))
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::builder().header(ContentType::TEXT_PLAIN).body(body))
                .singlepart(attachment),
        )
        .with_context(|| format!("Could not build the message for {}", submission.recipient))
}

/// Recipients the relay did not accept a message for during a run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Addresses whose message the relay rejected after sender verification.
    pub failed: Vec<String>,
}

impl BatchReport {
    /// True when every selected submission was sent.
    pub fn all_sent(&self) -> bool {
        self.failed.is_empty()
    }
}

/// An authenticated SMTP session to the relay.
pub struct Mailer {
    /// The STARTTLS transport holding the verified credentials.
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl Mailer {
    /// Prompts for credentials and establishes a connection to the relay.
    ///
    /// Rejected credentials re-prompt; a connection-level failure aborts
    /// the run.
    pub async fn connect() -> Result<Self> {
        let host = smtp_host();
        loop {
            println!();
            let username: String = Input::new()
                .with_prompt("User name")
                .interact_text()
                .context("User name prompt failed")?;
            let password = Password::new()
                .with_prompt("Password")
                .interact()
                .context("Password prompt failed")?;

            match try_login(&host, username, password).await {
                Ok(transport) => {
                    println!("\nConnection established!");
                    return Ok(Self { transport });
                }
                Err(MailError::Auth) => {
                    println!("\nWrong user name or password. Try again.");
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("Could not connect to {host}:{SMTP_PORT}")));
                }
            }
        }
    }
}

impl Transport for Mailer {
    async fn deliver(&self, message: Message) -> Result<(), MailError> {
        match self.transport.send(message).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_permanent() => Err(MailError::Rejected(e.to_string())),
            Err(e) => Err(MailError::Disconnected(e.to_string())),
        }
    }
}

/// Sends the selected submissions, verifying the sender address against the
/// first successful send.
///
/// Failures after verification are recorded per recipient and the loop
/// keeps going; the report lists every address that did not get its
/// correction.
pub async fn send_batch<T: Transport>(
    transport: &T,
    selected: &[Submission],
    sheet: &str,
    config: &SenderConfig,
) -> Result<BatchReport> {
    let name = resolve_name(config)?;
    let config_address = config.sender_email();

    let mut report = BatchReport::default();
    let mut verified: Option<Mailbox> = None;

    for submission in selected {
        let Some(from) = verified.as_ref() else {
            let from = verify_sender(transport, submission, sheet, &name, config_address).await?;
            verified = Some(from);
            continue;
        };

        let message = match compose(submission, sheet, from) {
            Ok(message) => message,
            Err(e) => {
                warn!("could not compose message for {}: {e:#}", submission.recipient);
                report.failed.push(submission.recipient.clone());
                continue;
            }
        };
        match transport.deliver(message).await {
            Ok(()) => info!("sent {} to {}", submission.file_name, submission.recipient),
            Err(e) => {
                warn!("send to {} failed: {e}", submission.recipient);
                report.failed.push(submission.recipient.clone());
            }
        }
    }

    Ok(report)
}

/// Sends the first message of the batch, prompting until the relay accepts
/// the sender address, and returns the verified mailbox.
///
/// A sender address taken from the config file is not re-prompted: a
/// rejection there aborts the run naming the config file. An empty reply
/// at the address prompt aborts the run. Connection drops abort with a
/// hint to re-run.
async fn verify_sender<T: Transport>(
    transport: &T,
    submission: &Submission,
    sheet: &str,
    name: &str,
    config_address: Option<&str>,
) -> Result<Mailbox> {
    loop {
        let address = match config_address {
            Some(address) => address.to_string(),
            None => {
                let reply: String = Input::new()
                    .with_prompt("Your email address")
                    .allow_empty(true)
                    .interact_text()
                    .context("Email address prompt failed")?;
                if reply.trim().is_empty() {
                    bail!("Aborting.");
                }
                reply
            }
        };

        let from = match mailbox(name, &address) {
            Ok(from) => from,
            Err(e) => {
                if config_address.is_some() {
                    return Err(e.context("Invalid email in the submissions config file"));
                }
                println!("\nInvalid address. Try again, or enter an empty address to abort.");
                continue;
            }
        };

        let message = compose(submission, sheet, &from)?;
        match transport.deliver(message).await {
            Ok(()) => {
                info!("sent {} to {}", submission.file_name, submission.recipient);
                return Ok(from);
            }
            Err(MailError::Rejected(response)) => {
                if config_address.is_some() {
                    return Err(anyhow::Error::new(MailError::Rejected(response))
                        .context("Invalid email in the submissions config file"));
                }
                println!(
                    "\nRejected by the relay: {response}\nTry again, or enter an empty address \
                     to abort."
                );
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context("Sending failed. Try re-running the tool"));
            }
        }
    }
}

/// Returns the sender's display name, prompting for first name and surname
/// when the config file does not provide one.
fn resolve_name(config: &SenderConfig) -> Result<String> {
    if let Some(name) = config.sender_name() {
        return Ok(name.to_string());
    }

    let first: String = Input::new()
        .with_prompt("Your first name")
        .interact_text()
        .context("First name prompt failed")?;
    let surname: String = Input::new()
        .with_prompt("Your surname")
        .interact_text()
        .context("Surname prompt failed")?;
    Ok(format!("{} {}", first.trim(), surname.trim()))
}
