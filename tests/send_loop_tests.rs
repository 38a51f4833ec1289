use std::{path::Path, sync::Mutex};

use lettre::Message;
use submissions::{
    config::SenderConfig,
    mail::{MailError, Transport, send_batch},
    submission::Submission,
};
use tempfile::{TempDir, tempdir};

/// Relay stand-in that answers each delivery attempt from a script and
/// records the formatted message of every attempt.
struct ScriptedRelay {
    /// Outcomes handed out in order, one per delivery attempt.
    script:   Mutex<Vec<Result<(), MailError>>>,
    /// Formatted messages in the order they were attempted.
    attempts: Mutex<Vec<String>>,
}

impl ScriptedRelay {
    fn new(script: Vec<Result<(), MailError>>) -> Self {
        Self {
            script:   Mutex::new(script),
            attempts: Mutex::new(Vec::new()),
        }
    }

    fn attempts(&self) -> Vec<String> {
        self.attempts.lock().expect("attempts poisoned").clone()
    }
}

impl Transport for ScriptedRelay {
    async fn deliver(&self, message: Message) -> Result<(), MailError> {
        self.attempts
            .lock()
            .expect("attempts poisoned")
            .push(String::from_utf8_lossy(&message.formatted()).to_string());
        let mut script = self.script.lock().expect("script poisoned");
        assert!(!script.is_empty(), "more delivery attempts than scripted outcomes");
        script.remove(0)
    }
}

fn fixtures(dir: &Path, locals: &[&str]) -> Vec<Submission> {
    locals
        .iter()
        .map(|local| {
            let name = format!("{local}@example.com_3_corrected.pdf");
            std::fs::write(dir.join(&name), b"%PDF-1.4 fake correction")
                .expect("fixture file should be written");
            Submission::from_file_name(dir, &name).expect("fixture name should match the pattern")
        })
        .collect()
}

fn jane_config() -> SenderConfig {
    SenderConfig::from_json(r#"{"name": "Jane Doe", "email": "jane@example.org"}"#)
}

fn batch(dir: &TempDir, locals: &[&str]) -> Vec<Submission> {
    fixtures(dir.path(), locals)
}

#[tokio::test]
async fn first_successful_send_verifies_the_sender() {
    let dir = tempdir().expect("tempdir should be created");
    let selected = batch(&dir, &["alice", "bob"]);
    let relay = ScriptedRelay::new(vec![Ok(()), Ok(())]);

    let report = send_batch(&relay, &selected, "3", &jane_config())
        .await
        .expect("batch should succeed");

    assert!(report.all_sent());
    let attempts = relay.attempts();
    assert_eq!(attempts.len(), 2);
    assert!(attempts.iter().all(|m| m.contains("jane@example.org")));
    assert!(attempts[0].contains("To: alice@example.com"));
    assert!(attempts[1].contains("To: bob@example.com"));
}

#[tokio::test]
async fn rejection_after_verification_is_recorded_and_the_loop_continues() {
    let dir = tempdir().expect("tempdir should be created");
    let selected = batch(&dir, &["alice", "bob", "carol"]);
    let relay = ScriptedRelay::new(vec![
        Ok(()),
        Err(MailError::Rejected("550 mailbox unavailable".into())),
        Ok(()),
    ]);

    let report = send_batch(&relay, &selected, "3", &jane_config())
        .await
        .expect("batch should succeed despite the rejection");

    assert_eq!(report.failed, vec!["bob@example.com"]);
    let attempts = relay.attempts();
    assert_eq!(attempts.len(), 3, "the loop should keep going past a rejection");
    assert!(attempts[2].contains("To: carol@example.com"));
}

#[tokio::test]
async fn disconnect_after_verification_is_recorded_as_a_failure() {
    let dir = tempdir().expect("tempdir should be created");
    let selected = batch(&dir, &["alice", "bob"]);
    let relay = ScriptedRelay::new(vec![
        Ok(()),
        Err(MailError::Disconnected("connection reset".into())),
    ]);

    let report = send_batch(&relay, &selected, "3", &jane_config())
        .await
        .expect("batch should succeed despite the drop");

    assert_eq!(report.failed, vec!["bob@example.com"]);
}

#[tokio::test]
async fn rejected_config_address_aborts_naming_the_config_file() {
    let dir = tempdir().expect("tempdir should be created");
    let selected = batch(&dir, &["alice", "bob"]);
    let relay = ScriptedRelay::new(vec![Err(MailError::Rejected("553 sender refused".into()))]);

    let err = send_batch(&relay, &selected, "3", &jane_config())
        .await
        .unwrap_err();

    let rendered = format!("{err:#}");
    assert!(rendered.contains("Invalid email in the submissions config file"));
    assert!(rendered.contains("553 sender refused"));
    assert_eq!(relay.attempts().len(), 1, "no further sends after the abort");
}

#[tokio::test]
async fn malformed_config_address_aborts_without_a_delivery_attempt() {
    let dir = tempdir().expect("tempdir should be created");
    let selected = batch(&dir, &["alice"]);
    let relay = ScriptedRelay::new(vec![]);
    let config = SenderConfig::from_json(r#"{"name": "Jane Doe", "email": "not an address"}"#);

    let err = send_batch(&relay, &selected, "3", &config).await.unwrap_err();

    assert!(format!("{err:#}").contains("Invalid email in the submissions config file"));
    assert!(relay.attempts().is_empty());
}

#[tokio::test]
async fn disconnect_before_verification_aborts_with_a_rerun_hint() {
    let dir = tempdir().expect("tempdir should be created");
    let selected = batch(&dir, &["alice", "bob"]);
    let relay = ScriptedRelay::new(vec![Err(MailError::Disconnected("connection reset".into()))]);

    let err = send_batch(&relay, &selected, "3", &jane_config())
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("Try re-running"));
    assert_eq!(relay.attempts().len(), 1);
}
