#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use anyhow::{Context, Result};
use dialoguer::{Confirm, Input};

use crate::submission::Submission;

/// Parses a reply to the selection prompt against a list of `len` entries.
///
/// `all` selects every entry; otherwise the reply must be a space-separated
/// list of 1-based indices, each within `1..=len`. Returns the selected
/// zero-based indices in the order given (duplicates are kept), or `None`
/// when the reply is invalid.
pub fn parse_selection(input: &str, len: usize) -> Option<Vec<usize>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if input == "all" {
        return Some((0..len).collect());
    }

    let mut picked = Vec::new();
    for token in input.split_whitespace() {
        let n: usize = token.parse().ok()?;
        if n < 1 || n > len {
            return None;
        }
        picked.push(n - 1);
    }
    Some(picked)
}

/// Prints a numbered list of recipient addresses and prompts until a valid
/// selection is entered. Returns the chosen submissions.
pub fn choose(submissions: &[Submission]) -> Result<Vec<Submission>> {
    println!("\nThis directory contains submissions from:\n");
    for (num, submission) in submissions.iter().enumerate() {
        println!("[{}] {}", num + 1, submission.recipient);
    }
    println!();

    loop {
        let reply: String = Input::new()
            .with_prompt(
                "Which submissions to send out? Give a space-separated list of numbers from the \
                 list above, or 'all'",
            )
            .allow_empty(true)
            .interact_text()
            .context("Selection prompt failed")?;

        match parse_selection(&reply, submissions.len()) {
            Some(picked) => {
                return Ok(picked.into_iter().map(|i| submissions[i].clone()).collect());
            }
            None => println!("Invalid input. Try again.\n"),
        }
    }
}

/// Lists the addresses the selected submissions will be sent to and asks
/// for confirmation.
pub fn confirm(selected: &[Submission]) -> Result<bool> {
    println!("\nCorrected submissions will be sent to:\n");
    for submission in selected {
        println!("{}", submission.recipient);
    }
    println!();

    Confirm::new()
        .with_prompt("Do you want to proceed?")
        .interact()
        .context("Confirmation prompt failed")
}
