//! # submissions
//!
//! Sends corrected submissions to the email address contained in the
//! submission file name.
//!
//! A corrected submission is a PDF named
//! `<email>_<sheet>_corrected.pdf`. The tool scans a directory for such
//! files, lets the instructor pick which ones to return, and emails each
//! PDF to its encoded recipient through an SMTP relay.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Optional sender identity read from the user's config file
pub mod config;
/// SMTP session, message composition, and the send loop
pub mod mail;
/// Interactive selection and confirmation prompts
pub mod select;
/// Filename parsing and directory scanning
pub mod submission;
