//! End-of-run summary

use std::fmt;

use crate::downloader::batch::ItemOutcome;

/// A failed item with the message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub item_name: String,
    pub message: String,
}

/// Outcomes partitioned for a single notification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallSummary {
    pub succeeded: Vec<String>,
    pub missing_after_download: Vec<String>,
    pub other_failures: Vec<FailedItem>,
}

impl InstallSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.missing_after_download.len() + self.other_failures.len()
    }

    pub fn failed(&self) -> usize {
        self.missing_after_download.len() + self.other_failures.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Partition outcomes by success, then by the missing-file sentinel
pub fn summarize(outcomes: &[ItemOutcome]) -> InstallSummary {
    let mut summary = InstallSummary::default();

    for outcome in outcomes {
        if outcome.succeeded {
            summary.succeeded.push(outcome.item_name.clone());
        } else if outcome.is_missing_after_download() {
            summary.missing_after_download.push(outcome.item_name.clone());
        } else {
            summary.other_failures.push(FailedItem {
                item_name: outcome.item_name.clone(),
                message: outcome.error_message.clone().unwrap_or_default(),
            });
        }
    }

    summary
}

impl fmt::Display for InstallSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_complete_success() {
            return write!(
                f,
                "{} mod(s) installed successfully. All files were verified and are present in the folder.",
                self.succeeded.len()
            );
        }

        writeln!(f, "Some mods could not be installed.")?;

        if !self.missing_after_download.is_empty() {
            writeln!(f)?;
            writeln!(f, "Files missing after download ({}):", self.missing_after_download.len())?;
            for name in &self.missing_after_download {
                writeln!(f, "- {name}")?;
            }
        }

        if !self.other_failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Download errors ({}):", self.other_failures.len())?;
            for failure in &self.other_failures {
                writeln!(f, "- {}: {}", failure.item_name, failure.message)?;
            }
        }

        writeln!(f)?;
        write!(f, "{} mod(s) installed successfully", self.succeeded.len())
    }
}
