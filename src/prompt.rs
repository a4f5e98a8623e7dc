use inquire::{Confirm, InquireError};
use log::warn;

/// Ask a yes/no question, defaulting to no.
///
/// A prompt that cannot be shown (no terminal) or is cancelled counts as a no.
#[must_use]
pub fn confirm(question: &str) -> bool {
    match Confirm::new(question).with_default(false).prompt() {
        Ok(answer) => answer,
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => false,
        Err(e) => {
            warn!("Unable to ask for confirmation: {e}");
            false
        }
    }
}
