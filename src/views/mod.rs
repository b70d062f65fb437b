//! View state for the three screens of the app: the tab shell, the listing and
//! the submission form. Views talk to the [`Backend`](crate::backend::Backend)
//! directly and keep only transient, in-memory state.

pub mod listing;
pub mod shell;
pub mod submit_form;

pub use listing::{ListingView, ShareAction, VoteOutcome};
pub use shell::{AuthMode, Shell, Tab};
pub use submit_form::{FileRejection, FormPhase, SelectedFile, SubmissionForm, SubmitError};
