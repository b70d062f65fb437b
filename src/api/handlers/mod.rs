mod auth;
mod form;
mod health;
mod media;
mod shell;
mod submissions;

use uuid::Uuid;

use crate::api::response::ApiError;

pub use auth::{get_session, sign_in, sign_out, sign_up};
pub use form::{get_form, select_file, submit_form, update_form};
pub use health::health;
pub use media::serve_media;
pub use shell::{close_auth_modal, get_shell, open_auth_modal, select_tab};
pub use submissions::{list_submissions, share_submission, toggle_vote};

/// Parse a path segment as a row id
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("'{raw}' is not a valid id")))
}
