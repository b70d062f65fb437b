use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Listen,
    Submit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthModal {
    pub open: bool,
    pub mode: AuthMode,
    pub error: Option<String>,
}

/// Top-level coordination state: active tab, sign-in modal, refresh counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Shell {
    pub active_tab: Tab,
    pub auth_modal: AuthModal,
    /// Bumped on every successful submission so the listing reloads.
    pub refresh_counter: u64,
}

impl Shell {
    pub fn select_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    /// Prompt for sign-in. Used whenever an action needs a user.
    pub fn request_auth(&mut self) {
        self.open_auth_modal(AuthMode::SignIn);
    }

    pub fn open_auth_modal(&mut self, mode: AuthMode) {
        self.auth_modal = AuthModal {
            open: true,
            mode,
            error: None,
        };
    }

    pub fn close_auth_modal(&mut self) {
        self.auth_modal.open = false;
        self.auth_modal.error = None;
    }

    pub fn auth_failed(&mut self, message: impl Into<String>) {
        self.auth_modal.open = true;
        self.auth_modal.error = Some(message.into());
    }

    pub fn submission_succeeded(&mut self) {
        self.active_tab = Tab::Listen;
        self.refresh_counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_listen_tab_with_modal_closed() {
        let shell = Shell::default();
        assert_eq!(shell.active_tab, Tab::Listen);
        assert!(!shell.auth_modal.open);
        assert_eq!(shell.refresh_counter, 0);
    }

    #[test]
    fn submission_success_returns_to_listing_and_bumps_counter() {
        let mut shell = Shell::default();
        shell.select_tab(Tab::Submit);

        shell.submission_succeeded();
        shell.submission_succeeded();

        assert_eq!(shell.active_tab, Tab::Listen);
        assert_eq!(shell.refresh_counter, 2);
    }

    #[test]
    fn auth_failure_keeps_modal_open_until_closed() {
        let mut shell = Shell::default();
        shell.open_auth_modal(AuthMode::SignUp);
        shell.auth_failed("User already registered");

        assert!(shell.auth_modal.open);
        assert_eq!(shell.auth_modal.mode, AuthMode::SignUp);
        assert_eq!(
            shell.auth_modal.error.as_deref(),
            Some("User already registered")
        );

        shell.close_auth_modal();
        assert!(!shell.auth_modal.open);
        assert!(shell.auth_modal.error.is_none());
    }

    #[test]
    fn reopening_the_modal_clears_the_old_error() {
        let mut shell = Shell::default();
        shell.auth_failed("Invalid login credentials");
        shell.request_auth();

        assert_eq!(shell.auth_modal.mode, AuthMode::SignIn);
        assert!(shell.auth_modal.error.is_none());
    }
}
