//! Login lifecycle driver
//!
//! [`SessionManager`] runs the four session operations on top of a
//! [`RemoteClient`] and reports each of them as an [`Outcome`]. It never
//! returns an error to the caller.

use tracing::{debug, info, warn};

use super::{Session, SessionState};
use crate::error::Error;
use crate::model::User;
use crate::outcome::Outcome;
use crate::remote::RemoteClient;

const LOGIN_FAILED: &str = "Login Failed";
const LOGIN_FALLBACK: &str = "Please check your credentials and try again.";
const REGISTER_FAILED: &str = "Registration Failed";
const REGISTER_FALLBACK: &str = "Please try again with different credentials.";

/// Drives bootstrap, login, registration and logout
#[derive(Debug, Clone)]
pub struct SessionManager {
    remote: RemoteClient,
}

impl SessionManager {
    pub fn new(remote: RemoteClient) -> Self {
        Self { remote }
    }

    pub fn session(&self) -> &Session {
        self.remote.session()
    }

    pub fn state(&self) -> SessionState {
        self.session().state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.session().current_user().await
    }

    /// Resolve the startup state from the persisted credential
    ///
    /// The state remains [`SessionState::Unknown`] until this returns. A
    /// stored credential the backend no longer accepts is cleared.
    pub async fn bootstrap(&self) -> SessionState {
        let session = self.session();

        let stored = match session.load_persisted().await {
            Ok(stored) => stored.filter(|token| !token.is_empty()),
            Err(e) => {
                warn!("Could not read persisted credential: {}", e);
                None
            }
        };

        let Some(token) = stored else {
            debug!("No persisted credential in slot {}", session.slot());
            session.set_state(SessionState::Unauthenticated);
            return session.state();
        };

        session.attach(token).await;
        match self.remote.get_current_user().await {
            Ok(user) => session.confirm(user).await,
            Err(e) => {
                warn!("Stored credential could not be verified: {}", e);
                let _ = session.teardown().await;
            }
        }

        session.state()
    }

    /// Exchange email and password for a credential
    pub async fn login(&self, email: &str, password: &str) -> Outcome<User> {
        if email.trim().is_empty() || password.is_empty() {
            debug!("Login rejected locally: missing email or password");
            return Outcome::failure(LOGIN_FAILED, LOGIN_FALLBACK);
        }

        let session = self.session();
        session.set_state(SessionState::Authenticating);

        match self.remote.login(email.trim(), password).await {
            Ok(response) => {
                let user = response.user.clone();
                session.establish(response.token, response.user).await;
                Outcome::success("Welcome to ContactSphere!", "You've successfully logged in.")
                    .with_value(user)
            }
            Err(e) => {
                warn!("Login failed: {}", e);
                let _ = session.teardown().await;
                Outcome::failure(LOGIN_FAILED, failure_message(&e, LOGIN_FALLBACK))
            }
        }
    }

    /// Create an account; the session is left untouched
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Outcome {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            debug!("Registration rejected locally: missing field");
            return Outcome::failure(REGISTER_FAILED, REGISTER_FALLBACK);
        }

        match self.remote.register(username.trim(), email.trim(), password).await {
            Ok(()) => {
                info!("Registered account {}", username.trim());
                Outcome::success("Registration Successful!", "Please log in with your new account.")
            }
            Err(e) => {
                warn!("Registration failed: {}", e);
                Outcome::failure(REGISTER_FAILED, failure_message(&e, REGISTER_FALLBACK))
            }
        }
    }

    /// Forget the credential and user
    ///
    /// Never contacts the backend. Calling it twice is harmless.
    pub async fn logout(&self) -> Outcome {
        if let Err(e) = self.session().teardown().await {
            warn!("Logout could not clear the persisted credential: {}", e);
        }
        info!("Logged out");
        Outcome::success("Logged Out", "See you next time!")
    }
}

/// Credential rejections on the unauthenticated endpoints get the generic text
fn failure_message(error: &Error, fallback: &str) -> String {
    match error {
        Error::Authorization(_) => fallback.to_string(),
        other => other.user_message(fallback),
    }
}
