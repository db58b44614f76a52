// Session credential for the panel.
//
// The panel authenticates with a `session` cookie issued by its login page.
// Logging in is out of scope; the token is obtained from the browser and
// stored via `panelctl config set-session`.

use secrecy::SecretString;

/// A panel session token, sent as the `session` cookie on every request.
#[derive(Clone)]
pub struct Session {
    token: SecretString,
}

impl Session {
    /// Cookie name the panel reads the session from.
    pub const COOKIE_NAME: &'static str = "session";

    pub fn new(token: SecretString) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl From<SecretString> for Session {
    fn from(token: SecretString) -> Self {
        Self::new(token)
    }
}
