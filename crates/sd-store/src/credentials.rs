use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::errors::{AuthError, Result};

/// Login input for a single exchange; dropped (and wiped) right after use
pub struct Credentials {
    email: String,
    password: Zeroizing<String>,
    otp: Option<Zeroizing<String>>,
    scopes: Vec<String>,
}

impl Credentials {
    /// Validate and wrap login input
    ///
    /// An empty `otp` means no second factor.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        otp: impl Into<String>,
        scopes: Vec<String>,
    ) -> Result<Self> {
        let email = email.into();
        let password = Zeroizing::new(password.into());
        let otp = Zeroizing::new(otp.into());

        if email.trim().is_empty() {
            return Err(AuthError::MissingField("email").into());
        }
        if password.is_empty() {
            return Err(AuthError::MissingField("password").into());
        }
        if scopes.iter().all(|s| s.trim().is_empty()) {
            return Err(AuthError::MissingField("scopes").into());
        }

        Ok(Self {
            email,
            password,
            otp: (!otp.trim().is_empty()).then_some(otp),
            scopes,
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn otp(&self) -> Option<&str> {
        self.otp.as_deref().map(|s| s.as_str())
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("otp", &self.otp.as_ref().map(|_| "[REDACTED]"))
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Root macaroon plus the discharges its third-party caveats need
///
/// Both are opaque serialized tokens; nothing here looks inside them.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct TokenPair {
    primary: String,
    discharges: Vec<String>,
}

impl TokenPair {
    pub fn new(primary: impl Into<String>, discharges: Vec<String>) -> Self {
        Self {
            primary: primary.into(),
            discharges,
        }
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn discharges(&self) -> &[String] {
        &self.discharges
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("primary", &"[REDACTED]")
            .field("discharges", &self.discharges.len())
            .finish()
    }
}
