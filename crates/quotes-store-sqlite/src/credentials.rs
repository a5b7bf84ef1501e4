//! Shared web credentials handed to the engine at open.
//!
//! The secret arrives as `user:password`. The password is hashed once with
//! argon2 and only the PHC string is kept.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use rand_core::OsRng;

use crate::{Error, Result};

/// Credentials accepted as valid by the web listing.
#[derive(Clone, Debug)]
pub struct WebCredentials {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

impl WebCredentials {
  /// Parse a `user:password` secret. A secret without a `:` means no auth.
  pub fn from_secret(secret: &str) -> Result<Option<Self>> {
    let Some((username, password)) = secret.split_once(':') else {
      return Ok(None);
    };

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| Error::Credentials(e.to_string()))?
      .to_string();

    Ok(Some(Self { username: username.to_owned(), password_hash }))
  }

  /// Check a presented user name and password.
  ///
  /// The argon2 verification runs even when the user name differs.
  pub fn verify(&self, username: &str, password: &str) -> bool {
    let password_ok = PasswordHash::new(&self.password_hash)
      .map(|parsed| {
        Argon2::default()
          .verify_password(password.as_bytes(), &parsed)
          .is_ok()
      })
      .unwrap_or(false);
    password_ok && username == self.username
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn secret_without_colon_disables_auth() {
    assert!(WebCredentials::from_secret("justapassword").unwrap().is_none());
    assert!(WebCredentials::from_secret("").unwrap().is_none());
  }

  #[test]
  fn verifies_user_and_password() {
    let creds = WebCredentials::from_secret("admin:hunter:2").unwrap().unwrap();
    assert_eq!(creds.username, "admin");
    assert!(creds.password_hash.starts_with("$argon2"));
    assert!(creds.verify("admin", "hunter:2"));
    assert!(!creds.verify("admin", "hunter"));
    assert!(!creds.verify("root", "hunter:2"));
  }
}
