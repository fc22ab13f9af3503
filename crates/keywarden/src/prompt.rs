// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Passphrase acquisition via environment variable or TTY prompt.

use std::io::IsTerminal;

use keywarden_core::KeywardenError;
use secrecy::SecretString;

/// Current master passphrase, for headless use.
pub const MASTER_PASS_ENV_VAR: &str = "KEYWARDEN_MASTER_PASS";

/// Replacement master passphrase for `keywarden rotate`.
pub const NEW_MASTER_PASS_ENV_VAR: &str = "KEYWARDEN_NEW_MASTER_PASS";

fn from_env(var: &str) -> Option<SecretString> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Some(SecretString::from(value)),
        _ => None,
    }
}

fn read_hidden(label: &str) -> Result<String, KeywardenError> {
    eprint!("{label}: ");
    rpassword::read_password()
        .map_err(|e| KeywardenError::Internal(format!("failed to read passphrase: {e}")))
}

fn missing(var: &str) -> KeywardenError {
    KeywardenError::Config(format!(
        "no passphrase provided; set {var} or run interactively"
    ))
}

/// The current master passphrase: `KEYWARDEN_MASTER_PASS`, else a prompt.
pub fn master_passphrase() -> Result<SecretString, KeywardenError> {
    if let Some(pass) = from_env(MASTER_PASS_ENV_VAR) {
        return Ok(pass);
    }
    if !std::io::stdin().is_terminal() {
        return Err(missing(MASTER_PASS_ENV_VAR));
    }
    let pass = read_hidden("Master passphrase")?;
    if pass.is_empty() {
        return Err(KeywardenError::Config("empty passphrase not allowed".to_string()));
    }
    Ok(SecretString::from(pass))
}

/// A passphrase being set for the first time, confirmed when prompted.
///
/// `init` reads `KEYWARDEN_MASTER_PASS`; `rotate` reads
/// `KEYWARDEN_NEW_MASTER_PASS`.
fn confirmed_passphrase(var: &str, label: &str) -> Result<SecretString, KeywardenError> {
    if let Some(pass) = from_env(var) {
        return Ok(pass);
    }
    if !std::io::stdin().is_terminal() {
        return Err(missing(var));
    }
    let first = read_hidden(label)?;
    let second = read_hidden("Confirm passphrase")?;
    if first != second {
        return Err(KeywardenError::Config("passphrases do not match".to_string()));
    }
    if first.is_empty() {
        return Err(KeywardenError::Config("empty passphrase not allowed".to_string()));
    }
    Ok(SecretString::from(first))
}

pub fn new_master_passphrase() -> Result<SecretString, KeywardenError> {
    confirmed_passphrase(MASTER_PASS_ENV_VAR, "New master passphrase")
}

pub fn replacement_passphrase() -> Result<SecretString, KeywardenError> {
    confirmed_passphrase(NEW_MASTER_PASS_ENV_VAR, "Replacement master passphrase")
}

/// The account secret to protect: hidden prompt on a TTY, else the first stdin line.
pub fn account_secret() -> Result<SecretString, KeywardenError> {
    let stdin = std::io::stdin();
    let secret = if stdin.is_terminal() {
        read_hidden("Secret")?
    } else {
        let mut line = String::new();
        stdin
            .read_line(&mut line)
            .map_err(|e| KeywardenError::Internal(format!("failed to read secret: {e}")))?;
        line.trim_end_matches(['\r', '\n']).to_string()
    };
    if secret.is_empty() {
        return Err(KeywardenError::Config("empty secret not allowed".to_string()));
    }
    Ok(SecretString::from(secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;

    #[test]
    #[serial]
    fn master_passphrase_from_env_var() {
        // SAFETY: env mutation is serialized across tests.
        unsafe { std::env::set_var(MASTER_PASS_ENV_VAR, "alpha") };
        let result = master_passphrase();
        unsafe { std::env::remove_var(MASTER_PASS_ENV_VAR) };

        assert_eq!(result.unwrap().expose_secret(), "alpha");
    }

    #[test]
    #[serial]
    fn replacement_reads_its_own_variable() {
        unsafe {
            std::env::set_var(MASTER_PASS_ENV_VAR, "alpha");
            std::env::set_var(NEW_MASTER_PASS_ENV_VAR, "beta");
        }
        let result = replacement_passphrase();
        unsafe {
            std::env::remove_var(MASTER_PASS_ENV_VAR);
            std::env::remove_var(NEW_MASTER_PASS_ENV_VAR);
        }

        assert_eq!(result.unwrap().expose_secret(), "beta");
    }

    #[test]
    #[serial]
    fn empty_env_var_is_ignored() {
        unsafe { std::env::set_var(MASTER_PASS_ENV_VAR, "") };
        // stdin is not a terminal under the test harness.
        let result = master_passphrase();
        unsafe { std::env::remove_var(MASTER_PASS_ENV_VAR) };

        assert!(result.is_err());
    }
}
