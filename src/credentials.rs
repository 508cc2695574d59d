use dialoguer::{Input, Password};
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug, thiserror::Error)]
#[error("failed to read {what} from the terminal: {source}")]
pub struct CredentialError {
    what: &'static str,
    #[source]
    source: dialoguer::Error,
}

/// Supplies the Bugzilla login used for a live run.
pub trait CredentialProvider {
    /// Returns `configured` when set, otherwise asks for a user name.
    fn username(&self, configured: Option<&str>) -> Result<String, CredentialError>;
    fn password(&self, user: &str) -> Result<SecretString, CredentialError>;
}

/// Asks on the controlling terminal.
#[derive(Debug, Default)]
pub struct PromptCredentials;

impl CredentialProvider for PromptCredentials {
    fn username(&self, configured: Option<&str>) -> Result<String, CredentialError> {
        if let Some(user) = configured {
            return Ok(user.to_string());
        }
        Input::<String>::new()
            .with_prompt("Bugzilla user")
            .interact_text()
            .map_err(|source| CredentialError {
                what: "user name",
                source,
            })
    }

    fn password(&self, user: &str) -> Result<SecretString, CredentialError> {
        Password::new()
            .with_prompt(format!("Bugzilla password for {user}"))
            .interact()
            .map(SecretString::from)
            .map_err(|source| CredentialError {
                what: "password",
                source,
            })
    }
}

/// Fixed credentials, for non-interactive callers.
#[derive(Debug)]
pub struct StaticCredentials {
    pub username: String,
    pub password: SecretString,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn username(&self, configured: Option<&str>) -> Result<String, CredentialError> {
        Ok(configured.unwrap_or(self.username.as_str()).to_string())
    }

    fn password(&self, _user: &str) -> Result<SecretString, CredentialError> {
        Ok(SecretString::from(self.password.expose_secret().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_credentials_prefer_configured_user() {
        let creds = StaticCredentials::new("fallback", "pw");
        assert_eq!(creds.username(Some("ops")).expect("user"), "ops");
        assert_eq!(creds.username(None).expect("user"), "fallback");
        assert_eq!(creds.password("ops").expect("pw").expose_secret(), "pw");
    }

    #[test]
    fn prompt_credentials_skip_prompt_when_user_configured() {
        let user = PromptCredentials
            .username(Some("ops@example.org"))
            .expect("no prompt needed");
        assert_eq!(user, "ops@example.org");
    }
}
