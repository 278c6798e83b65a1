use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonwebtoken::EncodingKey;
use std::collections::HashMap;
use std::env;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Signing secret
//--------------------------------------------------------------------------------------------------

pub const DEFAULT_SECRET_VARIABLE: &str = "SECRET_KEY";

const SECRET_CONFIG_KEY: &str = "secret";

/// Raw HMAC key material. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Secret(bytes.into())
    }

    /// Decode a standard-alphabet, padded base64 value.
    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        STANDARD.decode(encoded).map(Secret)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub(crate) fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.0)
    }
}

impl Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([redacted; {} bytes])", self.0.len())
    }
}

//--------------------------------------------------------------------------------------------------
// Config Error
//--------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("signing secret variable {variable} is not set")]
    MissingSecret { variable: String },
    #[error("signing secret variable {variable} is not valid base64")]
    InvalidSecret {
        variable: String,
        #[source]
        source: base64::DecodeError,
    },
    #[error("signing secret variable {variable} is not valid unicode")]
    NonUnicodeSecret { variable: String },
    #[error("failed to read configuration")]
    Source(#[from] config::ConfigError),
}

//--------------------------------------------------------------------------------------------------
// Trait for anything that can hand the issuer a signing secret
//--------------------------------------------------------------------------------------------------

/// Resolves the signing secret. Called once per issued token; implementations must not cache.
pub trait SecretProvider: Send + Sync {
    fn resolve(&self) -> Result<Secret, ConfigError>;
}

impl<T: SecretProvider + ?Sized> SecretProvider for Arc<T> {
    fn resolve(&self) -> Result<Secret, ConfigError> {
        (**self).resolve()
    }
}

impl<T: SecretProvider + ?Sized> SecretProvider for &T {
    fn resolve(&self) -> Result<Secret, ConfigError> {
        (**self).resolve()
    }
}

//--------------------------------------------------------------------------------------------------
// Environment backed provider
//--------------------------------------------------------------------------------------------------

/// Reads a base64 encoded secret from an environment variable, `SECRET_KEY` unless told
/// otherwise.
#[derive(Clone, Debug)]
pub struct EnvSecretProvider {
    variable: String,
    // Replaces the process environment when set, so tests don't have to mutate it
    vars: Option<HashMap<String, String>>,
}

impl Default for EnvSecretProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvSecretProvider {
    pub fn new() -> Self {
        Self::with_variable(DEFAULT_SECRET_VARIABLE)
    }

    pub fn with_variable(variable: impl Into<String>) -> Self {
        EnvSecretProvider {
            variable: variable.into(),
            vars: None,
        }
    }

    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars = Some(vars);
        self
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    // Only the configured variable is handed to the config layer, the rest of the environment is
    // never read
    fn read_variable(&self) -> Result<Option<String>, ConfigError> {
        let value = match &self.vars {
            Some(vars) => vars.get(&self.variable).cloned(),
            None => match env::var_os(&self.variable) {
                Some(value) => Some(value.into_string().map_err(|_| {
                    ConfigError::NonUnicodeSecret {
                        variable: self.variable.clone(),
                    }
                })?),
                None => None,
            },
        };

        let environment = config::Environment::default().source(Some(
            value
                .into_iter()
                .map(|value| (SECRET_CONFIG_KEY.to_string(), value))
                .collect(),
        ));

        let cfg = config::Config::builder()
            .add_source(environment)
            .build()?;

        match cfg.get_string(SECRET_CONFIG_KEY) {
            Ok(value) => Ok(Some(value)),
            Err(config::ConfigError::NotFound(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl SecretProvider for EnvSecretProvider {
    fn resolve(&self) -> Result<Secret, ConfigError> {
        let encoded = match self.read_variable()? {
            Some(value) if !value.is_empty() => value,
            _ => {
                return Err(ConfigError::MissingSecret {
                    variable: self.variable.clone(),
                })
            }
        };

        Secret::from_base64(&encoded).map_err(|source| ConfigError::InvalidSecret {
            variable: self.variable.clone(),
            source,
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Fixed provider
//--------------------------------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct StaticSecretProvider(Secret);

impl StaticSecretProvider {
    pub fn new(secret: Secret) -> Self {
        StaticSecretProvider(secret)
    }
}

impl SecretProvider for StaticSecretProvider {
    fn resolve(&self) -> Result<Secret, ConfigError> {
        Ok(self.0.clone())
    }
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_with(vars: &[(&str, &str)]) -> EnvSecretProvider {
        EnvSecretProvider::new().with_vars(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn resolves_base64_secret_from_environment() {
        let secret = provider_with(&[("SECRET_KEY", "c3VwZXItc2VjcmV0")])
            .resolve()
            .unwrap();

        assert_eq!(secret.as_bytes(), b"super-secret");
    }

    #[test]
    fn custom_variable_name() {
        let provider = EnvSecretProvider::with_variable("HAASTE_SIGNING_KEY").with_vars(
            [("HAASTE_SIGNING_KEY".to_string(), "a2V5".to_string())]
                .into_iter()
                .collect(),
        );

        assert_eq!(provider.resolve().unwrap().as_bytes(), b"key");
    }

    #[test]
    fn missing_variable_is_a_config_error() {
        let err = provider_with(&[("OTHER", "a2V5")]).resolve().unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret { ref variable } if variable == "SECRET_KEY"));
    }

    #[test]
    fn empty_variable_is_a_config_error() {
        let err = provider_with(&[("SECRET_KEY", "")]).resolve().unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret { .. }));
    }

    #[test]
    fn non_base64_variable_is_a_config_error() {
        let err = provider_with(&[("SECRET_KEY", "not base64!")])
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSecret { .. }));
    }

    #[test]
    fn variable_name_is_case_sensitive() {
        let err = provider_with(&[("secret_key", "a2V5"), ("Secret_Key", "a2V5")])
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret { .. }));
    }

    // Each test below owns its variable names, so they can share the process environment

    #[cfg(unix)]
    #[test]
    fn unrelated_non_unicode_variables_are_ignored() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        env::set_var("HAASTE_TEST_UNRELATED_BINARY", OsStr::from_bytes(b"\xff\xfe"));
        env::set_var("HAASTE_TEST_SIGNING_KEY", "c2VjcmV0");

        let secret = EnvSecretProvider::with_variable("HAASTE_TEST_SIGNING_KEY")
            .resolve()
            .unwrap();
        assert_eq!(secret.as_bytes(), b"secret");
    }

    #[cfg(unix)]
    #[test]
    fn non_unicode_secret_is_a_config_error() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        env::set_var("HAASTE_TEST_BINARY_SIGNING_KEY", OsStr::from_bytes(b"\xff\xfe"));

        let err = EnvSecretProvider::with_variable("HAASTE_TEST_BINARY_SIGNING_KEY")
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NonUnicodeSecret { .. }));
    }

    #[test]
    fn unset_process_variable_is_missing() {
        let err = EnvSecretProvider::with_variable("HAASTE_TEST_NEVER_SET_SIGNING_KEY")
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret { .. }));
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let secret = Secret::from_bytes(b"hunter2".to_vec());
        let printed = format!("{:?}", secret);

        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("7 bytes"));
    }
}

//--------------------------------------------------------------------------------------------------
