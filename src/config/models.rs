use crate::constants;
use crate::error::Error;
use crate::request::RequestTemplate;
use base64::Engine;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client-wide settings stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs_value")]
    pub default_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Headers sent with every request
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    /// Query parameters sent with every request
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub query: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub cookies: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,
}

const fn default_timeout_secs_value() -> u64 {
    constants::DEFAULT_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            default_timeout_secs: default_timeout_secs_value(),
            user_agent: None,
            headers: IndexMap::new(),
            query: IndexMap::new(),
            cookies: IndexMap::new(),
            auth: None,
        }
    }
}

/// Authentication applied to every request. Secrets are never stored in the
/// file, only the names of the environment variables holding them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthConfig {
    Bearer {
        token_env: String,
    },
    Basic {
        username: String,
        password_env: String,
    },
}

impl AuthConfig {
    /// Renders the `Authorization` header value, reading the secret from the
    /// environment.
    ///
    /// # Errors
    /// Returns a configuration error when the environment variable is unset.
    pub fn header_value(&self) -> Result<String, Error> {
        match self {
            Self::Bearer { token_env } => {
                let token = read_secret(token_env)?;
                Ok(format!("{} {token}", constants::AUTH_SCHEME_BEARER))
            }
            Self::Basic {
                username,
                password_env,
            } => {
                let password = read_secret(password_env)?;
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                Ok(format!("{} {encoded}", constants::AUTH_SCHEME_BASIC))
            }
        }
    }
}

fn read_secret(env_var: &str) -> Result<String, Error> {
    std::env::var(env_var).map_err(|_| {
        Error::Config(format!(
            "Environment variable '{env_var}' holding the auth secret is not set"
        ))
    })
}

impl ClientConfig {
    /// The default request every call of a configured client starts from.
    ///
    /// # Errors
    /// Returns an error for invalid header names or values, or when an auth
    /// secret is missing from the environment.
    pub fn to_template(&self) -> Result<RequestTemplate, Error> {
        let mut template = RequestTemplate {
            timeout: Some(Duration::from_secs(self.default_timeout_secs)),
            ..RequestTemplate::default()
        };

        for (name, value) in &self.headers {
            template.set_header(name, value)?;
        }
        if let Some(user_agent) = &self.user_agent {
            template.set_header(constants::HEADER_USER_AGENT, user_agent)?;
        }
        if let Some(auth) = &self.auth {
            template.set_header(constants::HEADER_AUTHORIZATION, &auth.header_value()?)?;
        }
        template
            .params
            .extend(self.query.iter().map(|(k, v)| (k.clone(), v.clone())));
        for (name, value) in &self.cookies {
            template.set_cookie(name.clone(), value.clone());
        }
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str("base_url = \"https://api.test\"").unwrap();
        assert_eq!(config.base_url.as_deref(), Some("https://api.test"));
        assert_eq!(config.default_timeout_secs, 30);
        assert!(config.auth.is_none());
    }

    #[test]
    fn test_auth_table_is_tagged() {
        let config: ClientConfig = toml::from_str(
            r#"
            [auth]
            type = "basic"
            username = "ada"
            password_env = "RESTWIRE_TEST_MODELS_PASSWORD"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.auth,
            Some(AuthConfig::Basic {
                username: "ada".to_string(),
                password_env: "RESTWIRE_TEST_MODELS_PASSWORD".to_string(),
            })
        );
    }

    #[test]
    fn test_to_template_renders_defaults() {
        std::env::set_var("RESTWIRE_TEST_MODELS_TOKEN", "t0k3n");
        let mut config = ClientConfig {
            user_agent: Some("restwire/1".to_string()),
            auth: Some(AuthConfig::Bearer {
                token_env: "RESTWIRE_TEST_MODELS_TOKEN".to_string(),
            }),
            ..ClientConfig::default()
        };
        config.headers.insert("X-Team".to_string(), "core".to_string());
        config.query.insert("api_version".to_string(), "2".to_string());

        let template = config.to_template().unwrap();
        assert_eq!(template.header("authorization"), Some("Bearer t0k3n"));
        assert_eq!(template.header("user-agent"), Some("restwire/1"));
        assert_eq!(template.header("x-team"), Some("core"));
        assert_eq!(template.params.get("api_version"), Some("2"));
        assert_eq!(template.timeout, Some(Duration::from_secs(30)));
        std::env::remove_var("RESTWIRE_TEST_MODELS_TOKEN");
    }

    #[test]
    fn test_missing_secret_is_config_error() {
        let config = ClientConfig {
            auth: Some(AuthConfig::Basic {
                username: "ada".to_string(),
                password_env: "RESTWIRE_TEST_MODELS_UNSET".to_string(),
            }),
            ..ClientConfig::default()
        };
        assert!(matches!(config.to_template(), Err(Error::Config(_))));
    }
}
