use serde_json::{json, Map};

use crate::auth::{Identity, TokenCodec};
use crate::cli::{utils, OutputFormat};
use crate::config::AppConfig;

/// Mint a token with the configured secret and lifetime. Stands in for a
/// login flow when seeding or operating the service.
pub fn handle(
    config: &AppConfig,
    username: &str,
    admin: bool,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    if username.trim().is_empty() {
        anyhow::bail!("username must not be empty");
    }

    let codec = TokenCodec::from_config(&config.security)?;
    let identity = Identity::new(username, admin);
    let token = codec.sign(&identity)?;

    let mut data = Map::new();
    data.insert("token".to_string(), json!(token));
    data.insert("username".to_string(), json!(identity.username));
    data.insert("is_admin".to_string(), json!(identity.is_admin));
    data.insert(
        "expires_in_hours".to_string(),
        json!(config.security.token_expiry_hours),
    );

    utils::output_success(&output_format, "Token issued", Some(data))
}
