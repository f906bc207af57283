use serde::{Deserialize, Serialize};

/// Settings for the HashiCorp Vault client used to resolve
/// `vault://` secret locators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Address of the vault server, eg `https://vault.internal:8200`
    pub address: String,
    /// API version, defaults to 1
    pub version: Option<u8>,
    pub namespace: Option<String>,
    /// Whether to verify the server certificate, defaults to true
    pub verify: Option<bool>,
    /// Request timeout applied by the client
    pub timeout_secs: Option<u64>,
    pub auth: VaultAuthMethod,
}

/// How the client logs in to vault before reading secrets
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VaultAuthMethod {
    #[serde(rename = "token")]
    Token(VaultTokenAuth),
    #[serde(rename = "approle")]
    AppRole(VaultAppRoleAuth),
    #[serde(rename = "kubernetes")]
    Kubernetes(VaultKubernetesAuth),
    #[serde(rename = "userpass")]
    UsernamePassword(VaultUserPasswordAuth),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VaultTokenAuth {
    pub token: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VaultAppRoleAuth {
    pub mount: String,
    pub role_id: String,
    pub secret_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VaultKubernetesAuth {
    pub mount: String,
    pub role: String,
    pub jwt: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VaultUserPasswordAuth {
    pub mount: String,
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use crate::config::parse_config;

    use super::*;

    #[test]
    fn test_parse_vault_config_approle() {
        let conf = parse_config(
            r#"
address: "http://localhost:8200"
auth:
  type: approle
  mount: approle
  role_id: rid
  secret_id: sid
"#,
        )
        .unwrap();

        let parsed: VaultConfig = serde_yaml::from_value(conf).unwrap();

        assert_eq!(
            parsed,
            VaultConfig {
                address: "http://localhost:8200".into(),
                version: None,
                namespace: None,
                verify: None,
                timeout_secs: None,
                auth: VaultAuthMethod::AppRole(VaultAppRoleAuth {
                    mount: "approle".into(),
                    role_id: "rid".into(),
                    secret_id: "sid".into(),
                }),
            }
        );
    }
}
