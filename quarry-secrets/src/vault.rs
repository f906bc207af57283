use std::{collections::HashMap, sync::Mutex, time::Duration};

use quarry_core::{
    config::{VaultAuthMethod, VaultConfig},
    err::{anyhow, bail, ensure, Context, Result},
};
use quarry_logging::{debug, info, trace, warn};
use vaultrs::{
    client::{Client, VaultClient, VaultClientSettingsBuilder},
    error::ClientError,
};

use crate::{CredentialService, SecretLocator, UsernamePassword};

const DEFAULT_USERNAME_KEY: &str = "username";
const DEFAULT_PASSWORD_KEY: &str = "password";

/// Reads credentials from a HashiCorp Vault KV v2 engine.
///
/// Locators take the form `vault://<mount>/<path>` and may override the
/// keys holding the username and password with the `username_key` and
/// `password_key` query parameters.
///
/// The client logs in on first use and keeps its token until vault rejects
/// it, at which point it logs in again and retries the read once. Secrets
/// themselves are read from vault on every call.
pub struct VaultCredentialService {
    config: VaultConfig,
    state: Mutex<Option<VaultState>>,
}

struct VaultState {
    client: VaultClient,
    rt: tokio::runtime::Runtime,
}

impl VaultCredentialService {
    pub fn new(config: VaultConfig) -> Self {
        Self {
            config,
            state: Mutex::new(None),
        }
    }

    fn authenticate(&self) -> Result<VaultState> {
        info!("Initialising vault client for {}", self.config.address);

        let settings = VaultClientSettingsBuilder::default()
            .address(self.config.address.clone())
            .namespace(self.config.namespace.clone())
            .timeout(self.config.timeout_secs.map(Duration::from_secs))
            .verify(self.config.verify.unwrap_or(true))
            .version(self.config.version.unwrap_or(1))
            .build()
            .context("Failed to configure vault client")?;

        let mut client = VaultClient::new(settings).context("Failed to initialise vault client")?;

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .thread_name("quarry-vault")
            .build()
            .context("Failed to initialise tokio runtime")?;

        let token = match &self.config.auth {
            VaultAuthMethod::Token(t) => t.token.clone(),
            VaultAuthMethod::AppRole(a) => {
                debug!("Authenticating with Vault using approle method");
                rt.block_on(vaultrs::auth::approle::login(
                    &client,
                    &a.mount,
                    &a.role_id,
                    &a.secret_id,
                ))
                .context("Failed to authenticate with Vault")?
                .client_token
            }
            VaultAuthMethod::Kubernetes(a) => {
                debug!("Authenticating with Vault using kubernetes method");
                rt.block_on(vaultrs::auth::kubernetes::login(
                    &client, &a.mount, &a.role, &a.jwt,
                ))
                .context("Failed to authenticate with Vault")?
                .client_token
            }
            VaultAuthMethod::UsernamePassword(a) => {
                debug!("Authenticating with Vault using userpass method");
                rt.block_on(vaultrs::auth::userpass::login(
                    &client,
                    &a.mount,
                    &a.username,
                    &a.password,
                ))
                .context("Failed to authenticate with Vault")?
                .client_token
            }
        };

        debug!("Vault token retrieved");
        client.set_token(&token);

        Ok(VaultState { client, rt })
    }

    fn connected<'a>(&self, state: &'a mut Option<VaultState>) -> Result<&'a VaultState> {
        if state.is_none() {
            *state = Some(self.authenticate()?);
        }

        state.as_ref().context("Vault client not initialised")
    }
}

impl VaultState {
    fn read(&self, mount: &str, path: &str) -> Result<HashMap<String, String>, ClientError> {
        self.rt.block_on(vaultrs::kv2::read(&self.client, mount, path))
    }
}

impl CredentialService for VaultCredentialService {
    fn fetch(&self, locator: &SecretLocator) -> Result<UsernamePassword> {
        ensure!(
            locator.scheme() == "vault",
            "Unsupported secret store '{}', expected vault://<mount>/<path>",
            locator.scheme()
        );

        let mount = locator
            .authority()
            .context("Vault secret locator must include a mount")?;
        let path = locator.path();
        ensure!(!path.is_empty(), "Vault secret locator must include a path");

        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("Vault client state poisoned"))?;

        trace!("Retrieving secret from vault {path} (mount '{mount}')");
        let mut res = self.connected(&mut state)?.read(mount, path);

        // Expired or revoked tokens are rejected with 403
        if matches!(res, Err(ClientError::APIError { code: 403, .. })) {
            warn!("Vault rejected the client token, authenticating again");
            *state = None;
            res = self.connected(&mut state)?.read(mount, path);
        }

        let secret = res.with_context(|| format!("Failed to retrieve vault secret '{path}'"))?;
        trace!("Retrieved secret successfully");

        let username_key = locator
            .param("username_key")
            .unwrap_or_else(|| DEFAULT_USERNAME_KEY.into());
        let password_key = locator
            .param("password_key")
            .unwrap_or_else(|| DEFAULT_PASSWORD_KEY.into());

        let username = match secret.get(&username_key) {
            Some(u) => u.clone(),
            None => bail!("Vault secret '{path}' does not contain key '{username_key}'"),
        };
        let password = match secret.get(&password_key) {
            Some(p) => p.clone(),
            None => bail!("Vault secret '{path}' does not contain key '{password_key}'"),
        };

        Ok(UsernamePassword::new(username, password))
    }
}
