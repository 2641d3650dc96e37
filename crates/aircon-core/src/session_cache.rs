// ── Session cache ──
//
// One authenticated vendor gateway per process. The first caller
// resolves configuration, builds the gateway and logs in; everyone who
// arrives meanwhile awaits that same construction. A failed construction
// leaves the cell empty so the next call starts over.

use aircon_api::{GatewayFactory, VendorGateway};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::RelayConfig;
use crate::error::RelayError;

pub struct SessionCache<F: GatewayFactory> {
    factory: F,
    config: RelayConfig,
    gateway: OnceCell<F::Gateway>,
}

impl<F: GatewayFactory> SessionCache<F> {
    pub fn new(factory: F, config: RelayConfig) -> Self {
        Self {
            factory,
            config,
            gateway: OnceCell::new(),
        }
    }

    /// Whether a gateway has been built and logged in.
    pub fn is_ready(&self) -> bool {
        self.gateway.initialized()
    }

    /// The authenticated gateway, built on first use.
    pub async fn get_client(&self) -> Result<&F::Gateway, RelayError> {
        self.gateway.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> Result<F::Gateway, RelayError> {
        let settings = self.config.resolve()?;
        let account = mask_email(&settings.email);
        debug!(%account, timeout_ms = settings.timeout.as_millis(), "building vendor gateway");

        let gateway = self
            .factory
            .build(settings)
            .map_err(|e| RelayError::from_gateway("creating the vendor client", e))?;
        gateway
            .login()
            .await
            .map_err(|e| RelayError::from_gateway("logging in", e))?;

        info!(%account, "vendor session established");
        Ok(gateway)
    }
}

/// Hide the local part of an email for log output: `j***e@example.com`.
pub fn mask_email(email: &str) -> String {
    let Some((local, domain)) = email.split_once('@') else {
        return "***".into();
    };
    let mut chars = local.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) => format!("{first}***{last}@{domain}"),
        (Some(first), None) => format!("{first}***@{domain}"),
        _ => format!("***@{domain}"),
    }
}
