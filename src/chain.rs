//! Blockchain backends behind the [`ChainSource`] seam.
//!
//! A wallet receives its chain source at construction time, never from
//! ambient state. Production use is [`ElectrumSource`]; tests supply
//! deterministic fakes implementing the same trait.

use std::sync::Once;

use bdk_electrum::electrum_client::{Client, ConfigBuilder, Socks5Config};
use bdk_electrum::BdkElectrumClient;
use bdk_wallet::chain::spk_client::FullScanRequest;
use bdk_wallet::{KeychainKind, Update};
use tracing::debug;

use crate::config::BlockchainConfig;
use crate::error::{Error, Result};

/// Scripts per Electrum round trip.
const SCAN_BATCH_SIZE: usize = 10;

// The rustls transport behind ssl:// endpoints needs a process-level crypto
// provider installed before the first connection.
static CRYPTO_INIT: Once = Once::new();

fn init_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// One full-scan round against a blockchain backend.
pub trait ChainSource: Send {
    /// Walks every keychain in the request `stop_gap` past its highest used
    /// index and returns the resulting wallet update.
    fn full_scan(
        &self,
        request: FullScanRequest<KeychainKind>,
        stop_gap: usize,
    ) -> Result<Update>;
}

/// Electrum-backed chain source. The connection is established on first use,
/// not at construction, so an unreachable endpoint surfaces as a sync
/// failure rather than a wallet-creation failure.
pub struct ElectrumSource {
    config: BlockchainConfig,
}

impl ElectrumSource {
    pub fn new(config: &BlockchainConfig) -> Self {
        Self { config: config.clone() }
    }

    fn connect(&self) -> Result<BdkElectrumClient<Client>> {
        init_crypto();

        let mut builder = ConfigBuilder::new().retry(self.config.retry());
        if let Some(proxy) = self.config.socks5() {
            // The socks5 transport does not support read timeouts.
            builder = builder.socks5(Some(Socks5Config::new(proxy)));
        } else if self.config.timeout_s() > 0 {
            let timeout = u8::try_from(self.config.timeout_s()).unwrap_or(u8::MAX);
            builder = builder.timeout(Some(timeout));
        }

        debug!(url = self.config.url(), "connecting to electrum backend");
        let client =
            Client::from_config(self.config.url(), builder.build()).map_err(Error::network)?;
        Ok(BdkElectrumClient::new(client))
    }
}

impl ChainSource for ElectrumSource {
    fn full_scan(
        &self,
        request: FullScanRequest<KeychainKind>,
        stop_gap: usize,
    ) -> Result<Update> {
        let client = self.connect()?;
        let response = client
            .full_scan(request, stop_gap, SCAN_BATCH_SIZE, false)
            .map_err(Error::network)?;

        Ok(Update {
            last_active_indices: response.last_active_indices,
            tx_update: response.tx_update,
            chain: response.chain_update,
        })
    }
}
