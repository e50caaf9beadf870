//! The call surface: typed handles in, result envelopes out.
//!
//! `Boundary` owns every object it hands across - configs, wallets, and the
//! payload of every envelope. Callers hold generation-checked tokens; a token
//! released twice, or used after release, reports `InvalidArgument` on every
//! operation instead of being undefined behavior.
//!
//! Registries are guarded by short-lived locks. Each wallet sits behind its
//! own mutex, so a blocking sync on one handle never delays operations or
//! releases on another.

use std::sync::{Arc, Mutex, MutexGuard};

use bdk_wallet::bitcoin::Network;
use tracing::{info, warn};

use crate::chain::{ChainSource, ElectrumSource};
use crate::config::{BlockchainConfig, DatabaseConfig};
use crate::envelope::CallResult;
use crate::error::Result;
use crate::handle::{Handle, Registry};
use crate::wallet::{LocalUtxo, WalletCore};

pub type BlockchainConfigHandle = Handle<BlockchainConfig>;
pub type DatabaseConfigHandle = Handle<DatabaseConfig>;
pub type WalletHandle = Handle<WalletSlot>;

/// Registry entry backing one live wallet. Opaque to callers; the token is
/// the only way in.
pub struct WalletSlot(Arc<Mutex<WalletCore>>);

pub struct Boundary {
    network: Network,
    blockchain_configs: Mutex<Registry<BlockchainConfig>>,
    database_configs: Mutex<Registry<DatabaseConfig>>,
    wallets: Mutex<Registry<WalletSlot>>,
}

impl Default for Boundary {
    fn default() -> Self {
        Self::new(Network::Testnet)
    }
}

impl Boundary {
    /// All wallets created through this boundary live on `network`.
    pub fn new(network: Network) -> Self {
        Self {
            network,
            blockchain_configs: Mutex::new(Registry::new("blockchain config")),
            database_configs: Mutex::new(Registry::new("database config")),
            wallets: Mutex::new(Registry::new("wallet")),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    // ------------------------------------------------------------------
    // Configuration objects
    // ------------------------------------------------------------------

    /// Electrum endpoint plus scan parameters. Nothing is validated beyond
    /// argument presence; reachability is deferred to the first sync.
    pub fn new_electrum_config(
        &self,
        endpoint: &str,
        proxy: Option<&str>,
        stop_gap: u32,
        timeout_s: u32,
    ) -> BlockchainConfigHandle {
        let config = BlockchainConfig::electrum(endpoint, proxy, stop_gap, timeout_s);
        lock(&self.blockchain_configs).insert(config)
    }

    pub fn new_memory_config(&self) -> DatabaseConfigHandle {
        lock(&self.database_configs).insert(DatabaseConfig::memory())
    }

    pub fn new_persistent_config(&self, path: &str, id: &str) -> DatabaseConfigHandle {
        lock(&self.database_configs).insert(DatabaseConfig::persistent(path, id))
    }

    pub fn free_blockchain_config(&self, handle: BlockchainConfigHandle) -> Result<()> {
        lock(&self.blockchain_configs).remove(handle).map(drop)
    }

    pub fn free_database_config(&self, handle: DatabaseConfigHandle) -> Result<()> {
        lock(&self.database_configs).remove(handle).map(drop)
    }

    // ------------------------------------------------------------------
    // Wallet lifecycle
    // ------------------------------------------------------------------

    /// Creates a wallet from the descriptor pair and the two configs. The
    /// configs are read, not consumed; the caller still releases them.
    pub fn new_wallet(
        &self,
        receive_descriptor: &str,
        change_descriptor: &str,
        blockchain: BlockchainConfigHandle,
        database: DatabaseConfigHandle,
    ) -> CallResult<WalletHandle> {
        let config = match lock(&self.blockchain_configs).get(blockchain).cloned() {
            Ok(config) => config,
            Err(err) => return CallResult::err(err),
        };
        let chain = Box::new(ElectrumSource::new(&config));
        self.new_wallet_with_chain(
            receive_descriptor,
            change_descriptor,
            chain,
            config.stop_gap(),
            database,
        )
    }

    /// Dependency-injection seam: same as [`new_wallet`] but with the chain
    /// source supplied directly, so embedders and tests can run against a
    /// deterministic backend.
    ///
    /// [`new_wallet`]: Boundary::new_wallet
    pub fn new_wallet_with_chain(
        &self,
        receive_descriptor: &str,
        change_descriptor: &str,
        chain: Box<dyn ChainSource>,
        stop_gap: u32,
        database: DatabaseConfigHandle,
    ) -> CallResult<WalletHandle> {
        let database = match lock(&self.database_configs).get(database).cloned() {
            Ok(config) => config,
            Err(err) => return CallResult::err(err),
        };
        let created = WalletCore::create(
            receive_descriptor,
            change_descriptor,
            self.network,
            &database,
            chain,
            stop_gap,
        );
        match created {
            Ok(core) => {
                let handle = lock(&self.wallets).insert(WalletSlot(Arc::new(Mutex::new(core))));
                info!(?handle, network = %self.network, "wallet created");
                CallResult::ok(handle)
            }
            Err(err) => CallResult::err(err),
        }
    }

    /// Live -> Released. The token and every copy of it go stale.
    pub fn free_wallet(&self, handle: WalletHandle) -> Result<()> {
        lock(&self.wallets).remove(handle).map(|_| {
            info!(?handle, "wallet released");
        })
    }

    /// Releases the envelope and, if it carries a wallet, the wallet itself.
    pub fn free_wallet_result(&self, result: CallResult<WalletHandle>) {
        if let Ok(handle) = result.into_result() {
            if let Err(err) = self.free_wallet(handle) {
                warn!(%err, "wallet handle in released envelope was already freed");
            }
        }
    }

    // ------------------------------------------------------------------
    // Query operations
    // ------------------------------------------------------------------

    /// Blocking full rescan. On failure the wallet's prior state is
    /// unchanged.
    pub fn sync_wallet(&self, handle: WalletHandle) -> CallResult<()> {
        self.with_wallet(handle, |core| core.sync())
    }

    /// Derives the next unused external address and advances the keychain
    /// index.
    pub fn new_address(&self, handle: WalletHandle) -> CallResult<String> {
        self.with_wallet(handle, |core| core.new_address())
    }

    /// UTXO snapshot as of the last successful sync. Does not sync.
    pub fn list_unspent(&self, handle: WalletHandle) -> CallResult<Vec<LocalUtxo>> {
        self.with_wallet(handle, |core| Ok(core.list_unspent()))
    }

    /// Sum of `value` over the current UTXO set.
    pub fn balance(&self, handle: WalletHandle) -> CallResult<u64> {
        self.with_wallet(handle, |core| Ok(core.balance()))
    }

    fn with_wallet<T>(
        &self,
        handle: WalletHandle,
        op: impl FnOnce(&mut WalletCore) -> Result<T>,
    ) -> CallResult<T> {
        // Clone the Arc out so the registry lock is not held across the
        // (possibly long) wallet operation.
        let slot = match lock(&self.wallets).get(handle) {
            Ok(slot) => slot.0.clone(),
            Err(err) => return CallResult::err(err),
        };
        let mut core = lock(&slot);
        op(&mut core).into()
    }

    // ------------------------------------------------------------------
    // Envelope releases
    // ------------------------------------------------------------------
    //
    // Dropping an envelope releases it; these exist for callers keeping the
    // explicit-release discipline of the call surface.

    pub fn free_string_result(&self, result: CallResult<String>) {
        drop(result);
    }

    pub fn free_utxo_list_result(&self, result: CallResult<Vec<LocalUtxo>>) {
        drop(result);
    }

    pub fn free_uint64_result(&self, result: CallResult<u64>) {
        drop(result);
    }

    pub fn free_void_result(&self, result: CallResult<()>) {
        drop(result);
    }
}

// A caller thread panicking mid-operation must not poison the registries
// for every later call.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
