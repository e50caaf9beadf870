//! Wallet core - descriptor wallet over an injected chain source.
//!
//! Thin wrapper over bdk_wallet 2.x. Holds the parsed receive and change
//! descriptors, the per-keychain derivation state, the synchronized UTXO set,
//! and the backing store (in-memory, or bdk_file_store on disk). All network
//! access goes through the [`ChainSource`] supplied at construction.

use std::path::{Path, PathBuf};

use bdk_wallet::bitcoin::Network;
use bdk_wallet::file_store::Store as FileStore;
use bdk_wallet::{
    ChangeSet, CreateWithPersistError, KeychainKind, LoadWithPersistError, PersistedWallet, Wallet,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info};

use crate::chain::ChainSource;
use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

/// Store file format tag.
const MAGIC: &[u8] = b"wgate001";

/// Reference to a transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutPoint {
    /// The funding transaction id, hex encoded.
    pub txid: String,
    /// Output index within that transaction.
    pub vout: u32,
}

/// The output itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    /// Value in satoshis.
    pub value: u64,
    /// Spending conditions, hex encoded.
    pub script_pubkey: String,
}

/// Derivation branch an output belongs to.
///
/// Boundary encoding is numeric: 0 for the external (receive) branch, 1 for
/// the internal (change) branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keychain {
    External,
    Internal,
}

impl Keychain {
    pub fn index(self) -> u8 {
        match self {
            Keychain::External => 0,
            Keychain::Internal => 1,
        }
    }
}

impl From<KeychainKind> for Keychain {
    fn from(kind: KeychainKind) -> Self {
        match kind {
            KeychainKind::External => Keychain::External,
            KeychainKind::Internal => Keychain::Internal,
        }
    }
}

impl Serialize for Keychain {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.index())
    }
}

impl<'de> Deserialize<'de> for Keychain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(Keychain::External),
            1 => Ok(Keychain::Internal),
            other => Err(serde::de::Error::custom(format!("keychain out of range: {other}"))),
        }
    }
}

/// An unspent output known to the wallet as of the last successful sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUtxo {
    pub outpoint: OutPoint,
    pub txout: TxOut,
    pub keychain: Keychain,
}

/// Balance breakdown at the last synchronized state. Components sum to the
/// total reported across the boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDetail {
    pub confirmed: u64,
    pub trusted_pending: u64,
    pub untrusted_pending: u64,
    pub immature: u64,
}

impl BalanceDetail {
    pub fn total(&self) -> u64 {
        self.confirmed + self.trusted_pending + self.untrusted_pending + self.immature
    }
}

enum Backing {
    Memory(Wallet),
    File { wallet: PersistedWallet<FileStore<ChangeSet>>, store: FileStore<ChangeSet> },
}

impl Backing {
    fn wallet(&self) -> &Wallet {
        match self {
            Backing::Memory(wallet) => wallet,
            Backing::File { wallet, .. } => wallet,
        }
    }

    fn wallet_mut(&mut self) -> &mut Wallet {
        match self {
            Backing::Memory(wallet) => wallet,
            Backing::File { wallet, .. } => wallet,
        }
    }

    fn persist(&mut self) -> Result<()> {
        match self {
            Backing::Memory(_) => Ok(()),
            Backing::File { wallet, store } => {
                wallet.persist(store).map_err(Error::persistence)?;
                Ok(())
            }
        }
    }
}

pub struct WalletCore {
    backing: Backing,
    chain: Box<dyn ChainSource>,
    stop_gap: usize,
}

impl std::fmt::Debug for WalletCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletCore")
            .field("stop_gap", &self.stop_gap)
            .finish_non_exhaustive()
    }
}

impl WalletCore {
    /// Parses both descriptors and opens the backing store. The chain source
    /// is held, not contacted; connectivity failures surface on [`sync`].
    ///
    /// [`sync`]: WalletCore::sync
    pub fn create(
        descriptor: &str,
        change_descriptor: &str,
        network: Network,
        database: &DatabaseConfig,
        chain: Box<dyn ChainSource>,
        stop_gap: u32,
    ) -> Result<Self> {
        if descriptor.trim().is_empty() || change_descriptor.trim().is_empty() {
            return Err(Error::descriptor("descriptor must not be empty"));
        }

        let backing = match database {
            DatabaseConfig::Memory => {
                let wallet = Wallet::create(descriptor.to_string(), change_descriptor.to_string())
                    .network(network)
                    .create_wallet_no_persist()
                    .map_err(Error::descriptor)?;
                Backing::Memory(wallet)
            }
            DatabaseConfig::Persistent { path, id } => {
                std::fs::create_dir_all(path).map_err(Error::persistence)?;
                let file = store_file(path, id);
                let (mut store, changeset) =
                    FileStore::load_or_create(MAGIC, &file).map_err(Error::persistence)?;

                let wallet = if changeset.is_some() {
                    Wallet::load()
                        .descriptor(KeychainKind::External, Some(descriptor.to_string()))
                        .descriptor(KeychainKind::Internal, Some(change_descriptor.to_string()))
                        .check_network(network)
                        .load_wallet(&mut store)
                        .map_err(|e| match e {
                            // Stored state not matching the supplied
                            // descriptors is a descriptor problem, not a
                            // store problem.
                            LoadWithPersistError::InvalidChangeSet(e) => Error::descriptor(e),
                            other => Error::persistence(other),
                        })?
                        .ok_or_else(|| Error::persistence("store holds no wallet data"))?
                } else {
                    Wallet::create(descriptor.to_string(), change_descriptor.to_string())
                        .network(network)
                        .create_wallet(&mut store)
                        .map_err(|e| match e {
                            CreateWithPersistError::Descriptor(e) => Error::descriptor(e),
                            other => Error::persistence(other),
                        })?
                };
                info!(file = %file.display(), "wallet store opened");
                Backing::File { wallet, store }
            }
        };

        Ok(Self { backing, chain, stop_gap: stop_gap as usize })
    }

    /// Full rescan of both keychains. Either the whole update lands or, on
    /// failure, the prior UTXO set and chain state are left untouched.
    pub fn sync(&mut self) -> Result<()> {
        let request = self.backing.wallet_mut().start_full_scan().build();
        let update = self.chain.full_scan(request, self.stop_gap)?;
        self.backing.wallet_mut().apply_update(update).map_err(Error::network)?;
        self.backing.persist()?;
        debug!(utxos = self.backing.wallet().list_unspent().count(), "sync applied");
        Ok(())
    }

    /// Derives the address at the current unused external index and advances
    /// the index. Two successive calls never return the same address.
    pub fn new_address(&mut self) -> Result<String> {
        let address = self
            .backing
            .wallet_mut()
            .reveal_next_address(KeychainKind::External)
            .address
            .to_string();
        self.backing.persist()?;
        Ok(address)
    }

    /// UTXO snapshot as of the last successful sync. Does not sync.
    pub fn list_unspent(&self) -> Vec<LocalUtxo> {
        self.backing
            .wallet()
            .list_unspent()
            .map(|utxo| LocalUtxo {
                outpoint: OutPoint {
                    txid: utxo.outpoint.txid.to_string(),
                    vout: utxo.outpoint.vout,
                },
                txout: TxOut {
                    value: utxo.txout.value.to_sat(),
                    script_pubkey: format!("{:x}", utxo.txout.script_pubkey),
                },
                keychain: utxo.keychain.into(),
            })
            .collect()
    }

    /// Total spendable value as of the last successful sync.
    pub fn balance(&self) -> u64 {
        self.balance_detail().total()
    }

    pub fn balance_detail(&self) -> BalanceDetail {
        let balance = self.backing.wallet().balance();
        BalanceDetail {
            confirmed: balance.confirmed.to_sat(),
            trusted_pending: balance.trusted_pending.to_sat(),
            untrusted_pending: balance.untrusted_pending.to_sat(),
            immature: balance.immature.to_sat(),
        }
    }
}

fn store_file(path: &Path, id: &str) -> PathBuf {
    path.join(format!("{id}.dat"))
}
