//! Walletgate: a descriptor-based Bitcoin wallet behind a generation-checked
//! handle boundary.
//!
//! # Architecture
//!
//! ```text
//! Boundary (call surface: handles in, envelopes out)
//!   │
//!   ├── Registry<BlockchainConfig>   (Electrum endpoint, stop-gap, timeout)
//!   ├── Registry<DatabaseConfig>     (memory | file store)
//!   └── Registry<WalletSlot>
//!         └── WalletCore
//!               ├── bdk_wallet   (descriptors, keychain indices, UTXO set)
//!               ├── ChainSource  (Electrum full scan; fakes in tests)
//!               └── Backing      (in-memory | bdk_file_store)
//! ```
//!
//! Every object handed to the caller - configs, wallets - is owned by a
//! boundary registry and addressed by a `Copy` token carrying the slot's
//! generation. Releasing an object bumps the generation, so double-release
//! and use-after-release are `InvalidArgument` errors, never undefined
//! behavior. Fallible operations return a [`CallResult`] envelope with
//! exactly one populated branch.
//!
//! # Call surface
//!
//! | Operation | Returns |
//! |-----------|---------|
//! | `new_electrum_config` / `new_memory_config` / `new_persistent_config` | config handle |
//! | `free_blockchain_config` / `free_database_config` | `Result<()>` |
//! | `new_wallet` / `new_wallet_with_chain` | `CallResult<WalletHandle>` |
//! | `free_wallet` / `free_wallet_result` | `Result<()>` / `()` |
//! | `sync_wallet` | `CallResult<()>` |
//! | `new_address` | `CallResult<String>` |
//! | `list_unspent` | `CallResult<Vec<LocalUtxo>>` |
//! | `balance` | `CallResult<u64>` |
//! | `free_*_result` | `()` |
//!
//! # Usage
//!
//! ```ignore
//! use walletgate::Boundary;
//!
//! let boundary = Boundary::default(); // testnet
//! let bc = boundary.new_electrum_config("ssl://electrum.blockstream.info:60002", None, 20, 30);
//! let db = boundary.new_memory_config();
//!
//! let wallet = boundary.new_wallet(RECEIVE_DESC, CHANGE_DESC, bc, db).into_result()?;
//! boundary.sync_wallet(wallet).into_result()?;
//! let address = boundary.new_address(wallet).into_result()?;
//! let total = boundary.balance(wallet).into_result()?;
//!
//! boundary.free_wallet(wallet)?;
//! boundary.free_blockchain_config(bc)?;
//! boundary.free_database_config(db)?;
//! ```

pub mod boundary;
pub mod chain;
pub mod config;
pub mod envelope;
pub mod error;
pub mod handle;
pub mod logging;
pub mod wallet;

pub use boundary::{
    BlockchainConfigHandle, Boundary, DatabaseConfigHandle, WalletHandle, WalletSlot,
};
pub use chain::{ChainSource, ElectrumSource};
pub use config::{BlockchainConfig, DatabaseConfig};
pub use envelope::CallResult;
pub use error::{Error, ErrorKind, Result};
pub use handle::{Handle, Registry};
pub use wallet::{BalanceDetail, Keychain, LocalUtxo, OutPoint, TxOut, WalletCore};

pub use bdk_wallet::bitcoin::Network;

// re-export bdk_wallet so embedders and tests share one version
pub use bdk_wallet;
