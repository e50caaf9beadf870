//! Shared fixtures: the well-known testnet descriptor pair, its first
//! external addresses, and a deterministic chain source.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use walletgate::bdk_wallet::bitcoin::hashes::Hash;
use walletgate::bdk_wallet::bitcoin::{
    absolute, transaction, Address, Amount, OutPoint, ScriptBuf, Transaction, TxIn, TxOut, Txid,
};
use walletgate::bdk_wallet::chain::spk_client::FullScanRequest;
use walletgate::bdk_wallet::chain::TxUpdate;
use walletgate::bdk_wallet::{KeychainKind, Update, Wallet};
use walletgate::{ChainSource, Error, Network, Result};

pub const RECEIVE_DESC: &str = "wpkh([c258d2e4/84h/1h/0h]tpubDDYkZojQFQjht8Tm4jsS3iuEmKjTiEGjG6KnuFNKKJb5A6ZUCUZKdvLdSDWofKi4ToRCwb9poe1XdqfUnP4jaJjCB2Zwv11ZLgSbnZSNecE/0/*)";
pub const CHANGE_DESC: &str = "wpkh([c258d2e4/84h/1h/0h]tpubDDYkZojQFQjht8Tm4jsS3iuEmKjTiEGjG6KnuFNKKJb5A6ZUCUZKdvLdSDWofKi4ToRCwb9poe1XdqfUnP4jaJjCB2Zwv11ZLgSbnZSNecE/1/*)";

// First two external addresses for the pair above - used to detect
// derivation drift.
pub const ADDR_0: &str = "tb1qgkhp034fyxeta00h0nne9tzfm0vsxq4prduzxp";
pub const ADDR_1: &str = "tb1qd6u9q327sru2ljvwzdtfrdg36sapax7udz97wf";

pub fn script_for(address: &str) -> ScriptBuf {
    Address::from_str(address)
        .expect("valid address")
        .require_network(Network::Testnet)
        .expect("testnet address")
        .script_pubkey()
}

/// Script at `index` on the change branch, peeked without advancing state.
pub fn internal_script(index: u32) -> ScriptBuf {
    let wallet = Wallet::create(RECEIVE_DESC.to_string(), CHANGE_DESC.to_string())
        .network(Network::Testnet)
        .create_wallet_no_persist()
        .expect("peek wallet");
    wallet.peek_address(KeychainKind::Internal, index).address.script_pubkey()
}

/// Chain source serving a canned set of unconfirmed payments. Each payment
/// becomes its own single-output transaction; `fail_after` turns the source
/// unreachable once that many scans have been served.
pub struct FakeChain {
    payments: Vec<(ScriptBuf, u64)>,
    last_active: Vec<(KeychainKind, u32)>,
    fail_after: Option<u32>,
    calls: AtomicU32,
}

impl FakeChain {
    pub fn new(payments: Vec<(ScriptBuf, u64)>, last_active: Vec<(KeychainKind, u32)>) -> Self {
        Self { payments, last_active, fail_after: None, calls: AtomicU32::new(0) }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn unreachable() -> Self {
        Self::empty().failing_after(0)
    }

    pub fn failing_after(mut self, scans: u32) -> Self {
        self.fail_after = Some(scans);
        self
    }
}

impl ChainSource for FakeChain {
    fn full_scan(
        &self,
        _request: FullScanRequest<KeychainKind>,
        _stop_gap: usize,
    ) -> Result<Update> {
        let served = self.calls.fetch_add(1, Ordering::SeqCst);
        if matches!(self.fail_after, Some(limit) if served >= limit) {
            return Err(Error::Network("electrum backend unreachable".into()));
        }

        let mut tx_update = TxUpdate::default();
        for (salt, (script, sats)) in self.payments.iter().enumerate() {
            let tx = payment_tx(script.clone(), *sats, salt as u32);
            tx_update.seen_ats.insert((tx.compute_txid(), 1_700_000_000 + salt as u64));
            tx_update.txs.push(Arc::new(tx));
        }

        let mut last_active_indices = BTreeMap::new();
        for (keychain, index) in &self.last_active {
            last_active_indices.insert(*keychain, *index);
        }

        Ok(Update { last_active_indices, tx_update, chain: None })
    }
}

// Each payment spends its own synthetic outpoint. A null prevout would make
// the transaction coinbase-shaped, and distinct prevouts keep txids distinct
// for equal payments.
fn payment_tx(script_pubkey: ScriptBuf, sats: u64, salt: u32) -> Transaction {
    let funding = OutPoint::new(Txid::from_byte_array([0xbe; 32]), salt);
    Transaction {
        version: transaction::Version::TWO,
        lock_time: absolute::LockTime::ZERO,
        input: vec![TxIn { previous_output: funding, ..TxIn::default() }],
        output: vec![TxOut { value: Amount::from_sat(sats), script_pubkey }],
    }
}
