//! `Repository`: the single implementation of `StoragePort`, generic over
//! any `KeyValueStore`.
//!
//! Key layout (all big-endian so `prefix_scan` walks rows in ascending
//! order):
//!
//! ```text
//! account:{id:8}                 -> bincode(Account)
//! block:{height:8}                -> bincode(Block)
//! nonce:{height:8}{miner_id:8}    -> bincode(NonceSubmission)
//! tx:{id:8}                       -> bincode(Transaction)
//! meta:next_tx_id                 -> bincode(u64)
//! ```
//!
//! `KeyValueStore::atomic_batch_write` only guarantees atomic application of
//! a pre-built operation list, not a read-modify-write transaction. Every
//! `StoragePort` method that reads then writes (reward crediting, payout
//! batches, config messages) is additionally serialised behind `write_lock`
//! so the read-modify-write sequence itself is atomic with respect to other
//! mutators of this `Repository`.

use crate::domain::entities::{Account, Block, NonceSubmission, Transaction};
use crate::ports::inbound::{PayoutCredit, RewardCredit, StoragePort};
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use shared_types::{PayoutInterval, StorageError};
use std::sync::Mutex;

const ACCOUNT_PREFIX: &[u8] = b"account:";
const BLOCK_PREFIX: &[u8] = b"block:";
const NONCE_PREFIX: &[u8] = b"nonce:";
const TX_PREFIX: &[u8] = b"tx:";
const NEXT_TX_ID_KEY: &[u8] = b"meta:next_tx_id";

const DAY_SECS: i64 = 86_400;
const WEEK_SECS: i64 = 7 * DAY_SECS;

fn account_key(id: u64) -> Vec<u8> {
    [ACCOUNT_PREFIX, &id.to_be_bytes()].concat()
}

fn block_key(height: u64) -> Vec<u8> {
    [BLOCK_PREFIX, &height.to_be_bytes()].concat()
}

fn nonce_key(height: u64, miner_id: u64) -> Vec<u8> {
    [NONCE_PREFIX, &height.to_be_bytes(), &miner_id.to_be_bytes()].concat()
}

fn tx_key(id: u64) -> Vec<u8> {
    [TX_PREFIX, &id.to_be_bytes()].concat()
}

pub struct Repository<S: KeyValueStore> {
    store: S,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    fn read_account(&self, id: u64) -> Result<Option<Account>, StorageError> {
        match self.store.get(&account_key(id))? {
            Some(bytes) => Ok(Some(crate::adapters::serializer::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn next_tx_id(&self) -> Result<u64, StorageError> {
        let current: u64 = match self.store.get(NEXT_TX_ID_KEY)? {
            Some(bytes) => crate::adapters::serializer::decode(&bytes)?,
            None => 1,
        };
        self.store.put(
            NEXT_TX_ID_KEY,
            &crate::adapters::serializer::encode(&(current + 1))?,
        )?;
        Ok(current)
    }
}

impl<S: KeyValueStore> StoragePort for Repository<S> {
    fn get_account(&self, id: u64) -> Result<Option<Account>, StorageError> {
        self.read_account(id)
    }

    fn put_account(&self, account: &Account) -> Result<(), StorageError> {
        self.store
            .put(&account_key(account.id), &crate::adapters::serializer::encode(account)?)?;
        Ok(())
    }

    fn payout_candidates(
        &self,
        minimum_payout: i64,
        pool_tx_fee: i64,
        now: i64,
    ) -> Result<Vec<Account>, StorageError> {
        let rows = self.store.prefix_scan(ACCOUNT_PREFIX)?;
        let mut out = Vec::new();
        for (_, bytes) in rows {
            let account: Account = crate::adapters::serializer::decode(&bytes)?;
            let eligible = match (account.min_payout_value, account.next_payout_date) {
                (Some(min), _) => account.pending >= min + pool_tx_fee,
                (None, Some(next)) => next <= now && account.pending >= pool_tx_fee,
                (None, None) => account.pending >= minimum_payout + pool_tx_fee,
            };
            if eligible {
                out.push(account);
            }
        }
        Ok(out)
    }

    fn mark_account_evicted(&self, id: u64) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap();
        let Some(mut account) = self.read_account(id)? else {
            return Ok(());
        };
        account.evicted = true;
        self.store
            .put(&account_key(id), &crate::adapters::serializer::encode(&account)?)?;
        Ok(())
    }

    fn sweep_evicted_accounts(&self, fee_account_id: Option<u64>) -> Result<Vec<Account>, StorageError> {
        let _guard = self.write_lock.lock().unwrap();
        let rows = self.store.prefix_scan(ACCOUNT_PREFIX)?;
        let mut ops = Vec::new();
        let mut swept = Vec::new();
        let mut stranded_total: i64 = 0;

        for (key, bytes) in rows {
            let account: Account = crate::adapters::serializer::decode(&bytes)?;
            if !account.evicted {
                continue;
            }
            if account.pending > 0 {
                let Some(fee_account_id) = fee_account_id else {
                    continue;
                };
                if fee_account_id == account.id {
                    continue;
                }
                stranded_total += account.pending;
            }
            ops.push(BatchOperation::delete(key));
            swept.push(account);
        }

        if stranded_total > 0 {
            let fee_account_id = fee_account_id.expect("stranded_total only accrues with a configured fee account");
            let mut fee_account = self
                .read_account(fee_account_id)?
                .ok_or(StorageError::NotFound)?;
            fee_account.pending += stranded_total;
            ops.push(BatchOperation::put(
                account_key(fee_account_id),
                crate::adapters::serializer::encode(&fee_account)?,
            ));
        }

        self.store.atomic_batch_write(ops)?;
        Ok(swept)
    }

    fn get_block(&self, height: u64) -> Result<Option<Block>, StorageError> {
        match self.store.get(&block_key(height))? {
            Some(bytes) => Ok(Some(crate::adapters::serializer::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_block(&self, block: &Block) -> Result<(), StorageError> {
        self.store
            .put(&block_key(block.height), &crate::adapters::serializer::encode(block)?)?;
        Ok(())
    }

    fn unverified_blocks(
        &self,
        height_cutoff: u64,
        created_cutoff: i64,
    ) -> Result<Vec<Block>, StorageError> {
        let rows = self.store.prefix_scan(BLOCK_PREFIX)?;
        let mut out = Vec::new();
        for (_, bytes) in rows {
            let block: Block = crate::adapters::serializer::decode(&bytes)?;
            if !block.winner_verified && block.height <= height_cutoff && block.created <= created_cutoff {
                out.push(block);
            }
        }
        out.sort_by_key(|b| b.height);
        Ok(out)
    }

    fn delete_blocks_older_than(&self, cutoff: u64) -> Result<Vec<Block>, StorageError> {
        let _guard = self.write_lock.lock().unwrap();
        let rows = self.store.prefix_scan(BLOCK_PREFIX)?;
        let mut deleted = Vec::new();
        let mut ops = Vec::new();
        for (key, bytes) in rows {
            let block: Block = crate::adapters::serializer::decode(&bytes)?;
            if block.height < cutoff {
                ops.push(BatchOperation::delete(key));
                deleted.push(block);
            }
        }
        self.store.atomic_batch_write(ops)?;
        Ok(deleted)
    }

    fn get_nonce_submission(
        &self,
        miner_id: u64,
        height: u64,
    ) -> Result<Option<NonceSubmission>, StorageError> {
        match self.store.get(&nonce_key(height, miner_id))? {
            Some(bytes) => Ok(Some(crate::adapters::serializer::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn upsert_nonce_submission(&self, submission: &NonceSubmission) -> Result<(), StorageError> {
        self.store.put(
            &nonce_key(submission.block_height, submission.miner_id),
            &crate::adapters::serializer::encode(submission)?,
        )?;
        Ok(())
    }

    fn reward_block(
        &self,
        height: u64,
        winner_id: u64,
        total_reward: i64,
        credits: &[RewardCredit],
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap();
        let mut block = self
            .get_block(height)?
            .ok_or(StorageError::NotFound)?;
        block.winner_verified = true;
        block.winner_id = Some(winner_id);
        block.reward = Some(total_reward);

        let mut ops = vec![BatchOperation::put(
            block_key(height),
            crate::adapters::serializer::encode(&block)?,
        )];

        for credit in credits {
            let mut account = self
                .read_account(credit.miner_id)?
                .ok_or(StorageError::NotFound)?;
            account.pending += credit.amount;
            ops.push(BatchOperation::put(
                account_key(credit.miner_id),
                crate::adapters::serializer::encode(&account)?,
            ));
        }

        self.store.atomic_batch_write(ops)?;
        Ok(())
    }

    fn mark_block_unverified_loss(&self, height: u64) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap();
        let mut block = self
            .get_block(height)?
            .ok_or(StorageError::NotFound)?;
        block.winner_verified = true;
        self.put_block(&block)
    }

    fn apply_payout_batch(
        &self,
        credits: &[PayoutCredit],
        pool_tx_fee: i64,
        now: i64,
        wallet_tx_id: Option<u64>,
        block_height: Option<u64>,
    ) -> Result<Vec<Transaction>, StorageError> {
        let _guard = self.write_lock.lock().unwrap();
        let mut ops = Vec::new();
        let mut transactions = Vec::new();

        for credit in credits {
            let mut account = self
                .read_account(credit.account_id)?
                .ok_or(StorageError::NotFound)?;
            account.pending = 0;
            account.next_payout_date = match account.payout_interval {
                Some(PayoutInterval::Weekly) => Some(now + WEEK_SECS),
                Some(PayoutInterval::Daily) => Some(now + DAY_SECS),
                Some(PayoutInterval::Now) | None => None,
            };
            ops.push(BatchOperation::put(
                account_key(credit.account_id),
                crate::adapters::serializer::encode(&account)?,
            ));

            let id = self.next_tx_id()?;
            let tx = Transaction {
                id,
                amount: credit.credited - pool_tx_fee,
                recipient_id: Some(credit.account_id),
                created: now,
                transaction_id: wallet_tx_id,
                block_height,
            };
            ops.push(BatchOperation::put(
                tx_key(id),
                crate::adapters::serializer::encode(&tx)?,
            ));
            transactions.push(tx);
        }

        self.store.atomic_batch_write(ops)?;
        Ok(transactions)
    }

    fn pending_transactions(&self) -> Result<Vec<Transaction>, StorageError> {
        let rows = self.store.prefix_scan(TX_PREFIX)?;
        let mut out = Vec::new();
        for (_, bytes) in rows {
            let tx: Transaction = crate::adapters::serializer::decode(&bytes)?;
            if tx.block_height.is_none() {
                out.push(tx);
            }
        }
        Ok(out)
    }

    fn confirm_transaction(&self, id: u64, block_height: u64) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap();
        let bytes = self
            .store
            .get(&tx_key(id))?
            .ok_or(StorageError::NotFound)?;
        let mut tx: Transaction = crate::adapters::serializer::decode(&bytes)?;
        tx.block_height = Some(block_height);
        self.store
            .put(&tx_key(id), &crate::adapters::serializer::encode(&tx)?)?;
        Ok(())
    }

    fn delete_transaction(&self, id: u64) -> Result<(), StorageError> {
        self.store.delete(&tx_key(id))?;
        Ok(())
    }

    fn apply_config_message(
        &self,
        account_id: u64,
        fee_account_id: u64,
        fee: i64,
        apply: Box<dyn FnOnce(&mut Account) + Send>,
    ) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().unwrap();
        let mut account = self
            .read_account(account_id)?
            .ok_or(StorageError::NotFound)?;
        if account.pending < fee {
            return Ok(false);
        }
        apply(&mut account);
        account.pending -= fee;

        let mut fee_account = self
            .read_account(fee_account_id)?
            .ok_or(StorageError::NotFound)?;
        fee_account.pending += fee;

        let ops = vec![
            BatchOperation::put(account_key(account_id), crate::adapters::serializer::encode(&account)?),
            BatchOperation::put(
                account_key(fee_account_id),
                crate::adapters::serializer::encode(&fee_account)?,
            ),
        ];
        self.store.atomic_batch_write(ops)?;
        Ok(true)
    }
}
