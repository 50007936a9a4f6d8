//! In-memory purchase store for tests.
//!
//! Transactions stage their statements and apply them under the store lock
//! at commit, so a dropped or rolled back transaction leaves nothing behind.
//! Check constraints mirror the `purchases` table. Faults can be injected per
//! column to exercise rollback and cancellation, and commits can be held
//! back until several transactions are open at once.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::bail;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Barrier;

use super::model::{Column, FieldUpdate, NewPurchase, Purchase};
use super::store::{PurchaseStore, PurchaseTransaction, StoreResult};

/// A statement that reached the table through a committed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    TouchPurchaseDate { id: i64 },
    Set { id: i64, update: FieldUpdate },
}

impl Statement {
    pub fn column(&self) -> Column {
        match self {
            Statement::TouchPurchaseDate { .. } => Column::PurchaseDate,
            Statement::Set { update, .. } => update.column(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    rows: BTreeMap<i64, Purchase>,
    last_id: i64,
    committed: Vec<Statement>,
    open_transactions: usize,
    peak_open_transactions: usize,
    commit_gate: Option<Arc<Barrier>>,
    failing: HashSet<Column>,
    stalled: HashSet<Column>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPurchaseStore {
    state: Arc<Mutex<State>>,
}

impl MemoryPurchaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements touching `column` fail with a storage error.
    pub fn fail_on(&self, column: Column) {
        self.lock().failing.insert(column);
    }

    /// Statements touching `column` never complete.
    pub fn stall_on(&self, column: Column) {
        self.lock().stalled.insert(column);
    }

    /// Holds every commit until `transactions` commits are waiting, then
    /// releases them together.
    pub fn gate_commits(&self, transactions: usize) {
        self.lock().commit_gate = Some(Arc::new(Barrier::new(transactions)));
    }

    /// Row as stored, including removed ones.
    pub fn raw(&self, id: i64) -> Option<Purchase> {
        self.lock().rows.get(&id).cloned()
    }

    pub fn committed_statements(&self) -> Vec<Statement> {
        self.lock().committed.clone()
    }

    pub fn open_transactions(&self) -> usize {
        self.lock().open_transactions
    }

    /// Most transactions ever open at the same time.
    pub fn peak_open_transactions(&self) -> usize {
        self.lock().peak_open_transactions
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_fault(&self, column: Column) -> StoreResult<bool> {
        let state = self.lock();
        if state.failing.contains(&column) {
            bail!("injected failure writing column {}", column.name());
        }
        Ok(state.stalled.contains(&column))
    }
}

fn check_constraints(price: i32, quantity: i32, product_id: i64) -> StoreResult<()> {
    if price < 0 {
        bail!("new row for relation \"purchases\" violates check constraint on price");
    }
    if quantity <= 0 {
        bail!("new row for relation \"purchases\" violates check constraint on quantity");
    }
    if product_id < 0 {
        bail!("new row for relation \"purchases\" violates check constraint on product_id");
    }
    Ok(())
}

/// A refreshed timestamp is always at least one microsecond later.
fn refreshed(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    now.max(previous + Duration::microseconds(1))
}

#[async_trait]
impl PurchaseStore for MemoryPurchaseStore {
    async fn insert(&self, purchase: &NewPurchase) -> StoreResult<i64> {
        check_constraints(purchase.price, purchase.quantity, purchase.product_id)?;

        let mut state = self.lock();
        state.last_id += 1;
        let id = state.last_id;
        state.rows.insert(
            id,
            Purchase {
                id,
                owner_id: purchase.owner_id,
                product_id: purchase.product_id,
                price: purchase.price,
                quantity: purchase.quantity,
                purchase_date: Utc::now(),
                removed: false,
            },
        );

        Ok(id)
    }

    async fn find_active(&self, id: i64) -> StoreResult<Option<Purchase>> {
        Ok(self.lock().rows.get(&id).filter(|p| !p.removed).cloned())
    }

    async fn list_active(&self) -> StoreResult<Vec<Purchase>> {
        Ok(self
            .lock()
            .rows
            .values()
            .filter(|p| !p.removed)
            .cloned()
            .collect())
    }

    async fn list_active_by_owner(&self, owner_id: i64) -> StoreResult<Vec<Purchase>> {
        Ok(self
            .lock()
            .rows
            .values()
            .filter(|p| !p.removed && p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn mark_removed(&self, id: i64) -> StoreResult<u64> {
        let mut state = self.lock();
        match state.rows.get_mut(&id) {
            Some(purchase) if !purchase.removed => {
                purchase.removed = true;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn begin(&self) -> StoreResult<Box<dyn PurchaseTransaction>> {
        let mut state = self.lock();
        state.open_transactions += 1;
        state.peak_open_transactions = state.peak_open_transactions.max(state.open_transactions);
        drop(state);

        Ok(Box::new(MemoryTransaction {
            store: self.clone(),
            staged: Vec::new(),
            finished: false,
        }))
    }
}

pub struct MemoryTransaction {
    store: MemoryPurchaseStore,
    staged: Vec<Statement>,
    finished: bool,
}

impl MemoryTransaction {
    async fn stage(&mut self, statement: Statement) -> StoreResult<u64> {
        if self.store.check_fault(statement.column())? {
            std::future::pending::<()>().await;
        }

        let state = self.store.lock();
        let Some(row) = state.rows.get(&statement_id(&statement)) else {
            return Ok(0);
        };

        match statement {
            Statement::TouchPurchaseDate { .. } if row.removed => return Ok(0),
            Statement::TouchPurchaseDate { .. } => {}
            Statement::Set { update, .. } => {
                let (mut price, mut quantity, mut product_id) =
                    (row.price, row.quantity, row.product_id);
                match update {
                    FieldUpdate::Quantity(value) => quantity = value,
                    FieldUpdate::Price(value) => price = value,
                    FieldUpdate::ProductId(value) => product_id = value,
                }
                check_constraints(price, quantity, product_id)?;
            }
        }
        drop(state);

        self.staged.push(statement);
        Ok(1)
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            let mut state = self.store.lock();
            state.open_transactions = state.open_transactions.saturating_sub(1);
        }
    }
}

fn statement_id(statement: &Statement) -> i64 {
    match statement {
        Statement::TouchPurchaseDate { id } | Statement::Set { id, .. } => *id,
    }
}

#[async_trait]
impl PurchaseTransaction for MemoryTransaction {
    async fn touch_purchase_date(&mut self, id: i64) -> StoreResult<u64> {
        self.stage(Statement::TouchPurchaseDate { id }).await
    }

    async fn apply(&mut self, id: i64, update: FieldUpdate) -> StoreResult<u64> {
        self.stage(Statement::Set { id, update }).await
    }

    async fn commit(mut self: Box<Self>) -> StoreResult<()> {
        let gate = self.store.lock().commit_gate.clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }

        let staged = std::mem::take(&mut self.staged);
        {
            let mut state = self.store.lock();
            for statement in &staged {
                let Some(row) = state.rows.get_mut(&statement_id(statement)) else {
                    continue;
                };
                match *statement {
                    Statement::TouchPurchaseDate { .. } => {
                        row.purchase_date = refreshed(row.purchase_date)
                    }
                    Statement::Set { update, .. } => match update {
                        FieldUpdate::Quantity(value) => row.quantity = value,
                        FieldUpdate::Price(value) => row.price = value,
                        FieldUpdate::ProductId(value) => row.product_id = value,
                    },
                }
            }
            state.committed.extend(staged);
        }
        self.finish();
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> StoreResult<()> {
        self.staged.clear();
        self.finish();
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        self.finish();
    }
}
