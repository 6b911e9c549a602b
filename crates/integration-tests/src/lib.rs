//! Integration tests for Shopfront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_properties` - Cart engine behaviour against the in-memory gateway
//! - `cart_adoption` - Anonymous cart handoff on sign-in
//! - `session_identity` - Durable session and sign-in state
//!
//! This crate provides the shared fixtures: a product factory and
//! [`FlakyGateway`], which wraps a real gateway to inject failures and
//! stall calls.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{RwLock, RwLockWriteGuard};

use shopfront_storefront::gateway::{Filter, Gateway, GatewayError, Record, Table};
use shopfront_storefront::models::{NewProduct, Product};

/// Insert a product priced at `cents` minor units.
///
/// # Panics
///
/// Panics if the insert fails.
#[allow(clippy::unwrap_used)]
pub async fn product(gateway: &impl Gateway, name: &str, cents: i64) -> Product {
    gateway
        .insert::<Product>(&NewProduct {
            name: name.to_owned(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: None,
            price: Decimal::new(cents, 2),
            category_id: None,
            image_url: None,
            in_stock: true,
        })
        .await
        .unwrap()
}

/// Gateway wrapper that can fail or stall calls on demand.
#[derive(Debug, Default)]
pub struct FlakyGateway<G> {
    inner: G,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
    gate: RwLock<()>,
    calls: AtomicUsize,
}

impl<G: Gateway> FlakyGateway<G> {
    /// Wrap `inner`; calls pass through until told otherwise.
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            gate: RwLock::new(()),
            calls: AtomicUsize::new(0),
        }
    }

    /// The wrapped gateway, for setup and inspection that bypasses faults.
    pub const fn inner(&self) -> &G {
        &self.inner
    }

    /// Make `select` and `select_one` fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make `insert`, `update` and `delete` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make only `delete` fail, leaving inserts and updates working.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Stall every call until the returned guard is dropped.
    pub async fn hold(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.write().await
    }

    /// Number of calls that reached this gateway.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if flag.load(Ordering::SeqCst) {
            return Err(GatewayError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

impl<G: Gateway> Gateway for FlakyGateway<G> {
    async fn select<R: Record>(&self, filter: &Filter) -> Result<Vec<R>, GatewayError> {
        let _gate = self.gate.read().await;
        self.check(&self.fail_reads)?;
        self.inner.select(filter).await
    }

    async fn select_one<R: Record>(&self, filter: &Filter) -> Result<R, GatewayError> {
        let _gate = self.gate.read().await;
        self.check(&self.fail_reads)?;
        self.inner.select_one(filter).await
    }

    async fn insert<R: Record>(&self, draft: &R::Draft) -> Result<R, GatewayError> {
        let _gate = self.gate.read().await;
        self.check(&self.fail_writes)?;
        self.inner.insert(draft).await
    }

    async fn update<R: Record, P: Serialize + Sync>(
        &self,
        id: R::Id,
        patch: &P,
    ) -> Result<R, GatewayError> {
        let _gate = self.gate.read().await;
        self.check(&self.fail_writes)?;
        self.inner.update::<R, P>(id, patch).await
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64, GatewayError> {
        let _gate = self.gate.read().await;
        self.check(&self.fail_writes)?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(GatewayError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.delete(table, filter).await
    }
}
