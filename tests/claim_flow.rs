//! Claim flow integration tests
//!
//! Exercises the full path: allocation list → built distribution →
//! distributor claims against an in-memory token ledger.
//! 1. Two-recipient walkthrough (success, repeat, wrong amount, wrong proof)
//! 2. At-most-once under concurrent claims
//! 3. Rollback when custody refuses the transfer
//! 4. Sweep leaves claim state alone
//! 5. A recipient re-entering `claim` during its own transfer
//! 6. Panicking transfers and dropped claim futures leave no mark

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use merkledrop_builder::{Allocation, Distribution};
use merkledrop_core::{Address, Amount};
use merkledrop_distributor::{
    Distributor, DistributorError, DistributorEvent, FixedAdmin, InMemoryTokenLedger, TokenLedger,
    TransferError,
};
use merkledrop_merkle::HashAlgorithm;

const ASSET: Address = Address::repeat_byte(0xEE);
const CUSTODY: Address = Address::repeat_byte(0xCC);
const ADMIN: Address = Address::repeat_byte(0xAD);
const ALICE: Address = Address::repeat_byte(0xA);
const BOB: Address = Address::repeat_byte(0xB);

fn two_recipients() -> Distribution {
    Distribution::build(
        HashAlgorithm::Keccak256,
        &[Allocation::new(ALICE, 100), Allocation::new(BOB, 200)],
    )
    .unwrap()
}

fn deploy(distribution: &Distribution, custody: Amount) -> (Arc<Distributor>, Arc<InMemoryTokenLedger>) {
    let token = Arc::new(InMemoryTokenLedger::new(ASSET, CUSTODY).with_balance(CUSTODY, custody));
    let distributor = Distributor::new(
        distribution.config(),
        token.clone(),
        Arc::new(FixedAdmin(ADMIN)),
    );
    (Arc::new(distributor), token)
}

#[tokio::test]
async fn test_two_recipient_walkthrough() {
    let distribution = two_recipients();
    let (distributor, token) = deploy(&distribution, 300);
    let alice = distribution.claim_for(&ALICE).unwrap();
    let bob = distribution.claim_for(&BOB).unwrap();

    let receipt = distributor.claim(ALICE, 100, &alice.proof).await.unwrap();
    assert_eq!(receipt.amount, 100);
    assert!(distributor.is_claimed(&ALICE));
    assert_eq!(token.balance(&ALICE), 100);

    assert!(matches!(
        distributor.claim(ALICE, 100, &alice.proof).await,
        Err(DistributorError::AlreadyClaimed)
    ));
    assert_eq!(token.balance(&ALICE), 100);

    // Already-claimed check runs before verification.
    assert!(matches!(
        distributor.claim(ALICE, 999, &alice.proof).await,
        Err(DistributorError::AlreadyClaimed)
    ));

    // Bob presenting Alice's proof.
    assert!(matches!(
        distributor.claim(BOB, 200, &alice.proof).await,
        Err(DistributorError::NotInMerkle)
    ));
    assert!(!distributor.is_claimed(&BOB));

    distributor.claim(BOB, 200, &bob.proof).await.unwrap();
    assert_eq!(token.custody_balance(), 0);
    assert_eq!(
        distributor.events().events(),
        vec![
            DistributorEvent::Claimed {
                recipient: ALICE,
                amount: 100
            },
            DistributorEvent::Claimed {
                recipient: BOB,
                amount: 200
            },
        ]
    );
}

#[tokio::test]
async fn test_wrong_amount_before_claiming() {
    let distribution = two_recipients();
    let (distributor, token) = deploy(&distribution, 300);
    let alice = distribution.claim_for(&ALICE).unwrap();

    assert!(matches!(
        distributor.claim(ALICE, 999, &alice.proof).await,
        Err(DistributorError::NotInMerkle)
    ));
    assert!(!distributor.is_claimed(&ALICE));
    assert_eq!(token.custody_balance(), 300);
    assert!(distributor.events().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_pay_once() {
    let distribution = two_recipients();
    let (distributor, token) = deploy(&distribution, 300);
    let proof = distribution.claim_for(&ALICE).unwrap().proof.clone();

    let handles = (0..32).map(|_| {
        let distributor = distributor.clone();
        let proof = proof.clone();
        tokio::spawn(async move { distributor.claim(ALICE, 100, &proof).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, DistributorError::AlreadyClaimed)));
    assert_eq!(token.balance(&ALICE), 100);
    assert_eq!(token.custody_balance(), 200);
    assert_eq!(distributor.events().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_recipients_drain_custody() {
    let mut rng = StdRng::seed_from_u64(7);
    let allocations: Vec<Allocation> = (0..50)
        .map(|_| Allocation::new(Address::new(rng.gen()), rng.gen_range(1..1_000_000u128)))
        .collect();
    let distribution = Distribution::build(HashAlgorithm::Keccak256, &allocations).unwrap();
    let (distributor, token) = deploy(&distribution, distribution.token_total);

    let claims = distribution.claims.iter().map(|(address, entry)| {
        let distributor = distributor.clone();
        let (address, amount, proof) = (*address, entry.amount, entry.proof.clone());
        tokio::spawn(async move { distributor.claim(address, amount, &proof).await })
    });
    for joined in join_all(claims).await {
        joined.unwrap().unwrap();
    }

    assert_eq!(token.custody_balance(), 0);
    assert_eq!(distributor.ledger().claimed_count(), allocations.len());
    for allocation in &allocations {
        assert_eq!(token.balance(&allocation.address), allocation.amount);
    }
}

#[tokio::test]
async fn test_failed_transfer_rolls_back() {
    let distribution = two_recipients();
    let (distributor, token) = deploy(&distribution, 300);
    let bob = distribution.claim_for(&BOB).unwrap();

    token.reject_transfers_to(BOB);
    let err = distributor.claim(BOB, 200, &bob.proof).await.unwrap_err();
    assert!(matches!(
        err,
        DistributorError::TransferFailed(TransferError::RecipientRejected(BOB))
    ));
    assert!(err.is_retriable());
    assert!(!distributor.is_claimed(&BOB));
    assert_eq!(token.custody_balance(), 300);
    assert!(distributor.events().is_empty());

    token.accept_transfers_to(&BOB);
    distributor.claim(BOB, 200, &bob.proof).await.unwrap();
    assert_eq!(token.balance(&BOB), 200);
}

#[tokio::test]
async fn test_underfunded_custody_rolls_back() {
    let distribution = two_recipients();
    let (distributor, token) = deploy(&distribution, 150);
    let bob = distribution.claim_for(&BOB).unwrap();

    assert!(matches!(
        distributor.claim(BOB, 200, &bob.proof).await,
        Err(DistributorError::TransferFailed(
            TransferError::InsufficientBalance {
                available: 150,
                requested: 200
            }
        ))
    ));
    assert!(!distributor.is_claimed(&BOB));

    token.mint(CUSTODY, 50).unwrap();
    distributor.claim(BOB, 200, &bob.proof).await.unwrap();
    assert_eq!(token.custody_balance(), 0);
}

#[tokio::test]
async fn test_sweep_leaves_claims_alone() {
    let distribution = two_recipients();
    let (distributor, token) = deploy(&distribution, 300);
    let alice = distribution.claim_for(&ALICE).unwrap();
    distributor.claim(ALICE, 100, &alice.proof).await.unwrap();

    assert!(matches!(
        distributor.sweep_distributed(ALICE, 50).await,
        Err(DistributorError::Unauthorized(ALICE))
    ));

    let stray = InMemoryTokenLedger::new(Address::repeat_byte(0x55), CUSTODY).with_balance(CUSTODY, 40);
    distributor.sweep(ADMIN, &stray, 40).await.unwrap();
    distributor.sweep_distributed(ADMIN, 200).await.unwrap();

    assert_eq!(stray.balance(&ADMIN), 40);
    assert_eq!(token.balance(&ADMIN), 200);
    assert!(distributor.is_claimed(&ALICE));
    assert!(!distributor.is_claimed(&BOB));
    assert_eq!(distributor.ledger().claimed_count(), 1);

    // Custody is empty now, so Bob's claim fails and stays claimable.
    let bob = distribution.claim_for(&BOB).unwrap();
    assert!(distributor.claim(BOB, 200, &bob.proof).await.is_err());
    assert!(!distributor.is_claimed(&BOB));
}

/// Token ledger whose recipient runs code during the transfer: it records
/// the claim flag it observes and tries to claim again.
struct ReentrantLedger {
    inner: InMemoryTokenLedger,
    distributor: Mutex<Weak<Distributor>>,
    proof: Vec<merkledrop_core::Digest>,
    observed: Mutex<Vec<(bool, bool)>>,
}

#[async_trait]
impl TokenLedger for ReentrantLedger {
    fn asset_id(&self) -> Address {
        self.inner.asset_id()
    }

    fn custody(&self) -> Address {
        self.inner.custody()
    }

    async fn transfer(&self, to: Address, amount: Amount) -> Result<(), TransferError> {
        let distributor = self.distributor.lock().upgrade();
        if let Some(distributor) = distributor {
            let flagged = distributor.is_claimed(&to);
            let nested = distributor.claim(to, amount, &self.proof).await;
            let rejected = matches!(nested, Err(DistributorError::AlreadyClaimed));
            self.observed.lock().push((flagged, rejected));
        }
        self.inner.transfer(to, amount).await
    }

    async fn balance_of(&self, owner: Address) -> Amount {
        self.inner.balance_of(owner).await
    }
}

#[tokio::test]
async fn test_reentrant_claim_sees_consumed_allocation() {
    let distribution = two_recipients();
    let alice = distribution.claim_for(&ALICE).unwrap();

    let token = Arc::new(ReentrantLedger {
        inner: InMemoryTokenLedger::new(ASSET, CUSTODY).with_balance(CUSTODY, 300),
        distributor: Mutex::new(Weak::new()),
        proof: alice.proof.clone(),
        observed: Mutex::new(Vec::new()),
    });
    let distributor = Arc::new(Distributor::new(
        distribution.config(),
        token.clone(),
        Arc::new(FixedAdmin(ADMIN)),
    ));
    *token.distributor.lock() = Arc::downgrade(&distributor);

    distributor.claim(ALICE, 100, &alice.proof).await.unwrap();

    assert_eq!(*token.observed.lock(), vec![(true, true)]);
    assert_eq!(token.inner.balance(&ALICE), 100);
    assert_eq!(distributor.events().len(), 1);
}

/// Token ledger that misbehaves on demand: panics inside `transfer`, or
/// stalls until the caller gives up.
struct FaultyLedger {
    inner: InMemoryTokenLedger,
    panic: AtomicBool,
    stall: AtomicBool,
}

impl FaultyLedger {
    fn new(custody: Amount) -> Self {
        Self {
            inner: InMemoryTokenLedger::new(ASSET, CUSTODY).with_balance(CUSTODY, custody),
            panic: AtomicBool::new(false),
            stall: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl TokenLedger for FaultyLedger {
    fn asset_id(&self) -> Address {
        self.inner.asset_id()
    }

    fn custody(&self) -> Address {
        self.inner.custody()
    }

    async fn transfer(&self, to: Address, amount: Amount) -> Result<(), TransferError> {
        if self.panic.load(Ordering::SeqCst) {
            panic!("custody backend crashed");
        }
        if self.stall.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }
        self.inner.transfer(to, amount).await
    }

    async fn balance_of(&self, owner: Address) -> Amount {
        self.inner.balance_of(owner).await
    }
}

fn deploy_faulty(distribution: &Distribution) -> (Arc<Distributor>, Arc<FaultyLedger>) {
    let token = Arc::new(FaultyLedger::new(300));
    let distributor = Distributor::new(
        distribution.config(),
        token.clone(),
        Arc::new(FixedAdmin(ADMIN)),
    );
    (Arc::new(distributor), token)
}

#[tokio::test]
async fn test_panicking_transfer_rolls_back() {
    let distribution = two_recipients();
    let (distributor, token) = deploy_faulty(&distribution);
    let alice = distribution.claim_for(&ALICE).unwrap();

    token.panic.store(true, Ordering::SeqCst);
    let err = distributor.claim(ALICE, 100, &alice.proof).await.unwrap_err();
    assert!(matches!(
        err,
        DistributorError::TransferFailed(TransferError::Ledger(ref reason)) if reason.contains("custody backend crashed")
    ));
    assert!(err.is_retriable());
    assert!(!distributor.is_claimed(&ALICE));
    assert_eq!(token.inner.custody_balance(), 300);
    assert!(distributor.events().is_empty());

    token.panic.store(false, Ordering::SeqCst);
    distributor.claim(ALICE, 100, &alice.proof).await.unwrap();
    assert_eq!(token.inner.balance(&ALICE), 100);
}

#[tokio::test]
async fn test_dropped_claim_releases_mark() {
    let distribution = two_recipients();
    let (distributor, token) = deploy_faulty(&distribution);
    let alice = distribution.claim_for(&ALICE).unwrap();

    token.stall.store(true, Ordering::SeqCst);
    let mut pending = Box::pin(distributor.claim(ALICE, 100, &alice.proof));
    assert!(poll_once(pending.as_mut()).is_pending());
    assert!(distributor.is_claimed(&ALICE));
    assert!(matches!(
        distributor.claim(ALICE, 100, &alice.proof).await,
        Err(DistributorError::AlreadyClaimed)
    ));

    drop(pending);
    assert!(!distributor.is_claimed(&ALICE));
    assert_eq!(token.inner.custody_balance(), 300);
    assert!(distributor.events().is_empty());

    token.stall.store(false, Ordering::SeqCst);
    distributor.claim(ALICE, 100, &alice.proof).await.unwrap();
    assert!(distributor.is_claimed(&ALICE));
}

#[test]
fn test_claim_outside_tokio_runtime() {
    let distribution = two_recipients();
    let (distributor, token) = deploy(&distribution, 300);
    let alice = distribution.claim_for(&ALICE).unwrap();

    let receipt = futures::executor::block_on(distributor.claim(ALICE, 100, &alice.proof)).unwrap();
    assert_eq!(receipt.amount, 100);
    assert_eq!(token.balance(&ALICE), 100);
}

fn poll_once<F: Future>(future: Pin<&mut F>) -> Poll<F::Output> {
    let waker = futures::task::noop_waker();
    let mut cx = Context::from_waker(&waker);
    future.poll(&mut cx)
}
