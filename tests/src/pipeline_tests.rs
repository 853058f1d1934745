use crate::common::{
    entry_point_address, pipeline, push_legacy_fee_data, AutoSurface, ClosedSurface, FakeAccount,
    CHAIN_ID,
};
use ethers::types::Bytes;
use std::sync::{atomic::Ordering, Arc};
use tutela_accounts::SmartAccount;
use tutela_pool::PoolError;
use tutela_primitives::{Call, OperationReceipt, PendingStatus, UserOperationHash};
use tutela_sender::{AuthorizationContext, SendError};

fn call() -> Call {
    Call::new(
        "0xAAA0000000000000000000000000000000000aaa".parse().unwrap(),
        0.into(),
        Bytes::default(),
    )
}

fn context() -> AuthorizationContext {
    AuthorizationContext { origin: "https://dapp.example".into(), tab: Some(1) }
}

fn receipt(hash: UserOperationHash, success: bool, reason: &str) -> OperationReceipt {
    OperationReceipt {
        user_operation_hash: hash,
        success,
        actual_gas_cost: 40_000.into(),
        actual_gas_used: 35_000.into(),
        reason: reason.into(),
    }
}

#[tokio::test]
async fn approved_operation_is_priced_signed_and_pooled() {
    let account = Arc::new(FakeAccount::undeployed());
    let test = pipeline(account.clone(), AutoSurface::approving());
    push_legacy_fee_data(&test.node, 10);

    let sent = test
        .sender
        .send_user_operation("primary", Some(call()), context())
        .await
        .unwrap();

    let submissions = test.bundler.submissions.lock();
    assert_eq!(submissions.len(), 1);
    let uo = &submissions[0];

    // undeployed account: non-empty init code, nonce zero
    assert!(!uo.init_code.is_empty());
    assert_eq!(uo.nonce, 0.into());

    // legacy fee data of 10 wei, buffered by 125/100 with floor semantics
    assert_eq!(uo.max_fee_per_gas, 12.into());
    assert_eq!(uo.max_priority_fee_per_gas, 12.into());

    // bundler estimation taken with safety margins
    assert_eq!(uo.call_gas_limit, 66_200.into());
    assert_eq!(uo.verification_gas_limit, 121_248.into());
    assert_eq!(uo.pre_verification_gas, 45_056.into());

    // self-funded, final ECDSA signature in place of the dummy
    assert!(uo.paymaster_and_data.is_empty());
    assert_eq!(uo.signature.len(), 65);
    assert_ne!(uo.signature, account.dummy_signature());

    assert_eq!(sent.user_operation_hash, uo.hash(&entry_point_address(), CHAIN_ID));

    let entry = test.pool.get(&sent.id).unwrap();
    assert_eq!(entry.status, PendingStatus::Pending);
    assert_eq!(entry.sender_id, "primary");
    assert_eq!(entry.network_id, "sepolia");
    assert_eq!(entry.user_operation_hash, sent.user_operation_hash);
}

#[tokio::test]
async fn approval_supplied_sponsorship_is_used() {
    let account = Arc::new(FakeAccount::deployed(3));
    let sponsorship: Bytes = "0x42b7eb9ca0e87b3e915e0c56f7a668d28a317fbd0001".parse().unwrap();
    let test = pipeline(
        account,
        AutoSurface::approving_with_sponsorship(sponsorship.clone()),
    );
    push_legacy_fee_data(&test.node, 10);

    test.sender.send_user_operation("primary", Some(call()), context()).await.unwrap();

    let submissions = test.bundler.submissions.lock();
    assert_eq!(submissions[0].paymaster_and_data, sponsorship);
    // deployed account: empty init code, live nonce
    assert!(submissions[0].init_code.is_empty());
    assert_eq!(submissions[0].nonce, 3.into());
}

#[tokio::test]
async fn rejected_authorization_creates_no_pool_entry() {
    let account = Arc::new(FakeAccount::undeployed());
    let test = pipeline(account, AutoSurface::rejecting());
    push_legacy_fee_data(&test.node, 10);

    let err = test
        .sender
        .send_user_operation("primary", Some(call()), context())
        .await
        .unwrap_err();

    assert!(matches!(err, SendError::Rejected));
    assert!(test.pool.is_empty());
    assert!(test.bundler.submissions.lock().is_empty());
}

#[tokio::test]
async fn closed_surface_aborts_authorization() {
    let account = Arc::new(FakeAccount::undeployed());
    let test = pipeline(account, ClosedSurface);
    push_legacy_fee_data(&test.node, 10);

    let err = test
        .sender
        .send_user_operation("primary", Some(call()), context())
        .await
        .unwrap_err();

    assert!(matches!(err, SendError::AuthorizationAborted));
    assert!(test.pool.is_empty());
}

#[tokio::test]
async fn estimation_failure_surfaces_without_pool_mutation() {
    let account = Arc::new(FakeAccount::undeployed());
    let test = pipeline(account, AutoSurface::approving());
    // no node responses queued: the fee data query fails

    let err = test
        .sender
        .send_user_operation("primary", Some(call()), context())
        .await
        .unwrap_err();

    assert!(matches!(err, SendError::EstimationFailed { .. }));
    assert!(test.pool.is_empty());
    assert!(test.bundler.submissions.lock().is_empty());
}

#[tokio::test]
async fn failed_submission_leaves_no_zombie_entry() {
    let account = Arc::new(FakeAccount::undeployed());
    let test = pipeline(account, AutoSurface::approving());
    push_legacy_fee_data(&test.node, 10);
    test.bundler.fail_submission.store(true, Ordering::SeqCst);

    let err = test
        .sender
        .send_user_operation("primary", Some(call()), context())
        .await
        .unwrap_err();

    assert!(matches!(err, SendError::SubmissionFailed { .. }));
    assert!(test.pool.is_empty());
}

#[tokio::test]
async fn nonce_advancing_in_flight_is_detected_at_signing() {
    let account = Arc::new(FakeAccount::deployed(5));
    let bumper = account.clone();
    let surface = AutoSurface::approving()
        .with_hook(Arc::new(move || bumper.bump_nonce()));
    let test = pipeline(account, surface);
    push_legacy_fee_data(&test.node, 10);

    let err = test
        .sender
        .send_user_operation("primary", Some(call()), context())
        .await
        .unwrap_err();

    assert!(matches!(err, SendError::NonceConflict { .. }));
    assert!(test.pool.is_empty());
    assert!(test.bundler.submissions.lock().is_empty());
}

#[tokio::test]
async fn missing_factory_fails_building_for_undeployed_account() {
    let account = Arc::new(FakeAccount::without_factory());
    let test = pipeline(account, AutoSurface::approving());

    let err = test
        .sender
        .send_user_operation("primary", Some(call()), context())
        .await
        .unwrap_err();

    assert!(matches!(err, SendError::Account(_)));
    assert!(test.pool.is_empty());
}

#[tokio::test]
async fn unknown_sender_id_fails_building() {
    let account = Arc::new(FakeAccount::undeployed());
    let test = pipeline(account, AutoSurface::approving());

    let err = test
        .sender
        .send_user_operation("missing", Some(call()), context())
        .await
        .unwrap_err();

    assert!(matches!(err, SendError::Account(_)));
}

#[tokio::test]
async fn failed_finalization_event_rejects_wait_and_stays_terminal() {
    let account = Arc::new(FakeAccount::undeployed());
    let test = pipeline(account, AutoSurface::approving());
    push_legacy_fee_data(&test.node, 10);

    let sent = test
        .sender
        .send_user_operation("primary", Some(call()), context())
        .await
        .unwrap();

    let waiter = {
        let sender_pool = test.pool.clone();
        let id = sent.id;
        tokio::spawn(async move { sender_pool.wait(&id).await })
    };
    tokio::task::yield_now().await;

    test.pool
        .finalize(&sent.id, receipt(sent.user_operation_hash, false, "AA23 reverted"))
        .unwrap();

    let err = waiter.await.unwrap().unwrap_err();
    assert!(err.to_string().contains("AA23 reverted"));

    // a second event for the same hash has no further effect
    assert_eq!(
        test.pool.finalize(&sent.id, receipt(sent.user_operation_hash, true, "")),
        Err(PoolError::TerminalTransition { id: sent.id })
    );
    assert!(matches!(test.pool.get(&sent.id).unwrap().status, PendingStatus::Failed(_)));
}

#[tokio::test]
async fn successful_finalization_resolves_wait_with_receipt() {
    let account = Arc::new(FakeAccount::undeployed());
    let test = pipeline(account, AutoSurface::approving());
    push_legacy_fee_data(&test.node, 10);

    let sent = test
        .sender
        .send_user_operation("primary", Some(call()), context())
        .await
        .unwrap();

    test.pool.finalize(&sent.id, receipt(sent.user_operation_hash, true, "")).unwrap();

    let resolved = test.sender.wait(&sent.id).await.unwrap();
    assert!(resolved.success);
    assert_eq!(resolved.user_operation_hash, sent.user_operation_hash);
}
