//! Client-side timeouts resolve operations with a well-formed result.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use dirwire::{AsyncEngine, ConnectionOptions, LdapResult, OperationKind, ResultCode};
use helpers::{RecordingConnection, init_logging};
use tokio::runtime::Handle;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn search_timeout_carries_partial_progress() {
    init_logging();
    let connection = Arc::new(RecordingConnection::new(ConnectionOptions::default()));
    let engine = AsyncEngine::new(Arc::clone(&connection), Handle::current());

    let handle = engine
        .submit(
            OperationKind::Search,
            b"search request",
            Some(Duration::from_millis(50)),
        )
        .expect("submit should succeed");
    let id = handle.message_id();

    for _ in 0..3 {
        assert!(engine.entry_returned(id));
    }
    assert!(engine.reference_returned(id));

    let result = handle
        .await_result(Some(Duration::from_secs(5)))
        .await
        .expect("timeout should resolve the operation");

    assert_eq!(result.result_code(), ResultCode::TIMEOUT);
    assert_eq!(result.entries_returned, 3);
    assert_eq!(result.references_returned, 1);
    assert!(result.elapsed >= Duration::from_millis(50));
    let diagnostic = result.result.diagnostic_message.expect("diagnostic");
    assert!(diagnostic.contains("ms"), "{diagnostic}");

    assert_eq!(engine.pending_count(), 0);
    assert_eq!(connection.deregistered(), vec![id]);
    assert!(connection.abandoned().is_empty());

    // A late response is discarded.
    assert!(!engine.deliver(id, LdapResult::success()));
    assert_eq!(handle.result().unwrap().result_code(), ResultCode::TIMEOUT);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn abandon_policy_is_applied_on_timeout() {
    init_logging();
    let options = ConnectionOptions::default().with_abandon_on_timeout(true);
    let connection = Arc::new(RecordingConnection::new(options));
    let engine = AsyncEngine::new(Arc::clone(&connection), Handle::current());

    let handle = engine
        .submit(OperationKind::Modify, b"modify", Some(Duration::from_millis(20)))
        .unwrap();
    let result = handle
        .await_result(Some(Duration::from_secs(5)))
        .await
        .unwrap();

    assert!(result.is_timeout());
    assert_eq!(connection.abandoned(), vec![handle.message_id()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn response_before_deadline_wins() {
    init_logging();
    let connection = Arc::new(RecordingConnection::new(ConnectionOptions::default()));
    let engine = AsyncEngine::new(Arc::clone(&connection), Handle::current());

    let handle = engine
        .submit(OperationKind::Add, b"add", Some(Duration::from_millis(200)))
        .unwrap();

    let reader = engine.clone();
    let id = handle.message_id();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        reader.deliver(id, LdapResult::success());
    });

    let result = handle.await_result(None).await.unwrap();
    assert_eq!(result.result_code(), ResultCode::SUCCESS);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(handle.result().unwrap().result_code(), ResultCode::SUCCESS);
    assert!(connection.deregistered().is_empty());
}

#[tokio::test]
async fn caller_timeout_does_not_resolve_operation() {
    init_logging();
    let connection = Arc::new(RecordingConnection::new(ConnectionOptions::default()));
    let engine = AsyncEngine::new(connection, Handle::current());

    let handle = engine.submit(OperationKind::Compare, b"compare", None).unwrap();
    let err = handle
        .await_result(Some(Duration::from_millis(10)))
        .await
        .unwrap_err();

    assert!(matches!(err, dirwire::AwaitError::Elapsed { .. }));
    assert!(!handle.is_resolved());
    assert!(engine.deliver(handle.message_id(), LdapResult::new(ResultCode::COMPARE_TRUE)));
}

#[tokio::test]
async fn connection_loss_fails_pending_operations() {
    init_logging();
    let connection = Arc::new(RecordingConnection::new(ConnectionOptions::default()));
    let engine = AsyncEngine::new(connection, Handle::current());

    let handles: Vec<_> = OperationKind::ALL
        .into_iter()
        .map(|kind| engine.submit(kind, b"req", None).unwrap())
        .collect();

    assert_eq!(engine.fail_all(ResultCode::SERVER_DOWN, "connection closed"), 6);
    for handle in handles {
        let result = handle.await_result(None).await.unwrap();
        assert_eq!(result.result_code(), ResultCode::SERVER_DOWN);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn out_of_range_timeout_leaves_operation_pending() {
    init_logging();
    let connection = Arc::new(RecordingConnection::new(ConnectionOptions::default()));
    let engine = AsyncEngine::new(Arc::clone(&connection), Handle::current());

    let handle = engine
        .submit(OperationKind::Search, b"search request", Some(Duration::MAX))
        .expect("submit should succeed without arming a timer");
    let id = handle.message_id();
    assert!(engine.is_pending(id));
    assert_eq!(connection.transmitted(), vec![id]);

    assert!(matches!(
        handle.await_result(Some(Duration::from_millis(50))).await,
        Err(dirwire::AwaitError::Elapsed { .. })
    ));
    assert!(engine.deliver(id, LdapResult::success()));
    assert_eq!(handle.result().unwrap().result_code(), ResultCode::SUCCESS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropped_engine_resolves_leftovers_with_local_error() {
    init_logging();
    let connection = Arc::new(RecordingConnection::new(ConnectionOptions::default()));
    let engine = AsyncEngine::new(Arc::clone(&connection), Handle::current());

    let timed = engine
        .submit(
            OperationKind::Search,
            b"search request",
            Some(Duration::from_millis(50)),
        )
        .expect("submit should succeed");
    let untimed = engine
        .submit(OperationKind::Add, b"add request", None)
        .expect("submit should succeed");
    drop(engine);

    let timed = timed
        .await_result(Some(Duration::from_secs(5)))
        .await
        .expect("the timer still fires after the engine handle is gone");
    assert_eq!(timed.result_code(), ResultCode::TIMEOUT);

    let untimed = untimed
        .await_result(Some(Duration::from_secs(5)))
        .await
        .expect("dropping the engine should resolve the operation");
    assert_eq!(untimed.result_code(), ResultCode::LOCAL_ERROR);
    assert!(untimed.result.diagnostic_message.is_some());
}
