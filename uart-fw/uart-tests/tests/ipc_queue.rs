//! Message queue protocol: ordering, exactly-once resolution and teardown

use embassy_futures::block_on;
use embassy_futures::join::join;
use uart_core::ipc::{
    ErrorReply, Message, MessageQueue, Outcome, QueueError, Shutdown, WaitError,
};
use uart_tests::leak_queue;

#[test_log::test]
fn test_consumer_sees_enqueue_order() {
    let queue = leak_queue();
    for i in 0..8u8 {
        queue.try_post(vec![i]).unwrap();
    }
    assert_eq!(queue.try_post(vec![8]), Err(QueueError::Full));

    let mut seen = Vec::new();
    while let Ok(Some(msg)) = queue.try_wait() {
        seen.push(msg.buffer()[0]);
        if let Message::Post(post) = msg {
            post.consume();
        }
    }
    assert_eq!(seen, (0..8).collect::<Vec<u8>>());
}

#[test_log::test]
fn test_mixed_kinds_keep_order() {
    let queue = leak_queue();
    queue.try_post(b"first".to_vec()).unwrap();

    let ((), ()) = block_on(join(
        async {
            let pending = queue.request(b"second".to_vec()).await.unwrap();
            assert!(pending.wait().await.is_reply());
        },
        async {
            let Ok(Message::Post(post)) = queue.wait().await else {
                panic!("Expected the post first");
            };
            assert_eq!(post.buffer(), b"first");
            post.consume();

            let Ok(Message::Request(request)) = queue.wait().await else {
                panic!("Expected the request second");
            };
            assert_eq!(request.len(), 6);
            request.reply(0, 0, 0, 6).unwrap();
        },
    ));
}

#[test_log::test]
fn test_request_resolves_exactly_once_with_reply() {
    let queue = leak_queue();

    let (outcome, ()) = block_on(join(queue.call(b"ping".to_vec()), async {
        let Ok(Message::Request(request)) = queue.wait().await else {
            panic!("Expected a request");
        };
        request.reply_with(7, 1, 2, b"pong").unwrap();
    }));

    let Ok(Outcome::Reply(reply)) = outcome else {
        panic!("Expected a reply, got {outcome:?}");
    };
    assert_eq!(reply.status, 7);
    assert_eq!(reply.aux, [1, 2]);
    assert_eq!(reply.payload, b"pong");
}

#[test_log::test]
fn test_error_reply_carries_code_and_aux() {
    let queue = leak_queue();

    let (outcome, ()) = block_on(join(queue.call(b"x".to_vec()), async {
        let Ok(Message::Request(request)) = queue.wait().await else {
            panic!("Expected a request");
        };
        request.reply_error(5, 9);
    }));

    assert_eq!(outcome, Ok(Outcome::Error(ErrorReply { code: 5, aux: 9 })));
}

#[test_log::test]
fn test_oversized_reply_is_rejected_and_request_survives() {
    let queue = leak_queue();

    let (outcome, ()) = block_on(join(queue.call(b"abc".to_vec()), async {
        let Ok(Message::Request(request)) = queue.wait().await else {
            panic!("Expected a request");
        };
        let err = request.reply(0, 0, 0, 4).unwrap_err();
        assert_eq!(err.requested(), 4);
        err.into_request().reply_error(1, 0);
    }));

    assert_eq!(outcome, Ok(Outcome::Error(ErrorReply { code: 1, aux: 0 })));
}

#[test_log::test]
fn test_dropped_request_is_abandoned() {
    let queue = leak_queue();

    let (outcome, ()) = block_on(join(queue.call(b"lost".to_vec()), async {
        let msg = queue.wait().await.unwrap();
        drop(msg);
    }));

    assert_eq!(outcome, Ok(Outcome::Abandoned));
}

#[test_log::test]
fn test_teardown_is_permanent() {
    let queue = leak_queue();
    queue.try_post(b"pending".to_vec()).unwrap();
    let pending = block_on(queue.request(b"waiting".to_vec())).unwrap();

    queue.teardown();
    queue.teardown();

    // Pending requests are resolved, never stranded
    assert_eq!(pending.try_outcome(), Some(Outcome::Abandoned));
    for _ in 0..3 {
        assert!(matches!(block_on(queue.wait()), Err(Shutdown)));
        assert!(matches!(queue.try_wait(), Err(Shutdown)));
    }
    assert_eq!(queue.try_post(b"late".to_vec()), Err(QueueError::TornDown));
    assert_eq!(
        block_on(queue.call(b"late".to_vec())),
        Err(QueueError::TornDown)
    );
    assert!(queue.is_empty());
}

#[test_log::test]
fn test_teardown_releases_sender_blocked_on_full_queue() {
    let queue = MessageQueue::<1>::new();
    queue.try_post(b"filler".to_vec()).unwrap();

    let (outcome, ()) = block_on(join(queue.call(b"stuck".to_vec()), async {
        // Let the call block on the full mailbox first
        embassy_futures::yield_now().await;
        queue.teardown();
    }));

    assert_eq!(outcome, Ok(Outcome::Abandoned));
    assert!(queue.is_empty());
}

#[test_log::test]
fn test_teardown_wakes_blocked_consumer() {
    let queue = leak_queue();

    let (result, ()) = block_on(join(queue.wait(), async {
        embassy_futures::yield_now().await;
        queue.teardown();
    }));

    assert!(matches!(result, Err(Shutdown)));
}

#[test_log::test]
fn test_deadline_is_not_shutdown() {
    let queue = leak_queue();

    let result = block_on(queue.wait_until(core::future::ready(())));
    assert!(matches!(result, Err(WaitError::DeadlineExpired)));
    assert!(!queue.is_torn_down());

    queue.try_post(b"late".to_vec()).unwrap();
    let result = block_on(queue.wait_until(core::future::pending::<()>()));
    assert!(matches!(result, Ok(Message::Post(_))));

    queue.teardown();
    let result = block_on(queue.wait_until(core::future::pending::<()>()));
    assert!(matches!(result, Err(WaitError::Shutdown)));
}
