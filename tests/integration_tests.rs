//! Integration tests for expectloop

use expectloop::{BlockingSession, ExpectError, Pattern, ScriptedBackend, Session, SessionBuilder};
use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};

fn exact(s: &str) -> Pattern {
    Pattern::exact(s).expect("valid pattern")
}

#[tokio::test]
async fn test_send_forwards_verbatim() {
    let backend = ScriptedBackend::new();
    let handle = backend.handle();
    let mut session = Session::new(backend);

    session.send("test command").await.expect("send");

    assert_eq!(handle.writes(), vec!["test command".to_string()]);
}

#[tokio::test]
async fn test_send_failure_is_io_error() {
    let backend = ScriptedBackend::new().fail_writes(std::io::ErrorKind::BrokenPipe);
    let mut session = Session::new(backend);

    match session.send("x").await {
        Err(ExpectError::IoError(e)) => assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_basic_expect() {
    let backend =
        ScriptedBackend::new().chunk_after("test expected string test", Duration::from_millis(10));
    let mut session = Session::new(backend);

    let called = Cell::new(false);
    session
        .expect(exact("expected string"), |_| called.set(true))
        .await
        .expect("match");

    assert!(called.get());
}

#[tokio::test(start_paused = true)]
async fn test_basic_expect_with_output() {
    let backend =
        ScriptedBackend::new().chunk_after("test expected string test", Duration::from_millis(10));
    let mut session = Session::new(backend);

    let mut output = String::new();
    session
        .expect(exact("expected string"), |s| output = s.to_string())
        .await
        .expect("match");

    assert_eq!(output, "test expected string test");
}

#[tokio::test(start_paused = true)]
async fn test_split_result_expect() {
    let backend = ScriptedBackend::new()
        .chunk_after("test expected ", Duration::from_millis(100))
        .chunk_after("string test", Duration::from_millis(150));
    let handle = backend.handle();
    let mut session = Session::new(backend);

    let calls = Cell::new(0);
    let mut output = String::new();
    let result = session
        .expect(exact("expected string"), |s| {
            calls.set(calls.get() + 1);
            output = s.to_string();
        })
        .await
        .expect("match");

    assert_eq!(calls.get(), 1);
    assert_eq!(handle.reads(), 2);
    assert_eq!(result.reads, 2);
    assert_eq!(output, "test expected string test");
}

#[tokio::test(start_paused = true)]
async fn test_send_resets_output() {
    let backend = ScriptedBackend::new()
        .chunk_after("test expected ", Duration::from_millis(100))
        .chunk_after("string test", Duration::from_millis(150))
        .chunk_after("next expected string", Duration::from_millis(100));
    let handle = backend.handle();
    let mut session = Session::new(backend);

    session
        .expect_reply(exact("expected string"), |_, reply| reply.send("test"))
        .await
        .expect("first match");
    assert_eq!(handle.writes(), vec!["test".to_string()]);

    let mut output = String::new();
    session
        .expect(exact("next expected"), |s| output = s.to_string())
        .await
        .expect("second match");

    assert_eq!(output, "next expected string");
    assert_eq!(handle.writes(), vec!["test".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_shared_session_serializes_calls() {
    let backend = ScriptedBackend::new()
        .chunk_after("first\n", Duration::from_millis(10))
        .chunk_after("second\n", Duration::from_millis(10));
    let session = Arc::new(Mutex::new(Session::new(backend)));

    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let session = session.clone();
            tokio::spawn(async move {
                let mut session = session.lock().await;
                session
                    .expect(exact("\n"), |_| {})
                    .await
                    .map(|result| result.output)
            })
        })
        .collect();

    let mut outputs = Vec::new();
    for task in tasks {
        outputs.push(task.await.expect("join").expect("match"));
    }
    outputs.sort();

    assert_eq!(outputs, vec!["first\n".to_string(), "second\n".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_thrown() {
    let backend =
        ScriptedBackend::new().chunk_after("test expected string test", Duration::from_millis(1200));
    let mut session = Session::new(backend);
    session.set_timeout_millis(500).expect("valid timeout");

    let called = Cell::new(false);
    let result = session
        .expect(exact("expected string"), |_| called.set(true))
        .await;

    match result {
        Err(ExpectError::Timeout { duration }) => {
            assert_eq!(duration, Duration::from_millis(500))
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(!called.get());
}

#[tokio::test(start_paused = true)]
async fn test_timeout_not_thrown() {
    let backend =
        ScriptedBackend::new().chunk_after("test expected string test", Duration::from_millis(1200));
    let mut session = Session::new(backend);
    session.set_timeout_millis(2400).expect("valid timeout");

    let called = Cell::new(false);
    session
        .expect(exact("expected string"), |_| called.set(true))
        .await
        .expect("match within timeout");

    assert!(called.get());
}

#[tokio::test(start_paused = true)]
async fn test_session_usable_after_timeout() {
    let backend = ScriptedBackend::new().chunk_after("late output", Duration::from_millis(800));
    let mut session = Session::new(backend);
    session.set_timeout_millis(500).expect("valid timeout");

    let first = session.expect(exact("late"), |_| {}).await;
    assert!(matches!(first, Err(ExpectError::Timeout { .. })));

    // The abandoned read left the chunk with the backend
    let second = session.expect(exact("late"), |_| {}).await.expect("match");
    assert_eq!(second.output, "late output");
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_is_distinct_from_timeout() {
    let backend = ScriptedBackend::new().chunk_after("ready", Duration::from_millis(1000));
    let mut session = Session::new(backend);
    session.set_timeout_millis(2000).expect("valid timeout");

    let (stop, stopped) = oneshot::channel::<()>();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _ = stop.send(());
    });

    let called = Cell::new(false);
    let result = session
        .expect_until(
            exact("ready"),
            async move {
                let _ = stopped.await;
            },
            |_| called.set(true),
        )
        .await;

    assert!(matches!(result, Err(ExpectError::Cancelled)));
    assert!(!called.get());

    let again = session.expect(exact("ready"), |_| {}).await.expect("match");
    assert_eq!(again.output, "ready");
}

#[tokio::test]
async fn test_eof_before_match() {
    let backend = ScriptedBackend::new().chunk("bye").eof();
    let mut session = Session::new(backend);

    let called = Cell::new(false);
    let result = session.expect(exact("hello"), |_| called.set(true)).await;

    assert!(matches!(result, Err(ExpectError::Eof)));
    assert!(!called.get());
}

#[tokio::test]
async fn test_regex_captures_and_count() {
    let backend = ScriptedBackend::new().chunk("id=7 id=8 id=9\n");
    let mut session = Session::new(backend);

    let result = session
        .expect(Pattern::regex(r"id=(\d)").expect("regex"), |_| {})
        .await
        .expect("match");

    assert_eq!(result.matched, "id=7");
    assert_eq!(result.captures, vec!["id=7".to_string(), "7".to_string()]);
    assert_eq!(result.count, Some(3));
}

#[tokio::test]
async fn test_strip_ansi_before_matching() {
    let backend = ScriptedBackend::new().chunk("\x1b[1mexpected\x1b[0m string");
    let mut session = SessionBuilder::new()
        .strip_ansi(true)
        .build(backend)
        .expect("valid config");

    let result = session
        .expect(exact("expected string"), |_| {})
        .await
        .expect("match");
    assert_eq!(result.output, "expected string");
}

#[tokio::test]
async fn test_strip_ansi_split_across_reads() {
    let backend = ScriptedBackend::new().chunk("a\x1b[3").chunk("1mb");
    let mut session = SessionBuilder::new()
        .strip_ansi(true)
        .build(backend)
        .expect("valid config");

    let result = session.expect(exact("ab"), |_| {}).await.expect("match");
    assert_eq!(result.output, "ab");
    assert_eq!(result.reads, 2);
}

#[tokio::test(start_paused = true)]
async fn test_max_timeout_does_not_panic() {
    let backend = ScriptedBackend::new().chunk_after("ready", Duration::from_millis(10));
    let mut session = Session::new(backend);
    session.set_timeout(Duration::MAX).expect("valid timeout");

    let result = session.expect(exact("ready"), |_| {}).await.expect("match");
    assert_eq!(result.output, "ready");
}

#[test]
fn test_set_get_timeout_2400() {
    let mut session = Session::new(ScriptedBackend::new());
    session.set_timeout_millis(2400).expect("valid timeout");
    assert_eq!(session.timeout(), Some(Duration::from_millis(2400)));
}

#[test]
fn test_set_get_timeout_200() {
    let mut session = Session::new(ScriptedBackend::new());
    session.set_timeout_millis(200).expect("valid timeout");
    assert_eq!(session.timeout(), Some(Duration::from_millis(200)));
}

#[test]
fn test_set_timeout_incorrect_value() {
    let mut session = Session::new(ScriptedBackend::new());
    let before = session.timeout();

    assert!(matches!(
        session.set_timeout_millis(-1),
        Err(ExpectError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        session.set_timeout_millis(0),
        Err(ExpectError::InvalidConfiguration(_))
    ));
    assert_eq!(session.timeout(), before);
    assert_eq!(session.timeout(), session.timeout());
}

#[test]
fn test_blocking_session_sequence() {
    let backend = ScriptedBackend::new().chunk("$ ").chunk("hi\n$ ");
    let handle = backend.handle();
    let mut session = BlockingSession::new(Session::new(backend)).expect("runtime");

    session.expect(exact("$ "), |_| {}).expect("prompt");
    session.send_line("echo hi").expect("send");
    let result = session.expect(exact("hi"), |_| {}).expect("echo");

    assert_eq!(result.output, "hi\n$ ");
    assert_eq!(handle.writes(), vec!["echo hi\n".to_string()]);
}

#[cfg(unix)]
mod pty {
    use super::*;

    #[tokio::test]
    async fn test_spawn_and_expect() {
        let mut session = Session::builder()
            .timeout(Duration::from_secs(5))
            .spawn("echo Hello World")
            .expect("Failed to spawn command");

        let result = session
            .expect(exact("Hello"), |_| {})
            .await
            .expect("Failed to find 'Hello'");

        assert_eq!(result.matched, "Hello");
    }

    #[tokio::test]
    async fn test_send_and_receive() {
        let mut session = Session::builder()
            .timeout(Duration::from_secs(10))
            .spawn("cat")
            .expect("Failed to spawn cat");

        session
            .send_line("Hello from test")
            .await
            .expect("Failed to send");

        let mut echoed = String::new();
        session
            .expect(exact("Hello from test"), |out| echoed = out.to_string())
            .await
            .expect("Failed to receive echo");

        assert!(echoed.contains("Hello from test"));
    }

    #[tokio::test]
    async fn test_eof_after_exit() {
        let mut session = Session::builder()
            .timeout(Duration::from_secs(5))
            .spawn("true")
            .expect("Failed to spawn");

        let result = session.expect(exact("NEVER_APPEARS"), |_| {}).await;
        assert!(matches!(result, Err(ExpectError::Eof)));

        let status = session.wait().await.expect("wait");
        assert!(status.success());
    }

    #[tokio::test]
    async fn test_timeout_on_silent_process() {
        let mut session = Session::builder()
            .timeout(Duration::from_millis(100))
            .spawn("sleep 2")
            .expect("Failed to spawn");

        let result = session.expect(exact("NEVER_APPEARS"), |_| {}).await;
        assert!(matches!(result, Err(ExpectError::Timeout { .. })));
        assert!(session.is_alive().expect("status"));
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let result = Session::spawn("definitely-not-a-real-program-xyz");
        assert!(result.is_err());
    }
}
