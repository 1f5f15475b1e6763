//! Dry run against a scripted backend, with a timeout and a cancellation

use expectloop::{ExpectError, Pattern, ScriptedBackend, Session, SessionBuilder};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let backend = ScriptedBackend::new()
        .chunk_after("Welcome\r\nlog", Duration::from_millis(50))
        .chunk_after("in: ", Duration::from_millis(50))
        .chunk_after("Password: ", Duration::from_millis(100))
        .chunk_after("Last login: never\r\n$ ", Duration::from_secs(2));
    let handle = backend.handle();

    let mut session: Session<ScriptedBackend> = SessionBuilder::new()
        .timeout(Duration::from_millis(500))
        .line_terminator("\r\n")
        .build(backend)?;

    // "login:" arrives split across two reads
    session
        .expect(Pattern::exact("login:")?, |output| println!("1. {output:?}"))
        .await?;
    session.send_line("admin").await?;

    session
        .expect(Pattern::exact("Password:")?, |output| println!("2. {output:?}"))
        .await?;
    session.send_line("secret").await?;

    // The shell prompt is slower than the timeout
    match session.expect(Pattern::exact("$ ")?, |_| {}).await {
        Err(ExpectError::Timeout { duration }) => println!("3. timed out after {duration:?}"),
        other => println!("3. unexpected: {other:?}"),
    }

    // Give up explicitly instead of waiting for the timeout
    let cancel = tokio::time::sleep(Duration::from_millis(100));
    match session
        .expect_until(Pattern::exact("$ ")?, cancel, |_| {})
        .await
    {
        Err(ExpectError::Cancelled) => println!("4. cancelled"),
        other => println!("4. unexpected: {other:?}"),
    }

    session.set_timeout(Duration::from_secs(5))?;
    session
        .expect(Pattern::exact("$ ")?, |output| println!("5. {output:?}"))
        .await?;

    println!("sent: {:?}", handle.writes());
    Ok(())
}
