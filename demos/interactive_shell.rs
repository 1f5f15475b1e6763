//! Interactive shell example

use expectloop::{Pattern, Session};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("expectloop - Interactive Shell Example");
    println!("{}", "=".repeat(50));

    println!("\nStarting Python interactive shell...");
    let mut session = Session::builder()
        .timeout(Duration::from_secs(10))
        .strip_ansi(true)
        .spawn("python3 -i")?;

    session.expect(Pattern::exact(">>> ")?, |_| {}).await?;
    println!("✓ Got Python prompt");

    println!("\nSending: 2 + 2");
    session.send_line("2 + 2").await?;

    // Each expect only sees output produced after the previous one matched
    let result = session
        .expect(Pattern::regex(r"(?m)^(\d+)\s*$")?, |output| {
            println!("✓ Raw output: {output:?}");
        })
        .await?;
    println!("✓ Result: {}", result.captures[1]);

    session.expect(Pattern::exact(">>> ")?, |_| {}).await?;
    session.send_line("exit()").await?;

    let status = session.wait().await?;
    println!("\n✓ Python exited with code {}", status.exit_code());

    Ok(())
}
