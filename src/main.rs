use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use expectloop::{CommandBuilder, Pattern, Session};
use std::io::Write;
use tracing_subscriber::EnvFilter;

/// Run a command on a PTY and drive it through expect/send steps.
///
/// Steps run in the order given. Example:
///
///   expectloop -s 'expect=\$ $' -s 'line=echo hi' -s 'expect=hi' -- bash
#[derive(Parser, Debug)]
#[command(name = "expectloop", version)]
struct Cli {
    /// Timeout for each expect step, in milliseconds
    #[arg(short, long, default_value_t = 2500, allow_negative_numbers = true)]
    timeout_ms: i64,

    /// Remove ANSI escape sequences before matching
    #[arg(long)]
    strip_ansi: bool,

    /// Terminator appended by `line=` steps
    #[arg(long, value_enum, default_value_t = LineEnding::Lf)]
    line_ending: LineEnding,

    /// A step: `expect=<regex>`, `send=<text>` or `line=<text>`
    #[arg(short = 's', long = "step", value_parser = parse_step)]
    steps: Vec<Step>,

    /// Command to spawn, with its arguments
    #[arg(required = true, trailing_var_arg = true)]
    command: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LineEnding {
    Lf,
    Crlf,
    Cr,
}

impl LineEnding {
    fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }
}

#[derive(Clone, Debug)]
enum Step {
    Expect(String),
    Send(String),
    Line(String),
}

fn parse_step(raw: &str) -> Result<Step, String> {
    let (kind, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <kind>=<value>, got {raw:?}"))?;
    match kind {
        "expect" => Ok(Step::Expect(value.to_string())),
        "send" => Ok(Step::Send(value.to_string())),
        "line" => Ok(Step::Line(value.to_string())),
        other => Err(format!("unknown step kind {other:?}")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let Some((program, args)) = cli.command.split_first() else {
        bail!("no command given");
    };
    let mut cmd = CommandBuilder::new(program);
    cmd.args(args);

    let mut session = Session::builder()
        .strip_ansi(cli.strip_ansi)
        .line_terminator(cli.line_ending.as_str())
        .spawn_command(cmd)
        .with_context(|| format!("failed to spawn {program}"))?;
    session
        .set_timeout_millis(cli.timeout_ms)
        .context("invalid --timeout-ms")?;

    let mut stdout = std::io::stdout();
    for (index, step) in cli.steps.iter().enumerate() {
        match step {
            Step::Expect(query) => {
                let pattern = Pattern::regex(query)
                    .with_context(|| format!("step {index}: bad pattern {query:?}"))?;
                session
                    .expect(pattern, |output| {
                        let _ = stdout.write_all(output.as_bytes());
                        let _ = stdout.flush();
                    })
                    .await
                    .with_context(|| format!("step {index}: waiting for {query:?}"))?;
            }
            Step::Send(text) => session
                .send(text)
                .await
                .with_context(|| format!("step {index}: send"))?,
            Step::Line(text) => session
                .send_line(text)
                .await
                .with_context(|| format!("step {index}: send line"))?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_step() {
        assert!(matches!(parse_step("expect=\\$ $"), Ok(Step::Expect(q)) if q == "\\$ $"));
        assert!(matches!(parse_step("line=a=b"), Ok(Step::Line(t)) if t == "a=b"));
        assert!(parse_step("wait=1").is_err());
        assert!(parse_step("nothing").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "expectloop",
            "-s",
            "expect=ready",
            "--line-ending",
            "crlf",
            "--",
            "cmd",
            "/K",
        ])
        .unwrap();
        assert_eq!(cli.command, vec!["cmd".to_string(), "/K".to_string()]);
        assert_eq!(cli.line_ending.as_str(), "\r\n");
        assert_eq!(cli.steps.len(), 1);
    }
}
