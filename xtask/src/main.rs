use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

const DEMOS: [&str; 3] = ["mining", "tractor", "repair"];

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for multitool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, demos
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Play every built-in scene through multitool-cli
    Demos,
    /// Build rustdoc for the workspace
    Doc,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            cargo("fmt --check", &["fmt", "--all", "--", "--check"])?;
            cargo("clippy", &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;
            cargo("test", &["test", "--workspace"])?;
            run_demos()?;
        }
        Commands::Fmt => cargo("fmt --check", &["fmt", "--all", "--", "--check"])?,
        Commands::Clippy => {
            cargo("clippy", &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?
        }
        Commands::Test => cargo("test", &["test", "--workspace"])?,
        Commands::Demos => run_demos()?,
        Commands::Doc => cargo("doc", &["doc", "--workspace", "--no-deps"])?,
    }

    Ok(())
}

fn cargo(label: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {label}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {label} failed");
    }
    Ok(())
}

/// Each demo must finish with a won mission; the CLI exits non-zero otherwise.
fn run_demos() -> Result<()> {
    for demo in DEMOS {
        cargo(
            &format!("demo {demo}"),
            &["run", "--quiet", "-p", "multitool-cli", "--", "demo", demo, "--require-win"],
        )?;
    }
    Ok(())
}
