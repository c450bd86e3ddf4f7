use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for pickview")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, deny, doc, smoke
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Run cargo deny check
    Deny,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Run the frame-plan bench
    Bench,
    /// Drive the CLI through each subcommand
    Smoke,
}

/// One cargo invocation with the message printed before it runs.
struct Step {
    banner: &'static str,
    args: &'static [&'static str],
}

const FMT: &[Step] = &[Step {
    banner: "cargo fmt --check",
    args: &["fmt", "--all", "--", "--check"],
}];

const CLIPPY: &[Step] = &[Step {
    banner: "cargo clippy",
    args: &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
}];

const TEST: &[Step] = &[Step {
    banner: "cargo test",
    args: &["test", "--workspace"],
}];

const DENY: &[Step] = &[Step {
    banner: "cargo deny check (licenses bans sources)",
    args: &["deny", "check", "licenses", "bans", "sources"],
}];

const DOC: &[Step] = &[Step {
    banner: "cargo doc",
    args: &["doc", "--workspace", "--no-deps"],
}];

const BUILD: &[Step] = &[Step {
    banner: "cargo build",
    args: &["build", "--workspace"],
}];

const BENCH: &[Step] = &[Step {
    banner: "frame plan bench",
    args: &["bench", "-p", "pickview-render", "--bench", "bench_frame_plan"],
}];

const SMOKE: &[Step] = &[
    Step {
        banner: "smoke: info",
        args: &["run", "-q", "-p", "pickview-cli", "--", "info"],
    },
    Step {
        banner: "smoke: plan",
        args: &["run", "-q", "-p", "pickview-cli", "--", "plan", "--frames", "3", "--instances"],
    },
    Step {
        banner: "smoke: camera",
        args: &[
            "run", "-q", "-p", "pickview-cli", "--", "camera", "orbit-h:90", "orbit-h:-90", "zoom:2",
            "reset",
        ],
    },
    Step {
        banner: "smoke: pick",
        args: &[
            "run", "-q", "-p", "pickview-cli", "--", "--json", "pick", "--object-id", "1",
            "--trigger",
        ],
    },
];

fn steps(command: Commands) -> Vec<&'static Step> {
    let tables: &[&[Step]] = match command {
        Commands::Check => &[FMT, CLIPPY, TEST, DENY, DOC, SMOKE],
        Commands::Fmt => &[FMT],
        Commands::Clippy => &[CLIPPY],
        Commands::Test => &[TEST],
        Commands::Deny => &[DENY],
        Commands::Doc => &[DOC],
        Commands::Build => &[BUILD],
        Commands::Bench => &[BENCH],
        Commands::Smoke => &[SMOKE],
    };
    tables.iter().flat_map(|t| t.iter()).collect()
}

fn run(step: &Step) -> Result<()> {
    println!("==> Running {}", step.banner);
    let status = Command::new("cargo").args(step.args).status()?;
    if !status.success() {
        bail!("{} failed", step.banner);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    for step in steps(cli.command) {
        run(step)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_runs_smoke_last() {
        let all = steps(Commands::Check);
        assert_eq!(all[0].banner, "cargo fmt --check");
        assert_eq!(all.last().map(|s| s.banner), Some("smoke: pick"));
    }

    #[test]
    fn smoke_only_touches_the_cli() {
        for step in steps(Commands::Smoke) {
            assert!(step.args.contains(&"pickview-cli"), "{}", step.banner);
        }
    }
}
