use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for easel")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fmt, clippy, tests and docs
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Write the starter scene, validate it, then render and pick it headlessly
    Smoke {
        /// Directory for the generated scene and image
        #[arg(long, default_value = "target/xtask-smoke")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            fmt()?;
            clippy()?;
            test()?;
            doc()?;
        }
        Commands::Fmt => fmt()?,
        Commands::Clippy => clippy()?,
        Commands::Test => test()?,
        Commands::Doc => doc()?,
        Commands::Smoke { out_dir } => smoke(&out_dir)?,
    }

    Ok(())
}

fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> {step}: cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .with_context(|| format!("spawning cargo for {step}"))?;
    if !status.success() {
        bail!("{step} failed");
    }
    Ok(())
}

fn fmt() -> Result<()> {
    cargo("fmt", &["fmt", "--all", "--", "--check"])
}

fn clippy() -> Result<()> {
    cargo(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn test() -> Result<()> {
    cargo("test", &["test", "--workspace"])
}

fn doc() -> Result<()> {
    cargo("doc", &["doc", "--workspace", "--no-deps"])
}

fn smoke(out_dir: &std::path::Path) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let scene = out_dir.join("sample.yaml");
    let image = out_dir.join("sample.ppm");
    let scene = scene.to_string_lossy();
    let image = image.to_string_lossy();

    let cli = ["run", "--quiet", "-p", "easel-cli", "--"];
    let with = |rest: &[&str]| -> Vec<String> {
        cli.iter().chain(rest).map(|s| s.to_string()).collect()
    };
    for (step, args) in [
        ("sample", with(&["sample", &scene])),
        ("validate", with(&["validate", &scene])),
        (
            "render",
            with(&["render", &scene, "--pick", "160,120", "--pick", "0,0", "--output", &image]),
        ),
    ] {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        cargo(step, &args)?;
    }
    println!("smoke output in {}", out_dir.display());
    Ok(())
}
