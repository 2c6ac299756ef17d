//! polyaml command-line tool for checking, canonicalizing, and transcoding
//! YAML documents.
//!
//! Usage: polyaml [OPTIONS] [FILE|DIR]
//!
//! Options:
//!   -f, --from <FORMAT>    Input format (yaml, json) [default: yaml]
//!   -t, --to <FORMAT>      Output format (yaml, json) [default: yaml]
//!   -w, --write            Write output to file with inferred name
//!   -o, --output <FILE>    Write output to specified file
//!       --check            Check if input is valid (exit 0 if valid, 1 if invalid)
//!   -v, --verbose          Log at debug level unless RUST_LOG says otherwise
//!   -h, --help             Print help
//!   -V, --version          Print version

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod transcode;

use transcode::Format;

#[derive(Parser, Debug)]
#[command(name = "polyaml", version, about = "Check, canonicalize, and transcode YAML documents")]
struct Cli {
    /// Input file or directory of .yaml files [default: stdin]
    input: Option<PathBuf>,

    /// Input format
    #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
    from: Format,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
    to: Format,

    /// Write output next to the input, with the output format's extension
    #[arg(short, long, conflicts_with = "output")]
    write: bool,

    /// Write output to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only check that the input is valid
    #[arg(long, conflicts_with_all = ["write", "output"])]
    check: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Returns `false` when some input failed a check.
fn run(cli: &Cli) -> Result<bool> {
    if let Some(dir) = cli.input.as_deref().filter(|p| p.is_dir()) {
        if cli.output.is_some() {
            bail!("--output cannot be used with directory input");
        }
        return process_directory(dir, cli);
    }

    let input = read_input(cli.input.as_deref())?;
    process_input(&input, cli.input.as_deref(), cli)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("cannot read stdin")?;
            Ok(buffer)
        }
    }
}

fn display_name(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "<stdin>".to_string())
}

fn process_input(input: &str, path: Option<&Path>, cli: &Cli) -> Result<bool> {
    let name = display_name(path);

    if cli.check {
        return Ok(match transcode::decode(input, cli.from) {
            Ok(_) => {
                println!("{name}: ok");
                true
            }
            Err(e) => {
                eprintln!("{name}: {e:#}");
                false
            }
        });
    }

    let node = transcode::decode(input, cli.from).with_context(|| format!("cannot read {name}"))?;
    debug!(input = %name, kind = node.kind(), "parsed document");
    let output = transcode::encode(&node, cli.to).with_context(|| format!("cannot convert {name}"))?;
    write_output(&output, path, cli)?;
    Ok(true)
}

fn process_directory(dir: &Path, cli: &Cli) -> Result<bool> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("cannot read directory {}", dir.display()))?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml")))
        .collect();
    files.sort();
    info!(dir = %dir.display(), files = files.len(), "processing directory");

    let mut all_ok = true;
    for path in &files {
        let result = read_input(Some(path)).and_then(|input| process_input(&input, Some(path), cli));
        match result {
            Ok(ok) => all_ok &= ok,
            Err(e) => {
                eprintln!("Error: {e:#}");
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

fn write_output(output: &str, input: Option<&Path>, cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.output {
        fs::write(path, output).with_context(|| format!("cannot write {}", path.display()))
    } else if cli.write {
        let Some(input) = input else {
            bail!("--write requires an input file");
        };
        let path = input.with_extension(cli.to.extension());
        if path == input {
            warn!(path = %path.display(), "rewriting input in place");
        }
        fs::write(&path, output).with_context(|| format!("cannot write {}", path.display()))
    } else {
        print!("{output}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::try_parse_from(["polyaml", "-t", "json", "-o", "out.json", "config.yaml"]).unwrap();
        assert_eq!(cli.to, Format::Json);
        assert_eq!(cli.from, Format::Yaml);
        assert_eq!(cli.output.as_deref(), Some(Path::new("out.json")));
        assert_eq!(cli.input.as_deref(), Some(Path::new("config.yaml")));

        assert!(Cli::try_parse_from(["polyaml", "--check", "-w", "config.yaml"]).is_err());
        assert!(Cli::try_parse_from(["polyaml", "-t", "toml"]).is_err());
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("polyaml").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_check_reports_validity() {
        let check = cli(&["--check"]);
        assert!(process_input("mode: rule\n", None, &check).unwrap());
        assert!(!process_input("a: 1\n  b: 2\n", None, &check).unwrap());
    }

    #[test]
    fn test_write_infers_output_extension() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("config.yaml");
        fs::write(&input, "port: 7890\nallow-lan: true\n").unwrap();
        let path = input.to_str().unwrap();

        let to_json = cli(&["-w", "-t", "json", path]);
        let source = read_input(Some(&input)).unwrap();
        assert!(process_input(&source, Some(&input), &to_json).unwrap());
        let json = fs::read_to_string(dir.path().join("config.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["port"], 7890);
        assert_eq!(value["allow-lan"], true);

        let canonical = cli(&["-w", path]);
        fs::write(&input, "port:   7890 # mixed\n").unwrap();
        let source = read_input(Some(&input)).unwrap();
        assert!(process_input(&source, Some(&input), &canonical).unwrap());
        assert_eq!(fs::read_to_string(&input).unwrap(), "port: 7890\n");
    }

    #[test]
    fn test_write_requires_input_file() {
        let err = write_output("a: 1\n", None, &cli(&["-w"])).unwrap_err();
        assert_eq!(err.to_string(), "--write requires an input file");
    }

    #[test]
    fn test_directory_processes_yaml_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.yaml"), "mode: rule\n").unwrap();
        fs::write(dir.path().join("b.yml"), "proxies: []\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "a: 1\n  b: 2\n").unwrap();
        let path = dir.path().to_str().unwrap();

        assert!(run(&cli(&["--check", path])).unwrap());

        assert!(run(&cli(&["-w", "-t", "json", path])).unwrap());
        assert!(dir.path().join("a.json").exists());
        assert!(dir.path().join("b.json").exists());
        assert!(!dir.path().join("notes.json").exists());

        fs::write(dir.path().join("c.yaml"), "ports: [1, 2\n").unwrap();
        assert!(!run(&cli(&["--check", path])).unwrap());
    }

    #[test]
    fn test_directory_rejects_output_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_str().unwrap();
        let err = run(&cli(&["-o", "out.yaml", path])).unwrap_err();
        assert_eq!(err.to_string(), "--output cannot be used with directory input");
    }
}
