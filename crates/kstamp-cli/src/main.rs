//! kstamp binary.
//!
//! Operator-facing harness around the stamping core. Output goes to stdout,
//! logs to stderr (`RUST_LOG` controls the level, default `info`).
//!
//! Usage:
//!   # Fresh identifiers
//!   kstamp generate --prefix usr_ --count 3
//!
//!   # Decode the time and payload of an identifier
//!   kstamp inspect usr_0ujtsYcgvSTl8PAuAdqWYSMnLOv
//!
//!   # Stamp a create payload for the User model
//!   kstamp rewrite --config stamp.toml --model User payload.json
//!   echo '{"email":"a@b.com"}' | kstamp rewrite -c stamp.toml -m User

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use kstamp_core::{Stamper, load_config};
use kstamp_ksuid::{Ksuid, split_prefixed};

/// Generate KSUIDs and stamp them into create payloads.
#[derive(Parser, Debug)]
#[command(name = "kstamp")]
#[command(about = "Generate KSUIDs and stamp them into record-creation payloads")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print fresh identifiers, one per line
    Generate {
        /// Literal prefix, separator included (e.g. "usr_")
        #[arg(short, long, default_value = "")]
        prefix: String,

        /// How many identifiers to print
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },

    /// Show the prefix, timestamp and payload of an identifier
    Inspect {
        identifier: String,

        /// Bytes of prefix; by default everything before the last 27 characters
        #[arg(long)]
        prefix_len: Option<usize>,
    },

    /// Stamp missing identifiers into a JSON create payload
    Rewrite {
        /// Settings file (TOML, or JSON with a .json extension)
        #[arg(short, long)]
        config: PathBuf,

        /// Entity type of the payload root
        #[arg(short, long)]
        model: String,

        /// Payload file; stdin when omitted
        input: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Generate { prefix, count } => {
            for _ in 0..count {
                println!("{}", kstamp_ksuid::generate(&prefix));
            }
        }
        Command::Inspect {
            identifier,
            prefix_len,
        } => {
            print!("{}", describe(&identifier, prefix_len)?);
        }
        Command::Rewrite {
            config,
            model,
            input,
        } => {
            let payload = read_payload(input.as_deref())?;
            let stamped = rewrite(&config, &model, &payload)?;
            println!("{}", serde_json::to_string_pretty(&stamped)?);
        }
    }

    Ok(())
}

/// Human-readable breakdown of a prefixed identifier.
fn describe(identifier: &str, prefix_len: Option<usize>) -> Result<String> {
    let (prefix, ksuid) = match prefix_len {
        Some(n) => {
            let (prefix, body) = identifier
                .split_at_checked(n)
                .with_context(|| format!("prefix length {n} does not fit {identifier:?}"))?;
            (prefix, Ksuid::parse(body).context("malformed identifier body")?)
        }
        None => split_prefixed(identifier).context("malformed identifier")?,
    };

    let payload: String = ksuid.payload().iter().map(|b| format!("{b:02X}")).collect();
    Ok(format!(
        "prefix:    {prefix:?}\nbody:      {ksuid}\ntimestamp: {} (unix {})\npayload:   {payload}\n",
        ksuid.timestamp(),
        ksuid.unix_timestamp(),
    ))
}

fn read_payload(input: Option<&Path>) -> Result<serde_json::Value> {
    let text = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read payload from stdin")?;
            text
        }
    };
    serde_json::from_str(&text).context("payload is not valid JSON")
}

fn rewrite(config: &Path, model: &str, payload: &serde_json::Value) -> Result<serde_json::Value> {
    let config = load_config(config)
        .with_context(|| format!("invalid settings in {}", config.display()))?;
    tracing::debug!(model, ?config, "stamping payload");
    Ok(Stamper::new(config).rewrite(payload, model)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["kstamp", "generate", "-p", "usr_", "-n", "3"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Generate { ref prefix, count: 3 } if prefix == "usr_"
        ));

        let args = Args::try_parse_from(["kstamp", "rewrite", "-c", "s.toml", "-m", "User"]).unwrap();
        assert!(matches!(args.command, Command::Rewrite { input: None, .. }));
    }

    #[test]
    fn test_describe_known_identifier() {
        let text = describe("usr_0ujtsYcgvSTl8PAuAdqWYSMnLOv", None).unwrap();
        assert!(text.contains("prefix:    \"usr_\""));
        assert!(text.contains("timestamp: 107608047 (unix 1507608047)"));
        assert!(text.contains("payload:   B5A1CD34B5F99D1154FB6853345C9735"));
    }

    #[test]
    fn test_describe_explicit_prefix_len() {
        let id = kstamp_ksuid::generate("ab");
        assert!(describe(&id, Some(2)).unwrap().contains("prefix:    \"ab\""));
        assert!(describe(&id, Some(1)).is_err());
        assert!(describe(&id, Some(99)).is_err());
    }

    #[test]
    fn test_describe_rejects_garbage() {
        assert!(describe("short", None).is_err());
    }

    #[test]
    fn test_rewrite_with_settings_file() {
        let mut settings = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        settings
            .write_all(b"[prefix_map]\nUser = \"usr_\"\nProfile = \"prof_\"\n")
            .unwrap();

        let payload = serde_json::json!({ "profile": { "create": { "bio": "x" } } });
        let out = rewrite(settings.path(), "User", &payload).unwrap();
        assert!(out["id"].as_str().unwrap().starts_with("usr_"));
        assert!(out["profile"]["create"]["id"].as_str().unwrap().starts_with("prof_"));
    }

    #[test]
    fn test_rewrite_reports_missing_prefix() {
        let mut settings = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        settings.write_all(b"[prefix_map]\nUser = \"usr_\"\n").unwrap();

        let err = rewrite(settings.path(), "Widget", &serde_json::json!({})).unwrap_err();
        assert!(err.to_string().contains("\"Widget\""));
    }

    #[test]
    fn test_read_payload_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"a": 1}"#).unwrap();
        assert_eq!(read_payload(Some(file.path())).unwrap()["a"], 1);
    }
}
