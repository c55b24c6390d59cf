// mboss-cli: shared utilities for CLI tools.

use std::io::{self, Write};
use std::process;

use mboss_core::jsonio::JsonDocument;
use mboss_fst::{Machine, Params};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "MBOSS_LOG";

/// Filter used when `MBOSS_LOG` is unset or unparsable.
const DEFAULT_LOG_FILTER: &str = "warn";

/// Install a stderr `tracing` subscriber filtered by `MBOSS_LOG`.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Load and validate a machine JSON file.
pub fn load_machine(path: &str) -> Result<Machine, String> {
    tracing::debug!(path, "loading machine");
    Machine::from_file(path).map_err(|e| format!("{path}: {e}"))
}

/// Load and validate a parameter JSON file.
pub fn load_params(path: &str) -> Result<Params, String> {
    tracing::debug!(path, "loading parameters");
    Params::from_file(path).map_err(|e| format!("{path}: {e}"))
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &Value) -> Result<(), String> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    serde_json::to_writer_pretty(&mut out, value).map_err(|e| e.to_string())?;
    writeln!(out).map_err(|e| e.to_string())?;
    out.flush().map_err(|e| e.to_string())
}

/// Parse every `--long=VALUE`, `--long VALUE` or `-s VALUE` option from
/// command line args.
///
/// Returns `(values, remaining_args)`, values in command line order.
pub fn parse_option_values(
    args: &[String],
    short: &str,
    long: &str,
) -> Result<(Vec<String>, Vec<String>), String> {
    let prefix = format!("{long}=");
    let mut values = Vec::new();
    let mut remaining = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if let Some(val) = arg.strip_prefix(&prefix) {
            values.push(val.to_string());
        } else if arg == short || arg == long {
            match iter.next() {
                Some(val) => values.push(val.clone()),
                None => return Err(format!("{arg} requires a value")),
            }
        } else {
            remaining.push(arg.clone());
        }
    }

    Ok((values, remaining))
}

/// Load parameter files in order, later files overriding earlier ones.
///
/// Returns `None` when `paths` is empty.
pub fn load_layered_params(paths: &[String]) -> Result<Option<Params>, String> {
    let mut layered: Option<Params> = None;
    for path in paths {
        let params = load_params(path)?;
        match layered.as_mut() {
            Some(base) => base.merge(&params),
            None => layered = Some(params),
        }
    }
    Ok(layered)
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Check if `--help` or `-h` is in the args.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn option_forms() {
        let (v, rest) = parse_option_values(&args(&["-p", "a.json", "m.json"]), "-p", "--params").unwrap();
        assert_eq!(v, args(&["a.json"]));
        assert_eq!(rest, args(&["m.json"]));

        let (v, rest) = parse_option_values(&args(&["m.json", "--params=b.json"]), "-p", "--params").unwrap();
        assert_eq!(v, args(&["b.json"]));
        assert_eq!(rest, args(&["m.json"]));

        let (v, _) = parse_option_values(&args(&["--params", "c.json"]), "-p", "--params").unwrap();
        assert_eq!(v, args(&["c.json"]));
    }

    #[test]
    fn repeated_option_keeps_order() {
        let (v, rest) = parse_option_values(
            &args(&["-p", "a.json", "m.json", "--params=b.json", "--params", "c.json"]),
            "-p",
            "--params",
        )
        .unwrap();
        assert_eq!(v, args(&["a.json", "b.json", "c.json"]));
        assert_eq!(rest, args(&["m.json"]));
    }

    #[test]
    fn later_params_override_earlier() {
        let dir = std::env::temp_dir().join(format!("mboss-cli-params-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let base = dir.join("base.json");
        let over = dir.join("over.json");
        std::fs::write(&base, r#"{"p": 0.25, "q": 0.5}"#).unwrap();
        std::fs::write(&over, r#"{"q": 0.75}"#).unwrap();

        let paths = vec![
            base.to_string_lossy().into_owned(),
            over.to_string_lossy().into_owned(),
        ];
        let params = load_layered_params(&paths).unwrap().unwrap();
        assert_eq!(params.get("p"), Some(0.25));
        assert_eq!(params.get("q"), Some(0.75));
        assert!(load_layered_params(&[]).unwrap().is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn option_absent() {
        let (v, rest) = parse_option_values(&args(&["--sum-silent", "m.json"]), "-p", "--params").unwrap();
        assert!(v.is_empty());
        assert_eq!(rest.len(), 2);
    }

    #[test]
    fn option_missing_value() {
        let err = parse_option_values(&args(&["m.json", "-p"]), "-p", "--params").unwrap_err();
        assert!(err.contains("-p"));
    }

    #[test]
    fn help_flag() {
        assert!(wants_help(&args(&["x", "-h"])));
        assert!(!wants_help(&args(&["x"])));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_machine("/nonexistent/machine.json").unwrap_err();
        assert!(err.starts_with("/nonexistent/machine.json: "));
    }
}
