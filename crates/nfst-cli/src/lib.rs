// nfst-cli: shared utilities for the command line tools.

use std::process;

/// Print an error message and exit with status 1.
pub fn fatal(message: &str) -> ! {
    eprintln!("nfst: {message}");
    process::exit(1);
}

/// True if the arguments ask for help.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "-h" || a == "--help")
}

/// Remove `short`/`long` and its value from `args`, returning the value.
pub fn take_flag(args: &mut Vec<String>, short: &str, long: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == short || a == long)?;
    if pos + 1 >= args.len() {
        fatal(&format!("missing value for {}", args[pos]));
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Some(value)
}

/// Install the fmt subscriber, filtered by `RUST_LOG` (off by default).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn take_flag_removes_flag_and_value() {
        let mut a = args(&["-r", "weather", "grammar.nre"]);
        assert_eq!(take_flag(&mut a, "-r", "--rule"), Some("weather".to_string()));
        assert_eq!(a, args(&["grammar.nre"]));
    }

    #[test]
    fn take_flag_accepts_long_form() {
        let mut a = args(&["--rule", "weather"]);
        assert_eq!(take_flag(&mut a, "-r", "--rule"), Some("weather".to_string()));
        assert!(a.is_empty());
    }

    #[test]
    fn take_flag_missing_returns_none() {
        let mut a = args(&["grammar.nre"]);
        assert_eq!(take_flag(&mut a, "-r", "--rule"), None);
        assert_eq!(a, args(&["grammar.nre"]));
    }

    #[test]
    fn help_detection() {
        assert!(wants_help(&args(&["-h"])));
        assert!(wants_help(&args(&["x", "--help"])));
        assert!(!wants_help(&args(&["x"])));
    }
}
