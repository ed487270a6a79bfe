//! Command-line driver: load one module and call one of its functions
//!
//! ```text
//! pyhost [OPTIONS] <module> <function> [args...]
//! ```
//!
//! Arguments are read as integers, floats, `true`/`false`, `none`,
//! `b:<bytes>`, or text otherwise.

use std::path::PathBuf;

use tracing::{debug, error, info};

use crate::config::SessionConfig;
use crate::core::HostValue;
use crate::logging::{init_logging, LogConfig};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    pub module: String,
    pub function: String,
    pub args: Vec<HostValue>,
    pub search_paths: Vec<PathBuf>,
    pub config_file: Option<PathBuf>,
}

impl CliConfig {
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        let prog = args.first().map(String::as_str).unwrap_or("pyhost");
        let mut positional = Vec::new();
        let mut search_paths = Vec::new();
        let mut config_file = None;

        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            // Everything after the function name is an argument, dashes included
            if positional.len() >= 2 {
                positional.push(arg.clone());
                continue;
            }
            match arg.as_str() {
                "--help" | "-h" => return Err(usage(prog)),
                "--path" | "-p" => {
                    let dir = iter.next().ok_or_else(|| format!("--path needs a value\n\n{}", usage(prog)))?;
                    search_paths.push(PathBuf::from(dir));
                }
                "--config" | "-c" => {
                    let file = iter.next().ok_or_else(|| format!("--config needs a value\n\n{}", usage(prog)))?;
                    config_file = Some(PathBuf::from(file));
                }
                opt if opt.starts_with("--") => {
                    return Err(format!("Unknown option: {}\n\n{}", opt, usage(prog)));
                }
                value => positional.push(value.to_string()),
            }
        }

        if positional.len() < 2 {
            return Err(usage(prog));
        }

        let mut positional = positional.into_iter();
        let module = positional.next().unwrap_or_default();
        let function = positional.next().unwrap_or_default();
        let args = positional.map(|a| parse_arg(&a)).collect();

        Ok(Self { module, function, args, search_paths, config_file })
    }
}

fn usage(prog: &str) -> String {
    format!(
        "pyhost - call a function in a Python module\n\n\
        USAGE:\n    {} [OPTIONS] <module> <function> [args...]\n\n\
        OPTIONS:\n    \
        -h, --help           Print help information\n    \
        -p, --path <dir>     Add a module search directory (repeatable)\n    \
        -c, --config <file>  Read session settings from a TOML file\n\n\
        ARGUMENTS:\n    \
        42, -7               int\n    \
        1.5                  float\n    \
        true, false          bool\n    \
        none                 None\n    \
        b:hello              bytes\n    \
        anything else        str\n\n\
        EXAMPLES:\n    \
        {} libtests.test_script2 func7 6.5 10 hello\n    \
        {} -p scripts tools reverse b:olleh",
        prog, prog, prog
    )
}

/// Interpret one command-line word as a host value
pub fn parse_arg(arg: &str) -> HostValue {
    if let Some(bytes) = arg.strip_prefix("b:") {
        return HostValue::bytes(bytes);
    }
    match arg {
        "true" => return HostValue::Bool(true),
        "false" => return HostValue::Bool(false),
        "none" => return HostValue::Null,
        _ => {}
    }
    if let Ok(i) = arg.parse::<i64>() {
        return HostValue::from(i);
    }
    if let Ok(x) = arg.parse::<f64>() {
        if x.is_finite() {
            return HostValue::from(x);
        }
    }
    HostValue::text(arg)
}

/// Run the driver; returns the process exit code
pub fn cli_main() -> Result<i32, Box<dyn std::error::Error>> {
    let _guard = init_logging(LogConfig::from_env());

    let args: Vec<String> = std::env::args().collect();
    let cli = match CliConfig::from_args(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(2);
        }
    };

    debug!(module = %cli.module, function = %cli.function, args = cli.args.len(), "Arguments parsed");

    let mut config = match &cli.config_file {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::discover(),
    }
    .with_env_overrides();
    for dir in &cli.search_paths {
        config = config.with_search_path(dir.clone());
    }

    let session = Session::init(config)?;
    session.load(&cli.module)?;
    info!(registered = session.names().len(), "Module ready");

    let code = match session.call(&cli.function, &cli.args) {
        Ok(value) => {
            println!("{}", value);
            0
        }
        Err(e) => {
            error!(error = %e, "Call failed");
            eprintln!("{}", e);
            1
        }
    };

    session.finalize();
    Ok(code)
}
