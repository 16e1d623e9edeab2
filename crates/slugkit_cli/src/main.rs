//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `slugkit_core` linkage with `ping`/version output.
//! - Resolve identifiers against a database file:
//!   `slugkit find [--lenient] <db-path> <collection> <id>...`
//!
//! Set `SLUGKIT_LOG_DIR` to an absolute path to enable file logging.

use slugkit_core::db::open_db;
use slugkit_core::{
    default_log_level, init_logging, Lookup, Resolution, ResolveError, Resolver, ResolverConfig,
    SqliteCollectionStore,
};
use std::error::Error;
use std::process::ExitCode;

const USAGE: &str = "usage: slugkit find [--lenient] <db-path> <collection> <id>...";
const EXIT_NOT_FOUND: u8 = 2;

fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var("SLUGKIT_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => {
            println!("slugkit_core ping={}", slugkit_core::ping());
            println!("slugkit_core version={}", slugkit_core::core_version());
            ExitCode::SUCCESS
        }
        Some("find") => match run_find(&args[1..]) {
            Ok(code) => code,
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::FAILURE
            }
        },
        Some(_) => {
            eprintln!("{USAGE}");
            ExitCode::FAILURE
        }
    }
}

fn run_find(args: &[String]) -> Result<ExitCode, Box<dyn Error>> {
    let (lenient, rest) = match args.split_first() {
        Some((flag, rest)) if flag == "--lenient" => (true, rest),
        _ => (false, args),
    };
    let [db_path, collection, ids @ ..] = rest else {
        return Err(USAGE.into());
    };
    if ids.is_empty() {
        return Err(USAGE.into());
    }

    let mut conn = open_db(db_path)?;
    let store = SqliteCollectionStore::try_new(&mut conn, collection)?;
    let config = ResolverConfig::default().with_raise_not_found(!lenient);
    let resolver = Resolver::new(store.schema().clone(), &store, config);

    let lookup = match ids {
        [single] => Lookup::One(single.as_str().into()),
        many => Lookup::from(many.to_vec()),
    };

    match resolver.find(lookup) {
        Ok(Resolution::One(Some(document))) => {
            println!("{}", serde_json::to_string(&document)?);
        }
        Ok(Resolution::One(None)) => println!("null"),
        Ok(Resolution::Many(documents)) => {
            println!("{}", serde_json::to_string(&documents)?);
        }
        Err(ResolveError::DocumentNotFound(payload)) => {
            eprintln!("{}", serde_json::to_string(&payload)?);
            return Ok(ExitCode::from(EXIT_NOT_FOUND));
        }
        Err(err) => return Err(err.into()),
    }
    Ok(ExitCode::SUCCESS)
}
