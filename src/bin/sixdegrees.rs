use std::{env, process};

use sixdegrees::{
    DegreesError, QueryOutcome, SeparationClient, SqliteStore,
    cli::{Command, CommandLineConfig},
    config::open_store,
    ingest::{ingest_path, read_documents, replace_documents},
    interrupt::Interrupt,
};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SIXDEGREES_LOG";

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{}", CommandLineConfig::help());
        return;
    }
    let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
    let config = match CommandLineConfig::from_args(&arg_refs) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {err}");
            eprint!("{}", CommandLineConfig::help());
            process::exit(2);
        }
    };
    init_tracing(config.verbose);

    let degrees = config.degrees_config();
    if let Err(err) = degrees.validate() {
        eprintln!("error: {err}");
        process::exit(2);
    }
    let store = match open_store(&config.database, &degrees.store) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };
    let interrupt = match Interrupt::from_signals() {
        Ok(interrupt) => interrupt,
        Err(err) => {
            eprintln!("cannot install signal handlers: {err}");
            process::exit(1);
        }
    };
    let client = SeparationClient::new(store, degrees).with_interrupt(interrupt);
    match run_command(&client, &config) {
        Ok(()) => {}
        Err(err) if err.is_interrupted() => {
            eprintln!("interrupted");
            process::exit(130);
        }
        Err(err) => {
            eprintln!("command failed: {err}");
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_command(
    client: &SeparationClient<SqliteStore>,
    config: &CommandLineConfig,
) -> Result<(), DegreesError> {
    match &config.command {
        Command::Find(name) => {
            let outcome = client.find(name, config.cache)?;
            println!("{}", outcome.headline(name));
            if let QueryOutcome::Found(separation) = &outcome {
                for line in client.describe(separation)? {
                    println!("{line}");
                }
            }
            Ok(())
        }
        Command::FindAll => {
            let summary = client.find_all(config.cache)?;
            println!(
                "people={} groups={} tiers={} iterations={} cached={} resumed={}",
                summary.people_discovered,
                summary.groups_discovered,
                summary.tiers,
                summary.iterations,
                summary.results_written,
                summary.resumed
            );
            Ok(())
        }
        Command::Unreachable => {
            client.find_all(true)?;
            let unreachable = client.list_unreachable()?;
            if unreachable.is_empty() {
                println!("Everyone is connected to {}.", client.config().root_name);
            }
            for (group, people) in unreachable {
                println!("{group}: {}", people.join(", "));
            }
            Ok(())
        }
        Command::Ingest {
            paths,
            replace: true,
        } => {
            let mut documents = Vec::new();
            for path in paths {
                documents.extend(read_documents(path)?);
            }
            let stats = replace_documents(client.store(), &documents, &client.config().root_name)?;
            println!(
                "replaced store: groups_added={} groups_skipped={} people_added={} memberships_added={}",
                stats.groups_added, stats.groups_skipped, stats.people_added, stats.memberships_added
            );
            Ok(())
        }
        Command::Ingest {
            paths,
            replace: false,
        } => {
            for path in paths {
                let stats = ingest_path(client.store(), path, &client.config().root_name)?;
                println!(
                    "{}: groups_added={} groups_skipped={} people_added={} memberships_added={}",
                    path.display(),
                    stats.groups_added,
                    stats.groups_skipped,
                    stats.people_added,
                    stats.memberships_added
                );
            }
            Ok(())
        }
        Command::Status => {
            let counts = client.store().counts()?;
            let root = match client.store().root_name()? {
                Some(name) => name,
                None => "unset".to_string(),
            };
            println!(
                "people={} groups={} memberships={} cached_results={} root={root}",
                counts.people, counts.groups, counts.memberships, counts.cached_results
            );
            Ok(())
        }
    }
}
