//! Argument parsing for the `sixdegrees` binary.

use std::path::PathBuf;

use crate::config::{DegreesConfig, MEMORY_DATABASE};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Find(String),
    FindAll,
    Unreachable,
    Ingest { paths: Vec<PathBuf>, replace: bool },
    Status,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLineConfig {
    pub database: String,
    pub root_name: Option<String>,
    pub cache: bool,
    pub batch_size: Option<usize>,
    pub verbose: bool,
    pub command: Command,
}

impl CommandLineConfig {
    /// Parses `args`, program name included. Flags must come before the
    /// command; everything after the command belongs to it.
    pub fn from_args(args: &[&str]) -> Result<Self, String> {
        let mut database = String::from(MEMORY_DATABASE);
        let mut root_name = None;
        let mut cache = false;
        let mut batch_size = None;
        let mut verbose = false;
        let mut command = None;
        let mut command_args = Vec::new();
        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            if command.is_some() {
                command_args.push(arg.to_string());
                continue;
            }
            match *arg {
                "--db" | "--database" => {
                    database = iter
                        .next()
                        .ok_or_else(|| "--db requires a value".to_string())?
                        .to_string();
                }
                "--root" => {
                    root_name = Some(
                        iter.next()
                            .ok_or_else(|| "--root requires a value".to_string())?
                            .to_string(),
                    );
                }
                "--batch-size" => {
                    let raw = iter
                        .next()
                        .ok_or_else(|| "--batch-size requires a value".to_string())?;
                    let parsed = raw
                        .parse::<usize>()
                        .map_err(|_| format!("invalid batch size {raw}"))?;
                    if parsed == 0 {
                        return Err("--batch-size must be positive".to_string());
                    }
                    batch_size = Some(parsed);
                }
                "--cache" => cache = true,
                "--verbose" | "-v" => verbose = true,
                other if other.starts_with('-') => {
                    return Err(format!("unknown flag {other}"));
                }
                other => command = Some(other.to_string()),
            }
        }
        let command = match command.as_deref() {
            None | Some("status") => no_arguments("status", &command_args, Command::Status)?,
            Some("find") => {
                if command_args.is_empty() {
                    return Err("find requires a person name".to_string());
                }
                Command::Find(command_args.join(" "))
            }
            Some("find-all") => no_arguments("find-all", &command_args, Command::FindAll)?,
            Some("unreachable") => {
                no_arguments("unreachable", &command_args, Command::Unreachable)?
            }
            Some("ingest") => {
                let replace = command_args.first().is_some_and(|arg| arg == "--replace");
                if replace {
                    command_args.remove(0);
                }
                if command_args.is_empty() {
                    return Err("ingest requires at least one path".to_string());
                }
                Command::Ingest {
                    paths: command_args.into_iter().map(PathBuf::from).collect(),
                    replace,
                }
            }
            Some(other) => return Err(format!("unknown command {other}")),
        };
        Ok(Self {
            database,
            root_name,
            cache,
            batch_size,
            verbose,
            command,
        })
    }

    pub fn degrees_config(&self) -> DegreesConfig {
        let mut cfg = DegreesConfig::default();
        if let Some(root) = &self.root_name {
            cfg = cfg.with_root(root);
        }
        if let Some(batch_size) = self.batch_size {
            cfg = cfg.with_batch_size(batch_size);
        }
        cfg
    }

    pub fn help() -> &'static str {
        "Usage: sixdegrees [--db memory|PATH] [--root NAME] [--cache] [--batch-size N] [--verbose] <command>\n\
         \n\
         Commands:\n\
         \x20 find NAME       degrees of separation between the root and NAME\n\
         \x20 find-all        solve every person reachable from the root\n\
         \x20 unreachable     solve everything, then list people with no connection\n\
         \x20 ingest [--replace] PATH...\n\
         \x20                 load group documents from JSON files or directories;\n\
         \x20                 --replace empties the store first\n\
         \x20 status          show store counts (default)\n\
         \n\
         Set SIXDEGREES_LOG to trace, debug, info, warn or error to choose the log level.\n"
    }
}

fn no_arguments(name: &str, args: &[String], command: Command) -> Result<Command, String> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(format!("{name} takes no arguments"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_status_in_memory() {
        let cfg = CommandLineConfig::from_args(&["sixdegrees"]).expect("parse");
        assert_eq!(cfg.command, Command::Status);
        assert_eq!(cfg.database, MEMORY_DATABASE);
        assert!(!cfg.cache);
    }

    #[test]
    fn find_joins_name_words() {
        let cfg = CommandLineConfig::from_args(&[
            "sixdegrees",
            "--cache",
            "--root",
            "Root Person",
            "find",
            "Kevin",
            "Bacon",
        ])
        .expect("parse");
        assert_eq!(cfg.command, Command::Find("Kevin Bacon".to_string()));
        assert!(cfg.cache);
        assert_eq!(cfg.degrees_config().root_name, "Root Person");
    }

    #[test]
    fn rejects_bad_input() {
        assert!(CommandLineConfig::from_args(&["sixdegrees", "--nope"]).is_err());
        assert!(CommandLineConfig::from_args(&["sixdegrees", "find"]).is_err());
        assert!(CommandLineConfig::from_args(&["sixdegrees", "--batch-size", "0"]).is_err());
        assert!(CommandLineConfig::from_args(&["sixdegrees", "status", "extra"]).is_err());
        assert!(CommandLineConfig::from_args(&["sixdegrees", "launch"]).is_err());
        assert!(CommandLineConfig::from_args(&["sixdegrees", "ingest", "--replace"]).is_err());
    }

    #[test]
    fn ingest_accepts_replace_before_paths() {
        let cfg = CommandLineConfig::from_args(&["sixdegrees", "ingest", "--replace", "a", "b"])
            .expect("parse");
        assert_eq!(
            cfg.command,
            Command::Ingest {
                paths: vec![PathBuf::from("a"), PathBuf::from("b")],
                replace: true,
            }
        );
        let cfg = CommandLineConfig::from_args(&["sixdegrees", "ingest", "a"]).expect("parse");
        assert!(matches!(cfg.command, Command::Ingest { replace: false, .. }));
    }
}
