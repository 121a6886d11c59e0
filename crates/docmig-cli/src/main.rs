//! `docmig`: migrate versioned context and config documents

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use docmig_catalog::{
    init_logging, migrate_file, status, DocumentKind, LogFormat, MigrationOptions, MigrationOutcome,
};
use docmig_engine::Version;
use tracing::error;

fn cli() -> Command {
    let kind = Arg::new("kind")
        .long("kind")
        .value_parser(["context", "config"])
        .help("Document kind (detected from the root section when omitted)");
    let json = Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON");

    Command::new("docmig")
        .version(docmig_catalog::VERSION)
        .about("Versioned YAML document migrations that keep user edits and comments")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("migrate")
                .about("Upgrade documents to the latest (or a given) version")
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Documents to migrate in place"),
                )
                .arg(kind.clone())
                .arg(
                    Arg::new("target")
                        .long("target")
                        .value_parser(|s: &str| s.parse::<Version>())
                        .help("Stop at this version instead of the latest"),
                )
                .arg(
                    Arg::new("project-dir")
                        .long("project-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Where auxiliary files go (defaults to each document's directory)"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Print the migrated document instead of writing it"),
                )
                .arg(
                    Arg::new("backup")
                        .long("backup")
                        .action(ArgAction::SetTrue)
                        .help("Keep the original as <file>.bak"),
                )
                .arg(json.clone()),
        )
        .subcommand(
            Command::new("status")
                .about("Show declared and latest versions")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Document to inspect"),
                )
                .arg(kind)
                .arg(json),
        )
}

fn kind_arg(args: &ArgMatches) -> anyhow::Result<Option<DocumentKind>> {
    args.get_one::<String>("kind")
        .map(|k| k.parse::<DocumentKind>())
        .transpose()
        .map_err(Into::into)
}

fn options(args: &ArgMatches) -> MigrationOptions {
    let mut options = MigrationOptions::new()
        .with_dry_run(args.get_flag("dry-run"))
        .with_backup(args.get_flag("backup"));
    if let Some(dir) = args.get_one::<PathBuf>("project-dir") {
        options = options.with_project_dir(dir);
    }
    if let Some(target) = args.get_one::<Version>("target") {
        options = options.with_target(*target);
    }
    options
}

/// Run the parsed command, returning whether every document succeeded
fn run(matches: &ArgMatches) -> anyhow::Result<bool> {
    match matches.subcommand() {
        Some(("migrate", args)) => {
            let kind = kind_arg(args)?;
            let options = options(args);
            let json = args.get_flag("json");
            let mut ok = true;
            for file in args.get_many::<PathBuf>("files").into_iter().flatten() {
                match migrate_file(file, kind, &options) {
                    Ok(outcome) => print_outcome(file, &outcome, json)?,
                    Err(err) => {
                        error!(path = %file.display(), "{err:#}");
                        ok = false;
                    }
                }
            }
            Ok(ok)
        }
        Some(("status", args)) => {
            let file = args
                .get_one::<PathBuf>("file")
                .context("missing document path")?;
            let report = status(file, kind_arg(args)?)
                .with_context(|| format!("cannot read status of {}", file.display()))?;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let latest = report
                    .latest
                    .map_or_else(|| "-".to_string(), |v| v.to_string());
                println!(
                    "{}: {} document at {} (latest {latest}){}",
                    file.display(),
                    report.kind,
                    report.declared,
                    if report.up_to_date { "" } else { ", migration available" }
                );
            }
            Ok(report.up_to_date)
        }
        _ => Ok(true),
    }
}

fn print_outcome(
    file: &std::path::Path,
    outcome: &MigrationOutcome,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(outcome)?);
        return Ok(());
    }
    match outcome {
        MigrationOutcome::UpToDate { version } => {
            println!("{}: already at {version}", file.display());
        }
        MigrationOutcome::Migrated {
            from,
            to,
            preview: Some(text),
            ..
        } => {
            println!("# {}: {from} -> {to} (dry run)", file.display());
            print!("{text}");
        }
        MigrationOutcome::Migrated { from, to, backup, .. } => {
            println!("{}: migrated {from} -> {to}", file.display());
            if let Some(backup) = backup {
                println!("  original saved to {}", backup.display());
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logging(LogFormat::from_env());
    match run(&cli().get_matches()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
