// Declare modules
pub mod classifier;
pub mod cli;
pub mod config;
pub mod connection;
pub mod dumper;
pub mod formatter;
pub mod inspector;
pub mod matcher;
pub mod models;

use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::path::{Path, PathBuf};

use self::classifier::TableClassifier;
use self::cli::{Cli, Command, ConfigCommand, DumpArgs, ExcludeArgs};
use self::config::{
    find_profile, global_config_path, load_profiles, merge_layers, resolve_layers, LayerInputs,
    PROJECT_CONFIG_FILE,
};
use self::connection::{Connection, ConnectionArgs};
use self::dumper::{check_mysqldump, Dumper};
use self::formatter::OutputGenerator;
use self::inspector::Inspector;
use self::models::{ConfigLayer, ExcludeConfig};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// Parses args, sets up logging and runs the selected command.
pub fn run() -> Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    match &args.command {
        Command::Dump(dump_args) => run_dump(&args, dump_args),
        Command::List => run_list(&args),
        Command::Config(ConfigCommand::Show(exclude_args)) => run_config_show(exclude_args),
        Command::Config(ConfigCommand::List) => run_config_list(),
    }
}

fn layer_inputs(args: &ExcludeArgs) -> Result<LayerInputs> {
    let global_path = match global_config_path() {
        Ok(path) => Some(path),
        Err(err) => {
            log::warn!("Skipping global config: {:#}", err);
            None
        }
    };

    let (project_path, project_required) = match &args.config {
        Some(path) => (Some(path.clone()), true),
        None => {
            let current_dir = env::current_dir().context("Failed to get current directory")?;
            (Some(current_dir.join(PROJECT_CONFIG_FILE)), false)
        }
    };

    Ok(LayerInputs {
        use_defaults: !args.no_defaults,
        global_path,
        project_path,
        project_required,
        cli_exact: args.exclude.clone(),
        cli_patterns: args.exclude_pattern.clone(),
    })
}

fn effective_config(args: &ExcludeArgs) -> Result<(Vec<ConfigLayer>, ExcludeConfig)> {
    let layers = resolve_layers(&layer_inputs(args)?)?;
    let effective = merge_layers(&layers);
    log::debug!(
        "Effective exclusions: {} exact, {} patterns from {} layers",
        effective.exact.len(),
        effective.patterns.len(),
        layers.len()
    );
    Ok((layers, effective))
}

fn connection(args: &Cli) -> Result<Connection> {
    let profiles;
    let profile = match &args.profile {
        Some(name) => {
            profiles = load_profiles()?;
            Some(find_profile(&profiles, name)?)
        }
        None => None,
    };

    let conn_args = ConnectionArgs {
        host: args.host.clone(),
        port: args.port,
        user: args.user.clone(),
        password: args.password.clone(),
        database: args.database.clone(),
    };
    Connection::resolve(conn_args, profile)
}

fn default_output_file(database: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("{}_{}.sql", database, timestamp)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let current_dir = env::current_dir().context("Failed to get current directory")?;
    Ok(current_dir.join(path))
}

fn run_dump(args: &Cli, dump_args: &DumpArgs) -> Result<()> {
    if !dump_args.dry_run {
        check_mysqldump()?;
    }

    let conn = connection(args)?;
    let inspector = Inspector::connect(&conn)?;
    inspector.ping()?;
    log::info!("Connected to database '{}'", conn.database);

    let tables = inspector.all_tables()?;
    log::info!("Found {} tables", tables.len());

    let (_, effective) = effective_config(&dump_args.excludes)?;
    if effective.is_empty() {
        log::warn!("No exclusions configured, data for every table will be dumped");
    }
    let classifier = TableClassifier::new(&effective)?;
    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    let classification = classifier.classify(&names);
    log::info!(
        "Excluding data from {} tables based on patterns",
        classification.excluded.len()
    );

    let output_file = match &dump_args.output {
        Some(path) => absolute(path)?,
        None => absolute(Path::new(&default_output_file(&conn.database)))?,
    };

    if dump_args.dry_run {
        println!(
            "{}",
            OutputGenerator::generate_dry_run(&classification, &output_file)
        );
        return Ok(());
    }

    log::info!("Starting dump to {}", output_file.display());
    let result = Dumper::new(&conn, &classification.excluded).dump(&output_file)?;
    println!("{}", OutputGenerator::generate_summary(&result));

    Ok(())
}

fn run_list(args: &Cli) -> Result<()> {
    let conn = connection(args)?;
    let tables = Inspector::connect(&conn)?.all_tables()?;
    println!(
        "{}",
        OutputGenerator::generate_table_list(&conn.database, &tables)
    );
    Ok(())
}

fn run_config_show(args: &ExcludeArgs) -> Result<()> {
    let (layers, effective) = effective_config(args)?;
    println!(
        "{}",
        OutputGenerator::generate_config_report(&layers, &effective)
    );
    Ok(())
}

fn run_config_list() -> Result<()> {
    let profiles = load_profiles().context("Failed to load profiles")?;
    println!("{}", OutputGenerator::generate_profiles(&profiles));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_config_flag_is_required_to_exist() {
        let args = ExcludeArgs {
            config: Some(PathBuf::from("/nonexistent/dbdump.toml")),
            ..Default::default()
        };
        let inputs = layer_inputs(&args).unwrap();
        assert!(inputs.project_required);
        assert!(inputs.use_defaults);
    }

    #[test]
    fn cli_flags_flow_into_layer_inputs() {
        let args = ExcludeArgs {
            exclude: vec!["users".to_string()],
            exclude_pattern: vec!["tmp_*".to_string()],
            no_defaults: true,
            ..Default::default()
        };
        let inputs = layer_inputs(&args).unwrap();
        assert!(!inputs.use_defaults);
        assert!(!inputs.project_required);
        assert_eq!(inputs.cli_exact, vec!["users"]);
        assert_eq!(inputs.cli_patterns, vec!["tmp_*"]);
    }

    #[test]
    fn default_output_file_is_named_after_database() {
        let name = default_output_file("shop");
        assert!(name.starts_with("shop_"));
        assert!(name.ends_with(".sql"));
        assert_eq!(name.len(), "shop_20240101_120000.sql".len());
    }

    #[test]
    fn relative_output_is_made_absolute() {
        assert!(absolute(Path::new("out.sql")).unwrap().is_absolute());
        assert_eq!(
            absolute(Path::new("/tmp/out.sql")).unwrap(),
            PathBuf::from("/tmp/out.sql")
        );
    }
}
