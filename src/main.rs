//! HBnB CLI - drive the configured store from the command line

use clap::{Parser, Subcommand};
use hbnb::config::{self, DatabaseSection, HbnbConfig};
use hbnb::ui::{self, Icons};
use hbnb::{commands, open_storage, Config, EntityKey, EntityKind, Storage};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "hbnb")]
#[command(version)]
#[command(about = "HBnB object storage - inspect and edit the configured store")]
#[command(long_about = r#"
Runs against the file store (default) or the database store
(HBNB_TYPE_STORAGE=db with HBNB_DB_USER, HBNB_DB_PWD, HBNB_DB_HOST, HBNB_DB_NAME).

Example usage:
  hbnb create State name="California"
  hbnb create Place city_id="0001" user_id="0002" name="My_little_house" number_rooms=4
  hbnb all State
  hbnb related State <id> City
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,

        /// Configure the database store instead of the file store
        #[arg(long)]
        db: bool,
    },

    #[command(flatten)]
    Store(StoreCommand),
}

/// Subcommands that run against the configured store
#[derive(Subcommand)]
enum StoreCommand {
    /// Create an entity and print its id
    Create {
        /// Entity type (State, City, ...)
        kind: EntityKind,

        /// Attributes as key=value ("quoted_strings", integers, floats)
        params: Vec<String>,
    },

    /// Show one entity
    Show { kind: EntityKind, id: String },

    /// Delete one entity
    Destroy { kind: EntityKind, id: String },

    /// List entities, optionally of one type
    All { kind: Option<EntityKind> },

    /// Count entities, optionally of one type
    Count { kind: Option<EntityKind> },

    /// Set one attribute on an entity
    Update {
        kind: EntityKind,
        id: String,
        attribute: String,
        value: String,
    },

    /// List entities of TARGET related to an entity
    Related {
        kind: EntityKind,
        id: String,
        target: EntityKind,
    },
}

fn main() {
    if let Err(e) = run() {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Init { force, db } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            run_init(&path, force, db)
        }
        Commands::Store(command) => {
            let file = config::load_config(cli.config.as_deref())?;
            let config = Config::from_env(file)?;
            let mut store = open_storage(&config)?;
            run_command(store.as_mut(), command)
        }
    }
}

fn run_command(store: &mut dyn Storage, command: StoreCommand) -> anyhow::Result<()> {
    match command {
        StoreCommand::Create { kind, params } => {
            let entity = commands::create(store, kind, &params)?;
            println!("{}", entity.id());
        }
        StoreCommand::Show { kind, id } => {
            let entity = commands::show(store, &EntityKey::new(kind, id))?;
            println!("{}", serde_json::to_string_pretty(&entity.to_record()?)?);
        }
        StoreCommand::Destroy { kind, id } => {
            let key = EntityKey::new(kind, id);
            commands::destroy(store, &key)?;
            ui::success(&format!("{} {} destroyed", Icons::DEL, key));
        }
        StoreCommand::All { kind } => {
            let entities = store.all(kind)?;
            if entities.is_empty() {
                ui::info("Entities", "none");
            } else {
                println!("{}", ui::entity_table(entities.values()));
            }
        }
        StoreCommand::Count { kind } => {
            let counts = commands::counts(store, kind)?;
            println!("{}", ui::count_table(&counts));
        }
        StoreCommand::Update { kind, id, attribute, value } => {
            let entity = commands::update(store, &EntityKey::new(kind, id), &attribute, &value)?;
            ui::success(&format!("updated {}", entity.key()));
        }
        StoreCommand::Related { kind, id, target } => {
            let owner = EntityKey::new(kind, id);
            let related = store.related(&owner, target)?;
            ui::section(&format!("{} {} of {}", Icons::LINK, target, owner));
            if related.is_empty() {
                ui::summary_row("found", "0");
            } else {
                println!("{}", ui::entity_table(&related));
            }
        }
    }

    Ok(())
}

fn run_init(path: &std::path::Path, force: bool, db: bool) -> anyhow::Result<()> {
    let starter = if db {
        HbnbConfig {
            storage: Some("db".to_string()),
            database: Some(DatabaseSection {
                user: Some("hbnb_dev".to_string()),
                password: Some("hbnb_dev_pwd".to_string()),
                host: Some("localhost".to_string()),
                name: Some("hbnb_dev_db".to_string()),
            }),
            ..HbnbConfig::default()
        }
    } else {
        HbnbConfig {
            storage: Some("file".to_string()),
            file_path: Some("file.json".to_string()),
            ..HbnbConfig::default()
        }
    };

    config::write_config(path, &starter, force)?;
    ui::header("HBnB initialized");
    ui::info("Config", &path.display().to_string());
    ui::summary_row(
        if db { Icons::DATABASE } else { Icons::FILE },
        &ui::dim(starter.storage.as_deref().unwrap_or("file")),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_init_is_not_a_store_command() {
        let cli = Cli::try_parse_from(["hbnb", "init", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Init { force: true, db: false }));
    }

    #[test]
    fn test_store_commands_parse() {
        let cli = Cli::try_parse_from(["hbnb", "create", "State", "name=\"California\""]).unwrap();
        let Commands::Store(StoreCommand::Create { kind, params }) = cli.command else {
            panic!("expected create");
        };
        assert_eq!(kind, EntityKind::State);
        assert_eq!(params, vec!["name=\"California\"".to_string()]);

        let cli = Cli::try_parse_from(["hbnb", "-v", "related", "State", "abc", "City"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Store(StoreCommand::Related { target: EntityKind::City, .. })
        ));

        assert!(Cli::try_parse_from(["hbnb", "all", "Spaceship"]).is_err());
    }
}
