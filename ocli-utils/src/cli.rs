use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::odoo_conf::DbParams;

#[derive(Parser, Debug)]
#[clap(
    name = "ocli",
    version,
    about = "Operational CLI for Odoo databases and servers"
)]
pub struct CliArgs {
    /// Settings file (odoo binary, config file, addons, backups)
    #[clap(
        long,
        global = true,
        env = "OCLI_SETTINGS",
        default_value = "ocli.yml",
        value_name = "FILE"
    )]
    pub settings: PathBuf,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a default ocli.yml in the current directory
    Init,
    /// List databases with their sizes
    Listdb(ListdbArgs),
    /// Back up a database with `odoo-bin db dump`
    Backupdb(BackupArgs),
    /// Restore a database from a backup with `odoo-bin db load`
    Restoredb(RestoreArgs),
    /// Duplicate a database with `odoo-bin db duplicate`
    Copydb(CopyArgs),
    /// Create and initialize a database with `odoo-bin db init`
    Initdb(InitArgs),
    /// Drop a database with `odoo-bin db drop`
    Dropdb(DropArgs),
    /// Rename a database with `odoo-bin db rename`
    Renamedb(RenameArgs),
    /// Write the addon paths into odoo.conf and pyrightconfig.json
    Addon(AddonArgs),
    /// Start the Odoo server and stop it gracefully on Ctrl+C
    Start(StartArgs),
    /// Administer databases directly through PostgreSQL
    Pg(PgArgs),
}

/// Where to find `odoo-bin` and its configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct BinaryArgs {
    /// Path to the Odoo binary
    #[clap(short = 'b', long = "bin", value_name = "PATH")]
    pub bin: Option<PathBuf>,

    /// Odoo configuration file path (odoo.conf)
    #[clap(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ForceToggle {
    /// Overwrite the target database if it exists
    #[clap(short = 'f', long, overrides_with = "no_force")]
    force: bool,

    #[clap(long, overrides_with = "force")]
    no_force: bool,
}

impl ForceToggle {
    pub fn value(&self) -> Option<bool> {
        tri_state(self.force, self.no_force)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct NeutralizeToggle {
    /// Neutralize the database (disable crons and outgoing mail)
    #[clap(short = 'N', long, overrides_with = "no_neutralize")]
    neutralize: bool,

    #[clap(long, overrides_with = "neutralize")]
    no_neutralize: bool,
}

impl NeutralizeToggle {
    pub fn value(&self) -> Option<bool> {
        tri_state(self.neutralize, self.no_neutralize)
    }
}

/// `Some(true)` for `--flag`, `Some(false)` for `--no-flag`, `None` when
/// neither was passed. The two flags override each other, so at most one is set.
fn tri_state(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[derive(Args, Debug)]
pub struct ListdbArgs {
    #[clap(flatten)]
    pub connection: ConnectionArgs,

    /// Only list databases that contain an initialized Odoo schema
    #[clap(long)]
    pub initialized: bool,
}

#[derive(Args, Debug)]
pub struct BackupArgs {
    #[clap(flatten)]
    pub binary: BinaryArgs,

    /// Database name to back up
    #[clap(short = 'd', long = "database")]
    pub database: String,

    /// Directory to store the backup
    #[clap(short = 'D', long = "dump-path", value_name = "DIR")]
    pub dump_path: Option<PathBuf>,

    /// Backup file format (zip, dump)
    #[clap(short = 'f', long = "format")]
    pub format: Option<String>,

    /// Exclude the filestore from the backup
    #[clap(long)]
    pub no_filestore: bool,
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    #[clap(flatten)]
    pub binary: BinaryArgs,

    /// Name of the backed up database
    #[clap(short = 'd', long = "database")]
    pub database: String,

    /// Database to restore into (defaults to --database)
    #[clap(short = 'n', long = "new-db")]
    pub new_db: Option<String>,

    /// Directory holding the backup
    #[clap(short = 'D', long = "dump-path", value_name = "DIR")]
    pub dump_path: Option<PathBuf>,

    /// Explicit backup file, instead of the one derived from --database
    #[clap(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Restore the backup taken without filestore
    #[clap(long)]
    pub no_filestore: bool,

    #[clap(flatten)]
    pub force: ForceToggle,

    #[clap(flatten)]
    pub neutralize: NeutralizeToggle,
}

#[derive(Args, Debug)]
pub struct CopyArgs {
    #[clap(flatten)]
    pub binary: BinaryArgs,

    /// Source database
    #[clap(short = 'd', long = "database")]
    pub database: String,

    /// Name of the copy
    #[clap(short = 'n', long = "new-db")]
    pub new_db: String,

    #[clap(flatten)]
    pub force: ForceToggle,

    #[clap(flatten)]
    pub neutralize: NeutralizeToggle,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    #[clap(flatten)]
    pub binary: BinaryArgs,

    /// Database name to create
    #[clap(short = 'd', long = "database")]
    pub database: String,

    /// Load demo data
    #[clap(long, overrides_with = "without_demo")]
    with_demo: bool,

    /// Do not load demo data
    #[clap(long, overrides_with = "with_demo")]
    without_demo: bool,

    #[clap(flatten)]
    pub force: ForceToggle,

    /// Language code for the new database
    #[clap(long)]
    pub lang: Option<String>,

    /// Administrator username
    #[clap(long)]
    pub username: Option<String>,

    /// Administrator password
    #[clap(long)]
    pub password: Option<String>,

    /// Country code for localization
    #[clap(long)]
    pub country: Option<String>,
}

impl InitArgs {
    pub fn with_demo(&self) -> Option<bool> {
        tri_state(self.with_demo, self.without_demo)
    }
}

#[derive(Args, Debug)]
pub struct DropArgs {
    #[clap(flatten)]
    pub binary: BinaryArgs,

    /// Database name to drop
    #[clap(short = 'd', long = "database")]
    pub database: String,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    #[clap(flatten)]
    pub binary: BinaryArgs,

    /// Current database name
    #[clap(short = 'd', long = "database")]
    pub database: String,

    /// New database name
    #[clap(short = 'n', long = "new-db")]
    pub new_db: String,

    #[clap(flatten)]
    pub force: ForceToggle,
}

#[derive(Args, Debug)]
pub struct AddonArgs {
    /// Addon directories, comma separated (defaults to odoo.addons in the settings)
    #[clap(long, value_name = "PATHS", value_delimiter = ',')]
    pub addons: Vec<String>,

    /// Odoo configuration file path (odoo.conf)
    #[clap(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// pyright configuration to update (defaults to ./pyrightconfig.json)
    #[clap(long, value_name = "PATH")]
    pub pyright: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct StartArgs {
    #[clap(flatten)]
    pub binary: BinaryArgs,

    /// Extra arguments passed to odoo-bin after `--`
    #[clap(last = true)]
    pub extra: Vec<String>,
}

/// PostgreSQL connection parameters. Anything not given here is read from
/// the `db_*` keys of odoo.conf.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Odoo configuration file path (odoo.conf)
    #[clap(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[clap(long)]
    pub host: Option<String>,

    #[clap(long)]
    pub port: Option<u16>,

    #[clap(long)]
    pub user: Option<String>,

    #[clap(long)]
    pub password: Option<String>,

    /// disable, allow, prefer, require, verify-ca or verify-full
    #[clap(long = "sslmode", value_name = "MODE")]
    pub ssl_mode: Option<String>,
}

impl ConnectionArgs {
    pub fn overrides(&self) -> DbParams {
        DbParams {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct PgArgs {
    #[clap(flatten)]
    pub connection: ConnectionArgs,

    #[clap(subcommand)]
    pub action: PgAction,
}

#[derive(Subcommand, Debug)]
pub enum PgAction {
    /// Check that the server is reachable
    Ping,
    /// Report whether a database exists and is initialized
    Exists { name: String },
    /// Create an empty database, or a copy of --template
    Create {
        name: String,
        #[clap(long)]
        template: Option<String>,
    },
    /// Copy a database using it as a template
    Copy { source: String, target: String },
    /// Drop a database, terminating its connections first
    Drop { name: String },
    /// Rename a database, terminating its connections first
    Rename { old: String, new: String },
    /// List installed modules
    Modules { name: String },
    /// Disable crons, mail servers and external integrations
    Neutralize { name: String },
    /// Read or write ir_config_parameter
    #[clap(subcommand)]
    Param(ParamAction),
}

#[derive(Subcommand, Debug)]
pub enum ParamAction {
    Get { database: String, key: String },
    Set {
        database: String,
        key: String,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_toggles_default_to_unset() {
        match parse(&["ocli", "copydb", "-d", "prod", "-n", "staging"]).command {
            Command::Copydb(args) => {
                assert_eq!(args.force.value(), None);
                assert_eq!(args.neutralize.value(), None);
            }
            other => panic!("Expected Copydb, got {:?}", other),
        }
    }

    #[test]
    fn test_toggles_explicit_values() {
        match parse(&[
            "ocli",
            "restoredb",
            "-d",
            "prod",
            "--no-force",
            "-N",
        ])
        .command
        {
            Command::Restoredb(args) => {
                assert_eq!(args.force.value(), Some(false));
                assert_eq!(args.neutralize.value(), Some(true));
            }
            other => panic!("Expected Restoredb, got {:?}", other),
        }
    }

    #[test]
    fn test_last_toggle_wins() {
        match parse(&["ocli", "initdb", "-d", "x", "--with-demo", "--without-demo"]).command {
            Command::Initdb(args) => assert_eq!(args.with_demo(), Some(false)),
            other => panic!("Expected Initdb, got {:?}", other),
        }
    }

    #[test]
    fn test_database_is_required() {
        assert!(CliArgs::try_parse_from(["ocli", "dropdb"]).is_err());
    }

    #[test]
    fn test_addons_are_comma_separated() {
        match parse(&["ocli", "addon", "--addons", "/a,/b", "--addons", "/c"]).command {
            Command::Addon(args) => assert_eq!(args.addons, vec!["/a", "/b", "/c"]),
            other => panic!("Expected Addon, got {:?}", other),
        }
    }

    #[test]
    fn test_start_passes_trailing_args() {
        match parse(&["ocli", "start", "--", "--dev=all", "-u", "sale"]).command {
            Command::Start(args) => assert_eq!(args.extra, vec!["--dev=all", "-u", "sale"]),
            other => panic!("Expected Start, got {:?}", other),
        }
    }

    #[test]
    fn test_pg_connection_overrides() {
        let cli = parse(&[
            "ocli", "pg", "--host", "db", "--port", "5433", "rename", "old", "new",
        ]);
        match cli.command {
            Command::Pg(args) => {
                let overrides = args.connection.overrides();
                assert_eq!(overrides.host.as_deref(), Some("db"));
                assert_eq!(overrides.port, Some(5433));
                assert!(overrides.user.is_none());
                assert!(matches!(args.action, PgAction::Rename { .. }));
            }
            other => panic!("Expected Pg, got {:?}", other),
        }
    }
}
