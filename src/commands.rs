//! Command handlers. Each one resolves its inputs from the command line
//! first and the settings file second, runs, and reports one status line.

use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use anyhow::{bail, Context, Result};
use log::warn;

use ocli_server::integrations::{
    InitOptions, LoadOptions, OdooDb, RenameOptions, RunnerConfig, SubprocessManager,
};
use ocli_server::postgres::{PgAdmin, PgConfig};
use ocli_server::supervisor::{ServerOutcome, ServerSupervisor};
use ocli_utils::backup::backup_file_path;
use ocli_utils::cli::{
    AddonArgs, BackupArgs, BinaryArgs, CliArgs, Command, ConnectionArgs, CopyArgs, DropArgs,
    InitArgs, ListdbArgs, ParamAction, PgAction, PgArgs, RenameArgs, RestoreArgs, StartArgs,
};
use ocli_utils::notification::Notification;
use ocli_utils::odoo_conf::{update_addons_path, DbParams};
use ocli_utils::pyright::{clean_paths, update_extra_paths, PYRIGHT_CONFIG_FILE};
use ocli_utils::{ConfigError, Settings};

/// Writes status lines to stdout.
pub struct Printer {
    colored: bool,
}

impl Printer {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn show(&self, notification: Notification) {
        println!("{}", notification.render(self.colored));
    }
}

pub async fn run(args: CliArgs, out: &Printer) -> Result<()> {
    let settings = match args.command {
        Command::Init => return init(&args.settings, out),
        _ => Settings::load(&args.settings)
            .with_context(|| format!("failed to load {}", args.settings.display()))?,
    };

    match args.command {
        Command::Init => Ok(()),
        Command::Listdb(cmd) => listdb(&settings, cmd, out).await,
        Command::Backupdb(cmd) => backupdb(&settings, cmd, out).await,
        Command::Restoredb(cmd) => restoredb(&settings, cmd, out).await,
        Command::Copydb(cmd) => copydb(&settings, cmd, out).await,
        Command::Initdb(cmd) => initdb(&settings, cmd, out).await,
        Command::Dropdb(cmd) => dropdb(&settings, cmd, out).await,
        Command::Renamedb(cmd) => renamedb(&settings, cmd, out).await,
        Command::Addon(cmd) => addon(&settings, cmd, out),
        Command::Start(cmd) => start(&settings, cmd, out).await,
        Command::Pg(cmd) => pg(&settings, cmd, out).await,
    }
}

fn init(path: &Path, out: &Printer) -> Result<()> {
    Settings::write_template(path).context("failed to create settings file")?;
    out.show(Notification::success(format!(
        "Successfully created {}",
        path.display()
    )));
    Ok(())
}

fn config_file(settings: &Settings, config: &Option<PathBuf>) -> PathBuf {
    config
        .clone()
        .unwrap_or_else(|| settings.odoo.config_file.clone())
}

fn odoo_db(settings: &Settings, binary: &BinaryArgs) -> OdooDb<SubprocessManager> {
    let bin = binary
        .bin
        .clone()
        .unwrap_or_else(|| settings.odoo.odoo_bin.clone());
    let runner = SubprocessManager::new(
        &bin.to_string_lossy(),
        RunnerConfig {
            shutdown_timeout: settings.odoo.shutdown_timeout,
            ..Default::default()
        },
    );
    OdooDb::new(runner, config_file(settings, &binary.config))
}

/// Connection parameters from odoo.conf with command-line values on top.
/// A missing odoo.conf is only a warning; an unreadable or malformed one is
/// an error.
fn pg_config(settings: &Settings, connection: &ConnectionArgs) -> Result<PgConfig> {
    let path = config_file(settings, &connection.config);
    let from_file = match DbParams::load(&path) {
        Ok(params) => params,
        Err(e) if is_not_found(&e) => {
            warn!("{}", e);
            DbParams::default()
        }
        Err(e) => return Err(e).context("cannot read the PostgreSQL connection parameters"),
    };
    let params = from_file
        .merge(connection.overrides())
        .require(&path)
        .context("cannot resolve the PostgreSQL connection")?;

    Ok(PgConfig::from_parts(
        params,
        &settings.postgres,
        connection.ssl_mode.clone(),
    ))
}

fn is_not_found(err: &ConfigError) -> bool {
    matches!(err, ConfigError::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
}

async fn connect(settings: &Settings, connection: &ConnectionArgs) -> Result<PgAdmin> {
    let config = pg_config(settings, connection)?;
    PgAdmin::connect(config)
        .await
        .context("failed to connect to PostgreSQL")
}

async fn listdb(settings: &Settings, cmd: ListdbArgs, out: &Printer) -> Result<()> {
    let admin = connect(settings, &cmd.connection).await?;
    let result = print_databases(&admin, cmd.initialized, out).await;
    admin.close().await;
    result
}

async fn print_databases(admin: &PgAdmin, initialized: bool, out: &Printer) -> Result<()> {
    let databases = if initialized {
        admin.list_initialized_databases().await
    } else {
        admin.list_databases().await
    }
    .context("failed to list databases")?;

    out.show(Notification::info(format!(
        "Found {} database(s)",
        databases.len()
    )));
    for name in &databases {
        let size = admin
            .database_size(name)
            .await
            .with_context(|| format!("failed to get size of {}", name))?;
        println!("  - {} ({})", name, size);
    }
    Ok(())
}

async fn backupdb(settings: &Settings, cmd: BackupArgs, out: &Printer) -> Result<()> {
    let db = odoo_db(settings, &cmd.binary);
    let dump_path = cmd
        .dump_path
        .unwrap_or_else(|| settings.db.dump_path.clone());
    let format = cmd
        .format
        .unwrap_or_else(|| settings.db.dump_format.clone());

    out.show(Notification::info(format!(
        "Backing up database {}",
        cmd.database
    )));
    let file = db
        .dump(&cmd.database, &dump_path, &format, cmd.no_filestore)
        .await
        .with_context(|| format!("backup of {} failed", cmd.database))?;

    out.show(Notification::success(format!(
        "Backup completed: {}",
        file.display()
    )));
    Ok(())
}

async fn restoredb(settings: &Settings, cmd: RestoreArgs, out: &Printer) -> Result<()> {
    let db = odoo_db(settings, &cmd.binary);
    let target = cmd.new_db.clone().unwrap_or_else(|| cmd.database.clone());
    let file = match cmd.file {
        Some(file) => file,
        None => {
            let dump_path = cmd
                .dump_path
                .unwrap_or_else(|| settings.db.dump_path.clone());
            backup_file_path(
                &dump_path,
                &cmd.database,
                &settings.db.dump_format,
                cmd.no_filestore,
            )
        }
    };
    let options = LoadOptions {
        force: cmd.force.value(),
        neutralize: cmd.neutralize.value(),
    };

    out.show(Notification::info(format!(
        "Restoring {} from {}",
        target,
        file.display()
    )));
    db.load(&target, &file, &options)
        .await
        .with_context(|| format!("restore of {} failed", target))?;

    out.show(Notification::success(format!("Restore completed: {}", target)));
    Ok(())
}

async fn copydb(settings: &Settings, cmd: CopyArgs, out: &Printer) -> Result<()> {
    let db = odoo_db(settings, &cmd.binary);
    let options = LoadOptions {
        force: cmd.force.value(),
        neutralize: cmd.neutralize.value(),
    };

    db.duplicate(&cmd.database, &cmd.new_db, &options)
        .await
        .with_context(|| format!("copy of {} to {} failed", cmd.database, cmd.new_db))?;

    out.show(Notification::success(format!(
        "Database {} copied to {}",
        cmd.database, cmd.new_db
    )));
    Ok(())
}

async fn initdb(settings: &Settings, cmd: InitArgs, out: &Printer) -> Result<()> {
    let db = odoo_db(settings, &cmd.binary);
    let options = InitOptions {
        with_demo: cmd.with_demo(),
        force: cmd.force.value(),
        language: cmd.lang.clone(),
        username: cmd.username.clone(),
        password: cmd.password.clone(),
        country: cmd.country.clone(),
    };

    db.init(&cmd.database, &options)
        .await
        .with_context(|| format!("init of {} failed", cmd.database))?;

    out.show(Notification::success(format!(
        "Database init completed: {}",
        cmd.database
    )));
    Ok(())
}

async fn dropdb(settings: &Settings, cmd: DropArgs, out: &Printer) -> Result<()> {
    let db = odoo_db(settings, &cmd.binary);

    db.drop_db(&cmd.database)
        .await
        .with_context(|| format!("drop of {} failed", cmd.database))?;

    out.show(Notification::success(format!(
        "Database {} dropped",
        cmd.database
    )));
    Ok(())
}

async fn renamedb(settings: &Settings, cmd: RenameArgs, out: &Printer) -> Result<()> {
    let db = odoo_db(settings, &cmd.binary);
    let options = RenameOptions {
        force: cmd.force.value(),
    };

    db.rename(&cmd.database, &cmd.new_db, &options)
        .await
        .with_context(|| format!("rename of {} to {} failed", cmd.database, cmd.new_db))?;

    out.show(Notification::success(format!(
        "Database {} renamed to {}",
        cmd.database, cmd.new_db
    )));
    Ok(())
}

fn addon(settings: &Settings, cmd: AddonArgs, out: &Printer) -> Result<()> {
    let requested = if cmd.addons.is_empty() {
        settings.odoo.addons.clone()
    } else {
        cmd.addons
    };
    let addons = clean_paths(&requested);
    if addons.is_empty() {
        bail!("no addon paths given; pass --addons or set odoo.addons in the settings file");
    }

    let config = config_file(settings, &cmd.config);
    update_addons_path(&config, &addons)
        .with_context(|| format!("failed to update {}", config.display()))?;
    out.show(Notification::success(format!(
        "Updated addons_path in {}",
        config.display()
    )));

    let pyright = match cmd.pyright {
        Some(path) => path,
        None => {
            let default = PathBuf::from(PYRIGHT_CONFIG_FILE);
            if !default.exists() {
                out.show(Notification::warning(format!(
                    "No {} in the current directory, skipping",
                    PYRIGHT_CONFIG_FILE
                )));
                return Ok(());
            }
            default
        }
    };
    update_extra_paths(&pyright, &addons)
        .with_context(|| format!("failed to update {}", pyright.display()))?;

    out.show(Notification::success(format!(
        "Updated extraPaths in {} ({} path(s))",
        pyright.display(),
        addons.len()
    )));
    Ok(())
}

async fn start(settings: &Settings, cmd: StartArgs, out: &Printer) -> Result<()> {
    let bin = cmd
        .binary
        .bin
        .clone()
        .unwrap_or_else(|| settings.odoo.odoo_bin.clone());
    let config = config_file(settings, &cmd.binary.config);

    let mut args = vec!["-c".to_string(), config.display().to_string()];
    args.extend(cmd.extra);

    let mut supervisor =
        ServerSupervisor::new(&bin.to_string_lossy(), args, settings.odoo.shutdown_timeout);
    out.show(Notification::info("Starting Odoo, press Ctrl+C to stop"));
    let outcome = supervisor.run().await.context("failed to run Odoo")?;

    report_outcome(&outcome, out)
}

fn describe(status: ExitStatus) -> String {
    match (status.code(), status.signal()) {
        (Some(code), _) => format!("code {}", code),
        (None, Some(signal)) => format!("signal {}", signal),
        (None, None) => "unknown status".to_string(),
    }
}

fn report_outcome(outcome: &ServerOutcome, out: &Printer) -> Result<()> {
    match outcome.trigger {
        None if outcome.status.success() => {
            out.show(Notification::success("Odoo finished successfully"));
            Ok(())
        }
        None => bail!("Odoo exited with {}", describe(outcome.status)),
        Some(trigger) if outcome.forced => {
            out.show(Notification::warning(format!(
                "Received {}; shutdown timeout exceeded, Odoo was killed",
                trigger
            )));
            Ok(())
        }
        Some(trigger) => {
            out.show(Notification::success(format!(
                "Received {}; Odoo shut down gracefully",
                trigger
            )));
            Ok(())
        }
    }
}

async fn pg(settings: &Settings, cmd: PgArgs, out: &Printer) -> Result<()> {
    let admin = connect(settings, &cmd.connection).await?;
    let result = pg_action(&admin, cmd.action, out).await;
    admin.close().await;
    result
}

async fn pg_action(admin: &PgAdmin, action: PgAction, out: &Printer) -> Result<()> {
    match action {
        PgAction::Ping => {
            admin.ping().await.context("ping failed")?;
            let config = admin.config();
            out.show(Notification::success(format!(
                "PostgreSQL at {}:{} is reachable",
                config.host, config.port
            )));
        }
        PgAction::Exists { name } => {
            if !admin.database_exists(&name).await? {
                out.show(Notification::warning(format!("Database {} does not exist", name)));
            } else if admin.is_initialized(&name).await? {
                out.show(Notification::success(format!(
                    "Database {} exists and is initialized",
                    name
                )));
            } else {
                out.show(Notification::info(format!(
                    "Database {} exists but is not initialized",
                    name
                )));
            }
        }
        PgAction::Create { name, template } => {
            let created = match &template {
                Some(template) => admin.create_database_from_template(&name, template).await,
                None => admin.create_database(&name).await,
            };
            created.with_context(|| format!("failed to create {}", name))?;
            out.show(Notification::success(format!("Database {} created", name)));
        }
        PgAction::Copy { source, target } => {
            admin
                .copy_database(&source, &target)
                .await
                .with_context(|| format!("failed to copy {} to {}", source, target))?;
            out.show(Notification::success(format!(
                "Database {} copied to {}",
                source, target
            )));
        }
        PgAction::Drop { name } => {
            admin
                .drop_database(&name)
                .await
                .with_context(|| format!("failed to drop {}", name))?;
            out.show(Notification::success(format!("Database {} dropped", name)));
        }
        PgAction::Rename { old, new } => {
            admin
                .rename_database(&old, &new)
                .await
                .with_context(|| format!("failed to rename {} to {}", old, new))?;
            out.show(Notification::success(format!(
                "Database {} renamed to {}",
                old, new
            )));
        }
        PgAction::Modules { name } => {
            let modules = admin
                .installed_modules(&name)
                .await
                .with_context(|| format!("failed to list modules of {}", name))?;
            out.show(Notification::info(format!(
                "{} installed module(s) in {}",
                modules.len(),
                name
            )));
            for module in modules {
                println!("  - {}", module);
            }
        }
        PgAction::Neutralize { name } => {
            admin
                .neutralize(&name)
                .await
                .with_context(|| format!("failed to neutralize {}", name))?;
            out.show(Notification::success(format!("Database {} neutralized", name)));
        }
        PgAction::Param(ParamAction::Get { database, key }) => {
            match admin.get_config_parameter(&database, &key).await? {
                Some(value) => println!("{}", value),
                None => out.show(Notification::warning(format!(
                    "{} is not set in {}",
                    key, database
                ))),
            }
        }
        PgAction::Param(ParamAction::Set {
            database,
            key,
            value,
        }) => {
            admin
                .set_config_parameter(&database, &key, &value)
                .await
                .with_context(|| format!("failed to set {} in {}", key, database))?;
            out.show(Notification::success(format!("{} set in {}", key, database)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn settings_with_conf(conf: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.odoo.config_file = conf.to_path_buf();
        settings
    }

    #[test]
    fn test_pg_config_merges_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let conf = tmp.path().join("odoo.conf");
        fs::write(
            &conf,
            "[options]\ndb_host = db\ndb_port = 5432\ndb_user = odoo\ndb_password = odoo\n",
        )
        .unwrap();

        let connection = ConnectionArgs {
            port: Some(6543),
            ssl_mode: Some("require".to_string()),
            ..Default::default()
        };
        let config = pg_config(&settings_with_conf(&conf), &connection).unwrap();

        assert_eq!(config.host, "db");
        assert_eq!(config.port, 6543);
        assert_eq!(config.ssl_mode, "require");
        assert_eq!(config.max_open_conns, 25);
    }

    #[test]
    fn test_pg_config_without_conf_needs_every_flag() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = settings_with_conf(&tmp.path().join("missing.conf"));

        let partial = ConnectionArgs {
            host: Some("localhost".to_string()),
            ..Default::default()
        };
        let err = pg_config(&settings, &partial).unwrap_err();
        assert!(format!("{:#}", err).contains("db_port"));

        let full = ConnectionArgs {
            host: Some("localhost".to_string()),
            port: Some(5432),
            user: Some("odoo".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(pg_config(&settings, &full).is_ok());
    }

    #[test]
    fn test_pg_config_rejects_malformed_conf() {
        let tmp = tempfile::tempdir().unwrap();
        let conf = tmp.path().join("odoo.conf");
        fs::write(&conf, "[options]\ndb_host = db\ndb_port = not_a_number\n").unwrap();

        let full = ConnectionArgs {
            host: Some("localhost".to_string()),
            port: Some(5432),
            user: Some("odoo".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        };
        let err = pg_config(&settings_with_conf(&conf), &full).unwrap_err();
        assert!(format!("{:#}", err).contains("db_port"));
    }

    #[test]
    fn test_addon_updates_config_and_pyright() {
        let tmp = tempfile::tempdir().unwrap();
        let conf = tmp.path().join("odoo.conf");
        let pyright = tmp.path().join(PYRIGHT_CONFIG_FILE);
        fs::write(&conf, "[options]\naddons_path = /old\n").unwrap();
        fs::write(&pyright, "{\"typeCheckingMode\": \"basic\"}").unwrap();

        let cmd = AddonArgs {
            addons: vec!["/a, /b".to_string(), "".to_string()],
            config: Some(conf.clone()),
            pyright: Some(pyright.clone()),
        };
        addon(&Settings::default(), cmd, &Printer::new(false)).unwrap();

        assert_eq!(
            fs::read_to_string(&conf).unwrap(),
            "[options]\naddons_path = /a,/b\n"
        );
        assert!(fs::read_to_string(&pyright)
            .unwrap()
            .contains("\"extraPaths\": [\n        \"/a\",\n        \"/b\"\n    ]"));
    }

    #[test]
    fn test_addon_requires_paths() {
        let cmd = AddonArgs {
            addons: Vec::new(),
            config: None,
            pyright: None,
        };
        assert!(addon(&Settings::default(), cmd, &Printer::new(false)).is_err());
    }

    #[test]
    fn test_init_refuses_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ocli.yml");
        let out = Printer::new(false);

        init(&path, &out).unwrap();
        assert!(Settings::load(&path).is_ok());
        assert!(init(&path, &out).is_err());
    }

    #[test]
    fn test_describe_status() {
        assert_eq!(describe(ExitStatus::from_raw(3 << 8)), "code 3");
        assert_eq!(describe(ExitStatus::from_raw(9)), "signal 9");
    }
}
