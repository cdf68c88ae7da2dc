// ocli Integration Layer - odoo-bin Database Commands
//
// Builds and runs `odoo-bin db -c <config> <subcommand> ...`. Argument
// vectors come from pure functions so they can be checked without the
// binary; OdooDb sends them through any CommandRunner.

use std::path::{Path, PathBuf};

use ocli_utils::backup::prepare_backup_path;

use super::adapter::CommandRunner;
use super::error::{ProcessError, ProcessResult};

/// Options for `db init`. Unset toggles are off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitOptions {
    pub with_demo: Option<bool>,
    pub force: Option<bool>,
    pub language: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub country: Option<String>,
}

impl InitOptions {
    pub fn with_demo(&self) -> bool {
        self.with_demo.unwrap_or(false)
    }

    pub fn force(&self) -> bool {
        self.force.unwrap_or(false)
    }
}

/// Options for `db load` and `db duplicate`. Both toggles default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub force: Option<bool>,
    pub neutralize: Option<bool>,
}

impl LoadOptions {
    pub fn force(&self) -> bool {
        self.force.unwrap_or(false)
    }

    pub fn neutralize(&self) -> bool {
        self.neutralize.unwrap_or(false)
    }
}

/// Options for `db rename`. Force defaults to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameOptions {
    pub force: Option<bool>,
}

impl RenameOptions {
    pub fn force(&self) -> bool {
        self.force.unwrap_or(false)
    }
}

fn check_name(name: &str) -> ProcessResult<()> {
    if name.is_empty() {
        return Err(ProcessError::InvalidArgument(
            "database name is required".to_string(),
        ));
    }
    if name.starts_with('-') {
        return Err(ProcessError::InvalidArgument(format!(
            "database name must not start with '-': {:?}",
            name
        )));
    }
    Ok(())
}

fn base_args(config: &Path, subcommand: &str) -> Vec<String> {
    vec![
        "db".to_string(),
        "-c".to_string(),
        config.display().to_string(),
        subcommand.to_string(),
    ]
}

fn push_flag(args: &mut Vec<String>, enabled: bool, flag: &str) {
    if enabled {
        args.push(flag.to_string());
    }
}

fn push_value(args: &mut Vec<String>, value: &Option<String>, flag: &str) {
    if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
        args.push(format!("{}={}", flag, value));
    }
}

pub fn init_args(config: &Path, db: &str, options: &InitOptions) -> ProcessResult<Vec<String>> {
    check_name(db)?;

    let mut args = base_args(config, "init");
    args.push(db.to_string());
    push_flag(&mut args, options.with_demo(), "--with-demo");
    push_flag(&mut args, options.force(), "--force");
    push_value(&mut args, &options.language, "--language");
    push_value(&mut args, &options.username, "--username");
    push_value(&mut args, &options.password, "--password");
    push_value(&mut args, &options.country, "--country");
    Ok(args)
}

pub fn dump_args(
    config: &Path,
    db: &str,
    file: &Path,
    no_filestore: bool,
) -> ProcessResult<Vec<String>> {
    check_name(db)?;

    let mut args = base_args(config, "dump");
    args.push(db.to_string());
    args.push(file.display().to_string());
    push_flag(&mut args, no_filestore, "--no-filestore");
    Ok(args)
}

pub fn load_args(
    config: &Path,
    db: &str,
    file: &Path,
    options: &LoadOptions,
) -> ProcessResult<Vec<String>> {
    check_name(db)?;

    let mut args = base_args(config, "load");
    args.push(db.to_string());
    args.push(file.display().to_string());
    push_flag(&mut args, options.force(), "--force");
    push_flag(&mut args, options.neutralize(), "--neutralize");
    Ok(args)
}

pub fn duplicate_args(
    config: &Path,
    source: &str,
    target: &str,
    options: &LoadOptions,
) -> ProcessResult<Vec<String>> {
    check_name(source)?;
    check_name(target)?;

    let mut args = base_args(config, "duplicate");
    args.push(source.to_string());
    args.push(target.to_string());
    push_flag(&mut args, options.force(), "--force");
    push_flag(&mut args, options.neutralize(), "--neutralize");
    Ok(args)
}

pub fn rename_args(
    config: &Path,
    source: &str,
    target: &str,
    options: &RenameOptions,
) -> ProcessResult<Vec<String>> {
    check_name(source)?;
    check_name(target)?;

    let mut args = base_args(config, "rename");
    args.push(source.to_string());
    args.push(target.to_string());
    push_flag(&mut args, options.force(), "--force");
    Ok(args)
}

pub fn drop_args(config: &Path, db: &str) -> ProcessResult<Vec<String>> {
    check_name(db)?;

    let mut args = base_args(config, "drop");
    args.push(db.to_string());
    Ok(args)
}

/// Database commands of one odoo-bin installation.
pub struct OdooDb<R: CommandRunner> {
    runner: R,
    config: PathBuf,
}

impl<R: CommandRunner> OdooDb<R> {
    pub fn new(runner: R, config: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            config: config.into(),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Create and initialize `db`. Returns the captured output.
    pub async fn init(&self, db: &str, options: &InitOptions) -> ProcessResult<String> {
        let args = init_args(&self.config, db, options)?;
        self.runner.capture(&args).await
    }

    /// Dump `db` into `dump_dir`, creating the directory when needed.
    /// Returns the artifact path.
    pub async fn dump(
        &self,
        db: &str,
        dump_dir: &Path,
        format: &str,
        no_filestore: bool,
    ) -> ProcessResult<PathBuf> {
        check_name(db)?;
        let file = prepare_backup_path(dump_dir, db, format, no_filestore).map_err(|e| {
            ProcessError::IoError(format!(
                "cannot create dump directory {}: {}",
                dump_dir.display(),
                e
            ))
        })?;
        let args = dump_args(&self.config, db, &file, no_filestore)?;
        self.runner.stream(&args).await?;
        Ok(file)
    }

    /// Restore `file` into `db`. The file must exist.
    pub async fn load(&self, db: &str, file: &Path, options: &LoadOptions) -> ProcessResult<()> {
        let args = load_args(&self.config, db, file, options)?;
        if !file.is_file() {
            return Err(ProcessError::InvalidArgument(format!(
                "backup file not found: {}",
                file.display()
            )));
        }
        self.runner.stream(&args).await
    }

    pub async fn duplicate(
        &self,
        source: &str,
        target: &str,
        options: &LoadOptions,
    ) -> ProcessResult<()> {
        let args = duplicate_args(&self.config, source, target, options)?;
        self.runner.stream(&args).await
    }

    pub async fn rename(
        &self,
        source: &str,
        target: &str,
        options: &RenameOptions,
    ) -> ProcessResult<()> {
        let args = rename_args(&self.config, source, target, options)?;
        self.runner.stream(&args).await
    }

    /// Drop `db`. Returns the captured output.
    pub async fn drop_db(&self, db: &str) -> ProcessResult<String> {
        let args = drop_args(&self.config, db)?;
        self.runner.capture(&args).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::{MockOutcome, MockRunner};
    use super::*;

    const CONF: &str = "/etc/odoo.conf";

    fn expected(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_init_toggles_off_by_default() {
        let args = init_args(Path::new(CONF), "demo", &InitOptions::default()).unwrap();
        assert_eq!(args, expected(&["db", "-c", CONF, "init", "demo"]));

        let options = InitOptions {
            with_demo: Some(true),
            force: Some(true),
            ..InitOptions::default()
        };
        let args = init_args(Path::new(CONF), "demo", &options).unwrap();
        assert_eq!(
            args,
            expected(&["db", "-c", CONF, "init", "demo", "--with-demo", "--force"])
        );
    }

    #[test]
    fn test_init_explicit_options() {
        let options = InitOptions {
            with_demo: Some(false),
            force: Some(false),
            language: Some("es_ES".to_string()),
            username: Some("admin".to_string()),
            password: Some(String::new()),
            country: Some("ES".to_string()),
        };
        let args = init_args(Path::new(CONF), "demo", &options).unwrap();
        assert_eq!(
            args,
            expected(&[
                "db",
                "-c",
                CONF,
                "init",
                "demo",
                "--language=es_ES",
                "--username=admin",
                "--country=ES",
            ])
        );
    }

    #[test]
    fn test_load_and_duplicate_toggles_off_by_default() {
        let options = LoadOptions::default();
        let args = load_args(Path::new(CONF), "prod", Path::new("/b/prod.zip"), &options).unwrap();
        assert_eq!(
            args,
            expected(&[
                "db",
                "-c",
                CONF,
                "load",
                "prod",
                "/b/prod.zip",
            ])
        );

        let args = duplicate_args(Path::new(CONF), "prod", "staging", &options).unwrap();
        assert_eq!(
            args,
            expected(&["db", "-c", CONF, "duplicate", "prod", "staging"])
        );

        let options = LoadOptions {
            force: Some(true),
            neutralize: None,
        };
        let args = duplicate_args(Path::new(CONF), "prod", "staging", &options).unwrap();
        assert_eq!(
            args,
            expected(&["db", "-c", CONF, "duplicate", "prod", "staging", "--force"])
        );

        let options = LoadOptions {
            force: Some(false),
            neutralize: Some(true),
        };
        let args = load_args(Path::new(CONF), "prod", Path::new("/b/prod.zip"), &options).unwrap();
        assert_eq!(args.last().map(String::as_str), Some("--neutralize"));
        assert!(!args.iter().any(|a| a == "--force"));
    }

    #[test]
    fn test_rename_force_off_by_default() {
        let args =
            rename_args(Path::new(CONF), "old", "new", &RenameOptions::default()).unwrap();
        assert_eq!(args, expected(&["db", "-c", CONF, "rename", "old", "new"]));

        let options = RenameOptions { force: Some(true) };
        let args = rename_args(Path::new(CONF), "old", "new", &options).unwrap();
        assert_eq!(args.last().map(String::as_str), Some("--force"));
    }

    #[test]
    fn test_dump_and_drop_args() {
        let args = dump_args(Path::new(CONF), "prod", Path::new("/b/prod_no_fs.zip"), true).unwrap();
        assert_eq!(
            args,
            expected(&[
                "db",
                "-c",
                CONF,
                "dump",
                "prod",
                "/b/prod_no_fs.zip",
                "--no-filestore",
            ])
        );

        let args = drop_args(Path::new(CONF), "prod").unwrap();
        assert_eq!(args, expected(&["db", "-c", CONF, "drop", "prod"]));
    }

    #[test]
    fn test_rejects_option_like_names() {
        for name in ["", "-rf", "--force"] {
            assert!(matches!(
                drop_args(Path::new(CONF), name),
                Err(ProcessError::InvalidArgument(_))
            ));
        }
        assert!(duplicate_args(Path::new(CONF), "prod", "-x", &LoadOptions::default()).is_err());
    }

    #[tokio::test]
    async fn test_init_and_drop_capture_output() {
        let db = OdooDb::new(MockRunner::new("odoo-bin"), CONF);

        db.init("demo", &InitOptions::default()).await.unwrap();
        db.drop_db("demo").await.unwrap();

        assert_eq!(db.runner().capture_count(), 2);
        assert_eq!(db.runner().stream_count(), 0);
        assert_eq!(db.runner().last_call(), expected(&["db", "-c", CONF, "drop", "demo"]));
    }

    #[tokio::test]
    async fn test_failure_carries_output() {
        let runner = MockRunner::new("odoo-bin");
        runner.set_outcome(MockOutcome::Exit {
            code: 1,
            output: "database does not exist".to_string(),
        });
        let db = OdooDb::new(runner, CONF);

        let err = db.drop_db("ghost").await.unwrap_err();
        assert!(err.to_string().contains("database does not exist"));
    }

    #[tokio::test]
    async fn test_dump_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dump_dir = tmp.path().join("nested").join("dbs");
        let db = OdooDb::new(MockRunner::new("odoo-bin"), CONF);

        let file = db.dump("prod", &dump_dir, "zip", false).await.unwrap();

        assert!(dump_dir.is_dir());
        assert_eq!(file, dump_dir.join("prod.zip"));
        assert_eq!(db.runner().stream_count(), 1);
    }

    #[tokio::test]
    async fn test_dump_directory_error_is_not_binary_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let db = OdooDb::new(MockRunner::new("odoo-bin"), CONF);

        let err = db
            .dump("prod", &blocker.join("dbs"), "zip", false)
            .await
            .unwrap_err();

        match err {
            ProcessError::IoError(message) => assert!(message.contains("dump directory")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(db.runner().calls().is_empty());
    }

    #[tokio::test]
    async fn test_load_requires_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let db = OdooDb::new(MockRunner::new("odoo-bin"), CONF);

        let missing = tmp.path().join("missing.zip");
        let result = db.load("prod", &missing, &LoadOptions::default()).await;
        assert!(matches!(result, Err(ProcessError::InvalidArgument(_))));
        assert!(db.runner().calls().is_empty());

        let present = tmp.path().join("prod.zip");
        std::fs::write(&present, b"PK").unwrap();
        db.load("prod", &present, &LoadOptions::default()).await.unwrap();
        assert_eq!(db.runner().stream_count(), 1);
    }
}
