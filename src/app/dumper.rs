use crate::app::connection::Connection;
use anyhow::{bail, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// Flags shared by both passes.
const COMMON_FLAGS: &[&str] = &[
    "--single-transaction",
    "--quick",
    "--lock-tables=false",
    "--max-allowed-packet=1G",
    "--net-buffer-length=1M",
    "--skip-comments",
    "--hex-blob",
    "--set-gtid-purged=OFF",
    "--column-statistics=0",
];

const STRUCTURE_FLAGS: &[&str] = &["--no-data", "--triggers", "--events"];

const DATA_FLAGS: &[&str] = &[
    "--no-create-info",
    "--skip-triggers",
    "--skip-routines",
    "--skip-events",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Structure,
    Data,
}

#[derive(Debug)]
pub struct DumpResult {
    pub output_file: PathBuf,
    pub duration: Duration,
    pub excluded_tables: Vec<String>,
    pub file_size: u64,
}

/// Writes schema for every table, then data for every table not in `exclude_tables`.
pub struct Dumper<'a> {
    conn: &'a Connection,
    exclude_tables: &'a [String],
}

impl<'a> Dumper<'a> {
    pub fn new(conn: &'a Connection, exclude_tables: &'a [String]) -> Self {
        Self {
            conn,
            exclude_tables,
        }
    }

    /// Full argument list for one `mysqldump` run.
    pub fn args(&self, pass: Pass) -> Vec<String> {
        let mut args = self.conn.client_args();
        args.extend(COMMON_FLAGS.iter().map(|f| f.to_string()));

        match pass {
            Pass::Structure => {
                args.extend(STRUCTURE_FLAGS.iter().map(|f| f.to_string()));
            }
            Pass::Data => {
                args.extend(DATA_FLAGS.iter().map(|f| f.to_string()));
                args.extend(
                    self.exclude_tables
                        .iter()
                        .map(|table| format!("--ignore-table={}.{}", self.conn.database, table)),
                );
            }
        }

        args.push(self.conn.database.clone());
        args
    }

    pub fn dump(&self, output_file: &Path) -> Result<DumpResult> {
        let started = Instant::now();

        let file = create_output(output_file)
            .with_context(|| format!("Failed to create output file {}", output_file.display()))?;
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);

        log::info!("Dumping structure for all tables");
        self.run_pass(Pass::Structure, &mut writer)
            .context("Failed to dump structure")?;

        log::info!(
            "Dumping data ({} tables skipped)",
            self.exclude_tables.len()
        );
        self.run_pass(Pass::Data, &mut writer)
            .context("Failed to dump data")?;

        let file = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .context("Failed to flush output file")?;
        let file_size = file
            .metadata()
            .context("Failed to read output file size")?
            .len();

        Ok(DumpResult {
            output_file: output_file.to_path_buf(),
            duration: started.elapsed(),
            excluded_tables: self.exclude_tables.to_vec(),
            file_size,
        })
    }

    fn run_pass<W: Write>(&self, pass: Pass, writer: &mut W) -> Result<()> {
        let mut command = Command::new("mysqldump");
        command
            .args(self.args(pass))
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        self.conn.apply_password(&mut command);

        let mut child = command.spawn().context("Failed to start mysqldump")?;
        let mut stdout = child
            .stdout
            .take()
            .context("mysqldump stdout was not captured")?;
        let copied = io::copy(&mut stdout, writer);
        // Close our end so a failed copy cannot leave the child blocked on a full pipe.
        drop(stdout);
        let status = child.wait().context("Failed to wait for mysqldump")?;
        let bytes = copied.context("Failed to write mysqldump output")?;

        if !status.success() {
            bail!(
                "mysqldump {:?} pass exited with code {}",
                pass,
                status.code().unwrap_or(-1)
            );
        }
        log::debug!("{:?} pass wrote {} bytes", pass, bytes);
        Ok(())
    }
}

/// Creates the dump file readable only by its owner.
fn create_output(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

/// Fails early with a clear message when `mysqldump` is not on PATH.
pub fn check_mysqldump() -> Result<()> {
    let status = Command::new("mysqldump")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("mysqldump is required but not found in PATH")?;
    if !status.success() {
        bail!("mysqldump is required but `mysqldump --version` failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        Connection {
            host: "127.0.0.1".to_string(),
            port: 3306,
            user: "app".to_string(),
            password: Some("secret".to_string()),
            database: "shop".to_string(),
        }
    }

    #[test]
    fn structure_pass_covers_all_tables() {
        let conn = conn();
        let excluded = vec!["audits".to_string()];
        let args = Dumper::new(&conn, &excluded).args(Pass::Structure);

        assert!(args.contains(&"--no-data".to_string()));
        assert!(args.contains(&"--triggers".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--ignore-table")));
        assert_eq!(args.last().map(String::as_str), Some("shop"));
    }

    #[test]
    fn data_pass_ignores_excluded_tables() {
        let conn = conn();
        let excluded = vec!["audits".to_string(), "telescope_entries".to_string()];
        let args = Dumper::new(&conn, &excluded).args(Pass::Data);

        assert!(args.contains(&"--no-create-info".to_string()));
        assert!(args.contains(&"--skip-triggers".to_string()));
        let ignored: Vec<&str> = args
            .iter()
            .filter(|a| a.starts_with("--ignore-table="))
            .map(String::as_str)
            .collect();
        assert_eq!(
            ignored,
            vec![
                "--ignore-table=shop.audits",
                "--ignore-table=shop.telescope_entries"
            ]
        );
        assert_eq!(args.last().map(String::as_str), Some("shop"));
    }

    #[test]
    fn ignore_table_keeps_backslashes_in_names() {
        let conn = conn();
        let excluded = vec!["odd\\name".to_string()];
        let args = Dumper::new(&conn, &excluded).args(Pass::Data);
        assert!(args.contains(&"--ignore-table=shop.odd\\name".to_string()));
    }

    #[test]
    fn password_is_not_an_argument() {
        let conn = conn();
        let excluded: Vec<String> = Vec::new();
        let dumper = Dumper::new(&conn, &excluded);
        for pass in [Pass::Structure, Pass::Data] {
            assert!(!dumper.args(pass).iter().any(|a| a.contains("secret")));
        }
    }

    #[cfg(unix)]
    #[test]
    fn output_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dump.sql");
        create_output(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
