use crate::app::models::ConnectionProfile;
use anyhow::{bail, Result};
use std::process::Command;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3306;

/// Connection parameters shared by the table inspector and the `mysqldump` invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
}

/// Values given on the command line, before profile and default fallbacks.
#[derive(Debug, Clone, Default)]
pub struct ConnectionArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl Connection {
    /// Flags win over the profile, the profile wins over built-in defaults.
    pub fn resolve(args: ConnectionArgs, profile: Option<&ConnectionProfile>) -> Result<Self> {
        let from_profile = |f: fn(&ConnectionProfile) -> Option<String>| profile.and_then(f);

        let user = args.user.or_else(|| from_profile(|p| p.user.clone()));
        let database = args.database.or_else(|| from_profile(|p| p.database.clone()));

        let Some(user) = user.filter(|u| !u.is_empty()) else {
            bail!("Database user is required (use -u or --user)");
        };
        let Some(database) = database.filter(|d| !d.is_empty()) else {
            bail!("Database name is required (use -d or --database)");
        };

        Ok(Self {
            host: args
                .host
                .or_else(|| from_profile(|p| p.host.clone()))
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: args
                .port
                .or_else(|| profile.and_then(|p| p.port))
                .unwrap_or(DEFAULT_PORT),
            user,
            password: args
                .password
                .or_else(|| from_profile(|p| p.password.clone()))
                .filter(|p| !p.is_empty()),
            database,
        })
    }

    /// Host, port and user flags. The password is never passed as an argument.
    pub fn client_args(&self) -> Vec<String> {
        vec![
            "-h".to_string(),
            self.host.clone(),
            "-P".to_string(),
            self.port.to_string(),
            "-u".to_string(),
            self.user.clone(),
        ]
    }

    /// Exports the password to the child through `MYSQL_PWD`.
    pub fn apply_password(&self, command: &mut Command) {
        if let Some(password) = &self.password {
            command.env("MYSQL_PWD", password);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ConnectionProfile {
        ConnectionProfile {
            name: "staging".to_string(),
            host: Some("db.internal".to_string()),
            port: Some(3307),
            user: Some("app".to_string()),
            password: Some("secret".to_string()),
            database: Some("shop".to_string()),
        }
    }

    #[test]
    fn flags_override_profile() {
        let args = ConnectionArgs {
            host: Some("10.0.0.5".to_string()),
            user: Some("root".to_string()),
            ..Default::default()
        };
        let conn = Connection::resolve(args, Some(&profile())).unwrap();
        assert_eq!(conn.host, "10.0.0.5");
        assert_eq!(conn.user, "root");
        assert_eq!(conn.port, 3307);
        assert_eq!(conn.database, "shop");
        assert_eq!(conn.password.as_deref(), Some("secret"));
    }

    #[test]
    fn defaults_fill_host_and_port() {
        let args = ConnectionArgs {
            user: Some("root".to_string()),
            database: Some("shop".to_string()),
            ..Default::default()
        };
        let conn = Connection::resolve(args, None).unwrap();
        assert_eq!(conn.host, DEFAULT_HOST);
        assert_eq!(conn.port, DEFAULT_PORT);
        assert_eq!(conn.password, None);
    }

    #[test]
    fn user_and_database_are_required() {
        let missing_user = ConnectionArgs {
            database: Some("shop".to_string()),
            ..Default::default()
        };
        let err = Connection::resolve(missing_user, None).unwrap_err();
        assert!(err.to_string().contains("user"));

        let missing_db = ConnectionArgs {
            user: Some("root".to_string()),
            ..Default::default()
        };
        let err = Connection::resolve(missing_db, None).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn client_args_never_contain_password() {
        let conn = Connection::resolve(ConnectionArgs::default(), Some(&profile())).unwrap();
        let args = conn.client_args();
        assert_eq!(args, vec!["-h", "db.internal", "-P", "3307", "-u", "app"]);
        assert!(!args.iter().any(|a| a.contains("secret")));
    }
}
