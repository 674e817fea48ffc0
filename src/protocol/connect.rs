//! Attachment parameters.
//!
//! `ConnectParams` gathers what a caller knows about the database it wants
//! and turns it into a database parameter block. Client identification
//! (OS user, host name, process) is added the way `isql` and the other
//! Firebird tools report themselves in `MON$ATTACHMENTS`.

use crate::protocol::constants::SQL_DIALECT_CURRENT;
use crate::protocol::param_block::make_dpb;
use bytes::Bytes;
use std::time::Duration;

/// Environment variable holding the database path or connection string.
pub const ENV_DATABASE: &str = "FIREBIRD_DATABASE";
/// Environment variable holding the login name.
pub const ENV_USER: &str = "FIREBIRD_USER";
/// Environment variable holding the password.
pub const ENV_PASSWORD: &str = "FIREBIRD_PASSWORD";
/// Environment variable holding the SQL role.
pub const ENV_ROLE: &str = "FIREBIRD_ROLE";

/// Connection parameters.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// Database path or connection string, e.g. `localhost:/data/employee.fdb`.
    pub database: String,
    /// Login name.
    pub user: Option<String>,
    /// Login password.
    pub password: Option<String>,
    /// SQL role.
    pub role: Option<String>,
    /// Client SQL dialect.
    pub dialect: u16,
    /// Connect timeout, sent in whole seconds.
    pub connect_timeout: Option<Duration>,
    /// Session time zone.
    pub session_time_zone: Option<String>,
    /// Report OS user, host name and process to the server.
    pub identify_client: bool,
}

impl ConnectParams {
    /// Create parameters for `database` with dialect 3 and no credentials.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            user: None,
            password: None,
            role: None,
            dialect: SQL_DIALECT_CURRENT,
            connect_timeout: None,
            session_time_zone: None,
            identify_client: true,
        }
    }

    /// Read parameters from `FIREBIRD_DATABASE`, `FIREBIRD_USER`,
    /// `FIREBIRD_PASSWORD` and `FIREBIRD_ROLE`.
    ///
    /// Returns `None` when no database is configured.
    pub fn from_env() -> Option<Self> {
        let database = std::env::var(ENV_DATABASE).ok().filter(|s| !s.is_empty())?;
        let mut params = Self::new(database);
        params.user = std::env::var(ENV_USER).ok();
        params.password = std::env::var(ENV_PASSWORD).ok();
        params.role = std::env::var(ENV_ROLE).ok();
        Some(params)
    }

    /// Set login name and password.
    ///
    /// # Example
    ///
    /// ```
    /// use fbclient_rs::ConnectParams;
    /// use std::time::Duration;
    ///
    /// let params = ConnectParams::new("localhost:employee")
    ///     .with_credentials("SYSDBA", "masterkey")
    ///     .with_connect_timeout(Duration::from_secs(5));
    /// assert_eq!(params.user.as_deref(), Some("SYSDBA"));
    /// ```
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Set the SQL role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the client SQL dialect.
    pub fn with_dialect(mut self, dialect: u16) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the session time zone.
    pub fn with_session_time_zone(mut self, zone: impl Into<String>) -> Self {
        self.session_time_zone = Some(zone.into());
        self
    }

    /// Do not report OS user, host name and process.
    pub fn anonymous(mut self) -> Self {
        self.identify_client = false;
        self
    }

    /// Encode the parameters as a DPB.
    pub fn to_dpb(&self) -> Bytes {
        let client = self.identify_client.then(ClientInfo::gather);
        make_dpb(|dpb| {
            if let Some(user) = &self.user {
                dpb.user_name(user);
            }
            if let Some(password) = &self.password {
                dpb.password(password);
            }
            if let Some(role) = &self.role {
                dpb.sql_role_name(role);
            }
            dpb.sql_dialect(self.dialect as u32);
            if let Some(timeout) = self.connect_timeout {
                dpb.connect_timeout(timeout.as_secs().min(i32::MAX as u64) as i32);
            }
            if let Some(zone) = &self.session_time_zone {
                dpb.session_time_zone(zone);
            }
            if let Some(client) = &client {
                dpb.os_user(&client.os_user);
                dpb.host_name(&client.host_name);
                dpb.process_name(&client.process_name);
                dpb.process_id(client.process_id);
            }
        })
    }
}

/// Identity of this process as reported to the server.
#[derive(Debug, Clone)]
struct ClientInfo {
    os_user: String,
    host_name: String,
    process_name: String,
    process_id: i32,
}

impl ClientInfo {
    fn gather() -> Self {
        let host_name = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "localhost".to_string());
        let process_name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
        Self {
            os_user: whoami::username(),
            host_name,
            process_name,
            process_id: std::process::id() as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::{
        ISC_DPB_CONNECT_TIMEOUT, ISC_DPB_LC_CTYPE, ISC_DPB_OS_USER, ISC_DPB_PASSWORD,
        ISC_DPB_SQL_DIALECT, ISC_DPB_USER_NAME, ISC_DPB_UTF8_FILENAME, ISC_DPB_VERSION1,
    };

    #[test]
    fn test_defaults() {
        let params = ConnectParams::new("employee");
        assert_eq!(params.database, "employee");
        assert_eq!(params.dialect, 3);
        assert!(params.user.is_none());
        assert!(params.identify_client);
    }

    #[test]
    fn test_anonymous_dpb_layout() {
        let dpb = ConnectParams::new("employee")
            .with_credentials("SYSDBA", "masterkey")
            .with_connect_timeout(Duration::from_secs(5))
            .anonymous()
            .to_dpb();
        let mut expected = vec![ISC_DPB_VERSION1, ISC_DPB_UTF8_FILENAME, 0];
        expected.extend_from_slice(&[ISC_DPB_USER_NAME, 6]);
        expected.extend_from_slice(b"SYSDBA");
        expected.extend_from_slice(&[ISC_DPB_PASSWORD, 9]);
        expected.extend_from_slice(b"masterkey");
        expected.extend_from_slice(&[ISC_DPB_SQL_DIALECT, 1, 3]);
        expected.extend_from_slice(&[ISC_DPB_CONNECT_TIMEOUT, 1, 5]);
        expected.extend_from_slice(&[ISC_DPB_LC_CTYPE, 5]);
        expected.extend_from_slice(b"UTF-8");
        assert_eq!(dpb.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_client_identification() {
        let dpb = ConnectParams::new("employee").to_dpb();
        let user = whoami::username();
        let needle: Vec<u8> = [&[ISC_DPB_OS_USER, user.len() as u8][..], user.as_bytes()].concat();
        assert!(dpb.windows(needle.len()).any(|w| w == needle.as_slice()));
    }

    #[test]
    fn test_builder_chain() {
        let params = ConnectParams::new("db")
            .with_role("RDB$ADMIN")
            .with_dialect(1)
            .with_session_time_zone("Europe/Paris");
        assert_eq!(params.role.as_deref(), Some("RDB$ADMIN"));
        assert_eq!(params.dialect, 1);
        assert_eq!(params.session_time_zone.as_deref(), Some("Europe/Paris"));
    }
}
