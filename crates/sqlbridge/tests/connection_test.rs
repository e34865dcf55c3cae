//! Integration tests for connection configuration and factory dispatch

use sqlbridge::connection::{connection_for, BackendKind, CommitMode};
use sqlbridge::error::ErrorCategory;

#[test]
fn test_factory_rejects_empty_name() {
    let err = connection_for("").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("name required"));
}

#[test]
fn test_factory_rejects_unmatched_name() {
    for name in ["postgres", "mssql", "mongodb"] {
        let err = connection_for(name).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains(name));
    }
}

#[test]
fn test_commit_mode_parsing() {
    for (input, expected) in [
        ("default", CommitMode::Default),
        ("DEFAULT", CommitMode::Default),
        ("deferred", CommitMode::Deferred),
        ("Immediate", CommitMode::Immediate),
        ("EXCLUSIVE", CommitMode::Exclusive),
    ] {
        assert_eq!(input.parse::<CommitMode>().unwrap(), expected);
    }

    let err = "serializable".parse::<CommitMode>().unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use sqlbridge::connection::Connection;
    use sqlbridge::sqlite::SqliteConnection;

    #[test]
    fn test_factory_returns_sqlite_variant() {
        for name in ["sqlite", "SQLite", "SQLITE", "app-sqlite-store"] {
            let conn = connection_for(name).unwrap();
            assert_eq!(conn.kind(), BackendKind::Sqlite);
            assert!(conn.into_sqlite().is_some());
        }
    }

    #[test]
    fn test_open_requires_path() {
        let err = SqliteConnection::new().open().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("path"));
    }

    #[test]
    fn test_path_round_trip() {
        let mut conn = SqliteConnection::new();
        assert_eq!(conn.path(), None);
        conn.set_path(Some(":memory:".into()));
        assert_eq!(conn.path(), Some(":memory:"));
        conn.set_path(None);
        assert_eq!(conn.path(), None);
    }

    #[test]
    fn test_open_in_memory() {
        let handle = SqliteConnection::new().with_path(":memory:").open().unwrap();
        assert_eq!(handle.commit_mode(), CommitMode::Default);
    }

    #[test]
    fn test_commit_mode_reaches_handle() {
        let handle = SqliteConnection::new()
            .with_path(":memory:")
            .with_commit_mode(CommitMode::Exclusive)
            .open()
            .unwrap();
        assert_eq!(handle.commit_mode(), CommitMode::Exclusive);
    }

    #[test]
    fn test_quote_fn_doubles_quotes() {
        let quote = SqliteConnection::new().quote_fn();
        assert_eq!(quote("O'Reilly"), "O''Reilly");
    }

    #[test]
    fn test_exception_kind_names_driver_error() {
        assert_eq!(SqliteConnection::new().exception_kind(), "rusqlite::Error");
    }
}

#[cfg(feature = "mysql")]
mod mysql {
    use super::*;
    use sqlbridge::connection::Connection;
    use sqlbridge::mysql::MySqlConnection;

    #[test]
    fn test_factory_returns_mysql_variant() {
        for name in ["mysql", "MySQL", "prod-MYSQL"] {
            let conn = connection_for(name).unwrap();
            assert_eq!(conn.kind(), BackendKind::MySql);
            assert!(conn.into_mysql().is_some());
        }
    }

    #[test]
    fn test_open_names_the_missing_field() {
        let err = MySqlConnection::new().open().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("host"));

        let err = MySqlConnection::new()
            .with_host("localhost")
            .with_user("test")
            .with_password("test")
            .open()
            .unwrap_err();
        assert!(err.to_string().contains("database"));
    }

    #[test]
    fn test_credential_round_trip() {
        let mut conn = MySqlConnection::new();
        conn.set_user(Some("y47test".into()));
        assert_eq!(conn.user(), Some("y47test"));
        conn.set_user(None);
        assert_eq!(conn.user(), None);
    }
}

#[cfg(feature = "oracle")]
mod oracle {
    use super::*;
    use sqlbridge::connection::Connection;
    use sqlbridge::oracle::OracleConnection;

    #[test]
    fn test_factory_returns_oracle_variant() {
        for name in ["oracle", "Oracle", "ORACLE-xe"] {
            let conn = connection_for(name).unwrap();
            assert_eq!(conn.kind(), BackendKind::Oracle);
            assert!(conn.into_oracle().is_some());
        }
    }

    #[test]
    fn test_dsn_format() {
        let conn = OracleConnection::new()
            .with_host("127.0.0.1")
            .with_user("y47test")
            .with_password("y47test")
            .with_sid("XE");
        assert_eq!(conn.dsn().unwrap(), "y47test/y47test@127.0.0.1/XE");
    }

    #[test]
    fn test_open_names_the_missing_field() {
        let err = OracleConnection::new()
            .with_host("127.0.0.1")
            .with_user("test")
            .with_password("test")
            .open()
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("sid"));
    }
}

#[cfg(all(feature = "mysql", feature = "oracle"))]
#[test]
fn test_factory_order_prefers_mysql() {
    // Substring checks run mysql, oracle, sqlite in fixed order.
    let conn = connection_for("mysql-to-oracle-sync").unwrap();
    assert_eq!(conn.kind(), BackendKind::MySql);
}
