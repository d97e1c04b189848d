//! Reduced-size MySQL/MariaDB dumps: full schema, data only for tables that are not excluded.
pub mod app;
