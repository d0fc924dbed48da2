use pgdeck_core::{DbRecord, RecordRef};
use serde_json::json;

pub fn record_ref(db_id: impl Into<String>) -> RecordRef {
    RecordRef::new(db_id)
}

/// Minimal instance record with the fields the dialog itself interprets.
pub fn db_record(db_id: &str, host: &str, port: u16) -> DbRecord {
    serde_json::from_value(json!({
        "db_id": db_id,
        "host": host,
        "port": port,
    }))
    .expect("static record fixture")
}

/// Record shaped like a full fetch-service response.
pub fn full_db_record(db_id: &str, host: &str, port: u16) -> DbRecord {
    serde_json::from_value(json!({
        "db_id": db_id,
        "cluster_id": 1,
        "db_state": 0,
        "host": host,
        "repl_ip": host,
        "port": port,
        "is_primary": 1,
        "instance_name": format!("pg-{db_id}"),
        "db_type": 1,
        "os_user": "postgres",
        "pg_bin_path": "/usr/pgsql/bin",
        "db_user": "postgres",
        "repl_user": "replica",
        "version": "14.2",
    }))
    .expect("static record fixture")
}
