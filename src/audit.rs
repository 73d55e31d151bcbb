//! Usage recording — per-request log of tool executions in SQLite

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::IpAddr;
use tracing::info;

use crate::executor::ProbeReport;

/// Per-tool aggregates over the statistics window.
#[derive(Debug, Serialize)]
pub struct ToolStats {
    pub total_requests: u64,
    pub unique_ips: u64,
}

/// Usage log stored in SQLite
pub struct UsageLog {
    conn: Connection,
}

impl UsageLog {
    pub fn new(db_path: &str) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS usage_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tool_name TEXT NOT NULL,
                user_ip TEXT NOT NULL,
                parameters TEXT,
                result TEXT,
                execution_time_ms INTEGER,
                status TEXT NOT NULL DEFAULT 'success',
                error_message TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_usage_tool ON usage_logs(tool_name);
            CREATE INDEX IF NOT EXISTS idx_usage_ip ON usage_logs(user_ip);
            CREATE INDEX IF NOT EXISTS idx_usage_status ON usage_logs(status);
            CREATE INDEX IF NOT EXISTS idx_usage_time ON usage_logs(created_at);
            CREATE INDEX IF NOT EXISTS idx_usage_tool_time ON usage_logs(tool_name, created_at);",
        )?;

        Ok(Self { conn })
    }

    /// Record one execution. Best effort: storage failures are logged,
    /// never returned to the caller.
    pub fn record(
        &self,
        tool_name: &str,
        user_ip: IpAddr,
        parameters: &Value,
        report: &ProbeReport,
    ) {
        let created_at = chrono::Utc::now().to_rfc3339();
        let status = if report.success { "success" } else { "error" };
        let result = serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string());

        let outcome = self.conn.execute(
            "INSERT INTO usage_logs (tool_name, user_ip, parameters, result, execution_time_ms, status, error_message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                tool_name,
                user_ip.to_string(),
                parameters.to_string(),
                result,
                report.execution_time_ms as i64,
                status,
                report.error.as_deref(),
                created_at,
            ],
        );

        match outcome {
            Ok(_) => {
                info!(
                    "Usage: tool={tool_name} ip={user_ip} status={status} duration={}ms",
                    report.execution_time_ms
                );
            }
            Err(e) => {
                tracing::error!("Failed to record usage: {e}");
            }
        }
    }

    /// Per-tool request and distinct-caller counts over the last 24 hours.
    pub fn statistics(&self) -> Result<BTreeMap<String, ToolStats>> {
        let since = (chrono::Utc::now() - chrono::Duration::hours(24)).to_rfc3339();
        let mut stmt = self.conn.prepare(
            "SELECT tool_name, COUNT(*), COUNT(DISTINCT user_ip)
             FROM usage_logs WHERE created_at >= ?1 GROUP BY tool_name",
        )?;

        let rows = stmt.query_map([&since], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut stats = BTreeMap::new();
        for row in rows {
            let (tool_name, total, unique) = row?;
            stats.insert(
                tool_name,
                ToolStats {
                    total_requests: total as u64,
                    unique_ips: unique as u64,
                },
            );
        }
        Ok(stats)
    }
}
