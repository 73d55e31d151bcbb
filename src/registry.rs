//! Tool registry — stores and retrieves tool definitions

use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use crate::config::LimitsConfig;

/// One registered tool with its configured admission limit.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub max_requests: u32,
    pub window_seconds: u64,
}

/// In-memory tool registry
pub struct Registry {
    tools: HashMap<String, ToolDefinition>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Build the registry of built-in tools with limits from configuration.
    pub fn with_limits(limits: &LimitsConfig) -> Self {
        let mut reg = Self::new();
        let window = limits.window_seconds;
        for (name, description, max_requests) in [
            (
                "ping",
                "TCP reachability test with per-attempt timing",
                limits.ping,
            ),
            (
                "dns_lookup",
                "Forward DNS lookup across common record types",
                limits.dns_lookup,
            ),
            (
                "port_scan",
                "TCP connect scan over a bounded port range",
                limits.port_scan,
            ),
            (
                "subnet_calculator",
                "IPv4 subnet arithmetic from an address and prefix or mask",
                limits.subnet_calculator,
            ),
            (
                "ssl_checker",
                "TLS certificate inspection, trust chain not required",
                limits.ssl_checker,
            ),
            (
                "mac_lookup",
                "Hardware vendor lookup for a MAC address",
                limits.mac_lookup,
            ),
            (
                "reverse_dns",
                "PTR lookup for an IP address",
                limits.reverse_dns,
            ),
            (
                "ip_geolocation",
                "Approximate location and ISP for an IP address",
                limits.ip_geolocation,
            ),
            ("whois", "Domain registration lookup", limits.whois),
            (
                "traceroute",
                "Route tracing (not supported on this build)",
                limits.traceroute,
            ),
        ] {
            reg.register_tool(make_tool(name, description, max_requests, window));
        }
        reg
    }

    /// Register a tool definition
    pub fn register_tool(&mut self, tool: ToolDefinition) {
        info!(
            "Registered tool: {} ({} req / {}s)",
            tool.name, tool.max_requests, tool.window_seconds
        );
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get a tool by name
    pub fn get_tool(&self, name: &str) -> Option<ToolDefinition> {
        self.tools.get(name).cloned()
    }

    /// List all tools, sorted by name
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        let mut tools: Vec<ToolDefinition> = self.tools.values().cloned().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Get total tool count
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}


/// Helper to create a ToolDefinition
pub fn make_tool(
    name: &str,
    description: &str,
    max_requests: u32,
    window_seconds: u64,
) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        max_requests,
        window_seconds,
    }
}
