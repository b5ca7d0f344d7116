//! Connectivity probe.

use std::net::TcpStream;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable connectivity snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityStatus {
    pub is_available: bool,
    pub connection_type: ConnectionType,
    pub latency_ms: f64,
    pub bandwidth_mbps: f64,
    pub last_check: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    Wifi,
    Ethernet,
    Cellular,
    Unknown,
}

impl ConnectivityStatus {
    /// Conservative fallback: offline, infinite latency.
    pub fn conservative_default() -> Self {
        Self {
            is_available: false,
            connection_type: ConnectionType::Unknown,
            latency_ms: f64::INFINITY,
            bandwidth_mbps: 0.0,
            last_check: Utc::now(),
        }
    }
}

pub trait ConnectivityProbe: Send + Sync {
    fn snapshot(&self) -> ConnectivityStatus;
}

/// Real probe: attempts a TCP connect to a well-known DNS resolver on port
/// 53 with a 2-second deadline. On failure, falls back to "offline". On
/// success but without a real bandwidth measurement available, defaults to
/// a conservative estimate (50ms/100mbps), matching the original's
/// speedtest-unavailable fallback.
pub struct SystemConnectivityProbe {
    pub probe_addr: &'static str,
    pub timeout: Duration,
}

impl Default for SystemConnectivityProbe {
    fn default() -> Self {
        Self {
            probe_addr: "8.8.8.8:53",
            timeout: Duration::from_secs(2),
        }
    }
}

impl ConnectivityProbe for SystemConnectivityProbe {
    fn snapshot(&self) -> ConnectivityStatus {
        let start = Instant::now();
        let connected = TcpStream::connect_timeout(
            &self.probe_addr.parse().expect("probe_addr is a valid socket address"),
            self.timeout,
        )
        .is_ok();

        if !connected {
            return ConnectivityStatus::conservative_default();
        }

        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        ConnectivityStatus {
            is_available: true,
            connection_type: ConnectionType::Unknown,
            latency_ms,
            bandwidth_mbps: 100.0,
            last_check: Utc::now(),
        }
    }
}

/// Fixed snapshot for deterministic tests.
pub struct StaticConnectivityProbe(pub ConnectivityStatus);

impl ConnectivityProbe for StaticConnectivityProbe {
    fn snapshot(&self) -> ConnectivityStatus {
        self.0
    }
}
