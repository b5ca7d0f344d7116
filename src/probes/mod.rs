//! Device and connectivity probes (spec §4.1).
//!
//! Both expose a single operation, `snapshot()`, and never throw to callers.
//! The [`crate::router::smart_router::SmartRouter`] caches results by
//! `cache_ttl`.

pub mod connectivity;
pub mod device;

pub use connectivity::{ConnectionType, ConnectivityProbe, ConnectivityStatus, StaticConnectivityProbe, SystemConnectivityProbe};
pub use device::{DeviceCapability, DeviceProbe, StaticDeviceProbe, SystemDeviceProbe};
