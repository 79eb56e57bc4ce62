//! HTTP probes against the running services.

pub mod control;
pub mod egress;
pub mod public_ip;

pub use control::{probe_control_plane, ControlProbe, HttpControlProbe, ProbeError, ProbeResponse};
pub use egress::{EgressProber, EgressReport, Verdict};
pub use public_ip::PublicIpResolver;
