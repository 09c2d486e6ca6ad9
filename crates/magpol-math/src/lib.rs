//! Mathematical primitives for SCPN MagPol Core.

pub mod linalg;
