//! Magnetic polarizability forward operator and linear inversion.
//!
//! Sources excite a set of polarizable cells; receivers sample the
//! induced dipole fields; the inversion recovers per-cell polarizability
//! from observed data via damped normal equations.

pub mod inversion;
pub mod line_current;
pub mod mapping;
pub mod receiver;
pub mod simulation;
pub mod source;
pub mod survey;
