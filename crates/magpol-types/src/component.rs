// ─────────────────────────────────────────────────────────────────────
// SCPN MagPol Core — Field Components
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Cartesian field components sampled by receivers.
//!
//! The axis-to-index mapping is fixed at compile time (x=0, y=1, z=2);
//! no runtime lookup table.

use crate::error::{MagError, MagResult};
use std::fmt;

/// A single Cartesian component of a vector field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    X,
    Y,
    Z,
}

impl Component {
    /// All components, in column order.
    pub const ALL: [Component; 3] = [Component::X, Component::Y, Component::Z];

    /// Column index of this component in an (n, 3) field array.
    pub fn index(self) -> usize {
        match self {
            Component::X => 0,
            Component::Y => 1,
            Component::Z => 2,
        }
    }

    /// Cartesian unit vector for this component.
    pub fn unit_vector(self) -> [f64; 3] {
        let mut e = [0.0; 3];
        e[self.index()] = 1.0;
        e
    }

    /// Parse a component label. Case-insensitive; anything other than
    /// "x", "y" or "z" is a hard error.
    pub fn parse(label: &str) -> MagResult<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Component::X),
            "y" => Ok(Component::Y),
            "z" => Ok(Component::Z),
            _ => Err(MagError::ConfigError(format!(
                "Components must be 'x', 'y' or 'z', not '{label}'"
            ))),
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::X => write!(f, "x"),
            Component::Y => write!(f, "y"),
            Component::Z => write!(f, "z"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_indices_fixed() {
        assert_eq!(Component::X.index(), 0);
        assert_eq!(Component::Y.index(), 1);
        assert_eq!(Component::Z.index(), 2);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(Component::parse("x").unwrap(), Component::X);
        assert_eq!(Component::parse("Y").unwrap(), Component::Y);
        assert_eq!(Component::parse(" z ").unwrap(), Component::Z);
    }

    #[test]
    fn test_parse_rejects_unknown_label() {
        assert!(Component::parse("w").is_err());
        assert!(Component::parse("").is_err());
        assert!(Component::parse("xy").is_err());
    }

    #[test]
    fn test_unit_vectors() {
        assert_eq!(Component::X.unit_vector(), [1.0, 0.0, 0.0]);
        assert_eq!(Component::Y.unit_vector(), [0.0, 1.0, 0.0]);
        assert_eq!(Component::Z.unit_vector(), [0.0, 0.0, 1.0]);
    }
}
