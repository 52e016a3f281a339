//! Coordinate transformations (`TRn` cards, `TRCL` and fill transforms)

// external crates
use nalgebra::Matrix3;
use serde::Serialize;

// crate modules
use crate::diagnostic::Span;

/// A rigid body transformation
///
/// Built from either a `TRn`/`*TRn` data card or an inline transform on a
/// cell. The entries are kept exactly as written:
///
/// | Entries | Meaning                                            |
/// | ------- | -------------------------------------------------- |
/// | 1-3     | displacement vector `o1 o2 o3`                     |
/// | 4-12    | rotation matrix `xx' yx' zx' xy' yy' zy' xz' ...`  |
/// | 13      | `m`, 1 (default) or -1 for the origin convention   |
///
/// For the starred forms the rotation entries are angles in degrees rather
/// than direction cosines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transform {
    /// Transform number, 0 for inline transforms
    pub number: u32,
    /// Displacement vector
    pub translation: [f64; 3],
    /// Rotation entries, row major, as written in the deck
    pub rotation: Option<[f64; 9]>,
    /// Rotation entries are angles in degrees (`*TR`, `*TRCL`, `*FILL`)
    pub degrees: bool,
    /// Origin convention flag `m`
    pub origin: i32,
    /// Originating lines
    pub span: Span,
}

impl Transform {
    /// Valid entry counts for a transform
    pub const VALID_LENGTHS: [usize; 3] = [3, 12, 13];

    /// Build a transform from its list of entries
    ///
    /// Only 3, 12 or 13 entries are accepted. Returns `None` for any other
    /// count, or if the `m` flag is not 1 or -1.
    ///
    /// ```rust
    /// # use mcnptools_deck::Transform;
    /// let t = Transform::from_values(1, &[0.0, 0.0, 5.0], false).unwrap();
    /// assert_eq!(t.translation, [0.0, 0.0, 5.0]);
    /// assert!(t.rotation.is_none());
    ///
    /// assert!(Transform::from_values(1, &[0.0, 0.0], false).is_none());
    ///
    /// let mut values = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, -1.0];
    /// assert_eq!(Transform::from_values(1, &values, false).unwrap().origin, -1);
    /// values[12] = 2.0;
    /// assert!(Transform::from_values(1, &values, false).is_none());
    /// ```
    pub fn from_values(number: u32, values: &[f64], degrees: bool) -> Option<Self> {
        if !Self::VALID_LENGTHS.contains(&values.len()) {
            return None;
        }

        let rotation = match values.len() {
            3 => None,
            _ => {
                let mut r = [0.0; 9];
                r.copy_from_slice(&values[3..12]);
                Some(r)
            }
        };

        let origin = match values.get(12) {
            Some(m) if *m == 1.0 => 1,
            Some(m) if *m == -1.0 => -1,
            Some(_) => return None,
            None => 1,
        };

        Some(Self {
            number,
            translation: [values[0], values[1], values[2]],
            rotation,
            degrees,
            origin,
            span: Span::default(),
        })
    }

    /// Rotation matrix as direction cosines
    ///
    /// Angles from the starred forms are converted with `cos(angle)`.
    ///
    /// ```rust
    /// # use mcnptools_deck::Transform;
    /// let values = [0.0, 0.0, 0.0, 0.0, 90.0, 90.0, 90.0, 0.0, 90.0, 90.0, 90.0, 0.0];
    /// let t = Transform::from_values(2, &values, true).unwrap();
    /// let m = t.rotation_matrix().unwrap();
    ///
    /// assert!((m[(0, 0)] - 1.0).abs() < 1e-12);
    /// assert!(m[(0, 1)].abs() < 1e-12);
    /// ```
    pub fn rotation_matrix(&self) -> Option<Matrix3<f64>> {
        let entries = self.rotation?;
        let cosines = entries.map(|v| match self.degrees {
            true => v.to_radians().cos(),
            false => v,
        });
        Some(Matrix3::from_row_slice(&cosines))
    }
}

/// Transform attached to a cell, either by number or written inline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TransformSpec {
    /// Reference to a `TRn` card
    Reference(u32),
    /// Entries written in parentheses on the cell card
    Inline { values: Vec<f64>, degrees: bool },
}

impl TransformSpec {
    /// Referenced transform number, if any
    pub fn reference(&self) -> Option<u32> {
        match self {
            Self::Reference(n) => Some(*n),
            Self::Inline { .. } => None,
        }
    }

    /// Inline transform as a full [Transform], if valid
    pub fn to_transform(&self) -> Option<Transform> {
        match self {
            Self::Reference(_) => None,
            Self::Inline { values, degrees } => Transform::from_values(0, values, *degrees),
        }
    }
}
