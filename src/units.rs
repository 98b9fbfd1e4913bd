use derive_more::{Add, AddAssign, From, Into, Sub, SubAssign, Sum};
use std::fmt;
use std::ops::{Div, Mul, Neg};

/// A measurement in PDF points (1/72 of an inch). All page geometry in this
/// crate is expressed in points; the underlying `f32` is what gets written
/// into content streams.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, PartialOrd, Add, AddAssign, Sub, SubAssign, Sum, From,
    Into,
)]
pub struct Pt(pub f32);

impl Mul<f32> for Pt {
    type Output = Pt;

    fn mul(self, rhs: f32) -> Pt {
        Pt(self.0 * rhs)
    }
}

impl Div<f32> for Pt {
    type Output = Pt;

    fn div(self, rhs: f32) -> Pt {
        Pt(self.0 / rhs)
    }
}

impl Neg for Pt {
    type Output = Pt;

    fn neg(self) -> Pt {
        Pt(-self.0)
    }
}

impl fmt::Display for Pt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A measurement in inches, for speaking about page layout the way the
/// letter template does ("a 1.8 by 0.7 inch logo"). Convert to [Pt] before
/// doing geometry with it.
#[derive(Debug, Default, Copy, Clone, PartialEq, PartialOrd, From, Into)]
pub struct In(pub f32);

impl From<In> for Pt {
    fn from(value: In) -> Pt {
        Pt(value.0 * 72.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inches_convert_to_points() {
        let pt: Pt = In(8.5).into();
        assert_eq!(pt, Pt(612.0));
    }

    #[test]
    fn point_arithmetic_behaves() {
        let mut y = Pt(100.0);
        y -= Pt(15.0);
        assert_eq!(y, Pt(85.0));
        assert_eq!(Pt(10.0) * 2.0, Pt(20.0));
        assert!(Pt(50.0) < Pt(51.0));
    }
}
