//! Scalar traits and small shared types
use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};

/// Floating point type of mode matrices, coefficients and velocity fields
pub trait FloatNum:
    Float
    + FromPrimitive
    + ndarray::ScalarOperand
    + ndarray::LinalgScalar
    + std::ops::AddAssign
    + Debug
    + Display
    + Send
    + Sync
    + 'static
{
}

impl<T> FloatNum for T where
    T: Float
        + FromPrimitive
        + ndarray::ScalarOperand
        + ndarray::LinalgScalar
        + std::ops::AddAssign
        + Debug
        + Display
        + Send
        + Sync
        + 'static
{
}

/// Velocity component, in the order they are stacked in a mode matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// Streamwise velocity
    U,
    /// Wall-normal velocity
    V,
    /// Spanwise velocity
    W,
}

impl Component {
    /// Components present in data with `num_components` velocity components
    pub fn all(num_components: usize) -> &'static [Component] {
        const ALL: [Component; 3] = [Component::U, Component::V, Component::W];
        &ALL[..num_components.min(3)]
    }

    /// Position of the component block in a mode matrix
    pub fn index(self) -> usize {
        match self {
            Component::U => 0,
            Component::V => 1,
            Component::W => 2,
        }
    }
}

impl Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Component::U => "U",
            Component::V => "V",
            Component::W => "W",
        };
        write!(f, "{}", name)
    }
}

/// Cast usize/f64 literals into the working float type.
///
/// Only used for small constants which are always representable.
pub(crate) fn cast<A: FloatNum>(x: f64) -> A {
    A::from_f64(x).unwrap_or_else(A::nan)
}
