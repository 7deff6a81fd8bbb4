//! # Fitting a synthetic vortex to a vector field
//!
//! The objective compares an observed (U, V) field with the field of a
//! parametric hairpin vortex model. The model itself is supplied by the
//! caller through [`FieldGenerator`].
//!
//! # Example
//! ```
//! use ndarray::{Array1, Array2};
//! use rustpod::fit::{residual, FieldGenerator};
//! use rustpod::Result;
//!
//! /// Uniform flow (params[0], params[1])
//! struct Uniform;
//!
//! impl FieldGenerator<f64> for Uniform {
//!     fn generate(
//!         &self,
//!         _half_width: usize,
//!         params: &Array1<f64>,
//!         x: &Array2<f64>,
//!         _y: &Array2<f64>,
//!     ) -> Result<(Array2<f64>, Array2<f64>)> {
//!         Ok((
//!             Array2::from_elem(x.raw_dim(), params[0]),
//!             Array2::from_elem(x.raw_dim(), params[1]),
//!         ))
//!     }
//! }
//!
//! let x = Array2::<f64>::zeros((3, 3));
//! let u = Array2::from_elem((3, 3), 1.0);
//! let v = Array2::from_elem((3, 3), 2.0);
//! let params = Array1::from(vec![1.0, 2.0]);
//! assert_eq!(residual(&Uniform, &params, &u, &v, &x, &x).unwrap(), 0.0);
//! ```
use crate::error::{PodError, Result};
use crate::types::FloatNum;
use ndarray::prelude::*;
use ndarray::{Data, Zip};

/// Number of leading parameters which must be non-negative
pub const NUM_POSITIVE_PARAMS: usize = 8;

/// Synthetic velocity field of a parametric vortex model
pub trait FieldGenerator<A> {
    /// Return (U, V) of the model on the grid (x, y).
    ///
    /// `half_width` is `(n - 1) / 2` for an observed field of size n x n.
    ///
    /// # Errors
    /// Implementation defined, propagated unchanged by the objective.
    fn generate(
        &self,
        half_width: usize,
        params: &Array1<A>,
        x: &Array2<A>,
        y: &Array2<A>,
    ) -> Result<(Array2<A>, Array2<A>)>;
}

impl<A, F> FieldGenerator<A> for F
where
    F: Fn(usize, &Array1<A>, &Array2<A>, &Array2<A>) -> Result<(Array2<A>, Array2<A>)>,
{
    fn generate(
        &self,
        half_width: usize,
        params: &Array1<A>,
        x: &Array2<A>,
        y: &Array2<A>,
    ) -> Result<(Array2<A>, Array2<A>)> {
        self(half_width, params, x, y)
    }
}

/// Lower and upper limits of the model parameters
#[derive(Debug, Clone, Default)]
pub struct ParamBounds<A> {
    /// Lower limit of every parameter
    pub lower: Vec<A>,
    /// Upper limit of every parameter
    pub upper: Vec<A>,
}

impl<A> ParamBounds<A> {
    /// Return bounds
    pub fn new(lower: Vec<A>, upper: Vec<A>) -> Self {
        Self { lower, upper }
    }
}

/// Sum of squared differences between observed and modelled field
/// $$
/// r = \sum (U - U_m)^2 + (V - V_m)^2
/// $$
///
/// # Errors
/// `Shape` when `u` is not square (or empty), when `u`, `v`, `x` and `y`
/// differ in shape, or when the generator returns fields of another shape.
/// Errors of the generator are passed through.
pub fn residual<A, G, S1, S2>(
    generator: &G,
    params: &Array1<A>,
    u: &ArrayBase<S1, Ix2>,
    v: &ArrayBase<S2, Ix2>,
    x: &Array2<A>,
    y: &Array2<A>,
) -> Result<A>
where
    A: FloatNum,
    G: FieldGenerator<A> + ?Sized,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
{
    if !u.is_square() || u.is_empty() {
        return Err(PodError::shape(format!(
            "data must be a non-empty square matrix, got {:?}",
            u.shape()
        )));
    }
    if u.shape() != v.shape() {
        return Err(PodError::shape(format!(
            "U and V fields must be the same size, got {:?} and {:?}",
            u.shape(),
            v.shape()
        )));
    }
    if x.shape() != u.shape() || y.shape() != u.shape() {
        return Err(PodError::shape(format!(
            "coordinates {:?} / {:?} do not match field {:?}",
            x.shape(),
            y.shape(),
            u.shape()
        )));
    }
    let half_width = (u.nrows() - 1) / 2;
    let (um, vm) = generator.generate(half_width, params, x, y)?;
    if um.shape() != u.shape() || vm.shape() != u.shape() {
        return Err(PodError::shape(format!(
            "model field {:?} / {:?} does not match field {:?}",
            um.shape(),
            vm.shape(),
            u.shape()
        )));
    }
    Ok(Zip::from(u)
        .and(v)
        .and(&um)
        .and(&vm)
        .fold(A::zero(), |acc, &a, &b, &am, &bm| {
            acc + (a - am) * (a - am) + (b - bm) * (b - bm)
        }))
}

/// Uniform prior, the bounds are not evaluated yet
pub fn log_prior<A: FloatNum>(_params: &Array1<A>, _bounds: &ParamBounds<A>) -> A {
    A::zero()
}

/// Log posterior of the vortex model, `log_prior - residual`.
///
/// The first [`NUM_POSITIVE_PARAMS`] parameters enter with their absolute
/// value. `params` itself is left untouched.
///
/// # Errors
/// Same as [`residual`]
pub fn log_posterior<A, G, S1, S2>(
    generator: &G,
    params: &Array1<A>,
    u: &ArrayBase<S1, Ix2>,
    v: &ArrayBase<S2, Ix2>,
    x: &Array2<A>,
    y: &Array2<A>,
    bounds: &ParamBounds<A>,
) -> Result<A>
where
    A: FloatNum,
    G: FieldGenerator<A> + ?Sized,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
{
    let mut params = params.to_owned();
    let n = params.len().min(NUM_POSITIVE_PARAMS);
    params.slice_mut(s![..n]).mapv_inplace(|p| p.abs());
    Ok(log_prior(&params, bounds) - residual(generator, &params, u, v, x, y)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::cell::RefCell;

    /// Solid body rotation with angular velocity params[0], offset params[9]
    fn rotation(
        _half_width: usize,
        params: &Array1<f64>,
        x: &Array2<f64>,
        y: &Array2<f64>,
    ) -> Result<(Array2<f64>, Array2<f64>)> {
        let u = y.mapv(|yi| -params[0] * yi + params[9]);
        let v = x.mapv(|xi| params[0] * xi);
        Ok((u, v))
    }

    fn grid(n: usize) -> (Array2<f64>, Array2<f64>) {
        let mut x = Array2::<f64>::zeros((n, n));
        let mut y = Array2::<f64>::zeros((n, n));
        for ((i, j), v) in x.indexed_iter_mut() {
            *v = j as f64 - 2.;
            y[[i, j]] = i as f64 - 2.;
        }
        (x, y)
    }

    #[test]
    fn test_residual_zero_for_exact_model() {
        let (x, y) = grid(5);
        let params = Array1::from(vec![1.0; 10]);
        let (u, v) = rotation(2, &params, &x, &y).unwrap();
        assert_eq!(residual(&rotation, &params, &u, &v, &x, &y).unwrap(), 0.);
    }

    #[test]
    fn test_residual_value() {
        let (x, y) = grid(5);
        let params = Array1::from(vec![1.0; 10]);
        let (u, v) = rotation(2, &params, &x, &y).unwrap();
        let u = u + 0.5;
        // 25 points, 0.25 each
        assert_abs_diff_eq!(
            residual(&rotation, &params, &u, &v, &x, &y).unwrap(),
            6.25,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_half_width() {
        let seen = RefCell::new(None);
        let gen = |hw: usize,
                   _p: &Array1<f64>,
                   x: &Array2<f64>,
                   _y: &Array2<f64>|
         -> Result<(Array2<f64>, Array2<f64>)> {
            *seen.borrow_mut() = Some(hw);
            Ok((x.clone(), x.clone()))
        };
        let (x, y) = grid(6);
        let params = Array1::from(vec![0.0; 10]);
        residual(&gen, &params, &x, &x, &x, &y).unwrap();
        assert_eq!(*seen.borrow(), Some(2));
    }

    #[test]
    fn test_residual_shape_errors() {
        let params = Array1::from(vec![1.0; 10]);
        let (x, y) = grid(5);
        let u = Array2::<f64>::zeros((5, 5));
        let v = Array2::<f64>::zeros((5, 4));
        assert!(matches!(
            residual(&rotation, &params, &u, &v, &x, &y),
            Err(PodError::Shape(_))
        ));
        let u = Array2::<f64>::zeros((5, 4));
        assert!(matches!(
            residual(&rotation, &params, &u, &u, &x, &y),
            Err(PodError::Shape(_))
        ));
    }

    #[test]
    fn test_log_posterior_does_not_mutate_params() {
        let (x, y) = grid(5);
        let params = Array1::from(vec![-1.0; 10]);
        let positive = params.mapv(f64::abs);
        let (u, v) = rotation(2, &positive, &x, &y).unwrap();
        let bounds = ParamBounds::default();
        let lp = log_posterior(&rotation, &params, &u, &v, &x, &y, &bounds).unwrap();
        // entry 9 keeps its sign, so the offset differs by 2 everywhere
        assert_abs_diff_eq!(lp, -100., epsilon = 1e-12);
        assert!(params.iter().all(|p| *p == -1.0));
    }

    #[test]
    fn test_log_posterior_short_params() {
        let gen = |_hw: usize,
                   p: &Array1<f64>,
                   x: &Array2<f64>,
                   _y: &Array2<f64>|
         -> Result<(Array2<f64>, Array2<f64>)> {
            Ok((x.mapv(|_| p[0]), x.mapv(|_| p[1])))
        };
        let (x, y) = grid(3);
        let u = Array2::from_elem((3, 3), 1.0);
        let v = Array2::from_elem((3, 3), 2.0);
        let params = Array1::from(vec![-1.0, -2.0]);
        let lp = log_posterior(&gen, &params, &u, &v, &x, &y, &ParamBounds::default()).unwrap();
        assert_eq!(lp, 0.);
        assert_eq!(log_prior(&params, &ParamBounds::new(vec![0.; 2], vec![1.; 2])), 0.);
    }
}
