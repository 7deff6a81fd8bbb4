//! # Mode fields
//!
//! A POD solver returns its spatial modes as one matrix of shape
//! `(num_components * rows * cols, num_modes)`, where the velocity
//! components are stacked on top of each other (U, then V, then W).
//! This module un-flattens such a matrix into one field of shape
//! `(rows, cols, num_modes)` per component.
//!
//! # Example
//! ```
//! use ndarray::Array2;
//! use rustpod::modes::reconstruct;
//! let modes = Array2::<f64>::zeros((2 * 4 * 5, 3));
//! let fields = reconstruct(&modes, (4, 5), 3, 2).unwrap();
//! assert_eq!(fields.len(), 2);
//! assert_eq!(fields[1].shape(), &[4, 5, 3]);
//! ```
use crate::error::{PodError, Result};
use crate::types::{Component, FloatNum};
use ndarray::prelude::*;
use ndarray::Data;

/// Reshape a stacked mode matrix into one mode field per velocity component.
///
/// Row block `c` (of size `rows * cols`) holds component `c`. Each of its
/// first `num_modes` columns is reshaped row-major into `(rows, cols)` and
/// stored at `field[.., .., mode]`.
///
/// # Errors
/// - `Domain`: `num_components` not in {1, 2, 3}, empty field shape,
///   or `num_modes` is zero or exceeds the number of columns
/// - `Shape`: row count differs from `num_components * rows * cols`
pub fn reconstruct<A, S>(
    modes: &ArrayBase<S, Ix2>,
    field_shape: (usize, usize),
    num_modes: usize,
    num_components: usize,
) -> Result<Vec<Array3<A>>>
where
    A: Clone,
    S: Data<Elem = A>,
{
    if !(1..=3).contains(&num_components) {
        return Err(PodError::domain(format!(
            "number of velocity components must be 1, 2 or 3, got {}",
            num_components
        )));
    }
    let (rows, cols) = field_shape;
    if rows == 0 || cols == 0 {
        return Err(PodError::domain(format!(
            "field shape must be non-empty, got {:?}",
            field_shape
        )));
    }
    let block = rows * cols;
    if modes.nrows() != num_components * block {
        return Err(PodError::shape(format!(
            "mode matrix has {} rows, expected {} components x {} x {} = {}",
            modes.nrows(),
            num_components,
            rows,
            cols,
            num_components * block
        )));
    }
    if num_modes == 0 || num_modes > modes.ncols() {
        return Err(PodError::domain(format!(
            "requested {} modes, but only {} were calculated",
            num_modes,
            modes.ncols()
        )));
    }

    let mut fields = Vec::with_capacity(num_components);
    for c in 0..num_components {
        let data = modes.slice(s![c * block..(c + 1) * block, ..num_modes]);
        fields.push(reshape_block(&data, rows, cols)?);
    }
    log::debug!(
        "reconstructed {} component(s) of shape {:?}",
        num_components,
        fields[0].shape()
    );
    Ok(fields)
}

/// (rows*cols, m) -> (rows, cols, m), independent of the memory order of `data`
fn reshape_block<A: Clone>(data: &ArrayView2<A>, rows: usize, cols: usize) -> Result<Array3<A>> {
    let num_modes = data.ncols();
    Array3::from_shape_vec((rows, cols, num_modes), data.iter().cloned().collect())
        .map_err(|e| PodError::shape(e.to_string()))
}

/// Single component/mode slice prepared for a colour-mapped plot
#[derive(Debug, Clone)]
pub struct ModePanel<A> {
    /// Velocity component
    pub component: Component,
    /// Mode index (zero based)
    pub mode: usize,
    /// Mode field of shape (rows, cols)
    pub field: Array2<A>,
    /// Symmetric colour limit, the colour range is `[-clim, clim]`
    pub clim: A,
}

/// Collection of mode fields, one per velocity component
#[derive(Debug, Clone)]
pub struct ModeFields<A> {
    fields: Vec<Array3<A>>,
}

impl<A: FloatNum> ModeFields<A> {
    /// Reconstruct mode fields from a stacked mode matrix, see [`reconstruct`]
    ///
    /// # Errors
    /// Same as [`reconstruct`]
    pub fn from_matrix<S: Data<Elem = A>>(
        modes: &ArrayBase<S, Ix2>,
        field_shape: (usize, usize),
        num_modes: usize,
        num_components: usize,
    ) -> Result<Self> {
        let fields = reconstruct(modes, field_shape, num_modes, num_components)?;
        Ok(Self { fields })
    }

    /// Wrap already reconstructed fields (ordered U, V, W).
    ///
    /// # Errors
    /// `Shape` when the components differ in field shape or number of modes,
    /// `Domain` when not 1 to 3 components are given.
    pub fn from_fields(fields: Vec<Array3<A>>) -> Result<Self> {
        if !(1..=3).contains(&fields.len()) {
            return Err(PodError::domain(format!(
                "expected 1 to 3 components, got {}",
                fields.len()
            )));
        }
        let reference = fields[0].shape().to_vec();
        for (field, c) in fields.iter().zip(Component::all(fields.len())).skip(1) {
            if field.shape()[2] != reference[2] {
                return Err(PodError::shape(format!(
                    "there are different numbers of U and {} modes ({} != {})",
                    c,
                    reference[2],
                    field.shape()[2]
                )));
            }
            if field.shape() != reference.as_slice() {
                return Err(PodError::shape(format!(
                    "{} modes have shape {:?}, U modes {:?}",
                    c,
                    field.shape(),
                    reference
                )));
            }
        }
        Ok(Self { fields })
    }

    /// Number of velocity components
    pub fn num_components(&self) -> usize {
        self.fields.len()
    }

    /// Number of modes per component
    pub fn num_modes(&self) -> usize {
        self.fields[0].shape()[2]
    }

    /// Shape (rows, cols) of a single mode
    pub fn field_shape(&self) -> (usize, usize) {
        let shape = self.fields[0].shape();
        (shape[0], shape[1])
    }

    /// Mode fields of a component, `None` if the data does not contain it
    pub fn component(&self, component: Component) -> Option<&Array3<A>> {
        self.fields.get(component.index())
    }

    /// Return fields, ordered U, V, W
    pub fn into_inner(self) -> Vec<Array3<A>> {
        self.fields
    }

    /// Return one row of panels (one per component) for every requested mode.
    ///
    /// # Errors
    /// `Domain` when a mode index exceeds the number of modes
    pub fn panels(&self, plot_modes: &[usize]) -> Result<Vec<Vec<ModePanel<A>>>> {
        let num_modes = self.num_modes();
        let mut rows = Vec::with_capacity(plot_modes.len());
        for &mode in plot_modes {
            if mode >= num_modes {
                return Err(PodError::domain(format!(
                    "you asked for mode {}, but only {} modes were calculated",
                    mode, num_modes
                )));
            }
            let row = self
                .fields
                .iter()
                .zip(Component::all(self.num_components()))
                .map(|(field, &component)| {
                    let slice = field.index_axis(Axis(2), mode).to_owned();
                    let clim = slice.fold(A::zero(), |acc, v| acc.max(v.abs()));
                    ModePanel {
                        component,
                        mode,
                        field: slice,
                        clim,
                    }
                })
                .collect();
            rows.push(row);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn stacked(num_components: usize, rows: usize, cols: usize, num_modes: usize) -> Array2<f64> {
        let mut modes = Array2::<f64>::zeros((num_components * rows * cols, num_modes));
        for (i, v) in modes.iter_mut().enumerate() {
            *v = i as f64;
        }
        modes
    }

    #[test]
    fn test_reconstruct_zeros() {
        let modes = Array2::<f64>::zeros((2 * 4 * 5, 3));
        let fields = reconstruct(&modes, (4, 5), 3, 2).unwrap();
        assert_eq!(fields.len(), 2);
        for f in &fields {
            assert_eq!(f.shape(), &[4, 5, 3]);
            assert!(f.iter().all(|v| *v == 0.));
        }
    }

    #[test]
    fn test_reconstruct_row_major() {
        let (rows, cols) = (3, 4);
        let modes = stacked(1, rows, cols, 2);
        let fields = reconstruct(&modes, (rows, cols), 2, 1).unwrap();
        for r in 0..rows {
            for c in 0..cols {
                for m in 0..2 {
                    assert_abs_diff_eq!(fields[0][[r, c, m]], modes[[r * cols + c, m]]);
                }
            }
        }
    }

    #[test]
    fn test_reconstruct_w_uses_own_block() {
        let (rows, cols) = (2, 3);
        let modes = stacked(3, rows, cols, 2);
        let fields = reconstruct(&modes, (rows, cols), 2, 3).unwrap();
        let block = rows * cols;
        assert_abs_diff_eq!(fields[1][[0, 0, 0]], modes[[block, 0]]);
        assert_abs_diff_eq!(fields[2][[0, 0, 0]], modes[[2 * block, 0]]);
        assert!(fields[1] != fields[2]);
    }

    #[test]
    fn test_reconstruct_subset_of_modes() {
        let modes = stacked(2, 2, 2, 5);
        let fields = reconstruct(&modes, (2, 2), 3, 2).unwrap();
        assert_eq!(fields[0].shape(), &[2, 2, 3]);
        assert_abs_diff_eq!(fields[1][[1, 1, 2]], modes[[7, 2]]);
    }

    #[test]
    fn test_reconstruct_fortran_layout() {
        let modes = stacked(1, 2, 3, 2);
        let modes_f = modes.t().as_standard_layout().t().to_owned();
        let a = reconstruct(&modes, (2, 3), 2, 1).unwrap();
        let b = reconstruct(&modes_f, (2, 3), 2, 1).unwrap();
        assert_eq!(a[0], b[0]);
    }

    #[test]
    fn test_reconstruct_errors() {
        let modes = Array2::<f64>::zeros((2 * 4 * 5, 3));
        assert!(matches!(
            reconstruct(&modes, (4, 4), 3, 2),
            Err(PodError::Shape(_))
        ));
        assert!(matches!(
            reconstruct(&modes, (4, 5), 4, 2),
            Err(PodError::Domain(_))
        ));
        assert!(matches!(
            reconstruct(&modes, (4, 5), 3, 4),
            Err(PodError::Domain(_))
        ));
        assert!(matches!(
            reconstruct(&modes, (4, 5), 0, 2),
            Err(PodError::Domain(_))
        ));
    }

    #[test]
    fn test_panels_clim() {
        let mut modes = Array2::<f64>::zeros((2 * 2 * 2, 2));
        modes[[1, 1]] = -3.;
        modes[[2, 1]] = 2.;
        modes[[5, 1]] = 1.5;
        let fields = ModeFields::from_matrix(&modes, (2, 2), 2, 2).unwrap();
        let panels = fields.panels(&[1]).unwrap();
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].len(), 2);
        assert_eq!(panels[0][0].component, Component::U);
        assert_abs_diff_eq!(panels[0][0].clim, 3.);
        assert_abs_diff_eq!(panels[0][1].clim, 1.5);
        assert!(fields.panels(&[2]).is_err());
    }

    #[test]
    fn test_from_fields_mode_count_mismatch() {
        let u = Array3::<f64>::zeros((2, 2, 3));
        let v = Array3::<f64>::zeros((2, 2, 2));
        assert!(matches!(
            ModeFields::from_fields(vec![u, v]),
            Err(PodError::Shape(_))
        ));
    }
}
