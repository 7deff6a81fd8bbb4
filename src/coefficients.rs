//! # Joint distributions of POD coefficients
//!
//! The coefficient matrix `C` has shape `(num_modes, num_frames)`, row `i`
//! holds the temporal coefficient of mode `i` for every frame. Pairs of rows
//! are binned into 2D histograms over a symmetric range `[-bound, bound]`.
//!
//! Counts follow the usual convention of `histogram2d`: `counts[[i, j]]`
//! is the number of samples whose first coordinate lies in x-bin `i` and
//! whose second coordinate lies in y-bin `j`. Bins are half-open
//! `[e_k, e_k+1)`, except for the last one which includes its right edge.
//! Samples outside the edges are dropped.
pub mod scatter;
pub use scatter::{
    scatter_grid, select_thumbnails, ScatterGrid, ScatterPanel, ScatterSettings, Thumbnail,
};

use crate::error::{PodError, Result};
use crate::types::{cast, FloatNum};
use ndarray::prelude::*;
use ndarray::Data;
use rayon::prelude::*;
use serde::Deserialize;

/// Bin edges and (optionally log-scaled) counts of a 2D histogram
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramGrid<A> {
    /// Edges along the first coordinate (length nx + 1)
    pub x_edges: Array1<A>,
    /// Edges along the second coordinate (length ny + 1)
    pub y_edges: Array1<A>,
    /// Counts of shape (nx, ny)
    pub counts: Array2<A>,
}

impl<A: FloatNum> HistogramGrid<A> {
    /// Bin centres along both coordinates
    pub fn centers(&self) -> (Array1<A>, Array1<A>) {
        (centers(&self.x_edges), centers(&self.y_edges))
    }

    /// Sum over all bins
    pub fn total(&self) -> A {
        self.counts.sum()
    }

    /// Replace every count by `ln(count + 1)`
    pub fn log_scaled(mut self) -> Self {
        self.counts.mapv_inplace(|v| v.ln_1p());
        self
    }
}

fn centers<A: FloatNum>(edges: &Array1<A>) -> Array1<A> {
    let half = cast::<A>(0.5);
    Array1::from_shape_fn(edges.len().saturating_sub(1), |i| {
        (edges[i] + edges[i + 1]) * half
    })
}

/// Settings shared by all coefficient heatmaps
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BinSettings {
    /// Number of bin edges per axis
    pub num_bins: usize,
    /// Symmetric axis limit, defaults to `round(max |C|)`
    pub bound: Option<f64>,
    /// Plot `ln(count + 1)` instead of raw counts
    pub log_scale: bool,
}

impl Default for BinSettings {
    fn default() -> Self {
        Self {
            num_bins: 50,
            bound: None,
            log_scale: false,
        }
    }
}

/// Return `num_bins` edges linearly spaced in `[-bound, bound]`.
///
/// The last edge equals `bound` exactly.
///
/// # Errors
/// `Domain` when `num_bins < 2` or `bound` is not finite and positive
pub fn linspace_edges<A: FloatNum>(bound: A, num_bins: usize) -> Result<Array1<A>> {
    if num_bins < 2 {
        return Err(PodError::domain(format!(
            "at least two bin edges are required, got {}",
            num_bins
        )));
    }
    if !bound.is_finite() || bound <= A::zero() {
        return Err(PodError::domain(format!(
            "bound must be finite and positive, got {}",
            bound
        )));
    }
    let step = (bound + bound) / cast::<A>((num_bins - 1) as f64);
    Ok(Array1::from_shape_fn(num_bins, |i| {
        if i == num_bins - 1 {
            bound
        } else {
            -bound + step * cast::<A>(i as f64)
        }
    }))
}

/// Default symmetric bound of a coefficient matrix: `round(max |C|)`
pub fn default_bound<A, S>(c: &ArrayBase<S, Ix2>) -> A
where
    A: FloatNum,
    S: Data<Elem = A>,
{
    round_half_even(c.fold(A::zero(), |acc, v| acc.max(v.abs())))
}

/// Round to the nearest integer, ties to the even neighbour
fn round_half_even<A: FloatNum>(v: A) -> A {
    let t = v.trunc();
    if (v - t).abs() != cast::<A>(0.5) {
        return v.round();
    }
    if (t * cast::<A>(0.5)).fract() == A::zero() {
        t
    } else {
        t + v.signum()
    }
}

fn resolve_bound<A, S>(c: &ArrayBase<S, Ix2>, bound: Option<A>) -> Result<A>
where
    A: FloatNum,
    S: Data<Elem = A>,
{
    let bound = match bound {
        Some(b) => b,
        None => {
            let b = default_bound(c);
            if b <= A::zero() {
                log::warn!("coefficients are all below 0.5 in magnitude, pass an explicit bound");
            }
            b
        }
    };
    if !bound.is_finite() || bound <= A::zero() {
        return Err(PodError::domain(format!(
            "bound must be finite and positive, got {}",
            bound
        )));
    }
    Ok(bound)
}

/// Locate the bin of `v`, `None` when outside of the edges
fn bin_index<A: FloatNum>(edges: &[A], v: A) -> Option<usize> {
    let n = edges.len();
    if v.is_nan() || v < edges[0] || v > edges[n - 1] {
        return None;
    }
    if v == edges[n - 1] {
        return Some(n - 2);
    }
    Some(edges.partition_point(|&e| e <= v) - 1)
}

fn check_edges<A: FloatNum>(edges: &Array1<A>, name: &str) -> Result<Vec<A>> {
    if edges.len() < 2 {
        return Err(PodError::domain(format!(
            "{} needs at least two edges, got {}",
            name,
            edges.len()
        )));
    }
    let edges = edges.to_vec();
    if edges.windows(2).any(|w| !(w[0] < w[1])) {
        return Err(PodError::domain(format!(
            "{} must increase monotonically",
            name
        )));
    }
    Ok(edges)
}

/// Compute a 2D histogram of the samples `(x[k], y[k])`.
///
/// # Errors
/// `Shape` when `x` and `y` differ in length, `Domain` when an edge array
/// holds less than two values or is not strictly increasing.
pub fn histogram2d<A, S1, S2>(
    x: &ArrayBase<S1, Ix1>,
    y: &ArrayBase<S2, Ix1>,
    x_edges: &Array1<A>,
    y_edges: &Array1<A>,
) -> Result<HistogramGrid<A>>
where
    A: FloatNum,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
{
    if x.len() != y.len() {
        return Err(PodError::shape(format!(
            "samples differ in length: {} != {}",
            x.len(),
            y.len()
        )));
    }
    let xe = check_edges(x_edges, "x_edges")?;
    let ye = check_edges(y_edges, "y_edges")?;
    let mut counts = Array2::<A>::zeros((xe.len() - 1, ye.len() - 1));
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        if let (Some(i), Some(j)) = (bin_index(&xe, xi), bin_index(&ye, yi)) {
            counts[[i, j]] += A::one();
        }
    }
    Ok(HistogramGrid {
        x_edges: x_edges.to_owned(),
        y_edges: y_edges.to_owned(),
        counts,
    })
}

/// Bin a pair of coefficient rows over `num_bins` edges in `[-bound, bound]`.
///
/// `pair` selects the rows of `c` used as first and second coordinate.
/// Without `bound`, `round(max |C|)` is used.
///
/// # Errors
/// - `Shape`: `c` has less than two rows
/// - `Domain`: row index out of range, `num_bins < 2`, or the bound is not
///   positive (e.g. derived from coefficients all smaller than 0.5)
///
/// # Example
/// ```
/// use ndarray::array;
/// use rustpod::coefficients::bin_coefficients;
/// let c = array![[-0.5, 0.2, 0.7], [0.1, -0.9, 0.4]];
/// let grid = bin_coefficients(&c, (0, 1), Some(1.0), 5, false).unwrap();
/// assert_eq!(grid.counts.shape(), &[4, 4]);
/// assert!((grid.total() - 3.0f64).abs() < 1e-12);
/// ```
pub fn bin_coefficients<A, S>(
    c: &ArrayBase<S, Ix2>,
    pair: (usize, usize),
    bound: Option<A>,
    num_bins: usize,
    log_scale: bool,
) -> Result<HistogramGrid<A>>
where
    A: FloatNum,
    S: Data<Elem = A>,
{
    if c.nrows() < 2 {
        return Err(PodError::shape(format!(
            "coefficient matrix needs at least two rows, got {}",
            c.nrows()
        )));
    }
    check_row(c, pair.0)?;
    check_row(c, pair.1)?;
    let bound = resolve_bound(c, bound)?;
    let edges = linspace_edges(bound, num_bins)?;
    let grid = histogram2d(&c.row(pair.0), &c.row(pair.1), &edges, &edges)?;
    log::debug!(
        "binned coefficients {:?} into {:?} bins (bound {})",
        pair,
        grid.counts.shape(),
        bound
    );
    if log_scale {
        Ok(grid.log_scaled())
    } else {
        Ok(grid)
    }
}

fn check_row<A, S>(c: &ArrayBase<S, Ix2>, row: usize) -> Result<()>
where
    S: Data<Elem = A>,
{
    if row >= c.nrows() {
        return Err(PodError::domain(format!(
            "coefficient row {} requested, but matrix has {} rows",
            row,
            c.nrows()
        )));
    }
    Ok(())
}

/// Upper triangular grid of pairwise coefficient histograms
#[derive(Debug, Clone)]
pub struct PairGrid<A> {
    /// Modes the grid was built from
    pub modes: Vec<usize>,
    /// Panels, `panels[i][j]` is `Some` only for `j >= i`
    pub panels: Vec<Vec<Option<HistogramGrid<A>>>>,
    /// Symmetric bound of the bin edges
    pub bound: A,
    /// Centre of the second bin, used as axis limit of the panels
    pub axis_limit: A,
}

impl<A> PairGrid<A> {
    /// Number of panel rows (and columns)
    pub fn size(&self) -> usize {
        self.panels.len()
    }

    /// Histogram of panel (i, j), `None` below the diagonal
    pub fn panel(&self, i: usize, j: usize) -> Option<&HistogramGrid<A>> {
        self.panels.get(i)?.get(j)?.as_ref()
    }
}

/// Bin every pair of the selected modes.
///
/// For `n = modes.len()` the grid has `(n-1) x (n-1)` panels. Panel `(i, j)`
/// with `j >= i` holds the histogram of rows `(modes[i], modes[j + 1])`;
/// panels below the diagonal would repeat their mirror image and are left
/// empty. Panels are binned in parallel.
///
/// # Errors
/// `Domain` when less than two modes are given or a mode exceeds the rows
/// of `c`, otherwise as [`bin_coefficients`].
pub fn pair_grid<A, S>(
    c: &ArrayBase<S, Ix2>,
    modes: &[usize],
    settings: &BinSettings,
) -> Result<PairGrid<A>>
where
    A: FloatNum,
    S: Data<Elem = A>,
{
    if modes.len() < 2 {
        return Err(PodError::domain(format!(
            "a pair grid needs at least two modes, got {}",
            modes.len()
        )));
    }
    for &m in modes {
        check_row(c, m)?;
    }
    let bound = resolve_bound(c, settings.bound.map(cast::<A>))?;
    let edges = linspace_edges(bound, settings.num_bins)?;
    let axis_limit = if edges.len() > 2 {
        (edges[1] + edges[2]) * cast::<A>(0.5)
    } else {
        bound
    };

    let n = modes.len() - 1;
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| (i..n).map(move |j| (i, j)))
        .collect();
    let view = c.view();
    let binned: Vec<Result<HistogramGrid<A>>> = pairs
        .par_iter()
        .map(|&(i, j)| {
            let grid = histogram2d(&view.row(modes[i]), &view.row(modes[j + 1]), &edges, &edges)?;
            Ok(if settings.log_scale {
                grid.log_scaled()
            } else {
                grid
            })
        })
        .collect();

    let mut panels: Vec<Vec<Option<HistogramGrid<A>>>> =
        (0..n).map(|_| (0..n).map(|_| None).collect()).collect();
    for (&(i, j), grid) in pairs.iter().zip(binned) {
        panels[i][j] = Some(grid?);
    }
    log::debug!("binned {} coefficient pairs of modes {:?}", pairs.len(), modes);
    Ok(PairGrid {
        modes: modes.to_vec(),
        panels,
        bound,
        axis_limit,
    })
}

/// Pad positions with one extrapolated edge on each side
fn padded_edges<A: FloatNum>(ypos: &[A]) -> Array1<A> {
    let n = ypos.len();
    let mut edges = Vec::with_capacity(n + 2);
    edges.push(ypos[0] - (ypos[1] - ypos[0]));
    edges.extend_from_slice(ypos);
    edges.push(ypos[n - 1] + (ypos[n - 1] - ypos[n - 2]));
    Array1::from(edges)
}

/// Heatmaps of coefficients against wall-normal position.
///
/// Row 0 of `c` holds the sample position, binned over `ypos` padded with one
/// extrapolated edge on either side. For every entry `m` of `modes` the
/// histogram of rows `(0, m + 1)` is returned, with coefficient edges
/// linearly spaced in `[-bound, bound]` along the second coordinate.
/// Use `counts.t()` for image orientation (rows along the coefficient axis).
///
/// # Errors
/// `Domain` when `ypos` has less than two strictly increasing entries, or
/// `m + 1` exceeds the rows of `c`, otherwise as [`bin_coefficients`].
pub fn position_heatmaps<A, S1, S2>(
    ypos: &ArrayBase<S1, Ix1>,
    c: &ArrayBase<S2, Ix2>,
    modes: &[usize],
    settings: &BinSettings,
) -> Result<Vec<HistogramGrid<A>>>
where
    A: FloatNum,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
{
    if ypos.len() < 2 {
        return Err(PodError::domain(format!(
            "at least two wall-normal positions are required, got {}",
            ypos.len()
        )));
    }
    let rows = modes
        .iter()
        .map(|&m| {
            let row = m.checked_add(1).ok_or_else(|| {
                PodError::domain(format!("mode {} has no coefficient row", m))
            })?;
            check_row(c, row)?;
            Ok(row)
        })
        .collect::<Result<Vec<usize>>>()?;
    let x_edges = padded_edges(&ypos.to_vec());
    let bound = resolve_bound(c, settings.bound.map(cast::<A>))?;
    let y_edges = linspace_edges(bound, settings.num_bins)?;
    rows.iter()
        .map(|&row| {
            let grid = histogram2d(&c.row(0), &c.row(row), &x_edges, &y_edges)?;
            Ok(if settings.log_scale {
                grid.log_scaled()
            } else {
                grid
            })
        })
        .collect()
}
