//! Scatter plots of coefficient pairs with thumbnail annotations
//!
//! Every frame is a point in coefficient space. A subset of frames is picked
//! such that no two of them lie closer than a fraction of the data extent;
//! their thumbnails (e.g. swirl fields) are drawn next to the point, offset
//! radially away from the origin.
use super::{check_row, resolve_bound};
use crate::error::{PodError, Result};
use crate::types::{cast, FloatNum};
use ndarray::prelude::*;
use ndarray::Data;
use serde::Deserialize;

/// Settings of the coefficient scatter grid
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScatterSettings {
    /// Symmetric axis limit, defaults to `round(max |C|)`
    pub bound: Option<f64>,
    /// Minimum distance of thumbnails, as fraction of the largest coefficient range
    pub thumb_frac: f64,
    /// Length of the offset between a point and its thumbnail
    pub vec_dist: f64,
}

impl Default for ScatterSettings {
    fn default() -> Self {
        Self {
            bound: None,
            thumb_frac: 0.5,
            vec_dist: 0.05,
        }
    }
}

/// Thumbnail of a single frame inside a scatter panel
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail<A> {
    /// Frame (column of the coefficient matrix)
    pub frame: usize,
    /// Coefficient pair of the frame, arrow tip
    pub anchor: [A; 2],
    /// Position of the thumbnail box
    pub label: [A; 2],
}

/// Single panel of the scatter grid
#[derive(Debug, Clone)]
pub struct ScatterPanel<A> {
    /// Mode on the first axis
    pub mode_x: usize,
    /// Mode on the second axis
    pub mode_y: usize,
    /// Coefficients of `mode_x`
    pub x: Array1<A>,
    /// Coefficients of `mode_y`
    pub y: Array1<A>,
    /// Colour value of every point (wall-normal position)
    pub color: Array1<A>,
    /// Annotated frames
    pub thumbnails: Vec<Thumbnail<A>>,
}

/// Upper triangular grid of scatter panels
#[derive(Debug, Clone)]
pub struct ScatterGrid<A> {
    /// Panels, `panels[i][j]` is `Some` only for `j >= i`
    pub panels: Vec<Vec<Option<ScatterPanel<A>>>>,
    /// Frames selected for thumbnails
    pub frames: Vec<usize>,
    /// Symmetric axis limit
    pub bound: A,
}

impl<A> ScatterGrid<A> {
    /// Panel (i, j), `None` below the diagonal
    pub fn panel(&self, i: usize, j: usize) -> Option<&ScatterPanel<A>> {
        self.panels.get(i)?.get(j)?.as_ref()
    }
}

/// Pick frames whose coefficient vectors are well separated.
///
/// Frames are visited in order. A frame is kept when its squared distance
/// to every kept frame (and to a sentinel at twice the per-mode maximum) is
/// at least `(thumb_frac * max_range)^2`, where `max_range` is the largest
/// extent of any mode's coefficients.
///
/// # Example
/// ```
/// use ndarray::array;
/// use rustpod::coefficients::select_thumbnails;
/// let c = array![[0.0, 0.1, 1.0, -1.0], [0.0, 0.0, 0.0, 0.0]];
/// assert_eq!(select_thumbnails(&c, 0.5), vec![0, 2, 3]);
/// ```
pub fn select_thumbnails<A, S>(c: &ArrayBase<S, Ix2>, thumb_frac: A) -> Vec<usize>
where
    A: FloatNum,
    S: Data<Elem = A>,
{
    if c.ncols() == 0 || c.nrows() == 0 {
        return vec![];
    }
    let max = c.map_axis(Axis(1), |r| r.fold(A::neg_infinity(), |a, &b| a.max(b)));
    let min = c.map_axis(Axis(1), |r| r.fold(A::infinity(), |a, &b| a.min(b)));
    let range = (&max - &min).fold(A::zero(), |a, &b| a.max(b));
    let min_dist_2 = (thumb_frac * range).powi(2);

    let two = cast::<A>(2.);
    let mut shown: Vec<Array1<A>> = vec![max.mapv(|v| v * two)];
    let mut frames = vec![];
    for (k, point) in c.axis_iter(Axis(1)).enumerate() {
        let dist = shown
            .iter()
            .map(|s| {
                s.iter()
                    .zip(point.iter())
                    .fold(A::zero(), |acc, (&a, &b)| acc + (b - a) * (b - a))
            })
            .fold(A::infinity(), |a, b| a.min(b));
        if !dist.is_finite() || dist < min_dist_2 {
            continue;
        }
        log::trace!("thumbnail for frame {} (distance^2 {})", k, dist);
        shown.push(point.to_owned());
        frames.push(k);
    }
    frames
}

/// Thumbnail box position: `c + vec_dist * c / |c|`
fn label_position<A: FloatNum>(anchor: [A; 2], vec_dist: A) -> [A; 2] {
    let norm = anchor[0].hypot(anchor[1]);
    if norm == A::zero() {
        return anchor;
    }
    [
        anchor[0] + vec_dist * anchor[0] / norm,
        anchor[1] + vec_dist * anchor[1] / norm,
    ]
}

/// Build the scatter grid of the selected modes.
///
/// Layout matches [`super::pair_grid`]: panel `(i, j)`, `j >= i`, plots
/// `modes[j + 1]` against `modes[i]`. Every point is coloured by `ypos`.
///
/// # Errors
/// - `Shape`: `ypos` length differs from the number of frames
/// - `Domain`: less than two modes, mode out of range, or no positive bound
pub fn scatter_grid<A, S1, S2>(
    c: &ArrayBase<S1, Ix2>,
    ypos: &ArrayBase<S2, Ix1>,
    modes: &[usize],
    settings: &ScatterSettings,
) -> Result<ScatterGrid<A>>
where
    A: FloatNum,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
{
    if modes.len() < 2 {
        return Err(PodError::domain(format!(
            "a scatter grid needs at least two modes, got {}",
            modes.len()
        )));
    }
    if ypos.len() != c.ncols() {
        return Err(PodError::shape(format!(
            "got {} wall-normal positions for {} frames",
            ypos.len(),
            c.ncols()
        )));
    }
    for &m in modes {
        check_row(c, m)?;
    }
    let bound = resolve_bound(c, settings.bound.map(cast::<A>))?;
    let frames = select_thumbnails(c, cast::<A>(settings.thumb_frac));
    let vec_dist = cast::<A>(settings.vec_dist);

    let n = modes.len() - 1;
    let mut panels: Vec<Vec<Option<ScatterPanel<A>>>> =
        (0..n).map(|_| (0..n).map(|_| None).collect()).collect();
    for i in 0..n {
        for j in i..n {
            let (mx, my) = (modes[i], modes[j + 1]);
            let thumbnails = frames
                .iter()
                .map(|&k| {
                    let anchor = [c[[mx, k]], c[[my, k]]];
                    Thumbnail {
                        frame: k,
                        anchor,
                        label: label_position(anchor, vec_dist),
                    }
                })
                .collect();
            panels[i][j] = Some(ScatterPanel {
                mode_x: mx,
                mode_y: my,
                x: c.row(mx).to_owned(),
                y: c.row(my).to_owned(),
                color: ypos.to_owned(),
                thumbnails,
            });
        }
    }
    log::debug!(
        "scatter grid of modes {:?} with {} thumbnails",
        modes,
        frames.len()
    );
    Ok(ScatterGrid {
        panels,
        frames,
        bound,
    })
}
