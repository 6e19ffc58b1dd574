//! Eye Aspect Ratio from eye landmarks
//!
//! Each eye is six points: outer corner, top 1, top 2, inner corner,
//! bottom 1, bottom 2. Per eye:
//!
//! ```text
//! EAR = (|p1 - p5| + |p2 - p4|) / (2 * |p0 - p3|)
//! ```
//!
//! The frame value is the mean over both eyes.

use std::collections::VecDeque;

use crate::error::{BlinkError, Result};

/// (x, y) landmark coordinate
pub type Point = [f64; 2];

/// Points per eye
pub const EYE_POINTS: usize = 6;

/// Left eye indices in a 468-point face mesh
pub const LEFT_EYE_MESH_INDICES: [usize; EYE_POINTS] = [33, 160, 158, 133, 153, 144];

/// Right eye indices in a 468-point face mesh
pub const RIGHT_EYE_MESH_INDICES: [usize; EYE_POINTS] = [362, 385, 387, 263, 373, 380];

/// Both eyes' landmarks for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeLandmarks {
    pub left: [Point; EYE_POINTS],
    pub right: [Point; EYE_POINTS],
}

impl EyeLandmarks {
    /// Build from per-eye point lists; any other count than six is unusable
    pub fn new(left: &[Point], right: &[Point]) -> Result<Self> {
        let left: [Point; EYE_POINTS] =
            left.try_into().map_err(|_| BlinkError::LandmarksUnavailable)?;
        let right: [Point; EYE_POINTS] =
            right.try_into().map_err(|_| BlinkError::LandmarksUnavailable)?;
        Ok(Self { left, right })
    }

    /// Pick both eyes out of a normalized face mesh and scale to pixels
    pub fn from_mesh(mesh: &[Point], width: f64, height: f64) -> Result<Self> {
        let pick = |indices: &[usize; EYE_POINTS]| -> Result<[Point; EYE_POINTS]> {
            let mut eye = [[0.0; 2]; EYE_POINTS];
            for (slot, &idx) in eye.iter_mut().zip(indices) {
                let [x, y] = mesh.get(idx).ok_or(BlinkError::LandmarksUnavailable)?;
                *slot = [x * width, y * height];
            }
            Ok(eye)
        };
        Ok(Self {
            left: pick(&LEFT_EYE_MESH_INDICES)?,
            right: pick(&RIGHT_EYE_MESH_INDICES)?,
        })
    }
}

fn distance(a: Point, b: Point) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

/// EAR of one eye, or None when the geometry is degenerate
pub fn eye_aspect_ratio(eye: &[Point; EYE_POINTS]) -> Option<f64> {
    if eye.iter().flatten().any(|c| !c.is_finite()) {
        return None;
    }

    let vertical_a = distance(eye[1], eye[5]);
    let vertical_b = distance(eye[2], eye[4]);
    let horizontal = distance(eye[0], eye[3]);

    if horizontal == 0.0 {
        return None;
    }
    Some((vertical_a + vertical_b) / (2.0 * horizontal))
}

/// Mean EAR over both eyes
pub fn calculate_ear(landmarks: &EyeLandmarks) -> Result<f64> {
    let left = eye_aspect_ratio(&landmarks.left).ok_or(BlinkError::LandmarksUnavailable)?;
    let right = eye_aspect_ratio(&landmarks.right).ok_or(BlinkError::LandmarksUnavailable)?;
    Ok((left + right) / 2.0)
}

/// Moving average over the most recent EAR values
#[derive(Debug, Clone)]
pub struct EarSmoother {
    window: usize,
    history: VecDeque<f64>,
}

impl EarSmoother {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            history: VecDeque::with_capacity(window),
        }
    }

    /// Add a value and return the current average
    pub fn push(&mut self, ear: f64) -> f64 {
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(ear);
        self.history.iter().sum::<f64>() / self.history.len() as f64
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================
