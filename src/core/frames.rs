//! Frame stream decoding
//!
//! One JSON object per line, standing in for the camera and landmark
//! extractor:
//!
//! ```text
//! {"t": 0.033, "left": [[x,y], ...6], "right": [[x,y], ...6]}
//! {"t": 0.033, "mesh": [[x,y], ...468], "width": 640, "height": 480}
//! {"t": 0.033, "ear": 0.31}
//! {"t": 0.033, "face": null}
//! {"control": "reset"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::io::BufRead;

use serde::Deserialize;
use tracing::trace;

use crate::core::ear::{EyeLandmarks, Point};
use crate::core::session::{ControlSignal, Frame, FrameInput, SessionInput};
use crate::error::{BlinkError, Result};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLine {
    Control { control: ControlSignal },
    Frame(RawFrame),
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    t: f64,
    #[serde(default)]
    left: Option<Vec<Point>>,
    #[serde(default)]
    right: Option<Vec<Point>>,
    #[serde(default)]
    mesh: Option<Vec<Point>>,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
    #[serde(default)]
    ear: Option<f64>,
}

impl RawFrame {
    fn into_frame(self) -> Frame {
        let input = if let Some(ear) = self.ear {
            FrameInput::Ear(ear)
        } else if let (Some(left), Some(right)) = (&self.left, &self.right) {
            landmarks_or_none(EyeLandmarks::new(left, right))
        } else if let Some(mesh) = &self.mesh {
            let width = self.width.unwrap_or(1.0);
            let height = self.height.unwrap_or(1.0);
            landmarks_or_none(EyeLandmarks::from_mesh(mesh, width, height))
        } else {
            FrameInput::NoFace
        };

        Frame {
            timestamp: self.t,
            input,
        }
    }
}

fn landmarks_or_none(landmarks: Result<EyeLandmarks>) -> FrameInput {
    match landmarks {
        Ok(landmarks) => FrameInput::Landmarks(landmarks),
        Err(_) => FrameInput::NoFace,
    }
}

/// Parse one line; `None` for blank and comment lines
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<SessionInput>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let raw: RawLine = serde_json::from_str(line).map_err(|e| BlinkError::FrameParse {
        line: line_no,
        message: e.to_string(),
    })?;

    let input = match raw {
        RawLine::Control { control } => SessionInput::Control(control),
        RawLine::Frame(frame) => SessionInput::Frame(frame.into_frame()),
    };
    trace!("line {}: {:?}", line_no, input);
    Ok(Some(input))
}

/// Lazily decode a whole stream. Line numbers start at 1.
pub fn read_inputs<R: BufRead>(reader: R) -> impl Iterator<Item = Result<SessionInput>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(i, line)| match line {
            Ok(line) => parse_line(&line, i + 1).transpose(),
            Err(e) => Some(Err(BlinkError::Io(e))),
        })
}

// =============================================================================
// TESTS
// =============================================================================
