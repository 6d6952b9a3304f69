//! Quarter-turn rotation of pixel buffers.
//!
//! Rotation never touches the source buffer. Each output buffer is built with
//! [`ImageBuffer::from_fn`], pulling every destination pixel from exactly one
//! source pixel through the inverse coordinate mapping:
//!
//! | Rotation | Output size | Destination `(dx, dy)` reads source |
//! |---|---|---|
//! | 90° clockwise | `h × w` | `(dy, h - 1 - dx)` |
//! | 180° | `w × h` | `(w - 1 - dx, h - 1 - dy)` |
//! | 270° clockwise | `h × w` | `(w - 1 - dy, dx)` |
//!
//! Iterating the destination (rather than scattering the source) guarantees
//! there are no gaps and no double writes. A zero-width or zero-height input
//! yields an empty buffer with the transformed dimensions; no pixel is read.

use image::{ImageBuffer, Pixel};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("rotation must be 0, 90, 180 or 270 degrees, got {0}")]
pub struct InvalidRotation(pub String);

/// A clockwise rotation by a multiple of 90 degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }

    /// The rotation that undoes this one.
    pub fn inverse(self) -> Self {
        match self {
            Rotation::None => Rotation::None,
            Rotation::Cw90 => Rotation::Cw270,
            Rotation::Cw180 => Rotation::Cw180,
            Rotation::Cw270 => Rotation::Cw90,
        }
    }

    /// Whether width and height trade places.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Cw90 | Rotation::Cw270)
    }

    /// Dimensions of a `(width, height)` buffer after this rotation.
    pub fn output_dimensions(self, (width, height): (u32, u32)) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }
}

impl TryFrom<u32> for Rotation {
    type Error = InvalidRotation;

    fn try_from(degrees: u32) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::None),
            90 => Ok(Rotation::Cw90),
            180 => Ok(Rotation::Cw180),
            270 => Ok(Rotation::Cw270),
            other => Err(InvalidRotation(other.to_string())),
        }
    }
}

impl FromStr for Rotation {
    type Err = InvalidRotation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map_err(|_| InvalidRotation(s.to_string()))
            .and_then(Rotation::try_from)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Map a destination coordinate back to the source coordinate it is read from.
///
/// `source` is the `(width, height)` of the *source* buffer. The destination
/// coordinate must lie inside the rotated bounds.
pub fn source_coordinate(rotation: Rotation, source: (u32, u32), dest: (u32, u32)) -> (u32, u32) {
    let (w, h) = source;
    let (dx, dy) = dest;
    match rotation {
        Rotation::None => (dx, dy),
        Rotation::Cw90 => (dy, h - 1 - dx),
        Rotation::Cw180 => (w - 1 - dx, h - 1 - dy),
        Rotation::Cw270 => (w - 1 - dy, dx),
    }
}

/// Rotate a buffer by a quarter-turn multiple.
///
/// [`Rotation::None`] borrows the input unchanged; every other rotation
/// returns a freshly built buffer.
pub fn rotate<P>(
    buffer: &ImageBuffer<P, Vec<P::Subpixel>>,
    rotation: Rotation,
) -> Cow<'_, ImageBuffer<P, Vec<P::Subpixel>>>
where
    P: Pixel,
{
    if rotation == Rotation::None {
        return Cow::Borrowed(buffer);
    }

    let source = buffer.dimensions();
    let (out_w, out_h) = rotation.output_dimensions(source);

    Cow::Owned(ImageBuffer::from_fn(out_w, out_h, |dx, dy| {
        let (sx, sy) = source_coordinate(rotation, source, (dx, dy));
        *buffer.get_pixel(sx, sy)
    }))
}
