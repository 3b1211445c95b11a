// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Encoded polyline decoding (Google polyline format, as used by Strava).
//!
//! Each point is stored as a (latitude, longitude) pair of deltas from the
//! previous point. Every delta is a zigzag-encoded integer written as 5-bit
//! chunks, least significant first, each offset by 63 into printable ASCII
//! with 0x20 marking "more chunks follow".

use crate::models::Coordinate;
use geo::LineString;

/// Precision used by Strava summary and detailed polylines.
pub const STRAVA_PRECISION: u32 = 5;

const CHUNK_OFFSET: u8 = 63;
const CHUNK_MASK: u64 = 0x1f;
const CONTINUATION_BIT: u64 = 0x20;
const CHUNK_BITS: u32 = 5;

/// Errors for encoded paths that cannot be decoded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolylineError {
    #[error("invalid character {byte:#04x} at offset {offset}")]
    InvalidCharacter { offset: usize, byte: u8 },

    #[error("input ends inside the value starting at offset {offset}")]
    Truncated { offset: usize },

    #[error("latitude at offset {offset} has no matching longitude")]
    MissingLongitude { offset: usize },

    #[error("value starting at offset {offset} does not fit in 64 bits")]
    Overflow { offset: usize },

    #[error("point at offset {offset} is off the globe ({latitude}, {longitude})")]
    OutOfRange {
        offset: usize,
        latitude: f64,
        longitude: f64,
    },
}

/// Decode an encoded polyline into coordinates.
///
/// Empty input decodes to an empty path. Points outside ±90° latitude or
/// ±180° longitude are rejected.
pub fn decode(encoded: &str, precision: u32) -> Result<Vec<Coordinate>, PolylineError> {
    let factor = 10f64.powi(precision as i32);
    let bytes = encoded.as_bytes();

    let mut coordinates = Vec::with_capacity(bytes.len() / 4);
    let mut pos = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while pos < bytes.len() {
        let lat_offset = pos;
        lat = lat
            .checked_add(zigzag(read_chunk(bytes, &mut pos)?))
            .ok_or(PolylineError::Overflow { offset: lat_offset })?;

        if pos == bytes.len() {
            return Err(PolylineError::MissingLongitude { offset: lat_offset });
        }

        let lng_offset = pos;
        lng = lng
            .checked_add(zigzag(read_chunk(bytes, &mut pos)?))
            .ok_or(PolylineError::Overflow { offset: lng_offset })?;

        let point = Coordinate::new(lat as f64 / factor, lng as f64 / factor);
        if point.latitude.abs() > 90.0 || point.longitude.abs() > 180.0 {
            return Err(PolylineError::OutOfRange {
                offset: lat_offset,
                latitude: point.latitude,
                longitude: point.longitude,
            });
        }
        coordinates.push(point);
    }

    Ok(coordinates)
}

/// Decode straight into a `LineString` (x = longitude, y = latitude).
pub fn decode_line_string(
    encoded: &str,
    precision: u32,
) -> Result<LineString<f64>, PolylineError> {
    Ok(decode(encoded, precision)?
        .into_iter()
        .map(geo::Coord::from)
        .collect())
}

/// Read one variable-length chunk sequence starting at `pos`, advancing it.
fn read_chunk(bytes: &[u8], pos: &mut usize) -> Result<u64, PolylineError> {
    let start = *pos;
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *bytes
            .get(*pos)
            .ok_or(PolylineError::Truncated { offset: start })?;

        if !(b'?'..=b'~').contains(&byte) {
            return Err(PolylineError::InvalidCharacter { offset: *pos, byte });
        }
        if shift >= u64::BITS {
            return Err(PolylineError::Overflow { offset: start });
        }

        let chunk = u64::from(byte - CHUNK_OFFSET);
        let bits = chunk & CHUNK_MASK;
        let shifted = bits << shift;
        // High bits of the last chunk must not fall off the top
        if shifted >> shift != bits {
            return Err(PolylineError::Overflow { offset: start });
        }
        result |= shifted;
        *pos += 1;

        if chunk & CONTINUATION_BIT == 0 {
            return Ok(result);
        }
        shift += CHUNK_BITS;
    }
}

/// Encode one signed delta as polyline chunks.
#[cfg(test)]
pub(crate) fn encode_value(value: i64) -> String {
    let mut v = ((value << 1) ^ (value >> 63)) as u64;
    let mut out = String::new();
    while v >= CONTINUATION_BIT {
        out.push(((CONTINUATION_BIT | (v & CHUNK_MASK)) as u8 + CHUNK_OFFSET) as char);
        v >>= CHUNK_BITS;
    }
    out.push((v as u8 + CHUNK_OFFSET) as char);
    out
}

/// Undo zigzag encoding: the low bit carries the sign.
fn zigzag(value: u64) -> i64 {
    let magnitude = (value >> 1) as i64;
    if value & 1 == 1 {
        !magnitude
    } else {
        magnitude
    }
}
