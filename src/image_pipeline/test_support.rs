//! Synthetic EXR buffers for tests.

use std::io::Cursor;

use exr::prelude::*;

/// Writes an in-memory scanline EXR with solid-color f32 RGB channels.
pub fn synthetic_exr_rgb(width: usize, height: usize, rgb: (f32, f32, f32)) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    Image::from_channels(
        (width, height),
        SpecificChannels::rgb(|_: Vec2<usize>| rgb),
    )
    .write()
    .to_buffered(&mut buffer)
    .expect("writing a synthetic exr image should not fail");
    buffer.into_inner()
}

/// Writes an in-memory scanline EXR with solid-color f32 RGBA channels.
pub fn synthetic_exr_rgba(width: usize, height: usize, rgba: (f32, f32, f32, f32)) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    Image::from_channels(
        (width, height),
        SpecificChannels::rgba(|_: Vec2<usize>| rgba),
    )
    .write()
    .to_buffered(&mut buffer)
    .expect("writing a synthetic exr image should not fail");
    buffer.into_inner()
}
