//! a64-multicolor library crate.
//!
//! Encodes gray8 video into Commodore 64 multicolor charset streams: one
//! 256-character charset per batch of frames, plus a 40x25 screen map (and in
//! 5-color mode a colorram map) per frame.
//!
//! ```ignore
//! use a64_multicolor::{Encoder, EncoderConfig, Frame};
//!
//! let mut encoder = Encoder::new(EncoderConfig::default());
//! let mut out = vec![0; encoder.required_size()];
//! let frame = Frame::filled(320, 200, 128);
//! if let Some(size) = encoder.encode(Some(&frame), &mut out)? {
//!     sink.write_all(&out[..size])?;
//! }
//! ```

pub mod blocks;
pub mod charset;
pub mod cli;
pub mod config;
pub mod encoder;
pub mod frame;
pub mod payload;
pub mod quantizer;

pub use encoder::{lifetime_from_quality, EncodeError, Encoder, EncoderConfig};
pub use frame::{Frame, FrameError};
pub use payload::{codec_tag, required_size, ColorMode, FORMAT_TAG};
pub use quantizer::{LbgQuantizer, Quantizer};
