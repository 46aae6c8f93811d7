//! Batch encoder: buffers frames for one charset lifetime, then quantizes,
//! renders and packs them in a single call.

use thiserror::Error;

use crate::blocks::{self, LumaVector, CELL_COUNT, VECTOR_DIM};
use crate::charset::{render_charset_into, Charset, LumaReference, RenderError, CHARSET_CHARS};
use crate::frame::Frame;
use crate::payload::{self, ColorMode};
use crate::quantizer::{LbgQuantizer, Quantizer};

/// Lifetime used when no quality is requested.
pub const DEFAULT_LIFETIME: usize = 4;

/// Quality units per frame of lifetime (lambda scale).
pub const QP2LAMBDA: i32 = 118;

/// Errors returned by [`Encoder::encode`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// The output buffer cannot hold the batch payload
    #[error("output buffer too small (need {required} bytes, got {available})")]
    InsufficientOutputBuffer { required: usize, available: usize },
    /// Charset correction did not settle for a character
    #[error("charset rendering did not converge for character {character} after {attempts} passes")]
    RenderNonConvergence { character: usize, attempts: u32 },
    /// A frame arrived after end-of-stream
    #[error("frame submitted after end of stream")]
    StreamFinished,
}

impl From<RenderError> for EncodeError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::NonConvergence {
                character,
                attempts,
            } => EncodeError::RenderNonConvergence {
                character,
                attempts,
            },
        }
    }
}

/// Map a quality value to a charset lifetime.
///
/// Below 1 the default lifetime is used; otherwise one frame per
/// [`QP2LAMBDA`] units, never less than one.
pub fn lifetime_from_quality(quality: i32) -> usize {
    if quality < 1 {
        DEFAULT_LIFETIME
    } else {
        ((quality / QP2LAMBDA) as usize).max(1)
    }
}

/// Settings fixed for the lifetime of an [`Encoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Frames sharing one charset
    pub lifetime: usize,
    /// 4- or 5-color output
    pub mode: ColorMode,
    /// Luma levels of the rendering palette
    pub reference: LumaReference,
}

impl EncoderConfig {
    pub fn from_quality(quality: i32, mode: ColorMode) -> Self {
        Self {
            lifetime: lifetime_from_quality(quality),
            mode,
            ..Self::default()
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            lifetime: DEFAULT_LIFETIME,
            mode: ColorMode::default(),
            reference: LumaReference::default(),
        }
    }
}

/// Multicolor charset encoder for one stream.
///
/// Frames are accumulated until `lifetime` of them are buffered; the call
/// that completes the batch returns the packed payload. Passing `None`
/// signals end of stream and flushes whatever is buffered.
pub struct Encoder<Q = LbgQuantizer> {
    lifetime: usize,
    frame_counter: usize,
    mode: ColorMode,
    reference: LumaReference,
    /// One vector per cell per buffered frame
    vectors: Vec<LumaVector>,
    codebook: Vec<LumaVector>,
    /// Codebook index per buffered cell
    assignment: Vec<u8>,
    charset: Charset,
    quantizer: Q,
    finished: bool,
    warned_undersized: bool,
}

impl Encoder<LbgQuantizer> {
    pub fn new(config: EncoderConfig) -> Self {
        Self::with_quantizer(config, LbgQuantizer::default())
    }
}

impl<Q: Quantizer> Encoder<Q> {
    pub fn with_quantizer(config: EncoderConfig, quantizer: Q) -> Self {
        let lifetime = config.lifetime.max(1);
        log::info!("charset lifetime set to {} frame(s)", lifetime);

        Self {
            lifetime,
            frame_counter: 0,
            mode: config.mode,
            reference: config.reference,
            vectors: vec![[0; VECTOR_DIM]; CELL_COUNT * lifetime],
            codebook: vec![[0; VECTOR_DIM]; CHARSET_CHARS],
            assignment: vec![0; CELL_COUNT * lifetime],
            charset: Charset::default(),
            quantizer,
            finished: false,
            warned_undersized: false,
        }
    }

    /// Frames per batch. Shortened to the buffered count at end of stream.
    pub fn lifetime(&self) -> usize {
        self.lifetime
    }

    /// Frames buffered for the current batch.
    pub fn buffered_frames(&self) -> usize {
        self.frame_counter
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn codec_tag(&self) -> u32 {
        payload::codec_tag()
    }

    /// Payload size of a full batch.
    pub fn required_size(&self) -> usize {
        payload::required_size(self.lifetime, self.mode)
    }

    /// The charset of the last completed batch.
    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    /// Codebook of the last completed batch, after clamping.
    pub fn codebook(&self) -> &[LumaVector] {
        &self.codebook
    }

    /// Character indices of the last completed batch, `CELL_COUNT` per frame.
    pub fn assignment(&self) -> &[u8] {
        &self.assignment[..self.lifetime * CELL_COUNT]
    }

    /// Submit a frame, or `None` for end of stream.
    ///
    /// Returns `Ok(Some(size))` when a batch payload of `size` bytes was
    /// written to the start of `out`, `Ok(None)` when the frame was only
    /// buffered (or the stream ended with nothing buffered).
    ///
    /// `out` must hold a full batch payload even for calls that only buffer;
    /// a short buffer is rejected before the encoder state changes.
    pub fn encode(
        &mut self,
        frame: Option<&Frame>,
        out: &mut [u8],
    ) -> Result<Option<usize>, EncodeError> {
        if self.finished {
            return match frame {
                Some(_) => Err(EncodeError::StreamFinished),
                None => Ok(None),
            };
        }

        if frame.is_none() && self.frame_counter == 0 {
            log::debug!("End of stream with no buffered frames");
            self.finished = true;
            return Ok(None);
        }

        let lifetime = match frame {
            Some(_) => self.lifetime,
            None => self.frame_counter,
        };
        let required = payload::required_size(lifetime, self.mode);
        if required > out.len() {
            log::error!(
                "buf size too small (need {}, got {})",
                required,
                out.len()
            );
            return Err(EncodeError::InsufficientOutputBuffer {
                required,
                available: out.len(),
            });
        }

        match frame {
            Some(frame) => {
                self.buffer_frame(frame);
                if self.frame_counter < self.lifetime {
                    return Ok(None);
                }
            }
            None => {
                log::info!(
                    "End of stream, flushing {} buffered frame(s)",
                    self.frame_counter
                );
                self.lifetime = self.frame_counter;
                self.finished = true;
            }
        }

        self.flush_batch(out).map(Some)
    }

    /// Like [`encode`](Self::encode), allocating the payload.
    pub fn encode_to_vec(&mut self, frame: Option<&Frame>) -> Result<Option<Vec<u8>>, EncodeError> {
        let mut out = vec![0; self.required_size()];
        Ok(self
            .encode(frame, &mut out)?
            .map(|size| {
                out.truncate(size);
                out
            }))
    }

    /// Signal end of stream.
    pub fn finish(&mut self, out: &mut [u8]) -> Result<Option<usize>, EncodeError> {
        self.encode(None, out)
    }

    fn buffer_frame(&mut self, frame: &Frame) {
        if !self.warned_undersized && blocks::is_undersized(frame) {
            log::warn!(
                "Frame {}x{} is smaller than the {}x{} canvas, uncovered cells keep stale data",
                frame.width(),
                frame.height(),
                blocks::CANVAS_WIDTH,
                blocks::CANVAS_HEIGHT
            );
            self.warned_undersized = true;
        }
        let start = self.frame_counter * CELL_COUNT;
        blocks::extract_into(frame, &mut self.vectors[start..start + CELL_COUNT]);
        self.frame_counter += 1;
    }

    fn flush_batch(&mut self, out: &mut [u8]) -> Result<usize, EncodeError> {
        let cells = self.lifetime * CELL_COUNT;
        self.frame_counter = 0;

        let distortion = self.quantizer.learn_codebook(
            &self.vectors[..cells],
            &mut self.codebook,
            &mut self.assignment[..cells],
        );
        log::debug!("Quantized {} vectors, distortion {}", cells, distortion);

        render_charset_into(&mut self.codebook, &self.reference, &mut self.charset)?;

        let size = payload::pack(
            out,
            &self.charset,
            &self.assignment[..cells],
            self.lifetime,
            self.mode,
        );
        log::info!(
            "Encoded batch of {} frame(s), {} bytes",
            self.lifetime,
            size
        );
        Ok(size)
    }
}
