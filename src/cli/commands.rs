//! Subcommand handlers for encode, info and config actions.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use super::args::{ConfigAction, EncodeArgs};
use crate::blocks::{CANVAS_HEIGHT, CANVAS_WIDTH, CELLS_X, CELLS_Y};
use crate::config::{default_path as get_config_path, Config, ConfigError, DEFAULT_CONFIG};
use crate::encoder::{lifetime_from_quality, EncodeError, Encoder};
use crate::frame::{Frame, FrameError};
use crate::payload::{self, ColorMode, FORMAT_TAG};
use crate::quantizer::LbgQuantizer;

/// Global flag indicating Ctrl+C was received
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Check if Ctrl+C was received.
pub fn ctrlc_received() -> bool {
    CTRLC_RECEIVED.load(Ordering::SeqCst)
}

/// Set up the Ctrl+C handler.
///
/// This should be called once at program startup.
pub fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        CTRLC_RECEIVED.store(true, Ordering::SeqCst);
        eprintln!("\nReceived Ctrl+C, flushing buffered frames...");
    })
}

/// Errors surfaced by the CLI handlers.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid frame geometry: {0}")]
    Frame(#[from] FrameError),
    #[error("Encoding failed: {0}")]
    Encode(#[from] EncodeError),
    #[error("{0}")]
    Invalid(String),
}

/// Totals reported after an encode run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSummary {
    pub frames: usize,
    pub batches: usize,
    pub bytes: usize,
}

/// Read one frame into `buf`.
///
/// Returns `Ok(false)` at end of input. A trailing partial frame is dropped.
fn read_frame(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    if filled > 0 && filled < buf.len() {
        log::warn!(
            "Dropping trailing partial frame ({} of {} bytes)",
            filled,
            buf.len()
        );
    }
    Ok(filled == buf.len() && filled > 0)
}

fn open_input(path: &Path) -> io::Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        Ok(Box::new(io::stdin().lock()))
    } else {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

fn open_output(path: &Path) -> io::Result<Box<dyn Write>> {
    if path.as_os_str() == "-" {
        Ok(Box::new(io::stdout().lock()))
    } else {
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }
}

/// Encode every frame of `reader` into `writer`.
///
/// Merges settings with CLI args > config file > built-in defaults.
pub fn encode_stream(
    args: &EncodeArgs,
    config: &Config,
    reader: &mut impl Read,
    writer: &mut impl Write,
) -> Result<EncodeSummary, CliError> {
    let stride = args.stride.unwrap_or(args.width as usize);
    if stride < args.width as usize {
        return Err(FrameError::StrideTooNarrow {
            stride,
            width: args.width,
        }
        .into());
    }
    let frame_bytes = stride * args.height as usize;
    if frame_bytes == 0 {
        return Err(CliError::Invalid(
            "frame width and height must be greater than 0".to_string(),
        ));
    }

    let mut encoder_config = config.encoder_config()?;
    if let Some(quality) = args.quality {
        encoder_config.lifetime = lifetime_from_quality(quality);
    }
    if let Some(lifetime) = args.lifetime {
        encoder_config.lifetime = lifetime;
    }
    if let Some(mode) = args.mode {
        encoder_config.mode = mode;
    }
    let quantizer = LbgQuantizer::new(
        args.steps.unwrap_or(config.quantizer.steps),
        args.seed.unwrap_or(config.quantizer.seed),
    );

    let mut encoder = Encoder::with_quantizer(encoder_config, quantizer);
    let mut out = vec![0u8; encoder.required_size()];
    let mut buf = vec![0u8; frame_bytes];
    let mut summary = EncodeSummary::default();

    log::info!(
        "Encoding {}x{} gray8 input, mode {}",
        args.width,
        args.height,
        encoder.mode().name()
    );

    while !ctrlc_received() && read_frame(reader, &mut buf)? {
        let frame = Frame::with_stride(std::mem::take(&mut buf), args.width, args.height, stride)?;
        if let Some(size) = encoder.encode(Some(&frame), &mut out)? {
            writer.write_all(&out[..size])?;
            summary.batches += 1;
            summary.bytes += size;
        }
        summary.frames += 1;
        buf = frame.into_data();
    }

    if let Some(size) = encoder.finish(&mut out)? {
        writer.write_all(&out[..size])?;
        summary.batches += 1;
        summary.bytes += size;
    }
    writer.flush()?;

    log::info!(
        "Wrote {} frame(s) in {} batch(es), {} bytes",
        summary.frames,
        summary.batches,
        summary.bytes
    );
    Ok(summary)
}

/// Run the encode subcommand against files or stdio.
pub fn run_encode(args: &EncodeArgs, config: &Config) -> Result<EncodeSummary, CliError> {
    let mut reader = open_input(&args.input)?;
    let mut writer = open_output(&args.output)?;
    encode_stream(args, config, &mut reader, &mut writer)
}

/// Print stream geometry and payload sizes.
pub fn show_info(config: &Config, lifetime: Option<usize>, mode: Option<ColorMode>) {
    let lifetime = lifetime.unwrap_or_else(|| config.lifetime()).max(1);
    let mode = mode.unwrap_or(config.encoder.mode);

    println!("Format tag: {}", String::from_utf8_lossy(&FORMAT_TAG));
    println!("Codec tag: 0x{:08x}", payload::codec_tag());
    println!("Canvas: {}x{} pixels", CANVAS_WIDTH, CANVAS_HEIGHT);
    println!("Screen: {}x{} characters", CELLS_X, CELLS_Y);
    println!("Mode: {}", mode.name());
    println!("Lifetime: {} frame(s)", lifetime);
    println!("Frame block: {} bytes", mode.frame_size());
    println!(
        "Batch payload: {} bytes",
        payload::required_size(lifetime, mode)
    );
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, config_path: Option<&Path>) -> Result<(), CliError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    match action {
        ConfigAction::Show => {
            let config = Config::load(Some(&path))?;
            println!("Current configuration:");
            println!("  Lifetime: {} frame(s)", config.lifetime());
            println!("  Quality: {}", config.encoder.quality);
            println!("  Mode: {}", config.encoder.mode.name());
            println!("  Quantizer steps: {}", config.quantizer.steps);
            println!("  Quantizer seed: {}", config.quantizer.seed);
            println!("  Palette gradient: {:?}", config.palette.gradient);
            println!();

            if path.exists() {
                println!("Config file: {} (exists)", path.display());
            } else {
                println!("Config file: {} (not found)", path.display());
            }
        }
        ConfigAction::Init => {
            if path.exists() {
                return Err(CliError::Invalid(format!(
                    "Config file already exists: {}\nUse 'a64enc config show' to view current settings.",
                    path.display()
                )));
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, DEFAULT_CONFIG)?;

            println!("Created config file: {}", path.display());
        }
    }
    Ok(())
}
