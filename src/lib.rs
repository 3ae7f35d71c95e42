//! Cycle-accurate core emulator for the Sega 315-5560 MultiPCM wavetable
//! synthesis chip, as used for PCM sample playback in several mid-90s Sega
//! arcade and console sound boards.
//!
//! The chip mixes up to 28 voices, each an independently pitched, panned,
//! enveloped, and vibrato/tremolo-modulated ROM sample player, into a
//! stereo output stream. [`Chip`] is the whole core: construct one with
//! [`Chip::new`], feed it ROM data and register writes, and pull rendered
//! samples out with [`Chip::update`].
//!
//! ```
//! use multipcm::Chip;
//!
//! // `Chip::new` takes the chip's input clock in Hz; the effective output
//! // sample rate is `clock_hz / 180`.
//! let mut chip = Chip::new(4_000_000);
//! chip.alloc_rom(64 * 1024);
//!
//! // Select voice 0, register 0 (pan), then write center pan.
//! chip.write(1, 0);
//! chip.write(2, 0);
//! chip.write(0, 0x00);
//!
//! let mut left = vec![0i32; 512];
//! let mut right = vec![0i32; 512];
//! chip.update(&mut left, &mut right);
//! ```

mod chip;
mod envelope;
mod error;
mod lfo;
mod sample_table;
mod tables;
mod voice;

pub use chip::Chip;
pub use error::{MultiPcmError, Result};
pub use sample_table::SampleHeader;
pub use tables::{NUM_SAMPLES, NUM_VOICES};
