//! Chip façade (component F): registers, ports, banking, and the render
//! loop that drives all 28 voices.
//!
//! The external bus has three ports:
//!
//! - port 0 writes `value` into the currently addressed voice/register pair
//!   (ignored while no voice is selected)
//! - port 1 selects the current voice, through the 28-of-32
//!   [`tables::VAL2CHAN`] mapping the quick-write port also uses
//! - port 2 selects the current register, clamped to `0..=7`
//!
//! [`Chip::write_quick`] is a fourth, stateless path: it packs voice and
//! register selection into one byte alongside the data byte, bypassing the
//! two addressing registers above entirely.

use crate::error::{MultiPcmError, Result};
use crate::sample_table::{self, SampleHeader};
use crate::tables::{self, RateTables, NUM_SAMPLES, NUM_VOICES, SAMPLE_HEADER_BYTES};
use crate::voice::Voice;

/// Largest ROM image the chip's 24-bit address bus can cover.
const MAX_ROM_SIZE: usize = 1 << 24;

/// A Sega 315-5560 MultiPCM core: 28 voices sharing one ROM image, banking
/// registers, and rate-dependent lookup tables.
pub struct Chip {
    sample_table: [SampleHeader; NUM_SAMPLES],
    voices: [Voice; NUM_VOICES],
    cur_voice: Option<usize>,
    address: u8,
    rom: Vec<u8>,
    rom_mask: u32,
    bank_l: u32,
    bank_r: u32,
    rate: u32,
    rate_tables: RateTables,
    /// Per-voice mute bits, one per voice (bit `i` mutes voice `i`).
    mute_mask: u32,
}

impl Chip {
    /// Builds a chip clocked at `clock_hz`, with an empty ROM. The
    /// effective output sample rate is `clock_hz / 180`.
    ///
    /// Unlike the hardware (and unlike a typical `handle`-based C binding),
    /// construction is infallible and there is no paired `destroy`: dropping
    /// the `Chip` releases its ROM buffer automatically.
    pub fn new(clock_hz: u32) -> Self {
        let rate = (clock_hz / 180).max(1);
        let mut chip = Chip {
            sample_table: [SampleHeader::default(); NUM_SAMPLES],
            voices: std::array::from_fn(|_| Voice::default()),
            cur_voice: None,
            address: 0,
            rom: Vec::new(),
            rom_mask: 0,
            bank_l: 0,
            bank_r: 0,
            rate,
            rate_tables: RateTables::new(rate),
            mute_mask: 0,
        };
        chip.reset();
        chip
    }

    /// Stops every voice. Registers, addressing state, ROM, the sample
    /// table, bank bases, and the mute mask are left untouched.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.stop();
        }
    }

    /// Writes `value` to bus `port` (0: data, 1: voice select, 2: register
    /// select). Unrecognized ports are ignored.
    pub fn write(&mut self, port: u8, value: u8) {
        match port {
            0 => {
                if let Some(slot) = self.cur_voice {
                    self.write_slot(slot, self.address, value);
                }
            }
            1 => {
                let slot = tables::VAL2CHAN[(value & 0x1f) as usize];
                self.cur_voice = if slot >= 0 { Some(slot as usize) } else { None };
            }
            2 => self.address = value.min(7),
            _ => {}
        }
    }

    /// Packed single-write form: bits 3..7 of `packed` select the voice
    /// through [`tables::VAL2CHAN`], bits 0..2 select the register. Bypasses
    /// the stateful voice/register pointers used by [`Chip::write`].
    pub fn write_quick(&mut self, packed: u8, value: u8) {
        let slot = tables::VAL2CHAN[((packed >> 3) & 0x1f) as usize];
        if slot < 0 {
            return;
        }
        self.write_slot(slot as usize, packed & 0x7, value);
    }

    /// Reads from bus `port`. The real chip's bus is write-only; this
    /// always returns `0`.
    pub fn read(&self, _port: u8) -> u8 {
        0
    }

    /// Sets both ROM bank bases at once, as raw 24-bit addresses.
    pub fn set_bank(&mut self, left: u32, right: u32) {
        self.bank_l = left;
        self.bank_r = right;
    }

    /// Sets one or both ROM bank bases from a 16-bit `word`, shifted left
    /// 16 to form the bank's address: bit 0 of `selector` updates the left
    /// bank, bit 1 updates the right bank (both if both bits are set).
    pub fn bank_write(&mut self, selector: u8, word: u32) {
        let base = word << 16;
        if selector & 0x1 != 0 {
            self.bank_l = base;
        }
        if selector & 0x2 != 0 {
            self.bank_r = base;
        }
    }

    /// Allocates a ROM image of `size` bytes, filled with `0xff` (the erased
    /// state of real ROM/flash), clamping `size` to the chip's 24-bit
    /// address window. Use [`Chip::try_alloc_rom`] to be told about an
    /// oversized request instead.
    pub fn alloc_rom(&mut self, size: usize) {
        let _ = self.try_alloc_rom(size.min(MAX_ROM_SIZE));
    }

    /// Fallible form of [`Chip::alloc_rom`]: errors instead of clamping when
    /// `size` exceeds the 24-bit address window.
    pub fn try_alloc_rom(&mut self, size: usize) -> Result<()> {
        if size > MAX_ROM_SIZE {
            return Err(MultiPcmError::RomTooLarge {
                size,
                max: MAX_ROM_SIZE,
            });
        }
        if size == self.rom.len() {
            return Ok(());
        }
        self.rom = vec![0xffu8; size];
        self.rom_mask = size.saturating_sub(1).next_power_of_two().saturating_sub(1) as u32;
        self.reparse_sample_table();
        Ok(())
    }

    /// Copies `bytes[..length]` into the ROM image at `offset`, clamped to
    /// the allocated ROM's bounds. Reparses the sample header table if the
    /// write overlaps it.
    pub fn write_rom(&mut self, offset: usize, length: usize, bytes: &[u8]) {
        let end = offset.saturating_add(length).min(self.rom.len());
        let start = offset.min(end);
        let copy_len = (end - start).min(bytes.len());
        self.rom[start..start + copy_len].copy_from_slice(&bytes[..copy_len]);

        if start < SAMPLE_HEADER_BYTES {
            self.reparse_sample_table();
        }
    }

    /// Sets the per-voice mute mask (bit `i` mutes voice `i`).
    pub fn set_mute_mask(&mut self, mask: u32) {
        self.mute_mask = mask;
        for (i, voice) in self.voices.iter_mut().enumerate() {
            voice.set_muted(self.mute_mask & (1 << i) != 0);
        }
    }

    /// Renders `out_l.len().min(out_r.len())` samples. Overwrites the
    /// caller-supplied buffers rather than mixing into them; a host wanting
    /// additive mixing across multiple chips accumulates the results itself.
    pub fn update(&mut self, out_l: &mut [i32], out_r: &mut [i32]) {
        let len = out_l.len().min(out_r.len());
        for i in 0..len {
            let mut left = 0i32;
            let mut right = 0i32;
            for voice in &mut self.voices {
                let (l, r) = voice.process(&self.rom, self.rom_mask);
                left = left.saturating_add(l);
                right = right.saturating_add(r);
            }
            out_l[i] = left;
            out_r[i] = right;
        }
    }

    fn reparse_sample_table(&mut self) {
        self.sample_table = sample_table::parse_sample_table(&self.rom);
    }

    fn write_slot(&mut self, slot: usize, reg: u8, data: u8) {
        let voice = &mut self.voices[slot];
        match reg {
            0 => voice.set_pan(data),
            1 => voice.select_sample(data, &self.sample_table, self.rate),
            2 | 3 => voice.set_pitch(reg, data, &self.rate_tables, self.rate),
            4 => voice.write_key_control(data, self.bank_l, self.bank_r, &self.rate_tables),
            5 => voice.set_tl(data, &self.rate_tables),
            6 => voice.set_lfo_freq_and_pitch_depth(data, self.rate),
            7 => voice.set_amp_depth(data, self.rate),
            _ => {}
        }
    }
}
