//! Per-voice envelope generator (component C).
//!
//! A four-state attenuation machine: `Attack` ramps volume up to full
//! scale, then `Decay1` falls to the sample's decay level, `Decay2` falls
//! the rest of the way (and can sit at silence indefinitely), and
//! `Release` falls to zero and signals the voice to stop.

use crate::sample_table::SampleHeader;
use crate::tables::{self, EG_MAX_VOLUME, EG_SHIFT};

/// Envelope generator state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EgState {
    /// Ramping up to full scale.
    Attack,
    /// Falling from full scale to the sample's decay level.
    Decay1,
    /// Falling from the decay level toward silence.
    Decay2,
    /// Falling toward silence after key-off.
    Release,
}

/// Per-voice envelope generator sub-state.
#[derive(Clone, Copy, Debug)]
pub struct Envelope {
    state: EgState,
    /// Current volume, Q(10.16): `0 ..= 0x3ff << EG_SHIFT`.
    volume: u32,
    ar: i64,
    d1r: i64,
    d2r: i64,
    rr: i64,
    /// `0xf - sample.dl`, cached at key-on.
    decay_level: u8,
}

impl Default for Envelope {
    fn default() -> Self {
        Envelope {
            state: EgState::Release,
            volume: 0,
            ar: 0,
            d1r: 0,
            d2r: 0,
            rr: 0,
            decay_level: 0,
        }
    }
}

impl Envelope {
    /// Computes per-voice AR/D1R/D2R/RR step rates and enters `Attack` at
    /// zero volume, per the `EG_Calc` procedure.
    pub fn key_on(&mut self, sample: &SampleHeader, regs3: u8, rate_tables: &tables::RateTables) {
        let oct_raw = (regs3 >> 4).wrapping_sub(1) & 0xf;
        let octave = if oct_raw & 0x8 != 0 {
            oct_raw as i32 - 16
        } else {
            oct_raw as i32
        };

        let rate = if sample.krs != 0xf {
            (octave + sample.krs as i32) * 2 + ((regs3 >> 3) & 1) as i32
        } else {
            0
        };

        self.ar = tables::RateTables::get_rate(&rate_tables.ar_step, rate, sample.ar);
        self.d1r = tables::RateTables::get_rate(&rate_tables.dr_step, rate, sample.dr1);
        self.d2r = tables::RateTables::get_rate(&rate_tables.dr_step, rate, sample.dr2);
        self.rr = tables::RateTables::get_rate(&rate_tables.dr_step, rate, sample.rr);
        self.decay_level = 0xf - sample.dl;
        self.volume = 0;
        self.state = EgState::Attack;
    }

    /// Enters `Release` unless the sample's release rate is `0xf`, in which
    /// case the caller should stop the voice immediately instead.
    pub fn key_off(&mut self) {
        self.state = EgState::Release;
    }

    /// Advances the envelope by one output sample and returns the current
    /// linear→exponential gain, Q(n.10).
    pub fn update(&mut self) -> i32 {
        match self.state {
            EgState::Attack => {
                self.volume = self.volume.saturating_add(self.ar as u32);
                if self.volume >= EG_MAX_VOLUME {
                    self.volume = EG_MAX_VOLUME;
                    self.state = if self.d1r >= (0x400i64 << EG_SHIFT) {
                        EgState::Decay2
                    } else {
                        EgState::Decay1
                    };
                }
            }
            EgState::Decay1 => {
                self.volume = self.volume.saturating_sub(self.d1r.max(0) as u32);
                if (self.volume >> EG_SHIFT) <= (self.decay_level as u32) << 6 {
                    self.state = EgState::Decay2;
                }
            }
            EgState::Decay2 => {
                self.volume = self.volume.saturating_sub(self.d2r.max(0) as u32);
            }
            EgState::Release => {
                self.volume = self.volume.saturating_sub(self.rr.max(0) as u32);
            }
        }

        let index = (self.volume >> EG_SHIFT).min(1023) as usize;
        tables::lin_to_exp_table()[index]
    }

    /// True once the envelope has fully released to silence; the owning
    /// voice should clear its `Playing` flag when this returns `true`.
    pub fn released_to_silence(&self) -> bool {
        self.state == EgState::Release && self.volume == 0
    }

    /// Current envelope state, for diagnostics/tests.
    pub fn state(&self) -> EgState {
        self.state
    }

    /// Current raw volume, Q(10.16), for diagnostics/tests.
    pub fn volume(&self) -> u32 {
        self.volume
    }
}
