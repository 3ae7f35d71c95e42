//! Fixed-point primitives and lookup tables (component A).
//!
//! Two families of table live here:
//!
//! - Process-wide tables (pan/volume, linear→exponential, LFO triangle and
//!   scale tables) that do not depend on the chip's configured sample rate.
//!   These are built once behind [`std::sync::OnceLock`], matching the
//!   "global tables with first-use initialization" note in the original
//!   engine.
//! - Per-chip tables (FNS pitch table, EG attack/decay step tables) that are
//!   computed in [`crate::chip::Chip::new`] and stored on the chip itself,
//!   since the FNS table is parameterized by the chip's output rate.

use std::sync::OnceLock;

/// Fixed-point shift for voice phase, TL and the pan/volume LUT: Q(n.12).
pub const SHIFT: u32 = 12;
/// Fixed-point shift for envelope generator volume: Q(10.16).
pub const EG_SHIFT: u32 = 16;
/// Fixed-point shift for LFO phase and scale tables: Q(n.8).
pub const LFO_SHIFT: u32 = 8;
/// Fixed-point shift of the linear→exponential gain table (consumed with `>> 10`).
pub const EG_GAIN_SHIFT: u32 = 10;

/// Number of synthesis voices per chip.
pub const NUM_VOICES: usize = 28;
/// Number of sample descriptors parsed from ROM.
pub const NUM_SAMPLES: usize = 512;
/// Byte length of the sample header region at the start of ROM (512 × 12).
pub const SAMPLE_HEADER_BYTES: usize = NUM_SAMPLES * 12;

/// Maximum envelope volume, `0x3ff << EG_SHIFT`.
pub const EG_MAX_VOLUME: u32 = 0x3ff << EG_SHIFT;

/// LFO modulation depths, in cents, indexed by the 3-bit PLFO depth field.
const PSCALE_CENTS: [f64; 8] = [0.0, 3.378, 5.065, 6.750, 10.114, 20.170, 40.180, 79.307];
/// LFO modulation depths, in dB, indexed by the 3-bit ALFO depth field.
const ASCALE_DB: [f64; 8] = [0.0, 0.4, 0.8, 1.5, 3.0, 6.0, 12.0, 24.0];
/// LFO frequencies in Hz, indexed by the 3-bit frequency field of register 6.
pub const LFO_FREQ_HZ: [f64; 8] = [0.168, 2.019, 3.196, 4.206, 5.215, 5.888, 6.224, 7.066];

#[inline]
fn db_to_gain(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// The 28-of-32 slot-select mapping used by register port 1 and the
/// quick-write port. Every 8th entry is a gap that resolves to "no voice".
pub const VAL2CHAN: [i8; 32] = [
    0, 1, 2, 3, 4, 5, 6, -1, 7, 8, 9, 10, 11, 12, 13, -1, 14, 15, 16, 17, 18, 19, 20, -1, 21, 22,
    23, 24, 25, 26, 27, -1,
];

/// Milliseconds-per-envelope-segment reference curve used to derive the
/// attack/decay step tables.
///
/// The reference description gives the shape of this table (entries 0..3 are
/// zero, entry 63 is a fast "sentinel" value) but not its literal contents,
/// and the original source was not recoverable from the retrieval pack. The
/// curve below halves roughly every 4 steps, which keeps the table strictly
/// decreasing (faster envelopes at higher indices) and puts entry 63 at a
/// small, finite, nonzero duration so `DRStep[63]` stays computable without
/// a divide-by-zero. See DESIGN.md for the rationale.
fn base_times() -> [f64; 64] {
    let mut table = [0.0f64; 64];
    for (i, slot) in table.iter_mut().enumerate().skip(4) {
        let exponent = (i as f64 - 4.0) / 4.0;
        *slot = 6300.0 / 2f64.powf(exponent);
    }
    table
}

/// Pan/volume LUT: `2048` entries of `[left, right]` gain pairs in Q(n.12),
/// indexed by `(pan << 7) | tl`.
pub fn pan_volume_table() -> &'static [[i32; 2]] {
    static TABLE: OnceLock<Vec<[i32; 2]>> = OnceLock::new();
    TABLE.get_or_init(build_pan_volume_table)
}

fn build_pan_volume_table() -> Vec<[i32; 2]> {
    let mut table = vec![[0i32; 2]; 2048];
    let scale = (1i64 << SHIFT) as f64 * 0.25;

    for pan in 0u32..16 {
        for tl in 0u32..128 {
            let index = ((pan << 7) | tl) as usize;
            let tl_db = tl as f64 * (-24.0 / 64.0);

            let (left_gain, right_gain) = if pan == 0x8 {
                (0.0, 0.0)
            } else if pan == 0 {
                let g = db_to_gain(tl_db);
                (g, g)
            } else if pan & 0x8 != 0 {
                let right_db = (0x10 - pan) as f64 * (-12.0 / 4.0);
                let right = if pan & 0x7 == 7 {
                    0.0
                } else {
                    db_to_gain(tl_db + right_db)
                };
                (db_to_gain(tl_db), right)
            } else {
                let left_db = pan as f64 * (-12.0 / 4.0);
                let left = if pan & 0x7 == 7 {
                    0.0
                } else {
                    db_to_gain(tl_db + left_db)
                };
                (left, db_to_gain(tl_db))
            };

            table[index] = [(left_gain * scale).round() as i32, (right_gain * scale).round() as i32];
        }
    }
    table
}

/// Linear→exponential gain LUT: `1024` entries in Q(n.10).
pub fn lin_to_exp_table() -> &'static [i32] {
    static TABLE: OnceLock<Vec<i32>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = vec![0i32; 1024];
        let scale = (1i64 << EG_GAIN_SHIFT) as f64;
        for (i, slot) in table.iter_mut().enumerate() {
            let db = -96.0 + 96.0 * i as f64 / 1024.0;
            *slot = (db_to_gain(db) * scale).round() as i32;
        }
        table
    })
}

/// Pitch LFO triangle table: signed `[-128, 126]` across 256 phase steps.
pub fn plfo_triangle() -> &'static [i32; 256] {
    static TABLE: OnceLock<[i32; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0i32; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let folded = if i < 128 { i as i32 } else { 255 - i as i32 };
            *slot = folded * 2 - 128;
        }
        table
    })
}

/// Amplitude LFO triangle table: unsigned `[0, 254]` across 256 phase steps.
pub fn alfo_triangle() -> &'static [i32; 256] {
    static TABLE: OnceLock<[i32; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0i32; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let folded = if i < 128 { i as i32 } else { 255 - i as i32 };
            *slot = folded * 2;
        }
        table
    })
}

/// Pitch LFO depth-scaling tables: `8` depths × `256` triangle values, in
/// Q(n.8), converted from cents via `2^(cents/1200)`.
pub fn pscales() -> &'static [[i32; 256]] {
    static TABLE: OnceLock<Vec<[i32; 256]>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut out = vec![[0i32; 256]; 8];
        let scale = (1i64 << LFO_SHIFT) as f64;
        for (depth, row) in out.iter_mut().enumerate() {
            for (x, slot) in row.iter_mut().enumerate() {
                let signed = x as f64 - 128.0;
                let cents = PSCALE_CENTS[depth] * signed / 128.0;
                let mult = 2f64.powf(cents / 1200.0);
                *slot = (mult * scale).round() as i32;
            }
        }
        out
    })
}

/// Amplitude LFO depth-scaling tables: `8` depths × `256` triangle values,
/// in Q(n.8), converted from dB via `10^(db/20)`.
pub fn ascales() -> &'static [[i32; 256]] {
    static TABLE: OnceLock<Vec<[i32; 256]>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut out = vec![[0i32; 256]; 8];
        let scale = (1i64 << LFO_SHIFT) as f64;
        for (depth, row) in out.iter_mut().enumerate() {
            for (x, slot) in row.iter_mut().enumerate() {
                let db = -ASCALE_DB[depth] * x as f64 / 256.0;
                *slot = (db_to_gain(db) * scale).round() as i32;
            }
        }
        out
    })
}

/// Per-chip rate-dependent tables, computed once in [`crate::chip::Chip::new`].
#[derive(Clone)]
pub struct RateTables {
    /// FNS (frequency number → step) table, 1024 entries, Q(n.12).
    pub fns_table: Vec<u64>,
    /// Attack-rate step table, 64 entries, Q(10.16) per sample.
    pub ar_step: [i64; 64],
    /// Decay-rate step table (used for both DR1 and DR2 and RR), 64 entries.
    pub dr_step: [i64; 64],
    /// TL interpolation step when ramping downward (more negative TL).
    pub tl_step_down: i32,
    /// TL interpolation step when ramping upward (less negative TL).
    pub tl_step_up: i32,
}

impl RateTables {
    /// Builds the FNS and EG step tables for a chip running at `rate` Hz.
    pub fn new(rate: u32) -> Self {
        Self {
            fns_table: build_fns_table(rate),
            ar_step: build_ar_step(),
            dr_step: build_dr_step(),
            tl_step_down: tl_step(-1.0, 78.2),
            tl_step_up: tl_step(1.0, 78.2 * 2.0),
        }
    }

    /// Looks up the effective AR/D1R/D2R/RR step for a 4-bit register value
    /// and a computed rate offset, per the `Get_RATE` helper.
    pub fn get_rate(table: &[i64; 64], rate: i32, val: u8) -> i64 {
        if val == 0 {
            return table[0];
        }
        if val == 0xf {
            return table[0x3f];
        }
        let idx = (4 * val as i32 + rate).clamp(0, 0x3f) as usize;
        table[idx]
    }
}

fn build_fns_table(rate: u32) -> Vec<u64> {
    (0u64..1024)
        .map(|i| ((rate as u64 * (1024 + i)) << SHIFT) / 1024)
        .collect()
}

/// `ARStep` formula, before the `ARStep[0..3]=0` /
/// `ARStep[63]=0x400<<EG_SHIFT` overrides are applied. `DRStep` is derived
/// from this same un-overridden curve.
fn raw_ar_step() -> [i64; 64] {
    let times = base_times();
    let mut table = [0i64; 64];
    for (i, slot) in table.iter_mut().enumerate() {
        if times[i] <= 0.0 {
            *slot = 0;
            continue;
        }
        let samples_per_segment = times[i] * 44100.0 / 1000.0;
        *slot = ((0x400i64 << EG_SHIFT) as f64 / samples_per_segment).round() as i64;
    }
    table
}

fn build_ar_step() -> [i64; 64] {
    let mut table = raw_ar_step();
    table[0] = 0;
    table[1] = 0;
    table[2] = 0;
    table[3] = 0;
    table[63] = 0x400i64 << EG_SHIFT;
    table
}

fn build_dr_step() -> [i64; 64] {
    let ar = raw_ar_step();
    let mut table = [0i64; 64];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = (ar[i] as f64 / 14.32833).round() as i64;
    }
    table[0] = 0;
    table[1] = 0;
    table[2] = 0;
    table[3] = 0;
    table
}

fn tl_step(sign: f64, ms: f64) -> i32 {
    let samples = ms * 44100.0 / 1000.0;
    (sign * (0x80i64 << SHIFT) as f64 / samples).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn val2chan_maps_28_of_32_slots() {
        let valid: Vec<i8> = VAL2CHAN.iter().copied().filter(|&v| v >= 0).collect();
        assert_eq!(valid.len(), 28);
        assert_eq!(valid, (0..28).collect::<Vec<i8>>());
        assert_eq!(VAL2CHAN[7], -1);
        assert_eq!(VAL2CHAN[15], -1);
        assert_eq!(VAL2CHAN[23], -1);
        assert_eq!(VAL2CHAN[31], -1);
    }

    #[test]
    fn pan_zero_is_centered_and_unattenuated_by_pan() {
        let table = pan_volume_table();
        let idx_full = (0u32 << 7 | 127) as usize;
        let [l, r] = table[idx_full];
        assert_eq!(l, r);
        assert!(l > 0);
    }

    #[test]
    fn pan_eight_is_fully_muted() {
        let table = pan_volume_table();
        for tl in 0..128u32 {
            let [l, r] = table[(0x8u32 << 7 | tl) as usize];
            assert_eq!(l, 0);
            assert_eq!(r, 0);
        }
    }

    #[test]
    fn pan_low_three_bits_seven_mutes_one_side() {
        let table = pan_volume_table();
        // pan = 0x7: left-attenuating family, low 3 bits == 7 -> left muted.
        let [l, r] = table[(0x7u32 << 7 | 0) as usize];
        assert_eq!(l, 0);
        assert!(r > 0);
        // pan = 0xf: right-attenuating family, low 3 bits == 7 -> right muted.
        let [l2, r2] = table[(0xfu32 << 7 | 0) as usize];
        assert!(l2 > 0);
        assert_eq!(r2, 0);
    }

    #[test]
    fn lin_to_exp_table_is_monotonic_and_near_unity_at_top() {
        let table = lin_to_exp_table();
        for w in table.windows(2) {
            assert!(w[1] >= w[0]);
        }
        let top = table[1023] as f64 / (1i64 << EG_GAIN_SHIFT) as f64;
        assert_relative_eq!(top, 1.0, epsilon = 0.01);
    }

    #[test]
    fn triangle_tables_span_expected_ranges() {
        let p = plfo_triangle();
        assert_eq!(p[0], -128);
        assert!(p.iter().all(|&v| (-128..=127).contains(&v)));

        let a = alfo_triangle();
        assert_eq!(a[0], 0);
        assert!(a.iter().all(|&v| (0..=255).contains(&v)));
    }

    #[test]
    fn pscale_and_ascale_depth_zero_is_identity() {
        let p = pscales();
        let a = ascales();
        let unity = 1i64 << LFO_SHIFT;
        for x in 0..256usize {
            assert_eq!(p[0][x] as i64, unity);
            assert_eq!(a[0][x] as i64, unity);
        }
    }

    #[test]
    fn ar_step_overrides_match_spec() {
        let ar = build_ar_step();
        assert_eq!(ar[0], 0);
        assert_eq!(ar[1], 0);
        assert_eq!(ar[2], 0);
        assert_eq!(ar[3], 0);
        assert_eq!(ar[63], 0x400i64 << EG_SHIFT);
    }

    #[test]
    fn dr_step_zero_overrides_match_spec() {
        let dr = build_dr_step();
        assert_eq!(dr[0], 0);
        assert_eq!(dr[1], 0);
        assert_eq!(dr[2], 0);
        assert_eq!(dr[3], 0);
        assert!(dr[63] > 0);
    }

    #[test]
    fn tl_steps_ramp_down_faster_than_up() {
        let tables = RateTables::new(44_100);
        assert!(tables.tl_step_down < 0);
        assert!(tables.tl_step_up > 0);
        assert!((tables.tl_step_up as f64 / tables.tl_step_down as f64).abs() < 0.6);
    }

    #[test]
    fn fns_table_increases_with_index() {
        let tables = RateTables::new(22_050);
        for w in tables.fns_table.windows(2) {
            assert!(w[1] >= w[0]);
        }
    }
}
