//! Biquad filter stages
//!
//! The three stages of the chain share one second-order section. They only
//! differ in how a parameter value is turned into coefficients, so the kind
//! is a closed enum and the difference equation lives in one place.
//!
//! Coefficients follow the Audio EQ Cookbook bilinear-transform designs,
//! with the linear gain factor `g` mapped to `A = sqrt(g)`.
//! Reference: https://www.w3.org/2011/audio/audio-eq-cookbook.html

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::params::{ParamId, HIGH_PASS_SPEC};

/// Centre frequency of the treble peak (Hz)
pub const PEAK_FREQUENCY_HZ: f64 = 9000.0;

/// Q of the treble peak
pub const PEAK_Q: f64 = 0.5;

/// Shelf corner at zero roll-off (Hz)
pub const SHELF_MAX_FREQUENCY_HZ: f64 = 8000.0;

/// How far the shelf corner travels down at full roll-off (Hz)
pub const SHELF_FREQUENCY_SPAN_HZ: f64 = 7000.0;

/// Q of the high shelf
pub const SHELF_Q: f64 = 0.5;

/// Q of the high-pass (Butterworth)
pub const HIGH_PASS_Q: f64 = FRAC_1_SQRT_2;

/// Highest design frequency as a fraction of the sample rate
const MAX_FREQUENCY_RATIO: f64 = 0.49;

/// State magnitudes below this are flushed to zero
const DENORMAL_THRESHOLD: f64 = 1.0e-20;

/// Filter stage kind, in chain order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// Removes rumble below the cutoff
    HighPass,
    /// Treble presence boost around 9 kHz
    Peak,
    /// Treble roll-off shelf
    HighShelf,
}

impl FilterKind {
    /// Fixed processing order of the chain
    pub const CHAIN_ORDER: [FilterKind; 3] = [FilterKind::HighPass, FilterKind::Peak, FilterKind::HighShelf];

    /// Parameter that drives this stage
    pub fn param(self) -> ParamId {
        match self {
            FilterKind::HighPass => ParamId::HighPassCutoff,
            FilterKind::Peak => ParamId::TrebleBoost,
            FilterKind::HighShelf => ParamId::RollOff,
        }
    }

    /// Whether the stage does anything at this parameter value
    ///
    /// At its neutral value a stage is skipped entirely.
    #[inline]
    pub fn is_active(self, value: f32) -> bool {
        match self {
            FilterKind::HighPass => value > HIGH_PASS_SPEC.min,
            FilterKind::Peak | FilterKind::HighShelf => value > 0.0,
        }
    }

    /// Frequency, Q and linear gain for a parameter value
    pub fn design(self, value: f32) -> FilterDesign {
        let value = value as f64;
        match self {
            FilterKind::HighPass => FilterDesign {
                frequency: value,
                q: HIGH_PASS_Q,
                gain: 1.0,
            },
            FilterKind::Peak => FilterDesign {
                frequency: PEAK_FREQUENCY_HZ,
                q: PEAK_Q,
                gain: 1.0 + value,
            },
            FilterKind::HighShelf => FilterDesign {
                frequency: SHELF_MAX_FREQUENCY_HZ - SHELF_FREQUENCY_SPAN_HZ * value,
                q: SHELF_Q,
                gain: 1.0 - 0.5 * value,
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterKind::HighPass => "high-pass",
            FilterKind::Peak => "peak",
            FilterKind::HighShelf => "high-shelf",
        }
    }
}

/// Design targets of one stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterDesign {
    /// Cutoff, centre or corner frequency in Hz
    pub frequency: f64,
    pub q: f64,
    /// Linear gain factor (1.0 = unity)
    pub gain: f64,
}

/// Biquad filter coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
/// Normalized: all coefficients divided by a0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Pass-through coefficients
    pub const IDENTITY: BiquadCoeffs = BiquadCoeffs {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Derive coefficients for a stage kind
    ///
    /// Pure function of its arguments: identical inputs give bit-identical
    /// output. Does not allocate.
    pub fn compute(kind: FilterKind, sample_rate: f64, value: f32) -> Self {
        let design = kind.design(value);

        // Keep the design frequency below Nyquist. The upper bound never drops
        // under the lower one, even for nonsense rates.
        let max_freq = (sample_rate * MAX_FREQUENCY_RATIO).max(1.0);
        let freq = design.frequency.clamp(1.0, max_freq);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * design.q);
        let a = design.gain.max(1.0e-6).sqrt();

        let (b0, b1, b2, a0, a1, a2) = match kind {
            FilterKind::HighPass => (
                (1.0 + cos_w0) / 2.0,
                -(1.0 + cos_w0),
                (1.0 + cos_w0) / 2.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterKind::Peak => (
                1.0 + alpha * a,
                -2.0 * cos_w0,
                1.0 - alpha * a,
                1.0 + alpha / a,
                -2.0 * cos_w0,
                1.0 - alpha / a,
            ),
            FilterKind::HighShelf => {
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                    (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                    (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
                )
            }
        };

        BiquadCoeffs {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Magnitude of the frequency response at `freq` (linear)
    pub fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * freq / sample_rate;
        let (cos1, sin1) = (w.cos(), w.sin());
        let (cos2, sin2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * cos1 + self.b2 * cos2;
        let num_im = -(self.b1 * sin1 + self.b2 * sin2);
        let den_re = 1.0 + self.a1 * cos1 + self.a2 * cos2;
        let den_im = -(self.a1 * sin1 + self.a2 * sin2);

        (num_re.hypot(num_im)) / (den_re.hypot(den_im))
    }

    /// Both poles strictly inside the unit circle
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }
}

/// Derive the coefficients of one stage. See [`BiquadCoeffs::compute`].
#[inline]
pub fn compute_coefficients(kind: FilterKind, sample_rate: f64, value: f32) -> BiquadCoeffs {
    BiquadCoeffs::compute(kind, sample_rate, value)
}

/// Delay memory of one stage on one channel
///
/// Transposed direct form II: two registers carry the filter across block
/// boundaries. Registers that decay below the denormal threshold are zeroed
/// after every sample, so the output does not depend on block boundaries.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadState {
    s1: f64,
    s2: f64,
}

impl BiquadState {
    #[inline]
    pub fn process_sample(&mut self, input: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output = coeffs.b0 * input + self.s1;
        self.s1 = coeffs.b1 * input - coeffs.a1 * output + self.s2;
        self.s2 = coeffs.b2 * input - coeffs.a2 * output;
        self.flush_denormals();
        output
    }

    /// Filter a contiguous run of samples in place
    pub fn process_block(&mut self, coeffs: &BiquadCoeffs, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample = self.process_sample(*sample as f64, coeffs) as f32;
        }
    }

    /// Filter one channel of an interleaved buffer in place
    pub fn process_interleaved(
        &mut self,
        coeffs: &BiquadCoeffs,
        samples: &mut [f32],
        channel: usize,
        num_channels: usize,
    ) {
        for sample in samples.iter_mut().skip(channel).step_by(num_channels) {
            *sample = self.process_sample(*sample as f64, coeffs) as f32;
        }
    }

    pub fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }

    /// No residual energy in the delay memory
    pub fn is_cleared(&self) -> bool {
        self.s1 == 0.0 && self.s2 == 0.0
    }

    #[inline]
    fn flush_denormals(&mut self) {
        if self.s1.abs() < DENORMAL_THRESHOLD {
            self.s1 = 0.0;
        }
        if self.s2.abs() < DENORMAL_THRESHOLD {
            self.s2 = 0.0;
        }
    }
}

/// Apply one stage to a buffer, reading and writing its delay memory
#[inline]
pub fn process_block(coeffs: &BiquadCoeffs, state: &mut BiquadState, samples: &mut [f32]) {
    state.process_block(coeffs, samples);
}
