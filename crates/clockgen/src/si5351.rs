//! Si5351 PLL/MultiSynth register arithmetic.
//!
//! Pure combinational code — no I²C, no state — deliberately kept separate
//! from [`crate::controller`] so the arithmetic can be property-tested in
//! isolation against the multiplier decomposition round-trip property.

/// I²C address of the clock generator (7-bit).
pub const I2C_ADDR: u8 = 0x60;

/// Crystal reference frequency driving both PLLs.
pub const XTAL_HZ: u32 = platform::config::SI5351_CRYSTAL_HZ;

/// Status register (loss-of-lock bits, device status).
pub const REG_STATUS: u8 = 0;
/// Loss-of-lock bit for PLL A within [`REG_STATUS`].
pub const LOL_A_MASK: u8 = 0x20;

/// Output-enable control register for CLK0 (ADC clock).
pub const REG_CLK0_CONTROL: u8 = 16;
/// Output-enable control register for CLK1 (unused by this board).
pub const REG_CLK1_CONTROL: u8 = 17;
/// Output-enable control register for CLK2 (secondary/boot-probe clock).
pub const REG_CLK2_CONTROL: u8 = 18;

/// PLL A synthesizer register block (feeds CLK0 via MS0).
pub const REG_SYNTH_PLL_A: u8 = 26;
/// PLL B synthesizer register block (feeds CLK2 via MS2).
pub const REG_SYNTH_PLL_B: u8 = 34;
/// MultiSynth 0 register block (CLK0 divider).
pub const REG_SYNTH_MS0: u8 = 42;
/// MultiSynth 2 register block (CLK2 divider).
pub const REG_SYNTH_MS2: u8 = 58;

/// PLL soft-reset register.
pub const REG_PLL_RESET: u8 = 177;
/// Reset-PLL-A bit within [`REG_PLL_RESET`].
pub const PLL_RESET_A_BIT: u8 = 0x20;
/// Reset-PLL-B bit within [`REG_PLL_RESET`].
pub const PLL_RESET_B_BIT: u8 = 0x80;

/// `2^20 - 1`, the fixed MultiSynth fractional denominator.
pub const FRAC_DENOM: u32 = (1 << 20) - 1;

/// `(mult, num, denom)` PLL feedback-multiplier decomposition, and the
/// derived `(P1, P2, P3)` MultiSynth register fields.
///
/// Integer-only callers (the MultiSynth output divider) pass `num = 0`,
/// `denom = 1`; the P1/P2/P3 formula degenerates correctly to the classic
/// `P1 = 128 * divider - 512` integer-mode form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllParams {
    /// Integer feedback multiplier (or output divider, for MultiSynth).
    pub mult: u32,
    /// Fractional numerator.
    pub num: u32,
    /// Fractional denominator (always [`FRAC_DENOM`] unless integer mode).
    pub denom: u32,
    /// MultiSynth register field P1 (20 bits, low 18 used).
    pub p1: u32,
    /// MultiSynth register field P2 (20 bits).
    pub p2: u32,
    /// MultiSynth register field P3 (20 bits).
    pub p3: u32,
}

/// Decompose a target PLL VCO frequency into feedback-multiplier fields.
///
/// `pll_freq = xtal * (mult + num/denom)`. Callers that need an
/// integer-only MultiSynth divider instead of a PLL multiplier pass
/// `pll_freq` as the divider value directly with an implicit `xtal = 1`
/// via [`multisynth_params`].
#[must_use]
pub fn decompose(pll_freq: u32, xtal: u32) -> PllParams {
    let mult = pll_freq / xtal;
    let remainder = pll_freq % xtal;
    let num = (u64::from(remainder) * u64::from(FRAC_DENOM) / u64::from(xtal)) as u32;
    let denom = FRAC_DENOM;
    build_params(mult, num, denom)
}

/// Integer-only MultiSynth divider fields (`P2 = 0`, `P3 = 1`).
#[must_use]
pub fn multisynth_params(divider: u32) -> PllParams {
    build_params(divider, 0, 1)
}

fn build_params(mult: u32, num: u32, denom: u32) -> PllParams {
    let floor_term = u64::from(128) * u64::from(num) / u64::from(denom);
    let p1 = 128 * mult + u32::try_from(floor_term).unwrap_or(u32::MAX) - 512;
    let p2 = 128 * num - denom * u32::try_from(floor_term).unwrap_or(u32::MAX);
    let p3 = denom;
    PllParams {
        mult,
        num,
        denom,
        p1,
        p2,
        p3,
    }
}

/// R-divider stage: a power-of-two pre-divider (1..128) applied ahead of
/// the MultiSynth output so the synth's own divider stays in its valid
/// (≥ 1 MHz pre-divider output) range for low target frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RDivider {
    /// The divider ratio itself (1, 2, 4, ... 128).
    pub ratio: u32,
    /// `log2(ratio) << 4`, the MultiSynth register R field encoding.
    pub field: u8,
}

/// Choose an R-divider and doubled frequency such that `doubled_freq >= 1
/// MHz`, by doubling the target while advancing the R-divider.
#[must_use]
pub fn choose_r_divider(mut target_hz: u32) -> (RDivider, u32) {
    let mut shift: u32 = 0;
    while target_hz < 1_000_000 && shift < 7 {
        target_hz *= 2;
        shift += 1;
    }
    (
        RDivider {
            ratio: 1 << shift,
            field: (shift as u8) << 4,
        },
        target_hz,
    )
}

/// Full output-frequency recipe: derive
/// the MultiSynth output divider and feed the resulting PLL VCO frequency
/// through [`decompose`] to get PLL A/B's fractional fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockRecipe {
    /// R-divider stage ahead of the MultiSynth.
    pub r_divider: RDivider,
    /// MultiSynth (integer) output divider.
    pub ms_divider: u32,
    /// PLL VCO frequency this divider was derived to hit.
    pub pll_freq: u32,
    /// PLL feedback-multiplier fields.
    pub pll: PllParams,
    /// MultiSynth register fields (`P2 = 0`, `P3 = 1`).
    pub ms: PllParams,
}

/// Floor of the MultiSynth output divider (below this the synth cannot
/// stay in integer mode at a sane VCO frequency).
pub const MS_DIVIDER_MIN: u32 = 4;
/// Ceiling of the MultiSynth output divider.
pub const MS_DIVIDER_MAX: u32 = 900;
/// Nominal PLL VCO target before dividing down (900 MHz, the Si5351's
/// sweet spot for an even integer divider across the whole audio-ADC
/// clock range).
pub const VCO_NOMINAL_HZ: u32 = 900_000_000;

/// Compute the full recipe for a non-zero target output frequency.
#[must_use]
pub fn recipe_for(freq_hz: u32, xtal: u32) -> ClockRecipe {
    let (r_divider, doubled_hz) = choose_r_divider(freq_hz);
    let mut divider = VCO_NOMINAL_HZ / doubled_hz;
    divider &= !1; // force even
    let divider = divider.clamp(MS_DIVIDER_MIN, MS_DIVIDER_MAX);
    let pll_freq = divider * doubled_hz;
    let pll = decompose(pll_freq, xtal);
    let ms = multisynth_params(divider);
    ClockRecipe {
        r_divider,
        ms_divider: divider,
        pll_freq,
        pll,
        ms,
    }
}

/// Encode a PLL A/B synthesizer's 8-register block from its `(P1, P2, P3)`
/// fields (no R-divider/divide-by-4 bits — those only exist on the
/// MultiSynth output stage).
#[must_use]
pub fn encode_pll_registers(p: &PllParams) -> [u8; 8] {
    [
        ((p.p3 >> 8) & 0xFF) as u8,
        (p.p3 & 0xFF) as u8,
        ((p.p1 >> 16) & 0x03) as u8,
        ((p.p1 >> 8) & 0xFF) as u8,
        (p.p1 & 0xFF) as u8,
        (((p.p3 >> 16) & 0x0F) << 4) as u8 | ((p.p2 >> 16) & 0x0F) as u8,
        ((p.p2 >> 8) & 0xFF) as u8,
        (p.p2 & 0xFF) as u8,
    ]
}

/// Encode a MultiSynth (MS0/MS2) output-divider's 8-register block,
/// folding in the R-divider field.
#[must_use]
pub fn encode_multisynth_registers(p: &PllParams, r_divider: &RDivider) -> [u8; 8] {
    let mut regs = encode_pll_registers(p);
    regs[2] |= r_divider.field;
    regs
}
