//! Federal tax parameters and MAGI-dependent quantities.
//!
//! Two bracket regimes are modeled: the current one and a speculated
//! post-expiration regime that takes over in the plan's configured switch
//! year. All dollar constants are current for the 2026 filing season and are
//! inflation-scaled with the plan's cumulative multiplier where applicable.
//! Index `[0]` is single, `[1]` married filing jointly.

use crate::error::{PlanError, Result};
use crate::grid::Grid2;

/// Number of ordinary-income tax brackets.
pub const N_T: usize = 7;

/// Number of Medicare IRMAA tiers.
pub const N_Q: usize = 6;

/// Human-readable bracket labels for reporting.
pub const BRACKET_NAMES: [&str; N_T] = ["10%", "12/15%", "22/25%", "24/28%", "32/33%", "35%", "37/40%"];

// Cumulative bracket tops under the current regime.
const TAX_BRACKETS_CURRENT: [[f64; N_T]; 2] = [
    [12_400.0, 50_400.0, 105_700.0, 201_775.0, 256_225.0, 640_600.0, 9_999_999.0],
    [24_800.0, 100_800.0, 211_400.0, 403_550.0, 512_450.0, 768_700.0, 9_999_999.0],
];

// Speculated post-expiration brackets, inflation-projected from 2017.
const TAX_BRACKETS_POST: [[f64; N_T]; 2] = [
    [12_600.0, 51_270.0, 124_160.0, 258_920.0, 562_960.0, 565_260.0, 9_999_999.0],
    [25_200.0, 102_540.0, 206_840.0, 315_260.0, 562_960.0, 635_920.0, 9_999_999.0],
];

const RATES_CURRENT: [f64; N_T] = [0.10, 0.12, 0.22, 0.24, 0.32, 0.35, 0.370];
const RATES_POST: [f64; N_T] = [0.10, 0.15, 0.25, 0.28, 0.33, 0.35, 0.396];

const STD_DEDUCTION_CURRENT: [f64; 2] = [16_100.0, 32_200.0];
const STD_DEDUCTION_POST: [f64; 2] = [8_580.0, 17_160.0];

// Additional deduction per individual aged 65+.
const EXTRA_65_DEDUCTION: [f64; 2] = [2_000.0, 1_600.0];

// 65+ bonus deduction per individual, phased out at 6% per $1k of MAGI above
// the threshold. The bonus has its own expiration year, independent of the
// bracket-regime switch.
const BONUS_AMOUNT: f64 = 6_000.0;
const BONUS_THRESHOLD: [f64; 2] = [75_000.0, 150_000.0];

// IRMAA MAGI thresholds delimiting the six Medicare premium tiers.
const IRMAA_BRACKETS: [[f64; N_Q]; 2] = [
    [0.0, 109_000.0, 137_000.0, 171_000.0, 205_000.0, 500_000.0],
    [0.0, 218_000.0, 274_000.0, 342_000.0, 410_000.0, 750_000.0],
];

// Annualized Part B fees: index 0 is the basic premium, following entries
// are incremental IRMAA amounts per tier.
const IRMAA_FEES: [f64; N_Q] = [
    12.0 * 202.90,
    12.0 * 81.20,
    12.0 * 121.70,
    12.0 * 121.70,
    12.0 * 121.70,
    12.0 * 40.70,
];

// Taxable-income thresholds delimiting the 0%/15%/20% LTCG bands.
const CAP_GAIN_THRESHOLDS: [[f64; 2]; 2] = [
    [49_450.0, 545_500.0],
    [98_900.0, 613_700.0],
];

const NIIT_THRESHOLD: [f64; 2] = [200_000.0, 250_000.0];
const NIIT_RATE: f64 = 0.038;

// IRS Uniform Lifetime Table, starting at age 72.
const RMD_TABLE: [f64; 49] = [
    27.4, 26.5, 25.5, 24.6, 23.7, 22.9, 22.0, 21.1, 20.2, 19.4, 18.5, 17.7, 16.8, 16.0, 15.2,
    14.4, 13.7, 12.9, 12.2, 11.5, 10.8, 10.1, 9.5, 8.9, 8.4, 7.8, 7.3, 6.8, 6.4, 6.0, 5.6, 5.2,
    4.9, 4.6, 4.3, 4.1, 3.9, 3.7, 3.5, 3.4, 3.3, 3.1, 3.0, 2.9, 2.8, 2.7, 2.5, 2.3, 2.0,
];

/// Cumulative annual Medicare cost at each tier (basic premium plus all
/// incremental IRMAA fees up to and including the tier).
fn irmaa_cumulative() -> [f64; N_Q] {
    let mut c = [0.0; N_Q];
    let mut acc = 0.0;
    for (q, fee) in IRMAA_FEES.iter().enumerate() {
        acc += fee;
        c[q] = acc;
    }
    c
}

/// Yearly standard deduction, bracket rates, and per-bracket widths.
#[derive(Debug, Clone)]
pub struct TaxParams {
    /// Usable standard deduction, inflation-adjusted (includes 65+ extras).
    pub sigma_bar_n: Vec<f64>,
    /// Bracket marginal rates, `N_T x N_n`.
    pub theta_tn: Grid2,
    /// Per-bracket widths (successive differences of bracket tops),
    /// `N_T x N_n`, unadjusted for inflation.
    pub delta_tn: Grid2,
}

/// Compute the yearly tax parameters.
///
/// The filing status starts from the number of individuals and drops to
/// single at `n_d` when the shortest-lived spouse passes. MAGI enters only
/// through the 65+ bonus phase-out, which is why this is recomputed on every
/// self-consistent iteration.
#[allow(clippy::too_many_arguments)]
pub fn tax_params(
    yobs: &[i32],
    i_d: usize,
    n_d: usize,
    n_n: usize,
    gamma_n: &[f64],
    magi_n: &[f64],
    yobbba: i32,
    bonus_expiration_year: i32,
    this_year: i32,
) -> TaxParams {
    // Per-bracket widths from cumulative tops, computed once.
    let mut delta_current = TAX_BRACKETS_CURRENT;
    let mut delta_post = TAX_BRACKETS_POST;
    for t in (1..N_T).rev() {
        for s in 0..2 {
            delta_current[s][t] -= delta_current[s][t - 1];
            delta_post[s][t] -= delta_post[s][t - 1];
        }
    }

    let mut sigma_bar_n = vec![0.0; n_n];
    let mut theta_tn = Grid2::zeros(N_T, n_n);
    let mut delta_tn = Grid2::zeros(N_T, n_n);

    let mut status = yobs.len() - 1;
    let mut souls: Vec<usize> = (0..yobs.len()).collect();

    for n in 0..n_n {
        if n == n_d && status > 0 {
            souls.retain(|&i| i != i_d);
            status -= 1;
        }

        let current = this_year + (n as i32) < yobbba;
        let (deduction, widths, rates) = if current {
            (STD_DEDUCTION_CURRENT[status], delta_current[status], RATES_CURRENT)
        } else {
            (STD_DEDUCTION_POST[status], delta_post[status], RATES_POST)
        };

        sigma_bar_n[n] = deduction * gamma_n[n];
        for t in 0..N_T {
            delta_tn.set(t, n, widths[t]);
            theta_tn.set(t, n, rates[t]);
        }

        for &i in &souls {
            if this_year + n as i32 - yobs[i] >= 65 {
                sigma_bar_n[n] += EXTRA_65_DEDUCTION[status] * gamma_n[n];
                if this_year + n as i32 <= bonus_expiration_year {
                    let excess = (magi_n[n] - BONUS_THRESHOLD[status]).max(0.0);
                    sigma_bar_n[n] += BONUS_AMOUNT * (1.0 - 0.06 * excess / 1000.0).max(0.0);
                }
            }
        }
    }

    TaxParams {
        sigma_bar_n,
        theta_tn,
        delta_tn,
    }
}

/// IRMAA tier thresholds and cumulative yearly costs over the Medicare
/// window of the plan.
#[derive(Debug, Clone, Default)]
pub struct MedicareSchedule {
    /// Plan-year index at which Medicare eligibility starts.
    pub start: usize,
    /// Inflation-scaled MAGI thresholds, `n_med x (N_Q - 1)`.
    pub thresholds: Grid2,
    /// Inflation-scaled cumulative yearly costs for the covered
    /// individual count, `n_med x N_Q`.
    pub costs: Grid2,
}

/// Build the IRMAA schedule. Years inside the window where no covered
/// individual is both alive and 65+ carry zero thresholds and costs.
pub fn medicare_values(
    yobs: &[i32],
    horizons: &[usize],
    gamma_n: &[f64],
    n_n: usize,
    this_year: i32,
) -> MedicareSchedule {
    let n_i = yobs.len();
    let start = yobs
        .iter()
        .map(|&yob| (yob + 65 - this_year).max(0) as usize)
        .min()
        .unwrap_or(n_n)
        .min(n_n);
    let n_med = n_n - start;
    let cumulative = irmaa_cumulative();

    let mut thresholds = Grid2::zeros(n_med, N_Q - 1);
    let mut costs = Grid2::zeros(n_med, N_Q);

    for nn in 0..n_med {
        let n = start + nn;
        let mut covered = 0;
        for i in 0..n_i {
            if this_year + n as i32 - yobs[i] >= 65 && n < horizons[i] {
                covered += 1;
            }
        }
        if covered == 0 {
            continue;
        }
        let joint = n_i == 2 && n < horizons[0] && n < horizons[1];
        let status = usize::from(joint);
        for q in 0..N_Q - 1 {
            thresholds.set(nn, q, gamma_n[n] * IRMAA_BRACKETS[status][q + 1]);
        }
        for q in 0..N_Q {
            costs.set(nn, q, covered as f64 * gamma_n[n] * cumulative[q]);
        }
    }

    MedicareSchedule {
        start,
        thresholds,
        costs,
    }
}

/// Direct Medicare+IRMAA cost recompute from a MAGI trajectory, used by the
/// self-consistent loop. Premiums look back two years; the first two years
/// use the caller-supplied MAGI history.
pub fn medicare_costs(
    yobs: &[i32],
    horizons: &[usize],
    magi_n: &[f64],
    prev_magi: &[f64; 2],
    gamma_n: &[f64],
    n_n: usize,
    this_year: i32,
) -> Vec<f64> {
    let n_i = yobs.len();
    let mut costs = vec![0.0; n_n];
    for (n, cost) in costs.iter_mut().enumerate() {
        let joint = n_i == 2 && n < horizons[0] && n < horizons[1];
        let status = usize::from(joint);
        for i in 0..n_i {
            if this_year + n as i32 - yobs[i] >= 65 && n < horizons[i] {
                *cost += gamma_n[n] * IRMAA_FEES[0];
                let magi = if n < 2 { prev_magi[n] } else { magi_n[n - 2] };
                for q in 1..N_Q {
                    if magi > gamma_n[n] * IRMAA_BRACKETS[status][q] {
                        *cost += gamma_n[n] * IRMAA_FEES[q];
                    }
                }
            }
        }
    }
    costs
}

/// Net investment income tax on dividends and interest above the MAGI
/// threshold. Thresholds are not inflation-adjusted by statute.
pub fn niit(
    n_i: usize,
    magi_n: &[f64],
    interest_n: &[f64],
    dividends_n: &[f64],
    n_d: usize,
    n_n: usize,
) -> Vec<f64> {
    let mut j_n = vec![0.0; n_n];
    let mut status = n_i - 1;
    for n in 0..n_n {
        if status > 0 && n == n_d {
            status -= 1;
        }
        let threshold = NIIT_THRESHOLD[status];
        if magi_n[n] > threshold {
            j_n[n] = NIIT_RATE * (magi_n[n] - threshold).min(interest_n[n] + dividends_n[n]);
        }
    }
    j_n
}

/// Marginal long-term capital gains rate band (0, 15%, or 20%) per year,
/// from MAGI against the inflation-scaled band thresholds.
pub fn ltcg_rate(n_i: usize, magi_n: &[f64], gamma_n: &[f64], n_d: usize, n_n: usize) -> Vec<f64> {
    let mut psi_n = vec![0.0; n_n];
    let mut status = n_i - 1;
    for n in 0..n_n {
        if status > 0 && n == n_d {
            status -= 1;
        }
        let t15 = gamma_n[n] * CAP_GAIN_THRESHOLDS[status][0];
        let t20 = gamma_n[n] * CAP_GAIN_THRESHOLDS[status][1];
        psi_n[n] = if magi_n[n] > t20 {
            0.20
        } else if magi_n[n] > t15 {
            0.15
        } else {
            0.0
        };
    }
    psi_n
}

/// Required Minimum Distribution fractions for each individual and year.
///
/// The starting age follows the SECURE-act phase-in by birth year. Spouses
/// with more than a 10-year age difference and lifespans over 120 are not
/// supported.
pub fn rmd_fractions(
    yobs: &[i32],
    life_ages: &[i32],
    n_n: usize,
    this_year: i32,
) -> Result<Grid2> {
    let n_i = yobs.len();
    if n_i == 2 && (yobs[0] - yobs[1]).abs() > 10 {
        return Err(PlanError::config(
            "RMD: unsupported age difference of more than 10 years",
        ));
    }
    if life_ages.iter().any(|&a| a > 120) {
        return Err(PlanError::config(
            "RMD: unsupported life expectancy over 120 years",
        ));
    }

    let mut rho = Grid2::zeros(n_i, n_n);
    for i in 0..n_i {
        let age_now = this_year - yobs[i];
        let rmd_age = match yobs[i] {
            y if y < 1949 => 70,
            1949..=1950 => 72,
            1951..=1959 => 73,
            _ => 75,
        };
        for n in 0..n_n {
            let age = age_now + n as i32;
            if age >= rmd_age && age >= 72 {
                rho.set(i, n, 1.0 / RMD_TABLE[(age - 72) as usize]);
            }
        }
    }
    Ok(rho)
}
