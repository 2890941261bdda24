//! Fixed-asset dispositions.
//!
//! Each asset is valued at a reference year, grown at its own rate, and
//! disposed at the beginning of its year of disposition. A disposition
//! inside the plan splits the net proceeds into three household streams:
//! tax-free return of basis (and excluded gains), ordinary income (fixed
//! annuities), and capital gains. Assets disposed past the plan end are
//! liquidated into the bequest with a step-up in basis.

use serde::{Deserialize, Serialize};

/// Disposition streams over the plan horizon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedAssetStreams {
    pub tax_free_n: Vec<f64>,
    pub ordinary_income_n: Vec<f64>,
    pub capital_gains_n: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FixedAssetKind {
    Collectibles,
    FixedAnnuity,
    PreciousMetals,
    RealEstate,
    Residence,
    Stocks,
}

/// One fixed asset with a planned disposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedAsset {
    pub active: bool,
    pub name: String,
    pub kind: FixedAssetKind,
    /// Reference year at which `value` and `basis` are assessed.
    pub year: i32,
    pub basis: f64,
    pub value: f64,
    /// Annual growth rate in percent.
    pub rate: f64,
    /// Year of disposition. Zero or negative values are relative to the end
    /// of the plan (`0` = year after plan end).
    pub yod: i32,
    /// Sale commission in percent of the disposition value.
    pub commission: f64,
}

const RESIDENCE_EXCLUSION_SINGLE: f64 = 250_000.0;
const RESIDENCE_EXCLUSION_MARRIED: f64 = 500_000.0;

fn future_value(current_value: f64, annual_rate: f64, years: i32) -> f64 {
    if years <= 0 {
        return current_value;
    }
    current_value * (1.0 + annual_rate / 100.0).powi(years)
}

/// Resolve a relative year of disposition against the plan's last year.
fn resolve_yod(yod: i32, end_year: i32) -> i32 {
    if yod <= 0 { end_year + yod + 1 } else { yod }
}

/// Build the three yearly streams for assets disposed within the plan.
#[must_use]
pub fn disposition_streams(
    assets: &[FixedAsset],
    n_n: usize,
    this_year: i32,
    married: bool,
) -> FixedAssetStreams {
    let mut streams = FixedAssetStreams {
        tax_free_n: vec![0.0; n_n],
        ordinary_income_n: vec![0.0; n_n],
        capital_gains_n: vec![0.0; n_n],
    };
    let residence_exclusion = if married {
        RESIDENCE_EXCLUSION_MARRIED
    } else {
        RESIDENCE_EXCLUSION_SINGLE
    };
    let end_year = this_year + n_n as i32 - 1;

    for asset in assets.iter().filter(|a| a.active) {
        if asset.year > end_year {
            continue;
        }
        let yod = resolve_yod(asset.yod, end_year);
        if yod < asset.year || yod < this_year || yod > end_year {
            continue;
        }

        let n = (yod - this_year) as usize;
        let fv = future_value(asset.value, asset.rate, yod - asset.year);
        let proceeds = fv * (1.0 - asset.commission / 100.0);
        let gain = proceeds - asset.basis;

        match asset.kind {
            FixedAssetKind::FixedAnnuity => {
                if gain > 0.0 {
                    streams.ordinary_income_n[n] += gain;
                }
                // Basis is returned tax-free even on a loss.
                streams.tax_free_n[n] += asset.basis;
            }
            FixedAssetKind::Residence => {
                if gain > 0.0 {
                    let taxable = (gain - residence_exclusion).max(0.0);
                    if taxable > 0.0 {
                        streams.capital_gains_n[n] += taxable;
                    }
                    streams.tax_free_n[n] += asset.basis + gain.min(residence_exclusion);
                } else {
                    streams.tax_free_n[n] += proceeds;
                }
            }
            FixedAssetKind::Collectibles
            | FixedAssetKind::PreciousMetals
            | FixedAssetKind::RealEstate
            | FixedAssetKind::Stocks => {
                if gain > 0.0 {
                    streams.capital_gains_n[n] += gain;
                    streams.tax_free_n[n] += asset.basis;
                } else {
                    streams.tax_free_n[n] += proceeds;
                }
            }
        }
    }

    streams
}

/// Net proceeds at the end of the plan from assets with a disposition year
/// past the plan end. Heirs receive a step-up in basis, so no tax applies.
#[must_use]
pub fn bequest_value(assets: &[FixedAsset], n_n: usize, this_year: i32) -> f64 {
    let end_year = this_year + n_n as i32 - 1;
    let mut total = 0.0;
    for asset in assets.iter().filter(|a| a.active) {
        if asset.year > end_year {
            continue;
        }
        let yod = resolve_yod(asset.yod, end_year);
        if yod < asset.year || yod <= end_year {
            continue;
        }
        let fv = future_value(asset.value, asset.rate, end_year - asset.year + 1);
        total += fv * (1.0 - asset.commission / 100.0);
    }
    total
}
