//! Per-country derivation of currency code, exchange rate and estimated GDP.

use crate::country_source::RawCountry;
use crate::rate_source::RateTable;
use crate::store::EnrichedCountry;
use rand::RngExt;

/// Supplies the GDP multiplier. Injected so the derivation itself stays
/// deterministic under test.
pub trait MultiplierSource: Send + Sync {
    fn draw(&self) -> u64;
}

/// Production source: uniform over [1000, 2000] inclusive, one draw per
/// country per refresh.
pub struct UniformMultiplier;

impl MultiplierSource for UniformMultiplier {
    fn draw(&self) -> u64 {
        rand::rng().random_range(1000..=2000)
    }
}

/// Fixed multiplier for deterministic derivation in tests.
pub struct FixedMultiplier(pub u64);

impl MultiplierSource for FixedMultiplier {
    fn draw(&self) -> u64 {
        self.0
    }
}

/// Joins one raw country entry with the rate table.
///
/// The GDP rules, in order:
/// - population and a matching rate: `population * multiplier / rate`;
/// - population but the source listed no currency at all: zero, an explicit
///   policy distinct from "unknown";
/// - anything else (no population, or a code with no matching rate): `None`.
pub fn enrich(
    raw: &RawCountry,
    rates: &RateTable,
    multiplier: &dyn MultiplierSource,
) -> EnrichedCountry {
    let currency_code = raw.currencies.first().and_then(|c| c.code.clone());

    let exchange_rate = currency_code
        .as_deref()
        .and_then(|code| rates.get(code).copied());

    let estimated_gdp = match (raw.population, exchange_rate) {
        (Some(population), Some(rate)) => Some(population as f64 * multiplier.draw() as f64 / rate),
        (Some(_), None) if raw.currencies.is_empty() => Some(0.0),
        _ => None,
    };

    EnrichedCountry {
        name: raw.name.clone(),
        capital: raw.capital.clone(),
        region: raw.region.clone(),
        population: raw.population,
        flag_url: raw.flag.clone(),
        currency_code,
        exchange_rate,
        estimated_gdp,
    }
}
