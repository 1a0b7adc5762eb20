//! Rate records and the per-class rate store

use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    Fiat,
    Crypto,
}

impl Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                AssetClass::Fiat => "fiat",
                AssetClass::Crypto => "crypto",
            }
        )
    }
}

impl FromStr for AssetClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fiat" | "forex" => Ok(AssetClass::Fiat),
            "crypto" => Ok(AssetClass::Crypto),
            _ => Err(anyhow::anyhow!("Invalid asset class: {}", s)),
        }
    }
}

/// A single asset rate, normalized to a common convention: `usd_rate` is the
/// USD value of 1 unit of the asset, regardless of how the source reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct RateRecord {
    pub class: AssetClass,
    pub code: String,
    pub usd_rate: f64,
}

/// Ordered collection of rates for exactly one asset class. Built once from a
/// source response and never mutated element-wise afterwards.
#[derive(Debug, Clone)]
pub struct RateStore {
    class: AssetClass,
    records: Vec<RateRecord>,
}

impl RateStore {
    /// Builds a fiat store from source pairs of (code, currency-per-USD).
    ///
    /// The fiat source quotes rates as units of currency per 1 USD, so each
    /// rate is inverted to the common USD-per-unit convention. Non-positive
    /// source rates and duplicate codes are dropped.
    pub fn from_fiat<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        Self::build(AssetClass::Fiat, pairs, |rate| {
            (rate > 0.0).then(|| 1.0 / rate)
        })
    }

    /// Builds a crypto store from source pairs of (symbol, USD price).
    ///
    /// Symbols are uppercased to their canonical form. The source already
    /// quotes USD per unit; non-positive prices and duplicate symbols are
    /// dropped.
    pub fn from_crypto<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        Self::build(AssetClass::Crypto, pairs, |price| {
            (price > 0.0).then_some(price)
        })
    }

    fn build<I, S>(class: AssetClass, pairs: I, normalize: impl Fn(f64) -> Option<f64>) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut records: Vec<RateRecord> = Vec::new();
        for (code, rate) in pairs {
            let code = code.as_ref().to_uppercase();
            if records.iter().any(|r| r.code == code) {
                continue;
            }
            if let Some(usd_rate) = normalize(rate) {
                records.push(RateRecord {
                    class,
                    code,
                    usd_rate,
                });
            }
        }
        RateStore { class, records }
    }

    pub fn class(&self) -> AssetClass {
        self.class
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RateRecord> {
        self.records.iter()
    }

    /// Looks up a record by code, case-insensitively.
    pub fn get(&self, code: &str) -> Option<&RateRecord> {
        self.records
            .iter()
            .find(|r| r.code.eq_ignore_ascii_case(code))
    }

    /// Lazy, restartable view of the store filtered by case-insensitive
    /// substring containment on the code. An empty query yields the full
    /// store in its original order.
    pub fn filter<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a RateRecord> + 'a {
        let needle = query.to_lowercase();
        self.records
            .iter()
            .filter(move |r| needle.is_empty() || r.code.to_lowercase().contains(&needle))
    }
}
