//! Conversion session: per-class rate cache and slot selection state.

use std::fmt::Display;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::core::convert::{self, Conversion, ConvertError};
use crate::core::provider::{DataUnavailable, RateProvider};
use crate::core::rates::{AssetClass, RateStore};

/// One of the two conversion endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    From,
    To,
}

impl Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Slot::From => "from",
                Slot::To => "to",
            }
        )
    }
}

/// Per-class rate cache with single-flight loading.
///
/// Each class is tri-state: not loaded, loading, or loaded. Concurrent
/// callers for the same class attach to the in-flight fetch instead of
/// issuing a duplicate request; a failed fetch caches nothing, so the next
/// call retries.
pub struct RateCache {
    fiat: OnceCell<RateStore>,
    crypto: OnceCell<RateStore>,
}

impl RateCache {
    pub fn new() -> Self {
        RateCache {
            fiat: OnceCell::new(),
            crypto: OnceCell::new(),
        }
    }

    fn cell(&self, class: AssetClass) -> &OnceCell<RateStore> {
        match class {
            AssetClass::Fiat => &self.fiat,
            AssetClass::Crypto => &self.crypto,
        }
    }

    /// Returns the cached store for the provider's class, fetching through
    /// `provider` on first use.
    pub async fn load(&self, provider: &dyn RateProvider) -> Result<&RateStore, DataUnavailable> {
        let class = provider.class();
        self.cell(class)
            .get_or_try_init(|| async {
                debug!("Loading {} rates", class);
                provider.fetch_rates().await
            })
            .await
    }

    /// The loaded store for `class`, if any. Never triggers a fetch.
    pub fn get(&self, class: AssetClass) -> Option<&RateStore> {
        self.cell(class).get()
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Session state for one converter instance: active mode, the slot being
/// edited, and the code chosen for each slot. Replaces the original's
/// hidden module-level globals with an explicit context object.
pub struct Session {
    fiat_provider: Arc<dyn RateProvider>,
    crypto_provider: Arc<dyn RateProvider>,
    cache: RateCache,
    mode: AssetClass,
    active_slot: Option<Slot>,
    from: Option<String>,
    to: Option<String>,
}

impl Session {
    pub fn new(fiat_provider: Arc<dyn RateProvider>, crypto_provider: Arc<dyn RateProvider>) -> Self {
        Session {
            fiat_provider,
            crypto_provider,
            cache: RateCache::new(),
            mode: AssetClass::Fiat,
            active_slot: None,
            from: None,
            to: None,
        }
    }

    pub fn mode(&self) -> AssetClass {
        self.mode
    }

    pub fn selected(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::From => self.from.as_deref(),
            Slot::To => self.to.as_deref(),
        }
    }

    /// Switches the asset class mode. Both slots reset to unset; no fetch
    /// happens here, it is deferred to the next `open_slot`.
    pub fn set_mode(&mut self, mode: AssetClass) {
        if self.mode != mode {
            debug!("Switching mode to {}", mode);
        }
        self.mode = mode;
        self.active_slot = None;
        self.from = None;
        self.to = None;
    }

    /// Ensures the current mode's store is loaded and returns it.
    pub async fn rates(&self) -> Result<&RateStore, DataUnavailable> {
        let provider = match self.mode {
            AssetClass::Fiat => &self.fiat_provider,
            AssetClass::Crypto => &self.crypto_provider,
        };
        self.cache.load(provider.as_ref()).await
    }

    /// Marks a slot as being edited and returns the store backing its
    /// picker, loading it if necessary.
    pub async fn open_slot(&mut self, slot: Slot) -> Result<&RateStore, DataUnavailable> {
        self.active_slot = Some(slot);
        self.rates().await
    }

    /// Assigns `code` to the active slot and closes it. A stray choose with
    /// no slot open is a no-op.
    pub fn choose(&mut self, code: &str) {
        let Some(slot) = self.active_slot.take() else {
            debug!("Ignoring selection '{}' with no open slot", code);
            return;
        };
        let code = code.to_uppercase();
        match slot {
            Slot::From => self.from = Some(code),
            Slot::To => self.to = Some(code),
        }
    }

    /// Converts `amount` between the two selected codes using the current
    /// mode's cached store. An unset slot or unloaded store resolves to
    /// `UnresolvedCode`.
    pub fn convert(&self, amount: f64) -> Result<Conversion, ConvertError> {
        let from = self.slot_code(Slot::From)?;
        let to = self.slot_code(Slot::To)?;
        let store = self
            .cache
            .get(self.mode)
            .ok_or_else(|| ConvertError::UnresolvedCode(from.to_string()))?;
        convert::convert(store, from, to, amount)
    }

    fn slot_code(&self, slot: Slot) -> Result<&str, ConvertError> {
        self.selected(slot)
            .ok_or_else(|| ConvertError::UnresolvedCode(format!("<{slot} unset>")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockRateProvider {
        class: AssetClass,
        pairs: Vec<(&'static str, f64)>,
        delay: Duration,
        fail: bool,
        call_count: AtomicUsize,
    }

    impl MockRateProvider {
        fn fiat(pairs: Vec<(&'static str, f64)>) -> Self {
            Self {
                class: AssetClass::Fiat,
                pairs,
                delay: Duration::ZERO,
                fail: false,
                call_count: AtomicUsize::new(0),
            }
        }

        fn crypto(pairs: Vec<(&'static str, f64)>) -> Self {
            Self {
                class: AssetClass::Crypto,
                pairs,
                delay: Duration::ZERO,
                fail: false,
                call_count: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateProvider for MockRateProvider {
        fn class(&self) -> AssetClass {
            self.class
        }

        async fn fetch_rates(&self) -> Result<RateStore, DataUnavailable> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(DataUnavailable {
                    class: self.class,
                    source: anyhow::anyhow!("mock transport failure"),
                });
            }
            Ok(match self.class {
                AssetClass::Fiat => RateStore::from_fiat(self.pairs.iter().copied()),
                AssetClass::Crypto => RateStore::from_crypto(self.pairs.iter().copied()),
            })
        }
    }

    fn test_session() -> (Session, Arc<MockRateProvider>, Arc<MockRateProvider>) {
        let fiat = Arc::new(MockRateProvider::fiat(vec![("USD", 1.0), ("EUR", 0.9)]));
        let crypto = Arc::new(MockRateProvider::crypto(vec![
            ("btc", 50000.0),
            ("eth", 2500.0),
        ]));
        let session = Session::new(fiat.clone(), crypto.clone());
        (session, fiat, crypto)
    }

    #[tokio::test]
    async fn test_widget_flow_fiat_conversion() {
        let (mut session, _, _) = test_session();

        session.open_slot(Slot::From).await.unwrap();
        session.choose("USD");
        session.open_slot(Slot::To).await.unwrap();
        session.choose("EUR");

        let result = session.convert(10.0).unwrap();
        assert!((result.converted_amount - 9.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_choose_with_no_open_slot_is_a_noop() {
        let (mut session, _, _) = test_session();
        session.choose("USD");
        assert!(session.selected(Slot::From).is_none());
        assert!(session.selected(Slot::To).is_none());
    }

    #[tokio::test]
    async fn test_choose_uppercases_and_closes_slot() {
        let (mut session, _, _) = test_session();
        session.set_mode(AssetClass::Crypto);
        session.open_slot(Slot::From).await.unwrap();
        session.choose("btc");
        assert_eq!(session.selected(Slot::From), Some("BTC"));

        // Slot closed: a second choose goes nowhere
        session.choose("eth");
        assert_eq!(session.selected(Slot::From), Some("BTC"));
        assert!(session.selected(Slot::To).is_none());
    }

    #[tokio::test]
    async fn test_mode_change_clears_both_slots() {
        let (mut session, _, _) = test_session();
        session.open_slot(Slot::From).await.unwrap();
        session.choose("USD");
        session.open_slot(Slot::To).await.unwrap();
        session.choose("EUR");

        session.set_mode(AssetClass::Crypto);
        assert!(session.selected(Slot::From).is_none());
        assert!(session.selected(Slot::To).is_none());

        let err = session.convert(10.0).unwrap_err();
        assert!(matches!(err, ConvertError::UnresolvedCode(_)));
    }

    #[tokio::test]
    async fn test_mode_change_does_not_fetch() {
        let (mut session, fiat, crypto) = test_session();
        session.set_mode(AssetClass::Crypto);
        session.set_mode(AssetClass::Fiat);
        assert_eq!(fiat.calls(), 0);
        assert_eq!(crypto.calls(), 0);
    }

    #[tokio::test]
    async fn test_store_is_fetched_once_per_class() {
        let (mut session, fiat, _) = test_session();
        session.open_slot(Slot::From).await.unwrap();
        session.open_slot(Slot::To).await.unwrap();
        session.rates().await.unwrap();
        assert_eq!(fiat.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_loads_share_one_fetch() {
        let fiat = Arc::new(
            MockRateProvider::fiat(vec![("USD", 1.0), ("EUR", 0.9)])
                .with_delay(Duration::from_millis(50)),
        );
        let crypto = Arc::new(MockRateProvider::crypto(vec![("btc", 50000.0)]));
        let session = Session::new(fiat.clone(), crypto);

        let (first, second) = futures::future::join(session.rates(), session.rates()).await;
        let first = first.unwrap();
        let second = second.unwrap();

        assert_eq!(fiat.calls(), 1);
        assert_eq!(first.len(), second.len());
        assert_eq!(
            first.get("EUR").unwrap().usd_rate,
            second.get("EUR").unwrap().usd_rate
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let fiat = Arc::new(MockRateProvider::fiat(vec![]).failing());
        let crypto = Arc::new(MockRateProvider::crypto(vec![]));
        let mut session = Session::new(fiat.clone(), crypto);

        assert!(session.open_slot(Slot::From).await.is_err());
        assert!(session.rates().await.is_err());
        // Each attempt retried the fetch instead of caching the failure
        assert_eq!(fiat.calls(), 2);
    }

    #[tokio::test]
    async fn test_convert_before_load_is_unresolved() {
        let (mut session, _, _) = test_session();
        // Codes set by hand without ever loading the store
        session.active_slot = Some(Slot::From);
        session.choose("USD");
        session.active_slot = Some(Slot::To);
        session.choose("EUR");

        let err = session.convert(1.0).unwrap_err();
        assert!(matches!(err, ConvertError::UnresolvedCode(_)));
    }

    #[tokio::test]
    async fn test_crypto_mode_uses_crypto_store() {
        let (mut session, fiat, crypto) = test_session();
        session.set_mode(AssetClass::Crypto);
        session.open_slot(Slot::From).await.unwrap();
        session.choose("BTC");
        session.open_slot(Slot::To).await.unwrap();
        session.choose("ETH");

        let result = session.convert(1.0).unwrap();
        assert!((result.converted_amount - 20.0).abs() < 1e-9);
        assert_eq!(fiat.calls(), 0);
        assert_eq!(crypto.calls(), 1);
    }
}
