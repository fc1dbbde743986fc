//! Mirroring the host page's theme flag into the cache.

use std::time::Duration;

use async_trait::async_trait;

use postmirror_core::Error;
use postmirror_core::cache::CacheStore;
use postmirror_core::config::AppConfig;
use postmirror_core::model::Theme;

use super::poll::{Polled, poll_until};

/// The page's `data-theme` attribute.
#[async_trait]
pub trait ThemeSource: Send + Sync {
    /// Current theme, or `None` while the page body does not exist yet.
    fn current_theme(&self) -> Option<Theme>;

    /// Wait for the next attribute change. `None` once the source is closed.
    async fn theme_changed(&self) -> Option<Theme>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeSyncOutcome {
    /// The body never appeared within the budget; nothing was persisted.
    AbsentAfterBudget,
    /// The source closed. `writes` counts persisted values, initial included.
    Closed { last: Theme, writes: usize },
}

pub struct ThemeSync {
    store: CacheStore,
    interval: Duration,
    budget: u32,
}

impl ThemeSync {
    pub fn new(store: CacheStore, interval: Duration, budget: u32) -> Self {
        Self { store, interval, budget }
    }

    pub fn from_config(store: CacheStore, config: &AppConfig) -> Self {
        Self::new(store, config.mount_poll_interval(), config.mount_budget)
    }

    /// Persist the initial theme, then every distinct change until the
    /// source closes.
    ///
    /// # Errors
    ///
    /// Returns the store error if a write fails; following stops there.
    pub async fn run<S: ThemeSource + ?Sized>(&self, source: &S) -> Result<ThemeSyncOutcome, Error> {
        let mut current = match poll_until(self.interval, self.budget, |_| source.current_theme()).await {
            Polled::Found { value, .. } => value,
            Polled::AbsentAfterBudget => {
                tracing::debug!(budget = self.budget, "page body never appeared, theme not synced");
                return Ok(ThemeSyncOutcome::AbsentAfterBudget);
            }
        };

        self.store.set_theme(current).await?;
        let mut writes = 1;

        while let Some(theme) = source.theme_changed().await {
            if theme == current {
                continue;
            }
            self.store.set_theme(theme).await?;
            tracing::debug!(theme = theme.as_str(), "theme changed");
            current = theme;
            writes += 1;
        }

        Ok(ThemeSyncOutcome::Closed { last: current, writes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    struct FakeTheme {
        ready_on_probe: u32,
        probes: Mutex<u32>,
        initial: Theme,
        changes: tokio::sync::Mutex<mpsc::UnboundedReceiver<Theme>>,
    }

    impl FakeTheme {
        fn new(ready_on_probe: u32, initial: Theme) -> (Self, mpsc::UnboundedSender<Theme>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let source = Self { ready_on_probe, probes: Mutex::new(0), initial, changes: tokio::sync::Mutex::new(rx) };
            (source, tx)
        }
    }

    #[async_trait]
    impl ThemeSource for FakeTheme {
        fn current_theme(&self) -> Option<Theme> {
            let mut probes = self.probes.lock().unwrap();
            *probes += 1;
            (self.ready_on_probe != 0 && *probes >= self.ready_on_probe).then_some(self.initial)
        }

        async fn theme_changed(&self) -> Option<Theme> {
            self.changes.lock().await.recv().await
        }
    }

    async fn sync() -> (CacheStore, ThemeSync) {
        let store = CacheStore::open_in_memory().await.unwrap();
        let sync = ThemeSync::from_config(store.clone(), &AppConfig::default());
        (store, sync)
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_then_distinct_changes_persisted() {
        let (store, sync) = sync().await;
        let (source, tx) = FakeTheme::new(3, Theme::Dark);
        for theme in [Theme::Dark, Theme::Light, Theme::Light, Theme::Dark] {
            tx.send(theme).unwrap();
        }
        drop(tx);

        let outcome = sync.run(&source).await.unwrap();

        assert_eq!(outcome, ThemeSyncOutcome::Closed { last: Theme::Dark, writes: 3 });
        assert_eq!(store.theme().await.unwrap(), Theme::Dark);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_theme_persisted_before_changes() {
        let (store, sync) = sync().await;
        let (source, tx) = FakeTheme::new(1, Theme::Dark);

        let follow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            let seen = store.theme().await.unwrap();
            tx.send(Theme::Light).unwrap();
            drop(tx);
            seen
        };
        let (outcome, seen) = tokio::join!(sync.run(&source), follow);

        assert_eq!(seen, Theme::Dark);
        assert_eq!(outcome.unwrap(), ThemeSyncOutcome::Closed { last: Theme::Light, writes: 2 });
        assert_eq!(store.theme().await.unwrap(), Theme::Light);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_body_gives_up_after_budget() {
        let (store, sync) = sync().await;
        store.set_theme(Theme::Dark).await.unwrap();
        let (source, _tx) = FakeTheme::new(0, Theme::Light);

        let outcome = sync.run(&source).await.unwrap();

        assert_eq!(outcome, ThemeSyncOutcome::AbsentAfterBudget);
        assert_eq!(*source.probes.lock().unwrap(), 20);
        assert_eq!(store.theme().await.unwrap(), Theme::Dark);
    }
}
