//! Timed notification banners.
//!
//! There are three independent categories. Each shows at most one message;
//! showing a new one replaces the old message and restarts the category's
//! auto-dismiss timer. The other categories are left alone.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use super::model::ClientState;
use super::store::StateStore;
use crate::config::BannerDurations;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BannerKind {
    Error,
    Info,
    Success,
}

impl BannerKind {
    pub const ALL: [BannerKind; 3] = [BannerKind::Error, BannerKind::Info, BannerKind::Success];

    fn index(self) -> usize {
        match self {
            BannerKind::Error => 0,
            BannerKind::Info => 1,
            BannerKind::Success => 2,
        }
    }
}

impl fmt::Display for BannerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BannerKind::Error => write!(f, "error"),
            BannerKind::Info => write!(f, "info"),
            BannerKind::Success => write!(f, "success"),
        }
    }
}

/// A message currently on display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub text: String,
    /// Distinguishes repeated showings of the same text.
    seq: u64,
}

/// The visible banner of each category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BannerSlots {
    slots: [Option<Banner>; 3],
}

impl BannerSlots {
    pub fn get(&self, kind: BannerKind) -> Option<&Banner> {
        self.slots[kind.index()].as_ref()
    }

    /// Text of the visible banner of `kind`.
    pub fn text(&self, kind: BannerKind) -> Option<&str> {
        self.get(kind).map(|banner| banner.text.as_str())
    }

    fn show(&mut self, kind: BannerKind, banner: Banner) {
        self.slots[kind.index()] = Some(banner);
    }

    /// Hide `kind` if it still shows the banner numbered `seq`.
    fn dismiss(&mut self, kind: BannerKind, seq: u64) -> bool {
        let slot = &mut self.slots[kind.index()];
        if slot.as_ref().is_some_and(|banner| banner.seq == seq) {
            *slot = None;
            true
        } else {
            false
        }
    }
}

/// Dismissal timer of a category and the seq of the message it hides.
type TimerSlot = (u64, JoinHandle<()>);

/// Shows banners in a [`StateStore`] and dismisses them on a timer.
///
/// Cheap to clone; clones share timers.
#[derive(Clone)]
pub struct Banners {
    store: StateStore<ClientState>,
    durations: BannerDurations,
    timers: Arc<Mutex<[Option<TimerSlot>; 3]>>,
    next_seq: Arc<AtomicU64>,
}

impl Banners {
    pub fn new(store: StateStore<ClientState>, durations: BannerDurations) -> Self {
        Self {
            store,
            durations,
            timers: Arc::new(Mutex::new([None, None, None])),
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Show `text` in `kind` for the category's configured duration.
    pub async fn show(&self, kind: BannerKind, text: impl Into<String>) {
        self.show_for(kind, text, self.durations.for_kind(kind)).await;
    }

    pub async fn error(&self, text: impl Into<String>) {
        self.show(BannerKind::Error, text).await;
    }

    pub async fn info(&self, text: impl Into<String>) {
        self.show(BannerKind::Info, text).await;
    }

    pub async fn success(&self, text: impl Into<String>) {
        self.show(BannerKind::Success, text).await;
    }

    /// Show `text` in `kind`, dismissing it after `duration`.
    pub async fn show_for(&self, kind: BannerKind, text: impl Into<String>, duration: Duration) {
        let text = text.into();
        debug!(%kind, %text, ?duration, "showing banner");
        // Numbered under the write lock so a larger seq is always the later
        // slot write.
        let next_seq = Arc::clone(&self.next_seq);
        let seq = self
            .store
            .modify(|state| {
                let seq = next_seq.fetch_add(1, Ordering::Relaxed) + 1;
                state.banners.show(kind, Banner { text, seq });
                seq
            })
            .await;

        let store = self.store.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let dismissed = store
                .modify(|state| state.banners.dismiss(kind, seq))
                .await;
            if dismissed {
                debug!(%kind, "banner dismissed");
            }
        });
        self.install_timer(kind, seq, timer);
    }

    /// Keep the timer of the newest message in `kind` and abort the other.
    fn install_timer(&self, kind: BannerKind, seq: u64, timer: JoinHandle<()>) {
        let mut timers = self.lock_timers();
        let slot = &mut timers[kind.index()];
        if slot.as_ref().is_some_and(|(current, _)| *current > seq) {
            timer.abort();
            return;
        }
        if let Some((_, previous)) = slot.replace((seq, timer)) {
            previous.abort();
        }
    }

    /// Stop every pending timer. Visible banners are left as they are.
    pub fn cancel_timers(&self) {
        for (_, timer) in self.lock_timers().iter_mut().filter_map(Option::take) {
            timer.abort();
        }
    }

    fn lock_timers(&self) -> std::sync::MutexGuard<'_, [Option<TimerSlot>; 3]> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banners() -> (StateStore<ClientState>, Banners) {
        let store = StateStore::new(ClientState::default());
        let banners = Banners::new(store.clone(), BannerDurations::default());
        (store, banners)
    }

    async fn text(store: &StateStore<ClientState>, kind: BannerKind) -> Option<String> {
        store.read().await.banners.text(kind).map(str::to_owned)
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_banner_hides_after_default_duration() {
        let (store, banners) = banners();
        banners.error("Insufficient credit").await;
        assert_eq!(text(&store, BannerKind::Error).await.as_deref(), Some("Insufficient credit"));

        sleep_ms(4999).await;
        assert!(text(&store, BannerKind::Error).await.is_some());

        sleep_ms(2).await;
        assert_eq!(text(&store, BannerKind::Error).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_message_restarts_timer() {
        let (store, banners) = banners();
        banners.error("first").await;
        sleep_ms(3000).await;
        banners.error("second").await;

        // The first message's timer would have fired here.
        sleep_ms(3000).await;
        assert_eq!(text(&store, BannerKind::Error).await.as_deref(), Some("second"));

        sleep_ms(2001).await;
        assert_eq!(text(&store, BannerKind::Error).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_categories_are_independent() {
        let (store, banners) = banners();
        banners.error("broken").await;
        sleep_ms(1000).await;
        banners.success("Vend Completed").await;
        banners.show_for(BannerKind::Info, "brief", Duration::from_millis(100)).await;

        sleep_ms(101).await;
        assert_eq!(text(&store, BannerKind::Info).await, None);
        assert!(text(&store, BannerKind::Error).await.is_some());

        sleep_ms(4000).await;
        assert_eq!(text(&store, BannerKind::Error).await, None);
        assert_eq!(text(&store, BannerKind::Success).await.as_deref(), Some("Vend Completed"));

        sleep_ms(1000).await;
        assert_eq!(text(&store, BannerKind::Success).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_timer_never_replaces_newer() {
        let (store, banners) = banners();
        banners.error("current").await;
        let seq = store.read().await.banners.get(BannerKind::Error).unwrap().seq;

        // A late install for an earlier message must leave the current timer.
        let late = tokio::spawn(std::future::pending::<()>());
        banners.install_timer(BannerKind::Error, seq - 1, late);

        sleep_ms(5001).await;
        assert_eq!(text(&store, BannerKind::Error).await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_messages_are_all_dismissed() {
        let store = StateStore::new(ClientState::default());
        let banners = Banners::new(
            store.clone(),
            BannerDurations::uniform(Duration::from_millis(5)),
        );

        for round in 0..50 {
            let shows: Vec<_> = (0..8)
                .map(|i| {
                    let banners = banners.clone();
                    tokio::spawn(async move { banners.error(format!("{round}-{i}")).await })
                })
                .collect();
            for show in shows {
                show.await.unwrap();
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert_eq!(text(&store, BannerKind::Error).await, None, "round {round}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_once_per_message() {
        let (store, banners) = banners();
        banners.info("hello").await;
        let before = store.version();

        sleep_ms(5001).await;
        // One mutation for the dismissal, none after it.
        assert_eq!(store.version(), before + 1);
        sleep_ms(20_000).await;
        assert_eq!(store.version(), before + 1);
    }
}
