//! Media carousel state machine.
//!
//! Drives an auto-advancing gallery of images and videos. All timing is
//! explicit: the owner calls [`Carousel::tick`] with the current instant and
//! the carousel decides whether anything is due. Video playback goes through
//! the [`PlaybackControl`] trait so the state machine stays independent of
//! how a video is actually rendered.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::domain::{MediaItem, MediaKind};

/// Slide hold time before auto-advancing.
pub const AUTO_ADVANCE_INTERVAL: Duration = Duration::from_secs(5);
/// Pause after a video finishes before moving to the next slide.
pub const VIDEO_ENDED_DELAY: Duration = Duration::from_secs(1);

/// Playback surface for one video slide.
pub trait PlaybackControl: Send {
    fn play(&mut self);
    fn pause(&mut self);
    /// Rewind to the start without playing.
    fn reset(&mut self);
    fn is_playing(&self) -> bool;
}

/// Carousel over a fixed item list.
///
/// Invariants: `current` stays in `[0, items.len())` whenever items exist; at
/// most one video plays at a time and `active_video` points at it; the
/// auto-advance timer never fires while a video is playing.
pub struct Carousel {
    items: Vec<MediaItem>,
    current: usize,
    auto_advance: bool,
    active_video: Option<usize>,
    players: HashMap<usize, Box<dyn PlaybackControl>>,
    next_advance_at: Option<Instant>,
    pending_advance_at: Option<Instant>,
}

impl Carousel {
    /// A single item disables auto-advance entirely; navigation on one slide
    /// is meaningless.
    pub fn new(items: Vec<MediaItem>, now: Instant) -> Self {
        let many = items.len() > 1;
        Self {
            items,
            current: 0,
            auto_advance: many,
            active_video: None,
            players: HashMap::new(),
            next_advance_at: many.then(|| now + AUTO_ADVANCE_INTERVAL),
            pending_advance_at: None,
        }
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_item(&self) -> Option<&MediaItem> {
        self.items.get(self.current)
    }

    pub fn is_auto_advancing(&self) -> bool {
        self.auto_advance
    }

    pub fn active_video(&self) -> Option<usize> {
        self.active_video
    }

    pub fn is_video_playing(&self, index: usize) -> bool {
        self.players.get(&index).map(|p| p.is_playing()).unwrap_or(false)
    }

    /// Attach the playback surface for the video at `index`. Non-video
    /// slides never get a player.
    pub fn register_player(&mut self, index: usize, player: Box<dyn PlaybackControl>) {
        if matches!(self.items.get(index), Some(item) if item.kind == MediaKind::Video) {
            self.players.insert(index, player);
        }
    }

    /// Advance time. Fires the post-video settle advance first, then the
    /// regular auto-advance if it is due and no video is playing.
    pub fn tick(&mut self, now: Instant) {
        if self.items.len() <= 1 {
            return;
        }

        if let Some(at) = self.pending_advance_at {
            if now >= at {
                self.pending_advance_at = None;
                self.next();
                return;
            }
        }

        if !self.auto_advance || self.active_video.is_some() {
            self.next_advance_at = None;
            return;
        }

        match self.next_advance_at {
            Some(at) if now >= at => {
                self.current = (self.current + 1) % self.items.len();
                self.next_advance_at = Some(now + AUTO_ADVANCE_INTERVAL);
            }
            Some(_) => {}
            None => self.next_advance_at = Some(now + AUTO_ADVANCE_INTERVAL),
        }
    }

    /// Jump to a slide. Manual navigation takes over from the timer: it
    /// stops auto-advance, stops and rewinds every video, and cancels any
    /// pending post-video transition.
    pub fn navigate_to(&mut self, index: usize) {
        if self.items.is_empty() {
            return;
        }
        self.current = index % self.items.len();
        self.auto_advance = false;
        self.next_advance_at = None;
        self.pending_advance_at = None;
        for player in self.players.values_mut() {
            player.pause();
            player.reset();
        }
        self.active_video = None;
    }

    pub fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.navigate_to((self.current + 1) % self.items.len());
    }

    pub fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.navigate_to((self.current + self.items.len() - 1) % self.items.len());
    }

    /// Play/pause the video at `index`, enforcing playback exclusivity.
    /// Starting a video re-arms `auto_advance`, but the active-video guard
    /// holds the timer until playback stops.
    pub fn toggle_video(&mut self, index: usize) {
        let is_video = matches!(self.items.get(index), Some(item) if item.kind == MediaKind::Video);
        if !is_video {
            return;
        }

        if self.is_video_playing(index) {
            if let Some(player) = self.players.get_mut(&index) {
                player.pause();
            }
            self.active_video = None;
            return;
        }

        // Pause everything else before starting this one.
        for (i, player) in self.players.iter_mut() {
            if *i != index {
                player.pause();
            }
        }
        if let Some(player) = self.players.get_mut(&index) {
            player.play();
        }
        self.active_video = Some(index);
        self.auto_advance = true;
        self.next_advance_at = None;
    }

    /// The video at `index` ran to the end: clear the active slot and, when
    /// there is somewhere to go, advance one slide after a short settle.
    pub fn on_video_ended(&mut self, _index: usize, now: Instant) {
        self.active_video = None;
        if self.items.len() > 1 {
            self.pending_advance_at = Some(now + VIDEO_ENDED_DELAY);
        }
    }

    /// Playback failed: the URL was sniffed as video but isn't one. Demote
    /// the slide to an image so it renders instead of erroring forever.
    pub fn on_video_error(&mut self, index: usize) {
        if let Some(item) = self.items.get_mut(index) {
            item.kind = MediaKind::Image;
        }
        self.players.remove(&index);
        if self.active_video == Some(index) {
            self.active_video = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct FakePlayer {
        label: &'static str,
        playing: Arc<Mutex<bool>>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl FakePlayer {
        fn new(label: &'static str, log: Arc<Mutex<Vec<String>>>) -> (Self, Arc<Mutex<bool>>) {
            let playing = Arc::new(Mutex::new(false));
            (
                Self {
                    label,
                    playing: playing.clone(),
                    log,
                },
                playing,
            )
        }
    }

    impl PlaybackControl for FakePlayer {
        fn play(&mut self) {
            *self.playing.lock().unwrap() = true;
            self.log.lock().unwrap().push(format!("play:{}", self.label));
        }

        fn pause(&mut self) {
            *self.playing.lock().unwrap() = false;
            self.log.lock().unwrap().push(format!("pause:{}", self.label));
        }

        fn reset(&mut self) {
            self.log.lock().unwrap().push(format!("reset:{}", self.label));
        }

        fn is_playing(&self) -> bool {
            *self.playing.lock().unwrap()
        }
    }

    fn image(url: &str) -> MediaItem {
        MediaItem {
            url: url.to_string(),
            kind: MediaKind::Image,
        }
    }

    fn video(url: &str) -> MediaItem {
        MediaItem {
            url: url.to_string(),
            kind: MediaKind::Video,
        }
    }

    fn images(n: usize) -> Vec<MediaItem> {
        (0..n).map(|i| image(&format!("/uploads/{i}.jpg"))).collect()
    }

    #[test]
    fn test_auto_advance_wraps_on_interval() {
        let now = Instant::now();
        let mut carousel = Carousel::new(images(3), now);

        carousel.tick(now + Duration::from_secs(4));
        assert_eq!(carousel.current_index(), 0);

        carousel.tick(now + Duration::from_secs(5));
        assert_eq!(carousel.current_index(), 1);

        carousel.tick(now + Duration::from_secs(10));
        assert_eq!(carousel.current_index(), 2);

        carousel.tick(now + Duration::from_secs(15));
        assert_eq!(carousel.current_index(), 0);
    }

    #[test]
    fn test_manual_navigation_wraps_both_ends() {
        let now = Instant::now();
        let mut carousel = Carousel::new(images(5), now);

        carousel.previous();
        assert_eq!(carousel.current_index(), 4);

        carousel.next();
        assert_eq!(carousel.current_index(), 0);

        carousel.navigate_to(4);
        carousel.next();
        assert_eq!(carousel.current_index(), 0);
    }

    #[test]
    fn test_manual_navigation_disables_auto_advance() {
        let now = Instant::now();
        let mut carousel = Carousel::new(images(3), now);

        carousel.navigate_to(2);
        assert!(!carousel.is_auto_advancing());

        carousel.tick(now + Duration::from_secs(60));
        assert_eq!(carousel.current_index(), 2);
    }

    #[test]
    fn test_manual_navigation_stops_and_rewinds_videos() {
        let now = Instant::now();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut carousel = Carousel::new(vec![video("/uploads/a.mp4"), image("/uploads/b.jpg")], now);
        let (player, playing) = FakePlayer::new("a", log.clone());
        carousel.register_player(0, Box::new(player));

        carousel.toggle_video(0);
        assert!(*playing.lock().unwrap());
        assert_eq!(carousel.active_video(), Some(0));

        carousel.navigate_to(1);
        assert!(!*playing.lock().unwrap());
        assert_eq!(carousel.active_video(), None);
        let log = log.lock().unwrap();
        assert!(log.ends_with(&["pause:a".to_string(), "reset:a".to_string()]));
    }

    #[test]
    fn test_video_exclusivity_pauses_other_first() {
        let now = Instant::now();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut carousel =
            Carousel::new(vec![video("/uploads/a.mp4"), video("/uploads/b.mp4")], now);
        let (player_a, playing_a) = FakePlayer::new("a", log.clone());
        let (player_b, playing_b) = FakePlayer::new("b", log.clone());
        carousel.register_player(0, Box::new(player_a));
        carousel.register_player(1, Box::new(player_b));

        carousel.toggle_video(0);
        assert!(*playing_a.lock().unwrap());

        carousel.toggle_video(1);
        assert!(!*playing_a.lock().unwrap());
        assert!(*playing_b.lock().unwrap());
        assert_eq!(carousel.active_video(), Some(1));

        // A was paused before B started.
        let log = log.lock().unwrap();
        let pause_a = log.iter().position(|e| e == "pause:a").unwrap();
        let play_b = log.iter().position(|e| e == "play:b").unwrap();
        assert!(pause_a < play_b);
    }

    #[test]
    fn test_toggle_pauses_a_playing_video() {
        let now = Instant::now();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut carousel = Carousel::new(vec![video("/uploads/a.mp4"), image("/b.jpg")], now);
        let (player, playing) = FakePlayer::new("a", log);
        carousel.register_player(0, Box::new(player));

        carousel.toggle_video(0);
        carousel.toggle_video(0);
        assert!(!*playing.lock().unwrap());
        assert_eq!(carousel.active_video(), None);
    }

    #[test]
    fn test_no_auto_advance_while_video_plays() {
        let now = Instant::now();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut carousel =
            Carousel::new(vec![video("/uploads/a.mp4"), image("/uploads/b.jpg")], now);
        let (player, _) = FakePlayer::new("a", log);
        carousel.register_player(0, Box::new(player));

        carousel.toggle_video(0);
        assert!(carousel.is_auto_advancing());

        carousel.tick(now + Duration::from_secs(30));
        assert_eq!(carousel.current_index(), 0);
    }

    #[test]
    fn test_video_ended_advances_after_delay() {
        let now = Instant::now();
        let mut carousel = Carousel::new(images(3), now);
        carousel.navigate_to(1);

        carousel.on_video_ended(1, now);
        assert_eq!(carousel.active_video(), None);

        carousel.tick(now + Duration::from_millis(500));
        assert_eq!(carousel.current_index(), 1);

        carousel.tick(now + Duration::from_secs(1));
        assert_eq!(carousel.current_index(), 2);
    }

    #[test]
    fn test_video_ended_wraps_from_last_slide() {
        let now = Instant::now();
        let mut carousel = Carousel::new(images(3), now);
        carousel.navigate_to(2);

        carousel.on_video_ended(2, now);
        carousel.tick(now + Duration::from_secs(1));
        assert_eq!(carousel.current_index(), 0);
    }

    #[test]
    fn test_video_ended_single_item_stays_put() {
        let now = Instant::now();
        let mut carousel = Carousel::new(vec![video("/uploads/a.mp4")], now);

        carousel.on_video_ended(0, now);
        carousel.tick(now + Duration::from_secs(2));
        assert_eq!(carousel.current_index(), 0);
    }

    #[test]
    fn test_single_item_never_auto_advances() {
        let now = Instant::now();
        let mut carousel = Carousel::new(images(1), now);
        assert!(!carousel.is_auto_advancing());

        carousel.tick(now + Duration::from_secs(60));
        assert_eq!(carousel.current_index(), 0);
    }

    #[test]
    fn test_empty_carousel_is_inert() {
        let now = Instant::now();
        let mut carousel = Carousel::new(Vec::new(), now);

        carousel.tick(now + Duration::from_secs(10));
        carousel.next();
        carousel.previous();
        carousel.navigate_to(3);
        carousel.toggle_video(0);

        assert!(carousel.is_empty());
        assert!(carousel.current_item().is_none());
    }

    #[test]
    fn test_video_error_demotes_to_image() {
        let now = Instant::now();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut carousel =
            Carousel::new(vec![video("/uploads/clip"), image("/uploads/b.jpg")], now);
        let (player, _) = FakePlayer::new("a", log);
        carousel.register_player(0, Box::new(player));
        carousel.toggle_video(0);

        carousel.on_video_error(0);
        assert_eq!(carousel.items()[0].kind, MediaKind::Image);
        assert_eq!(carousel.active_video(), None);

        // Demoted slides no longer respond to playback events.
        carousel.toggle_video(0);
        assert_eq!(carousel.active_video(), None);
    }

    #[test]
    fn test_register_player_ignores_image_slides() {
        let now = Instant::now();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut carousel = Carousel::new(images(2), now);
        let (player, _) = FakePlayer::new("a", log);
        carousel.register_player(0, Box::new(player));

        carousel.toggle_video(0);
        assert_eq!(carousel.active_video(), None);
        assert!(!carousel.is_video_playing(0));
    }

    #[test]
    fn test_timer_rearms_after_video_stops() {
        let now = Instant::now();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut carousel =
            Carousel::new(vec![video("/uploads/a.mp4"), image("/uploads/b.jpg")], now);
        let (player, _) = FakePlayer::new("a", log);
        carousel.register_player(0, Box::new(player));

        carousel.toggle_video(0);
        carousel.tick(now + Duration::from_secs(10));
        assert_eq!(carousel.current_index(), 0);

        // Pausing clears the guard; the next tick re-arms the timer and a
        // later one fires it.
        carousel.toggle_video(0);
        carousel.tick(now + Duration::from_secs(11));
        assert_eq!(carousel.current_index(), 0);
        carousel.tick(now + Duration::from_secs(16));
        assert_eq!(carousel.current_index(), 1);
    }
}
