//! Sound effects and background music
//!
//! Playback is best-effort. Browsers reject `play()` until the first user
//! gesture, so every failure is reported back as an [`AudioError`] for the
//! caller to log and otherwise ignore.

use thiserror::Error;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Piece released from the top
    Drop,
    /// Two pieces fused
    Merge,
}

impl SoundEffect {
    /// Asset path relative to the asset root
    pub fn asset(self) -> &'static str {
        match self {
            SoundEffect::Drop => "assets/sounds/drop.wav",
            SoundEffect::Merge => "assets/sounds/merge.wav",
        }
    }
}

/// Background music asset
pub const MUSIC_ASSET: &str = "assets/sounds/bgm.mp3";

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio unavailable")]
    Unavailable,
    #[error("playback rejected: {0}")]
    Rejected(String),
}

/// Where the game sends sounds
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect) -> Result<(), AudioError>;

    /// Start (or resume) the looping background track
    fn start_music(&mut self) -> Result<(), AudioError>;

    fn stop_music(&mut self);

    fn is_music_playing(&self) -> bool;

    /// Mute/unmute everything
    fn set_enabled(&mut self, enabled: bool);
}

/// Silent sink for headless runs
#[derive(Debug)]
pub struct NullAudio {
    music: bool,
    enabled: bool,
}

impl Default for NullAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl NullAudio {
    pub fn new() -> Self {
        Self {
            music: false,
            enabled: true,
        }
    }
}

impl AudioSink for NullAudio {
    fn play(&mut self, _effect: SoundEffect) -> Result<(), AudioError> {
        Ok(())
    }

    fn start_music(&mut self) -> Result<(), AudioError> {
        self.music = self.enabled;
        Ok(())
    }

    fn stop_music(&mut self) {
        self.music = false;
    }

    fn is_music_playing(&self) -> bool {
        self.music
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.music = false;
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::HtmlAudioElement;

    use super::{AudioError, AudioSink, MUSIC_ASSET, SoundEffect};
    use crate::settings::Settings;

    /// `<audio>` element backed playback
    pub struct WebAudio {
        drop: Option<HtmlAudioElement>,
        merge: Option<HtmlAudioElement>,
        bgm: Option<HtmlAudioElement>,
        sfx_volume: f32,
        enabled: bool,
    }

    fn load(src: &str) -> Option<HtmlAudioElement> {
        let el = HtmlAudioElement::new_with_src(src).ok();
        if el.is_none() {
            log::warn!("Failed to create audio element for {} - sound disabled", src);
        }
        el
    }

    /// Log a rejected play() promise (autoplay policy) without blocking
    fn watch(label: &'static str, promise: js_sys::Promise) {
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = wasm_bindgen_futures::JsFuture::from(promise).await {
                log::info!("{} play failed (will retry): {:?}", label, e);
            }
        });
    }

    impl WebAudio {
        pub fn new(settings: &Settings) -> Self {
            let bgm = load(MUSIC_ASSET);
            if let Some(bgm) = &bgm {
                bgm.set_loop(true);
                bgm.set_volume(settings.music_volume as f64);
            }
            Self {
                drop: load(SoundEffect::Drop.asset()),
                merge: load(SoundEffect::Merge.asset()),
                bgm,
                sfx_volume: settings.sfx_volume,
                enabled: settings.music_enabled,
            }
        }
    }

    impl AudioSink for WebAudio {
        fn play(&mut self, effect: SoundEffect) -> Result<(), AudioError> {
            if !self.enabled || self.sfx_volume <= 0.0 {
                return Ok(());
            }
            let el = match effect {
                SoundEffect::Drop => self.drop.as_ref(),
                SoundEffect::Merge => self.merge.as_ref(),
            }
            .ok_or(AudioError::Unavailable)?;

            // Rewind so rapid repeats restart the clip
            el.set_current_time(0.0);
            el.set_volume(self.sfx_volume as f64);
            let promise = el
                .play()
                .map_err(|e| AudioError::Rejected(format!("{:?}", e)))?;
            watch("sfx", promise);
            Ok(())
        }

        fn start_music(&mut self) -> Result<(), AudioError> {
            let bgm = self.bgm.as_ref().ok_or(AudioError::Unavailable)?;
            if !self.enabled {
                return Ok(());
            }
            let promise = bgm
                .play()
                .map_err(|e| AudioError::Rejected(format!("{:?}", e)))?;
            watch("BGM", promise);
            Ok(())
        }

        fn stop_music(&mut self) {
            if let Some(bgm) = &self.bgm {
                let _ = bgm.pause();
            }
        }

        fn is_music_playing(&self) -> bool {
            // `paused` flips back to true if the play() promise is rejected
            self.bgm.as_ref().is_some_and(|b| !b.paused())
        }

        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
            if !enabled {
                self.stop_music();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_audio_music_follows_enabled() {
        let mut audio = NullAudio::new();
        audio.start_music().unwrap();
        assert!(audio.is_music_playing());

        audio.set_enabled(false);
        assert!(!audio.is_music_playing());
        audio.start_music().unwrap();
        assert!(!audio.is_music_playing());
    }

    #[test]
    fn test_assets() {
        assert_eq!(SoundEffect::Drop.asset(), "assets/sounds/drop.wav");
        assert!(MUSIC_ASSET.ends_with("bgm.mp3"));
    }
}
