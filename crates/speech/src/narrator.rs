//! Best-effort narration of finalized warnings

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};
use warning::{AudioClip, TacticalWarning};

use crate::{SpeechError, SpeechSynthesizer};

/// Wraps an optional synthesizer so that failures only cost the audio
#[derive(Clone)]
pub struct Narrator {
    synth: Option<Arc<dyn SpeechSynthesizer>>,
    timeout: Duration,
}

impl Narrator {
    pub fn new(synth: Option<Arc<dyn SpeechSynthesizer>>, timeout: Duration) -> Self {
        Self { synth, timeout }
    }

    /// Narrator that never produces audio
    pub fn disabled() -> Self {
        Self::new(None, Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        self.synth.is_some()
    }

    /// Synthesize `text`; any failure yields `None`
    pub async fn synthesize(&self, text: &str) -> Option<AudioClip> {
        let synth = self.synth.as_ref()?;
        if text.trim().is_empty() {
            return None;
        }

        let result = match timeout(self.timeout, synth.synthesize(text)).await {
            Ok(result) => result,
            Err(_) => Err(SpeechError::Timeout),
        };

        match result {
            Ok(data) if !data.is_empty() => {
                debug!(bytes = data.len(), "Speech synthesized");
                Some(AudioClip {
                    format: synth.format().to_string(),
                    data,
                })
            }
            Ok(_) => {
                warn!("Speech synthesis returned no audio");
                metrics::counter!("coastwatch_speech_failures_total").increment(1);
                None
            }
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
                metrics::counter!("coastwatch_speech_failures_total").increment(1);
                None
            }
        }
    }

    /// Return `warning` with audio attached when synthesis succeeds
    pub async fn attach_audio(&self, mut warning: TacticalWarning) -> TacticalWarning {
        if self.synth.is_none() {
            return warning;
        }
        warning.audio = self.synthesize(&warning.spoken_text()).await;
        warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use detection::{normalize, RawDetection};
    use std::sync::Mutex;
    use warning::{Assessment, WarningLevel, WarningSource};

    /// Records the text it was asked to speak
    struct RecordingSynth {
        spoken: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl SpeechSynthesizer for RecordingSynth {
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
            self.spoken.lock().unwrap().push(text.to_string());
            if self.fail {
                Err(SpeechError::Status { code: 500, body: "tts down".to_string() })
            } else {
                Ok(vec![0xFF, 0xF3])
            }
        }

        fn format(&self) -> &str {
            "mp3"
        }
    }

    struct SlowSynth;

    #[async_trait]
    impl SpeechSynthesizer for SlowSynth {
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, SpeechError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![1])
        }

        fn format(&self) -> &str {
            "mp3"
        }
    }

    fn alert(source: WarningSource) -> TacticalWarning {
        let dets = normalize(
            &[RawDetection { class_id: 3, confidence: 0.9, bbox: [0.0, 0.0, 50.0, 600.0] }],
            1000,
        );
        TacticalWarning::new(
            Assessment::new(WarningLevel::Alert, "Person at close range.", "Report immediately."),
            source,
            dets,
        )
    }

    fn narrator(synth: Arc<dyn SpeechSynthesizer>) -> Narrator {
        Narrator::new(Some(synth), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_attaches_audio() {
        let synth = Arc::new(RecordingSynth { spoken: Mutex::new(Vec::new()), fail: false });
        let w = narrator(synth.clone()).attach_audio(alert(WarningSource::Primary)).await;

        let audio = w.audio.unwrap();
        assert_eq!(audio.format, "mp3");
        assert_eq!(audio.data, vec![0xFF, 0xF3]);
        assert_eq!(
            synth.spoken.lock().unwrap().as_slice(),
            ["[ALERT] Person at close range. Report immediately."]
        );
    }

    #[tokio::test]
    async fn test_fallback_speaks_summary() {
        let synth = Arc::new(RecordingSynth { spoken: Mutex::new(Vec::new()), fail: false });
        narrator(synth.clone()).attach_audio(alert(WarningSource::Fallback)).await;
        assert_eq!(synth.spoken.lock().unwrap().as_slice(), ["[ALERT] Person at close range."]);
    }

    #[tokio::test]
    async fn test_failure_leaves_warning_untouched() {
        let synth = Arc::new(RecordingSynth { spoken: Mutex::new(Vec::new()), fail: true });
        let original = alert(WarningSource::Primary);
        let w = narrator(synth).attach_audio(original.clone()).await;

        assert_eq!(w, original);
        assert!(w.audio.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_no_audio() {
        let w = narrator(Arc::new(SlowSynth)).attach_audio(alert(WarningSource::Fallback)).await;
        assert!(w.audio.is_none());
        assert_eq!(w.level, WarningLevel::Alert);
        assert_eq!(w.source, WarningSource::Fallback);
    }

    #[tokio::test]
    async fn test_disabled_narrator() {
        let narrator = Narrator::disabled();
        assert!(!narrator.is_enabled());
        assert!(narrator.synthesize("hello").await.is_none());
        assert!(narrator.attach_audio(alert(WarningSource::Primary)).await.audio.is_none());
    }
}
