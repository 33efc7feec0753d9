use crate::client::ServiceInfo;
use crate::config::VoiceConfig;
use crate::stt::SttClient;
use crate::tts::TtsClient;
use crate::wake::WakeClient;
use serde::Serialize;

/// Reachability of each Wyoming service, as reported on the status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceAvailability {
    pub stt: Option<ServiceInfo>,
    pub tts: Option<ServiceInfo>,
    pub wake: Option<ServiceInfo>,
}

/// The three speech clients built from one [`VoiceConfig`].
#[derive(Debug, Clone)]
pub struct VoiceService {
    config: VoiceConfig,
    stt: SttClient,
    tts: TtsClient,
    wake: WakeClient,
}

impl VoiceService {
    pub fn new(config: VoiceConfig) -> Self {
        let timeout = config.timeout();
        Self {
            stt: SttClient::new(&config.stt_addr, timeout).with_language(config.language.clone()),
            tts: TtsClient::new(&config.tts_addr, timeout).with_voice(config.voice.clone()),
            wake: WakeClient::new(&config.wake_addr, timeout),
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &VoiceConfig {
        &self.config
    }

    pub fn stt(&self) -> &SttClient {
        &self.stt
    }

    pub fn tts(&self) -> &TtsClient {
        &self.tts
    }

    pub fn wake(&self) -> &WakeClient {
        &self.wake
    }

    /// Queries all services concurrently with `describe`; failures become `None`.
    pub async fn availability(&self) -> ServiceAvailability {
        if !self.is_enabled() {
            return ServiceAvailability::default();
        }
        let (stt, tts, wake) = tokio::join!(
            self.stt.describe(),
            self.tts.describe(),
            self.wake.describe()
        );
        let summarize = |name: &str, result: Result<ServiceInfo, crate::VoiceError>| match result {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!(service = name, error = %e, "wyoming service unavailable");
                None
            }
        };
        ServiceAvailability {
            stt: summarize("stt", stt),
            tts: summarize("tts", tts),
            wake: summarize("wake", wake),
        }
    }
}
