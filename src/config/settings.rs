//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ProviderKind
// ---------------------------------------------------------------------------

/// The answer providers the pipeline can talk to.
///
/// | Variant | Text prompts | Image prompts |
/// |---------|--------------|---------------|
/// | OpenAi  | Yes          | Yes (URL or data URL) |
/// | Gemini  | No           | Yes (inline or hosted) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
}

impl Default for ProviderKind {
    fn default() -> Self {
        Self::OpenAi
    }
}

impl ProviderKind {
    /// Display name used in status messages.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Gemini => "Gemini",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// ProvidersConfig
// ---------------------------------------------------------------------------

/// Connection settings for both answer providers.
///
/// A provider counts as *configured* when its API key is present and
/// non-empty; see [`ProvidersConfig::openai_key`] / [`ProvidersConfig::gemini_key`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// OpenAI API key; also used for transcription.
    pub openai_api_key: Option<String>,
    /// Google Gemini API key.
    pub gemini_api_key: Option<String>,
    /// Provider used for image prompts when both keys are configured.
    pub preferred: ProviderKind,
    /// Base URL of the OpenAI API (no trailing slash).
    pub openai_base_url: String,
    /// Chat/vision model sent to OpenAI.
    pub openai_model: String,
    /// Base URL of the Gemini API (no trailing slash).
    pub gemini_base_url: String,
    /// Vision model sent to Gemini.
    pub gemini_model: String,
    /// Upper bound on generated tokens for either provider.
    pub max_tokens: u32,
    /// Per-request HTTP timeout.
    pub timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            gemini_api_key: None,
            preferred: ProviderKind::default(),
            openai_base_url: "https://api.openai.com".into(),
            openai_model: "gpt-4o".into(),
            gemini_base_url: "https://generativelanguage.googleapis.com".into(),
            gemini_model: "gemini-2.0-flash".into(),
            max_tokens: 4096,
            timeout_secs: 60,
        }
    }
}

impl ProvidersConfig {
    /// The OpenAI key, if set to a non-empty value.
    pub fn openai_key(&self) -> Option<&str> {
        non_empty(self.openai_api_key.as_deref())
    }

    /// The Gemini key, if set to a non-empty value.
    pub fn gemini_key(&self) -> Option<&str> {
        non_empty(self.gemini_api_key.as_deref())
    }
}

// ---------------------------------------------------------------------------
// ImageHostConfig
// ---------------------------------------------------------------------------

/// Cloudflare Images upload settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageHostConfig {
    /// Cloudflare account hash. `None` means no image host is configured.
    pub cloudflare_account: Option<String>,
    /// Upload endpoint; the account hash is appended as a path segment.
    pub upload_base_url: String,
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self {
            cloudflare_account: None,
            upload_base_url: "https://upload.imagedelivery.net".into(),
        }
    }
}

impl ImageHostConfig {
    /// The account hash, if set to a non-empty value.
    pub fn account(&self) -> Option<&str> {
        non_empty(self.cloudflare_account.as_deref())
    }
}

// ---------------------------------------------------------------------------
// TranscriptionConfig
// ---------------------------------------------------------------------------

/// Settings for the hosted transcription service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Endpoint URL for the multipart transcription request.
    pub endpoint: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// ISO-639-1 language hint.
    pub language: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/audio/transcriptions".into(),
            model: "whisper-1".into(),
            language: "en".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingConfig
// ---------------------------------------------------------------------------

/// Microphone capture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Input device name. `None` means the system default.
    pub device: Option<String>,
    /// Encoded payloads smaller than this are flagged as low confidence.
    pub min_payload_bytes: usize,
    /// Audio beyond this length is discarded.
    pub max_recording_secs: f32,
    /// Save every encoded recording to the temp directory (development aid).
    pub keep_recordings: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            device: None,
            min_payload_bytes: 2000,
            max_recording_secs: 300.0,
            keep_recordings: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ShortcutConfig
// ---------------------------------------------------------------------------

/// Global shortcut accelerators (Electron-style strings).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutConfig {
    /// Capture the screen the window is on and analyze it.
    pub screenshot: String,
    /// Start / stop a voice recording.
    pub voice: String,
    /// Paste a clipboard image while the window has focus.
    pub paste: String,
    pub move_up: String,
    pub move_down: String,
    pub move_left: String,
    pub move_right: String,
    /// Distance in pixels the window moves per press.
    pub move_step: i32,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            screenshot: "CommandOrControl+S".into(),
            voice: "CommandOrControl+D".into(),
            paste: "CommandOrControl+V".into(),
            move_up: "CommandOrControl+Alt+Up".into(),
            move_down: "CommandOrControl+Alt+Down".into(),
            move_left: "CommandOrControl+Alt+Left".into(),
            move_right: "CommandOrControl+Alt+Right".into(),
            move_step: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// PromptConfig
// ---------------------------------------------------------------------------

/// Prompt text used when the session starts and after a reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Restored by Reset.
    pub default_prompt: String,
    /// Prompt in the window when it last closed.
    pub last_prompt: Option<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            default_prompt: "Help me understand this with bullet points.".into(),
            last_prompt: None,
        }
    }
}

impl PromptConfig {
    /// The prompt a new session starts with.
    pub fn initial_prompt(&self) -> &str {
        self.last_prompt.as_deref().unwrap_or(&self.default_prompt)
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window appearance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Initial window size in logical pixels.
    pub window_size: (f32, f32),
    /// Last saved window position. `None` lets the window manager decide.
    pub window_position: Option<(f32, f32)>,
    /// Keep the window floating above all other windows.
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_size: (720.0, 820.0),
            window_position: None,
            always_on_top: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use capture_answer::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub providers: ProvidersConfig,
    pub image_host: ImageHostConfig,
    pub transcription: TranscriptionConfig,
    pub recording: RecordingConfig,
    pub shortcuts: ShortcutConfig,
    pub prompt: PromptConfig,
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.providers.preferred, loaded.providers.preferred);
        assert_eq!(original.providers.openai_model, loaded.providers.openai_model);
        assert_eq!(original.providers.gemini_model, loaded.providers.gemini_model);
        assert_eq!(original.providers.max_tokens, loaded.providers.max_tokens);
        assert_eq!(
            original.image_host.upload_base_url,
            loaded.image_host.upload_base_url
        );
        assert_eq!(original.transcription.model, loaded.transcription.model);
        assert_eq!(
            original.recording.min_payload_bytes,
            loaded.recording.min_payload_bytes
        );
        assert_eq!(original.shortcuts.screenshot, loaded.shortcuts.screenshot);
        assert_eq!(original.shortcuts.voice, loaded.shortcuts.voice);
        assert_eq!(original.prompt.default_prompt, loaded.prompt.default_prompt);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.providers.openai_model, "gpt-4o");
        assert!(config.providers.openai_key().is_none());
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.providers.preferred, ProviderKind::OpenAi);
        assert_eq!(cfg.providers.gemini_model, "gemini-2.0-flash");
        assert_eq!(cfg.providers.max_tokens, 4096);
        assert!(cfg.image_host.account().is_none());
        assert_eq!(cfg.transcription.model, "whisper-1");
        assert_eq!(cfg.recording.min_payload_bytes, 2000);
        assert!(!cfg.recording.keep_recordings);
        assert_eq!(cfg.shortcuts.screenshot, "CommandOrControl+S");
        assert_eq!(cfg.shortcuts.voice, "CommandOrControl+D");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "[image_host]\ncloudflare_account = \"abc123\"\nupload_base_url = \"https://up.example\"\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.image_host.account(), Some("abc123"));
        assert_eq!(cfg.providers.openai_model, "gpt-4o");
    }

    #[test]
    fn partial_section_fills_in_field_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("keys.toml");
        std::fs::write(&path, "[providers]\nopenai_api_key = \"sk-test\"\n").unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.providers.openai_key(), Some("sk-test"));
        assert_eq!(cfg.providers.max_tokens, 4096);
        assert_eq!(cfg.providers.gemini_model, "gemini-2.0-flash");
    }

    #[test]
    fn blank_keys_count_as_unconfigured() {
        let mut cfg = AppConfig::default();
        cfg.providers.openai_api_key = Some("   ".into());
        cfg.providers.gemini_api_key = Some("g-key".into());
        cfg.image_host.cloudflare_account = Some(String::new());

        assert!(cfg.providers.openai_key().is_none());
        assert_eq!(cfg.providers.gemini_key(), Some("g-key"));
        assert!(cfg.image_host.account().is_none());
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.providers.openai_api_key = Some("sk-test".into());
        cfg.providers.preferred = ProviderKind::Gemini;
        cfg.transcription.language = "pt".into();
        cfg.ui.window_position = Some((100.0, 200.0));
        cfg.shortcuts.voice = "Ctrl+Shift+F9".into();

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.providers.openai_key(), Some("sk-test"));
        assert_eq!(loaded.providers.preferred, ProviderKind::Gemini);
        assert_eq!(loaded.transcription.language, "pt");
        assert_eq!(loaded.ui.window_position, Some((100.0, 200.0)));
        assert_eq!(loaded.shortcuts.voice, "Ctrl+Shift+F9");
    }

    #[test]
    fn initial_prompt_prefers_last_prompt() {
        let mut prompt = PromptConfig::default();
        assert_eq!(prompt.initial_prompt(), prompt.default_prompt);

        prompt.last_prompt = Some("Explain the stack trace".into());
        assert_eq!(prompt.initial_prompt(), "Explain the stack trace");

        // A cleared prompt is restored as cleared.
        prompt.last_prompt = Some(String::new());
        assert_eq!(prompt.initial_prompt(), "");
    }

    #[test]
    fn move_shortcuts_default_to_alt_arrows() {
        let shortcuts = ShortcutConfig::default();
        assert_eq!(shortcuts.move_up, "CommandOrControl+Alt+Up");
        assert_eq!(shortcuts.move_right, "CommandOrControl+Alt+Right");
        assert_eq!(shortcuts.paste, "CommandOrControl+V");
        assert_eq!(shortcuts.move_step, 50);
    }
}
