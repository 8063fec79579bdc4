use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

const DEFAULT_FOCUS_ALERT: &str = "Hey! Remember your goal: {goal}. Stay focused!";
const DEFAULT_POSTURE_FALLBACK: &str = "Please sit up straight and check your posture.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FocusSettings {
    /// Seconds between focus checks.
    pub check_interval: u64,
    /// Alert template; `{goal}` is replaced with the session goal.
    pub alert_message: String,
    pub keep_last: usize,
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            check_interval: 60,
            alert_message: DEFAULT_FOCUS_ALERT.into(),
            keep_last: 10,
        }
    }
}

impl FocusSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.check_interval)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostureSettings {
    /// Seconds between posture checks.
    pub check_interval: u64,
    pub images_per_check: usize,
    pub fallback_message: String,
    pub keep_last: usize,
    /// Camera name passed to the capture tool; the system default when unset.
    pub camera_device: Option<String>,
}

impl Default for PostureSettings {
    fn default() -> Self {
        Self {
            check_interval: 60,
            images_per_check: 3,
            fallback_message: DEFAULT_POSTURE_FALLBACK.into(),
            keep_last: 30,
            camera_device: None,
        }
    }
}

impl PostureSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.check_interval)
    }

    /// Gap between consecutive webcam shots so a batch spreads evenly over one period.
    pub fn image_interval(&self) -> Duration {
        let shots = u32::try_from(self.images_per_check.max(1)).unwrap_or(u32::MAX);
        self.interval() / shots
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoiceSettings {
    pub voice: String,
    pub rate: u32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice: "Samantha".into(),
            rate: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JudgeSettings {
    pub base_url: String,
    pub model: String,
    /// Request timeout in seconds.
    pub timeout: f64,
    pub max_tokens: u32,
}

impl Default for JudgeSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234/v1".into(),
            model: "local-model".into(),
            timeout: 30.0,
            max_tokens: 200,
        }
    }
}

impl JudgeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Also write daily log files here when set.
    pub log_dir: Option<PathBuf>,
    pub retention_days: u64,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_dir: Some(PathBuf::from("/tmp/angeleyes_logs")),
            retention_days: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub focus: FocusSettings,
    pub posture: PostureSettings,
    pub voice: VoiceSettings,
    #[serde(alias = "lmstudio")]
    pub judge: JudgeSettings,
    pub screenshot_dir: PathBuf,
    pub webcam_dir: PathBuf,
    pub logging: LoggingSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            focus: FocusSettings::default(),
            posture: PostureSettings::default(),
            voice: VoiceSettings::default(),
            judge: JudgeSettings::default(),
            screenshot_dir: PathBuf::from("/tmp"),
            webcam_dir: PathBuf::from("/tmp"),
            logging: LoggingSettings::default(),
        }
    }
}

impl AppConfig {
    /// Loads the explicit path if given, otherwise the first default location that exists,
    /// otherwise the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            return Self::from_file(path);
        }

        for path in default_locations() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        // An empty file deserializes to unit, not a mapping.
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_yaml()?)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.focus.check_interval == 0 {
            bail!("focus.check_interval must be greater than zero");
        }
        if self.posture.check_interval == 0 {
            bail!("posture.check_interval must be greater than zero");
        }
        if self.posture.images_per_check == 0 {
            bail!("posture.images_per_check must be greater than zero");
        }
        if self.posture.images_per_check as u64 > self.posture.check_interval {
            bail!("posture.images_per_check cannot exceed posture.check_interval (one shot per second at most)");
        }
        if !(self.judge.timeout.is_finite() && self.judge.timeout > 0.0) {
            bail!("judge.timeout must be a positive number of seconds");
        }
        Ok(())
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".angeleyes").join("config.yaml"));
    }
    paths.push(PathBuf::from("angeleyes.yaml"));
    paths
}
