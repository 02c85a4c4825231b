use std::str::FromStr;

pub const DEFAULT_LANGUAGE: &str = "uk";
pub const DEFAULT_HOUR_FROM: u32 = 22;
pub const DEFAULT_HOUR_TO: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Process the next task right after the previous one completes.
    #[default]
    Immediate,
    /// Process only during the configured hours; no self-retrigger.
    Scheduled,
}

impl ProcessingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::Immediate => "immediate",
            ProcessingMode::Scheduled => "scheduled",
        }
    }
}

impl FromStr for ProcessingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "immediate" => Ok(ProcessingMode::Immediate),
            "scheduled" => Ok(ProcessingMode::Scheduled),
            _ => Err(format!("Invalid processing mode: {}", s)),
        }
    }
}

/// Configuration surface for the queue.
///
/// The language hint is resolved from here at dispatch time; it is not
/// authoritative on the task itself.
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub openai_api_key: Option<String>,
    pub language: String,
    pub mode: ProcessingMode,
    pub scheduled_hour_from: u32,
    pub scheduled_hour_to: u32,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            language: DEFAULT_LANGUAGE.to_string(),
            mode: ProcessingMode::default(),
            scheduled_hour_from: DEFAULT_HOUR_FROM,
            scheduled_hour_to: DEFAULT_HOUR_TO,
        }
    }
}

impl ProcessingConfig {
    /// Read configuration from the environment, falling back to defaults for
    /// anything absent or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            language: std::env::var("WHISPER_LANGUAGE")
                .ok()
                .filter(|l| !l.is_empty())
                .unwrap_or(defaults.language),
            mode: std::env::var("PROCESSING_MODE")
                .ok()
                .and_then(|m| m.parse().ok())
                .unwrap_or(defaults.mode),
            scheduled_hour_from: read_hour("SCHEDULED_HOUR_FROM", defaults.scheduled_hour_from),
            scheduled_hour_to: read_hour("SCHEDULED_HOUR_TO", defaults.scheduled_hour_to),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

fn read_hour(var: &str, default: u32) -> u32 {
    std::env::var(var)
        .ok()
        .and_then(|h| h.parse::<u32>().ok())
        .filter(|h| *h < 24)
        .unwrap_or(default)
}
