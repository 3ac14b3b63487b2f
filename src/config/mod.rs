use crate::error::{Error, Result};
use crate::project::DEFAULT_API_VERSION;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the project endpoint URL.
pub const ENDPOINT_ENV: &str = "PROJECT_ENDPOINT";
/// Environment variable holding the model deployment name.
pub const MODEL_ENV: &str = "MODEL_DEPLOYMENT_NAME";
/// Transcript looked up next to the executable when no file is given.
pub const DEFAULT_INPUT_FILE: &str = "interview-transcript.txt";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project endpoint, e.g. `https://<resource>.services.ai.azure.com/api/projects/<name>`.
    pub endpoint: Option<String>,
    /// Model deployment the agent runs on.
    pub model: Option<String>,
    /// Transcript to evaluate. Relative paths resolve against the working directory.
    pub input_file: Option<PathBuf>,
    pub api_version: String,
    /// Tenant passed to the developer CLIs when acquiring tokens.
    pub tenant_id: Option<String>,
    /// Clear the terminal before printing.
    pub clear_screen: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: None,
            input_file: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            tenant_id: None,
            clear_screen: true,
        }
    }
}

/// Values given on the command line. These win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub input_file: Option<PathBuf>,
    pub no_clear: bool,
}

impl Config {
    /// `<config_dir>/interview-eval/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("interview-eval").join("config.toml"))
    }

    /// Load the config file, then layer environment and command-line values on top.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply environment variables. Empty values count as unset.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = non_empty(ENDPOINT_ENV) {
            self.endpoint = Some(endpoint);
        }
        if let Some(model) = non_empty(MODEL_ENV) {
            self.model = Some(model);
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(ref endpoint) = overrides.endpoint {
            self.endpoint = Some(endpoint.clone());
        }
        if let Some(ref model) = overrides.model {
            self.model = Some(model.clone());
        }
        if let Some(ref input_file) = overrides.input_file {
            self.input_file = Some(input_file.clone());
        }
        if overrides.no_clear {
            self.clear_screen = false;
        }
    }

    pub fn endpoint(&self) -> Result<&str> {
        self.endpoint.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "project endpoint not set. Set {ENDPOINT_ENV} or pass --endpoint"
            ))
        })
    }

    pub fn model(&self) -> Result<&str> {
        self.model.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "model deployment not set. Set {MODEL_ENV} or pass --model"
            ))
        })
    }

    /// Path of the transcript to evaluate.
    pub fn input_path(&self) -> Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        let exe = std::env::current_exe()?;
        let exe_dir = exe.parent().unwrap_or(Path::new("."));
        Ok(resolve_input(self.input_file.as_deref(), &cwd, exe_dir))
    }
}

fn resolve_input(input_file: Option<&Path>, cwd: &Path, exe_dir: &Path) -> PathBuf {
    match input_file {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => cwd.join(path),
        None => exe_dir.join(DEFAULT_INPUT_FILE),
    }
}
