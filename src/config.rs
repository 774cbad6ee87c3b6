use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Ualberta,
    Srm,
    Umanitoba,
    Vit,
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Site::Ualberta => write!(f, "ualberta"),
            Site::Srm => write!(f, "srm"),
            Site::Umanitoba => write!(f, "umanitoba"),
            Site::Vit => write!(f, "vit"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_directory")]
    pub directory: String,
    #[serde(default = "default_log_filename")]
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UalbertaConfig {
    #[serde(default = "default_ualberta_start_url")]
    pub start_url: String,
    #[serde(default = "default_results_per_page")]
    pub results_per_page: usize,
    #[serde(default = "default_empty_page_threshold")]
    pub empty_page_threshold: u32,
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: usize,
    // 0 means no page cap
    #[serde(default)]
    pub max_pages: usize,
    #[serde(default = "default_start_page")]
    pub start_page: usize,
    #[serde(default = "default_ualberta_output")]
    pub output: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SrmConfig {
    #[serde(default = "default_srm_base_url")]
    pub base_url: String,
    #[serde(default = "default_srm_start_page")]
    pub start_page: usize,
    #[serde(default = "default_srm_end_page")]
    pub end_page: usize,
    #[serde(default = "default_srm_output")]
    pub output: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UmanitobaConfig {
    #[serde(default = "default_umanitoba_url")]
    pub url: String,
    #[serde(default = "default_umanitoba_output")]
    pub output: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VitConfig {
    #[serde(default = "default_vit_url")]
    pub url: String,
    #[serde(default = "default_vit_load_timeout")]
    pub load_timeout: u64,
    #[serde(default = "default_vit_output")]
    pub output: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_site")]
    pub site: Site,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub logging: LogConfig,

    #[serde(default)]
    pub ualberta: UalbertaConfig,

    #[serde(default)]
    pub srm: SrmConfig,

    #[serde(default)]
    pub umanitoba: UmanitobaConfig,

    #[serde(default)]
    pub vit: VitConfig,
}

// Default implementations
impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_directory(),
            filename: default_log_filename(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            wait_timeout: default_wait_timeout(),
        }
    }
}

impl Default for UalbertaConfig {
    fn default() -> Self {
        Self {
            start_url: default_ualberta_start_url(),
            results_per_page: default_results_per_page(),
            empty_page_threshold: default_empty_page_threshold(),
            checkpoint_interval: default_checkpoint_interval(),
            max_pages: 0,
            start_page: default_start_page(),
            output: default_ualberta_output(),
        }
    }
}

impl Default for SrmConfig {
    fn default() -> Self {
        Self {
            base_url: default_srm_base_url(),
            start_page: default_srm_start_page(),
            end_page: default_srm_end_page(),
            output: default_srm_output(),
        }
    }
}

impl Default for UmanitobaConfig {
    fn default() -> Self {
        Self {
            url: default_umanitoba_url(),
            output: default_umanitoba_output(),
        }
    }
}

impl Default for VitConfig {
    fn default() -> Self {
        Self {
            url: default_vit_url(),
            load_timeout: default_vit_load_timeout(),
            output: default_vit_output(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::FileRead)?;

        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.browser.wait_timeout == 0 {
            return Err(ConfigError::InvalidValue(
                "browser.wait_timeout must be greater than 0".to_string(),
            )
            .into());
        }

        if self.browser.window_width == 0 || self.browser.window_height == 0 {
            return Err(ConfigError::InvalidValue(
                "browser window dimensions must be greater than 0".to_string(),
            )
            .into());
        }

        for (name, url) in [
            ("ualberta.start_url", &self.ualberta.start_url),
            ("srm.base_url", &self.srm.base_url),
            ("umanitoba.url", &self.umanitoba.url),
            ("vit.url", &self.vit.url),
        ] {
            if url.is_empty() {
                return Err(ConfigError::MissingField(name.to_string()).into());
            }
            if !url.starts_with("http") {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must start with http(s): {}",
                    name, url
                ))
                .into());
            }
        }

        for (name, output) in [
            ("ualberta.output", &self.ualberta.output),
            ("srm.output", &self.srm.output),
            ("umanitoba.output", &self.umanitoba.output),
            ("vit.output", &self.vit.output),
        ] {
            if output.is_empty() {
                return Err(ConfigError::MissingField(name.to_string()).into());
            }
        }

        if self.ualberta.results_per_page == 0 {
            return Err(ConfigError::InvalidValue(
                "ualberta.results_per_page must be greater than 0".to_string(),
            )
            .into());
        }

        if self.ualberta.empty_page_threshold == 0 {
            return Err(ConfigError::InvalidValue(
                "ualberta.empty_page_threshold must be greater than 0".to_string(),
            )
            .into());
        }

        if self.ualberta.checkpoint_interval == 0 {
            return Err(ConfigError::InvalidValue(
                "ualberta.checkpoint_interval must be greater than 0".to_string(),
            )
            .into());
        }

        if self.ualberta.start_page == 0 {
            return Err(ConfigError::InvalidValue(
                "ualberta.start_page must be greater than 0".to_string(),
            )
            .into());
        }

        if self.srm.start_page == 0 || self.srm.start_page > self.srm.end_page {
            return Err(ConfigError::InvalidValue(format!(
                "srm page range is invalid: {}..={}",
                self.srm.start_page, self.srm.end_page
            ))
            .into());
        }

        if self.vit.load_timeout == 0 {
            return Err(ConfigError::InvalidValue(
                "vit.load_timeout must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

fn default_site() -> Site {
    Site::Ualberta
}

fn default_headless() -> bool {
    true
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_wait_timeout() -> u64 {
    15
}

fn default_ualberta_start_url() -> String {
    "https://www.ualberta.ca/en/science/about-us/contact-us/faculty-directory/index.html#first=24&sort=relevancy&f:DepartmentFacet=[Computing%20Science,Chemistry,Physics,Mathematics%20%26%20Statistical%20Sciences]&f:RoleFacet=[Staff]".to_string()
}

fn default_results_per_page() -> usize {
    12
}

fn default_empty_page_threshold() -> u32 {
    3
}

fn default_checkpoint_interval() -> usize {
    5
}

fn default_start_page() -> usize {
    1
}

fn default_ualberta_output() -> String {
    "final_results.csv".to_string()
}

fn default_srm_base_url() -> String {
    "https://www.srmist.edu.in/staff-finder/?dept=13540".to_string()
}

fn default_srm_start_page() -> usize {
    3
}

fn default_srm_end_page() -> usize {
    7
}

fn default_srm_output() -> String {
    "srm_faculty_profiles.csv".to_string()
}

fn default_umanitoba_url() -> String {
    "https://umanitoba.ca/science/directory/statistics".to_string()
}

fn default_umanitoba_output() -> String {
    "umanitoba_faculty_full.csv".to_string()
}

fn default_vit_url() -> String {
    "https://stage.vit.ac.in/school/allfaculty/sas/mathematics".to_string()
}

fn default_vit_load_timeout() -> u64 {
    30
}

fn default_vit_output() -> String {
    "vit_mathematics_faculty.csv".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> String {
    "logs".to_string()
}

fn default_log_filename() -> String {
    "faculty-scraper.log".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_and_validate() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.site, Site::Ualberta);
        assert_eq!(config.ualberta.results_per_page, 12);
        assert_eq!(config.ualberta.empty_page_threshold, 3);
        assert_eq!(config.srm.start_page, 3);
        assert_eq!(config.srm.end_page, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn site_selection_parses() {
        let config: Config = toml::from_str("site = \"vit\"").unwrap();
        assert_eq!(config.site, Site::Vit);
    }

    #[test]
    fn rejects_bad_page_range() {
        let config: Config = toml::from_str("[srm]\nstart_page = 9\nend_page = 7").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_http_url() {
        let config: Config = toml::from_str("[vit]\nurl = \"ftp://example.com\"").unwrap();
        assert!(config.validate().is_err());
    }
}
