use serde::Deserialize;

/// Seed used when neither the config file nor the command line names one
pub const DEFAULT_BASE_URL: &str = "https://books.toscrape.com/";

/// Main configuration structure for Site-Mirror
///
/// Every section is optional in the TOML file; missing keys take the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub seed: SeedConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of page workers running at once
    pub max_concurrent_pages: u32,

    /// Maximum number of image downloads running at once, across all pages
    pub max_concurrent_images: u32,

    /// Deadline for a single fetch, in seconds
    pub request_timeout_secs: u64,

    /// Deadline for establishing a connection, in seconds
    pub connect_timeout_secs: u64,

    /// Download each distinct image URI at most once per crawl
    pub dedupe_images: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_pages: 8,
            max_concurrent_images: 16,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            dedupe_images: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SiteMirror".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory the mirrored tree is written under
    pub root_dir: String,

    /// File name used for the site root and for paths ending in `/`
    pub index_file_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: "./root".to_string(),
            index_file_name: "index.html".to_string(),
        }
    }
}

/// Seed configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SeedConfig {
    /// Absolute URL the crawl starts from
    pub base_url: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.crawler.max_concurrent_pages, 8);
        assert!(config.crawler.dedupe_images);
        assert_eq!(config.output.root_dir, "./root");
        assert_eq!(config.output.index_file_name, "index.html");
        assert_eq!(config.seed.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_user_agent_header_value() {
        let mut ua = UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "2.1".to_string(),
            contact_url: None,
        };
        assert_eq!(ua.header_value(), "TestBot/2.1");

        ua.contact_url = Some("https://example.com/bot".to_string());
        assert_eq!(ua.header_value(), "TestBot/2.1 (+https://example.com/bot)");
    }
}
