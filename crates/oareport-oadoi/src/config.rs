//! oaDOI client configuration

/// oaDOI v2 endpoint; the cleaned DOI is appended directly.
pub const DEFAULT_BASE_URL: &str = "https://api.oadoi.org/v2/";

/// Runtime configuration for [`OadoiClient`](crate::OadoiClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base endpoint, must end with `/`
    pub base_url: String,
    /// Contact email sent as the `email` query parameter (required by the API)
    pub email: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            email: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://api.oadoi.org/v2/");
        assert!(config.email.is_empty());
    }
}
