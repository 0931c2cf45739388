//! Parser configuration

/// Default limit on start line plus header bytes
pub const DEFAULT_MAX_HEADER_SIZE: u32 = 80 * 1024;

/// Per-parser settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum bytes of start line and headers (and of each chunk-size line)
    pub max_header_size: u32,
    /// Reject deviations from exact HTTP syntax
    pub strict: bool,
}

impl ParserConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        ParserConfig {
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            strict: true,
        }
    }

    /// Strict configuration with default limits
    pub fn strict() -> Self {
        Self::new()
    }

    /// Lenient configuration with default limits
    ///
    /// Accepts bare LF line endings, high-bit bytes and tabs in targets,
    /// spaces inside header names and underscores in host names.
    pub fn lenient() -> Self {
        ParserConfig {
            strict: false,
            ..Self::new()
        }
    }

    pub fn builder() -> ParserConfigBuilder {
        ParserConfigBuilder::new()
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for parser configuration
pub struct ParserConfigBuilder {
    config: ParserConfig,
}

impl ParserConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        ParserConfigBuilder {
            config: ParserConfig::new(),
        }
    }

    /// Set the header byte budget
    pub fn max_header_size(mut self, size: u32) -> Self {
        self.config.max_header_size = size;
        self
    }

    /// Set strict mode
    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ParserConfig {
        self.config
    }
}

impl Default for ParserConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.max_header_size, 80 * 1024);
        assert!(config.strict);
        assert!(!ParserConfig::lenient().strict);
    }

    #[test]
    fn test_config_builder() {
        let config = ParserConfig::builder()
            .max_header_size(1024)
            .strict(false)
            .build();

        assert_eq!(config.max_header_size, 1024);
        assert!(!config.strict);
        assert_eq!(ParserConfigBuilder::new().build(), ParserConfig::strict());
    }
}
