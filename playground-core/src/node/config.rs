/// Configuration for node execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Maximum attempts for node execution, the first one included
    pub max_retries: usize,
    /// Timeout for a single attempt in seconds
    pub timeout: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: 30,
        }
    }
}

impl NodeConfig {
    pub fn builder() -> NodeConfigBuilder {
        NodeConfigBuilder::new()
    }
}

/// Builder for node configuration
#[derive(Debug, Default)]
pub struct NodeConfigBuilder {
    config: NodeConfig,
}

impl NodeConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: NodeConfig::default(),
        }
    }

    pub fn max_retries(mut self, retries: usize) -> Self {
        self.config.max_retries = retries.max(1);
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.config.timeout = seconds;
        self
    }

    pub fn build(self) -> NodeConfig {
        self.config
    }
}
