use polycall_pool::{Opener, PoolConfig, PoolError, PoolStrategy, Validator};

/// Everything [`crate::Context::new`] needs to wire up a fresh instance of
/// every subsystem. No file parsing lives here — `.polycallrc`/`Polycallfile`
/// parsing stays a CLI concern; this struct is the extension point a config
/// loader would populate.
pub struct ContextConfig {
    pub pool_config: PoolConfig,
    pub pool_strategy: PoolStrategy,
    pub pool_opener: Opener,
    pub pool_validator: Option<Validator>,
    /// Ring buffer size for the security audit log (`spec.md` §4.7).
    pub audit_capacity: usize,
    /// Size classes handed to the region allocator; `None` keeps its
    /// built-in defaults (`spec.md` §4.8).
    pub region_size_classes: Option<Vec<usize>>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            pool_config: PoolConfig::default(),
            pool_strategy: PoolStrategy::fifo(),
            pool_opener: Box::new(|| Err(PoolError::OpenFailed("no connection opener configured".into()))),
            pool_validator: None,
            audit_capacity: 1024,
            region_size_classes: None,
        }
    }
}
