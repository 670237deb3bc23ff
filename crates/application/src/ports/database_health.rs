//! Store health information reported to the readiness probe

/// Database health information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseHealth {
    /// Whether the database is reachable and responding
    pub reachable: bool,
    /// Database version or identifier (if available)
    pub version: Option<String>,
    /// Connection pool size (current connections)
    pub pool_size: Option<u32>,
    /// Response time of the health check in milliseconds
    pub response_time_ms: Option<u64>,
}

impl DatabaseHealth {
    /// Create a healthy database status
    #[must_use]
    pub const fn healthy() -> Self {
        Self {
            reachable: true,
            version: None,
            pool_size: None,
            response_time_ms: None,
        }
    }

    /// Create a healthy status with version info
    #[must_use]
    pub fn healthy_with_version(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            ..Self::healthy()
        }
    }

    /// Create an unhealthy status
    #[must_use]
    pub const fn unhealthy() -> Self {
        Self {
            reachable: false,
            version: None,
            pool_size: None,
            response_time_ms: None,
        }
    }

    #[must_use]
    pub const fn with_response_time(mut self, ms: u64) -> Self {
        self.response_time_ms = Some(ms);
        self
    }

    #[must_use]
    pub const fn with_pool_size(mut self, size: u32) -> Self {
        self.pool_size = Some(size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_with_version() {
        let health = DatabaseHealth::healthy_with_version("SQLite 3.45.0")
            .with_pool_size(4)
            .with_response_time(3);
        assert!(health.reachable);
        assert_eq!(health.version.as_deref(), Some("SQLite 3.45.0"));
        assert_eq!(health.pool_size, Some(4));
        assert_eq!(health.response_time_ms, Some(3));
    }

    #[test]
    fn unhealthy() {
        assert!(!DatabaseHealth::unhealthy().reachable);
    }
}
