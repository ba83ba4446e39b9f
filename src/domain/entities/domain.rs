//! Domain entity used for host-level policy during link creation.

use chrono::{DateTime, Utc};

/// A target host known to the service.
///
/// Links whose host is blacklisted are rejected at creation time.
#[derive(Debug, Clone)]
pub struct Domain {
    pub host: String,
    pub blacklisted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Domain {
    /// Creates a new Domain instance.
    pub fn new(
        host: String,
        blacklisted: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            host,
            blacklisted,
            created_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_creation() {
        let now = Utc::now();
        let domain = Domain::new("spam.example".to_string(), true, now, now);

        assert_eq!(domain.host, "spam.example");
        assert!(domain.blacklisted);
        assert_eq!(domain.created_at, now);
    }
}
