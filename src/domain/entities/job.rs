//! Job envelope, job kinds and their argument payloads.
//!
//! Jobs are persisted in the `jobs` table with a kind string and a JSON
//! payload. The kind strings and payload field names are the compatibility
//! surface between the dispatcher and the worker handlers, so they must not
//! change while jobs may still be queued.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Primary key of a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kinds of background work the worker pool understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobKind {
    ParseGeo,
    DetectSpam,
    Expire,
    RemovePending,
}

impl JobKind {
    pub const ALL: [JobKind; 4] = [
        JobKind::ParseGeo,
        JobKind::DetectSpam,
        JobKind::Expire,
        JobKind::RemovePending,
    ];

    /// Persisted kind string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseGeo => "ParseGeoRequestJob",
            Self::DetectSpam => "DetectSpamJob",
            Self::Expire => "ExpirationJob",
            Self::RemovePending => "RemovePendingJob",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a persisted kind string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job kind: {0}")]
pub struct UnknownJobKind(pub String);

impl FromStr for JobKind {
    type Err = UnknownJobKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownJobKind(s.to_string()))
    }
}

/// Typed job arguments bound to exactly one [`JobKind`].
pub trait JobArgs: Serialize + DeserializeOwned + Send + Sync {
    const KIND: JobKind;
}

/// Arguments for geo enrichment of one click.
///
/// `ip` may hold several comma-separated addresses (an `X-Forwarded-For` chain).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseGeoRequest {
    pub ip: String,
    pub slug: String,
}

impl JobArgs for ParseGeoRequest {
    const KIND: JobKind = JobKind::ParseGeo;
}

/// Arguments for a threat scan. An empty `url` scans every active link.
///
/// `after_id` is set on the continuation of a sweep that ran out of time;
/// the scan resumes with links whose id is greater.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectSpamRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_id: Option<i64>,
}

impl DetectSpamRequest {
    pub fn scoped(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            after_id: None,
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    /// The same scan, resumed after link `id`.
    pub fn resume_after(&self, id: i64) -> Self {
        Self {
            url: self.url.clone(),
            after_id: Some(id),
        }
    }

    /// The URL filter, or `None` for a full sweep.
    pub fn url_filter(&self) -> Option<&str> {
        let url = self.url.trim();
        (!url.is_empty()).then_some(url)
    }
}

impl JobArgs for DetectSpamRequest {
    const KIND: JobKind = JobKind::DetectSpam;
}

/// Marks every link past its expiry as expired. No payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpireLinks;

impl JobArgs for ExpireLinks {
    const KIND: JobKind = JobKind::Expire;
}

/// Deletes every link still pending confirmation. No payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovePendingLinks;

impl JobArgs for RemovePendingLinks {
    const KIND: JobKind = JobKind::RemovePending;
}

/// A job ready to be inserted into the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub kind: JobKind,
    pub payload: serde_json::Value,
}

impl NewJob {
    /// Serializes typed arguments into a job envelope.
    pub fn from_args<T: JobArgs>(args: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: T::KIND,
            payload: serde_json::to_value(args)?,
        })
    }
}

/// A job row as seen by a worker holding its lease.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub payload: serde_json::Value,
    pub queued_at: DateTime<Utc>,
    pub run_at: DateTime<Utc>,
    /// Deliveries so far, the current one included.
    pub attempts: i32,
    pub last_error: Option<String>,
    pub lease_owner: Option<String>,
    pub lease_expires_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Decodes the payload into the arguments type of this job's kind.
    pub fn decode<T: JobArgs>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// What happens to a job after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Clear the lease and make the job eligible again at the given time.
    RetryAt(DateTime<Utc>),
    /// Remove the job from rotation permanently.
    DeadLetter,
}

/// A failed attempt reported back to the job store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub error: String,
    pub disposition: FailureDisposition,
}

/// A dead-lettered job, for inspection.
#[derive(Debug, Clone)]
pub struct DeadJob {
    pub id: JobId,
    pub kind: String,
    pub payload: serde_json::Value,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub queued_at: DateTime<Utc>,
    pub dead_at: DateTime<Utc>,
}

/// Queue depth snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub pending: i64,
    pub leased: i64,
    pub dead: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_strings_are_stable() {
        assert_eq!(JobKind::ParseGeo.as_str(), "ParseGeoRequestJob");
        assert_eq!(JobKind::DetectSpam.as_str(), "DetectSpamJob");
        assert_eq!(JobKind::Expire.as_str(), "ExpirationJob");
        assert_eq!(JobKind::RemovePending.as_str(), "RemovePendingJob");
    }

    #[test]
    fn test_kind_from_str() {
        for kind in JobKind::ALL {
            assert_eq!(kind.as_str().parse::<JobKind>().unwrap(), kind);
        }
        assert_eq!(
            "SendEmailJob".parse::<JobKind>(),
            Err(UnknownJobKind("SendEmailJob".to_string()))
        );
    }

    #[test]
    fn test_parse_geo_payload_shape() {
        let job = NewJob::from_args(&ParseGeoRequest {
            ip: "1.2.3.4, 5.6.7.8".to_string(),
            slug: "abc123".to_string(),
        })
        .unwrap();

        assert_eq!(job.kind, JobKind::ParseGeo);
        assert_eq!(job.payload, json!({ "ip": "1.2.3.4, 5.6.7.8", "slug": "abc123" }));
    }

    #[test]
    fn test_detect_spam_payload_shape() {
        let job = NewJob::from_args(&DetectSpamRequest::scoped("https://example.com")).unwrap();
        assert_eq!(job.payload, json!({ "url": "https://example.com" }));

        let sweep = NewJob::from_args(&DetectSpamRequest::all()).unwrap();
        assert_eq!(sweep.payload, json!({ "url": "" }));

        let resumed = NewJob::from_args(&DetectSpamRequest::all().resume_after(40)).unwrap();
        assert_eq!(resumed.payload, json!({ "url": "", "after_id": 40 }));
    }

    #[test]
    fn test_housekeeping_jobs_have_no_payload() {
        assert_eq!(NewJob::from_args(&ExpireLinks).unwrap().payload, json!(null));
        assert_eq!(
            NewJob::from_args(&RemovePendingLinks).unwrap().payload,
            json!(null)
        );
    }

    #[test]
    fn test_url_filter() {
        assert_eq!(DetectSpamRequest::all().url_filter(), None);
        assert_eq!(DetectSpamRequest::scoped("  ").url_filter(), None);
        assert_eq!(
            DetectSpamRequest::scoped("https://a.com").url_filter(),
            Some("https://a.com")
        );
    }

    #[test]
    fn test_detect_spam_accepts_missing_url() {
        let request: DetectSpamRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request.url_filter(), None);
    }

    #[test]
    fn test_decode_rejects_malformed_payload() {
        let job = Job {
            id: JobId(1),
            kind: JobKind::ParseGeo,
            payload: json!({ "slug": 42 }),
            queued_at: Utc::now(),
            run_at: Utc::now(),
            attempts: 0,
            last_error: None,
            lease_owner: None,
            lease_expires_at: None,
        };

        assert!(job.decode::<ParseGeoRequest>().is_err());
    }
}
