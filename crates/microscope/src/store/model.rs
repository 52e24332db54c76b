// crates/microscope/src/store/model.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of entries the store returns per page of a sorted set.
pub const PAGE_SIZE: u64 = 20;

/// Index of the first entry of a 1-based page, or `None` when the page lies
/// beyond anything a sorted set can address.
pub fn page_offset(page: u64) -> Option<isize> {
    let offset = page.max(1).checked_sub(1)?.checked_mul(PAGE_SIZE)?;
    isize::try_from(offset).ok()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Queue {
    pub job_name: String,
    pub count: i64,
    /// Seconds since the oldest pending job was enqueued.
    pub latency: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerPoolHeartbeat {
    pub worker_pool_id: String,
    pub started_at: i64,
    pub heartbeat_at: i64,
    pub job_names: Vec<String>,
    pub concurrency: u32,
    pub host: String,
    pub pid: i64,
    pub worker_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkerObservation {
    pub worker_id: String,
    pub is_busy: bool,

    pub job_name: String,
    pub job_id: String,
    pub started_at: i64,
    pub args_json: String,

    pub checkin: String,
    pub checkin_at: i64,
}

/// A job as the queue engine serializes it into lists and sorted sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub id: String,
    #[serde(rename = "t")]
    pub enqueued_at: i64,
    #[serde(default)]
    pub args: Map<String, Value>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub unique_key: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub fails: i64,
    #[serde(rename = "err", default, skip_serializing_if = "String::is_empty")]
    pub last_err: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub failed_at: i64,
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryJob {
    pub retry_at: i64,
    #[serde(flatten)]
    pub job: Job,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub run_at: i64,
    #[serde(flatten)]
    pub job: Job,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadJob {
    pub died_at: i64,
    #[serde(flatten)]
    pub job: Job,
}

/// One page of a paginated listing plus the size of the whole set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_offset_counts_from_first_page() {
        assert_eq!(page_offset(0), Some(0));
        assert_eq!(page_offset(1), Some(0));
        assert_eq!(page_offset(3), Some(40));
    }

    #[test]
    fn page_offset_out_of_range_is_none() {
        assert_eq!(page_offset(1_000_000_000_000_000_000), None);
        assert_eq!(page_offset(u64::MAX), None);
    }

    #[test]
    fn dead_job_flattens_job_fields() {
        let dead = DeadJob {
            died_at: 1_620_000_000,
            job: Job {
                name: "send_email".into(),
                id: "job-42".into(),
                enqueued_at: 1_619_999_000,
                args: Map::new(),
                unique: false,
                unique_key: String::new(),
                fails: 4,
                last_err: "smtp timeout".into(),
                failed_at: 1_620_000_000,
            },
        };

        let v = serde_json::to_value(&dead).unwrap();
        assert_eq!(v["died_at"], 1_620_000_000);
        assert_eq!(v["id"], "job-42");
        assert_eq!(v["t"], 1_619_999_000);
        assert_eq!(v["err"], "smtp timeout");
        assert!(v.get("unique").is_none());
        assert!(v.get("job").is_none());
    }

    #[test]
    fn job_decodes_with_missing_optional_fields() {
        let raw = json!({"name": "resize", "id": "abc", "t": 10, "args": {"w": 100}});
        let job: Job = serde_json::from_value(raw).unwrap();

        assert_eq!(job.name, "resize");
        assert_eq!(job.fails, 0);
        assert_eq!(job.args.get("w"), Some(&json!(100)));
    }
}
