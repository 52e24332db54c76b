// crates/microscope/src/store/keys.rs

/// Builds the store keys for one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keys {
    prefix: String,
}

impl Keys {
    pub fn new(namespace: &str) -> Self {
        let mut prefix = namespace.to_string();
        if !prefix.is_empty() && !prefix.ends_with(':') {
            prefix.push(':');
        }
        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn known_jobs(&self) -> String {
        format!("{}known_jobs", self.prefix)
    }

    pub fn jobs(&self, job_name: &str) -> String {
        format!("{}jobs:{}", self.prefix, job_name)
    }

    /// Prefix passed to Lua scripts that rebuild queue keys from job names.
    pub fn jobs_prefix(&self) -> String {
        format!("{}jobs:", self.prefix)
    }

    pub fn worker_pools(&self) -> String {
        format!("{}worker_pools", self.prefix)
    }

    pub fn heartbeat(&self, pool_id: &str) -> String {
        format!("{}worker_pools:{}", self.prefix, pool_id)
    }

    pub fn worker_observation(&self, worker_id: &str) -> String {
        format!("{}worker:{}", self.prefix, worker_id)
    }

    pub fn retry(&self) -> String {
        format!("{}retry", self.prefix)
    }

    pub fn scheduled(&self) -> String {
        format!("{}scheduled", self.prefix)
    }

    pub fn dead(&self) -> String {
        format!("{}dead", self.prefix)
    }
}
