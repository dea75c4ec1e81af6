use url::Url;
use uuid::Uuid;

/// Per-invocation logging context.
///
/// Built once per webhook and handed to every step of the check, so that each log line can be
/// tied back to the delivery that caused it. The same key names the externally hosted log the
/// commit status links to.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub correlation_id: String,
    pub log_url: String,
}

impl LogContext {
    pub fn new(org: &str, delivery: Option<&str>, log_base: &Url) -> Self {
        let key = match delivery {
            Some(delivery) => delivery.to_owned(),
            None => Uuid::new_v4().to_string(),
        };
        let correlation_id = format!("{}-{}", org, key);
        let log_url = format!(
            "{}/{}",
            log_base.as_str().trim_end_matches('/'),
            correlation_id
        );

        Self {
            correlation_id,
            log_url,
        }
    }
}
