/// Query parameters for collection reads (`GET /api/<resource>?...`).
///
/// Empty values are skipped, so `ListFilter::new().project("")` is the same
/// as no filter at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    params: Vec<(&'static str, String)>,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, key: &'static str, value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return self;
        }
        self.params.retain(|(k, _)| *k != key);
        self.params.push((key, value.to_string()));
        self
    }

    pub fn project(self, project_id: &str) -> Self {
        self.with("project_id", project_id)
    }

    pub fn agent(self, agent_id: &str) -> Self {
        self.with("agent_id", agent_id)
    }

    pub fn status(self, status: &str) -> Self {
        self.with("status", status)
    }

    pub fn assigned_to(self, agent_id: &str) -> Self {
        self.with("assigned_to", agent_id)
    }

    /// Standup date, YYYY-MM-DD
    pub fn date(self, date: &str) -> Self {
        self.with("date", date)
    }

    /// Contexts carrying any of the given tags
    pub fn tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        self.with("tags", &joined)
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_skips_empty_and_replaces() {
        let filter = ListFilter::new()
            .project("p1")
            .agent("  ")
            .project("p2")
            .tags(["api", "", "docs"]);

        assert_eq!(filter.get("project_id"), Some("p2"));
        assert_eq!(filter.get("agent_id"), None);
        assert_eq!(filter.get("tags"), Some("api,docs"));
        assert_eq!(filter.pairs().len(), 2);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(ListFilter::new().is_empty());
        assert!(ListFilter::new().project("").is_empty());
    }
}
