//! Results of a scenario run.

use exertion_types::{ExecState, Exertion};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Outcome of one dispatch.
#[derive(Debug, Clone)]
pub struct ExertionReport {
    pub name: String,
    /// `None` when `exert()` returned an error.
    pub status: Option<ExecState>,
    pub trace: Vec<String>,
    pub exceptions: Vec<String>,
    pub error: Option<String>,
    pub elapsed: Duration,
}

impl ExertionReport {
    pub fn from_result(exertion: &Exertion, elapsed: Duration) -> Self {
        Self {
            name: exertion.name().to_string(),
            status: Some(exertion.status()),
            trace: exertion.control().trace().to_vec(),
            exceptions: exertion
                .all_exceptions()
                .iter()
                .map(|e| e.to_string())
                .collect(),
            error: None,
            elapsed,
        }
    }

    pub fn from_error(name: &str, error: impl fmt::Display, elapsed: Duration) -> Self {
        Self {
            name: name.to_string(),
            status: None,
            trace: Vec::new(),
            exceptions: Vec::new(),
            error: Some(error.to_string()),
            elapsed,
        }
    }
}

/// Everything a scenario run produced.
#[derive(Debug, Clone, Default)]
pub struct ScenarioReport {
    pub name: String,
    pub results: Vec<ExertionReport>,
    /// Highest number of overlapping calls seen by any exclusive provider.
    pub max_exclusive_in_flight: usize,
    pub committed_txns: usize,
    pub aborted_txns: usize,
}

impl ScenarioReport {
    /// Number of dispatches that ended in `status`.
    pub fn count(&self, status: ExecState) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == Some(status))
            .count()
    }

    /// Number of dispatches that returned an error.
    pub fn errors(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }

    /// Dispatch counts keyed by outcome.
    pub fn summary(&self) -> BTreeMap<String, usize> {
        let mut summary = BTreeMap::new();
        for result in &self.results {
            let key = match result.status {
                Some(status) => status.to_string(),
                None => "ERR".to_string(),
            };
            *summary.entry(key).or_insert(0) += 1;
        }
        summary
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "scenario: {}", self.name)?;
        for result in &self.results {
            match (&result.status, &result.error) {
                (Some(status), _) => writeln!(
                    f,
                    "  {:<20} {:<8} {:>6}ms",
                    result.name,
                    status,
                    result.elapsed.as_millis()
                )?,
                (None, Some(error)) => writeln!(f, "  {:<20} ERR      {}", result.name, error)?,
                (None, None) => writeln!(f, "  {:<20} ?", result.name)?,
            }
            for line in &result.trace {
                writeln!(f, "      trace: {line}")?;
            }
            for exception in &result.exceptions {
                writeln!(f, "      fault: {exception}")?;
            }
        }

        let summary = self
            .summary()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(f, "summary: {summary}")?;
        write!(
            f,
            "txns: committed={} aborted={} exclusive_max_in_flight={}",
            self.committed_txns, self.aborted_txns, self.max_exclusive_in_flight
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, status: Option<ExecState>) -> ExertionReport {
        ExertionReport {
            name: name.into(),
            status,
            trace: vec![],
            exceptions: vec![],
            error: status.is_none().then(|| "boom".to_string()),
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_summary_counts() {
        let report = ScenarioReport {
            name: "s".into(),
            results: vec![
                report("a", Some(ExecState::Done)),
                report("b", Some(ExecState::Done)),
                report("c", Some(ExecState::Failed)),
                report("d", None),
            ],
            ..Default::default()
        };

        assert_eq!(report.count(ExecState::Done), 2);
        assert_eq!(report.errors(), 1);
        let summary = report.summary();
        assert_eq!(summary["DONE"], 2);
        assert_eq!(summary["FAILED"], 1);
        assert_eq!(summary["ERR"], 1);
        assert!(report.to_string().contains("summary: DONE=2 ERR=1 FAILED=1"));
    }
}
