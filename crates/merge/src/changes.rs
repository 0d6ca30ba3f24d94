use std::fmt::Display;

/// Ordered, human-readable change log produced by the reconciliation passes.
pub type Changes = Vec<String>;

/// Appends a `"<label>: <message>"` entry to the change log.
pub(crate) fn record(changes: &mut Changes, label: &str, message: impl Display) {
    let entry = format!("{label}: {message}");
    tracing::debug!(change = %entry, "Recorded change");
    changes.push(entry);
}

/// Renders an optional value for change logs.
pub(crate) fn or_unset<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "unset".to_string())
}
