//! Command prefixing for timing and per-node dispatch.

/// Timing instrumentation prefix.
pub const TIME_PREFIX: &str = "time";

/// Distributed launcher used for per-node dispatch and parallel batches.
pub const LAUNCHER: &str = "mpiexec";

/// Prefix `line` with `prefix` when `condition` holds.
///
/// A line whose leading tokens already equal the prefix tokens is returned
/// unchanged, so wrapping twice with the same prefix is a no-op. When a prefix
/// is added, the original line is re-tokenized on whitespace and joined with
/// single spaces; runs of internal whitespace are not preserved.
pub fn wrap(prefix: &str, line: &str, condition: bool) -> String {
    if !condition || is_wrapped(prefix, line) {
        return line.to_string();
    }

    prefix
        .split_whitespace()
        .chain(line.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether `line` already begins with every token of `prefix`.
pub fn is_wrapped(prefix: &str, line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    let mut matched = false;
    for expected in prefix.split_whitespace() {
        if tokens.next() != Some(expected) {
            return false;
        }
        matched = true;
    }
    matched
}

/// Prefix with the timing binary.
pub fn time_wrap(line: &str, auto_time: bool) -> String {
    wrap(TIME_PREFIX, line, auto_time)
}

/// Launcher prefix that starts `per_node` ranks on every allocated node.
pub fn per_node_prefix(per_node: u32) -> String {
    format!("{LAUNCHER} -npernode {per_node}")
}
