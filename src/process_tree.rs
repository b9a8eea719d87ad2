//! Process-ancestry capture from /proc.
//!
//! The record carries the chain of process names from init down to the
//! current process, which lets collectors tell automated runs (a config
//! agent driving the package manager) from someone typing at a shell.
//! `/proc/<pid>/stat` is read directly; the proc root is a parameter so
//! tests can point the walk at a fixture tree.

use std::path::Path;

/// Upper bound on ancestry depth; bounds the walk if a fixture or a
/// recycled pid produces a ppid cycle.
const MAX_DEPTH: usize = 64;

/// Names of the current process and its ancestors, root-first.
pub fn process_tree() -> Vec<String> {
    process_tree_from(Path::new("/proc"), std::process::id())
}

/// Walk parent links starting at `pid` under `proc_root`.
///
/// Best-effort: an unreadable or unparseable stat entry ends the walk
/// with whatever was collected so far, which may be nothing.
pub fn process_tree_from(proc_root: &Path, pid: u32) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = pid;

    while names.len() < MAX_DEPTH {
        let stat_path = proc_root.join(current.to_string()).join("stat");
        let stat = match std::fs::read_to_string(&stat_path) {
            Ok(s) => s,
            Err(_) => break,
        };
        let Some((name, ppid)) = parse_stat(&stat) else {
            break;
        };
        names.push(name);
        if ppid == 0 || ppid == current {
            break;
        }
        current = ppid;
    }

    names.reverse();
    names
}

/// Extract (comm, ppid) from one `/proc/<pid>/stat` line.
///
/// comm sits between the first '(' and the last ')' and may itself
/// contain spaces and parentheses. The field after the closing paren is
/// the state; ppid is the one after that.
fn parse_stat(stat: &str) -> Option<(String, u32)> {
    let open = stat.find('(')?;
    let close = stat.rfind(')')?;
    if close < open {
        return None;
    }
    let name = stat.get(open + 1..close)?.to_string();
    let rest = stat.get(close + 1..)?;
    let ppid = rest.split_whitespace().nth(1)?.parse().ok()?;
    Some((name, ppid))
}
