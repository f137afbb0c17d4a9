use std::fs;
use std::process::Command;
use tracing::debug;

/// Command name of the process, empty when it can't be found
pub fn process_name(pid: u32) -> String {
    let name = from_proc(pid).or_else(|| from_ps(pid)).unwrap_or_default();
    strip_newline(name)
}

fn from_proc(pid: u32) -> Option<String> {
    match fs::read(format!("/proc/{}/comm", pid)) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            debug!("process_name: pid: {}, /proc lookup failed: {}", pid, e);
            None
        },
    }
}

fn from_ps(pid: u32) -> Option<String> {
    let output = Command::new("sh").arg("-c").arg(format!("ps o comm c {} | tail -n 1", pid)).output();
    match output {
        Ok(output) if output.status.success() => Some(String::from_utf8_lossy(&output.stdout).into_owned()),
        Ok(output) => {
            debug!("process_name: pid: {}, ps exited with {}", pid, output.status);
            None
        },
        Err(e) => {
            debug!("process_name: pid: {}, ps failed: {}", pid, e);
            None
        },
    }
}

/// Drop exactly one trailing line feed
fn strip_newline(mut name: String) -> String {
    if name.ends_with('\n') {
        name.pop();
    }
    name
}
