//! Port-based process discovery via `/proc`.
//!
//! Maps a listening TCP port to the owning PID by reading the kernel socket
//! table (`/proc/net/tcp`, `/proc/net/tcp6`) and resolving the socket inode
//! through `/proc/[pid]/fd`. Processes that raise permission errors or vanish
//! mid-scan are silently skipped; an unmatched port yields `None`.

/// TCP LISTEN state in the `/proc/net/tcp` state column.
#[cfg(target_os = "linux")]
const TCP_LISTEN: &str = "0A";

/// Find the PID of the process listening on `port`, if any.
#[cfg(target_os = "linux")]
pub fn find_pid_by_port(port: u16) -> Option<u32> {
    use std::fs;

    for table in ["/proc/net/tcp", "/proc/net/tcp6"] {
        let Ok(content) = fs::read_to_string(table) else {
            continue;
        };
        if let Some(inode) = listening_inode(&content, port) {
            if let Some(pid) = find_pid_by_inode(inode) {
                return Some(pid);
            }
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
pub fn find_pid_by_port(_port: u16) -> Option<u32> {
    None
}

/// Scan one socket table for a LISTEN socket bound to `port`, returning its inode.
#[cfg(target_os = "linux")]
fn listening_inode(table: &str, port: u16) -> Option<u64> {
    for line in table.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 {
            continue;
        }

        // local_address is "<hex ip>:<hex port>"
        let local_port = fields[1]
            .rsplit(':')
            .next()
            .and_then(|p| u16::from_str_radix(p, 16).ok());
        if local_port != Some(port) {
            continue;
        }
        if fields[3] != TCP_LISTEN {
            continue;
        }

        if let Ok(inode) = fields[9].parse::<u64>() {
            if inode != 0 {
                return Some(inode);
            }
        }
    }
    None
}

/// Walk `/proc/[pid]/fd` for every running process looking for the socket inode.
#[cfg(target_os = "linux")]
fn find_pid_by_inode(inode: u64) -> Option<u32> {
    use std::fs;

    let socket_link = format!("socket:[{}]", inode);
    let entries = fs::read_dir("/proc").ok()?;

    for entry in entries.flatten() {
        let Some(pid) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<u32>().ok())
        else {
            continue;
        };

        let fd_dir = format!("/proc/{}/fd", pid);
        // read_dir fails with EACCES for other users' processes; skip those.
        let Ok(fds) = fs::read_dir(&fd_dir) else {
            continue;
        };
        for fd in fds.flatten() {
            if let Ok(link) = fs::read_link(fd.path()) {
                if link.to_string_lossy() == socket_link {
                    return Some(pid);
                }
            }
        }
    }
    None
}

/// Thread count of a process, from the `Threads:` line of `/proc/[pid]/status`.
#[cfg(target_os = "linux")]
pub fn thread_count(pid: u32) -> Option<u32> {
    let status = std::fs::read_to_string(format!("/proc/{}/status", pid)).ok()?;
    status
        .lines()
        .find(|line| line.starts_with("Threads:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|count| count.parse().ok())
}

#[cfg(not(target_os = "linux"))]
pub fn thread_count(_pid: u32) -> Option<u32> {
    None
}

/// Open file descriptor count of a process, from `/proc/[pid]/fd`.
#[cfg(target_os = "linux")]
pub fn fd_count(pid: u32) -> Option<u32> {
    let fd_path = format!("/proc/{}/fd", pid);
    std::fs::read_dir(&fd_path)
        .ok()
        .map(|entries| entries.count() as u32)
}

#[cfg(not(target_os = "linux"))]
pub fn fd_count(_pid: u32) -> Option<u32> {
    None
}
