#![cfg(target_os = "linux")]

use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

use trust_gate::host::{CommandSpawner, MAX_PROBE_LINE_BYTES};
use trust_gate::{ProbeError, ProcessSpawner, MIN_PROCESS_PROBE_TIMEOUT};

// Child accounting below reads process-wide state, so spawning tests run
// one at a time.
fn spawn_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn open_fd_count() -> usize {
    std::fs::read_dir("/proc/self/fd")
        .map(|entries| entries.count())
        .unwrap_or_default()
}

/// Pids of exited-but-unreaped children of this process.
fn zombie_children() -> Vec<u32> {
    let own_pid = std::process::id();
    let Ok(entries) = std::fs::read_dir("/proc") else {
        return Vec::new();
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
        .filter(|pid| {
            let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
                return false;
            };
            // "pid (comm) state ppid ..."; comm may contain spaces or parens.
            let Some((_, rest)) = stat.rsplit_once(')') else {
                return false;
            };
            let mut fields = rest.split_whitespace();
            let state = fields.next();
            let ppid = fields.next().and_then(|raw| raw.parse::<u32>().ok());
            state == Some("Z") && ppid == Some(own_pid)
        })
        .collect()
}

#[test]
fn process_probe_releases_children_on_every_path() {
    let _guard = spawn_lock().lock().expect("spawn lock");
    let spawner = CommandSpawner::new(Duration::from_millis(300));
    let baseline = open_fd_count();

    for _ in 0..8 {
        let line = spawner
            .first_stdout_line("sh", &["-c", "echo /system/xbin/su"])
            .expect("echo probe");
        assert_eq!(line.as_deref(), Some("/system/xbin/su"));

        let silent = spawner
            .first_stdout_line("true", &[])
            .expect("silent probe");
        assert_eq!(silent, None);

        let missing = spawner.first_stdout_line("/definitely/missing/which", &["su"]);
        assert!(matches!(missing, Err(ProbeError::Spawn(_))));

        let started = Instant::now();
        let hung = spawner.first_stdout_line("sleep", &["5"]);
        assert!(matches!(hung, Err(ProbeError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    assert!(zombie_children().is_empty(), "unreaped probe children");

    // Give detached reader threads time to observe their pipes closing.
    std::thread::sleep(Duration::from_millis(200));
    assert!(open_fd_count() <= baseline + 1);
}

#[test]
fn non_utf8_output_still_counts_as_present() {
    let _guard = spawn_lock().lock().expect("spawn lock");
    let spawner = CommandSpawner::new(Duration::from_millis(2_000));

    let line = spawner
        .first_stdout_line("sh", &["-c", "printf '/system/xbin/\\377su\\n'"])
        .expect("invalid utf-8 is not a read failure");
    assert_eq!(line.as_deref(), Some("/system/xbin/\u{FFFD}su"));
}

#[test]
fn unterminated_output_is_capped_and_returns_before_timeout() {
    let _guard = spawn_lock().lock().expect("spawn lock");
    let spawner = CommandSpawner::new(Duration::from_millis(5_000));

    let started = Instant::now();
    let line = spawner
        .first_stdout_line("sh", &["-c", "while :; do printf x; done"])
        .expect("capped read")
        .expect("output present");
    assert_eq!(line.len() as u64, MAX_PROBE_LINE_BYTES);
    assert!(line.bytes().all(|byte| byte == b'x'));
    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(zombie_children().is_empty(), "unreaped probe children");
}

#[test]
fn zero_timeout_is_raised_to_the_floor() {
    let _guard = spawn_lock().lock().expect("spawn lock");
    let spawner = CommandSpawner::new(Duration::ZERO);

    let line = spawner
        .first_stdout_line("sh", &["-c", "echo /sbin/su"])
        .expect("probe still gets a chance to answer");
    assert_eq!(line.as_deref(), Some("/sbin/su"));

    let hung = spawner.first_stdout_line("sleep", &["5"]);
    match hung {
        Err(ProbeError::Timeout { waited_ms, .. }) => {
            assert_eq!(waited_ms, MIN_PROCESS_PROBE_TIMEOUT.as_millis() as u64);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}
