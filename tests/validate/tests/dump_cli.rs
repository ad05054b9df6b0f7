use alog_region::{Severity, Stage, HEADER_LEN};
use alog_test_validate::{dump_command as alog_dump, Env};

fn stdout_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

#[test]
fn formatted_dump_in_write_order() {
    let env = Env::new();
    let image = env.image_with(
        "boot.alog",
        4096,
        &[
            (Severity::Info, Stage::Early, b"memory training complete"),
            (Severity::Warning, Stage::Boot, b"option ROM skipped"),
            (Severity::Error, Stage::Runtime, b"variable store write failed"),
        ],
    );

    let stdout = stdout_of(alog_dump().arg(&image).assert().success());
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("INFO"));
    assert!(lines[0].contains("early"));
    assert!(lines[0].ends_with("memory training complete"));
    assert!(lines[1].contains("WARNING"));
    assert!(lines[2].contains("runtime"));
}

#[test]
fn stats_describe_the_header() {
    let env = Env::new();
    let image = env.image_with(
        "stats.alog",
        512,
        &[(Severity::Info, Stage::Boot, b"one entry")],
    );

    let stdout = stdout_of(alog_dump().arg("--stats").arg(&image).assert().success());
    assert!(stdout.contains("capacity:  512"));
    // 16-byte frame plus the 9 payload bytes.
    assert!(stdout.contains("used:      25"));
    assert!(stdout.contains("overflow:  false"));
}

#[test]
fn raw_mode_prints_payload_bytes_as_hex() {
    let env = Env::new();
    let image = env.image_with(
        "raw.alog",
        512,
        &[(Severity::Info, Stage::Boot, &[0x00, 0xff, 0x41])],
    );

    let stdout = stdout_of(alog_dump().arg("--raw").arg(&image).assert().success());
    assert!(stdout.contains("00 ff 41"));
}

#[test]
fn corrupt_entries_stop_the_dump_with_a_distinct_code() {
    let env = Env::new();
    let image = env.image_with(
        "corrupt.alog",
        4096,
        &[
            (Severity::Info, Stage::Boot, b"alpha"),
            (Severity::Info, Stage::Boot, b"beta"),
        ],
    );

    // Flip a signature byte of the second entry; "alpha" encodes to 16 + 5 bytes.
    let mut raw = std::fs::read(&image).unwrap();
    raw[HEADER_LEN + 21] ^= 0x01;
    std::fs::write(&image, &raw).unwrap();

    let assert = alog_dump().arg(&image).assert().code(2);
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    // Everything before the corruption is still printed.
    assert!(stdout.contains("alpha"));
    assert!(!stdout.contains("beta"));
}

#[test]
fn truncated_images_stop_the_dump_with_a_distinct_code() {
    let env = Env::new();
    let image = env.image_with(
        "truncated.alog",
        4096,
        &[(Severity::Info, Stage::Boot, b"whole entry")],
    );

    // Push both cursors 8 bytes past the committed log, as a capture cut off
    // mid-write would. Cursors sit at header bytes 16..24 and 24..32.
    let mut raw = std::fs::read(&image).unwrap();
    let used = u64::from_le_bytes(raw[24..32].try_into().unwrap());
    raw[16..24].copy_from_slice(&(used + 8).to_le_bytes());
    raw[24..32].copy_from_slice(&(used + 8).to_le_bytes());
    std::fs::write(&image, &raw).unwrap();

    let assert = alog_dump().arg(&image).assert().code(2);
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.contains("whole entry"));
}

#[test]
fn files_that_are_no_region_fail_cleanly() {
    let env = Env::new();
    let path = env.path("no-region");
    std::fs::write(&path, b"not a log region at all").unwrap();
    alog_dump().arg(&path).assert().code(1);

    alog_dump().arg(env.path("does-not-exist")).assert().code(1);
}
