use std::fs;
use std::net::UdpSocket;
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("wledcast"))
}

fn receiver() -> (UdpSocket, String) {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind receiver");
    socket
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("read timeout");
    let addr = socket.local_addr().expect("local addr").to_string();
    (socket, addr)
}

#[test]
fn help_lists_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("preset").and(contains("encode")));
    cmd().arg("preset").arg("--help").assert().success();
}

#[test]
fn preset_is_sent_and_reported() {
    let (socket, addr) = receiver();
    let assert = cmd()
        .arg("preset")
        .arg("5")
        .arg("--dest")
        .arg(&addr)
        .arg("--stdout")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let report: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(report["packet_bytes"], 638);
    assert_eq!(report["destinations"][0]["status"], "sent");
    assert_eq!(report["destinations"][0]["destination"], addr.as_str());

    let mut buf = [0u8; 1500];
    let (len, _) = socket.recv_from(&mut buf).expect("datagram");
    assert_eq!(len, 638);
    assert_eq!(buf[126], 255);
    assert_eq!(buf[127], 5);
}

#[test]
fn missing_destination_shows_error_and_hint() {
    cmd()
        .arg("blackout")
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn invalid_channel_is_rejected() {
    cmd()
        .arg("frame")
        .arg("--channel")
        .arg("513=1")
        .arg("--dest")
        .arg("127.0.0.1")
        .assert()
        .failure()
        .stderr(contains("out of range"));
}

#[test]
fn short_frame_file_is_an_encoding_error() {
    let temp = TempDir::new().expect("tempdir");
    let frame = temp.path().join("frame.bin");
    fs::write(&frame, [0u8; 511]).expect("write frame");

    cmd()
        .arg("frame")
        .arg("--file")
        .arg(&frame)
        .arg("--dest")
        .arg("127.0.0.1")
        .assert()
        .failure()
        .stderr(contains("invalid DMX frame length").and(contains("512 bytes")));
}

#[test]
fn encode_writes_packet_file() {
    let temp = TempDir::new().expect("tempdir");
    let output = temp.path().join("out").join("packet.bin");

    cmd()
        .arg("encode")
        .arg("--channel")
        .arg("1=5")
        .arg("--source-name")
        .arg("encoder")
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stderr(contains("OK:").and(contains("\"root_length\":622")));

    let bytes = fs::read(&output).expect("packet file");
    assert_eq!(bytes.len(), 638);
    assert_eq!(bytes[126], 5);
    assert_eq!(&bytes[44..51], b"encoder");
}

#[test]
fn encode_hex_is_deterministic_with_fixed_cid() {
    let run = || {
        let assert = cmd()
            .arg("encode")
            .arg("--hex")
            .arg("--quiet")
            .arg("--cid")
            .arg("12345678-9abc-def0-1234-56789abcdef0")
            .assert()
            .success();
        String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout")
    };
    let first = run();
    assert_eq!(first, run());
    assert_eq!(first.trim().len(), 638 * 2);
    assert!(first.starts_with("00100000415343"));
}

#[test]
fn report_file_and_quiet() {
    let (_socket, addr) = receiver();
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("color")
        .arg("255")
        .arg("0")
        .arg("0")
        .arg("--dest")
        .arg(&addr)
        .arg("-o")
        .arg(&report)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());

    let json: Value =
        serde_json::from_str(&fs::read_to_string(&report).expect("report")).expect("json");
    assert_eq!(json["universe"], 1);
}

#[test]
fn pretty_and_compact_conflict() {
    cmd()
        .arg("blackout")
        .arg("--dest")
        .arg("127.0.0.1")
        .arg("--pretty")
        .arg("--compact")
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn strict_fails_when_a_destination_fails() {
    let (_socket, addr) = receiver();
    cmd()
        .arg("blackout")
        .arg("--dest")
        .arg(&addr)
        .arg("--dest")
        .arg("[::1]:5568")
        .arg("--strict")
        .assert()
        .failure()
        .stderr(contains("delivery failed for 1 destination(s)"));
}

#[test]
fn terminate_reports_three_packets() {
    let (_socket, addr) = receiver();
    let assert = cmd()
        .arg("terminate")
        .arg("--dest")
        .arg(&addr)
        .arg("--universe")
        .arg("3")
        .arg("--stdout")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let reports: Value = serde_json::from_str(&stdout).expect("valid json");
    let reports = reports.as_array().expect("array of reports");
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[2]["sequence"], 2);
}

#[test]
fn config_file_supplies_destinations() {
    let (socket, addr) = receiver();
    let temp = TempDir::new().expect("tempdir");
    let config = temp.path().join("wledcast.json");
    fs::write(
        &config,
        format!(r#"{{"source_name": "from-config", "universe": 9, "destinations": ["{addr}"]}}"#),
    )
    .expect("write config");

    cmd()
        .arg("power")
        .arg("on")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    let mut buf = [0u8; 1500];
    let (len, _) = socket.recv_from(&mut buf).expect("datagram");
    assert_eq!(len, 638);
    assert_eq!(u16::from_be_bytes([buf[113], buf[114]]), 9);
    assert_eq!(&buf[44..55], b"from-config");
}
