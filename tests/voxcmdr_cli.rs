use std::process::Command;

fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn voxcmdr_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_voxcmdr").expect("voxcmdr test binary not built")
}

#[test]
fn help_mentions_the_dispatcher() {
    let output = Command::new(voxcmdr_bin())
        .arg("--help")
        .output()
        .expect("run voxcmdr --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("VoxCmdr"));
    assert!(combined.contains("--settle-ms"));
}

#[test]
fn list_input_devices_prints_a_message() {
    let output = Command::new(voxcmdr_bin())
        .arg("--list-input-devices")
        .output()
        .expect("run voxcmdr --list-input-devices");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(
        combined.contains("audio input devices")
            || combined.contains("Failed to list audio input devices")
    );
}

#[test]
fn missing_manifest_is_a_fatal_startup_error() {
    let output = Command::new(voxcmdr_bin())
        .args(["--config", "/no/such/voxcmdr.json"])
        .output()
        .expect("run voxcmdr with a missing manifest");
    assert!(!output.status.success());
    let combined = combined_output(&output);
    assert!(
        combined.contains("/no/such/voxcmdr.json"),
        "diagnostic names the manifest path: {combined}"
    );
}

#[test]
fn invalid_flag_values_are_rejected_before_startup() {
    let output = Command::new(voxcmdr_bin())
        .args(["--settle-ms", "999999"])
        .output()
        .expect("run voxcmdr with an oversized settle window");
    assert!(!output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("--settle-ms"), "diagnostic: {combined}");
}
