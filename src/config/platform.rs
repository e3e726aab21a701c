//! Per-platform layout of the wake-word engine's native artifacts.
//!
//! Mirrors the directory structure the engine vendor ships: the shared
//! library lives under `lib/<os>/<arch>/` and keyword files carry a platform
//! suffix. Unsupported combinations are a fatal configuration error.

use anyhow::{bail, Result};
use std::env::consts::{ARCH, OS};
use std::path::PathBuf;

/// Relative path of the engine's shared library under the detector root.
pub fn detector_library_path() -> Result<PathBuf> {
    let relative = match (OS, ARCH) {
        ("macos", arch) => format!("lib/mac/{arch}/libpv_porcupine.dylib"),
        ("linux", "x86_64") | ("linux", "x86") => {
            format!("lib/linux/{ARCH}/libpv_porcupine.so")
        }
        // Raspberry Pi builds ship a single arm binary.
        ("linux", "arm") | ("linux", "aarch64") => {
            "lib/raspberry-pi/arm11/libpv_porcupine.so".to_string()
        }
        ("windows", "x86") => "lib/windows/i686/libpv_porcupine.dll".to_string(),
        ("windows", _) => "lib/windows/amd64/libpv_porcupine.dll".to_string(),
        (os, arch) => bail!("the wake-word engine is not supported on {os}/{arch}"),
    };
    Ok(PathBuf::from(relative))
}

/// Platform suffix embedded in keyword model filenames.
pub fn keyword_file_suffix() -> Result<&'static str> {
    match (OS, ARCH) {
        ("linux", "x86_64") | ("linux", "x86") => Ok("linux"),
        ("linux", "arm") | ("linux", "aarch64") => Ok("raspberrypi"),
        ("macos", _) => Ok("mac"),
        ("windows", _) => Ok("windows"),
        (os, arch) => bail!("the wake-word engine is not supported on {os}/{arch}"),
    }
}
