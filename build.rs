use std::{env, path::PathBuf};

// ffmpeg-sys-next finds FFmpeg through pkg-config on Unix, but Windows
// builds usually rely on vcpkg. Emit hints when the relevant environment
// looks incomplete so the failure mode is a warning, not a linker error.
fn main() {
    for var in [
        "FFMPEG_DIR",
        "VCPKG_ROOT",
        "VCPKGRS_DYNAMIC",
        "VCPKGRS_TRIPLET",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows")
        || env::var_os("FFMPEG_DIR").is_some()
    {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=FFMPEG_DIR is not set. On Windows, install FFmpeg via vcpkg and set VCPKG_ROOT + FFMPEG_DIR for reliable builds."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let install_dir = PathBuf::from(vcpkg_root).join("installed").join(triplet);

    if !install_dir.exists() {
        println!(
            "cargo:warning=VCPKG_ROOT is set but no FFmpeg install was found at {}.",
            install_dir.display(),
        );
        return;
    }

    println!(
        "cargo:warning=Detected vcpkg FFmpeg at {dir}. Set FFMPEG_DIR={dir} to make ffmpeg-sys-next discovery explicit.",
        dir = install_dir.display(),
    );
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        println!(
            "cargo:warning=Consider setting VCPKGRS_DYNAMIC=1 when using vcpkg dynamic FFmpeg builds on Windows."
        );
    }
}
