fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    #[cfg(not(target_os = "linux"))]
    compile_error!("fanwatch relies on fanotify and only builds on Linux");

    // Stamp the version string with the build time
    let build_time = std::process::Command::new("date")
        .args(["-u", "+%Y-%m-%d %H:%M:%S UTC"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=BUILD_TIME={}", build_time);
}
