use std::process::Command;

// BUILD_TIMESTAMP: SOURCE_DATE_EPOCH があればそれを使う（再現可能ビルド）
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    let mut args = vec!["-u".to_string()];
    if let Ok(epoch) = std::env::var("SOURCE_DATE_EPOCH") {
        args.push(format!("--date=@{}", epoch.trim()));
    }
    args.push("+%Y-%m-%dT%H:%M:%SZ".to_string());

    let stamp = Command::new("date")
        .args(&args)
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", stamp);
}
