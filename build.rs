use std::env;

fn main() {
    let version = env::var("VERSION").unwrap_or("unknown".to_owned());
    println!("cargo:rustc-env=QTUPLOAD_VERSION={version}");
    println!("cargo:rerun-if-env-changed=VERSION");
}
