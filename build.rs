use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rustc-link-arg=-Tlinkall.x");
    println!("cargo:rustc-link-arg-tests=-Tembedded-test.x");

    // The sampler image is optional; an empty file means "not configured".
    println!("cargo:rerun-if-env-changed=BARO_NODE_ULP_IMAGE");
    let image = match env::var("BARO_NODE_ULP_IMAGE") {
        Ok(path) if !path.is_empty() => {
            println!("cargo:rerun-if-changed={path}");
            fs::read(&path).unwrap_or_else(|e| panic!("failed to read ulp image {path}: {e}"))
        }
        _ => Vec::new(),
    };

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("missing OUT_DIR"));
    let out_file = out_dir.join("ulp_program.bin");
    fs::write(&out_file, image)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", out_file.display()));
}
