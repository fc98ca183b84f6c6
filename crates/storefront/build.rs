//! Build script for storefront crate.
//!
//! Hashes the static CSS and JS so templates can append `?v=<hash>` to asset
//! URLs and browsers refetch them after every change.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Assets whose content determines `ASSET_VERSION`.
const HASHED_ASSETS: &[&str] = &["static/css/main.css", "static/js/cart.js"];

fn main() {
    hash_assets();
}

/// Sets `ASSET_VERSION` for use with `env!("ASSET_VERSION")`.
fn hash_assets() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");

    let mut hasher = Sha256::new();
    for asset in HASHED_ASSETS {
        let path = Path::new(&manifest_dir).join(asset);
        println!("cargo:rerun-if-changed={}", path.display());

        match fs::read(&path) {
            Ok(content) => hasher.update(&content),
            Err(e) => println!("cargo:warning=Could not read {asset}: {e}"),
        }
    }

    // First 8 hex chars of SHA256 over all assets
    let hash = format!("{:x}", hasher.finalize());
    let short_hash = hash.get(..8).unwrap_or(&hash);

    println!("cargo:rustc-env=ASSET_VERSION={short_hash}");
}
