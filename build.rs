//! Forwards the node's build-time configuration into the firmware and adds
//! the esp-hal linker scripts.
//!
//! Values come from the environment or from a `.env` file at the crate root.

use std::env;

const FORWARDED: [&str; 7] = [
    "UPLINK_WIFI_SSID",
    "UPLINK_WIFI_PASSWORD",
    "UPLINK_ENDPOINT",
    "UPLINK_DEVICE_ID",
    "UPLINK_PERIOD_MS",
    "UPLINK_TIMEOUT_MS",
    "UPLINK_TLS_INSECURE",
];

const REQUIRED: [&str; 3] = ["UPLINK_WIFI_SSID", "UPLINK_ENDPOINT", "UPLINK_DEVICE_ID"];

fn main() {
    println!("cargo:rerun-if-changed=.env");
    if let Ok(env_path) = dotenvy::dotenv() {
        println!("cargo:warning=Loaded config from {:?}", env_path);
    }

    for name in FORWARDED {
        println!("cargo:rerun-if-env-changed={}", name);
        if let Ok(value) = env::var(name) {
            println!("cargo:rustc-env={}={}", name, value);
        }
    }

    for name in REQUIRED {
        if env::var(name).is_err() {
            println!(
                "cargo:warning={} not set; the node will stop at boot with a config error",
                name
            );
        }
    }

    println!("cargo:rustc-link-arg-bins=-Tlinkall.x");
    println!("cargo:rustc-link-arg-tests=-Tlinkall.x");
    println!("cargo:rustc-link-arg-tests=-Tembedded-test.x");
}
