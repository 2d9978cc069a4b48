fn main() {
    // A missing .env is fine as long as the variables come from the environment
    let _ = dotenvy::dotenv();

    for key in ["WIFI_SSID", "WIFI_PASSWORD"] {
        let value = std::env::var(key).unwrap_or_else(|_| {
            println!("cargo:warning={key} is not set; the monitor will fail to associate");
            String::new()
        });
        println!("cargo:rustc-env={key}={value}");
        println!("cargo:rerun-if-env-changed={key}");
    }
    println!("cargo:rerun-if-changed=.env");

    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
