fn main() {
    if let Err(err) = dexcom_share_bridge::app::run() {
        eprintln!("monitor stopped: {err}");
        std::process::exit(1);
    }
}
