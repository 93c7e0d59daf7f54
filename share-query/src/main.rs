fn main() {
    let push_report = std::env::args().skip(1).any(|arg| arg == "--report");

    match dexcom_share_bridge::app::run_query(push_report) {
        Ok(Some(reading)) => match serde_json::to_string(&reading) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("failed to encode reading: {err}");
                std::process::exit(1);
            }
        },
        Ok(None) => println!("null"),
        Err(err) => {
            eprintln!("query failed: {err}");
            std::process::exit(1);
        }
    }
}
