use std::net::TcpListener;

/// URL of a local port nothing listens on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("socket should bind");
    let address = listener.local_addr().expect("addr should be available");
    drop(listener);
    format!("http://{address}")
}
