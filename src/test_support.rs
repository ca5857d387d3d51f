use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

/// Serves exactly one canned HTTP response on a random local port.
/// Returns the base url and a channel yielding the raw request head.
pub fn serve_once(response: &'static str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let (sender, receiver) = mpsc::channel();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = Vec::new();
            let mut buffer = [0u8; 512];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buffer) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buffer[..n]),
                }
            }
            stream.write_all(response.as_bytes()).ok();
            stream.flush().ok();
            sender.send(String::from_utf8_lossy(&request).into_owned()).ok();
        }
    });

    (format!("http://{}", address), receiver)
}

/// Accepts one connection and never answers. The stream is held until the
/// client hangs up.
pub fn serve_silently() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buffer = [0u8; 512];
            while let Ok(n) = stream.read(&mut buffer) {
                if n == 0 {
                    break;
                }
            }
        }
    });

    format!("http://{}", address)
}
