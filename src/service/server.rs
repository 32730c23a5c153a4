//! TCP server that accepts conversion requests and runs the pipeline.
//!
//! The accept loop runs on its own thread and polls a shutdown channel;
//! each connection gets a handler thread and may carry several requests.
//! Conversions share no state, so no locking is needed around the pipeline.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::image_pipeline::{ConversionConfig, ExrToPngPipeline};
use crate::service::protocol::{ServiceRequest, ServiceResponse, parse_request};

pub const DEFAULT_PORT: u16 = 50051;

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);
const READ_TIMEOUT: Duration = Duration::from_secs(300);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    /// Port to listen on; 0 lets the OS choose a free port
    pub port: u16,
    /// Upper bound on the EXR payload size accepted from a client
    pub max_request_bytes: u64,
    /// Base pipeline configuration; tone map parameters are overridden by
    /// each convert request
    pub conversion: ConversionConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_request_bytes: 256 * 1024 * 1024,
            conversion: ConversionConfig::default(),
        }
    }
}

/// Result of starting the server
pub struct ServerHandle {
    pub port: u16,
    shutdown_tx: mpsc::Sender<()>,
    thread: thread::JoinHandle<()>,
}

impl ServerHandle {
    /// Signals the accept loop to exit.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Blocks until the accept loop exits.
    pub fn join(self) {
        let _ = self.thread.join();
    }
}

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Start the server thread that accepts connections and serves conversion
/// requests.
///
/// Returns the actual port the server is listening on (useful when port=0).
pub fn serve(config: ServiceConfig) -> io::Result<ServerHandle> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)?;
    // Non-blocking so the loop can poll the shutdown channel
    listener.set_nonblocking(true)?;
    let actual_port = listener.local_addr()?.port();

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
    let config = Arc::new(config);

    info!("Listening on {}:{}", config.host, actual_port);

    let thread = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                info!("Shutdown requested, stopping accept loop");
                break;
            }

            match listener.accept() {
                Ok((stream, peer)) => {
                    let config = Arc::clone(&config);
                    thread::spawn(move || {
                        info!("Accepted connection from {}", peer);
                        handle_connection(stream, &config);
                    });
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    });

    Ok(ServerHandle {
        port: actual_port,
        shutdown_tx,
        thread,
    })
}

fn handle_connection(stream: TcpStream, config: &ServiceConfig) {
    let _ = stream.set_read_timeout(Some(READ_TIMEOUT));
    let _ = stream.set_write_timeout(Some(WRITE_TIMEOUT));

    let reader = match stream.try_clone() {
        Ok(cloned) => BufReader::new(cloned),
        Err(e) => {
            error!("Failed to clone connection stream: {}", e);
            return;
        }
    };

    if let Err(e) = serve_requests(reader, stream, config) {
        warn!("Connection ended with error: {}", e);
    }
}

/// Serves requests from one connection until the client disconnects.
///
/// Generic over the transport so tests can drive it with in-memory buffers.
fn serve_requests<R: BufRead, W: Write>(
    mut reader: R,
    mut writer: W,
    config: &ServiceConfig,
) -> io::Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => return Ok(()), // client closed the connection
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let request_id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
                let keep_alive =
                    dispatch_request(trimmed, &mut reader, &mut writer, config, request_id)?;
                writer.flush()?;
                if !keep_alive {
                    return Ok(());
                }
            }
            Err(ref e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::TimedOut =>
            {
                // idle connection, keep waiting for the next request
                continue;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Handles one parsed-or-rejected request; returns whether the connection
/// should stay open.
fn dispatch_request<R: BufRead, W: Write>(
    header: &str,
    reader: &mut R,
    writer: &mut W,
    config: &ServiceConfig,
    request_id: u64,
) -> io::Result<bool> {
    let request = match parse_request(header) {
        Ok(request) => request,
        Err(e) => {
            warn!(request_id, "Rejected malformed request: {}", e);
            write_response(writer, &ServiceResponse::error(e), None)?;
            return Ok(true);
        }
    };

    match request {
        ServiceRequest::Health => {
            info!(request_id, "Health check");
            write_response(writer, &ServiceResponse::health(), None)?;
            Ok(true)
        }
        ServiceRequest::Convert { size, .. } => {
            if size == 0 {
                warn!(request_id, "Convert request without image data");
                write_response(
                    writer,
                    &ServiceResponse::error("no image data received"),
                    None,
                )?;
                return Ok(true);
            }
            if size > config.max_request_bytes {
                warn!(
                    request_id,
                    size, "Convert request exceeds the configured size limit"
                );
                write_response(
                    writer,
                    &ServiceResponse::error(format!(
                        "request size {} exceeds the {} byte limit",
                        size, config.max_request_bytes
                    )),
                    None,
                )?;
                // the oversized payload is not drained, drop the connection
                return Ok(false);
            }

            let mut payload = vec![0_u8; size as usize];
            if let Err(e) = reader.read_exact(&mut payload) {
                error!(request_id, size, "Failed to read request payload: {}", e);
                write_response(
                    writer,
                    &ServiceResponse::error(format!("failed to read {} byte payload: {}", size, e)),
                    None,
                )?;
                return Ok(false);
            }

            info!(request_id, size, "Processing conversion request");

            // tonemap_parameters is always Some for a convert request
            let mut pipeline_config = config.conversion.clone();
            if let Some(params) = request.tonemap_parameters() {
                pipeline_config.tonemap = params;
            }
            let pipeline = ExrToPngPipeline::new(pipeline_config);

            let started = Instant::now();
            let mut png_bytes = Vec::new();
            match pipeline.convert(&payload, &mut png_bytes) {
                Ok(summary) => {
                    info!(
                        request_id,
                        width = summary.width,
                        height = summary.height,
                        png_size = png_bytes.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Request served"
                    );
                    let response = ServiceResponse::converted(
                        summary.width,
                        summary.height,
                        png_bytes.len() as u64,
                    );
                    write_response(writer, &response, Some(&png_bytes))?;
                }
                Err(e) => {
                    error!(request_id, "Conversion failed: {}", e);
                    write_response(writer, &ServiceResponse::error(e.to_string()), None)?;
                }
            }
            Ok(true)
        }
    }
}

fn write_response<W: Write>(
    writer: &mut W,
    response: &ServiceResponse,
    payload: Option<&[u8]>,
) -> io::Result<()> {
    let header = serde_json::to_string(response)
        .unwrap_or_else(|_| r#"{"ok":false,"error":"response serialization failed"}"#.to_string());
    writeln!(writer, "{}", header)?;
    if let Some(bytes) = payload {
        writer.write_all(bytes)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::test_support::synthetic_exr_rgb;
    use std::io::{Cursor, Read};

    fn request_bytes(header: &str, payload: &[u8]) -> Vec<u8> {
        let mut bytes = header.as_bytes().to_vec();
        bytes.push(b'\n');
        bytes.extend_from_slice(payload);
        bytes
    }

    fn run_in_memory(input: Vec<u8>, config: &ServiceConfig) -> Vec<u8> {
        let mut output = Vec::new();
        serve_requests(Cursor::new(input), &mut output, config).unwrap();
        output
    }

    fn read_response(output: &[u8]) -> (ServiceResponse, Vec<u8>) {
        let mut cursor = Cursor::new(output);
        let mut line = String::new();
        cursor.read_line(&mut line).unwrap();
        let response: ServiceResponse = serde_json::from_str(line.trim()).unwrap();
        let mut payload = Vec::new();
        cursor.read_to_end(&mut payload).unwrap();
        (response, payload)
    }

    #[test]
    fn test_convert_request_in_memory() {
        let exr = synthetic_exr_rgb(2, 2, (0.18, 0.18, 0.18));
        let header = format!(r#"{{"op":"convert","size":{}}}"#, exr.len());
        let output = run_in_memory(request_bytes(&header, &exr), &ServiceConfig::default());

        let (response, payload) = read_response(&output);
        assert!(response.ok);
        assert_eq!(response.width, Some(2));
        assert_eq!(response.height, Some(2));
        assert_eq!(response.size, Some(payload.len() as u64));
        // payload is a decodable PNG
        let decoder = png::Decoder::new(Cursor::new(payload));
        let mut reader = decoder.read_info().unwrap();
        let mut pixels = vec![0_u8; reader.output_buffer_size()];
        let info = reader.next_frame(&mut pixels).unwrap();
        assert_eq!((info.width, info.height), (2, 2));
    }

    #[test]
    fn test_health_request_in_memory() {
        let output = run_in_memory(
            request_bytes(r#"{"op":"health"}"#, &[]),
            &ServiceConfig::default(),
        );
        let (response, payload) = read_response(&output);
        assert!(response.ok);
        assert_eq!(response.service.as_deref(), Some("exr-extractor"));
        assert!(payload.is_empty());
    }

    #[test]
    fn test_zero_size_convert_is_rejected() {
        let output = run_in_memory(
            request_bytes(r#"{"op":"convert","size":0}"#, &[]),
            &ServiceConfig::default(),
        );
        let (response, _) = read_response(&output);
        assert!(!response.ok);
        assert!(response.error.unwrap().contains("no image data"));
    }

    #[test]
    fn test_oversized_convert_is_rejected() {
        let config = ServiceConfig {
            max_request_bytes: 16,
            ..Default::default()
        };
        let output = run_in_memory(
            request_bytes(r#"{"op":"convert","size":1000}"#, &[0_u8; 1000]),
            &config,
        );
        let (response, _) = read_response(&output);
        assert!(!response.ok);
        assert!(response.error.unwrap().contains("exceeds"));
    }

    #[test]
    fn test_malformed_header_gets_error_response() {
        let output = run_in_memory(
            request_bytes("this is not json", &[]),
            &ServiceConfig::default(),
        );
        let (response, _) = read_response(&output);
        assert!(!response.ok);
        assert!(response.error.unwrap().contains("JSON parse error"));
    }

    #[test]
    fn test_invalid_exr_payload_gets_error_response() {
        let payload = b"not an exr image";
        let header = format!(r#"{{"op":"convert","size":{}}}"#, payload.len());
        let output = run_in_memory(request_bytes(&header, payload), &ServiceConfig::default());
        let (response, _) = read_response(&output);
        assert!(!response.ok);
        assert!(response.error.unwrap().contains("decode"));
    }

    #[test]
    fn test_loopback_server_round_trip() {
        let config = ServiceConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..Default::default()
        };
        let handle = serve(config).unwrap();

        let exr = synthetic_exr_rgb(3, 2, (0.4, 0.2, 0.1));
        let mut stream = TcpStream::connect(("127.0.0.1", handle.port)).unwrap();
        let header = format!(r#"{{"op":"convert","size":{}}}"#, exr.len());
        stream.write_all(header.as_bytes()).unwrap();
        stream.write_all(b"\n").unwrap();
        stream.write_all(&exr).unwrap();
        stream.flush().unwrap();

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let response: ServiceResponse = serde_json::from_str(line.trim()).unwrap();
        assert!(response.ok, "server error: {:?}", response.error);
        assert_eq!(response.width, Some(3));
        assert_eq!(response.height, Some(2));

        let mut payload = vec![0_u8; response.size.unwrap() as usize];
        reader.read_exact(&mut payload).unwrap();
        assert_eq!(&payload[..4], &[137, 80, 78, 71]);

        handle.shutdown();
        handle.join();
    }
}
