//! Test client for the conversion service.
//!
//! Reads an EXR file locally, sends its bytes to the server, and saves the
//! PNG response.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::path::Path;

use anyhow::{Context, bail};

use exr_extractor_rs::image_pipeline::TransferEncoding;
use exr_extractor_rs::service::{DEFAULT_PORT, ServiceRequest, ServiceResponse};

struct ClientArgs {
    host: String,
    port: u16,
    exposure_ev: f32,
    key: f32,
    transfer: TransferEncoding,
    do_health: bool,
    paths: Vec<String>,
}

fn parse_args() -> anyhow::Result<ClientArgs> {
    let mut args = ClientArgs {
        host: "localhost".to_string(),
        port: DEFAULT_PORT,
        exposure_ev: 0.0,
        key: 0.18,
        transfer: TransferEncoding::Srgb,
        do_health: false,
        paths: Vec::new(),
    };

    for arg in std::env::args().skip(1) {
        if let Some(value) = arg.strip_prefix("--host=") {
            args.host = value.to_string();
        } else if let Some(value) = arg.strip_prefix("--port=") {
            args.port = value.parse().context("invalid --port value")?;
        } else if let Some(value) = arg.strip_prefix("--ev=") {
            args.exposure_ev = value.parse().context("invalid --ev value")?;
        } else if let Some(value) = arg.strip_prefix("--key=") {
            args.key = value.parse().context("invalid --key value")?;
        } else if let Some(value) = arg.strip_prefix("--transfer=") {
            args.transfer = match value {
                "srgb" => TransferEncoding::Srgb,
                "gamma22" => TransferEncoding::Gamma22,
                "linear" => TransferEncoding::Linear,
                other => bail!("unknown transfer encoding: {}", other),
            };
        } else if arg == "--health" {
            args.do_health = true;
        } else if arg == "--help" || arg == "-h" {
            print_usage();
            std::process::exit(0);
        } else if arg.starts_with("--") {
            bail!("unknown option: {}", arg);
        } else {
            args.paths.push(arg);
        }
    }

    Ok(args)
}

fn print_usage() {
    println!("Usage: client <input.exr> <output.png> [options]");
    println!("       client --health [--host=HOST] [--port=PORT]");
    println!("\nOptions:");
    println!("  --host=HOST          Server host (default: localhost)");
    println!("  --port=PORT          Server port (default: {})", DEFAULT_PORT);
    println!("  --ev=N               Exposure compensation in stops (default: 0.0)");
    println!("  --key=N              Reinhard key value (default: 0.18)");
    println!("  --transfer=NAME      srgb, gamma22 or linear (default: srgb)");
    println!("  --health             Check server health");
    println!("\nDescription:");
    println!("  Reads an EXR file locally and sends its bytes to the conversion");
    println!("  server. The server tone-maps the image and returns PNG data,");
    println!("  which is saved locally.");
}

fn send_request(
    host: &str,
    port: u16,
    request: &ServiceRequest,
    payload: &[u8],
) -> anyhow::Result<(ServiceResponse, Vec<u8>)> {
    let stream = TcpStream::connect((host, port))
        .with_context(|| format!("failed to connect to {}:{}", host, port))?;

    let mut writer = stream.try_clone().context("failed to clone connection")?;
    let header = serde_json::to_string(request).context("failed to serialize request")?;
    writeln!(writer, "{}", header)?;
    writer.write_all(payload)?;
    writer.flush()?;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).context("failed to read response header")?;
    let response: ServiceResponse =
        serde_json::from_str(line.trim()).context("failed to parse response header")?;

    let mut response_payload = Vec::new();
    if let Some(size) = response.size {
        response_payload.resize(size as usize, 0);
        reader
            .read_exact(&mut response_payload)
            .context("failed to read response payload")?;
    }

    Ok((response, response_payload))
}

fn health_check(host: &str, port: u16) -> anyhow::Result<bool> {
    println!("Checking health of {}:{}...", host, port);

    let (response, _) = send_request(host, port, &ServiceRequest::Health, &[])?;
    match (&response.service, &response.version) {
        (Some(service), Some(version)) => {
            println!("Healthy: {}", response.ok);
            println!("Service: {}", service);
            println!("Version: {}", version);
        }
        _ => println!("Healthy: {}", response.ok),
    }

    Ok(response.ok)
}

fn process_exr(args: &ClientArgs, input_file: &str, output_file: &str) -> anyhow::Result<()> {
    if !Path::new(input_file).exists() {
        bail!("File not found: {}", input_file);
    }

    println!("Reading EXR file: {}", input_file);
    let exr_data =
        std::fs::read(input_file).with_context(|| format!("failed to read {}", input_file))?;
    println!(
        "File size: {} bytes ({:.2} MB)",
        exr_data.len(),
        exr_data.len() as f64 / (1024.0 * 1024.0)
    );

    let request = ServiceRequest::Convert {
        size: exr_data.len() as u64,
        exposure_ev: args.exposure_ev,
        key: args.key,
        transfer: args.transfer,
    };

    println!("Sending bytes to {}:{}...", args.host, args.port);
    let (response, png_data) = send_request(&args.host, args.port, &request, &exr_data)?;

    if !response.ok {
        bail!(
            "Server error: {}",
            response.error.unwrap_or_else(|| "unknown".to_string())
        );
    }

    println!("\nResponse received!");
    if let (Some(width), Some(height)) = (response.width, response.height) {
        println!("Dimensions: {}x{}", width, height);
    }
    println!(
        "PNG data size: {} bytes ({:.2} KB)",
        png_data.len(),
        png_data.len() as f64 / 1024.0
    );
    if let Some(message) = &response.message {
        println!("Message: {}", message);
    }

    if let Some(output_dir) = Path::new(output_file).parent() {
        if !output_dir.as_os_str().is_empty() && !output_dir.exists() {
            std::fs::create_dir_all(output_dir)
                .with_context(|| format!("failed to create {}", output_dir.display()))?;
        }
    }

    std::fs::write(output_file, &png_data)
        .with_context(|| format!("failed to write {}", output_file))?;
    println!("PNG saved to: {}", output_file);

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = parse_args()?;

    if args.do_health {
        let healthy = health_check(&args.host, args.port)?;
        std::process::exit(if healthy { 0 } else { 1 });
    }

    if args.paths.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    process_exr(&args, &args.paths[0], &args.paths[1])
}
