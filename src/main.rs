use color_eyre::eyre::{Result, WrapErr};
use http::Method;
use miniwire::client::{ClientConfigBuilder, FetchResult, HopEvent, HttpClient};
use miniwire::network::EndpointRef;
use miniwire::server::config::{DEFAULT_PORT, DEFAULT_STATIC_ROOT};
use miniwire::server::{HttpServer, ServerConfig};
use miniwire::ServerTrait;
use std::io::Write;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("miniwire=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mode = args.get(1).map(|s| s.to_lowercase()).unwrap_or_default();

    match mode.as_str() {
        "server" => {
            let port = args
                .get(2)
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT);
            let static_root = args
                .get(3)
                .cloned()
                .unwrap_or_else(|| DEFAULT_STATIC_ROOT.to_string());

            let config = ServerConfig::new(SocketAddr::from(([0, 0, 0, 0], port)))
                .with_static_root(static_root);
            info!(address = %config.bind_addr, static_root = %config.static_root.display(), "Starting HTTP server");

            let server = HttpServer::new(config);
            server.run().await.wrap_err("Failed to run HTTP server")?;
        }
        "client" => {
            let follow_relative = args.iter().skip(2).any(|a| a == "--follow-relative");
            let config = ClientConfigBuilder::new()
                .follow_relative_locations(follow_relative)
                .build();
            run_client(HttpClient::new(config)).await?;
        }
        _ => {
            let program = args.first().map(String::as_str).unwrap_or("miniwire");
            eprintln!("Usage: {program} server [port] [static_root]");
            eprintln!("       {program} client [--follow-relative]");
            eprintln!();
            eprintln!("  server: listen on 0.0.0.0:port (default {DEFAULT_PORT}) and serve files");
            eprintln!("          from static_root (default ./{DEFAULT_STATIC_ROOT})");
            eprintln!("  client: interactive prompt for GET/POST requests");
            eprintln!("          --follow-relative resolves Location: /path against the current host");
            eprintln!();
            eprintln!("Examples:");
            eprintln!("  {program} server 8080 static");
            eprintln!("  {program} client");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Prints `label` and reads one trimmed line; `None` once stdin is closed
async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?.map(|l| l.trim().to_string()))
}

async fn run_client(mut client: HttpClient) -> Result<()> {
    println!("=== HTTP Client (GET/POST) ===");
    println!("Enter 'q' to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!();
        let Some(method) = prompt(&mut lines, "Method (GET/POST): ").await? else {
            break;
        };
        let method = match method.to_uppercase().as_str() {
            "Q" => break,
            "GET" => Method::GET,
            "POST" => Method::POST,
            _ => {
                println!("Unsupported method, use GET or POST");
                continue;
            }
        };

        let Some(url) = prompt(&mut lines, "URL (e.g. http://localhost:8080/index.html): ").await?
        else {
            break;
        };
        if url.is_empty() {
            println!("URL must not be empty");
            continue;
        }
        let target = match EndpointRef::parse(&url) {
            Ok(target) => target,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        let body = if method == Method::POST {
            prompt(&mut lines, "Form data (username=xxx&password=xxx): ")
                .await?
                .unwrap_or_default()
        } else {
            String::new()
        };

        let outcome = client
            .send_observed(method, target, &body, |event| match event {
                HopEvent::Sending(endpoint) => println!("\nSending request to: {endpoint}"),
                HopEvent::Redirecting(endpoint) => println!("Redirecting to: {endpoint}"),
            })
            .await;
        match outcome {
            Ok(result) => report(&result),
            Err(e) => println!("Request failed: {e}"),
        }
    }

    println!("Bye");
    Ok(())
}

fn report(result: &FetchResult) {
    let response = &result.response;
    println!("\n=== Response ===");
    println!("Status: {} {}", response.status_code, response.status_message);
    println!("Headers: {:?}", response.headers);
    if result.is_not_modified() {
        println!("Body: resource unmodified, using cached copy");
    } else {
        println!("Body:\n{}", response.body);
    }
}
