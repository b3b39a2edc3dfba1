#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use deadline_tool::{Docket, DocketConfig, http_api};

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let config = DocketConfig::from_env()?;
    let addr = config.http_socket_addr()?;

    println!("deadline-tool HTTP API listening on http://{addr}");
    let docket = Docket::with_config(config);
    http_api::serve(addr, docket).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
