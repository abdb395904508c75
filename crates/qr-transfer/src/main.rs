use clap::Parser;
use qr_transfer::{AppState, Translator, run};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
    #[clap(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,
    #[clap(long, env = "PORT", default_value = "3000")]
    port: u16,
    /// Text pre-filled in the data field of the encode page.
    #[clap(long, env = "url_prefix", default_value = "")]
    url_prefix: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let translator = Translator::bundled()?;
    let state = AppState::new(translator, args.url_prefix);

    run(args.host, args.port, state).await
}
