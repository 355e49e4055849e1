use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transcode_server::config::{self, RawSettings, defaults::DEFAULT_CONFIG_FILE};

#[derive(Parser)]
#[command(name = "transcode-server")]
#[command(version)]
#[command(about = "Resolve the transcode server configuration and discover Enigma2 channels")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Address/port to serve on
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Path to the TLS certificate
    #[arg(long, value_name = "PATH")]
    cert: Option<String>,

    /// Path to the TLS private key
    #[arg(long, value_name = "PATH")]
    key: Option<String>,

    /// Path to static client files
    #[arg(long = "static", value_name = "PATH")]
    static_dir: Option<String>,

    /// Trust X-Forwarded-For headers from reverse proxies
    #[arg(long)]
    proxy: bool,

    /// Base directory for assets and profiles
    #[arg(long, value_name = "PATH")]
    basedir: Option<String>,

    /// Hardware encoding profiles directory
    #[arg(long, value_name = "PATH")]
    profiles: Option<String>,
}

impl Cli {
    /// Command line flags take precedence over file and environment
    fn apply(self, raw: &mut RawSettings) {
        if let Some(bind) = self.bind {
            raw.bind = bind;
        }
        if let Some(cert) = self.cert {
            raw.cert = cert;
        }
        if let Some(key) = self.key {
            raw.key = key;
        }
        if let Some(static_dir) = self.static_dir {
            raw.static_dir = static_dir;
        }
        if self.proxy {
            raw.proxy = true;
        }
        if let Some(basedir) = self.basedir {
            raw.basedir = basedir;
        }
        if let Some(profiles) = self.profiles {
            raw.profiles = profiles;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("transcode_server={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting transcode-server v{}", env!("CARGO_PKG_VERSION"));

    let mut raw = RawSettings::load_from_file(&cli.config)?;
    cli.apply(&mut raw);

    let settings = config::resolve(raw).await?;

    info!("Serving on {} (tls: {})", settings.bind, settings.tls_enabled());
    info!(
        "VOD: {} video profiles, transcode dir {}",
        settings.vod.video_profiles.len(),
        settings.vod.transcode_dir.display()
    );
    info!(
        "Live: {} streams, {} HLS proxies",
        settings.streams.len(),
        settings.hls_proxy.len()
    );

    println!("{}", serde_json::to_string_pretty(&settings)?);

    Ok(())
}
