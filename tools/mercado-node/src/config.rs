use clap::Parser;

/// Runtime configuration. Every flag can also come from the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "mercado-node", about = "Farmers' marketplace web server")]
pub struct Config {
    /// Address to bind.
    #[arg(long, env = "MERCADO_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// HTTP port.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// PostgreSQL connection URL. Without it the server keeps everything in memory.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum pooled PostgreSQL connections.
    #[arg(long, env = "MERCADO_POOL_SIZE", default_value_t = 8)]
    pub pool_size: usize,

    /// Seed an example producer into an empty database.
    #[arg(long, env = "MERCADO_SEED_DEMO")]
    pub seed_demo: bool,

    #[command(flatten)]
    pub premium: PremiumSettings,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// What the free-plan limit page tells producers about upgrading.
#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct PremiumSettings {
    /// WhatsApp number (digits only) that handles premium activations.
    #[arg(long = "premium-contact", env = "MERCADO_PREMIUM_CONTACT", default_value = "573143539351")]
    pub contact: String,

    /// Monthly premium price in pesos.
    #[arg(long = "premium-price", env = "MERCADO_PREMIUM_PRICE", default_value_t = 10_000)]
    pub monthly_price: u64,
}

impl Default for PremiumSettings {
    fn default() -> Self {
        Self {
            contact: "573143539351".to_string(),
            monthly_price: 10_000,
        }
    }
}
