use museumhub::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    museumhub::init_tracing(config.log_json);
    museumhub::run(config).await
}
