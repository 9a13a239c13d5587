use artilect_newsletter::config::get_configuration;
use artilect_newsletter::startup::Application;
use artilect_newsletter::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let subscriber = get_subscriber(String::from("artilect_newsletter"), String::from("info"));

    init_subscriber(subscriber);

    let config = get_configuration().expect("Missing configuration file.");

    tracing::info!("Server listening on {}", config.get_address());

    let application = Application::build(config)
        .await
        .expect("Failed to build application.");

    application.run_until_stop().await
}
