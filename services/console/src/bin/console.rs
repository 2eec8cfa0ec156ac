//! services/console/src/bin/console.rs

use console_lib::{
    command::{dispatch, Command},
    config::Config,
    error::AppError,
    App,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!(
        environment = config.environment.name(),
        demo = config.is_demo_mode(),
        "Configuration loaded. Starting portal..."
    );

    // --- 2. Build the Application & Restore Any Saved Session ---
    let mut app = App::from_config(&config)?;
    let mut stdout = tokio::io::stdout();
    let frame = app.start().await;
    stdout.write_all(frame.to_string().as_bytes()).await?;
    stdout
        .write_all(b"Type `help` for the list of commands.\n")
        .await?;

    // --- 3. Read Commands Until EOF or `quit` ---
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let output = match Command::parse(&line) {
            Ok(None) => continue,
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => dispatch(&mut app, command).await.to_string(),
            Err(message) => format!("{}\n", message),
        };
        stdout.write_all(output.as_bytes()).await?;
    }

    info!("Portal closed.");
    Ok(())
}
