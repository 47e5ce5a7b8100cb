use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use snmp_poller::config::AppConfig;
use snmp_poller::formatter::JsonFormatter;
use snmp_poller::poller::Poll;
use snmp_poller::snmp::Snmp2Connector;

/// Опрос SNMP хостов из конфигурации, отчет в JSON на stdout
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Путь к YAML конфигурации
    #[arg(default_value = "./config/poller.yaml")]
    config: PathBuf,

    /// Один отчет на строку вместо форматированного JSON
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Логи в stderr, в stdout только JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("snmp_poller=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::load(&args.config)?;
    config.debug_config();

    let connector = Snmp2Connector::new(config.connection_settings());
    let poll_settings = config.poll_settings();

    // Хосты опрашиваются по очереди, ограничение параллельности - забота планировщика
    for hostname in config.get_hosts() {
        let mut poll = Poll::new(&hostname, config.credentials.clone(), connector.clone())
            .with_settings(&poll_settings);

        let outcome = poll.initialize().await;
        let facts = poll.query().await;
        poll.close().await;

        let report = JsonFormatter::format_report(&hostname, outcome, &facts);
        let json = if args.compact {
            JsonFormatter::to_json_compact(&report)
        } else {
            JsonFormatter::to_json_string(&report)
        };
        match json {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!(host = %hostname, error = %e, "ошибка JSON сериализации"),
        }
    }

    Ok(())
}
