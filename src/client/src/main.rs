use std::time::Duration;

use clap::Parser;
use client::entrypoint::{serve, ClientConfig, InputMode};
use client::model::internal::MatchConfig;
use client::service::{input::AutoplayStrategy, pacing::PacingPolicy};
use common::model::messages::Id;
use common::utility::create_shutdown_channel;
use tracing::{error, Level};
use uuid::Uuid;

/// Rock, paper, scissor against a remote opponent service.
#[derive(Parser, Debug)]
#[command(name = "rps-client", version)]
struct Args {
    /// Base url of the opponent service
    #[arg(long, default_value = "http://127.0.0.1:8080/")]
    server_url: String,

    /// Correlation id sent with every report, random when absent
    #[arg(long)]
    session_id: Option<Uuid>,

    /// Rounds played (deuces included) before a leader wins the match
    #[arg(long, default_value_t = 7)]
    rounds_to_complete: u32,

    /// Let a strategy play instead of reading moves from stdin
    #[arg(long, value_enum)]
    autoplay: Option<AutoplayStrategy>,

    /// Same delay after every round instead of the adaptive ramp-down
    #[arg(long)]
    fixed_pacing_ms: Option<u64>,

    #[arg(long, default_value_t = 4000)]
    reset_delay_ms: u64,

    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,
}

impl From<Args> for ClientConfig {
    fn from(args: Args) -> Self {
        let reset = Duration::from_millis(args.reset_delay_ms);
        let pacing = match args.fixed_pacing_ms {
            Some(round) => PacingPolicy::Fixed {
                round: Duration::from_millis(round),
                reset,
            },
            None => PacingPolicy::default().with_reset(reset),
        };
        ClientConfig {
            server_url: args.server_url,
            session_id: args.session_id.map(Id).unwrap_or_default(),
            match_config: MatchConfig {
                rounds_to_complete: args.rounds_to_complete,
                pacing,
            },
            input: match args.autoplay {
                Some(strategy) => InputMode::Autoplay(strategy),
                None => InputMode::Terminal,
            },
            render: true,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    // Logs go to stderr, stdout belongs to the game
    tracing_subscriber::fmt()
        .with_line_number(true)
        .with_file(true)
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    let shutdown_receiver = create_shutdown_channel().await;
    if let Err(e) = serve(args.into(), shutdown_receiver, None).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_adaptive_pacing_and_terminal_input() {
        let config: ClientConfig = Args::parse_from(["rps-client"]).into();
        assert_eq!(config.server_url, "http://127.0.0.1:8080/");
        assert_eq!(config.match_config.rounds_to_complete, 7);
        assert_eq!(config.match_config.pacing, PacingPolicy::default());
        assert!(matches!(config.input, InputMode::Terminal));
    }

    #[test]
    fn fixed_pacing_and_autoplay() {
        let session = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let config: ClientConfig = Args::parse_from([
            "rps-client",
            "--session-id",
            session,
            "--autoplay",
            "cycle",
            "--fixed-pacing-ms",
            "250",
            "--reset-delay-ms",
            "1000",
        ])
        .into();
        assert_eq!(config.session_id.to_string(), session);
        assert!(matches!(
            config.input,
            InputMode::Autoplay(AutoplayStrategy::Cycle)
        ));
        assert_eq!(
            config.match_config.pacing,
            PacingPolicy::Fixed {
                round: Duration::from_millis(250),
                reset: Duration::from_millis(1000),
            }
        );
    }
}
