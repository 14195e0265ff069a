use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use gasto_api::ApiClient;
use gasto_core::DateRange;
use tokio::sync::mpsc;

mod auth;
mod config;
mod loader;
mod logging;
mod panel;
mod state;
mod view;
mod worker;

use config::{Config, RecommendationSource};
use loader::Loader;
use panel::{Panel, PanelData, PanelKind};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GASTO_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "gasto", version = VERSION, about = "GastoSmart panels in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Default)]
struct RangeArgs {
    /// First day, YYYY-MM-DD (defaults to the start of this month)
    #[arg(long)]
    from: Option<String>,

    /// Last day, YYYY-MM-DD (defaults to the end of this month)
    #[arg(long)]
    to: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive panels (alerts, advice, recommendations)
    Panel {
        #[command(flatten)]
        range: RangeArgs,

        /// Panel to open first
        #[arg(long, value_enum, default_value_t = StartPanel::Advice)]
        start: StartPanel,
    },

    /// Income, expense and balance for the range
    Stats {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Top spending categories and advice for the range
    Advice {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Scored recommendations
    Recommendations {
        #[command(flatten)]
        range: RangeArgs,

        /// Derive them from transactions instead of asking the server
        #[arg(long)]
        local: bool,
    },

    /// Apply the recommendation at INDEX (as listed by `gasto recommendations`)
    Apply {
        index: usize,

        #[command(flatten)]
        range: RangeArgs,

        #[arg(long)]
        local: bool,
    },

    /// Configuration file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Session token storage
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.gasto/config.toml with defaults
    Init,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Store a session token in ~/.gasto/auth.json
    SetToken,
    /// Forget the stored token
    Clear,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum StartPanel {
    Alerts,
    Advice,
    Recommendations,
}

impl From<StartPanel> for PanelKind {
    fn from(p: StartPanel) -> Self {
        match p {
            StartPanel::Alerts => PanelKind::Alerts,
            StartPanel::Advice => PanelKind::Advice,
            StartPanel::Recommendations => PanelKind::Recommendations,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("warning: logging disabled: {e:#}");
    }

    match cli.command {
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
        },

        Command::Auth { command } => match command {
            AuthCommand::SetToken => auth::set_token()?,
            AuthCommand::Clear => auth::clear_token()?,
        },

        Command::Panel { range, start } => {
            let cfg = config::load_config()?;
            let range = resolve_range(&cfg, &range)?;
            let loader = build_loader(&cfg)?;

            let (job_tx, job_rx) = mpsc::unbounded_channel();
            let (ev_tx, ev_rx) = std::sync::mpsc::channel();
            tokio::spawn(worker::run_worker(loader, job_rx, ev_tx));

            let app = view::App::new(
                range,
                start.into(),
                cfg.messages.clone(),
                cfg.display.fraction_digits,
                job_tx,
            );
            tokio::task::spawn_blocking(move || view::run_panel(app, ev_rx))
                .await
                .context("panel UI thread")??;
        }

        Command::Stats { range } => {
            let cfg = config::load_config()?;
            let range = resolve_range(&cfg, &range)?;
            let panel = fetch_once(&cfg, build_loader(&cfg)?, PanelKind::Alerts, range).await?;
            print_panel(&cfg, &panel, usize::MAX);
        }

        Command::Advice { range } => {
            let cfg = config::load_config()?;
            let range = resolve_range(&cfg, &range)?;
            let panel = fetch_once(&cfg, build_loader(&cfg)?, PanelKind::Advice, range).await?;
            print_panel(&cfg, &panel, usize::MAX);
        }

        Command::Recommendations { range, local } => {
            let cfg = config::load_config()?;
            let range = resolve_range(&cfg, &range)?;
            let loader = with_local(build_loader(&cfg)?, local);
            let panel = fetch_once(&cfg, loader, PanelKind::Recommendations, range).await?;
            if let Some(PanelData::Recommendations(items)) = panel.data() {
                for (i, item) in items.iter().enumerate() {
                    let mark = if item.rec.applied { "x" } else { " " };
                    let score = item.rec.score.map(|s| format!(" ({s:.2})")).unwrap_or_default();
                    println!("{i:>2}. [{mark}] {}{score}", item.rec.title);
                    if !item.rec.detail.is_empty() {
                        println!("       {}", item.rec.detail);
                    }
                    if let Some(action) = &item.rec.suggested_action {
                        println!("       acción: {action}");
                    }
                }
            }
        }

        Command::Apply { index, range, local } => {
            let cfg = config::load_config()?;
            let range = resolve_range(&cfg, &range)?;
            let loader = with_local(build_loader(&cfg)?, local);
            let mut panel =
                fetch_once(&cfg, loader.clone(), PanelKind::Recommendations, range).await?;

            let Some(ticket) = panel.begin_apply(index) else {
                bail!("no pending recommendation at index {index}");
            };
            let result = loader.apply(&ticket.rec).await;
            panel.finish_apply(&ticket, result);

            if let Some(PanelData::Recommendations(items)) = panel.data() {
                let item = &items[ticket.index];
                if let Some(err) = &item.error {
                    bail!("{err}");
                }
                println!("Aplicada: {}", item.rec.title);
            }
        }
    }

    Ok(())
}

fn build_loader(cfg: &Config) -> Result<Loader> {
    let auth = auth::load_auth_context()?;
    let client = ApiClient::new(cfg.client_config(), auth).context("building API client")?;
    Ok(Loader::new(client, cfg))
}

fn with_local(loader: Loader, local: bool) -> Loader {
    if local {
        loader.with_source(RecommendationSource::Local)
    } else {
        loader
    }
}

fn resolve_range(cfg: &Config, args: &RangeArgs) -> Result<DateRange> {
    match (&args.from, &args.to) {
        (Some(from), Some(to)) => DateRange::parse(from, to),
        (None, None) => Ok(DateRange::current_month(cfg.today()?)),
        _ => bail!("pass both --from and --to, or neither"),
    }
}

/// One open/resolve cycle through the same panel state machine the UI uses.
/// A fetch failure becomes the command's error, worded as the panel would show it.
async fn fetch_once(cfg: &Config, loader: Loader, kind: PanelKind, range: DateRange) -> Result<Panel> {
    let mut panel = Panel::new(kind, range, cfg.messages.clone());
    let ticket = panel.open(range);
    let result = loader.load(ticket.kind, &ticket.range).await;
    panel.resolve(ticket.request_id, result);
    if let Some(msg) = panel.error() {
        bail!("{msg}");
    }
    Ok(panel)
}

fn print_panel(cfg: &Config, panel: &Panel, cursor: usize) {
    let (from, to) = panel.range().iso_bounds();
    println!("{} · {from} .. {to}\n", panel.kind().title());
    for line in view::body_lines(panel, cfg.display.fraction_digits, cursor) {
        println!("{line}");
    }
}
