use std::io::Write;
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Local, Timelike};
use clap::CommandFactory;
use clap::FromArgMatches;
use clap::Parser;
use client::HttpChatClient;
use companion::Companion;
use config::Config;
use state::{Action, App, Exchange};
use store::ProfileStore;
use tracing_subscriber::EnvFilter;
use types::Role;

mod client;
mod companion;
mod config;
mod context;
mod dashboard;
mod error;
mod fallback;
mod state;
mod store;
mod types;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Args {
    /// Talk to the companion; lines starting with `#` are commands
    Chat,
    /// Print the dashboard and exit
    Dashboard,
    /// Write the whole profile to lifesync-export-<date>.json
    Export {
        #[clap(long, short)]
        dir: Option<PathBuf>,
    },
    /// Delete all saved data
    Clear {
        #[clap(long)]
        yes: bool,
    },
}

mod world {
    use std::path::PathBuf;

    use clap::{Parser, ValueEnum};

    use crate::types::{Mood, Theme};

    #[derive(Clone, Copy, ValueEnum)]
    pub(crate) enum MoodArg {
        Great,
        Good,
        Okay,
        Low,
        Stressed,
    }

    impl From<MoodArg> for Mood {
        fn from(arg: MoodArg) -> Self {
            match arg {
                MoodArg::Great => Mood::Great,
                MoodArg::Good => Mood::Good,
                MoodArg::Okay => Mood::Okay,
                MoodArg::Low => Mood::Low,
                MoodArg::Stressed => Mood::Stressed,
            }
        }
    }

    #[derive(Parser)]
    #[command(version, about, long_about = None)]
    pub(crate) enum Command {
        Mood {
            value: MoodArg,
        },
        Capture {
            text: Vec<String>,
        },
        Name {
            name: Vec<String>,
        },
        Theme {
            theme: Theme,
        },
        Dashboard,
        History,
        Export {
            dir: Option<PathBuf>,
        },
        Clear {
            #[clap(long)]
            yes: bool,
        },
        Exit,
    }
}

const ASSISTANT_NAME: &str = "lifesync";

fn open_app(config: &Config) -> App {
    App::open(ProfileStore::in_dir(&config.data_dir()))
}

fn build_companion(config: &Config) -> Companion {
    let Some(api_key) = config.remote.api_key() else {
        tracing::info!("no API key configured, using offline replies");
        return Companion::offline();
    };
    match HttpChatClient::new(&config.remote, api_key.to_string()) {
        Ok(client) => Companion::new(Some(Arc::new(client))),
        Err(err) => {
            tracing::warn!("failed to build chat client, using offline replies: {}", err);
            Companion::offline()
        }
    }
}

fn user_label(app: &App) -> String {
    let name = &app.profile().name;
    if name.is_empty() {
        whoami::username()
    } else {
        name.clone()
    }
}

fn apply(app: &mut App, action: Action) {
    match app.update(action) {
        Ok(outcome) => {
            if let Some(line) = outcome.confirmation() {
                println!("world: {}", line);
            }
        }
        Err(err) => println!("world: warning: {}", err),
    }
}

fn export(app: &App, dir: Option<PathBuf>) {
    let dir = dir.unwrap_or_else(|| PathBuf::from("."));
    match store::export(app.profile(), &dir, Local::now().date_naive()) {
        Ok(path) => println!("world: Data exported to {:?} 📥", path),
        Err(err) => println!("world: export failed: {}", err),
    }
}

fn print_history(app: &App, user_name: &str) {
    for turn in &app.profile().history {
        match turn.role {
            Role::User => println!("{}: {}", user_name, turn.content),
            Role::Assistant => println!("{}: {}", ASSISTANT_NAME, turn.content),
            Role::System => println!("system: {}", turn.content),
        }
    }
}

/// Returns false when the session should end.
fn run_command(app: &mut App, command: world::Command) -> bool {
    match command {
        world::Command::Mood { value } => apply(app, Action::RecordMood(value.into())),
        world::Command::Capture { text } => apply(app, Action::QuickCapture(text.join(" "))),
        world::Command::Name { name } => {
            apply(app, Action::SetName(name.join(" ")));
            let hour = Local::now().hour();
            println!("world: {}", dashboard::greeting(&app.profile().name, hour));
        }
        world::Command::Theme { theme } => apply(app, Action::SetTheme(theme)),
        world::Command::Dashboard => print!("{}", app.dashboard()),
        world::Command::History => {
            let user_name = user_label(app);
            print_history(app, &user_name);
        }
        world::Command::Export { dir } => export(app, dir),
        world::Command::Clear { yes } => {
            if yes {
                apply(app, Action::ClearAll);
            } else {
                println!("world: This cannot be undone. Use `#clear --yes` to delete all data.");
            }
        }
        world::Command::Exit => return false,
    }
    true
}

async fn exec_chat(config: &Config) -> anyhow::Result<()> {
    let mut app = open_app(config);
    let companion = build_companion(config);

    ctrlc::set_handler(|| {
        println!("\nworld: Exiting.");
        exit(0);
    })
    .context("Error setting Ctrl-C handler")?;

    let hour = Local::now().hour();
    println!(
        "{}: {} {}",
        ASSISTANT_NAME,
        dashboard::greeting(&app.profile().name, hour),
        dashboard::greeting_subtitle(hour)
    );
    if !companion.is_remote() {
        println!("world: offline mode, replies are generated locally");
    }

    loop {
        print!("{}: ", user_label(&app));
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        if let Some(command) = input.trim().strip_prefix('#') {
            let mut sw = vec!["#".to_string()];
            match shellwords::split(command) {
                Ok(mut words) => sw.append(&mut words),
                Err(err) => {
                    println!("world: {}", err);
                    continue;
                }
            }

            match <world::Command as CommandFactory>::command().try_get_matches_from(sw) {
                Ok(mut matches) => match world::Command::from_arg_matches_mut(&mut matches) {
                    Ok(command) => {
                        if !run_command(&mut app, command) {
                            break;
                        }
                    }
                    Err(err) => println!("world: {}", err),
                },
                Err(err) => println!("world: {}", err),
            }
        } else {
            print!("{} is typing...", ASSISTANT_NAME);
            std::io::stdout().flush()?;
            let exchange = app.send(&companion, &input).await;
            print!("\r\x1b[2K");

            if let Exchange::Replied { reply, save_error } = exchange {
                if let Some(notice) = reply.notice {
                    println!("world: {}", notice);
                }
                println!("{}: {}", ASSISTANT_NAME, reply.content);
                if let Some(err) = save_error {
                    println!("world: warning: {}", err);
                }
            }
        }
    }

    println!("world: Exiting.");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(&Config::config_path());

    match Args::parse() {
        Args::Chat => exec_chat(&config).await?,
        Args::Dashboard => print!("{}", open_app(&config).dashboard()),
        Args::Export { dir } => export(&open_app(&config), dir),
        Args::Clear { yes } => {
            if !yes {
                println!("world: This cannot be undone. Re-run with --yes to delete all data.");
                return Ok(());
            }
            let store = ProfileStore::in_dir(&config.data_dir());
            store.clear().context("Failed to clear saved data")?;
            println!("world: All data cleared ({:?}).", store.path());
        }
    }
    Ok(())
}
