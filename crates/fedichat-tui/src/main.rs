mod app;
mod runtime;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use fedichat_core::api::HttpChatsApi;
use fedichat_core::store::{ChatStore, Database};
use fedichat_core::timeline::ChatTimeline;
use fedichat_core::tracing_setup::init_tracing;
use fedichat_core::{CoreConfig, DisplayOptions, TimelineRuntime};

use crate::app::App;
use crate::runtime::run_app;

#[derive(Parser, Debug)]
#[command(name = "fedichat-tui", about = "Direct-chat timeline for Pleroma-compatible servers")]
struct Args {
    /// Server base URL, e.g. https://pleroma.example
    #[arg(long)]
    server: String,

    /// OAuth access token
    #[arg(long)]
    token: String,

    /// Local account id the cache rows belong to
    #[arg(long, default_value_t = 1)]
    account: i64,

    /// Override the data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    // Restore the terminal before the panic message is printed.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ui::restore_terminal();
        original_hook(panic_info);
    }));

    let data_dir = args
        .data_dir
        .unwrap_or_else(CoreConfig::default_data_dir);
    let config = CoreConfig::new(data_dir, &args.server, &args.token);

    let db = Database::open(&config.data_dir)?;
    let store = ChatStore::new(db);
    let options = DisplayOptions::load(&store);
    let api = Arc::new(HttpChatsApi::new(&config));

    let timeline = ChatTimeline::new(args.account, api, store, options, config.page_size);
    let mut core_runtime = TimelineRuntime::spawn(timeline);
    let handle = core_runtime.handle();
    let update_rx = core_runtime
        .take_update_rx()
        .ok_or_else(|| anyhow::anyhow!("timeline runtime already has an active receiver"))?;

    let mut terminal = ui::init_terminal()?;
    let mut app = App::new(options);

    let result = run_app(&mut terminal, &mut app, handle, update_rx).await;

    core_runtime.shutdown();
    ui::restore_terminal()?;

    if let Err(err) = &result {
        eprintln!("Error: {err}");
    }
    result
}
