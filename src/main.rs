use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tq::controller::Controller;
use tq::model::{Model, Status};
use tq::pagination::DEFAULT_ROWS_PER_PAGE;
use tq::query::QueryConfig;
use tq::ui::TableUI;
use tq::{TQConfig, TQError, infer_columns, load_rows};

#[derive(Parser, Debug)]
#[command(name = "tq")]
#[command(version, about = "Search, filter and sort tabular data in the terminal", long_about = None)]
struct Args {
    /// Rows to show: a json array of objects, or a csv, parquet or arrow file
    file: String,

    /// Field the free-text search looks at. Repeat it to replace the default list
    #[arg(long = "search-field", value_name = "FIELD")]
    search_fields: Vec<String>,

    /// Field holding a {firstName, lastName} object. Repeat it to replace the default (manager)
    #[arg(long = "person-field", value_name = "FIELD")]
    person_fields: Vec<String>,

    /// Rows per page (5, 10, 25 or 50)
    #[arg(long, default_value_t = DEFAULT_ROWS_PER_PAGE)]
    rows_per_page: usize,

    /// Columns are cut to this many characters
    #[arg(long, default_value_t = 30)]
    max_column_width: usize,

    /// Milliseconds to wait for a terminal event
    #[arg(long, default_value_t = 100)]
    event_poll_time: u64,

    /// Log file, the terminal itself is taken by the ui. Filter with RUST_LOG
    #[arg(long, default_value = "~/.tq.log")]
    log_file: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logging(&args.log_file) {
        eprintln!("Could not set up logging: {e}");
    }

    match run(args) {
        Err(e) => {
            error!("Exiting with {e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(log_file: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = shellexpand::full(log_file)?.into_owned();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .try_init()?;
    Ok(())
}

fn run(args: Args) -> Result<(), TQError> {
    info!("Starting tq with {args:?}");
    let path = shellexpand::full(&args.file)
        .map_err(|e| TQError::LoadingFailed(e.to_string()))?
        .into_owned();

    let dataset = load_rows(PathBuf::from(path))?;
    let columns = infer_columns(&dataset.fields, &dataset.rows);

    let mut query_config = QueryConfig::default();
    if !args.search_fields.is_empty() {
        query_config.search_fields = args.search_fields;
    }
    if !args.person_fields.is_empty() {
        query_config.person_fields = args.person_fields;
    }

    let cfg = TQConfig {
        event_poll_time: args.event_poll_time,
        max_column_width: args.max_column_width,
        rows_per_page: args.rows_per_page,
    };

    let (width, _) = ratatui::crossterm::terminal::size()?;
    let model = Model::init(&cfg, query_config, dataset, columns, width as usize);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, model, &cfg);
    ratatui::restore();
    result
}

fn event_loop(terminal: &mut DefaultTerminal, mut model: Model, cfg: &TQConfig) -> Result<(), TQError> {
    let mut ui = TableUI::new();
    let controller = Controller::new(cfg);

    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message);
        };
    }

    Ok(())
}
