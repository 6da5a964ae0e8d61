// promptguard-console: test prompts against a prompt injection protection
// API from the terminal.
//
// Subcommands mirror the pages of the protection service's dashboard:
// single-prompt analysis, batch analysis, usage analytics, model and
// example listings, and a liveness check.

use clap::{Parser, Subcommand, ValueEnum};
use std::str::FromStr;
use tracing::error;

use promptguard_console::client::ApiClient;
use promptguard_console::config;
use promptguard_console::console;
use promptguard_console::console::batch::ViewOptions;
use promptguard_console::flows::analytics::DateRange;
use promptguard_console::flows::batch::{BatchInput, ManualPrompts, Separator};

#[derive(Parser)]
#[command(name = "promptguard-console")]
#[command(about = "Console for testing prompts against an injection protection API")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "config.yaml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the protection API is reachable
    Status,

    /// List available models
    Models {
        /// Show the detail object for one model id
        #[arg(long)]
        detail: Option<String>,
    },

    /// List the server-curated example prompts
    Examples,

    /// Analyze a single prompt
    Analyze {
        /// Prompt text to analyze
        #[arg(conflicts_with = "example")]
        prompt: Option<String>,

        /// Analyze the server-curated example prompt at this index
        #[arg(long)]
        example: Option<usize>,

        /// Model to analyze against
        #[arg(long, default_value = "gpt-3.5-turbo")]
        model: String,
    },

    /// Analyze a batch of prompts
    Batch {
        /// A prompt entered directly; repeat for more
        #[arg(long = "prompt")]
        prompts: Vec<String>,

        /// Block of text to split into prompts
        #[arg(long, conflicts_with = "prompts")]
        bulk: Option<String>,

        /// Separator for --bulk
        #[arg(long, value_enum, default_value = "line")]
        separator: SeparatorArg,

        /// Separator string when --separator custom is chosen
        #[arg(long)]
        custom_separator: Option<String>,

        /// Draw this many random example prompts instead
        #[arg(long, conflicts_with_all = ["prompts", "bulk"], value_parser = clap::value_parser!(u8).range(1..=10))]
        random: Option<u8>,

        /// Model to analyze against
        #[arg(long, default_value = "gpt-3.5-turbo")]
        model: String,

        /// Show only rows judged safe
        #[arg(long, conflicts_with = "only_unsafe")]
        only_safe: bool,

        /// Show only rows judged unsafe
        #[arg(long)]
        only_unsafe: bool,

        /// Expand the detail panel of every row
        #[arg(long)]
        details: bool,
    },

    /// Show usage analytics
    Analytics {
        /// Restrict the summary to a preset reporting window
        #[arg(long, value_enum)]
        range: Option<RangeArg>,

        /// Keep the view open, refreshing every five minutes
        #[arg(long)]
        watch: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SeparatorArg {
    Line,
    Comma,
    Custom,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RangeArg {
    Last7days,
    Last30days,
    ThisMonth,
    LastMonth,
}

impl From<RangeArg> for DateRange {
    fn from(arg: RangeArg) -> Self {
        match arg {
            RangeArg::Last7days => DateRange::Last7Days,
            RangeArg::Last30days => DateRange::Last30Days,
            RangeArg::ThisMonth => DateRange::ThisMonth,
            RangeArg::LastMonth => DateRange::LastMonth,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = config::load_config(&cli.config)?;
    setup_logging(&config.console.debug_level);

    let client = ApiClient::new(&config.api)?;
    run_command(cli.command, &client).await?;

    Ok(())
}

// Sets up logging with the configured level.
fn setup_logging(debug_level_str: &str) {
    let debug_level = tracing::Level::from_str(debug_level_str).unwrap_or_else(|_| {
        error!(
            "Unknown debug level: {}, defaulting to ERROR",
            debug_level_str
        );
        tracing::Level::ERROR
    });

    tracing_subscriber::fmt()
        .with_max_level(debug_level)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_command(command: Commands, client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Status => console::status::run(client).await?,

        Commands::Models { detail } => match detail {
            Some(model_id) => console::models::run_detail(client, &model_id).await?,
            None => console::models::run_list(client).await?,
        },

        Commands::Examples => console::analyze::run_examples(client).await?,

        Commands::Analyze {
            prompt,
            example,
            model,
        } => {
            let text = match (prompt, example) {
                (Some(text), _) => text,
                (None, Some(index)) => console::analyze::example_at(client, index).await?,
                (None, None) => {
                    println!("Warning: Please enter a prompt to test");
                    return Ok(());
                }
            };
            let model = console::models::resolve_model(client, &model).await;
            console::analyze::run(client, &text, &model).await?;
        }

        Commands::Batch {
            prompts,
            bulk,
            separator,
            custom_separator,
            random,
            model,
            only_safe,
            only_unsafe,
            details,
        } => {
            let input = build_batch_input(prompts, bulk, separator, custom_separator, random);
            let view = ViewOptions {
                only_safe,
                only_unsafe,
                expand_details: details,
            };
            let model = console::models::resolve_model(client, &model).await;
            console::batch::run(client, &input, &model, view).await?;
        }

        Commands::Analytics { range, watch } => {
            console::analytics::run(client, range.map(DateRange::from), watch).await?;
        }
    }

    Ok(())
}

// Maps the batch CLI options onto one of the three input modes.
fn build_batch_input(
    prompts: Vec<String>,
    bulk: Option<String>,
    separator: SeparatorArg,
    custom_separator: Option<String>,
    random: Option<u8>,
) -> BatchInput {
    if let Some(count) = random {
        return BatchInput::Random {
            count: count as usize,
        };
    }

    if let Some(text) = bulk {
        let separator = match separator {
            SeparatorArg::Line => Separator::Newline,
            SeparatorArg::Comma => Separator::Comma,
            SeparatorArg::Custom => Separator::Custom(custom_separator.unwrap_or_default()),
        };
        return BatchInput::Bulk { text, separator };
    }

    let mut manual = ManualPrompts::new();
    for (index, prompt) in prompts.into_iter().enumerate() {
        if index > 0 {
            manual.add();
        }
        manual.update(index, prompt);
    }
    BatchInput::Manual(manual)
}
