use clap::{Args, Parser, Subcommand};
use colorpage::config::{self, AppConfig, DefaultsConfig};
use colorpage::credentials::{ApiKey, CredentialError, KeyStore};
use colorpage::export::{self, ExportFormat};
use colorpage::generation::{GenerationEvent, MAX_BATCH};
use colorpage::geometry::{Grid, Orientation, PaperSize};
use colorpage::imaging::RustBackend;
use colorpage::notify::ToastMessage;
use colorpage::service::{GeminiService, ImageService};
use colorpage::session::Session;
use colorpage::types::{Difficulty, GenerationConfig, MandalaTheme};
use colorpage::{console, output, prompt};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread::JoinHandle;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "colorpage")]
#[command(about = "Generate printable coloring pages with an image model")]
#[command(long_about = "\
Generate printable coloring pages with an image model

Describe a topic (or pick a mandala theme), a difficulty, a paper size and a
print grid. The model draws black-and-white line art at the grid's exact
aspect ratio; colorpage crops it, splits it across pages and exports it.

  colorpage layout --grid 2x3 --paper a4
  colorpage generate \"friendly dinosaurs\" --difficulty easy --count 2
  colorpage generate --mandala ocean --format pdf
  colorpage export drawing.png --grid 2x2 --format pdf
  colorpage session \"owls in a forest\"

The API key is read from COLORPAGE_API_KEY or from the file written by
'colorpage key set'. Run 'colorpage gen-config' for a documented
colorpage.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing colorpage.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Verbose diagnostics on stderr (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// The generation form. Unset fields fall back to `[defaults]` in the config.
#[derive(Args, Clone)]
struct FormArgs {
    /// Free-form subject of the drawing
    topic: Option<String>,
    /// Draw a mandala with this preset theme instead of a topic
    #[arg(long, value_enum, conflicts_with = "topic")]
    mandala: Option<MandalaTheme>,
    #[arg(long, value_enum)]
    difficulty: Option<Difficulty>,
    #[arg(long, value_enum)]
    paper: Option<PaperSize>,
    #[arg(long, value_enum)]
    orientation: Option<Orientation>,
    /// Pages across x pages down, e.g. 2x3 (each 1-6)
    #[arg(long)]
    grid: Option<Grid>,
}

impl FormArgs {
    fn resolve(&self, defaults: &DefaultsConfig) -> GenerationConfig {
        let base = match self.mandala {
            Some(theme) => GenerationConfig::mandala(theme),
            None => GenerationConfig::free(self.topic.clone().unwrap_or_default()),
        };
        GenerationConfig {
            difficulty: self.difficulty.unwrap_or(defaults.difficulty),
            paper_size: self.paper.unwrap_or(defaults.paper_size),
            orientation: self.orientation.unwrap_or(defaults.orientation),
            grid: self.grid.unwrap_or(defaults.grid),
            ..base
        }
    }

    /// Like [`resolve`](Self::resolve), but a topic is required in free mode.
    fn resolve_request(
        &self,
        defaults: &DefaultsConfig,
    ) -> Result<GenerationConfig, Box<dyn std::error::Error>> {
        let config = self.resolve(defaults);
        if self.mandala.is_none() && config.topic.trim().is_empty() {
            return Err("a topic (or --mandala <theme>) is required".into());
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the page geometry and preview guides for a grid
    Layout(FormArgs),
    /// Print the instruction text sent to the image model
    Prompt(FormArgs),
    /// Generate designs and export each one
    Generate {
        #[command(flatten)]
        form: FormArgs,
        /// Images to generate (1-3)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_BATCH as i64))]
        count: Option<u32>,
        /// Export formats for every generated design
        #[arg(long, value_enum, value_delimiter = ',', default_value = "png")]
        format: Vec<ExportFormat>,
        /// Output directory (defaults to export.output_dir)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run the export pipeline on an existing image, without the network
    Export {
        /// Image to crop, tile and encode
        input: PathBuf,
        #[command(flatten)]
        form: FormArgs,
        #[arg(long, value_enum, default_value = "pdf")]
        format: ExportFormat,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Interactive session: generate, edit, undo, export, zip
    Session {
        #[command(flatten)]
        form: FormArgs,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_BATCH as i64))]
        count: Option<u32>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a stock colorpage.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum KeyAction {
    /// Save a key (checked against the service unless --no-check)
    Set {
        key: String,
        #[arg(long)]
        no_check: bool,
    },
    /// Show the effective key, masked
    Show,
    /// Remove the stored key
    Clear,
    /// Probe the effective key against the service
    Check,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,colorpage=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print every message received on `rx` until all senders are gone.
fn spawn_printer<T, F>(rx: mpsc::Receiver<T>, format: F) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Fn(&T) -> Vec<String> + Send + 'static,
{
    std::thread::spawn(move || {
        for event in rx {
            for line in format(&event) {
                println!("{}", line);
            }
        }
    })
}

fn join_printer(printer: JoinHandle<()>) -> Result<(), Box<dyn std::error::Error>> {
    printer.join().map_err(|_| "output thread panicked".into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let app = config::load_config(&cli.config_dir)?;

    match cli.command {
        Command::Layout(form) => {
            let config = form.resolve(&app.defaults);
            output::print_layout(&config.layout(), app.export.max_side);
        }
        Command::Prompt(form) => {
            let config = form.resolve_request(&app.defaults)?;
            println!("{}", prompt::build_prompt(&config));
        }
        Command::Generate {
            form,
            count,
            format,
            output: out,
        } => {
            let config = form.resolve_request(&app.defaults)?;
            let out = out.unwrap_or_else(|| app.export.output_dir.clone());
            let key = KeyStore::from_env()?.require()?;
            let service = GeminiService::new(&app.service)?;
            run_generate(
                service,
                key,
                &app,
                config,
                count.unwrap_or(app.defaults.count),
                &format,
                out,
            )?;
        }
        Command::Export {
            input,
            form,
            format,
            output: out,
        } => {
            let config = form.resolve(&app.defaults);
            let out = out.unwrap_or_else(|| app.export.output_dir.clone());
            let bytes = std::fs::read(&input)?;
            let artifact = export::export_image(
                &RustBackend::new(),
                &bytes,
                &config,
                format,
                &app.export_settings(),
                chrono::Utc::now(),
            )?;
            let path = export::write_artifact(&out, &artifact)?;
            println!("Wrote {}", path.display());
        }
        Command::Key { action } => run_key(action, &app)?,
        Command::Session {
            form,
            count,
            output: out,
        } => {
            let config = form.resolve_request(&app.defaults)?;
            let out = out.unwrap_or_else(|| app.export.output_dir.clone());
            let key = KeyStore::from_env()?.require()?;
            let service = GeminiService::new(&app.service)?;
            run_session(
                service,
                key,
                &app,
                config,
                count.unwrap_or(app.defaults.count),
                out,
            )?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_generate(
    service: impl ImageService,
    key: ApiKey,
    app: &AppConfig,
    config: GenerationConfig,
    count: u32,
    formats: &[ExportFormat],
    out: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let (event_tx, event_rx) = mpsc::channel::<GenerationEvent>();
    let (toast_tx, toast_rx) = mpsc::channel::<ToastMessage>();
    let events = spawn_printer(event_rx, output::format_generation_event);
    let toasts = spawn_printer(toast_rx, |t| vec![output::format_toast(t)]);

    let mut session = Session::new(service, RustBackend::new(), key, app)
        .with_progress(event_tx)
        .with_toast_sink(toast_tx);
    session.set_form(config);
    let result = session.generate(count);

    // Export every design before the printers shut down. A failed export has
    // already been toasted; it is returned once the queues are drained.
    let ids: Vec<_> = session.gallery().items().iter().map(|item| item.id).collect();
    let mut written = Vec::new();
    let mut export_error = None;
    'designs: for id in ids {
        let dir = out.join(format!("design-{}", id.0));
        for &format in formats {
            match session.export_to(id, format, &dir) {
                Ok(path) => written.push(path),
                Err(err) => {
                    export_error = Some(err);
                    break 'designs;
                }
            }
        }
    }

    drop(session);
    join_printer(events)?;
    join_printer(toasts)?;
    for path in written {
        println!("Wrote {}", path.display());
    }
    result?;
    if let Some(err) = export_error {
        return Err(err.into());
    }
    Ok(())
}

fn run_session(
    service: impl ImageService,
    key: ApiKey,
    app: &AppConfig,
    config: GenerationConfig,
    count: u32,
    out: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let (event_tx, event_rx) = mpsc::channel::<GenerationEvent>();
    let (toast_tx, toast_rx) = mpsc::channel::<ToastMessage>();
    let events = spawn_printer(event_rx, output::format_generation_event);
    let toasts = spawn_printer(toast_rx, |t| vec![output::format_toast(t)]);

    println!("Session: {}", config.summary());
    output::print_layout(&config.layout(), app.export.max_side);
    println!("Type `help` for commands.");

    let mut session = Session::new(service, RustBackend::new(), key, app)
        .with_progress(event_tx)
        .with_toast_sink(toast_tx)
        .with_output_dir(&out);
    session.set_form(config);
    console::run(&mut session, std::io::stdin().lock(), count)?;

    drop(session);
    join_printer(events)?;
    join_printer(toasts)?;
    Ok(())
}

fn run_key(action: KeyAction, app: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = KeyStore::from_env()?;
    match action {
        KeyAction::Set { key, no_check } => {
            let key = ApiKey::new(&key)?;
            if !no_check && !GeminiService::new(&app.service)?.validate_key(&key) {
                return Err(CredentialError::Rejected.into());
            }
            store.save(&key)?;
            println!("Saved {} to {}", key.masked(), store.path().display());
        }
        KeyAction::Show => {
            let loaded = store.load()?;
            println!(
                "{}",
                output::format_key_status(loaded.as_ref().map(|(k, s)| (k, *s)))
            );
        }
        KeyAction::Clear => {
            store.clear()?;
            println!("API key removed from {}", store.path().display());
        }
        KeyAction::Check => {
            let key = store.require()?;
            if GeminiService::new(&app.service)?.validate_key(&key) {
                println!("{}: valid", key.masked());
            } else {
                return Err(CredentialError::Rejected.into());
            }
        }
    }
    Ok(())
}
