mod commands;
mod logging;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use commands::{CliError, Session};

#[derive(Parser)]
#[command(name = "batch", version, about = "Chunk-oriented batch job runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Nivel de log (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Fichero SQLite; por defecto `DATABASE_URL` o `batchflow.db`
    #[arg(long, global = true)]
    database: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Lanza un job y espera su estado terminal
    Run {
        /// Nombre del job registrado
        job: String,
        /// Parámetros `key=value`, `key(long)=1`, `key(date)=...`; sufijo `,false` = no identificador
        params: Vec<String>,
        /// Tamaño de chunk del step de procesamiento
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Latencia simulada de la API externa (ms)
        #[arg(long)]
        api_latency_ms: Option<u64>,
        /// Imprime el informe como JSON
        #[arg(long)]
        json: bool,
    },
    /// Lista los jobs registrados
    Jobs,
    /// Lista ejecuciones (más recientes al final)
    Executions {
        /// Filtra por nombre de job
        #[arg(long)]
        job: Option<String>,
    },
    /// Muestra una ejecución con sus steps
    Show {
        execution_id: Uuid,
        /// Incluye el log de eventos
        #[arg(long)]
        events: bool,
        #[arg(long)]
        json: bool,
    },
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Jobs => commands::jobs::execute(),
        Commands::Run { job,
                        params,
                        chunk_size,
                        api_latency_ms,
                        json, } => {
            let mut settings = batch_adapters::JobSettings::default();
            if let Some(n) = chunk_size {
                settings.chunk_size = n;
            }
            if let Some(ms) = api_latency_ms {
                settings.api_latency_ms = ms;
            }
            let session = Session::open(cli.database.as_deref(), &settings)?;
            commands::run::execute(&session, &job, &params, json)
        }
        Commands::Executions { job } => {
            let session = Session::open(cli.database.as_deref(), &batch_adapters::JobSettings::default())?;
            commands::executions::execute(&session, job.as_deref())
        }
        Commands::Show { execution_id,
                         events,
                         json, } => {
            let session = Session::open(cli.database.as_deref(), &batch_adapters::JobSettings::default())?;
            commands::show::execute(&session, execution_id, events, json)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log_level);
    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[batch] {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
