use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rubric_core::{Engine, Level, PlanOutcome};
use rubric_steps::builtin_registry;

/// Corre un plan de calificación descrito en YAML contra el catálogo de
/// steps incluido.
#[derive(Debug, Parser)]
#[command(name = "rubric", version, about = "Sequential grading pipeline runner")]
struct Cli {
    /// Config de la corrida: plan, teardown y parámetros compartidos.
    #[arg(short, long)]
    config: PathBuf,

    /// Config global opcional, por debajo de la de la corrida.
    #[arg(long)]
    global_config: Option<PathBuf>,

    /// Colorea el stream privado.
    #[arg(long)]
    colorize: bool,

    /// Nivel mínimo del stream privado.
    #[arg(long, default_value = "DEBUG", value_parser = parse_level)]
    log_level: Level,

    /// Resuelve el plan y lo imprime sin ejecutar nada.
    #[arg(long)]
    dry_run: bool,
}

fn parse_level(raw: &str) -> Result<Level, String> {
    raw.parse()
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let registry = builtin_registry();

    let mut engine = match Engine::from_paths(
        &registry,
        &cli.config,
        cli.global_config.as_deref(),
        cli.colorize,
        cli.log_level,
    ) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("config error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if cli.dry_run {
        match serde_json::to_string_pretty(&engine.plan().describe()) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    let report = engine.run();
    match report.execution.outcome {
        PlanOutcome::Completed => {}
        PlanOutcome::Halted { index } => {
            eprintln!("run halted at step {index}");
        }
        PlanOutcome::Faulted { index } => {
            eprintln!("run faulted at step {index}");
        }
    }

    // La plataforma lee el archivo de resultados, no el exit code: una
    // corrida cortada igual termina en 0.
    ExitCode::SUCCESS
}
