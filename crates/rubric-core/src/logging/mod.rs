//! Canal de log con doble audiencia.
//!
//! Cada llamada lleva exactamente una etiqueta de visibilidad (`STUDENT`,
//! `PRIVATE` o su unión). El canal es una lista explícita de pares
//! (predicado, sink) invocados de forma síncrona: multicast, no enrutamiento
//! excluyente. No hay logger global; el sink de captura escribe sobre la
//! secuencia de `StepLog` de la sesión que se le pasa en cada despacho.

use std::fmt;
use std::ops::BitOr;
use std::panic::Location;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use colored::Colorize;

/// Máscara de bits de audiencia. El valor cero no alcanza ningún sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility(u8);

impl Visibility {
    pub const NONE: Visibility = Visibility(0);
    pub const STUDENT: Visibility = Visibility(0b01);
    pub const PRIVATE: Visibility = Visibility(0b10);
    pub const BOTH: Visibility = Visibility(0b11);

    pub fn intersects(self, other: Visibility) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for Visibility {
    type Output = Visibility;
    fn bitor(self, rhs: Visibility) -> Visibility {
        Visibility(self.0 | rhs.0)
    }
}

/// Severidad, en orden ascendente. `Success` queda entre `Info` y `Warning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Success,
    Warning,
    Error,
    Critical,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Success => "SUCCESS",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Level::Trace),
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "SUCCESS" => Ok(Level::Success),
            "WARNING" => Ok(Level::Warning),
            "ERROR" => Ok(Level::Error),
            "CRITICAL" => Ok(Level::Critical),
            other => Err(format!("unknown log level `{other}`")),
        }
    }
}

/// Registro por step, visible para el estudiante en el reporte final.
///
/// Se crea uno al comenzar cada step; el sink de captura agrega `log_chunks`,
/// el executor fija `success` y steps posteriores pueden reescribir `score`
/// (p. ej. penalizaciones del puntaje final).
#[derive(Debug, Clone)]
pub struct StepLog {
    pub name: String,
    pub display_name: String,
    pub success: bool,
    pub score: Option<f64>,
    pub log_chunks: Vec<String>,
}

impl StepLog {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            success: false,
            score: Some(0.0),
            log_chunks: Vec::new(),
        }
    }
}

/// Una llamada de log ya resuelta, lista para despachar a los sinks.
pub struct LogRecord<'a> {
    pub ts: DateTime<Utc>,
    pub level: Level,
    pub visibility: Visibility,
    pub step_name: Option<&'a str>,
    pub location: &'static Location<'static>,
    pub message: &'a str,
}

/// Sinks soportados. Conjunto cerrado: el canal no es un framework de
/// plugins, solo la tubería de salida del pipeline.
pub enum LogSink {
    /// Agrega el mensaje crudo (sin formato) al último `StepLog` de la
    /// sesión. Si todavía no hay ninguno, descarta el registro.
    StepCapture,
    /// Línea formateada y nivelada hacia stderr, para el operador.
    Stream { min_level: Level, colorize: bool },
}

impl LogSink {
    fn deliver(&mut self, record: &LogRecord<'_>, step_logs: &mut Vec<StepLog>) {
        match self {
            LogSink::StepCapture => {
                if let Some(last) = step_logs.last_mut() {
                    last.log_chunks.push(format!("{}\n", record.message));
                }
            }
            LogSink::Stream { min_level, colorize } => {
                if record.level >= *min_level {
                    eprintln!("{}", format_private_line(record, *colorize));
                }
            }
        }
    }
}

/// Lista ordenada de pares (máscara, sink). Un registro se entrega a cada
/// sink cuya máscara interseca su visibilidad, independiente de los demás.
pub struct LogChannel {
    sinks: Vec<(Visibility, LogSink)>,
}

impl LogChannel {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sink(mut self, mask: Visibility, sink: LogSink) -> Self {
        self.sinks.push((mask, sink));
        self
    }

    /// Canal estándar del grader: captura por step para el estudiante y
    /// stream nivelado para el operador.
    pub fn standard(colorize: bool, min_level: Level) -> Self {
        Self::new()
            .with_sink(Visibility::STUDENT, LogSink::StepCapture)
            .with_sink(Visibility::PRIVATE, LogSink::Stream { min_level, colorize })
    }

    pub fn dispatch(&mut self, record: &LogRecord<'_>, step_logs: &mut Vec<StepLog>) {
        for (mask, sink) in self.sinks.iter_mut() {
            if record.visibility.intersects(*mask) {
                sink.deliver(record, step_logs);
            }
        }
    }
}

impl Default for LogChannel {
    fn default() -> Self {
        Self::new()
    }
}

fn format_private_line(record: &LogRecord<'_>, colorize: bool) -> String {
    let ts = record.ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string();
    let level = format!("{:>8}", record.level.as_str());
    let name = record.step_name.unwrap_or("-");
    let loc = format!("{}:{}", record.location.file(), record.location.line());
    if colorize {
        let level = match record.level {
            Level::Trace | Level::Debug => level.dimmed(),
            Level::Info => level.normal(),
            Level::Success => level.green(),
            Level::Warning => level.yellow(),
            Level::Error | Level::Critical => level.red(),
        };
        format!(
            "{} | {} | [{:>21}] | {} - {}",
            ts.green(),
            level,
            name,
            loc.cyan(),
            record.message
        )
    } else {
        format!("{ts} | {level} | [{name:>21}] | {loc} - {}", record.message)
    }
}
