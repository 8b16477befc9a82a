//! Ejecución de comandos externos con tope de tiempo.
//!
//! Único punto de concurrencia real del grader: dos hilos lectores drenan
//! stdout/stderr (evitan deadlock por pipe lleno) mientras el hilo principal
//! sondea al hijo contra el deadline. Cada comando arranca en su propio
//! grupo de procesos; vencido el plazo se señala al grupo entero y el
//! resultado vuelve con `timed_out = true`: un timeout nunca es un `Err`,
//! el step que invoca decide la política de aprobación.

use std::io::Read;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Resultado de un comando externo, haya terminado solo o por el watchdog.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub output: String,
    pub stderr: String,
    pub return_code: i32,
    pub timed_out: bool,
}

impl CommandOutput {
    /// stdout seguido de stderr, para reportes que no separan streams.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.output.clone()
        } else if self.output.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.output, self.stderr)
        }
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Corre `argv` con directorio de trabajo y timeout opcionales.
pub fn run_with_deadline(
    argv: &[String],
    cwd: Option<&Path>,
    timeout_secs: Option<u64>,
) -> std::io::Result<CommandOutput> {
    let (program, args) = argv.split_first().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command")
    })?;

    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    command.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    // Líder de su propio grupo: el kill del watchdog tiene que alcanzar
    // también a los nietos, que heredan los pipes.
    command.process_group(0);

    let mut child = command.spawn()?;

    let stdout = child.stdout.take().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "child stdout not captured")
    })?;
    let stderr = child.stderr.take().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "child stderr not captured")
    })?;

    let stdout_reader = thread::spawn(move || drain(stdout));
    let stderr_reader = thread::spawn(move || drain(stderr));

    let deadline = timeout_secs.map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut timed_out = false;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                timed_out = true;
                terminate_group(&child);
                break child.wait()?;
            }
        }
        thread::sleep(POLL_INTERVAL);
    };

    let output = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();

    Ok(CommandOutput {
        output,
        stderr,
        return_code: status.code().unwrap_or(-1),
        timed_out,
    })
}

/// Corre `script` a través de `sh -c`, para configs que traen el comando
/// como una sola línea de shell.
pub fn run_shell_with_deadline(
    script: &str,
    cwd: Option<&Path>,
    timeout_secs: Option<u64>,
) -> std::io::Result<CommandOutput> {
    let argv = vec!["sh".to_string(), "-c".to_string(), script.to_string()];
    run_with_deadline(&argv, cwd, timeout_secs)
}

/// SIGKILL al grupo completo. Matar solo al hijo directo dejaría a los
/// lectores bloqueados mientras un nieto mantenga abierto su extremo del
/// pipe.
fn terminate_group(child: &Child) {
    // Por el `process_group(0)` del spawn, el pid del hijo es el id del
    // grupo; el pid negado direcciona la señal al grupo.
    unsafe {
        libc::kill(-(child.id() as i32), libc::SIGKILL);
    }
}

fn drain(mut stream: impl Read) -> String {
    let mut buf = String::new();
    let _ = stream.read_to_string(&mut buf);
    buf
}
