//! Sesión de una corrida: pizarra compartida + logging de doble audiencia.
//!
//! La sesión se pasa por referencia mutable a cada step. Es el único estado
//! mutable compartido entre steps: una pizarra JSON (claves documentadas,
//! producidas por un step y consumidas por otros) y la secuencia ordenada de
//! `StepLog` que termina plegada en el reporte final.

use std::collections::HashMap;
use std::panic::Location;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::StepError;
use crate::logging::{Level, LogChannel, LogRecord, StepLog, Visibility};

pub struct Session {
    pub run_id: Uuid,
    /// Pizarra JSON entre steps. Solo un step corre a la vez, así que no
    /// necesita sincronización.
    pub data: HashMap<String, Value>,
    /// Un registro por step, en orden de ejecución.
    pub step_logs: Vec<StepLog>,
    channel: LogChannel,
    active_step: Option<String>,
}

impl Session {
    pub fn new(channel: LogChannel) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            data: HashMap::new(),
            step_logs: Vec::new(),
            channel,
            active_step: None,
        }
    }

    /// Sesión con el canal estándar (captura de estudiante + stream privado).
    pub fn standard(colorize: bool, min_level: Level) -> Self {
        Self::new(LogChannel::standard(colorize, min_level))
    }

    /// Serializa `value` y lo guarda bajo `key` en la pizarra.
    pub fn put<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StepError> {
        let v = serde_json::to_value(value)?;
        self.data.insert(key.to_string(), v);
        Ok(())
    }

    /// Recupera y deserializa la entrada `key`. Falla si no existe.
    pub fn fetch<T: DeserializeOwned>(&self, key: &str) -> Result<T, StepError> {
        let v = self
            .data
            .get(key)
            .ok_or_else(|| StepError::MissingData { key: key.to_string() })?;
        Ok(serde_json::from_value(v.clone())?)
    }

    /// Variante opcional: `Ok(None)` si la clave no está presente.
    pub fn fetch_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StepError> {
        match self.data.get(key) {
            Some(v) => Ok(Some(serde_json::from_value(v.clone())?)),
            None => Ok(None),
        }
    }

    /// Abre el registro de un step y lo vuelve el destino activo de la
    /// captura de estudiante. Lo llama el executor, no los steps.
    pub(crate) fn begin_step(&mut self, name: &str, display_name: &str) {
        self.step_logs.push(StepLog::new(name, display_name));
        self.active_step = Some(name.to_string());
    }

    pub(crate) fn mark_step_success(&mut self) {
        if let Some(last) = self.step_logs.last_mut() {
            last.success = true;
        }
    }

    pub(crate) fn end_plan(&mut self) {
        self.active_step = None;
    }

    /// Logger hacia el estudiante (se pliega al reporte).
    pub fn student(&mut self) -> LogHandle<'_> {
        LogHandle { session: self, visibility: Visibility::STUDENT }
    }

    /// Logger hacia el operador (stream privado, con diagnóstico completo).
    pub fn private(&mut self) -> LogHandle<'_> {
        LogHandle { session: self, visibility: Visibility::PRIVATE }
    }

    /// Ambas audiencias a la vez.
    pub fn both(&mut self) -> LogHandle<'_> {
        LogHandle { session: self, visibility: Visibility::BOTH }
    }

    fn emit(&mut self, visibility: Visibility, level: Level, location: &'static Location<'static>, message: &str) {
        let record = LogRecord {
            ts: Utc::now(),
            level,
            visibility,
            step_name: self.active_step.as_deref(),
            location,
            message,
        };
        self.channel.dispatch(&record, &mut self.step_logs);
    }
}

/// Handle efímero atado a una audiencia: `session.student().info("...")`.
pub struct LogHandle<'a> {
    session: &'a mut Session,
    visibility: Visibility,
}

macro_rules! level_method {
    ($name:ident, $level:expr) => {
        #[track_caller]
        pub fn $name(self, message: impl AsRef<str>) {
            self.log($level, message.as_ref());
        }
    };
}

impl LogHandle<'_> {
    level_method!(trace, Level::Trace);
    level_method!(debug, Level::Debug);
    level_method!(info, Level::Info);
    level_method!(success, Level::Success);
    level_method!(warning, Level::Warning);
    level_method!(error, Level::Error);
    level_method!(critical, Level::Critical);

    #[track_caller]
    fn log(self, level: Level, message: &str) {
        let location = Location::caller();
        self.session.emit(self.visibility, level, location, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Marker {
        value: i64,
    }

    fn quiet_session() -> Session {
        // Sin sink de stream para no ensuciar la salida de test.
        Session::new(LogChannel::new().with_sink(Visibility::STUDENT, crate::logging::LogSink::StepCapture))
    }

    #[test]
    fn blackboard_round_trip_is_typed() {
        let mut session = quiet_session();
        session.put("marker", &Marker { value: 7 }).expect("put");
        let got: Marker = session.fetch("marker").expect("fetch");
        assert_eq!(got, Marker { value: 7 });
    }

    #[test]
    fn fetch_missing_key_is_an_error() {
        let session = quiet_session();
        let err = session.fetch::<Marker>("absent").unwrap_err();
        assert!(matches!(err, StepError::MissingData { .. }));
        let opt: Option<Marker> = session.fetch_opt("absent").expect("fetch_opt");
        assert!(opt.is_none());
    }

    #[test]
    fn student_messages_land_in_the_active_step_log() {
        let mut session = quiet_session();
        session.begin_step("a", "A");
        session.student().info("for the student");
        session.private().error("operator only");
        session.begin_step("b", "B");
        session.both().info("shared");

        assert_eq!(session.step_logs[0].log_chunks, vec!["for the student\n".to_string()]);
        assert_eq!(session.step_logs[1].log_chunks, vec!["shared\n".to_string()]);
    }

    #[test]
    fn mark_step_success_touches_only_the_last_log() {
        let mut session = quiet_session();
        session.begin_step("a", "A");
        session.begin_step("b", "B");
        session.mark_step_success();
        assert!(!session.step_logs[0].success);
        assert!(session.step_logs[1].success);
    }
}
