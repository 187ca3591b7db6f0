//! Clock-in/clock-out entries and their weekly aggregates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single shift. Open while `completado` is false.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeClockEntry {
    pub user_id: String,
    pub user_nombre: String,
    pub entrada: DateTime<Utc>,
    #[serde(default)]
    pub salida: Option<DateTime<Utc>>,
    #[serde(default)]
    pub horas_totales: f64,
    /// Hours credited to the week the shift started in
    #[serde(default)]
    pub horas_semana_actual: f64,
    /// Hours credited to later weeks (shift crossed Monday 00:00)
    #[serde(default)]
    pub horas_semana_siguiente: f64,
    /// Civil Monday of the week the shift started in
    pub semana_inicio: NaiveDate,
    pub completado: bool,
}

/// Hours worked by one user in one civil week.
///
/// Stored at: `semanas/{user_id}_{semana_inicio}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub user_id: String,
    pub semana_inicio: NaiveDate,
    pub horas_totales: f64,
    /// Entries already counted (duplicate detection)
    #[serde(default)]
    pub fichajes: Vec<String>,
}

impl WeeklySummary {
    pub fn key(user_id: &str, semana_inicio: NaiveDate) -> String {
        format!("{}_{}", user_id, semana_inicio.format("%Y-%m-%d"))
    }

    pub fn empty(user_id: &str, semana_inicio: NaiveDate) -> Self {
        Self {
            user_id: user_id.to_string(),
            semana_inicio,
            horas_totales: 0.0,
            fichajes: Vec::new(),
        }
    }

    /// Add hours for an entry. Returns `false` if the entry was already counted.
    pub fn add_entry(&mut self, entry_id: &str, hours: f64) -> bool {
        if self.fichajes.iter().any(|id| id == entry_id) {
            return false;
        }
        self.fichajes.push(entry_id.to_string());
        self.horas_totales += hours;
        true
    }
}
