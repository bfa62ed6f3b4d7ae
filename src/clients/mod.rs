//! Client directory and follow-up task agenda.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::LedgerError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub contact_info: String,
}

impl Client {
    pub fn new(name: &str, contact_info: &str) -> Result<Self, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidInput("client name is required".into()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            contact_info: contact_info.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
    Confirmed,
}

impl TaskStatus {
    /// Status reached by one tap on the task: pending, completed, confirmed, then back.
    pub fn next(self) -> Self {
        match self {
            TaskStatus::Pending => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Confirmed,
            TaskStatus::Confirmed => TaskStatus::Pending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pendiente",
            TaskStatus::Completed => "Completada",
            TaskStatus::Confirmed => "Confirmada",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientTask {
    pub id: Uuid,
    pub client_id: Uuid,
    pub description: String,
    pub due_at: DateTime<Utc>,
    pub status: TaskStatus,
}

impl ClientTask {
    pub fn new(
        client_id: Uuid,
        description: &str,
        due_at: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(LedgerError::InvalidInput("task description is required".into()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            client_id,
            description: description.to_string(),
            due_at,
            status: TaskStatus::Pending,
        })
    }

    pub fn is_late(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Pending && self.due_at < now
    }
}

/// Tasks for one client (or every client), earliest due first.
pub fn agenda(tasks: &[ClientTask], client_id: Option<Uuid>) -> Vec<&ClientTask> {
    let mut selected: Vec<&ClientTask> = tasks
        .iter()
        .filter(|task| client_id.map_or(true, |id| task.client_id == id))
        .collect();
    selected.sort_by_key(|task| task.due_at);
    selected
}

pub fn pending_count(tasks: &[ClientTask], client_id: Uuid) -> usize {
    tasks
        .iter()
        .filter(|task| task.client_id == client_id && task.status == TaskStatus::Pending)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn status_cycles_back_to_pending() {
        let status = TaskStatus::Pending.next().next().next();
        assert_eq!(status, TaskStatus::Pending);
        assert_eq!(serde_json::to_string(&TaskStatus::Confirmed).unwrap(), "\"confirmed\"");
    }

    #[test]
    fn agenda_sorts_and_filters() {
        let ana = Client::new("Ana", "809-555-0101").unwrap();
        let luis = Client::new("Luis", "").unwrap();
        let tasks = vec![
            ClientTask::new(ana.id, "Enviar factura", at(15)).unwrap(),
            ClientTask::new(luis.id, "Llamar", at(9)).unwrap(),
            ClientTask::new(ana.id, "Confirmar pedido", at(10)).unwrap(),
        ];
        let all = agenda(&tasks, None);
        assert_eq!(all[0].description, "Llamar");
        let only_ana = agenda(&tasks, Some(ana.id));
        assert_eq!(only_ana.len(), 2);
        assert_eq!(only_ana[0].description, "Confirmar pedido");
        assert_eq!(pending_count(&tasks, ana.id), 2);
    }

    #[test]
    fn only_pending_tasks_run_late() {
        let mut task = ClientTask::new(Uuid::new_v4(), "Visita", at(8)).unwrap();
        let later = at(8) + Duration::hours(1);
        assert!(task.is_late(later));
        task.status = task.status.next();
        assert!(!task.is_late(later));
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(Client::new("  ", "x").is_err());
        assert!(ClientTask::new(Uuid::new_v4(), "", at(1)).is_err());
    }
}
