use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::clients::{Client, ClientTask};
use crate::core::services::{ServiceError, ServiceResult};
use crate::core::{AppContext, Workspace};

pub struct ClientService;

impl ClientService {
    pub fn add_client(
        ctx: &AppContext,
        ws: &mut Workspace,
        name: &str,
        contact_info: &str,
    ) -> ServiceResult<Uuid> {
        let client = Client::new(name, contact_info)?;
        let id = client.id;
        ws.clients.push(client.clone());
        if let Err(err) = ctx.store().insert_client(ws.owner, &client) {
            ws.clients.retain(|existing| existing.id != id);
            warn!(%id, error = %err, "client insert reverted");
            return Err(err.into());
        }
        info!(%id, "client added");
        Ok(id)
    }

    /// Deletes the client together with its tasks.
    pub fn remove_client(ctx: &AppContext, ws: &mut Workspace, id: Uuid) -> ServiceResult<()> {
        let index = ws
            .clients
            .iter()
            .position(|client| client.id == id)
            .ok_or_else(|| ServiceError::not_found("Client"))?;
        let tasks_before = ws.tasks.clone();
        let removed = ws.clients.remove(index);
        ws.tasks.retain(|task| task.client_id != id);

        let store = ctx.store();
        let result = store
            .delete_tasks_for_client(ws.owner, id)
            .and_then(|_| store.delete_client(ws.owner, id));
        if let Err(err) = result {
            ws.clients.insert(index, removed);
            ws.tasks = tasks_before;
            warn!(%id, error = %err, "client delete reverted");
            return Err(err.into());
        }
        Ok(())
    }

    pub fn add_task(
        ctx: &AppContext,
        ws: &mut Workspace,
        client_id: Uuid,
        description: &str,
        due_at: DateTime<Utc>,
    ) -> ServiceResult<Uuid> {
        if !ws.clients.iter().any(|client| client.id == client_id) {
            return Err(ServiceError::not_found("Client"));
        }
        let task = ClientTask::new(client_id, description, due_at)?;
        let id = task.id;
        ws.tasks.push(task.clone());
        if let Err(err) = ctx.store().insert_task(ws.owner, &task) {
            ws.tasks.retain(|existing| existing.id != id);
            warn!(%id, error = %err, "task insert reverted");
            return Err(err.into());
        }
        Ok(id)
    }

    /// Moves a task to its next status and returns the updated task.
    pub fn advance_task(ctx: &AppContext, ws: &mut Workspace, id: Uuid) -> ServiceResult<ClientTask> {
        let task = ws
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| ServiceError::not_found("Task"))?;
        let previous = task.status;
        task.status = previous.next();
        let next = task.status;
        match ctx.store().update_task_status(ws.owner, id, next) {
            Ok(saved) => Ok(saved),
            Err(err) => {
                if let Some(task) = ws.tasks.iter_mut().find(|task| task.id == id) {
                    task.status = previous;
                }
                warn!(%id, error = %err, "task status reverted");
                Err(err.into())
            }
        }
    }
}
