use tracing::{info, warn};
use uuid::Uuid;

use crate::core::services::{ServiceError, ServiceResult};
use crate::core::{AppContext, Workspace};
use crate::ledger::{AppSettings, Company, CompanyPatch};

/// Ledger groups and owner branding.
pub struct CompanyService;

impl CompanyService {
    pub fn add(ctx: &AppContext, ws: &mut Workspace, company: Company) -> ServiceResult<Uuid> {
        if company.name.trim().is_empty() {
            return Err(ServiceError::Invalid("company name is required".into()));
        }
        let id = company.id;
        ws.companies.push(company.clone());
        if let Err(err) = ctx.store().insert_company(ws.owner, &company) {
            ws.companies.retain(|existing| existing.id != id);
            warn!(%id, error = %err, "company insert reverted");
            return Err(err.into());
        }
        info!(%id, name = %company.name, "company added");
        Ok(id)
    }

    pub fn update(
        ctx: &AppContext,
        ws: &mut Workspace,
        id: Uuid,
        patch: &CompanyPatch,
    ) -> ServiceResult<()> {
        let index = ws
            .companies
            .iter()
            .position(|company| company.id == id)
            .ok_or_else(|| ServiceError::not_found("Company"))?;
        let previous = ws.companies[index].clone();
        ws.companies[index].apply_patch(patch);
        if let Err(err) = ctx.store().update_company(ws.owner, id, patch) {
            ws.companies[index] = previous;
            warn!(%id, error = %err, "company update reverted");
            return Err(err.into());
        }
        Ok(())
    }

    pub fn select(ws: &mut Workspace, id: Uuid) -> ServiceResult<()> {
        if !ws.companies.iter().any(|company| company.id == id) {
            return Err(ServiceError::not_found("Company"));
        }
        ws.selected_company = Some(id);
        Ok(())
    }

    pub fn update_settings(
        ctx: &AppContext,
        ws: &mut Workspace,
        settings: AppSettings,
    ) -> ServiceResult<()> {
        let previous = std::mem::replace(&mut ws.settings, settings.clone());
        if let Err(err) = ctx.store().upsert_settings(ws.owner, &settings) {
            ws.settings = previous;
            warn!(error = %err, "settings update reverted");
            return Err(err.into());
        }
        Ok(())
    }
}
