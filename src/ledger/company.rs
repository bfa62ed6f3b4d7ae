use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger group that partitions transactions and cash-flow views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub theme: CompanyTheme,
    pub primary_color: String,
    pub secondary_color: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompanyTheme {
    #[default]
    Green,
    Black,
    Red,
}

impl CompanyTheme {
    pub fn palette(self) -> (&'static str, &'static str) {
        match self {
            CompanyTheme::Green => ("#10b981", "#064e3b"),
            CompanyTheme::Black => ("#111827", "#000000"),
            CompanyTheme::Red => ("#ef4444", "#7f1d1d"),
        }
    }
}

impl Company {
    pub fn new(name: impl Into<String>, theme: CompanyTheme) -> Self {
        let (primary, secondary) = theme.palette();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            logo: None,
            theme,
            primary_color: primary.into(),
            secondary_color: secondary.into(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, CompanyTheme::Green)
    }

    /// Group created for an owner that has none yet.
    pub fn seed() -> Self {
        Self::named("Empresa Principal")
    }

    pub fn apply_patch(&mut self, patch: &CompanyPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(logo) = &patch.logo {
            self.logo = Some(logo.clone());
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(color) = &patch.primary_color {
            self.primary_color = color.clone();
        }
        if let Some(color) = &patch.secondary_color {
            self.secondary_color = color.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompanyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<CompanyTheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
}

/// Picks the remembered company when it still exists, otherwise the first one.
pub fn resolve_selected(companies: &[Company], remembered: Option<Uuid>) -> Option<Uuid> {
    remembered
        .filter(|id| companies.iter().any(|company| company.id == *id))
        .or_else(|| companies.first().map(|company| company.id))
}

pub const DEFAULT_APP_NAME: &str = "FinCommand";

/// Owner-level branding shown in headers and exports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    pub app_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_logo: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.into(),
            app_logo: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_uses_green_palette() {
        let company = Company::seed();
        assert_eq!(company.name, "Empresa Principal");
        assert_eq!(company.primary_color, "#10b981");
        assert_eq!(company.secondary_color, "#064e3b");
    }

    #[test]
    fn remembered_selection_must_still_exist() {
        let first = Company::named("A");
        let second = Company::named("B");
        let all = vec![first.clone(), second.clone()];
        assert_eq!(resolve_selected(&all, Some(second.id)), Some(second.id));
        assert_eq!(resolve_selected(&all, Some(Uuid::new_v4())), Some(first.id));
        assert_eq!(resolve_selected(&[], None), None);
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut company = Company::seed();
        company.apply_patch(&CompanyPatch {
            theme: Some(CompanyTheme::Red),
            ..CompanyPatch::default()
        });
        assert_eq!(company.theme, CompanyTheme::Red);
        assert_eq!(company.name, "Empresa Principal");
    }
}
