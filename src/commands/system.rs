//! System dashboard and maintenance commands

use crate::app::App;
use crate::error::Result;
use crate::models::{catalog, VisitorLog};
use crate::services::network_service::Location;
use crate::services::usage_service::{self, RateStatus};

/// Everything the status dashboard renders
pub struct Dashboard {
    pub online: bool,
    pub ping_ms: Option<u64>,
    pub location: Location,
    pub active_users: u32,
    pub update_available: bool,
    pub models: Vec<ModelUsage>,
    pub visitor_logs: Vec<VisitorLog>,
}

pub struct ModelUsage {
    pub id: &'static str,
    pub name: &'static str,
    pub status: RateStatus,
}

pub fn dashboard(app: &App) -> Dashboard {
    let now_ms = usage_service::now_ms();

    Dashboard {
        online: app.connection.online,
        ping_ms: app.connection.ping_ms,
        location: app.location.clone(),
        active_users: 1,
        update_available: app.update_available,
        models: catalog::MODELS
            .iter()
            .map(|model| ModelUsage {
                id: model.id,
                name: model.name,
                status: usage_service::rate_status(&app.usage, model, now_ms),
            })
            .collect(),
        visitor_logs: app.visitor_logs.clone(),
    }
}

/// Erase every durable key; the caller must restart from a clean state
/// afterwards.
pub fn clear_cache(app: &App) -> Result<()> {
    app.clear_all()
}

pub fn welcome_needed(app: &App) -> bool {
    !app.welcome_seen()
}

pub fn acknowledge_welcome(app: &App) {
    app.mark_welcome_seen();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store_service::StateStore;
    use tempfile::TempDir;

    #[test]
    fn test_dashboard_covers_whole_catalog() {
        let dir = TempDir::new().unwrap();
        let app = App::with_store(StateStore::with_root(dir.path()));

        let dashboard = dashboard(&app);

        assert_eq!(dashboard.models.len(), catalog::MODELS.len());
        assert_eq!(dashboard.active_users, 1);
        assert!(dashboard.models.iter().all(|m| m.status.minute_used == 0));
    }
}
