//! services/console/src/controllers/reports.rs
//!
//! Report downloads and the analytics panel.

use crate::controllers::authorize;
use crate::view::{AnalyticsPanel, Notice, ReportsView};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use student_portal_core::access::Capability;
use student_portal_core::domain::{ReportFormat, Session};
use student_portal_core::ports::{BackendService, PortError, PortResult};
use tracing::{info, warn};

pub struct ReportsController {
    backend: Arc<dyn BackendService>,
    download_dir: PathBuf,
    panel: Mutex<AnalyticsPanel>,
}

impl ReportsController {
    pub fn new(backend: Arc<dyn BackendService>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            download_dir: download_dir.into(),
            panel: Mutex::new(AnalyticsPanel::Hidden),
        }
    }

    /// Entering the page always starts with the analytics panel closed.
    pub fn open(&self) -> ReportsView {
        *self.panel.lock() = AnalyticsPanel::Hidden;
        self.view()
    }

    pub fn view(&self) -> ReportsView {
        ReportsView {
            analytics: self.panel.lock().clone(),
        }
    }

    /// Fetches analytics into the panel. Only an authorization failure is
    /// returned as an error; anything else is shown inside the panel.
    pub async fn show_analytics(&self, session: &Session) -> PortResult<ReportsView> {
        let panel = match self.backend.analytics(&session.token).await {
            Ok(analytics) => AnalyticsPanel::Shown(analytics),
            Err(PortError::Unauthorized) => return Err(PortError::Unauthorized),
            Err(PortError::Network(e)) => {
                warn!("Error loading analytics: {}", e);
                AnalyticsPanel::Failed("Error loading analytics".to_string())
            }
            Err(e) => {
                warn!("Failed to load analytics: {}", e);
                AnalyticsPanel::Failed("Failed to load analytics".to_string())
            }
        };
        *self.panel.lock() = panel;
        Ok(self.view())
    }

    /// Downloads the student report and saves it under the download directory.
    pub async fn generate(
        &self,
        session: &Session,
        format: ReportFormat,
    ) -> PortResult<(PathBuf, Notice)> {
        authorize(session, Capability::GenerateReports)?;
        let report = self.backend.generate_report(&session.token, format).await?;

        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let path = self.download_dir.join(&report.filename);
        tokio::fs::write(&path, &report.bytes)
            .await
            .map_err(|e| PortError::Unexpected(format!("Could not save {}: {}", path.display(), e)))?;

        info!(path = %path.display(), bytes = report.bytes.len(), "Report saved");
        Ok((path, Notice::success("Report downloaded successfully!")))
    }
}
