//! Role router and capability gate
//!
//! One static table decides what each role may see and do. Every mutating
//! session operation passes through [`authorize`] before any state is read.

use crate::error::AccessError;
use crate::types::Role;
use serde::{Deserialize, Serialize};

/// Operation a role may be granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Read cause breakdowns of analyses
    ViewAnalysisDetails,
    /// Request a new AI analysis
    RunAnalysis,
    /// Open the intervention board
    ViewInterventions,
    /// Submit a project proposal
    ProposeProject,
    /// Approve a pending project
    ApproveProject,
    /// Assign a lead and start a phase
    StartPhase,
    /// Mark a phase complete
    CompletePhase,
    /// Request or confirm project closure
    CloseProject,
    /// Download full reports
    DownloadReports,
    /// Send community feedback
    SubmitFeedback,
    /// Log an IT incident
    ReportIncident,
    /// Move incidents through their workflow
    ManageIncidents,
}

impl Capability {
    /// Every capability
    pub const ALL: [Capability; 12] = [
        Capability::ViewAnalysisDetails,
        Capability::RunAnalysis,
        Capability::ViewInterventions,
        Capability::ProposeProject,
        Capability::ApproveProject,
        Capability::StartPhase,
        Capability::CompletePhase,
        Capability::CloseProject,
        Capability::DownloadReports,
        Capability::SubmitFeedback,
        Capability::ReportIncident,
        Capability::ManageIncidents,
    ];
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Capability::ViewAnalysisDetails => "view analysis details",
            Capability::RunAnalysis => "run analyses",
            Capability::ViewInterventions => "view interventions",
            Capability::ProposeProject => "propose projects",
            Capability::ApproveProject => "approve projects",
            Capability::StartPhase => "start phases",
            Capability::CompletePhase => "complete phases",
            Capability::CloseProject => "close projects",
            Capability::DownloadReports => "download reports",
            Capability::SubmitFeedback => "submit feedback",
            Capability::ReportIncident => "report incidents",
            Capability::ManageIncidents => "manage incidents",
        })
    }
}

/// Permission table
#[must_use]
pub fn allows(role: Role, capability: Capability) -> bool {
    use Capability::*;
    match role {
        Role::Guest => false,
        Role::Citizen => matches!(
            capability,
            ViewAnalysisDetails | DownloadReports | SubmitFeedback
        ),
        // Scientists use the incident channel instead of community feedback
        Role::Scientist => capability != SubmitFeedback,
    }
}

/// Capability gate
///
/// # Errors
/// - `AccessError::SignInRequired` when a guest asks for something a
///   signed-in role could do
/// - `AccessError::Denied` otherwise
pub fn authorize(role: Role, capability: Capability) -> Result<(), AccessError> {
    if allows(role, capability) {
        return Ok(());
    }
    let signed_in_could = [Role::Citizen, Role::Scientist]
        .into_iter()
        .any(|r| allows(r, capability));
    if role == Role::Guest && signed_in_could {
        Err(AccessError::SignInRequired { capability })
    } else {
        Err(AccessError::Denied { role, capability })
    }
}

/// Top-level views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AppView {
    /// Landing page
    #[default]
    Home,
    /// Live monitor
    Dashboard,
    /// Causal analysis
    Analysis,
    /// Intervention board
    Solutions,
    /// Reports & data
    Reports,
    /// Community feedback
    Feedback,
    /// IT incident channel
    ItSupport,
}

impl AppView {
    /// Menu order
    pub const MENU: [AppView; 7] = [
        AppView::Home,
        AppView::Dashboard,
        AppView::Analysis,
        AppView::Solutions,
        AppView::Reports,
        AppView::Feedback,
        AppView::ItSupport,
    ];

    /// Menu label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AppView::Home => "Home",
            AppView::Dashboard => "Live Monitor",
            AppView::Analysis => "Causal Analysis",
            AppView::Solutions => "Interventions",
            AppView::Reports => "Reports & Data",
            AppView::Feedback => "Feedback",
            AppView::ItSupport => "Report Issue",
        }
    }

    /// Whether the role sees and may open this view
    #[must_use]
    pub fn is_visible_to(self, role: Role) -> bool {
        match self {
            AppView::Solutions | AppView::ItSupport => role == Role::Scientist,
            AppView::Feedback => role != Role::Scientist,
            _ => true,
        }
    }

    /// Whether the view is independent of the selected city/zone
    #[must_use]
    pub fn hides_location_context(self) -> bool {
        matches!(
            self,
            AppView::Home | AppView::Reports | AppView::Feedback | AppView::ItSupport
        )
    }
}

impl std::fmt::Display for AppView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Opening a view
///
/// # Errors
/// `AccessError::ViewHidden` when the view is not in the role's menu
pub fn authorize_view(role: Role, view: AppView) -> Result<(), AccessError> {
    if view.is_visible_to(role) {
        Ok(())
    } else {
        Err(AccessError::ViewHidden { role, view })
    }
}

/// Views listed in the menu for a role
#[must_use]
pub fn visible_views(role: Role) -> Vec<AppView> {
    AppView::MENU
        .into_iter()
        .filter(|v| v.is_visible_to(role))
        .collect()
}

/// View shown right after a login from `current`
#[must_use]
pub fn view_after_login(role: Role, current: AppView) -> AppView {
    if current.is_visible_to(role) {
        current
    } else {
        AppView::Dashboard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_scientists_drive_lifecycle() {
        for cap in [
            Capability::ProposeProject,
            Capability::ApproveProject,
            Capability::StartPhase,
            Capability::CompletePhase,
            Capability::CloseProject,
        ] {
            assert!(allows(Role::Scientist, cap));
            assert!(!allows(Role::Citizen, cap));
            assert!(!allows(Role::Guest, cap));
        }
    }

    #[test]
    fn guests_are_asked_to_sign_in() {
        assert_eq!(
            authorize(Role::Guest, Capability::SubmitFeedback),
            Err(AccessError::SignInRequired {
                capability: Capability::SubmitFeedback
            })
        );
        assert_eq!(
            authorize(Role::Scientist, Capability::SubmitFeedback),
            Err(AccessError::Denied {
                role: Role::Scientist,
                capability: Capability::SubmitFeedback
            })
        );
        assert!(authorize(Role::Citizen, Capability::DownloadReports).is_ok());
    }

    #[test]
    fn menu_per_role() {
        assert_eq!(
            visible_views(Role::Scientist),
            vec![
                AppView::Home,
                AppView::Dashboard,
                AppView::Analysis,
                AppView::Solutions,
                AppView::Reports,
                AppView::ItSupport
            ]
        );
        assert!(visible_views(Role::Guest).contains(&AppView::Feedback));
        assert!(!visible_views(Role::Citizen).contains(&AppView::Solutions));
    }

    #[test]
    fn hidden_views_rejected() {
        assert!(authorize_view(Role::Guest, AppView::Feedback).is_ok());
        assert_eq!(
            authorize_view(Role::Scientist, AppView::Feedback)
                .unwrap_err()
                .to_string(),
            "Feedback is not available to SCIENTIST"
        );
    }

    #[test]
    fn login_redirects() {
        assert_eq!(
            view_after_login(Role::Scientist, AppView::Feedback),
            AppView::Dashboard
        );
        assert_eq!(
            view_after_login(Role::Guest, AppView::Solutions),
            AppView::Dashboard
        );
        assert_eq!(
            view_after_login(Role::Citizen, AppView::Reports),
            AppView::Reports
        );
    }
}
