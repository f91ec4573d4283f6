// SPDX-License-Identifier: GPL-3.0-only

//! Permission gating
//!
//! Capture needs the camera, the microphone and the photo library (for
//! export). The gate asks the platform for anything not yet decided and
//! tells the UI which permissions were refused, with the alert text that
//! points the user at the system settings.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// Resources the app needs access to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
    Microphone,
    PhotoLibrary,
}

impl Permission {
    pub const ALL: [Permission; 3] = [
        Permission::PhotoLibrary,
        Permission::Camera,
        Permission::Microphone,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Permission::Camera => "Camera",
            Permission::Microphone => "Microphone",
            Permission::PhotoLibrary => "Photo Library",
        }
    }

    /// Alert shown when access was refused earlier and can only be granted
    /// from the system settings
    pub fn denied_alert(self) -> DeniedAlert {
        DeniedAlert {
            title: format!("{} Access Denied", self.display_name()),
            message: format!(
                "{} access was previously denied. You must grant it through system settings",
                self.display_name()
            ),
        }
    }
}

/// Platform authorization state for one permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet
    #[default]
    NotDetermined,
    Denied,
    Authorized,
}

/// Alert text for a refused permission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeniedAlert {
    pub title: String,
    pub message: String,
}

/// Result of asking for a single permission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    /// The user declined the prompt just now
    Declined,
    /// Access was refused earlier; only the system settings can change it
    OpenSettings(DeniedAlert),
}

/// Platform permission API
pub trait PermissionProvider: Send + Sync {
    fn status(&self, permission: Permission) -> AuthorizationStatus;

    /// Prompt the user; resolves to whether access was granted
    fn request(&self, permission: Permission) -> impl Future<Output = bool> + Send;
}

/// Status of every permission at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionReport {
    statuses: Vec<(Permission, AuthorizationStatus)>,
}

impl PermissionReport {
    pub fn status(&self, permission: Permission) -> AuthorizationStatus {
        self.statuses
            .iter()
            .find(|(p, _)| *p == permission)
            .map(|(_, status)| *status)
            .unwrap_or_default()
    }

    pub fn granted_count(&self) -> usize {
        self.statuses
            .iter()
            .filter(|(_, status)| *status == AuthorizationStatus::Authorized)
            .count()
    }

    /// Capture may proceed only when every permission is authorized
    pub fn all_granted(&self) -> bool {
        self.granted_count() == self.statuses.len()
    }

    pub fn denied(&self) -> Vec<Permission> {
        self.statuses
            .iter()
            .filter(|(_, status)| *status == AuthorizationStatus::Denied)
            .map(|(p, _)| *p)
            .collect()
    }
}

/// Checks and requests the permissions capture depends on
#[derive(Debug)]
pub struct PermissionGate<P> {
    provider: P,
}

impl<P: PermissionProvider> PermissionGate<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Current status of every permission, without prompting
    pub fn check(&self) -> PermissionReport {
        let statuses = Permission::ALL
            .iter()
            .map(|&p| (p, self.provider.status(p)))
            .collect();
        PermissionReport { statuses }
    }

    /// Ask for one permission
    pub async fn request(&self, permission: Permission) -> PermissionOutcome {
        match self.provider.status(permission) {
            AuthorizationStatus::Authorized => PermissionOutcome::Granted,
            AuthorizationStatus::Denied => {
                debug!(?permission, "Permission previously denied");
                PermissionOutcome::OpenSettings(permission.denied_alert())
            }
            AuthorizationStatus::NotDetermined => {
                if self.provider.request(permission).await {
                    info!(?permission, "Permission granted");
                    PermissionOutcome::Granted
                } else {
                    info!(?permission, "Permission declined");
                    PermissionOutcome::Declined
                }
            }
        }
    }

    /// Prompt for every undecided permission and report the result
    pub async fn request_missing(&self) -> PermissionReport {
        for permission in Permission::ALL {
            if self.provider.status(permission) == AuthorizationStatus::NotDetermined {
                self.request(permission).await;
            }
        }
        self.check()
    }
}

/// Provider backed by a fixed table, answering prompts with a preset reply
///
/// Used where there is no platform permission system (desktop, tests).
#[derive(Debug)]
pub struct StaticPermissions {
    statuses: Mutex<HashMap<Permission, AuthorizationStatus>>,
    grant_on_request: bool,
}

impl StaticPermissions {
    /// Everything undecided; prompts are answered with `grant_on_request`
    pub fn new(grant_on_request: bool) -> Self {
        Self {
            statuses: Mutex::new(HashMap::new()),
            grant_on_request,
        }
    }

    /// Everything already authorized
    pub fn all_granted() -> Self {
        let provider = Self::new(true);
        for permission in Permission::ALL {
            provider.set(permission, AuthorizationStatus::Authorized);
        }
        provider
    }

    pub fn set(&self, permission: Permission, status: AuthorizationStatus) {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(permission, status);
    }
}

impl PermissionProvider for StaticPermissions {
    fn status(&self, permission: Permission) -> AuthorizationStatus {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&permission)
            .copied()
            .unwrap_or_default()
    }

    fn request(&self, permission: Permission) -> impl Future<Output = bool> + Send {
        let granted = self.grant_on_request;
        let status = if granted {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::Denied
        };
        self.set(permission, status);
        std::future::ready(granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_alert_text() {
        let alert = Permission::Camera.denied_alert();
        assert_eq!(alert.title, "Camera Access Denied");
        assert!(alert.message.starts_with("Camera access was previously denied"));
    }

    #[test]
    fn test_check_does_not_prompt() {
        let gate = PermissionGate::new(StaticPermissions::new(true));
        let report = gate.check();
        assert_eq!(report.granted_count(), 0);
        assert!(!report.all_granted());
        assert_eq!(report.status(Permission::Camera), AuthorizationStatus::NotDetermined);
    }

    #[tokio::test]
    async fn test_request_missing_grants_all() {
        let gate = PermissionGate::new(StaticPermissions::new(true));
        let report = gate.request_missing().await;
        assert!(report.all_granted());
        assert!(report.denied().is_empty());
    }

    #[tokio::test]
    async fn test_previously_denied_needs_settings() {
        let provider = StaticPermissions::all_granted();
        provider.set(Permission::Microphone, AuthorizationStatus::Denied);
        let gate = PermissionGate::new(provider);

        assert_eq!(gate.request(Permission::Camera).await, PermissionOutcome::Granted);
        assert_eq!(
            gate.request(Permission::Microphone).await,
            PermissionOutcome::OpenSettings(Permission::Microphone.denied_alert())
        );

        let report = gate.request_missing().await;
        assert!(!report.all_granted());
        assert_eq!(report.denied(), vec![Permission::Microphone]);
    }

    #[tokio::test]
    async fn test_declined_prompt() {
        let gate = PermissionGate::new(StaticPermissions::new(false));
        assert_eq!(
            gate.request(Permission::PhotoLibrary).await,
            PermissionOutcome::Declined
        );
        assert_eq!(
            gate.check().status(Permission::PhotoLibrary),
            AuthorizationStatus::Denied
        );
    }
}
