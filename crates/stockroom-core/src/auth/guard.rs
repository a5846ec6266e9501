use crate::models::{AccessType, Section};

use super::SessionHandle;

/// What the front end should do with a request to open a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still initializing; show a placeholder
    Loading,
    RedirectToLogin,
    /// Signed in, but the access level does not cover the section
    Forbidden,
    Allow,
}

/// Gates console sections on the session state.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    session: SessionHandle,
}

impl RouteGuard {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }

    pub fn check(&self, section: Section) -> GuardDecision {
        let state = self.session.snapshot();
        if state.loading {
            return GuardDecision::Loading;
        }
        let Some(user) = state.user else {
            return GuardDecision::RedirectToLogin;
        };
        match user.access() {
            Some(access) if section.allows(access) => GuardDecision::Allow,
            _ => GuardDecision::Forbidden,
        }
    }

    /// Sections the current user may open, in menu order
    pub fn visible_sections(&self) -> Vec<Section> {
        let access: Option<AccessType> = self.session.user().and_then(|u| u.access());
        match access {
            Some(access) => Section::ALL
                .into_iter()
                .filter(|section| section.allows(access))
                .collect(),
            None => Vec::new(),
        }
    }
}
