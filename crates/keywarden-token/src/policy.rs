// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static classification of token actions into protection groups.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Every action an authorization token can be issued for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    AccountView,
    AccountViewPass,
    AccountEditPass,
    AccountCreate,
    AccountDelete,
    AccountSearch,
    CategoryView,
    CategorySearch,
    CategoryCreate,
    CategoryEdit,
    CategoryDelete,
    ClientView,
    ClientSearch,
    ClientCreate,
    ClientEdit,
    ClientDelete,
    TagView,
    TagSearch,
    TagCreate,
    TagEdit,
    TagDelete,
    ConfigBackupRun,
    ConfigExportRun,
}

/// How a token issued for an action is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PolicyGroup {
    /// Payload is always vault-protected.
    Secured,
    /// Payload is vault-protected so the token may run in secure mode.
    OptionallySecured,
    /// No vault and no login-key hash.
    Unsecured,
}

impl ActionKind {
    /// The protection group of this action.
    pub const fn policy(self) -> PolicyGroup {
        use ActionKind::*;
        match self {
            AccountViewPass | AccountEditPass | AccountCreate => PolicyGroup::Secured,
            AccountView | AccountSearch | CategoryView | ClientView | TagView => {
                PolicyGroup::OptionallySecured
            }
            AccountDelete | CategorySearch | CategoryCreate | CategoryEdit | CategoryDelete
            | ClientSearch | ClientCreate | ClientEdit | ClientDelete | TagSearch | TagCreate
            | TagEdit | TagDelete | ConfigBackupRun | ConfigExportRun => PolicyGroup::Unsecured,
        }
    }

    /// Whether tokens for this action carry a vault in either secured group.
    pub const fn needs_vault(self) -> bool {
        !matches!(self.policy(), PolicyGroup::Unsecured)
    }
}

/// True when the action always requires a protected payload.
pub const fn is_secured_action(action: ActionKind) -> bool {
    matches!(action.policy(), PolicyGroup::Secured)
}

/// True when the action supports an upgraded secure token mode.
pub const fn can_use_secure_token_action(action: ActionKind) -> bool {
    matches!(action.policy(), PolicyGroup::OptionallySecured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn password_actions_are_secured() {
        assert!(is_secured_action(ActionKind::AccountViewPass));
        assert!(is_secured_action(ActionKind::AccountEditPass));
        assert!(is_secured_action(ActionKind::AccountCreate));
        assert!(!is_secured_action(ActionKind::AccountView));
    }

    #[test]
    fn view_actions_can_use_secure_mode() {
        for action in [
            ActionKind::AccountView,
            ActionKind::AccountSearch,
            ActionKind::CategoryView,
            ActionKind::ClientView,
            ActionKind::TagView,
        ] {
            assert!(can_use_secure_token_action(action), "{action}");
            assert!(!is_secured_action(action), "{action}");
        }
    }

    #[test]
    fn groups_are_disjoint() {
        for action in ActionKind::iter() {
            let secured = is_secured_action(action);
            let optional = can_use_secure_token_action(action);
            assert!(!(secured && optional), "{action} is in two groups");
            assert_eq!(action.needs_vault(), secured || optional);
        }
    }

    #[test]
    fn maintenance_actions_are_unsecured() {
        assert_eq!(ActionKind::ConfigBackupRun.policy(), PolicyGroup::Unsecured);
        assert_eq!(ActionKind::TagDelete.policy(), PolicyGroup::Unsecured);
        assert!(!ActionKind::AccountDelete.needs_vault());
    }

    #[test]
    fn action_names_are_snake_case() {
        assert_eq!(ActionKind::AccountViewPass.to_string(), "account_view_pass");
        assert_eq!(
            "config_export_run".parse::<ActionKind>().unwrap(),
            ActionKind::ConfigExportRun
        );
    }
}
