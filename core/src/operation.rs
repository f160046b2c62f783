//! The named Softaculous operations and the parameters each one sends.

use indexmap::IndexMap;

use crate::params::{ParamValue, Params, ACT};

/// Free-form install settings such as `softdomain`, `softdirectory`,
/// `admin_username` or `admin_email`.
///
/// Appended after `soft` in insertion order. Entries named `act` or `soft`
/// are ignored so they cannot change which script is installed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    entries: IndexMap<String, ParamValue>,
}

impl InstallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// One remote action, identified on the wire by its `act` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ListScripts,
    InstallScript {
        script_id: String,
        options: InstallOptions,
    },
    UpgradeScript {
        installation_id: String,
    },
    RemoveScript {
        installation_id: String,
    },
    ImportInstallation {
        script_id: String,
    },
    ListInstalledScripts {
        updates_only: bool,
    },
    ListBackups,
    BackupInstalledScript {
        installation_id: String,
    },
    RestoreInstalledScript {
        backup_filename: String,
    },
    DownloadBackups {
        backup_filename: String,
    },
    DeleteBackup {
        backup_filename: String,
    },
}

impl Operation {
    /// The `act` value, or `None` for the default list view.
    pub fn act(&self) -> Option<&'static str> {
        match self {
            Operation::ListScripts => None,
            Operation::InstallScript { .. } => Some("software"),
            Operation::UpgradeScript { .. } => Some("upgrade"),
            Operation::RemoveScript { .. } => Some("remove"),
            Operation::ImportInstallation { .. } => Some("import"),
            Operation::ListInstalledScripts { .. } => Some("installations"),
            Operation::ListBackups
            | Operation::DownloadBackups { .. }
            | Operation::DeleteBackup { .. } => Some("backups"),
            Operation::BackupInstalledScript { .. } => Some("backup"),
            Operation::RestoreInstalledScript { .. } => Some("restore"),
        }
    }

    pub fn params(&self) -> Params {
        let Some(act) = self.act() else {
            return Params::new();
        };
        let params = Params::act(act);
        match self {
            Operation::ListScripts | Operation::ListBackups => params,
            Operation::InstallScript { script_id, options } => {
                let mut params = params.with("soft", script_id.as_str());
                for (key, value) in options.iter().filter(|(k, _)| *k != ACT && *k != "soft") {
                    params.insert(key, value.clone());
                }
                params
            }
            Operation::ImportInstallation { script_id } => params.with("soft", script_id.as_str()),
            Operation::UpgradeScript { installation_id }
            | Operation::RemoveScript { installation_id }
            | Operation::BackupInstalledScript { installation_id } => {
                params.with("insid", installation_id.as_str())
            }
            Operation::ListInstalledScripts { updates_only } => {
                let flag = if *updates_only { "true" } else { "false" };
                params.with("showupdates", flag)
            }
            Operation::RestoreInstalledScript { backup_filename } => {
                params.with("restore", backup_filename.as_str())
            }
            Operation::DownloadBackups { backup_filename } => {
                params.with("download", backup_filename.as_str())
            }
            Operation::DeleteBackup { backup_filename } => {
                params.with("remove", backup_filename.as_str())
            }
        }
    }
}
