use std::path::{Path, PathBuf};

use crate::backup;
use crate::catalog::CommandCatalog;
use crate::config::AppConfig;
use crate::database::SqliteSettings;
use crate::models::command_template::CommandTemplate;
use crate::models::error::{Result, TkConfigError};
use crate::models::history::HistoryEntry;
use crate::models::placeholder::PASSWORD;
use crate::models::recipient::GpsContact;
use crate::settings::SettingsStore;
use crate::sms::{SendReport, SmsSender};

const KEY_CONTACTS: &str = "contacts";
const KEY_HISTORIES: &str = "histories";
const KEY_PREFIX_HISTORY: &str = "history_";
const KEY_BACKUP_PATH: &str = "backupPath";
// Single-tracker layout used before the contact list existed
const KEY_LEGACY_PHONE: &str = "gpsPhoneNumber";
const KEY_LEGACY_PASSWORD: &str = "password";
const LEGACY_DEFAULT_PASSWORD: &str = "123456";

/// Everything one configuration session works with: the preferences store
/// and the command catalog, GPS contacts and send history loaded from it.
pub struct AppState<S: SettingsStore> {
    store: S,
    catalog: CommandCatalog,
    contacts: Vec<GpsContact>,
    histories: Vec<HistoryEntry>,
}

impl AppState<SqliteSettings> {
    /// Open the preferences database named by `config` and load the session
    pub fn open(config: &AppConfig) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| TkConfigError::io(parent.display().to_string(), e))?;
        }

        tracing::info!("Database path: {:?}", config.database_path);
        let store = SqliteSettings::open(&config.database_path)?;
        Self::new(store)
    }
}

impl<S: SettingsStore> AppState<S> {
    /// Create a session over `store`, loading commands, contacts and history
    pub fn new(store: S) -> Result<Self> {
        let mut state = Self {
            store,
            catalog: CommandCatalog::new(),
            contacts: Vec::new(),
            histories: Vec::new(),
        };
        state.reload()?;
        Ok(state)
    }

    /// Re-read everything from the store
    pub fn reload(&mut self) -> Result<()> {
        self.catalog.load(&self.store)?;
        self.contacts = load_contacts(&self.store)?;
        self.histories = load_histories(&self.store)?;

        tracing::info!(
            "Loaded {} commands, {} contacts and {} history entries",
            self.catalog.len(),
            self.contacts.len(),
            self.histories.len()
        );
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

// ============================================================================
// Commands
// ============================================================================

impl<S: SettingsStore> AppState<S> {
    pub fn commands(&self) -> &CommandCatalog {
        &self.catalog
    }

    pub fn command(&self, index: usize) -> Result<&CommandTemplate> {
        self.catalog
            .get(index)
            .ok_or(TkConfigError::CommandNotFound(index))
    }

    /// Bind `value` to the placeholder `name` of the command at `index`.
    ///
    /// Renaming or retyping a command goes through
    /// [`update_command`](Self::update_command) so the catalog stays sorted.
    pub fn set_command_parameter(&mut self, index: usize, name: &str, value: &str) -> Result<()> {
        self.catalog
            .get_mut(index)
            .ok_or(TkConfigError::CommandNotFound(index))?
            .set_parameter_value(name, value);
        Ok(())
    }

    /// Add a newly written command; a command text already present is refused
    pub fn add_command(&mut self, template: CommandTemplate) -> Result<usize> {
        let index = self.catalog.add_unique(template)?;
        self.save_commands()?;
        Ok(index)
    }

    pub fn update_command(
        &mut self,
        index: usize,
        name: &str,
        command: &str,
        description: &str,
    ) -> Result<usize> {
        let index = self.catalog.update(index, name, command, description)?;
        self.save_commands()?;
        Ok(index)
    }

    pub fn remove_command(&mut self, index: usize) -> Result<CommandTemplate> {
        let removed = self.catalog.remove(index)?;
        self.save_commands()?;
        tracing::info!("Removed command {}", removed.name());
        Ok(removed)
    }

    pub fn duplicate_command(&mut self, index: usize) -> Result<usize> {
        let index = self.catalog.duplicate(index)?;
        self.save_commands()?;
        Ok(index)
    }

    /// Drop the stored catalog and start again from the built-in commands
    pub fn reset_commands(&mut self) -> Result<()> {
        CommandCatalog::store_cleanup(&mut self.store)?;
        self.catalog.populate_defaults();
        self.save_commands()
    }

    pub fn save_commands(&mut self) -> Result<()> {
        self.catalog.save(&mut self.store)
    }

    /// Bind the stored default values to the command at `index`
    pub fn prepare_command_parameters(&mut self, index: usize) -> Result<()> {
        let template = self
            .catalog
            .get_mut(index)
            .ok_or(TkConfigError::CommandNotFound(index))?;
        prepare_command_parameters(template, &self.store)
    }

    /// Store the values bound to the command at `index` as the new defaults
    pub fn save_command_parameters(&mut self, index: usize) -> Result<()> {
        let template = self
            .catalog
            .get_mut(index)
            .ok_or(TkConfigError::CommandNotFound(index))?;
        save_command_parameters(template, &mut self.store)
    }
}

/// Bind every non-password placeholder of `template` to its stored default.
///
/// A placeholder without a stored default is bound to its own name. The
/// modified flag is cleared afterwards since nothing was edited yet.
pub fn prepare_command_parameters(
    template: &mut CommandTemplate,
    store: &dyn SettingsStore,
) -> Result<()> {
    if !template.has_parameters() {
        return Ok(());
    }
    let names: Vec<String> = template
        .parameters()
        .iter()
        .filter(|name| name.as_str() != PASSWORD)
        .cloned()
        .collect();
    for name in names {
        let value = store.get_string(&name, &name)?;
        template.set_parameter_value(name, value);
    }
    template.set_parameters_modified(false);
    Ok(())
}

/// Persist the bound non-password values of `template` as defaults and clear
/// its modified flag.
pub fn save_command_parameters(
    template: &mut CommandTemplate,
    store: &mut dyn SettingsStore,
) -> Result<()> {
    if template.has_parameters() {
        for name in template.parameters() {
            if name == PASSWORD {
                continue;
            }
            if let Some(value) = template.parameter_value(name) {
                store.put_string(name, value)?;
            }
        }
    }
    template.set_parameters_modified(false);
    Ok(())
}

// ============================================================================
// GPS contacts
// ============================================================================

impl<S: SettingsStore> AppState<S> {
    pub fn contacts(&self) -> &[GpsContact] {
        &self.contacts
    }

    pub fn add_contact(&mut self, contact: GpsContact) -> Result<()> {
        if self.contacts.contains(&contact) {
            return Err(TkConfigError::InvalidOperation {
                message: format!("Contact {} already exists", contact.phone),
            });
        }
        self.contacts.push(contact);
        self.save_contacts()
    }

    pub fn update_contact(&mut self, index: usize, contact: GpsContact) -> Result<()> {
        let slot = self
            .contacts
            .get_mut(index)
            .ok_or(TkConfigError::ContactNotFound(index))?;
        *slot = contact;
        self.save_contacts()
    }

    pub fn remove_contact(&mut self, index: usize) -> Result<GpsContact> {
        if index >= self.contacts.len() {
            return Err(TkConfigError::ContactNotFound(index));
        }
        let removed = self.contacts.remove(index);
        self.save_contacts()?;
        Ok(removed)
    }

    pub fn set_contact_selected(&mut self, index: usize, selected: bool) -> Result<()> {
        self.contacts
            .get_mut(index)
            .ok_or(TkConfigError::ContactNotFound(index))?
            .selected = selected;
        self.save_contacts()
    }

    pub fn have_contacts_selected(&self) -> bool {
        self.contacts.iter().any(|c| c.selected)
    }

    /// Write the contact list, dropping the single-tracker keys it replaces
    pub fn save_contacts(&mut self) -> Result<()> {
        let store = &mut self.store;
        let previous = store.get_int(KEY_CONTACTS, 0)?.max(0) as usize;

        store.put_int(KEY_CONTACTS, self.contacts.len() as i32)?;
        for (i, contact) in self.contacts.iter().enumerate() {
            store.put_string(&format!("contact_{}_name", i), &contact.name)?;
            store.put_string(&format!("contact_{}_phone", i), &contact.phone)?;
            store.put_string(&format!("contact_{}_password", i), &contact.password)?;
            store.put_bool(&format!("contact_{}_selected", i), contact.selected)?;
        }
        for i in self.contacts.len()..previous {
            for field in ["name", "phone", "password", "selected"] {
                store.remove(&format!("contact_{}_{}", i, field))?;
            }
        }

        store.remove(KEY_LEGACY_PHONE)?;
        store.remove(KEY_LEGACY_PASSWORD)?;
        Ok(())
    }
}

fn load_contacts(store: &dyn SettingsStore) -> Result<Vec<GpsContact>> {
    let count = store.get_int(KEY_CONTACTS, 0)?.max(0) as usize;
    let mut contacts = Vec::with_capacity(count);
    for i in 0..count {
        contacts.push(GpsContact::new(
            store.get_string(&format!("contact_{}_name", i), "")?,
            store.get_string(&format!("contact_{}_phone", i), "")?,
            store.get_string(&format!("contact_{}_password", i), "")?,
            store.get_bool(&format!("contact_{}_selected", i), false)?,
        ));
    }

    if contacts.is_empty() {
        let phone = store.get_string(KEY_LEGACY_PHONE, "")?;
        if !phone.is_empty() {
            let password = store.get_string(KEY_LEGACY_PASSWORD, LEGACY_DEFAULT_PASSWORD)?;
            tracing::info!("Migrating single tracker {} into the contact list", phone);
            contacts.push(GpsContact::new(phone.clone(), phone, password, true));
        }
    }
    Ok(contacts)
}

// ============================================================================
// History
// ============================================================================

impl<S: SettingsStore> AppState<S> {
    pub fn histories(&self) -> &[HistoryEntry] {
        &self.histories
    }

    pub fn remove_history(&mut self, index: usize) -> Result<HistoryEntry> {
        if index >= self.histories.len() {
            return Err(TkConfigError::NotFound {
                resource: "History entry".to_string(),
                id: index.to_string(),
            });
        }
        let removed = self.histories.remove(index);
        self.save_histories()?;
        Ok(removed)
    }

    pub fn clear_histories(&mut self) -> Result<()> {
        self.histories.clear();
        self.save_histories()
    }

    pub fn save_histories(&mut self) -> Result<()> {
        let store = &mut self.store;
        store.remove_prefixed(KEY_PREFIX_HISTORY)?;
        store.put_int(KEY_HISTORIES, self.histories.len() as i32)?;
        for (i, history) in self.histories.iter().enumerate() {
            store.put_long(&format!("{}{}_dateTime", KEY_PREFIX_HISTORY, i), history.date_time)?;
            store.put_string(&format!("{}{}_cmd", KEY_PREFIX_HISTORY, i), &history.sms_command)?;
            store.put_string(&format!("{}{}_number", KEY_PREFIX_HISTORY, i), &history.phone_number)?;
        }
        Ok(())
    }
}

fn load_histories(store: &dyn SettingsStore) -> Result<Vec<HistoryEntry>> {
    let count = store.get_int(KEY_HISTORIES, 0)?.max(0) as usize;
    let mut histories = Vec::with_capacity(count);
    for i in 0..count {
        histories.push(HistoryEntry::at(
            store.get_long(&format!("{}{}_dateTime", KEY_PREFIX_HISTORY, i), 0)?,
            store.get_string(&format!("{}{}_number", KEY_PREFIX_HISTORY, i), "")?,
            store.get_string(&format!("{}{}_cmd", KEY_PREFIX_HISTORY, i), "")?,
        ));
    }
    Ok(histories)
}

// ============================================================================
// Sending
// ============================================================================

impl<S: SettingsStore> AppState<S> {
    /// Send the command at `index` to every selected contact, each with its
    /// own password.
    ///
    /// A contact the sender fails for is logged and kept in the report; the
    /// remaining contacts are still tried. With no contact selected nothing is
    /// sent and the report count is 0.
    pub fn send_command(
        &mut self,
        index: usize,
        sender: &mut dyn SmsSender,
    ) -> Result<SendReport> {
        let template = self.command(index)?;
        let messages: Vec<(String, String)> = self
            .contacts
            .iter()
            .filter(|c| c.selected)
            .map(|c| (c.phone.clone(), template.sms_command_for(c.password())))
            .collect();

        if messages.is_empty() {
            tracing::warn!("No GPS contact selected, nothing sent");
        }

        let mut report = SendReport::default();
        for (phone, message) in messages {
            if let Err(e) = sender.send_text_message(&phone, &message) {
                tracing::error!("Failed to send SMS to {}: {}", phone, e);
                report.failed.push((phone, e));
                continue;
            }
            self.record_sent(&phone, &message, sender)?;
            report.sent += 1;
        }

        if report.has_failures() {
            tracing::warn!(
                "Command sent to {} of {} contacts",
                report.sent,
                report.attempted()
            );
        }
        Ok(report)
    }

    /// Send the message of a history entry again to the same number
    pub fn resend_history(&mut self, index: usize, sender: &mut dyn SmsSender) -> Result<()> {
        let entry = self.histories.get(index).cloned().ok_or_else(|| TkConfigError::NotFound {
            resource: "History entry".to_string(),
            id: index.to_string(),
        })?;
        self.send_sms(&entry.phone_number, &entry.sms_command, sender)
    }

    /// Transmit one message and record it in the history
    pub fn send_sms(
        &mut self,
        phone: &str,
        message: &str,
        sender: &mut dyn SmsSender,
    ) -> Result<()> {
        sender.send_text_message(phone, message).map_err(|e| {
            tracing::error!("Failed to send SMS to {}: {}", phone, e);
            e
        })?;
        self.record_sent(phone, message, sender)
    }

    fn record_sent(&mut self, phone: &str, message: &str, sender: &mut dyn SmsSender) -> Result<()> {
        self.histories.push(HistoryEntry::new(phone, message));
        self.save_histories()?;

        if let Err(e) = sender.save_to_sent_folder(phone, message) {
            tracing::error!("Save message to the send folder: {}", e);
        }
        Ok(())
    }
}

// ============================================================================
// Backup
// ============================================================================

impl<S: SettingsStore> AppState<S> {
    /// Stored backup file, or the configured default
    pub fn backup_path(&self, config: &AppConfig) -> Result<PathBuf> {
        let stored = self.store.get_string(KEY_BACKUP_PATH, "")?;
        if stored.is_empty() {
            Ok(config.backup_path.clone())
        } else {
            Ok(PathBuf::from(stored))
        }
    }

    pub fn set_backup_path(&mut self, path: &Path) -> Result<()> {
        self.store
            .put_string(KEY_BACKUP_PATH, &path.to_string_lossy())
    }

    pub fn backup(&self, path: &Path) -> Result<usize> {
        backup::backup_to_file(&self.store, path)
    }

    /// Restore preferences from `path` and reload the session from them.
    ///
    /// The catalog is flagged so views holding old command positions refresh.
    pub fn restore(&mut self, path: &Path) -> Result<usize> {
        let restored = backup::restore_from_file(&mut self.store, path)?;
        self.reload()?;
        self.catalog.set_must_reload(true);
        Ok(restored)
    }
}
