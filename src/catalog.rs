//! Ordered collection of command templates.

use crate::models::command_template::{compare_names, get_built_in_templates, CommandTemplate};
use crate::models::error::{Result, TkConfigError};
use crate::settings::SettingsStore;

const KEY_COMMANDS: &str = "commands";

fn key_name(i: usize) -> String {
    format!("command_{}_name", i)
}

fn key_cmd(i: usize) -> String {
    format!("command_{}_cmd", i)
}

fn key_desc(i: usize) -> String {
    format!("command_{}_desc", i)
}

/// Command templates kept sorted by name.
///
/// Insertion places each template after any template with an equal name, so
/// the order stays stable across save and load.
#[derive(Debug, Clone, Default)]
pub struct CommandCatalog {
    commands: Vec<CommandTemplate>,
    must_reload: bool,
}

impl CommandCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the catalog from `store`, falling back to the built-in commands
    /// when nothing is stored.
    pub fn load(&mut self, store: &dyn SettingsStore) -> Result<()> {
        let count = store.get_int(KEY_COMMANDS, 0)?.max(0) as usize;
        self.commands.clear();

        for i in 0..count {
            let template = CommandTemplate::new(
                store.get_string(&key_name(i), "")?,
                store.get_string(&key_cmd(i), "")?,
                store.get_string(&key_desc(i), "")?,
            );
            self.add(template);
        }

        if self.commands.is_empty() {
            tracing::info!("No stored commands, using the built-in set");
            self.populate_defaults();
        }
        self.must_reload = false;

        tracing::debug!("Loaded {} commands", self.commands.len());
        Ok(())
    }

    /// Replace the catalog content with the built-in commands.
    pub fn populate_defaults(&mut self) {
        self.commands.clear();
        for template in get_built_in_templates() {
            self.add(template);
        }
    }

    /// Write the whole catalog to `store`, replacing what was there.
    pub fn save(&self, store: &mut dyn SettingsStore) -> Result<()> {
        let previous = store.get_int(KEY_COMMANDS, 0)?.max(0) as usize;

        store.put_int(KEY_COMMANDS, self.commands.len() as i32)?;
        for (i, command) in self.commands.iter().enumerate() {
            store.put_string(&key_name(i), command.name())?;
            store.put_string(&key_cmd(i), command.command())?;
            store.put_string(&key_desc(i), command.description())?;
        }
        for i in self.commands.len()..previous {
            remove_entry(store, i)?;
        }

        tracing::debug!("Saved {} commands", self.commands.len());
        Ok(())
    }

    /// Remove every stored catalog key.
    pub fn store_cleanup(store: &mut dyn SettingsStore) -> Result<()> {
        let count = store.get_int(KEY_COMMANDS, 0)?.max(0) as usize;
        for i in 0..count {
            remove_entry(store, i)?;
        }
        store.remove(KEY_COMMANDS)
    }

    /// Insert keeping the name order; returns the new position.
    pub fn add(&mut self, template: CommandTemplate) -> usize {
        let index = self
            .commands
            .partition_point(|c| compare_names(c.name(), template.name()).is_le());
        self.commands.insert(index, template);
        index
    }

    /// Like [`add`](Self::add), but refuses a command text already present.
    pub fn add_unique(&mut self, template: CommandTemplate) -> Result<usize> {
        if self.contains_command(template.command()) {
            return Err(TkConfigError::DuplicateCommand(template.command().to_string()));
        }
        Ok(self.add(template))
    }

    pub fn contains_command(&self, command: &str) -> bool {
        self.find_by_command(command).is_some()
    }

    pub fn find_by_command(&self, command: &str) -> Option<usize> {
        self.commands.iter().position(|c| c.command() == command)
    }

    pub fn remove(&mut self, index: usize) -> Result<CommandTemplate> {
        if index >= self.commands.len() {
            return Err(TkConfigError::CommandNotFound(index));
        }
        Ok(self.commands.remove(index))
    }

    /// Insert an unbound copy of the command at `index`; returns its position.
    pub fn duplicate(&mut self, index: usize) -> Result<usize> {
        let copy = self
            .commands
            .get(index)
            .ok_or(TkConfigError::CommandNotFound(index))?
            .duplicate();
        Ok(self.add(copy))
    }

    /// Edit a command in place and move it to its new sorted position.
    ///
    /// Bound values survive the edit for placeholders still present.
    pub fn update(
        &mut self,
        index: usize,
        name: &str,
        command: &str,
        description: &str,
    ) -> Result<usize> {
        let mut template = self.remove(index)?;
        template.set_name(name);
        template.set_command(command);
        template.set_description(description);
        Ok(self.add(template))
    }

    pub fn get(&self, index: usize) -> Option<&CommandTemplate> {
        self.commands.get(index)
    }

    /// Mutable access for binding edits only. Changing the name of the
    /// returned template would break the order [`add`](Self::add) searches
    /// in; renames go through [`update`](Self::update).
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut CommandTemplate> {
        self.commands.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CommandTemplate> {
        self.commands.iter()
    }

    pub fn must_reload(&self) -> bool {
        self.must_reload
    }

    pub fn set_must_reload(&mut self, flag: bool) {
        self.must_reload = flag;
    }
}

fn remove_entry(store: &mut dyn SettingsStore, i: usize) -> Result<()> {
    store.remove(&key_name(i))?;
    store.remove(&key_cmd(i))?;
    store.remove(&key_desc(i))
}

impl<'a> IntoIterator for &'a CommandCatalog {
    type Item = &'a CommandTemplate;
    type IntoIter = std::slice::Iter<'a, CommandTemplate>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
