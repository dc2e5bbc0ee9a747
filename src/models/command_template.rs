use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use regex::Captures;

use crate::models::placeholder::{
    parameter_name, placeholder_token, placeholders, PASSWORD, PASSWORD_MASK, PLACEHOLDER_PATTERN,
};

/// An SMS command with `?name?` placeholders and the values bound to them.
///
/// Two templates are equal when their command text is equal; names and
/// bound values are not compared.
#[derive(Debug, Clone)]
pub struct CommandTemplate {
    name: String,
    command: String,
    description: String,
    parameters: Vec<String>,
    values: HashMap<String, String>,
    parameters_modified: bool,
    passwords: usize,
}

impl CommandTemplate {
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let mut template = Self {
            name: name.into(),
            command: command.into(),
            description: description.into(),
            parameters: Vec::new(),
            values: HashMap::new(),
            parameters_modified: false,
            passwords: 0,
        };
        template.prepare_parameters();
        template
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Replace the command text and re-read its placeholders.
    ///
    /// Bound values are kept, so a placeholder that survives the edit keeps
    /// its value.
    pub fn set_command(&mut self, command: impl Into<String>) {
        self.command = command.into();
        self.prepare_parameters();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Placeholder names in order of appearance, repeats included.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn parameters_size(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameter_name(&self, position: usize) -> Option<&str> {
        self.parameters.get(position).map(String::as_str)
    }

    pub fn parameter_position(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p == name)
    }

    /// True when the command has placeholders other than the password.
    pub fn has_parameters(&self) -> bool {
        self.parameters.len() - self.passwords > 0
    }

    /// Cheap check on the raw text, done before a full parse.
    pub fn needs_parameters(&self) -> bool {
        self.command.contains('?')
    }

    pub fn has_password(&self) -> bool {
        self.passwords > 0
    }

    pub fn set_parameter_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters_modified = true;
        self.values.insert(name.into(), value.into());
    }

    pub fn parameter_value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn parameters_modified(&self) -> bool {
        self.parameters_modified
    }

    pub fn set_parameters_modified(&mut self, flag: bool) {
        self.parameters_modified = flag;
    }

    /// Numbered `name: value` lines for every non-password placeholder.
    ///
    /// Unbound placeholders show their `?name?` token. Lines are joined with
    /// `",\n"`; the result is empty when there is nothing to show.
    pub fn parameters_list_to_be_shown(&self) -> String {
        self.parameters
            .iter()
            .filter(|name| name.as_str() != PASSWORD)
            .enumerate()
            .map(|(i, name)| {
                let value = match self.parameter_value(name) {
                    Some(value) => value.to_string(),
                    None => placeholder_token(name),
                };
                format!("{}. {}: {}", i + 1, name, value)
            })
            .collect::<Vec<_>>()
            .join(",\n")
    }

    /// Text to transmit. Bound placeholders are replaced by their values;
    /// unbound ones stay in the text as `?name?`.
    pub fn sms_command(&self) -> String {
        self.render(|name| self.parameter_value(name))
    }

    /// Text to show the user. The password always renders as `******`.
    pub fn sms_command_for_display(&self) -> String {
        self.render(|name| {
            if name == PASSWORD {
                Some(PASSWORD_MASK)
            } else {
                self.parameter_value(name)
            }
        })
    }

    /// Text to transmit to one tracker.
    ///
    /// The tracker's own password fills every `password` placeholder, taking
    /// precedence over any value bound on the template. A missing password
    /// is sent as an empty string.
    pub fn sms_command_for(&self, recipient_password: Option<&str>) -> String {
        if !self.has_password() {
            return self.sms_command();
        }
        let password = recipient_password.unwrap_or("");
        self.render(|name| {
            if name == PASSWORD {
                Some(password)
            } else {
                self.parameter_value(name)
            }
        })
    }

    /// A copy named `"<name> (2)"` with no bound values.
    pub fn duplicate(&self) -> Self {
        Self::new(
            format!("{} (2)", self.name),
            self.command.clone(),
            self.description.clone(),
        )
    }

    // Single pass, so substituted values are never scanned for placeholders.
    fn render<'v>(&self, resolve: impl Fn(&str) -> Option<&'v str>) -> String {
        PLACEHOLDER_PATTERN
            .replace_all(&self.command, |caps: &Captures<'_>| {
                let token = &caps[0];
                match resolve(parameter_name(token)) {
                    Some(value) => value.to_string(),
                    None => token.to_string(),
                }
            })
            .into_owned()
    }

    fn prepare_parameters(&mut self) {
        self.parameters = placeholders(&self.command).map(String::from).collect();
        self.passwords = self.parameters.iter().filter(|p| *p == PASSWORD).count();
    }
}

impl PartialEq for CommandTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.command == other.command
    }
}

impl Eq for CommandTemplate {}

impl Hash for CommandTemplate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.command.hash(state);
    }
}

/// Display order for command names.
///
/// Characters are compared case-insensitively; when one name is a prefix of
/// the other the shorter one comes first.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    for (c1, c2) in a.chars().zip(b.chars()) {
        if c1 == c2 {
            continue;
        }
        let (u1, u2) = (fold_upper(c1), fold_upper(c2));
        if u1 == u2 {
            continue;
        }
        let (l1, l2) = (fold_lower(u1), fold_lower(u2));
        if l1 != l2 {
            return l1.cmp(&l2);
        }
    }
    a.chars().count().cmp(&b.chars().count())
}

fn fold_upper(c: char) -> char {
    c.to_uppercase().next().unwrap_or(c)
}

fn fold_lower(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// The command set a fresh installation starts with.
pub fn get_built_in_templates() -> Vec<CommandTemplate> {
    let mut templates = Vec::new();

    // =====================================================================
    // TK102 / TK103 BASE COMMANDS
    // =====================================================================

    templates.push(CommandTemplate::new(
        "Initialization",
        "begin?password?",
        "Send \"begin+password\" in SMS to the unit, it will reply \"begin ok\" and initialize all the settings.",
    ));
    templates.push(CommandTemplate::new(
        "Change the password",
        "password?password? ?new-password?",
        "Send SMS password+old password+space+new password to change the password.",
    ));
    templates.push(CommandTemplate::new(
        "Authorization",
        "admin?password? ?admin-phone?",
        "Send SMS admin+password+space+cell phone number to set up a authorized number.",
    ));
    templates.push(CommandTemplate::new(
        "Auto Track",
        "t030s***n?password?",
        "Send SMS t030s***n+password to the unit, it will reply SMS heaps of times. Remark: the interval must not be less than 20s.",
    ));
    templates.push(CommandTemplate::new(
        "Cancel Auto Track",
        "notn?password?",
        "Send notn+password to delete the auto track.",
    ));
    templates.push(CommandTemplate::new(
        "Swtich to Monitor",
        "monitor?password?",
        "Send SMS monitor+password to the unit, and it will reply \"monitor ok !\" and switch to \"monitor\" mode.",
    ));
    templates.push(CommandTemplate::new(
        "Swtich to Track",
        "tracker?password?",
        "Send SMS tracker+password to the unit, and it will reply \"tracker ok !\" and switch to \"track\" mode.",
    ));
    templates.push(CommandTemplate::new(
        "Geo-fence",
        "stockade?password? ?longitudeEW?,?latitudeNS?; ?longitudeEW?,?latitudeNS?",
        "Set up a geo-fence for the unit to restrict its movements within a district. The unit will send the message to the authorized numbers when it breaches the district.",
    ));
    templates.push(CommandTemplate::new(
        "Cancel Geo-fence",
        "nostockade?password?",
        "Send SMS nostockade+password to deactivate the Geo-fence function.",
    ));
    templates.push(CommandTemplate::new(
        "Movement alert",
        "move?password?",
        "When the unit stays immobile in a place for 3-10 minutes, the user can send SMS move+password to the unit, then the unit will reply \"move ok\".",
    ));
    templates.push(CommandTemplate::new(
        "Cancel Movement alert",
        "nomove?password?",
        "Send SMS nomove+password to deactivate the movement alert.",
    ));
    templates.push(CommandTemplate::new(
        "Overspeed alert",
        "speed?password? ?speed?",
        "Send SMS speed+password+space+080 to the unit (suppose the speed is 80km/h), and it will reply \"speed ok\".",
    ));
    templates.push(CommandTemplate::new(
        "Cancel Overspeed alert",
        "nospeed?password?",
        "Send SMS nospeed+password to deactivate the overspeed alert.",
    ));
    templates.push(CommandTemplate::new(
        "IMEI checking",
        "imei?password?",
        "Send SMS imei+password to the unit to check the IMEI number.",
    ));
    templates.push(CommandTemplate::new(
        "SMS center",
        "adminsms?password? ?phone-number?",
        "Send SMS adminsms+password+space+cell phone number to set the SMS center.",
    ));
    templates.push(CommandTemplate::new(
        "Cancel SMS center",
        "noadminsms?password?",
        "Send SMS noadminsms+password to cancel the SMS center.",
    ));
    templates.push(CommandTemplate::new(
        "GPRS: Set server address",
        "adminip?password? ?server-ip? ?server-port?",
        "Send SMS adminip+password+space+IP address+space+port. If setup successful, the tracker will reply SMS \"adminip ok\".",
    ));
    templates.push(CommandTemplate::new(
        "Cancel GPRS",
        "noadminip?password?",
        "Send SMS noadminip+password",
    ));
    templates.push(CommandTemplate::new(
        "Set APN",
        "apn?password? ?apn-name?",
        "Send SMS apn+password+space+specify apn. If setup successful, the tracker will reply SMS \"APN ok\".",
    ));

    // =====================================================================
    // TK102-2 COMMANDS
    // =====================================================================

    templates.push(CommandTemplate::new(
        "Low battery alert ON",
        "lowbattery?password? on",
        "TK102-2: Tracker will send SMS \"low battery+latitude/longitude\" to authorized numbers 2 times in total in 15 minutes interval when voltage of battery is going to be about 3.55V",
    ));
    templates.push(CommandTemplate::new(
        "Low battery alert OFF",
        "lowbattery?password? off",
        "TK102-2: Tracker will stop send SMS \"low battery\" allerts.",
    ));
    templates.push(CommandTemplate::new(
        "State checking",
        "check?password?",
        "TK102-2: Check tracker status for GSM, GPS, GPRS and battery.",
    ));
    templates.push(CommandTemplate::new(
        "Version Checking",
        "version?password?",
        "TK102-2: Check tracker version.",
    ));
    templates.push(CommandTemplate::new(
        "Motion sensor ON",
        "shake?password? ?sensitive?",
        "TK102-2: This command will enable shake sensor to send alerts when the tracker is shaked, the ?sensitive? parameter should have a value between 1, for the least sensitive degree and 10 for the most sensitive degree.",
    ));
    templates.push(CommandTemplate::new(
        "SD storing data ON",
        "sdlog?password? 1",
        "TK102-2: Activate the function of storing data in SD card.",
    ));
    templates.push(CommandTemplate::new(
        "SD storing data OFF",
        "sdlog?password? 0",
        "TK102-2: Deactivate the function of storing data in SD card.",
    ));
    templates.push(CommandTemplate::new(
        "SD send data to the GPRS server ON",
        "readsd?password? 1",
        "TK102-2: Activate the function to send data from the SD card to the GPRS server.",
    ));
    templates.push(CommandTemplate::new(
        "SD send data to the GPRS server OFF",
        "readsd?password? 0",
        "TK102-2: Deactivate the function to send data from the SD card to the GPRS server.",
    ));
    templates.push(CommandTemplate::new(
        "SMS position link",
        "smslink?password?",
        "TK102-2: Turn tracker messages with the tracker positions as links.",
    ));
    templates.push(CommandTemplate::new(
        "SMS position text",
        "smstext?password?",
        "TK102-2: Turn tracker back to text messages, default format messages.",
    ));
    templates.push(CommandTemplate::new(
        "SMS link once",
        "smslinkone?password?",
        "TK102-2: Tracker will send one messages with the position as a link.",
    ));
    templates.push(CommandTemplate::new(
        "Set APN user",
        "apnuser?password? ?username?",
        "TK102-2: Set the APN user name.",
    ));
    templates.push(CommandTemplate::new(
        "Set APN password",
        "apnuser?password? ?apnpassword?",
        "TK102-2: Set the APN password.",
    ));
    templates.push(CommandTemplate::new(
        "Set Time Zone",
        "time zone?password? ?timezone?",
        "TK102-2: Set the tracker reports time zone.",
    ));
    templates.push(CommandTemplate::new(
        "Tlimit function ON",
        "tlimit?password? ?distance?",
        "TK102-2: Activate the limited distance for autor reporting mode (t030s***n...). Distance can be a numeric value between 50 and 5999 meters.",
    ));
    templates.push(CommandTemplate::new(
        "Tlimit function OFF",
        "tlimit?password? 0",
        "TK102-2: Deactivate Tlimit function.",
    ));
    templates.push(CommandTemplate::new(
        "Set GPRS MODE-UDP",
        "gprsmode?password? 1",
        "TK102-2: Set GPRS MODE to UDP protocol.",
    ));
    templates.push(CommandTemplate::new(
        "Set GPRS MODE-TCP",
        "gprsmode?password? 0",
        "TK102-2: Set GPRS MODE to TCP protocol. (default protocol)",
    ));

    templates
}
