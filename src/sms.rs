use crate::models::error::{Result, TkConfigError};

/// Trait for the SMS transport the rendered commands are handed to
pub trait SmsSender {
    /// Transmit `message` to `phone`
    fn send_text_message(&mut self, phone: &str, message: &str) -> Result<()>;

    /// Keep a copy of a sent message in the device's sent folder
    fn save_to_sent_folder(&mut self, _phone: &str, _message: &str) -> Result<()> {
        Ok(())
    }
}

/// Sender that only logs what would be transmitted
#[derive(Debug, Default)]
pub struct LogSender {
    sent: usize,
}

impl LogSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl SmsSender for LogSender {
    fn send_text_message(&mut self, phone: &str, message: &str) -> Result<()> {
        tracing::info!("Send to: {} the SMS: \"{}\"", phone, message);
        self.sent += 1;
        Ok(())
    }
}

/// Outcome of sending one command to the selected contacts.
///
/// A failed contact does not stop the others; each failure is kept with the
/// phone number it was meant for.
#[derive(Debug, Clone, Default)]
pub struct SendReport {
    pub sent: usize,
    pub failed: Vec<(String, TkConfigError)>,
}

impl SendReport {
    pub fn nothing_sent(&self) -> bool {
        self.sent == 0
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.sent + self.failed.len()
    }
}
