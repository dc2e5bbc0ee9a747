use serde::{Deserialize, Serialize};

/// A GPS tracker reachable by SMS, with the password it expects.
///
/// Contacts are identified by phone number.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsContact {
    pub name: String,
    pub phone: String,
    pub password: String,
    pub selected: bool,
}

impl GpsContact {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        password: impl Into<String>,
        selected: bool,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            password: password.into(),
            selected,
        }
    }

    /// Password to substitute, `None` when the contact has none.
    pub fn password(&self) -> Option<&str> {
        if self.password.is_empty() {
            None
        } else {
            Some(&self.password)
        }
    }
}

impl PartialEq for GpsContact {
    fn eq(&self, other: &Self) -> bool {
        self.phone == other.phone
    }
}

impl Eq for GpsContact {}

impl std::fmt::Debug for GpsContact {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("GpsContact")
            .field("name", &self.name)
            .field("phone", &self.phone)
            .field("password", &"[REDACTED]")
            .field("selected", &self.selected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_by_phone() {
        let a = GpsContact::new("Car", "+40700000001", "123456", true);
        let b = GpsContact::new("Boat", "+40700000001", "654321", false);
        let c = GpsContact::new("Car", "+40700000002", "123456", true);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_empty_password_is_none() {
        let contact = GpsContact::new("Car", "+40700000001", "", true);
        assert_eq!(contact.password(), None);
        let contact = GpsContact::new("Car", "+40700000001", "999999", true);
        assert_eq!(contact.password(), Some("999999"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let contact = GpsContact::new("Car", "+40700000001", "secret-pw", true);
        let debug = format!("{:?}", contact);
        assert!(!debug.contains("secret-pw"));
        assert!(debug.contains("REDACTED"));
        assert!(debug.contains("+40700000001"));
    }

    #[test]
    fn test_serde_camel_case() {
        let contact = GpsContact::new("Car", "+40700000001", "1", true);
        let json = serde_json::to_string(&contact).unwrap();
        assert!(json.contains("\"selected\":true"));
        let back: GpsContact = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "Car");
    }
}
