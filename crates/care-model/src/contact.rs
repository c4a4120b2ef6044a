//! Structured family contacts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Relationship of a contact to the patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactRole {
    Father,
    Mother,
    /// Any other legal guardian.
    Guardian,
}

impl ContactRole {
    pub const ALL: [ContactRole; 3] = [Self::Father, Self::Mother, Self::Guardian];

    /// Stable machine name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Father => "father",
            Self::Mother => "mother",
            Self::Guardian => "guardian",
        }
    }

    /// Display label used on intake forms.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Father => "父亲",
            Self::Mother => "母亲",
            Self::Guardian => "监护人",
        }
    }
}

impl fmt::Display for ContactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contact pulled out of a free-text family field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyContact {
    pub role: ContactRole,
    /// Original trimmed text the contact was extracted from.
    pub raw: String,
    /// Residual display name.
    pub name: String,
    pub phone: Option<String>,
    pub id_number: Option<String>,
}

impl FamilyContact {
    /// Returns true if both contacts describe the same person in the same role.
    ///
    /// Contacts match on role plus any shared phone or identity number, or on
    /// identical name and raw text when neither carries an identifier.
    pub fn same_person(&self, other: &FamilyContact) -> bool {
        if self.role != other.role {
            return false;
        }
        let shared_phone = matches!((&self.phone, &other.phone), (Some(a), Some(b)) if a == b);
        let shared_id =
            matches!((&self.id_number, &other.id_number), (Some(a), Some(b)) if a == b);
        if shared_phone || shared_id {
            return true;
        }
        self.name == other.name && self.raw == other.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(role: ContactRole, name: &str, phone: Option<&str>) -> FamilyContact {
        FamilyContact {
            role,
            raw: name.to_string(),
            name: name.to_string(),
            phone: phone.map(str::to_string),
            id_number: None,
        }
    }

    #[test]
    fn same_person_requires_same_role() {
        let father = contact(ContactRole::Father, "张伟", Some("13912345678"));
        let mother = contact(ContactRole::Mother, "张伟", Some("13912345678"));
        assert!(!father.same_person(&mother));
    }

    #[test]
    fn shared_phone_identifies_person() {
        let a = contact(ContactRole::Father, "张伟", Some("13912345678"));
        let b = contact(ContactRole::Father, "张 伟", Some("13912345678"));
        assert!(a.same_person(&b));
    }

    #[test]
    fn role_serializes_snake_case() {
        let json = serde_json::to_string(&ContactRole::Guardian).unwrap();
        assert_eq!(json, "\"guardian\"");
        assert_eq!(ContactRole::Mother.label(), "母亲");
    }
}
