//! Student and registration types

use serde::{Deserialize, Serialize};

/// A registered student allowed to request tickets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub dni: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
}

impl Student {
    pub fn new(dni: String, first_name: String, last_name: String, password_hash: String) -> Self {
        Self {
            dni,
            first_name,
            last_name,
            password_hash,
        }
    }

    /// Name shown on the board
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Public view without the password hash
    pub fn profile(&self) -> StudentProfile {
        StudentProfile {
            dni: self.dni.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// Student data safe to return to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub dni: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
}

/// A registration waiting for admin review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUser {
    pub dni: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
    #[serde(rename = "verificationToken")]
    pub verification_token: String,
    #[serde(rename = "requestedAt", default)]
    pub requested_at: u64,
}

impl PendingUser {
    /// Promote to a student, keeping the already hashed password
    pub fn into_student(self) -> Student {
        Student {
            dni: self.dni,
            first_name: self.first_name,
            last_name: self.last_name,
            password_hash: self.password_hash,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let student = Student::new(
            "123".to_string(),
            "Ana".to_string(),
            "Diaz".to_string(),
            "hash".to_string(),
        );
        assert_eq!(student.display_name(), "Ana Diaz");
    }

    #[test]
    fn test_profile_hides_password() {
        let student = Student::new(
            "123".to_string(),
            "Ana".to_string(),
            "Diaz".to_string(),
            "secret-hash".to_string(),
        );

        let json = serde_json::to_string(&student.profile()).unwrap();
        assert!(json.contains("\"firstName\":\"Ana\""));
        assert!(!json.contains("secret-hash"));
    }
}
