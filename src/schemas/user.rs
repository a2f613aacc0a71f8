use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::User;
use crate::db::types::UserRole;

/// Registration payload, tagged by role. Each variant carries exactly the
/// fields that role requires, so a student cannot smuggle teacher fields and
/// a missing role field fails at deserialization or validation instead of
/// landing as a NULL surprise later.
#[derive(Debug, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub(crate) enum RegisterPayload {
    Student(StudentRegistration),
    Parent(ParentRegistration),
    Teacher(TeacherRegistration),
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentRegistration {
    #[validate(length(min = 2, max = 100))]
    pub(crate) name: String,
    #[validate(email)]
    pub(crate) email: String,
    #[validate(length(min = 8, max = 128))]
    pub(crate) password: String,
    #[validate(range(min = 1, max = 12))]
    pub(crate) grade: i32,
    #[serde(default)]
    pub(crate) division: Option<String>,
    #[serde(default)]
    pub(crate) phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ParentRegistration {
    #[validate(length(min = 2, max = 100))]
    pub(crate) name: String,
    #[validate(email)]
    pub(crate) email: String,
    #[validate(length(min = 8, max = 128))]
    pub(crate) password: String,
    #[serde(alias = "childStudentId")]
    #[validate(length(min = 4, max = 16))]
    pub(crate) child_student_id: String,
    #[serde(default)]
    pub(crate) phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TeacherRegistration {
    #[validate(length(min = 2, max = 100))]
    pub(crate) name: String,
    #[validate(email)]
    pub(crate) email: String,
    #[validate(length(min = 8, max = 128))]
    pub(crate) password: String,
    #[validate(length(min = 2, max = 128))]
    pub(crate) subject: String,
    #[serde(default)]
    #[validate(range(min = 0, max = 60))]
    pub(crate) experience_years: Option<i32>,
    #[serde(default)]
    pub(crate) qualifications: Option<String>,
    #[serde(default)]
    pub(crate) phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProfileUpdate {
    #[serde(default)]
    #[validate(length(min = 2, max = 100))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) phone: Option<String>,
    #[serde(default)]
    pub(crate) avatar_url: Option<String>,
    #[serde(default)]
    #[validate(length(min = 8, max = 128))]
    pub(crate) password: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) grade: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) division: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) child_student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) experience_years: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) qualifications: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) avatar_url: Option<String>,
    pub(crate) is_approved: bool,
    pub(crate) is_active: bool,
    pub(crate) last_login: Option<String>,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            student_id: user.student_id,
            grade: user.grade,
            division: user.division,
            child_student_id: user.child_student_id,
            subject: user.subject,
            experience_years: user.experience_years,
            qualifications: user.qualifications,
            phone: user.phone,
            avatar_url: user.avatar_url,
            is_approved: user.is_approved,
            is_active: user.is_active,
            last_login: user.last_login.map(format_primitive),
            created_at: format_primitive(user.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_payload_dispatches_on_role_tag() {
        let raw = serde_json::json!({
            "role": "student",
            "name": "Lina Farouk",
            "email": "lina@example.com",
            "password": "s3cure-pass",
            "grade": 9,
            "division": "science"
        });
        let payload: RegisterPayload = serde_json::from_value(raw).expect("payload");
        match payload {
            RegisterPayload::Student(student) => {
                assert_eq!(student.grade, 9);
                assert_eq!(student.division.as_deref(), Some("science"));
            }
            _ => panic!("expected student variant"),
        }
    }

    #[test]
    fn parent_registration_requires_child_student_id() {
        let raw = serde_json::json!({
            "role": "parent",
            "name": "Omar Farouk",
            "email": "omar@example.com",
            "password": "s3cure-pass"
        });
        assert!(serde_json::from_value::<RegisterPayload>(raw).is_err());
    }

    #[test]
    fn unknown_role_tag_is_rejected() {
        let raw = serde_json::json!({
            "role": "admin",
            "name": "Sneaky",
            "email": "sneaky@example.com",
            "password": "s3cure-pass"
        });
        assert!(serde_json::from_value::<RegisterPayload>(raw).is_err());
    }

    #[test]
    fn student_registration_validates_grade_range() {
        let student = StudentRegistration {
            name: "Lina".into(),
            email: "lina@example.com".into(),
            password: "s3cure-pass".into(),
            grade: 13,
            division: None,
            phone: None,
        };
        assert!(student.validate().is_err());
    }
}
