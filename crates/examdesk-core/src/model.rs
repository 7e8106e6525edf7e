//! Core data model types for examdesk.
//!
//! Every stored record carries a store-assigned surrogate id. Creation inputs
//! (`New*`) hold the same fields minus the id, and patches (`*Patch`) hold the
//! mutable fields as options that are merged over the stored record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub type AccountId = u64;
pub type StudentId = u64;
pub type ExamId = u64;
pub type ResultId = u64;

/// A record kept in an [`EntityCollection`](crate::collection::EntityCollection).
pub trait Entity: Clone {
    /// Creation input, everything but the id.
    type New;
    /// Partial update merged over an existing record.
    type Patch;

    fn id(&self) -> u64;

    /// Build the stored record once the collection has assigned an id.
    fn from_new(id: u64, new: Self::New) -> Self;

    /// Merge the provided fields of `patch` into `self`.
    fn apply(&mut self, patch: Self::Patch);
}

/// Deserialize a clearable patch field: absent stays `None`, an explicit
/// `null` becomes `Some(None)`.
fn clearable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Compare two email addresses the way the store's uniqueness policy does.
pub fn same_email(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Login role of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Student => write!(f, "student"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" | "administrator" => Ok(Role::Admin),
            "student" => Ok(Role::Student),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Per-channel notification switches. Students choose per topic, admins
/// only toggle each channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NotificationPreferences {
    Student {
        email_results: bool,
        email_upcoming_exams: bool,
        sms_results: bool,
        sms_upcoming_exams: bool,
    },
    Admin {
        email: bool,
        sms: bool,
    },
}

impl NotificationPreferences {
    /// Email on, SMS off.
    pub fn default_for(role: Role) -> Self {
        match role {
            Role::Student => NotificationPreferences::Student {
                email_results: true,
                email_upcoming_exams: true,
                sms_results: false,
                sms_upcoming_exams: false,
            },
            Role::Admin => NotificationPreferences::Admin {
                email: true,
                sms: false,
            },
        }
    }
}

/// A login identity.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    /// Opaque credential produced by the configured `CredentialVerifier`.
    pub password: String,
    pub name: String,
    pub role: Role,
    pub is_admin: bool,
    #[serde(default)]
    pub profile_image: Option<String>,
    /// The student profile this login belongs to, for student accounts.
    #[serde(default)]
    pub student_id: Option<StudentId>,
    pub notifications: NotificationPreferences,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password", &"***")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("is_admin", &self.is_admin)
            .field("profile_image", &self.profile_image)
            .field("student_id", &self.student_id)
            .field("notifications", &self.notifications)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub student_id: Option<StudentId>,
    /// Defaults to [`NotificationPreferences::default_for`] the role.
    #[serde(default)]
    pub notifications: Option<NotificationPreferences>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_admin: Option<bool>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub student_id: Option<Option<StudentId>>,
    pub notifications: Option<NotificationPreferences>,
}

impl Entity for Account {
    type New = NewAccount;
    type Patch = AccountPatch;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_new(id: u64, new: NewAccount) -> Self {
        let notifications = new
            .notifications
            .unwrap_or_else(|| NotificationPreferences::default_for(new.role));
        Self {
            id,
            email: new.email,
            password: new.password,
            name: new.name,
            role: new.role,
            is_admin: new.is_admin,
            profile_image: new.profile_image,
            student_id: new.student_id,
            notifications,
        }
    }

    fn apply(&mut self, patch: AccountPatch) {
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(password) = patch.password {
            self.password = password;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(is_admin) = patch.is_admin {
            self.is_admin = is_admin;
        }
        if let Some(image) = patch.profile_image {
            self.profile_image = image;
        }
        if let Some(student_id) = patch.student_id {
            self.student_id = student_id;
        }
        if let Some(notifications) = patch.notifications {
            self.notifications = notifications;
        }
    }
}

// ---------------------------------------------------------------------------
// Student profiles
// ---------------------------------------------------------------------------

/// The academic record of a student, separate from any login account.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: StudentId,
    pub name: String,
    pub email: String,
    /// Class or form label, e.g. "10A".
    pub class_label: String,
    pub enrollment_date: NaiveDate,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub guardian_name: Option<String>,
    #[serde(default)]
    pub guardian_phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl fmt::Debug for StudentProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudentProfile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("class_label", &self.class_label)
            .field("enrollment_date", &self.enrollment_date)
            .field("password", &"***")
            .field("phone", &self.phone)
            .field("address", &self.address)
            .field("guardian_name", &self.guardian_name)
            .field("guardian_phone", &self.guardian_phone)
            .field("date_of_birth", &self.date_of_birth)
            .field("profile_image", &self.profile_image)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub class_label: String,
    /// Defaults to today (UTC).
    #[serde(default)]
    pub enrollment_date: Option<NaiveDate>,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub guardian_name: Option<String>,
    #[serde(default)]
    pub guardian_phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub class_label: Option<String>,
    pub enrollment_date: Option<NaiveDate>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub guardian_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub guardian_phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<Option<String>>,
}

impl Entity for StudentProfile {
    type New = NewStudent;
    type Patch = StudentPatch;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_new(id: u64, new: NewStudent) -> Self {
        Self {
            id,
            name: new.name,
            email: new.email,
            class_label: new.class_label,
            enrollment_date: new
                .enrollment_date
                .unwrap_or_else(|| Utc::now().date_naive()),
            password: new.password,
            phone: new.phone,
            address: new.address,
            guardian_name: new.guardian_name,
            guardian_phone: new.guardian_phone,
            date_of_birth: new.date_of_birth,
            profile_image: new.profile_image,
        }
    }

    fn apply(&mut self, patch: StudentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(class_label) = patch.class_label {
            self.class_label = class_label;
        }
        if let Some(date) = patch.enrollment_date {
            self.enrollment_date = date;
        }
        if let Some(password) = patch.password {
            self.password = password;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(name) = patch.guardian_name {
            self.guardian_name = name;
        }
        if let Some(phone) = patch.guardian_phone {
            self.guardian_phone = phone;
        }
        if let Some(date) = patch.date_of_birth {
            self.date_of_birth = date;
        }
        if let Some(image) = patch.profile_image {
            self.profile_image = image;
        }
    }
}

// ---------------------------------------------------------------------------
// Exams
// ---------------------------------------------------------------------------

/// Where an exam is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    #[default]
    Upcoming,
    Active,
    Completed,
}

impl ExamStatus {
    /// Upcoming and active exams are still open to students.
    pub fn is_open(self) -> bool {
        matches!(self, ExamStatus::Upcoming | ExamStatus::Active)
    }
}

impl fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamStatus::Upcoming => write!(f, "upcoming"),
            ExamStatus::Active => write!(f, "active"),
            ExamStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for ExamStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upcoming" => Ok(ExamStatus::Upcoming),
            "active" | "ongoing" => Ok(ExamStatus::Active),
            "completed" | "done" => Ok(ExamStatus::Completed),
            other => Err(format!("unknown exam status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub id: ExamId,
    pub name: String,
    pub subject: String,
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub total_marks: u32,
    pub status: ExamStatus,
    #[serde(default)]
    pub description: Option<String>,
}

impl Exam {
    /// Percentage for `score` out of this exam's total marks, two decimals.
    pub fn percentage_for(&self, score: f64) -> f64 {
        if self.total_marks == 0 {
            return 0.0;
        }
        let raw = score / f64::from(self.total_marks) * 100.0;
        (raw * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExam {
    pub name: String,
    pub subject: String,
    pub date: NaiveDate,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    #[serde(default = "default_total_marks")]
    pub total_marks: u32,
    #[serde(default)]
    pub status: ExamStatus,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_duration() -> u32 {
    60
}

fn default_total_marks() -> u32 {
    100
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExamPatch {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub date: Option<NaiveDate>,
    pub duration_minutes: Option<u32>,
    pub total_marks: Option<u32>,
    pub status: Option<ExamStatus>,
    #[serde(default, deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
}

impl Entity for Exam {
    type New = NewExam;
    type Patch = ExamPatch;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_new(id: u64, new: NewExam) -> Self {
        Self {
            id,
            name: new.name,
            subject: new.subject,
            date: new.date,
            duration_minutes: new.duration_minutes,
            total_marks: new.total_marks,
            status: new.status,
            description: new.description,
        }
    }

    fn apply(&mut self, patch: ExamPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(subject) = patch.subject {
            self.subject = subject;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(duration) = patch.duration_minutes {
            self.duration_minutes = duration;
        }
        if let Some(total) = patch.total_marks {
            self.total_marks = total;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One student's graded outcome for one exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub id: ResultId,
    pub student_id: StudentId,
    pub exam_id: ExamId,
    pub score: f64,
    pub percentage: f64,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResult {
    pub student_id: StudentId,
    pub exam_id: ExamId,
    pub score: f64,
    /// Derived from the exam's total marks when omitted.
    #[serde(default)]
    pub percentage: Option<f64>,
    /// Defaults to the time of creation.
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultPatch {
    pub student_id: Option<StudentId>,
    pub exam_id: Option<ExamId>,
    pub score: Option<f64>,
    pub percentage: Option<f64>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Entity for ExamResult {
    type New = NewResult;
    type Patch = ResultPatch;

    fn id(&self) -> u64 {
        self.id
    }

    fn from_new(id: u64, new: NewResult) -> Self {
        Self {
            id,
            student_id: new.student_id,
            exam_id: new.exam_id,
            score: new.score,
            percentage: new.percentage.unwrap_or_default(),
            submitted_at: new.submitted_at.unwrap_or_else(Utc::now),
        }
    }

    fn apply(&mut self, patch: ResultPatch) {
        if let Some(student_id) = patch.student_id {
            self.student_id = student_id;
        }
        if let Some(exam_id) = patch.exam_id {
            self.exam_id = exam_id;
        }
        if let Some(score) = patch.score {
            self.score = score;
        }
        if let Some(percentage) = patch.percentage {
            self.percentage = percentage;
        }
        if let Some(submitted_at) = patch.submitted_at {
            self.submitted_at = submitted_at;
        }
    }
}

/// A result joined with the student and exam it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultWithDetails {
    #[serde(flatten)]
    pub result: ExamResult,
    pub student: StudentProfile,
    pub exam: Exam,
}
