//! The `examdesk init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("examdesk.toml").exists() {
        println!("examdesk.toml already exists, skipping.");
    } else {
        std::fs::write("examdesk.toml", SAMPLE_CONFIG)?;
        println!("Created examdesk.toml");
    }

    std::fs::create_dir_all("seed")?;
    let seed_path = std::path::Path::new("seed/school.toml");
    if seed_path.exists() {
        println!("seed/school.toml already exists, skipping.");
    } else {
        std::fs::write(seed_path, SAMPLE_SEED)?;
        println!("Created seed/school.toml");
    }

    println!("\nNext steps:");
    println!("  1. Add your students, exams and results to seed/school.toml");
    println!("  2. Run: examdesk validate");
    println!("  3. Run: examdesk dashboard --student 1");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examdesk configuration

data_path = "seed/school.toml"
log_filter = "examdesk=info"

[store]
email_policy = "unique"      # unique | unchecked
delete_policy = "cascade"    # cascade | restrict | orphan
"#;

const SAMPLE_SEED: &str = r#"# Records are numbered in file order: the first student is student 1,
# the first exam is exam 1, and results refer to them by those ids.

[[students]]
name = "John Doe"
email = "john@school.test"
class_label = "10A"
enrollment_date = "2024-09-02"
password = "$mock$change-me"

[[students]]
name = "Mary Major"
email = "mary@school.test"
class_label = "10A"
enrollment_date = "2024-09-02"
password = "$mock$change-me"

[[exams]]
name = "Mathematics Final"
subject = "Mathematics"
date = "2025-06-02"
duration_minutes = 120
total_marks = 100
status = "completed"

[[exams]]
name = "Physics Quiz"
subject = "Physics"
date = "2025-06-16"
duration_minutes = 30
total_marks = 20
status = "upcoming"

[[results]]
student_id = 1
exam_id = 1
score = 87.0
submitted_at = "2025-06-02T11:30:00Z"

[[results]]
student_id = 2
exam_id = 1
score = 91.0
submitted_at = "2025-06-02T11:45:00Z"

[[accounts]]
email = "office@school.test"
password = "$mock$change-me"
name = "School Office"
role = "admin"
is_admin = true
"#;
